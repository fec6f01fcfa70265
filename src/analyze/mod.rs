// src/analyze/mod.rs

pub mod classify;
pub mod filter;
