// src/config/mod.rs
pub mod rules;
pub mod runtime;

pub use rules::RelayRules;
pub use runtime::RelayConfig;
