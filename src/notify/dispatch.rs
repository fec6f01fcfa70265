//! Per-recipient delivery with a one-shot plain-text fallback.
//!
//! A failure is returned as a value, never propagated past the batch: the
//! scheduler logs it and moves on to the next recipient.

use metrics::counter;
use std::sync::Arc;
use thiserror::Error;

use super::format::RenderedArticle;
use super::{MessageBody, MessageTransport, ParseMode, Recipient, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Rich,
    /// Rich rendering failed, plain fallback went through.
    PlainFallback,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("delivery to {recipient} failed: {primary}{}", fallback_suffix(.fallback))]
pub struct DispatchError {
    pub recipient: Recipient,
    pub primary: TransportError,
    pub fallback: Option<TransportError>,
}

fn fallback_suffix(fallback: &Option<TransportError>) -> String {
    match fallback {
        Some(e) => format!(" (plain fallback: {e})"),
        None => String::new(),
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn MessageTransport>,
    plain_fallback: bool,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn MessageTransport>) -> Self {
        Self {
            transport,
            plain_fallback: true,
        }
    }

    pub fn with_plain_fallback(mut self, enabled: bool) -> Self {
        self.plain_fallback = enabled;
        self
    }

    pub async fn send(
        &self,
        recipient: Recipient,
        message: &RenderedArticle,
    ) -> Result<Delivery, DispatchError> {
        let primary = match self.transport.send_message(recipient, &message.markdown).await {
            Ok(()) => {
                record_sent(message.markdown.parse_mode);
                return Ok(Delivery::Rich);
            }
            Err(e) => e,
        };
        counter!("relay_send_failures_total", "kind" => primary.kind()).increment(1);
        tracing::warn!(
            target: "dispatch",
            %recipient,
            url = %message.url,
            error = %primary,
            "rich send failed"
        );

        if !self.plain_fallback {
            return Err(DispatchError {
                recipient,
                primary,
                fallback: None,
            });
        }

        match self.transport.send_message(recipient, &message.plain).await {
            Ok(()) => {
                record_sent(ParseMode::Plain);
                Ok(Delivery::PlainFallback)
            }
            Err(fallback) => {
                counter!("relay_send_failures_total", "kind" => fallback.kind()).increment(1);
                Err(DispatchError {
                    recipient,
                    primary,
                    fallback: Some(fallback),
                })
            }
        }
    }

    /// Single attempt, no fallback. Used for notices and command replies.
    pub async fn send_text(
        &self,
        recipient: Recipient,
        body: &MessageBody,
    ) -> Result<(), DispatchError> {
        match self.transport.send_message(recipient, body).await {
            Ok(()) => {
                record_sent(body.parse_mode);
                Ok(())
            }
            Err(primary) => {
                counter!("relay_send_failures_total", "kind" => primary.kind()).increment(1);
                Err(DispatchError {
                    recipient,
                    primary,
                    fallback: None,
                })
            }
        }
    }
}

fn record_sent(mode: ParseMode) {
    counter!("relay_messages_sent_total", "mode" => mode.as_str()).increment(1);
}
