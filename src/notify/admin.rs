// src/notify/admin.rs
use std::sync::Arc;

use super::format::escape_markdown_v2;
use super::{MessageBody, MessageTransport, ParseMode, Recipient};

/// Best-effort notices to the operator chat (usually through a second bot).
#[derive(Clone)]
pub struct AdminNotifier {
    transport: Option<Arc<dyn MessageTransport>>,
    chat: Recipient,
}

impl AdminNotifier {
    pub fn new(transport: Arc<dyn MessageTransport>, chat: Recipient) -> Self {
        Self {
            transport: Some(transport),
            chat,
        }
    }

    pub fn disabled() -> Self {
        Self {
            transport: None,
            chat: Recipient(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    pub async fn user_started(&self, full_name: &str, username: &str, user_id: i64) {
        let text = format!(
            "📢 New user started the bot:\n👤 Name: {}\n🔹 Username: {}\n🆔 User ID: `{}`",
            escape_markdown_v2(full_name),
            escape_markdown_v2(username),
            user_id
        );
        self.notify(text).await;
    }

    pub async fn update_triggered(&self, username: &str, user_id: i64) {
        let text = format!(
            "📢 Update triggered by `{}` \\(ID: `{}`\\)",
            escape_code(username),
            user_id
        );
        self.notify(text).await;
    }

    async fn notify(&self, text: String) {
        let Some(transport) = &self.transport else {
            tracing::debug!("admin notifications disabled (no NOTIFY_BOT_TOKEN/NOTIFY_CHAT_ID)");
            return;
        };
        let body = MessageBody {
            text,
            parse_mode: ParseMode::MarkdownV2,
        };
        if let Err(e) = transport.send_message(self.chat, &body).await {
            tracing::warn!(target: "commands", error = %e, "admin notify failed");
        }
    }
}

/// Inside inline code only backtick and backslash are significant.
fn escape_code(s: &str) -> String {
    s.replace('\\', "\\\\").replace('`', "\\`")
}
