//! Telegram command surface: `/start` subscribes, `/update` asks for a pass.
//!
//! Runs as its own task and only talks to the scheduler through the trigger
//! queue, so passes stay serialized.

use std::sync::Arc;
use std::time::Duration;

use crate::ingest::scheduler::{Trigger, TriggerHandle};
use crate::notify::admin::AdminNotifier;
use crate::notify::dispatch::Dispatcher;
use crate::notify::telegram::{IncomingMessage, TelegramClient};
use crate::notify::{MessageBody, Recipient};
use crate::subscribers::SubscriberStore;

const POLL_SECS: u64 = 30;
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Update,
}

/// `/start`, `/start@SomeBot payload` → `Start`; anything else → `None`.
pub fn parse_command(text: &str) -> Option<Command> {
    let first = text.split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);
    match name.to_ascii_lowercase().as_str() {
        "start" => Some(Command::Start),
        "update" => Some(Command::Update),
        _ => None,
    }
}

pub struct CommandPoller {
    bot: TelegramClient,
    replies: Dispatcher,
    subscribers: Arc<SubscriberStore>,
    triggers: TriggerHandle,
    admin: AdminNotifier,
}

impl CommandPoller {
    pub fn new(
        bot: TelegramClient,
        subscribers: Arc<SubscriberStore>,
        triggers: TriggerHandle,
        admin: AdminNotifier,
    ) -> Self {
        let replies = Dispatcher::new(Arc::new(bot.clone())).with_plain_fallback(false);
        Self {
            bot,
            replies,
            subscribers,
            triggers,
            admin,
        }
    }

    pub async fn run(self) {
        let mut offset: Option<i64> = None;
        loop {
            let updates = match self.bot.get_updates(offset, POLL_SECS).await {
                Ok(u) => u,
                Err(e) => {
                    tracing::warn!(target: "commands", "poll failed: {e:#}");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                    continue;
                }
            };
            for upd in updates {
                offset = Some(upd.update_id + 1);
                if let Some(msg) = upd.message {
                    self.handle(&msg).await;
                }
            }
        }
    }

    pub async fn handle(&self, msg: &IncomingMessage) {
        let Some(cmd) = msg.text.as_deref().and_then(parse_command) else {
            return;
        };
        let chat = Recipient(msg.chat.id);
        let (user_id, full_name, username) = match &msg.from {
            Some(u) => {
                let full = format!("{} {}", u.first_name, u.last_name.as_deref().unwrap_or(""))
                    .trim()
                    .to_string();
                let uname = match &u.username {
                    Some(n) => format!("@{n}"),
                    None => u.first_name.clone(),
                };
                (u.id, full, uname)
            }
            None => (chat.0, String::new(), "unknown".to_string()),
        };

        match cmd {
            Command::Start => {
                match self.subscribers.add(chat).await {
                    Ok(true) => tracing::info!(target: "commands", %chat, "subscribed"),
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!(target: "commands", %chat, "persist subscribers: {e:#}")
                    }
                }
                self.reply(chat, "✅ You are now subscribed to finance updates!").await;
                self.reply(chat, "📡 Sending the latest news...").await;
                self.enqueue(Trigger::One(chat)).await;
                self.admin.user_started(&full_name, &username, user_id).await;
            }
            Command::Update => {
                self.reply(chat, "📡 Sending latest updates...").await;
                self.enqueue(Trigger::One(chat)).await;
                self.admin.update_triggered(username.trim_start_matches('@'), user_id).await;
            }
        }
    }

    async fn reply(&self, chat: Recipient, text: &str) {
        if let Err(e) = self.replies.send_text(chat, &MessageBody::plain(text)).await {
            tracing::warn!(target: "commands", error = %e, "reply failed");
        }
    }

    async fn enqueue(&self, trigger: Trigger) {
        if let Err(e) = self.triggers.request(trigger).await {
            tracing::warn!(target: "commands", "enqueue {trigger:?}: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_bot_suffix_and_payload() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/start@FinNewsBot ref42"), Some(Command::Start));
        assert_eq!(parse_command("  /UPDATE "), Some(Command::Update));
        assert_eq!(parse_command("/help"), None);
        assert_eq!(parse_command("start"), None);
        assert_eq!(parse_command(""), None);
    }
}
