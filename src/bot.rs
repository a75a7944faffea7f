use std::collections::HashMap;
use std::future::Future;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use teloxide::prelude::*;
use teloxide::types::UpdateKind;
use tracing::{debug, info};
use url::Url;

/// Fixed reply for the /start command.
pub(crate) const WELCOME_TEXT: &str = "Привет! Все работает нормально.";

type CommandHandler = Box<dyn Fn(Bot, Message) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// The bot side of the bridge: holds the authenticated teloxide [`Bot`] and
/// the table of registered command handlers. Constructed once at startup and
/// shared for the process lifetime.
pub struct BotClient {
    bot: Bot,
    handlers: HashMap<String, CommandHandler>,
}

impl BotClient {
    pub fn new(token: &str) -> Self {
        Self {
            bot: Bot::new(token),
            handlers: HashMap::new(),
        }
    }

    /// Points the bot at a mock API server instead of api.telegram.org.
    #[cfg(test)]
    pub(crate) fn with_api_url(mut self, url: Url) -> Self {
        self.bot = self.bot.set_api_url(url);
        self
    }

    /// Binds a handler to a command name (without the leading slash).
    pub fn register_command<F, Fut>(&mut self, name: &str, handler: F)
    where
        F: Fn(Bot, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.handlers
            .insert(name.to_string(), Box::new(move |bot, msg| handler(bot, msg).boxed()));
    }

    /// Points Telegram's webhook at `<base_url>/webhook`. One attempt; a
    /// failure here (bad token, unreachable API) must abort startup.
    pub async fn register_webhook(&self, base_url: &str) -> Result<()> {
        let url = Url::parse(&format!("{}/webhook", base_url.trim_end_matches('/')))
            .with_context(|| format!("Invalid webhook base URL: {base_url}"))?;

        self.bot
            .set_webhook(url.clone())
            .await
            .context("Failed to register webhook with Telegram")?;

        info!("Webhook registered: {url}");
        Ok(())
    }

    /// Dispatches one update against the handler table. Returns whether a
    /// handler ran. Updates that carry no dispatchable command are ignored;
    /// handler failures propagate to the caller.
    pub async fn process_update(&self, update: Update) -> Result<bool> {
        let update_id = update.id;

        let message = match update.kind {
            UpdateKind::Message(message) => message,
            _ => {
                debug!("Ignoring update {:?}: not a message", update_id);
                return Ok(false);
            }
        };

        let command = match message.text().and_then(parse_command) {
            Some(command) => command.to_owned(),
            None => {
                debug!("Ignoring update {:?}: no command", update_id);
                return Ok(false);
            }
        };

        let Some(handler) = self.handlers.get(&command) else {
            debug!("No handler registered for /{command}");
            return Ok(false);
        };

        info!("Dispatching /{} from chat {}", command, message.chat.id);
        handler(self.bot.clone(), message).await?;
        Ok(true)
    }
}

/// Handler for /start: reply with the fixed welcome text, arguments ignored.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    bot.send_message(msg.chat.id, WELCOME_TEXT)
        .await
        .context("Failed to send welcome reply")?;
    Ok(())
}

/// Extracts the command name from a message body: first whitespace-separated
/// token, leading `/` required, optional `@botname` suffix stripped.
fn parse_command(text: &str) -> Option<&str> {
    let token = text.split_whitespace().next()?;
    let token = token.strip_prefix('/')?;
    let name = token.split('@').next().unwrap_or(token);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
