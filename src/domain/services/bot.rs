#[cfg(test)]
#[path = "bot_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio::task::JoinSet;

use super::Conversations;
use crate::domain::models::Event;
use crate::domain::models::InboundMessage;
use crate::infrastructure::messengers::MessengerBox;

async fn reply(
    conversations: &Conversations,
    messenger: &MessengerBox,
    message: InboundMessage,
) -> Result<()> {
    let text = conversations.handle(&message.sender, &message.text).await;
    messenger.reply(&message, &text).await?;

    tracing::debug!(
        messenger = messenger.name().to_string(),
        id = message.id,
        "replied"
    );

    return Ok(());
}

fn log_worker_exit(res: Result<(), JoinError>) {
    if let Err(err) = res {
        tracing::error!(error = ?err, "reply task panicked");
    }
}

pub struct BotService {}

impl BotService {
    /// Watches `messenger` and answers every direct message until the
    /// messenger stops. A failing watch is returned once in-flight replies
    /// are done.
    pub async fn run(messenger: Arc<MessengerBox>, conversations: Arc<Conversations>) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

        let watcher = messenger.clone();
        let watch = tokio::spawn(async move {
            return watcher.watch(&tx).await;
        });

        BotService::start(messenger, conversations, &mut rx).await?;
        watch.await??;

        return Ok(());
    }

    /// Consumes events, handling each direct message on its own task. Returns
    /// when the channel closes and every reply has been sent.
    pub async fn start(
        messenger: Arc<MessengerBox>,
        conversations: Arc<Conversations>,
        rx: &mut mpsc::UnboundedReceiver<Event>,
    ) -> Result<()> {
        let mut workers = JoinSet::new();

        loop {
            tokio::select! {
                Some(res) = workers.join_next(), if !workers.is_empty() => {
                    log_worker_exit(res);
                }
                event = rx.recv() => {
                    let Some(event) = event else {
                        break;
                    };

                    match event {
                        Event::DirectMessage(message) => {
                            if message.text.trim().is_empty() {
                                tracing::debug!(id = message.id, "skipping empty message");
                                continue;
                            }

                            let conversations = conversations.clone();
                            let messenger = messenger.clone();
                            workers.spawn(async move {
                                let id = message.id.to_string();
                                if let Err(err) = reply(&conversations, &messenger, message).await {
                                    tracing::error!(id, error = ?err, "failed to reply");
                                }
                            });
                        }
                        Event::GroupMessage(message) => {
                            tracing::debug!(id = message.id, chat_id = ?message.chat_id, "ignoring group message");
                        }
                        Event::WatchError(err) => {
                            tracing::error!(error = err, "messenger watch failed");
                        }
                    }
                }
            }
        }

        while let Some(res) = workers.join_next().await {
            log_worker_exit(res);
        }

        return Ok(());
    }
}
