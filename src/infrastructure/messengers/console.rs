#[cfg(test)]
#[path = "console_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use tokio::io;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::domain::models::Event;
use crate::domain::models::InboundMessage;
use crate::domain::models::Messenger;
use crate::domain::models::MessengerName;

/// Every console line is treated as coming from this correspondent.
pub const CONSOLE_USER: &str = "console";

async fn read_lines<R: AsyncBufRead + Unpin>(
    reader: R,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    let mut lines = reader.lines();
    let mut idx = 0;

    while let Some(line) = lines.next_line().await? {
        idx += 1;
        let message = InboundMessage {
            id: idx.to_string(),
            sender: CONSOLE_USER.to_string(),
            chat_id: None,
            text: line,
        };

        if tx.send(Event::DirectMessage(message)).is_err() {
            break;
        }
    }

    return Ok(());
}

/// Local messenger for trying the bot out: reads stdin, answers on stdout.
#[derive(Default)]
pub struct Console {}

#[async_trait]
impl Messenger for Console {
    fn name(&self) -> MessengerName {
        return MessengerName::Console;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn watch<'a>(&self, tx: &'a mpsc::UnboundedSender<Event>) -> Result<()> {
        return read_lines(io::BufReader::new(io::stdin()), tx).await;
    }

    #[allow(clippy::implicit_return)]
    async fn reply<'a>(&self, _message: &'a InboundMessage, text: &'a str) -> Result<()> {
        let mut stdout = io::stdout();
        stdout.write_all(format!("{text}\n\n").as_bytes()).await?;
        stdout.flush().await?;

        return Ok(());
    }
}
