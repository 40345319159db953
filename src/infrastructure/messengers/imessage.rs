#[cfg(test)]
#[path = "imessage_test.rs"]
mod tests;

use std::path;
use std::process::Output;
use std::time::Duration;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Event;
use crate::domain::models::InboundMessage;
use crate::domain::models::Messenger;
use crate::domain::models::MessengerName;
use crate::domain::services::scrub_attributed_body;

/// `chat.style` of group conversations. Direct chats use 45.
const GROUP_CHAT_STYLE: i64 = 43;
const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

const MESSAGES_SINCE_QUERY: &str = r#"
SELECT
    message.ROWID,
    message.guid,
    message.text,
    message.attributedBody,
    handle.id,
    chat.chat_identifier,
    chat.style
FROM message
LEFT JOIN handle ON handle.ROWID = message.handle_id
LEFT JOIN chat_message_join ON chat_message_join.message_id = message.ROWID
LEFT JOIN chat ON chat.ROWID = chat_message_join.chat_id
WHERE message.ROWID > ?1 AND message.is_from_me = 0
GROUP BY message.ROWID
ORDER BY message.ROWID ASC
"#;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct MessageRow {
    rowid: i64,
    guid: String,
    text: Option<String>,
    attributed_body: Option<Vec<u8>>,
    sender: Option<String>,
    chat_identifier: Option<String>,
    chat_style: Option<i64>,
}

impl MessageRow {
    fn text(&self) -> String {
        if let Some(text) = &self.text {
            if !text.trim().is_empty() {
                return text.trim().to_string();
            }
        }

        return scrub_attributed_body(self.attributed_body.as_deref())
            .map(|e| return e.text)
            .unwrap_or_default();
    }

    fn into_event(self) -> Option<Event> {
        let sender = self.sender.clone()?;
        let message = InboundMessage {
            id: self.guid.to_string(),
            sender,
            chat_id: self.chat_identifier.clone(),
            text: self.text(),
        };

        if self.chat_style == Some(GROUP_CHAT_STYLE) {
            return Some(Event::GroupMessage(message));
        }

        return Some(Event::DirectMessage(message));
    }
}

fn open(db_path: &path::Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| {
        return format!(
            "Failed to open {}. Does your terminal have Full Disk Access?",
            db_path.display()
        );
    })?;

    return Ok(conn);
}

fn latest_rowid(conn: &Connection) -> Result<i64> {
    let rowid = conn.query_row("SELECT IFNULL(MAX(ROWID), 0) FROM message", [], |row| {
        return row.get(0);
    })?;

    return Ok(rowid);
}

fn messages_since(conn: &Connection, rowid: i64) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(MESSAGES_SINCE_QUERY)?;
    let rows = stmt
        .query_map([rowid], |row| {
            return Ok(MessageRow {
                rowid: row.get(0)?,
                guid: row.get(1)?,
                text: row.get(2)?,
                attributed_body: row.get(3)?,
                sender: row.get(4)?,
                chat_identifier: row.get(5)?,
                chat_style: row.get(6)?,
            });
        })?
        .collect::<rusqlite::Result<Vec<MessageRow>>>()?;

    return Ok(rows);
}

/// Builds the AppleScript that sends `text` to `recipient` over iMessage.
/// Runs `command` to completion, killing it if it outlives `timeout`.
async fn output_within(mut command: Command, timeout: Duration) -> Result<Output> {
    let output = time::timeout(timeout, command.kill_on_drop(true).output())
        .await
        .with_context(|| return format!("Timed out after {}ms", timeout.as_millis()))??;

    return Ok(output);
}

pub fn applescript(recipient: &str, text: &str) -> String {
    let escape = |val: &str| {
        return val.replace('\\', "\\\\").replace('"', "\\\"");
    };

    return format!(
        r#"tell application "Messages"
    set targetService to 1st account whose service type = iMessage
    set targetBuddy to participant "{recipient}" of targetService
    send "{text}" to targetBuddy
end tell"#,
        recipient = escape(recipient.trim()),
        text = escape(text)
    );
}

/// Reads the macOS Messages database and replies through AppleScript.
pub struct IMessage {
    db_path: path::PathBuf,
    poll_interval: u64,
}

impl Default for IMessage {
    fn default() -> IMessage {
        return IMessage::new(
            path::PathBuf::from(Config::get(ConfigKey::ChatDb)),
            Config::get_u64(ConfigKey::PollInterval),
        );
    }
}

impl IMessage {
    pub fn new(db_path: path::PathBuf, poll_interval: u64) -> IMessage {
        return IMessage {
            db_path,
            poll_interval,
        };
    }

    async fn latest_rowid(&self) -> Result<i64> {
        let db_path = self.db_path.clone();
        return tokio::task::spawn_blocking(move || {
            return latest_rowid(&open(&db_path)?);
        })
        .await?;
    }

    async fn messages_since(&self, rowid: i64) -> Result<Vec<MessageRow>> {
        let db_path = self.db_path.clone();
        return tokio::task::spawn_blocking(move || {
            return messages_since(&open(&db_path)?, rowid);
        })
        .await?;
    }

    /// Pushes every message newer than `rowid` until the receiver hangs up.
    async fn poll(&self, tx: &mpsc::UnboundedSender<Event>, mut rowid: i64) -> Result<()> {
        loop {
            match self.messages_since(rowid).await {
                Ok(rows) => {
                    for row in rows {
                        rowid = rowid.max(row.rowid);
                        let Some(event) = row.into_event() else {
                            continue;
                        };

                        if tx.send(event).is_err() {
                            return Ok(());
                        }
                    }
                }
                Err(err) => {
                    tracing::error!(error = ?err, rowid, "failed to read chat database");
                    if tx.send(Event::WatchError(format!("{err:#}"))).is_err() {
                        return Ok(());
                    }
                }
            }

            if tx.is_closed() {
                return Ok(());
            }

            time::sleep(Duration::from_millis(self.poll_interval)).await;
        }
    }
}

#[async_trait]
impl Messenger for IMessage {
    fn name(&self) -> MessengerName {
        return MessengerName::IMessage;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if !self.db_path.exists() {
            bail!(format!("Messages database not found at {}", self.db_path.display()));
        }

        self.latest_rowid().await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn watch<'a>(&self, tx: &'a mpsc::UnboundedSender<Event>) -> Result<()> {
        let rowid = self.latest_rowid().await?;
        tracing::info!(rowid, db = ?self.db_path, "watching for new messages");

        return self.poll(tx, rowid).await;
    }

    #[allow(clippy::implicit_return)]
    async fn reply<'a>(&self, message: &'a InboundMessage, text: &'a str) -> Result<()> {
        let script = applescript(&message.sender, text);
        let mut command = Command::new("osascript");
        command.arg("-e").arg(script);
        let output = output_within(command, REPLY_TIMEOUT)
            .await
            .context("Failed to run osascript")?;

        if !output.status.success() {
            bail!(format!(
                "Failed to send iMessage to {}: {}",
                message.sender,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        return Ok(());
    }
}
