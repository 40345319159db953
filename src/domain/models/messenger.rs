use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::sync::mpsc;

use super::Event;
use super::InboundMessage;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MessengerName {
    Console,
    IMessage,
}

impl MessengerName {
    pub fn parse(text: String) -> Option<MessengerName> {
        return MessengerName::iter().find(|e| return e.to_string() == text);
    }
}

/// The host chat application: a source of inbound events and a way to
/// answer them.
#[async_trait]
pub trait Messenger {
    fn name(&self) -> MessengerName;

    /// Used at startup to verify the messenger can be read from.
    async fn health_check(&self) -> Result<()>;

    /// Pushes inbound events into `tx` until the messenger runs dry or the
    /// receiving side hangs up.
    async fn watch<'a>(&self, tx: &'a mpsc::UnboundedSender<Event>) -> Result<()>;

    /// Sends `text` back to the conversation `message` came from.
    async fn reply<'a>(&self, message: &'a InboundMessage, text: &'a str) -> Result<()>;
}
