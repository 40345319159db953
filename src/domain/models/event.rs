/// A message delivered by a messenger, carrying enough to reply to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    /// Messenger specific message id, used as the reply key.
    pub id: String,
    /// Correspondent the session is keyed by.
    pub sender: String,
    pub chat_id: Option<String>,
    pub text: String,
}

#[derive(Debug)]
pub enum Event {
    DirectMessage(InboundMessage),
    GroupMessage(InboundMessage),
    WatchError(String),
}
