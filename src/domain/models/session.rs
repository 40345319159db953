use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::History;
use super::ModelName;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChatMode {
    #[default]
    Tutor,
    Challenge,
}

/// Per-correspondent state, created on the first inbound message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub history: History,
    pub model: ModelName,
    pub welcomed: bool,
    pub mode: ChatMode,
}
