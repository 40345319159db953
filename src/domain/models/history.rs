#[cfg(test)]
#[path = "history_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

/// Maximum number of entries kept per session, ten user/assistant exchanges.
pub const HISTORY_CAP: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl HistoryEntry {
    pub fn new(role: Role, content: &str) -> HistoryEntry {
        return HistoryEntry {
            role,
            content: content.to_string(),
        };
    }
}

/// Ordered conversation history that drops its oldest entries once it grows
/// past [`HISTORY_CAP`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn entries(&self) -> &[HistoryEntry] {
        return &self.entries;
    }

    pub fn len(&self) -> usize {
        return self.entries.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }

    /// Records a completed exchange. Both sides are committed together so a
    /// failed request never leaves a dangling user message behind.
    pub fn push_exchange(&mut self, user: &str, assistant: &str) {
        self.entries.push(HistoryEntry::new(Role::User, user));
        self.entries.push(HistoryEntry::new(Role::Assistant, assistant));
        self.truncate();
    }

    fn truncate(&mut self) {
        if self.entries.len() > HISTORY_CAP {
            let overflow = self.entries.len() - HISTORY_CAP;
            self.entries.drain(..overflow);
        }
    }
}
