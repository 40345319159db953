use async_trait::async_trait;
use thiserror::Error;

use super::Challenge;
use super::HistoryEntry;
use super::ModelName;
use super::ProgressCard;
use super::Quiz;

/// Failures of a single tutoring API call, split by what the user should be
/// told about them.
#[derive(Debug, Error)]
pub enum TutorApiError {
    #[error("tutoring API is not reachable: {0}")]
    Connection(String),
    #[error("tutoring API timed out after {0}ms")]
    Timeout(u64),
    #[error("tutoring API responded with status {0}")]
    Status(u16),
    #[error("tutoring API returned an unexpected body: {0}")]
    Decode(String),
    #[error("tutoring API request failed: {0}")]
    Request(String),
}

impl From<serde_json::Error> for TutorApiError {
    fn from(err: serde_json::Error) -> TutorApiError {
        return TutorApiError::Decode(err.to_string());
    }
}

pub type TutorApiResult<T> = std::result::Result<T, TutorApiError>;

#[async_trait]
pub trait TutorApi {
    /// Quick reachability check used at startup.
    async fn health_check(&self) -> TutorApiResult<()>;

    /// A general tutoring turn. `history` excludes `message`.
    async fn chat<'a>(
        &self,
        message: &'a str,
        history: &'a [HistoryEntry],
        model: ModelName,
    ) -> TutorApiResult<String>;

    /// A single mini challenge generated by `model`.
    async fn challenge(&self, model: ModelName) -> TutorApiResult<Challenge>;

    /// A multiple choice quiz on `topic`.
    async fn quiz<'a>(&self, topic: &'a str) -> TutorApiResult<Quiz>;

    async fn progress_cards<'a>(
        &self,
        project_name: &'a str,
        model: ModelName,
    ) -> TutorApiResult<Vec<ProgressCard>>;

    /// Asks the API to deliver a test message to `phone_number`.
    async fn send_test_message<'a>(&self, phone_number: &'a str) -> TutorApiResult<()>;
}
