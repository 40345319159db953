#[cfg(test)]
#[path = "tutor_test.rs"]
mod tests;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Challenge;
use crate::domain::models::HistoryEntry;
use crate::domain::models::ModelName;
use crate::domain::models::ProgressCard;
use crate::domain::models::Quiz;
use crate::domain::models::TutorApi;
use crate::domain::models::TutorApiError;
use crate::domain::models::TutorApiResult;

fn convert_err(err: reqwest::Error, timeout: u64) -> TutorApiError {
    if err.is_connect() {
        return TutorApiError::Connection(err.to_string());
    }
    if err.is_timeout() {
        return TutorApiError::Timeout(timeout);
    }
    if err.is_decode() {
        return TutorApiError::Decode(err.to_string());
    }

    return TutorApiError::Request(err.to_string());
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    history: &'a [HistoryEntry],
    model: ModelName,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChatResponse {
    reply: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ChallengeRequest {
    model: ModelName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct QuizRequest<'a> {
    topic: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ProgressCardsRequest<'a> {
    project_name: &'a str,
    model: ModelName,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ProgressCardsResponse {
    cards: Vec<ProgressCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct TestMessageRequest<'a> {
    phone_number: &'a str,
}

/// HTTP client for the tutoring API. Every call is a single request that is
/// abandoned once `timeout` milliseconds pass.
pub struct Tutor {
    url: String,
    timeout: u64,
    health_check_timeout: u64,
    client: reqwest::Client,
}

impl Default for Tutor {
    fn default() -> Tutor {
        return Tutor::new(
            Config::get(ConfigKey::ApiURL),
            Config::get_u64(ConfigKey::ApiTimeout),
            Config::get_u64(ConfigKey::HealthCheckTimeout),
        );
    }
}

impl Tutor {
    pub fn new(url: String, timeout: u64, health_check_timeout: u64) -> Tutor {
        return Tutor {
            url: url.trim_end_matches('/').to_string(),
            timeout,
            health_check_timeout,
            client: reqwest::Client::new(),
        };
    }

    async fn send(&self, path: &str, body: &impl serde::Serialize) -> TutorApiResult<String> {
        let res = self
            .client
            .post(format!("{url}/{path}", url = self.url))
            .timeout(Duration::from_millis(self.timeout))
            .json(body)
            .send()
            .await
            .map_err(|err| return convert_err(err, self.timeout))?;

        let status = res.status();
        if !status.is_success() {
            tracing::error!(
                path,
                status = status.as_u16(),
                "Tutoring API request failed"
            );
            return Err(TutorApiError::Status(status.as_u16()));
        }

        let text = res
            .text()
            .await
            .map_err(|err| return convert_err(err, self.timeout))?;
        tracing::debug!(path, body = text, "Tutoring API response");

        return Ok(text);
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> TutorApiResult<T> {
        let text = self.send(path, body).await?;
        let res = serde_json::from_str::<T>(&text)?;

        return Ok(res);
    }
}

#[async_trait]
impl TutorApi for Tutor {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> TutorApiResult<()> {
        if self.url.is_empty() {
            return Err(TutorApiError::Request("API URL is not defined".to_string()));
        }

        let res = self
            .client
            .get(format!("{url}/", url = self.url))
            .timeout(Duration::from_millis(self.health_check_timeout))
            .send()
            .await;

        let status = match res {
            Ok(res) => res.status().as_u16(),
            Err(err) => {
                tracing::error!(error = ?err, "Tutoring API is not reachable");
                return Err(convert_err(err, self.health_check_timeout));
            }
        };

        if status >= 500 {
            tracing::error!(status = status, "Tutoring API health check failed");
            return Err(TutorApiError::Status(status));
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn chat<'a>(
        &self,
        message: &'a str,
        history: &'a [HistoryEntry],
        model: ModelName,
    ) -> TutorApiResult<String> {
        let req = ChatRequest {
            message,
            history,
            model,
        };
        let res: ChatResponse = self.post("chat", &req).await?;

        return Ok(res.reply);
    }

    #[allow(clippy::implicit_return)]
    async fn challenge(&self, model: ModelName) -> TutorApiResult<Challenge> {
        return self.post("mini-challenge", &ChallengeRequest { model }).await;
    }

    #[allow(clippy::implicit_return)]
    async fn quiz<'a>(&self, topic: &'a str) -> TutorApiResult<Quiz> {
        return self.post("challenge", &QuizRequest { topic }).await;
    }

    #[allow(clippy::implicit_return)]
    async fn progress_cards<'a>(
        &self,
        project_name: &'a str,
        model: ModelName,
    ) -> TutorApiResult<Vec<ProgressCard>> {
        let req = ProgressCardsRequest {
            project_name,
            model,
        };
        let res: ProgressCardsResponse = self.post("generate-progress-cards", &req).await?;

        return Ok(res.cards);
    }

    #[allow(clippy::implicit_return)]
    async fn send_test_message<'a>(&self, phone_number: &'a str) -> TutorApiResult<()> {
        self.send("send-test-imessage", &TestMessageRequest { phone_number })
            .await?;

        return Ok(());
    }
}
