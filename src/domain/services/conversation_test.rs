use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use super::help_text;
use super::welcome_text;
use super::Conversations;
use super::CONNECTION_ERROR_TEXT;
use super::GENERIC_ERROR_TEXT;
use super::TIMEOUT_ERROR_TEXT;
use crate::domain::models::Challenge;
use crate::domain::models::ChatMode;
use crate::domain::models::HistoryEntry;
use crate::domain::models::ModelName;
use crate::domain::models::ProgressCard;
use crate::domain::models::Quiz;
use crate::domain::models::Session;
use crate::domain::models::TutorApi;
use crate::domain::models::TutorApiError;
use crate::domain::models::TutorApiResult;
use crate::domain::models::HISTORY_CAP;

#[derive(Clone, Debug, PartialEq, Eq)]
struct ChatCall {
    message: String,
    history_len: usize,
    model: ModelName,
}

#[derive(Clone, Default)]
struct FakeTutor {
    fail_with: Option<fn() -> TutorApiError>,
    challenge: Option<Challenge>,
    chat_calls: Arc<Mutex<Vec<ChatCall>>>,
    challenge_calls: Arc<Mutex<Vec<ModelName>>>,
}

#[async_trait]
impl TutorApi for FakeTutor {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> TutorApiResult<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn chat<'a>(
        &self,
        message: &'a str,
        history: &'a [HistoryEntry],
        model: ModelName,
    ) -> TutorApiResult<String> {
        self.chat_calls.lock().unwrap().push(ChatCall {
            message: message.to_string(),
            history_len: history.len(),
            model,
        });

        if let Some(fail_with) = self.fail_with {
            return Err(fail_with());
        }

        return Ok(format!("**Answer** to {message}"));
    }

    #[allow(clippy::implicit_return)]
    async fn challenge(&self, model: ModelName) -> TutorApiResult<Challenge> {
        self.challenge_calls.lock().unwrap().push(model);

        if let Some(challenge) = &self.challenge {
            return Ok(challenge.clone());
        }

        return Err(TutorApiError::Connection("refused".to_string()));
    }

    #[allow(clippy::implicit_return)]
    async fn quiz<'a>(&self, _topic: &'a str) -> TutorApiResult<Quiz> {
        return Ok(Quiz::default());
    }

    #[allow(clippy::implicit_return)]
    async fn progress_cards<'a>(
        &self,
        _project_name: &'a str,
        _model: ModelName,
    ) -> TutorApiResult<Vec<ProgressCard>> {
        return Ok(vec![]);
    }

    #[allow(clippy::implicit_return)]
    async fn send_test_message<'a>(&self, _phone_number: &'a str) -> TutorApiResult<()> {
        return Ok(());
    }
}

fn code_challenge() -> Challenge {
    return Challenge {
        challenge_type: "code".to_string(),
        prompt: "Reverse a string without a loop.".to_string(),
        hint: None,
    };
}

async fn welcomed(fake: &FakeTutor) -> Conversations {
    let conversations = Conversations::new(Box::new(fake.clone()));
    conversations.handle("alice", "hi").await;

    return conversations;
}

async fn session(conversations: &Conversations) -> Session {
    return conversations.sessions().read("alice").await.unwrap();
}

#[tokio::test]
async fn it_welcomes_the_first_message_only() {
    let fake = FakeTutor::default();
    let conversations = Conversations::new(Box::new(fake.clone()));

    let first = conversations.handle("alice", "What is a closure?").await;
    assert_eq!(first, welcome_text());
    assert!(fake.chat_calls.lock().unwrap().is_empty());

    let second = conversations.handle("alice", "What is a closure?").await;
    assert_eq!(second, "Answer to What is a closure?");
    assert_eq!(fake.chat_calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn it_answers_help_without_welcoming() {
    let fake = FakeTutor::default();
    let conversations = Conversations::new(Box::new(fake.clone()));

    let res = conversations.handle("alice", "HELP").await;
    assert_eq!(res, help_text(&Session::default()));
    assert!(res.contains("Current model: OpenAI"));
    assert!(res.contains("Current mode: tutor"));

    let next = conversations.handle("alice", "hello").await;
    assert_eq!(next, welcome_text());
}

#[tokio::test]
async fn it_switches_models_and_marks_welcomed() {
    let fake = FakeTutor::default();
    let conversations = Conversations::new(Box::new(fake.clone()));

    let res = conversations.handle("alice", "use gemini").await;
    assert_eq!(res, "✅ Switched to Gemini. Ask away!");
    assert_eq!(session(&conversations).await.model, ModelName::Gemini);

    let next = conversations.handle("alice", "What is a trait?").await;
    assert_eq!(next, "Answer to What is a trait?");
    assert_eq!(
        fake.chat_calls.lock().unwrap()[0],
        ChatCall {
            message: "What is a trait?".to_string(),
            history_len: 0,
            model: ModelName::Gemini,
        }
    );
}

#[tokio::test]
async fn it_switches_modes_without_touching_history() {
    let fake = FakeTutor::default();
    let conversations = welcomed(&fake).await;
    conversations.handle("alice", "What is ownership?").await;

    let res = conversations.handle("alice", "challenge mode").await;
    assert!(res.starts_with("🧠 Challenge mode on!"));
    let current = session(&conversations).await;
    assert_eq!(current.mode, ChatMode::Challenge);
    assert_eq!(current.history.len(), 2);

    let res = conversations.handle("alice", "tutor mode").await;
    assert_eq!(res, "📖 Tutor mode on. Ask me anything!");
    let current = session(&conversations).await;
    assert_eq!(current.mode, ChatMode::Tutor);
    assert_eq!(current.history.len(), 2);
}

#[tokio::test]
async fn it_serves_challenges() {
    let fake = FakeTutor {
        challenge: Some(code_challenge()),
        ..FakeTutor::default()
    };
    let conversations = welcomed(&fake).await;

    let res = conversations.handle("alice", "challenge me").await;
    assert_eq!(res, code_challenge().format());
    assert_eq!(*fake.challenge_calls.lock().unwrap(), vec![ModelName::OpenAI]);
    assert!(session(&conversations).await.history.is_empty());
}

#[tokio::test]
async fn it_serves_next_challenge_in_challenge_mode() {
    let fake = FakeTutor {
        challenge: Some(code_challenge()),
        ..FakeTutor::default()
    };
    let conversations = welcomed(&fake).await;
    conversations.handle("alice", "challenge").await;

    let res = conversations.handle("alice", "next").await;
    assert_eq!(res, code_challenge().format());
    assert!(fake.chat_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn it_serves_the_fallback_challenge_on_failure() {
    let fake = FakeTutor::default();
    let conversations = welcomed(&fake).await;

    let res = conversations.handle("alice", "send challenge").await;
    assert_eq!(res, Challenge::fallback().format());
    assert!(res.contains("O(log n)"));
}

#[tokio::test]
async fn it_reports_connection_errors_keeping_history() {
    let fake = FakeTutor {
        fail_with: Some(|| return TutorApiError::Connection("refused".to_string())),
        ..FakeTutor::default()
    };
    let conversations = welcomed(&fake).await;

    let res = conversations.handle("alice", "What is a monad?").await;
    assert_eq!(res, CONNECTION_ERROR_TEXT);
    assert!(session(&conversations).await.history.is_empty());
}

#[tokio::test]
async fn it_reports_timeouts() {
    let fake = FakeTutor {
        fail_with: Some(|| return TutorApiError::Timeout(30000)),
        ..FakeTutor::default()
    };
    let conversations = welcomed(&fake).await;

    let res = conversations.handle("alice", "What is a monad?").await;
    assert_eq!(res, TIMEOUT_ERROR_TEXT);
}

#[tokio::test]
async fn it_reports_other_failures_generically() {
    let fake = FakeTutor {
        fail_with: Some(|| return TutorApiError::Status(500)),
        ..FakeTutor::default()
    };
    let conversations = welcomed(&fake).await;

    let res = conversations.handle("alice", "What is a monad?").await;
    assert_eq!(res, GENERIC_ERROR_TEXT);
}

#[tokio::test]
async fn it_caps_history() {
    let fake = FakeTutor::default();
    let conversations = welcomed(&fake).await;

    for idx in 1..=15 {
        conversations
            .handle("alice", &format!("question {idx}"))
            .await;
    }

    let history = session(&conversations).await.history;
    assert_eq!(history.len(), HISTORY_CAP);
    assert_eq!(history.entries()[0].content, "question 6");
    assert_eq!(history.entries()[19].content, "**Answer** to question 15");

    let calls = fake.chat_calls.lock().unwrap();
    assert_eq!(calls[0].history_len, 0);
    assert_eq!(calls[14].history_len, HISTORY_CAP);
}

#[tokio::test]
async fn it_keeps_users_apart() {
    let fake = FakeTutor::default();
    let conversations = welcomed(&fake).await;
    conversations.handle("alice", "use gemini").await;

    let res = conversations.handle("bob", "What is a trait?").await;
    assert_eq!(res, welcome_text());

    let bob = conversations.sessions().read("bob").await.unwrap();
    assert_eq!(bob.model, ModelName::OpenAI);
    assert_eq!(conversations.sessions().len(), 2);
}
