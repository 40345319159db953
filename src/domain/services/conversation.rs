#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use super::markdown_to_plaintext;
use super::Sessions;
use crate::domain::models::Challenge;
use crate::domain::models::ChatMode;
use crate::domain::models::Command;
use crate::domain::models::ModelName;
use crate::domain::models::Session;
use crate::domain::models::TutorApiError;
use crate::infrastructure::api::TutorApiBox;

pub const CONNECTION_ERROR_TEXT: &str =
    "Sorry, I'm having trouble connecting to the AI Tutor service. Please try again later.";
pub const TIMEOUT_ERROR_TEXT: &str =
    "The AI Tutor is taking too long to answer. Please try again in a moment.";
pub const GENERIC_ERROR_TEXT: &str =
    "Oops, something went wrong while asking the AI Tutor. Please try again later.";

pub fn help_text(session: &Session) -> String {
    let text = format!(
        r#"
📚 AI Tutor commands:

- help / info / commands - Show this message.
- challenge mode (challenge) - Switch to quiz questions. Send "next" for another one.
- tutor mode (tutor) - Go back to regular tutoring.
- challenge me - Get a single challenge in any mode.
- use gemini / use openai - Switch the AI model.

Current model: {model}
Current mode: {mode}

Ask me anything about programming, languages, or algorithms!
        "#,
        model = session.model.label(),
        mode = session.mode
    );

    return text.trim().to_string();
}

pub fn welcome_text() -> String {
    let text = r#"
🎓 Welcome to AI Tutor!

I'm your learning companion for programming, languages, and more. Ask me any question and I'll explain it step by step.

- Send "challenge mode" for quiz questions.
- Send "use gemini" or "use openai" to pick a model.
- Send "help" at any time to see all commands.

What would you like to learn today? 🚀
        "#;

    return text.trim().to_string();
}

fn mode_text(mode: ChatMode) -> String {
    match mode {
        ChatMode::Challenge => {
            return "🧠 Challenge mode on! Send \"next\" for a challenge, or \"tutor mode\" to go back.".to_string();
        }
        ChatMode::Tutor => {
            return "📖 Tutor mode on. Ask me anything!".to_string();
        }
    }
}

fn model_text(model: ModelName) -> String {
    return format!("✅ Switched to {}. Ask away!", model.label());
}

/// Maps a failed call to what the user gets to read.
pub fn error_text(err: &TutorApiError) -> &'static str {
    match err {
        TutorApiError::Connection(_) => return CONNECTION_ERROR_TEXT,
        TutorApiError::Timeout(_) => return TIMEOUT_ERROR_TEXT,
        TutorApiError::Status(_) | TutorApiError::Decode(_) | TutorApiError::Request(_) => {
            return GENERIC_ERROR_TEXT;
        }
    }
}

/// Owns every correspondent's session and turns inbound text into replies.
pub struct Conversations {
    sessions: Sessions,
    api: TutorApiBox,
}

impl Conversations {
    pub fn new(api: TutorApiBox) -> Conversations {
        return Conversations {
            sessions: Sessions::default(),
            api,
        };
    }

    pub fn sessions(&self) -> &Sessions {
        return &self.sessions;
    }

    /// Produces the reply for `text` from `user_id`. Always returns
    /// something to send, API failures included.
    pub async fn handle(&self, user_id: &str, text: &str) -> String {
        let text = text.trim();
        let mut session = self.sessions.lock(user_id).await;

        let command = Command::parse(text, session.mode);
        tracing::debug!(user_id, ?command, "handling message");

        if !command.skips_welcome() && !session.welcomed {
            session.welcomed = true;
            return welcome_text();
        }

        match command {
            Command::Help => {
                return help_text(&session);
            }
            Command::SetMode(mode) => {
                session.mode = mode;
                return mode_text(mode);
            }
            Command::SetModel(model) => {
                session.model = model;
                session.welcomed = true;
                return model_text(model);
            }
            Command::RequestChallenge => {
                let challenge = match self.api.challenge(session.model).await {
                    Ok(challenge) => challenge,
                    Err(err) => {
                        tracing::warn!(user_id, error = ?err, "serving fallback challenge");
                        Challenge::fallback()
                    }
                };

                return challenge.format();
            }
            Command::ChatTurn => {
                let res = self
                    .api
                    .chat(text, session.history.entries(), session.model)
                    .await;

                match res {
                    Ok(reply) => {
                        session.history.push_exchange(text, &reply);
                        return markdown_to_plaintext(&reply);
                    }
                    Err(err) => {
                        tracing::error!(user_id, error = ?err, "chat turn failed");
                        return error_text(&err).to_string();
                    }
                }
            }
        }
    }
}
