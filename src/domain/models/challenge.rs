use serde_derive::Deserialize;
use serde_derive::Serialize;

/// A single quiz-style prompt produced by the tutoring API. Never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub challenge_type: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Challenge {
    /// Served when the challenge endpoint cannot be reached.
    pub fn fallback() -> Challenge {
        return Challenge {
            challenge_type: "quiz".to_string(),
            prompt: "What's the time complexity of binary search?\n\nA) O(n)\nB) O(log n)\nC) O(n log n)\nD) O(1)".to_string(),
            hint: Some("Each step eliminates half of the remaining search space.".to_string()),
        };
    }

    pub fn format(&self) -> String {
        let mut res = format!(
            "🧠 {} challenge\n\n{}",
            capitalize(&self.challenge_type),
            self.prompt.trim()
        );

        if let Some(hint) = &self.hint {
            if !hint.trim().is_empty() {
                res = format!("{res}\n\n💡 Hint: {}", hint.trim());
            }
        }

        return format!("{res}\n\nReply with your answer, or send \"next\" for another one.");
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.trim().chars();
    match chars.next() {
        Some(first) => return first.to_uppercase().chain(chars).collect(),
        None => return "Daily".to_string(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    pub explanation: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

impl Quiz {
    pub fn format(&self) -> String {
        return self
            .questions
            .iter()
            .enumerate()
            .map(|(idx, question)| {
                let options = question
                    .options
                    .iter()
                    .map(|e| return format!("   - {e}"))
                    .collect::<Vec<String>>()
                    .join("\n");

                return format!(
                    "{n}. {q}\n{options}\n   Answer: {a}\n   {explanation}",
                    n = idx + 1,
                    q = question.question,
                    a = question.answer,
                    explanation = question.explanation
                );
            })
            .collect::<Vec<String>>()
            .join("\n\n");
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCard {
    pub title: String,
    pub description: String,
}
