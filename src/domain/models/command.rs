#[cfg(test)]
#[path = "command_test.rs"]
mod tests;

use super::ChatMode;
use super::ModelName;

const HELP_COMMANDS: [&str; 3] = ["help", "info", "commands"];
const CHALLENGE_MODE_COMMANDS: [&str; 3] = ["challenge mode", "challenge", "start challenge"];
const TUTOR_MODE_COMMANDS: [&str; 3] = ["tutor mode", "tutor", "exit challenge"];
const NEXT_CHALLENGE_COMMANDS: [&str; 3] = ["next", "next challenge", "new challenge"];
const CHALLENGE_REQUEST_COMMANDS: [&str; 2] = ["challenge me", "send challenge"];

/// Classified form of an inbound message. Variants are listed in the order
/// they take precedence when more than one could apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    SetMode(ChatMode),
    SetModel(ModelName),
    RequestChallenge,
    ChatTurn,
}

fn normalize(text: &str) -> String {
    return text
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase();
}

/// Substring matches on purpose: "please use gemini today" switches models.
fn detect_model(normalized: &str) -> Option<ModelName> {
    if let Some(model) = ModelName::parse(normalized) {
        return Some(model);
    }

    for model in [ModelName::Gemini, ModelName::OpenAI] {
        let triggers = [format!("use {model}"), format!("switch to {model}")];
        if triggers.iter().any(|e| return normalized.contains(e.as_str())) {
            return Some(model);
        }
    }

    return None;
}

impl Command {
    /// Pure classification of `text`. The session's current mode is needed
    /// because "next" only asks for a challenge while in challenge mode.
    pub fn parse(text: &str, mode: ChatMode) -> Command {
        let normalized = normalize(text);
        let text = normalized.as_str();

        if HELP_COMMANDS.contains(&text) {
            return Command::Help;
        }

        if CHALLENGE_MODE_COMMANDS.contains(&text) {
            return Command::SetMode(ChatMode::Challenge);
        }

        if TUTOR_MODE_COMMANDS.contains(&text) {
            return Command::SetMode(ChatMode::Tutor);
        }

        if let Some(model) = detect_model(text) {
            return Command::SetModel(model);
        }

        if CHALLENGE_REQUEST_COMMANDS.contains(&text)
            || (mode == ChatMode::Challenge && NEXT_CHALLENGE_COMMANDS.contains(&text))
        {
            return Command::RequestChallenge;
        }

        return Command::ChatTurn;
    }

    /// Commands that are answered without the session having been welcomed
    /// first.
    pub fn skips_welcome(&self) -> bool {
        return matches!(
            self,
            Command::Help | Command::SetMode(_) | Command::SetModel(_)
        );
    }
}
