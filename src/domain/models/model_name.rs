use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

/// The model families the tutoring API can route a request to.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    EnumVariantNames,
    strum::Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ModelName {
    #[default]
    OpenAI,
    Gemini,
}

impl ModelName {
    pub fn parse(text: &str) -> Option<ModelName> {
        let text = text.trim().to_lowercase();
        return ModelName::iter().find(|e| return e.to_string() == text);
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModelName::OpenAI => return "OpenAI",
            ModelName::Gemini => return "Gemini",
        }
    }
}
