use serde::{Deserialize, Serialize};

pub const UNKNOWN_SENDER: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Productive,
    Unproductive,
}

impl Category {
    /// Accepts the model's Portuguese labels as well as the English names.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "produtivo" | "productive" => Some(Self::Productive),
            "improdutivo" | "unproductive" => Some(Self::Unproductive),
            _ => None,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Productive => "productive",
            Self::Unproductive => "unproductive",
        }
    }

    /// Label used inside the prompts sent to the model.
    pub fn prompt_label(self) -> &'static str {
        match self {
            Self::Productive => "produtivo",
            Self::Unproductive => "improdutivo",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailInput {
    pub content: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
}

impl EmailInput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            subject: None,
            sender: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    pub fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or_default()
    }

    pub fn has_subject(&self) -> bool {
        !self.subject().is_empty()
    }

    pub fn sender_or_unknown(&self) -> &str {
        match self.sender.as_deref() {
            Some(sender) if !sender.is_empty() => sender,
            _ => UNKNOWN_SENDER,
        }
    }

    /// Subject and body joined the way they are fed to the normalizer.
    pub fn combined_text(&self) -> String {
        format!("{} {}", self.subject(), self.content)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: Category,
    pub confidence: f64,
    pub reasoning: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub reasoning: String,
    pub keywords: Vec<String>,
    pub content_length: usize,
    pub has_subject: bool,
    pub sender: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResponse {
    pub category: Category,
    pub confidence: f64,
    pub suggested_response: String,
    pub analysis: Analysis,
    pub processing_time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_portuguese_and_english_labels() {
        assert_eq!(Category::parse("produtivo"), Some(Category::Productive));
        assert_eq!(Category::parse(" Improdutivo "), Some(Category::Unproductive));
        assert_eq!(Category::parse("PRODUCTIVE"), Some(Category::Productive));
        assert_eq!(Category::parse("talvez"), None);
    }

    #[test]
    fn missing_or_empty_sender_is_unknown() {
        let input = EmailInput::new("oi");
        assert_eq!(input.sender_or_unknown(), "unknown");
        assert_eq!(input.with_sender("").sender_or_unknown(), "unknown");
    }

    #[test]
    fn combined_text_puts_subject_first() {
        let input = EmailInput::new("corpo do email").with_subject("Assunto");
        assert_eq!(input.combined_text(), "Assunto corpo do email");
        assert_eq!(EmailInput::new("  só corpo ").combined_text(), "só corpo");
    }

    #[test]
    fn category_serializes_as_english_code() {
        let json = serde_json::to_string(&Category::Unproductive).unwrap();
        assert_eq!(json, "\"unproductive\"");
    }
}
