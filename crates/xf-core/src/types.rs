use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn synthetic() -> Self {
        Self {
            start: SourceLocation { line: 1, column: 1 },
            end: SourceLocation { line: 1, column: 1 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Error,
    Warning,
}

/// A single validation finding. Equality is structural: consumers match
/// messages by type plus exact text, so the text is part of the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessage {
    pub r#type: MessageType,
    pub text: String,
}

impl ValidationMessage {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            r#type: MessageType::Error,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            r#type: MessageType::Warning,
            text: text.into(),
        }
    }
}

/// Ordered list of findings from one validation pass. Append-only while the
/// pass runs, never deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessages {
    pub list: Vec<ValidationMessage>,
}

impl ValidationMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ValidationMessage) {
        self.list.push(message);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(ValidationMessage::error(text));
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.push(ValidationMessage::warning(text));
    }

    pub fn has_errors(&self) -> bool {
        self.list
            .iter()
            .any(|message| message.r#type == MessageType::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationMessage> {
        self.list.iter()
    }

    pub fn contains(&self, message: &ValidationMessage) -> bool {
        self.list.contains(message)
    }
}
