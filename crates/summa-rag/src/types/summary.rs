//! Units of work for the recursive summarizer

/// Either raw content awaiting summarization or a summary awaiting merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryUnit {
    /// A chunk of source text
    Raw(String),
    /// A previously produced summary
    Partial(String),
}

impl SummaryUnit {
    pub fn text(&self) -> &str {
        match self {
            SummaryUnit::Raw(text) | SummaryUnit::Partial(text) => text,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, SummaryUnit::Partial(_))
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text().chars().count()
    }
}

impl From<String> for SummaryUnit {
    fn from(text: String) -> Self {
        SummaryUnit::Raw(text)
    }
}

impl From<&str> for SummaryUnit {
    fn from(text: &str) -> Self {
        SummaryUnit::Raw(text.to_string())
    }
}
