//! Job input: the source document plus generation parameters.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Target language for generated deck content.
///
/// The language is a first-class configuration value: it selects prompt
/// templates and the number-formatting strategy (Korean scale words vs.
/// thousands separators). Unknown tags are preserved verbatim so a caller
/// can pass any lowercase BCP-47-ish code; they format like English.
///
/// # Examples
///
/// ```
/// use deckweaver::artifacts::Language;
///
/// assert_eq!(Language::from("ko".to_string()), Language::Ko);
/// assert_eq!(Language::Ko.code(), "ko");
/// assert!(Language::Ko.is_korean());
/// assert_eq!(Language::from("ja".to_string()).code(), "ja");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    /// Korean (default): 억/조 scale words, Korean prompt templates.
    Ko,
    /// English: thousands separators, English prompt templates.
    En,
    /// Any other lowercase language tag, formatted like English.
    Other(String),
}

impl Default for Language {
    fn default() -> Self {
        Language::Ko
    }
}

impl From<String> for Language {
    fn from(tag: String) -> Self {
        match tag.to_lowercase().as_str() {
            "ko" | "ko-kr" => Language::Ko,
            "en" | "en-us" | "en-gb" => Language::En,
            other => Language::Other(other.to_string()),
        }
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.code().to_string()
    }
}

impl Language {
    /// The canonical lowercase tag for this language.
    pub fn code(&self) -> &str {
        match self {
            Language::Ko => "ko",
            Language::En => "en",
            Language::Other(tag) => tag,
        }
    }

    /// Whether Korean number formatting (억/조) applies.
    pub fn is_korean(&self) -> bool {
        matches!(self, Language::Ko)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors raised when validating a [`DocumentInput`].
#[derive(Debug, Error, Diagnostic)]
pub enum InputError {
    /// The source document was empty or whitespace-only.
    #[error("document must not be empty")]
    #[diagnostic(code(deckweaver::input::empty_document))]
    EmptyDocument,

    /// The requested slide count is below the structural minimum
    /// (title + at least one content slide + next steps).
    #[error("num_slides must be at least {min}, got {got}")]
    #[diagnostic(code(deckweaver::input::too_few_slides))]
    TooFewSlides { min: usize, got: usize },
}

/// The source document and generation parameters for one job.
///
/// Construct with [`DocumentInput::new`] and the `with_*` builders, then
/// let the orchestrator call [`validate`](Self::validate) before the first
/// stage runs.
///
/// # Examples
///
/// ```
/// use deckweaver::artifacts::{DocumentInput, Language};
///
/// let input = DocumentInput::new("2024 revenue grew 12% to 1.2B.")
///     .with_num_slides(10)
///     .with_language(Language::En)
///     .with_audience("executive board")
///     .with_purpose("investment review");
///
/// assert!(input.validate().is_ok());
/// assert_eq!(input.num_slides, 10);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentInput {
    /// The business document to transform.
    pub document: String,
    /// Target slide count, including title and next-steps slides.
    pub num_slides: usize,
    /// Target language for all generated content.
    #[serde(default)]
    pub language: Language,
    /// Who the deck is for, free text.
    #[serde(default)]
    pub target_audience: String,
    /// Presentation purpose tag, free text.
    #[serde(default)]
    pub purpose: String,
}

impl DocumentInput {
    /// Minimum structurally valid slide count.
    pub const MIN_SLIDES: usize = 3;
    /// Default slide count when the caller does not specify one.
    pub const DEFAULT_SLIDES: usize = 15;

    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            num_slides: Self::DEFAULT_SLIDES,
            language: Language::default(),
            target_audience: String::new(),
            purpose: String::new(),
        }
    }

    #[must_use]
    pub fn with_num_slides(mut self, num_slides: usize) -> Self {
        self.num_slides = num_slides;
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.target_audience = audience.into();
        self
    }

    #[must_use]
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    /// Check the structural preconditions the pipeline relies on.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.document.trim().is_empty() {
            return Err(InputError::EmptyDocument);
        }
        if self.num_slides < Self::MIN_SLIDES {
            return Err(InputError::TooFewSlides {
                min: Self::MIN_SLIDES,
                got: self.num_slides,
            });
        }
        Ok(())
    }
}
