//! Slide-file emitter boundary.
//!
//! The core hands a [`StyledDeck`] plus a target filename to an emitter
//! and gets back an absolute path. The on-disk format is the emitter's
//! business; [`JsonDeckEmitter`] serializes the deck model to pretty
//! JSON, which keeps tests and downstream converters honest.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::artifacts::StyledDeck;

#[derive(Debug, Error, Diagnostic)]
pub enum EmitError {
    #[error("failed to serialize deck: {source}")]
    #[diagnostic(code(deckweaver::emitter::serialize))]
    Serialize {
        #[from]
        source: serde_json::Error,
    },

    #[error("failed to write deck file: {source}")]
    #[diagnostic(code(deckweaver::emitter::io))]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// External emitter boundary.
#[async_trait]
pub trait DeckEmitter: Send + Sync {
    /// Write the deck under `filename` (no extension) and return the
    /// absolute path of the produced file.
    async fn emit(&self, deck: &StyledDeck, filename: &str) -> Result<PathBuf, EmitError>;
}

/// Emitter writing the deck model as pretty-printed JSON.
#[derive(Clone, Debug)]
pub struct JsonDeckEmitter {
    output_dir: PathBuf,
}

impl JsonDeckEmitter {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl DeckEmitter for JsonDeckEmitter {
    async fn emit(&self, deck: &StyledDeck, filename: &str) -> Result<PathBuf, EmitError> {
        let json = serde_json::to_vec_pretty(deck)?;
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{filename}.json"));
        std::fs::write(&path, json)?;
        Ok(std::path::absolute(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{Language, ThemeProfile};

    #[tokio::test]
    async fn emits_absolute_json_path() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = JsonDeckEmitter::new(dir.path());
        let deck = StyledDeck {
            slides: Vec::new(),
            theme: ThemeProfile::default(),
            language: Language::En,
        };
        let path = emitter.emit(&deck, "deck_job-1").await.unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("deck_job-1.json"));
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("consulting-navy"));
    }
}
