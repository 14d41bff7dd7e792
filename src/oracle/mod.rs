//! Remote extraction oracle: one document in, one text blob out.

pub mod gemini;

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::prompt::SYSTEM_INSTRUCTION;

pub use gemini::GeminiClient;

pub const PDF_MIME: &str = "application/pdf";

/// Everything the oracle needs besides the document itself. Built once per
/// run and passed to every call.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleConfig {
    pub instruction: String,
    pub model: String,
    pub temperature: f32,
}

impl OracleConfig {
    /// Standard extraction instruction at zero temperature.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            instruction: SYSTEM_INSTRUCTION.clone(),
            model: model.into(),
            temperature: 0.0,
        }
    }
}

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bad endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("{stage} returned HTTP {status}: {body}")]
    Status {
        stage: &'static str,
        status: u16,
        body: String,
    },

    #[error("upload start response carried no upload URL")]
    MissingUploadUrl,

    #[error("unexpected upload response body: {0}")]
    UploadDecode(String),

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("model returned no text (reason: {})", .reason.as_deref().unwrap_or("unknown"))]
    EmptyResponse { reason: Option<String> },
}

impl OracleError {
    /// `true` when the service answered but the answer was unusable, as
    /// opposed to no answer at all.
    pub fn obtained_response(&self) -> bool {
        matches!(self, OracleError::Decode(_) | OracleError::EmptyResponse { .. })
    }
}

/// Turns a document into the model's raw text answer.
#[allow(async_fn_in_trait)]
pub trait ExtractionOracle {
    async fn extract(&self, config: &OracleConfig, document: &Path) -> Result<String, OracleError>;
}
