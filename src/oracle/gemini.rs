// src/oracle/gemini.rs

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{path::Path, time::Duration};
use tokio::fs;
use tracing::{debug, info, instrument};
use url::Url;

use super::{ExtractionOracle, OracleConfig, OracleError, PDF_MIME};
use crate::config::Config;

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";
const RESPONSE_MIME: &str = "text/plain";

/// Gemini REST client: uploads the PDF through the Files API, then asks the
/// model for rows with the file attached.
pub struct GeminiClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl GeminiClient {
    /// `base_url` must end with '/'. Every request is bounded by `timeout`.
    pub fn new(api_key: &str, base_url: Url, timeout: Duration) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pdfrows/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, OracleError> {
        Self::new(&cfg.api_key, cfg.base_url.clone(), cfg.request_timeout)
    }

    fn upload_endpoint(&self) -> Result<Url, OracleError> {
        Ok(self.base_url.join("upload/v1beta/files")?)
    }

    fn generate_endpoint(&self, model: &str) -> Result<Url, OracleError> {
        let model = model.strip_prefix("models/").unwrap_or(model);
        Ok(self
            .base_url
            .join(&format!("v1beta/models/{}:generateContent", model))?)
    }

    /// Resumable upload in two requests: start, then upload+finalize.
    #[instrument(level = "debug", skip(self))]
    async fn upload(&self, path: &Path) -> Result<UploadedFile, OracleError> {
        let bytes = fs::read(path).await.map_err(|source| OracleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.pdf".to_string());

        // 1) start
        let resp = self
            .client
            .post(self.upload_endpoint()?)
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", PDF_MIME)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        let resp = check_status(resp, "upload start").await?;
        let upload_url = resp
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(OracleError::MissingUploadUrl)?
            .to_string();

        // 2) send bytes and finalize
        let resp = self
            .client
            .post(upload_url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;
        let resp = check_status(resp, "upload finalize").await?;
        let body = resp.text().await?;
        decode_upload(&body)
    }

    async fn generate(
        &self,
        config: &OracleConfig,
        file: &UploadedFile,
    ) -> Result<String, OracleError> {
        let request = GenerateContentRequest::new(config, file);
        let resp = self
            .client
            .post(self.generate_endpoint(&config.model)?)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;
        let resp = check_status(resp, "generateContent").await?;
        let body = resp.text().await?;
        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| OracleError::Decode(e.to_string()))?;

        parsed.into_text()
    }
}

impl ExtractionOracle for GeminiClient {
    #[instrument(level = "info", skip_all, fields(file = %document.display(), model = %config.model))]
    async fn extract(&self, config: &OracleConfig, document: &Path) -> Result<String, OracleError> {
        info!("uploading");
        let file = self.upload(document).await?;
        info!(name = %file.name, uri = %file.uri, "uploaded");

        let text = self.generate(config, &file).await?;
        debug!(chars = text.len(), "model responded");
        Ok(text)
    }
}

/// The upload happens before the model is asked anything, so a bad body here
/// is not a model answer.
fn decode_upload(body: &str) -> Result<UploadedFile, OracleError> {
    let parsed: UploadResponse =
        serde_json::from_str(body).map_err(|e| OracleError::UploadDecode(e.to_string()))?;
    Ok(parsed.file)
}

async fn check_status(resp: Response, stage: &'static str) -> Result<Response, OracleError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(OracleError::Status {
        stage,
        status: status.as_u16(),
        body,
    })
}

// ----- wire types -----

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFile {
    name: String,
    uri: String,
    mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(config: &'a OracleConfig, file: &'a UploadedFile) -> Self {
        Self {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text(&config.instruction)],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part::FileData(FileData {
                    mime_type: file.mime_type.as_deref().unwrap_or(PDF_MIME),
                    file_uri: &file.uri,
                })],
            }],
            generation_config: GenerationConfig {
                temperature: config.temperature,
                response_mime_type: RESPONSE_MIME,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    Text(&'a str),
    FileData(FileData<'a>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData<'a> {
    mime_type: &'a str,
    file_uri: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts joined, surrounding whitespace
    /// trimmed.
    fn into_text(self) -> Result<String, OracleError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(OracleError::EmptyResponse {
                reason: block_reason,
            });
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            return Err(OracleError::EmptyResponse {
                reason: candidate.finish_reason.or(block_reason),
            });
        }
        Ok(text.to_string())
    }
}
