// src/config.rs

use std::{env, fmt, path::PathBuf, time::Duration};
use thiserror::Error;
use url::Url;

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro-preview-05-06";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
pub const DEFAULT_OUTPUT: &str = "gemini_extracted_data.csv";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY not found in environment variables")]
    MissingApiKey,

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Run settings, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub base_url: Url,
    pub output: PathBuf,
    pub request_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url.as_str())
            .field("output", &self.output)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Config {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Read settings through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("GEMINI_API_KEY").ok_or(ConfigError::MissingApiKey)?;
        let model = get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let raw_base = get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        // Url::join drops the last path segment unless the base ends in '/'
        let raw_base = if raw_base.ends_with('/') {
            raw_base
        } else {
            format!("{}/", raw_base)
        };
        let base_url = Url::parse(&raw_base).map_err(|e| ConfigError::Invalid {
            var: "GEMINI_BASE_URL",
            reason: e.to_string(),
        })?;

        let output = get("PDFROWS_OUTPUT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

        let timeout_secs = match get("PDFROWS_TIMEOUT_SECS") {
            Some(s) => match s.parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        var: "PDFROWS_TIMEOUT_SECS",
                        reason: "must be greater than zero".to_string(),
                    })
                }
                Ok(n) => n,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: "PDFROWS_TIMEOUT_SECS",
                        reason: e.to_string(),
                    })
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            model,
            base_url,
            output,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "secret")])).unwrap();
        assert_eq!(cfg.api_key, "secret");
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(cfg.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(cfg.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_missing_or_blank_key() {
        assert_eq!(
            Config::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::MissingApiKey
        );
        assert_eq!(
            Config::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap_err(),
            ConfigError::MissingApiKey
        );
    }

    #[test]
    fn test_overrides() {
        let cfg = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("GEMINI_BASE_URL", "http://localhost:8080/proxy"),
            ("PDFROWS_OUTPUT", "out/rows.csv"),
            ("PDFROWS_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(cfg.model, "gemini-2.0-flash");
        assert_eq!(cfg.base_url.as_str(), "http://localhost:8080/proxy/");
        assert_eq!(cfg.output, PathBuf::from("out/rows.csv"));
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("PDFROWS_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PDFROWS_TIMEOUT_SECS", .. }));

        let err = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("PDFROWS_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PDFROWS_TIMEOUT_SECS", .. }));

        let err = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_BASE_URL", "not a url"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "GEMINI_BASE_URL", .. }));
    }

    #[test]
    fn test_debug_redacts_key() {
        let cfg = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "topsecret")])).unwrap();
        let shown = format!("{:?}", cfg);
        assert!(!shown.contains("topsecret"));
        assert!(shown.contains("<redacted>"));
    }
}
