// src/batch.rs

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::{
    oracle::{ExtractionOracle, OracleConfig, OracleError},
    parse::{parse_response, ParseOutcome, ParseReport},
    schema::{write_table, ExtractedRow},
};

/// Pre-flight failures. These stop the run before any file is sent.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("the provided path is not a valid directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("no PDF files found in {0:?}")]
    NoInputFiles(PathBuf),

    #[error("listing {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Result of one file.
#[derive(Debug)]
pub enum FileOutcome {
    Extracted {
        rows: Vec<ExtractedRow>,
        report: ParseReport,
    },
    OracleFailed {
        error: OracleError,
    },
    NoValidRows {
        report: ParseReport,
    },
}

/// Which files made it into the output and which were skipped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub extracted: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Written {
        path: PathBuf,
        rows: usize,
        summary: RunSummary,
    },
    NothingExtracted {
        summary: RunSummary,
    },
}

/// All `*.pdf` files directly under `dir` (suffix matched case-insensitively),
/// sorted by path.
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    if !dir.is_dir() {
        return Err(BatchError::NotADirectory(dir.to_path_buf()));
    }

    // match the file name only; the directory itself is taken literally
    let pattern = Pattern::new("*.pdf")?;
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let entries = fs::read_dir(dir).map_err(|source| BatchError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .map(|n| pattern.matches_with(&n.to_string_lossy(), options))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(BatchError::NoInputFiles(dir.to_path_buf()));
    }
    Ok(files)
}

/// Send one file to the oracle and validate what comes back.
pub async fn process_file<O: ExtractionOracle>(
    oracle: &O,
    config: &OracleConfig,
    path: &Path,
) -> FileOutcome {
    match oracle.extract(config, path).await {
        Err(error) => FileOutcome::OracleFailed { error },
        Ok(text) => match parse_response(&text) {
            ParseOutcome::Rows { rows, report } => FileOutcome::Extracted { rows, report },
            ParseOutcome::NoValidRows { report } => FileOutcome::NoValidRows { report },
        },
    }
}

/// Process every PDF in `input_dir` in order and write the accepted rows to
/// `output`. Nothing is written when no file produced a row.
#[instrument(level = "info", skip(oracle, config), fields(input = %input_dir.display()))]
pub async fn run_batch<O: ExtractionOracle>(
    oracle: &O,
    config: &OracleConfig,
    input_dir: &Path,
    output: &Path,
) -> Result<RunOutcome> {
    let start = Instant::now();
    let files = discover_pdfs(input_dir)?;
    info!(count = files.len(), "found PDF files");

    let mut tables: Vec<Vec<ExtractedRow>> = Vec::new();
    let mut summary = RunSummary::default();

    for path in files {
        let name = path.display().to_string();
        match process_file(oracle, config, &path).await {
            FileOutcome::Extracted { rows, report } => {
                info!(
                    file = %name,
                    rows = rows.len(),
                    dropped = report.dropped(),
                    "extracted and validated"
                );
                tables.push(rows);
                summary.extracted.push(path);
            }
            FileOutcome::OracleFailed { error } => {
                if error.obtained_response() {
                    warn!(file = %name, error = %error, "unusable model response; skipping");
                } else {
                    error!(file = %name, error = %error, "extraction failed; skipping");
                }
                summary.skipped.push(path);
            }
            FileOutcome::NoValidRows { report } => {
                if report.lines == 0 {
                    warn!(file = %name, "model returned no rows; skipping");
                } else {
                    warn!(
                        file = %name,
                        lines = report.lines,
                        short = report.short,
                        overflow = report.overflow,
                        "no line had the expected column count; skipping"
                    );
                }
                summary.skipped.push(path);
            }
        }
    }

    if tables.is_empty() {
        warn!(
            skipped = summary.skipped.len(),
            elapsed = ?start.elapsed(),
            "no valid data was extracted from any of the files"
        );
        return Ok(RunOutcome::NothingExtracted { summary });
    }

    let combined: Vec<ExtractedRow> = tables.into_iter().flatten().collect();
    write_table(output, &combined)
        .with_context(|| format!("saving extracted rows to {}", output.display()))?;

    info!(
        output = %output.display(),
        rows = combined.len(),
        files_ok = summary.extracted.len(),
        skipped = summary.skipped.len(),
        elapsed = ?start.elapsed(),
        "all files processed"
    );
    Ok(RunOutcome::Written {
        path: output.to_path_buf(),
        rows: combined.len(),
        summary,
    })
}
