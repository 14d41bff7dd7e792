use anyhow::{anyhow, Context, Result};
use csv::{QuoteStyle, WriterBuilder};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use super::types::{ExtractedRow, COLUMNS};

/// Field separator for the output table. Same as the one the model emits.
pub const DELIMITER: u8 = b'|';

/// Write `rows` to `path` as a `|`-separated table with a header row.
///
/// - the parent directory is created if it is missing
/// - the table goes to a hidden temp file first, then is renamed over `path`
pub fn write_table<P: AsRef<Path>>(path: P, rows: &[ExtractedRow]) -> Result<()> {
    // 1) Resolve the target and its directory
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).with_context(|| format!("creating {:?}", dir))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("output path {:?} has no file name", path))?
        .to_string_lossy()
        .to_string();
    let tmp_path = dir.join(format!(".{}.tmp", file_name));

    // 2) Header + one record per row, then swap into place
    let written = write_records(&tmp_path, rows).and_then(|()| {
        fs::rename(&tmp_path, path)
            .with_context(|| format!("renaming {:?} -> {:?}", tmp_path, path))
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    debug!(path = %path.display(), rows = rows.len(), "table written");
    Ok(())
}

fn write_records(tmp_path: &Path, rows: &[ExtractedRow]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(DELIMITER)
        .quote_style(QuoteStyle::Necessary)
        .from_path(tmp_path)
        .with_context(|| format!("creating {:?}", tmp_path))?;

    writer
        .write_record(COLUMNS)
        .context("writing header row")?;
    for row in rows {
        writer
            .write_record(row.fields())
            .with_context(|| format!("writing row {:?}", row.doc_no))?;
    }
    let file = writer
        .into_inner()
        .map_err(|e| anyhow!("flushing {:?}: {}", tmp_path, e.error()))?;
    file.sync_all()
        .with_context(|| format!("syncing {:?}", tmp_path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(doc_no: &str, title: &str) -> ExtractedRow {
        ExtractedRow::from_fields(&["1", doc_no, "0", "1/7/2559", title, "a", "b", "c", "0"])
            .unwrap()
    }

    #[test]
    fn test_write_header_and_rows() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("out.csv");

        write_table(&path, &[row("01", "first"), row("02", "second")])?;

        let text = fs::read_to_string(&path)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "docgen|doc_no|f1|datedoc|doc_title|org_out|org_in|f2|f3",
                "1|01|0|1/7/2559|first|a|b|c|0",
                "1|02|0|1/7/2559|second|a|b|c|0",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_write_creates_parent_and_leaves_no_temp_file() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("nested").join("out.csv");

        write_table(&path, &[row("01", "x")])?;

        assert!(path.exists());
        let names: Vec<String> = fs::read_dir(path.parent().unwrap())?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["out.csv".to_string()]);
        Ok(())
    }

    #[test]
    fn test_failed_rename_removes_temp_file() -> Result<()> {
        let tmp = tempdir()?;
        // a non-empty directory where the table should go
        let path = tmp.path().join("out.csv");
        fs::create_dir(&path)?;
        fs::write(path.join("keep"), b"x")?;

        assert!(write_table(&path, &[row("01", "x")]).is_err());

        let mut names: Vec<String> = fs::read_dir(tmp.path())?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["out.csv".to_string()]);
        Ok(())
    }

    #[test]
    fn test_write_quotes_values_with_quotes() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("out.csv");

        write_table(&path, &[row("01", r#"the "annual" report"#)])?;

        let text = fs::read_to_string(&path)?;
        assert!(text.contains(r#"|"the ""annual"" report"|"#));
        Ok(())
    }

    #[test]
    fn test_write_keeps_utf8() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("out.csv");
        let title = "รายงานการสำรองข้อมูลประจำเดือน มิย.59";

        write_table(&path, &[row("01038/2559", title)])?;

        let text = fs::read_to_string(&path)?;
        assert!(text.contains(title));
        Ok(())
    }
}
