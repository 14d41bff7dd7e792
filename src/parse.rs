// src/parse.rs

use tracing::{debug, warn};

use crate::schema::{ExtractedRow, NUM_COLUMNS};

/// Field separator the model is instructed to use.
pub const FIELD_SEPARATOR: char = '|';

/// Line counts gathered while parsing one response.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseReport {
    /// Non-empty lines seen.
    pub lines: usize,
    pub accepted: usize,
    /// Lines with fewer fields than the schema.
    pub short: usize,
    /// Lines with more fields than the schema, usually a `|` inside a value.
    pub overflow: usize,
}

impl ParseReport {
    pub fn dropped(&self) -> usize {
        self.short + self.overflow
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// At least one valid row.
    Rows {
        rows: Vec<ExtractedRow>,
        report: ParseReport,
    },
    /// Nothing usable. `report.lines == 0` means the response was blank.
    NoValidRows { report: ParseReport },
}

impl ParseOutcome {
    pub fn report(&self) -> &ParseReport {
        match self {
            ParseOutcome::Rows { report, .. } | ParseOutcome::NoValidRows { report } => report,
        }
    }
}

/// Split a model response into rows, keeping only lines with exactly
/// [`NUM_COLUMNS`] `|`-separated fields. Field text is kept as-is.
pub fn parse_response(text: &str) -> ParseOutcome {
    let mut rows = Vec::new();
    let mut report = ParseReport::default();

    for (idx, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        report.lines += 1;

        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        match ExtractedRow::from_fields(&fields) {
            Some(row) => {
                report.accepted += 1;
                rows.push(row);
            }
            None if fields.len() > NUM_COLUMNS => {
                report.overflow += 1;
                warn!(
                    line = idx + 1,
                    fields = fields.len(),
                    "dropping row with extra fields (unescaped '|' in a value?)"
                );
            }
            None => {
                report.short += 1;
                debug!(line = idx + 1, fields = fields.len(), "dropping short row");
            }
        }
    }

    if rows.is_empty() {
        ParseOutcome::NoValidRows { report }
    } else {
        ParseOutcome::Rows { rows, report }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_A: &str = "1|01/2559|0|1/7/2559|report A|org1|org2|x|0";
    const VALID_B: &str = "2|02/2559|0|2/7/2559|report B|org3|org4|y|0";

    fn rows_of(outcome: ParseOutcome) -> Vec<ExtractedRow> {
        match outcome {
            ParseOutcome::Rows { rows, .. } => rows,
            other => panic!("expected rows, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_lines_keep_field_order() {
        let text = format!("{}\n{}\n", VALID_A, VALID_B);
        let rows = rows_of(parse_response(&text));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fields().join("|"), VALID_A);
        assert_eq!(rows[1].fields().join("|"), VALID_B);
    }

    #[test]
    fn test_malformed_lines_dropped_others_kept() {
        let text = format!(
            "{}\nnot|enough|fields\n{}\n{}|extra\n",
            VALID_A, VALID_B, VALID_A
        );
        let outcome = parse_response(&text);
        let report = *outcome.report();
        assert_eq!(report.lines, 4);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.short, 1);
        assert_eq!(report.overflow, 1);
        assert_eq!(report.dropped(), 2);

        let rows = rows_of(outcome);
        assert_eq!(rows[0].doc_no, "01/2559");
        assert_eq!(rows[1].doc_no, "02/2559");
    }

    #[test]
    fn test_blank_response_is_absent() {
        let outcome = parse_response("\n\n\n");
        assert_eq!(
            outcome,
            ParseOutcome::NoValidRows {
                report: ParseReport::default()
            }
        );
        assert_eq!(
            parse_response(""),
            ParseOutcome::NoValidRows {
                report: ParseReport::default()
            }
        );
    }

    #[test]
    fn test_only_malformed_lines_is_absent_but_counted() {
        let outcome = parse_response("```\nsome|text\n```");
        match outcome {
            ParseOutcome::NoValidRows { report } => {
                assert_eq!(report.lines, 3);
                assert_eq!(report.short, 3);
            }
            other => panic!("expected no rows, got {:?}", other),
        }
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = format!("{}\r\n{}\r\n", VALID_A, VALID_B);
        let rows = rows_of(parse_response(&text));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].f3, "0");
    }

    #[test]
    fn test_fields_not_trimmed() {
        let rows = rows_of(parse_response(" 1 |a|0|d| t |o|i|x|0 "));
        assert_eq!(rows[0].docgen, " 1 ");
        assert_eq!(rows[0].doc_title, " t ");
        assert_eq!(rows[0].f3, "0 ");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = format!("{}\nbad\n{}", VALID_A, VALID_B);
        assert_eq!(parse_response(&text), parse_response(&text));
    }
}
