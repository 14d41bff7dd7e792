// src/prompt.rs

use once_cell::sync::Lazy;

use crate::schema::{COLUMNS, NUM_COLUMNS};

const EXAMPLE_ROW: &str = "1|01038/2559|0|1/7/2559|รายงานการสำรองข้อมูลประจำเดือน มิย.59|งานสารบรรณ (สบ.)|กองบริหารการคลัง (กค.)|เดินเรื่องเอง เดินเรื่องเอง|0";

/// System instruction sent with every extraction request.
pub static SYSTEM_INSTRUCTION: Lazy<String> = Lazy::new(build_instruction);

fn build_instruction() -> String {
    format!(
        "You are a data extraction specialist. Your task is to analyze the provided document \
and extract information into a CSV format where '|' separates columns. Use this exact column order:
{columns}.

Follow these rules strictly:
1.  The column '{f1}' must always be 0.
2.  The output must always have exactly {n} columns per row.
3.  '{doc_no}' must be the second column and '{datedoc}' must be the fourth. Do not swap them.
4.  Any field that is blank or cannot be found must contain a single '0'.
5.  If you encounter a row in the document that you cannot understand or parse, skip that row entirely in your output.
6.  Do not output a header row. Only output the data rows.

Example of a valid output row:
{example}
",
        columns = COLUMNS.join("|"),
        f1 = COLUMNS[2],
        n = NUM_COLUMNS,
        doc_no = COLUMNS[1],
        datedoc = COLUMNS[3],
        example = EXAMPLE_ROW,
    )
}
