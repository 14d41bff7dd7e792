// src/schema/types.rs

/// Output columns, in the order the model is told to emit them.
pub const COLUMNS: [&str; 9] = [
    "docgen",
    "doc_no",
    "f1",
    "datedoc",
    "doc_title",
    "org_out",
    "org_in",
    "f2",
    "f3",
];

pub const NUM_COLUMNS: usize = COLUMNS.len();

/// One accepted row of model output, positionally aligned to [`COLUMNS`].
///
/// Only built through [`ExtractedRow::from_fields`], which enforces the
/// exact field count.
#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub struct ExtractedRow {
    pub docgen: String,
    pub doc_no: String,
    pub f1: String,
    pub datedoc: String,
    pub doc_title: String,
    pub org_out: String,
    pub org_in: String,
    pub f2: String,
    pub f3: String,
}

impl ExtractedRow {
    /// Build a row from split fields. Returns `None` unless there are exactly
    /// [`NUM_COLUMNS`] of them.
    pub fn from_fields(fields: &[&str]) -> Option<Self> {
        let [docgen, doc_no, f1, datedoc, doc_title, org_out, org_in, f2, f3] = fields else {
            return None;
        };
        Some(Self {
            docgen: docgen.to_string(),
            doc_no: doc_no.to_string(),
            f1: f1.to_string(),
            datedoc: datedoc.to_string(),
            doc_title: doc_title.to_string(),
            org_out: org_out.to_string(),
            org_in: org_in.to_string(),
            f2: f2.to_string(),
            f3: f3.to_string(),
        })
    }

    /// Field values in column order.
    pub fn fields(&self) -> [&str; NUM_COLUMNS] {
        [
            self.docgen.as_str(),
            self.doc_no.as_str(),
            self.f1.as_str(),
            self.datedoc.as_str(),
            self.doc_title.as_str(),
            self.org_out.as_str(),
            self.org_in.as_str(),
            self.f2.as_str(),
            self.f3.as_str(),
        ]
    }
}
