pub mod types;
pub mod write;

pub use types::{ExtractedRow, COLUMNS, NUM_COLUMNS};
pub use write::write_table;
