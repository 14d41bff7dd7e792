pub mod batch;
pub mod config;
pub mod oracle;
pub mod parse;
pub mod prompt;
pub mod schema;
