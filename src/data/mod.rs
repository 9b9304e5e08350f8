//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - Post content encoding (the `[IMAGE]` marker codec)
//! - Local diagnosis ledger (capped JSON file)
//! - Built-in product/expert catalog

pub mod catalog;
pub mod content;
mod database;
mod ledger;
mod models;

pub use content::{
    ContentBlock, EncodedContent, IMAGE_MARKER, IMAGE_PLACEHOLDER_LABEL, ImageAlign, ImageSize,
    decode_content, encode_blocks, preview_excerpt,
};
pub use database::Database;
pub use ledger::{DiagnosisLedger, LEDGER_CAPACITY};
pub use models::*;

#[cfg(test)]
mod database_test;
