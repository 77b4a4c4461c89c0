// DocAnalyzer Core Services

pub mod analysis;
pub mod config_store;
pub mod export;
pub mod extraction;
pub mod highlight;
pub mod providers;
pub mod text_processor;

pub use config_store::*;
pub use extraction::{extract_text, is_valid_file_type, ExtractedDocument, ExtractionError};
pub use providers::*;
pub use text_processor::*;
