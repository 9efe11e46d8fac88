//! # Tally Engine
//!
//! Finds every table headed by a configured label, extracts the identifier
//! values beneath it, and merges them into one deduplicated set across all
//! sheets of all documents.
//!
//! The pipeline per sheet is locate → group by column → segment → extract.
//! All stages read the [`SheetGrid`](crate::grid::SheetGrid) immutably.
pub mod aggregator;
pub mod extractor;
pub mod locator;
pub mod segmenter;
pub mod validator;

pub use aggregator::{run, Aggregator, DocumentUnavailable, Tally, TallyOptions, DEFAULT_LABEL};
pub use extractor::extract;
pub use locator::{locate, HeaderOccurrence, MatchMode};
pub use segmenter::{group_by_column, segment, TableRegion};
pub use validator::{is_sentinel, is_valid, normalize};
