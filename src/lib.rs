//! # Part Tally
//!
//! Counts the distinct identifier values (part numbers, by default) listed
//! under a header label across every table of every sheet of a set of
//! spreadsheet documents.
//!
//! ## Features
//!
//! - **Header discovery**: case-insensitive exact or substring matching of
//!   the header label anywhere in a sheet
//! - **Table segmentation**: several tables stacked in one column are split
//!   at each repeated header
//! - **Value filtering**: blanks, the nested `key` header, and values with
//!   spaces, hyphens, or colons are skipped
//! - **Fault isolation**: an unreadable document is reported and the rest
//!   still count
//! - **Bounded parallelism**: documents are loaded and scanned on a worker
//!   pool
//! - **Readers**: Office Open XML (`.xlsx`, `.xlsm`) and OpenDocument (`.ods`)
//!
//! ## Example
//!
//! ```
//! use part_tally::grid::{CellValue, Document, SheetGrid};
//! use part_tally::grid::reference::parse;
//! use part_tally::tally::run;
//!
//! let sheet = SheetGrid::from_cells(
//!     "Sheet1",
//!     [("A1", "Part Number"), ("A2", "X100"), ("A3", "X100"), ("A4", "Y200")]
//!         .into_iter()
//!         .map(|(reference, value)| (parse(reference).unwrap(), CellValue::from(value))),
//! );
//! let tally = run([Ok(Document::new("bom.xlsx", vec![sheet]))], "Part Number");
//! assert_eq!(tally.count(), 2);
//! ```
pub mod error;
pub mod grid;
pub mod logging;
pub mod settings;
pub mod source;
pub mod tally;

pub use error::PartTallyError;
pub use grid::{CellCoordinate, CellValue, Document, SheetGrid};
pub use settings::Settings;
pub use source::{list_workbooks, open_document, DocumentSource, WorkbookFile};
pub use tally::{Aggregator, DocumentUnavailable, MatchMode, Tally, TallyOptions};
