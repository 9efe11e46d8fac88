//! # Sheet Grid Module
//!
//! The shared data substrate: cell references, cell values, and the sparse
//! sheet/document containers produced by the document readers and consumed
//! read-only by the tally engine.
pub mod cell;
pub mod reference;
pub mod sheet;

pub use cell::CellValue;
pub use reference::{CellCoordinate, CoordinateError};
pub use sheet::{Document, SheetGrid};
