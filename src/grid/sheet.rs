use crate::grid::cell::CellValue;
use crate::grid::reference::CellCoordinate;
use std::collections::HashMap;

/// A named sheet holding a sparse mapping from coordinate to value.
///
/// The used range is computed once at construction; the grid is read-only
/// afterwards.
#[derive(Clone, Debug, Default)]
pub struct SheetGrid {
    /// Sheet name
    name: String,
    /// Occupied cells only; blank cells are simply absent
    cells: HashMap<CellCoordinate, CellValue>,
    /// Highest occupied row (1-based), 0 for an empty sheet
    max_row: u32,
    /// Highest occupied column index (0-based), None for an empty sheet
    max_col: Option<usize>,
}

impl SheetGrid {
    /// Builds a sheet from its cells. A later cell at the same coordinate
    /// replaces an earlier one.
    pub fn from_cells<I, V>(name: &str, cells: I) -> Self
    where
        I: IntoIterator<Item = (CellCoordinate, V)>,
        V: Into<CellValue>,
    {
        let cells: HashMap<CellCoordinate, CellValue> = cells
            .into_iter()
            .map(|(coordinate, value)| (coordinate, value.into()))
            .collect();
        let max_row = cells.keys().map(CellCoordinate::row).max().unwrap_or(0);
        let max_col = cells.keys().map(CellCoordinate::column_index).max();
        Self {
            name: name.to_owned(),
            cells,
            max_row,
            max_col,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up the cell at a coordinate, `None` when blank.
    pub fn get(&self, coordinate: &CellCoordinate) -> Option<&CellValue> {
        self.cells.get(coordinate)
    }

    /// Iterates over all occupied cells in no particular order.
    pub fn cells(&self) -> impl Iterator<Item = (&CellCoordinate, &CellValue)> {
        self.cells.iter()
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Highest occupied row number, 0 when the sheet is empty.
    pub fn max_row(&self) -> u32 {
        self.max_row
    }

    /// Highest occupied column index (0-based).
    pub fn max_col(&self) -> Option<usize> {
        self.max_col
    }
}

/// A parsed spreadsheet file: its sheets in workbook order.
#[derive(Clone, Debug, Default)]
pub struct Document {
    /// Source name, usually the file name
    pub name: String,
    pub sheets: Vec<SheetGrid>,
}

impl Document {
    pub fn new(name: &str, sheets: Vec<SheetGrid>) -> Self {
        Self {
            name: name.to_owned(),
            sheets,
        }
    }
}
