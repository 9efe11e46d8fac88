//! Excel-style cell references ("A1", "AB12") and their structured form.
//!
//! Columns are stored as upper-case letters so two references differing only
//! in case compare equal. Zero-based index helpers are provided for the
//! document readers, which see positions rather than references.
use regex::Regex;
use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)([0-9]+)$").expect("Hardcode regex pattern"));

/// Last row of a worksheet (Excel and LibreOffice limit).
pub const MAX_ROW: u32 = 1_048_576;

/// Errors related to cell reference parsing.
#[derive(Error, Debug, PartialEq)]
pub enum CoordinateError {
    #[error("Malformed cell coordinate '{0}'")]
    MalformedCoordinate(String),
}

/// A cell position: column letters plus a 1-based row number.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellCoordinate {
    column: String,
    row: u32,
}

impl CellCoordinate {
    /// Builds a coordinate from column letters and a 1-based row.
    ///
    /// Rows outside `1..=MAX_ROW` are malformed.
    pub fn new(column: &str, row: u32) -> Result<Self, CoordinateError> {
        let valid = !column.is_empty()
            && column.chars().all(|c| c.is_ascii_alphabetic())
            && col_to_index(column).is_some()
            && (1..=MAX_ROW).contains(&row);
        if valid {
            Ok(Self {
                column: column.to_ascii_uppercase(),
                row,
            })
        } else {
            Err(CoordinateError::MalformedCoordinate(format!("{column}{row}")))
        }
    }

    /// Builds a coordinate from 0-based row and column indexes, `None` past
    /// the last row.
    pub fn from_index(row: usize, col: usize) -> Option<Self> {
        let row = u32::try_from(row).ok()?.checked_add(1).filter(|row| *row <= MAX_ROW)?;
        Some(Self {
            column: index_to_col(col),
            row,
        })
    }

    /// Upper-case column letters.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// 1-based row number.
    pub fn row(&self) -> u32 {
        self.row
    }

    /// 0-based column index ("A" is 0).
    pub fn column_index(&self) -> usize {
        col_to_index(&self.column).unwrap_or_default()
    }

    /// Same column, different row.
    pub fn with_row(&self, row: u32) -> Self {
        Self {
            column: self.column.clone(),
            row,
        }
    }
}

impl Ord for CellCoordinate {
    /// Column-major order: "B1" < "AA1" < "AA2".
    fn cmp(&self, other: &Self) -> Ordering {
        self.column_index()
            .cmp(&other.column_index())
            .then(self.row.cmp(&other.row))
    }
}

impl PartialOrd for CellCoordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for CellCoordinate {
    type Err = CoordinateError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let malformed = || CoordinateError::MalformedCoordinate(text.to_owned());
        let captures = REFERENCE_PATTERN.captures(text).ok_or_else(malformed)?;
        let row = captures[2].parse::<u32>().map_err(|_| malformed())?;
        Self::new(&captures[1], row).map_err(|_| malformed())
    }
}

impl Display for CellCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.column, self.row)
    }
}

/// Parses text such as `"B12"` into a coordinate.
pub fn parse(text: &str) -> Result<CellCoordinate, CoordinateError> {
    text.parse()
}

/// Formats a coordinate back into its canonical text form.
pub fn format(coordinate: &CellCoordinate) -> String {
    coordinate.to_string()
}

/// Converts column letters to a 0-based index, case-insensitively.
/// Returns `None` for empty input, non-letters, or overflow.
pub fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for character in letters.chars() {
        if !character.is_ascii_alphabetic() {
            return None;
        }
        let digit = (character.to_ascii_uppercase() as usize) - ('A' as usize) + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index - 1)
}

/// Converts a 1-based row number text to a 0-based index.
pub fn row_to_index(digits: &str) -> Option<usize> {
    digits.parse::<usize>().ok()?.checked_sub(1)
}

/// Converts a 0-based column index to column letters.
pub fn index_to_col(index: usize) -> String {
    let mut column = index + 1;
    let mut letters = String::new();
    while column > 0 {
        column -= 1;
        letters.insert(0, char::from(b'A' + (column % 26) as u8));
        column /= 26;
    }
    letters
}

/// Converts an Excel-style reference to 0-based (row, column) indexes.
pub fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let captures = REFERENCE_PATTERN.captures(reference)?;
    let col = col_to_index(&captures[1])?;
    let row = row_to_index(&captures[2])?;
    Some((row, col))
}
