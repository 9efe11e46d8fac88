use std::fmt::Display;

/// A scalar cell value as delivered by a document reader.
///
/// Every comparison made by the tally engine goes through the string form
/// produced by [`Display`], so numbers and booleans behave like their text.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    /// Text values (shared, inline, or formula string results)
    Text(String),
    /// Numeric values
    Number(f64),
    /// Boolean values (true/false)
    Boolean(bool),
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(value) => write!(f, "{value}"),
            // Integral values print without a fractional part ("100", not "100.0")
            Self::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            Self::Number(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}
