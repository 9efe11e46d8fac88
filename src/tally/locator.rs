use crate::grid::CellCoordinate;
use crate::grid::SheetGrid;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;

/// How a cell's text is compared with the header label.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Cell text equals the label, case-insensitively
    Exact,
    /// Cell text contains the label, case-insensitively ("Part Number (ea)")
    #[default]
    Substring,
}

impl MatchMode {
    /// Compares lower-cased cell text with a lower-cased label.
    fn matches(self, text: &str, label: &str) -> bool {
        match self {
            Self::Exact => text == label,
            Self::Substring => text.contains(label),
        }
    }
}

impl Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Substring => write!(f, "substring"),
        }
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "substring" | "contains" => Ok(Self::Substring),
            _ => Err(format!("unknown match mode '{name}'")),
        }
    }
}

/// A cell whose text matched the header label.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderOccurrence {
    pub sheet: String,
    pub coordinate: CellCoordinate,
    /// The cell's original text
    pub matched_text: String,
}

/// Finds every cell in the sheet matching `label`.
///
/// Results are sorted by column, then by row. No match yields an empty
/// vector. An empty label matches nothing.
pub fn locate(sheet: &SheetGrid, label: &str, mode: MatchMode) -> Vec<HeaderOccurrence> {
    let label = label.to_lowercase();
    if label.is_empty() {
        return Vec::new();
    }
    let mut occurrences: Vec<HeaderOccurrence> = sheet
        .cells()
        .filter_map(|(coordinate, value)| {
            let text = value.to_string();
            mode.matches(&text.to_lowercase(), &label).then(|| HeaderOccurrence {
                sheet: sheet.name().to_owned(),
                coordinate: coordinate.clone(),
                matched_text: text,
            })
        })
        .collect();
    occurrences.sort_by(|a, b| a.coordinate.cmp(&b.coordinate));
    occurrences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::reference::format;
    use crate::grid::reference::parse;
    use crate::grid::CellValue;

    fn sheet(cells: &[(&str, &str)]) -> SheetGrid {
        SheetGrid::from_cells(
            "Sheet1",
            cells
                .iter()
                .map(|(reference, value)| (parse(reference).unwrap(), CellValue::from(*value))),
        )
    }

    fn references(occurrences: &[HeaderOccurrence]) -> Vec<String> {
        occurrences.iter().map(|o| format(&o.coordinate)).collect()
    }

    #[test]
    fn substring_is_default_and_matches_annotated_header() {
        let sheet = sheet(&[("A1", "Part Number (ea)"), ("A2", "x100")]);
        let occurrences = locate(&sheet, "part number", MatchMode::default());

        assert_eq!(references(&occurrences), ["A1"]);
        assert_eq!(occurrences[0].matched_text, "Part Number (ea)");
        assert_eq!(occurrences[0].sheet, "Sheet1");
    }

    #[test]
    fn exact_requires_whole_text() {
        let sheet = sheet(&[("A1", "Part Number (ea)"), ("C4", "PART NUMBER")]);
        let occurrences = locate(&sheet, "Part Number", MatchMode::Exact);

        assert_eq!(references(&occurrences), ["C4"]);
    }

    #[test]
    fn ordered_by_row_within_column() {
        let sheet = sheet(&[
            ("B9", "part number"),
            ("AA1", "part number"),
            ("B2", "part number"),
            ("A5", "part number"),
        ]);
        let occurrences = locate(&sheet, "Part Number", MatchMode::Substring);

        assert_eq!(references(&occurrences), ["A5", "B2", "B9", "AA1"]);
    }

    #[test]
    fn no_match_is_empty() {
        let sheet = sheet(&[("A1", "Description")]);

        assert!(locate(&sheet, "part number", MatchMode::Substring).is_empty());
        assert!(locate(&sheet, "", MatchMode::Substring).is_empty());
    }

    #[test]
    fn numeric_cells_match_by_string_form() {
        let sheet = SheetGrid::from_cells("Sheet1", [(parse("A1").unwrap(), CellValue::Number(42.0))]);

        assert_eq!(references(&locate(&sheet, "42", MatchMode::Exact)), ["A1"]);
    }

    #[test]
    fn match_mode_from_str() {
        assert_eq!("Exact".parse::<MatchMode>(), Ok(MatchMode::Exact));
        assert_eq!("substring".parse::<MatchMode>(), Ok(MatchMode::Substring));
        assert!("fuzzy".parse::<MatchMode>().is_err());
    }
}
