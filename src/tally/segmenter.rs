use crate::grid::SheetGrid;
use crate::tally::locator::HeaderOccurrence;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt::Display;

/// The rows of one column belonging to a single header occurrence.
///
/// Data rows are `data_start..data_end_exclusive`; the end is either the next
/// header row in the same column or one past the sheet's last used row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRegion {
    pub sheet: String,
    /// Upper-case column letters
    pub column: String,
    pub header_row: u32,
    pub data_start: u32,
    pub data_end_exclusive: u32,
}

impl TableRegion {
    /// Number of data rows (occupied or not) in the region.
    pub fn len(&self) -> u32 {
        self.data_end_exclusive - self.data_start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Display for TableRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}!{}{}:{}{}",
            self.sheet, self.column, self.data_start, self.column, self.data_end_exclusive
        )
    }
}

/// Splits occurrences into per-column groups, ordered by column.
pub fn group_by_column(occurrences: &[HeaderOccurrence]) -> Vec<Vec<&HeaderOccurrence>> {
    let mut groups = BTreeMap::<usize, Vec<&HeaderOccurrence>>::new();
    for occurrence in occurrences {
        groups
            .entry(occurrence.coordinate.column_index())
            .or_default()
            .push(occurrence);
    }
    groups.into_values().collect()
}

/// Derives one table region per distinct header row of a single column.
///
/// All occurrences are expected to share the first occurrence's column;
/// others are ignored. Repeated rows collapse into one boundary.
pub fn segment(sheet: &SheetGrid, occurrences: &[&HeaderOccurrence]) -> Vec<TableRegion> {
    let Some(first) = occurrences.first() else {
        return Vec::new();
    };
    let column = first.coordinate.column();
    let rows: Vec<u32> = occurrences
        .iter()
        .filter(|occurrence| occurrence.coordinate.column() == column)
        .map(|occurrence| occurrence.coordinate.row())
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .collect();

    // Rows are at most MAX_ROW, so the +1 bounds stay within u32
    let sheet_end = sheet.max_row() + 1;
    rows.iter()
        .enumerate()
        .map(|(index, &header_row)| {
            let data_start = header_row + 1;
            let next_header = rows.get(index + 1).copied().unwrap_or(sheet_end);
            TableRegion {
                sheet: sheet.name().to_owned(),
                column: column.to_owned(),
                header_row,
                data_start,
                data_end_exclusive: next_header.max(data_start),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::reference::parse;
    use crate::grid::reference::MAX_ROW;
    use crate::grid::CellValue;
    use crate::tally::locator::locate;
    use crate::tally::locator::MatchMode;

    fn sheet(cells: &[(&str, &str)]) -> SheetGrid {
        SheetGrid::from_cells(
            "Sheet1",
            cells
                .iter()
                .map(|(reference, value)| (parse(reference).unwrap(), CellValue::from(*value))),
        )
    }

    fn occurrence(reference: &str) -> HeaderOccurrence {
        HeaderOccurrence {
            sheet: "Sheet1".to_owned(),
            coordinate: parse(reference).unwrap(),
            matched_text: "part number".to_owned(),
        }
    }

    #[test]
    fn two_stacked_tables() {
        let sheet = sheet(&[("A1", "part number"), ("A6", "part number"), ("B10", "end")]);
        let occurrences = [occurrence("A1"), occurrence("A6")];
        let regions = segment(&sheet, &occurrences.iter().collect::<Vec<_>>());

        assert_eq!(regions.len(), 2);
        assert_eq!((regions[0].data_start, regions[0].data_end_exclusive), (2, 6));
        assert_eq!((regions[1].data_start, regions[1].data_end_exclusive), (7, 11));
        assert_eq!(regions[0].header_row, 1);
        assert_eq!(regions[1].header_row, 6);
        assert_eq!(regions[0].to_string(), "Sheet1!A2:A6");
    }

    #[test]
    fn unsorted_and_repeated_rows_collapse() {
        let sheet = sheet(&[("C3", "part number"), ("C8", "x")]);
        let occurrences = [occurrence("C8"), occurrence("C3"), occurrence("c3")];
        let regions = segment(&sheet, &occurrences.iter().collect::<Vec<_>>());

        let rows: Vec<u32> = regions.iter().map(|region| region.header_row).collect();
        assert_eq!(rows, [3, 8]);
        assert_eq!(regions[0].data_end_exclusive, 8);
        assert_eq!(regions[1].data_end_exclusive, 9);
    }

    #[test]
    fn header_on_last_row_is_empty_region() {
        let sheet = sheet(&[("A4", "part number")]);
        let occurrences = [occurrence("A4")];
        let regions = segment(&sheet, &occurrences.iter().collect::<Vec<_>>());

        assert_eq!(regions.len(), 1);
        assert!(regions[0].is_empty());
        assert!(regions[0].data_start <= regions[0].data_end_exclusive);
    }

    #[test]
    fn cells_on_the_last_sheet_row() {
        let sheet = sheet(&[("A1", "part number"), ("A2", "x1"), ("B1048576", "stray"), ("A1048576", "part number")]);
        let occurrences = [occurrence("A1"), occurrence("A1048576")];
        let regions = segment(&sheet, &occurrences.iter().collect::<Vec<_>>());

        assert_eq!(sheet.max_row(), MAX_ROW);
        assert_eq!((regions[0].data_start, regions[0].data_end_exclusive), (2, MAX_ROW));
        assert_eq!((regions[1].data_start, regions[1].data_end_exclusive), (MAX_ROW + 1, MAX_ROW + 1));
        assert!(regions[1].is_empty());
    }

    #[test]
    fn adjacent_headers_produce_empty_region() {
        let sheet = sheet(&[("A1", "part number"), ("A2", "part number"), ("A3", "x")]);
        let occurrences = [occurrence("A1"), occurrence("A2")];
        let regions = segment(&sheet, &occurrences.iter().collect::<Vec<_>>());

        assert_eq!(regions[0].len(), 0);
        assert_eq!(regions[1].len(), 1);
    }

    #[test]
    fn other_columns_are_ignored() {
        let sheet = sheet(&[("A1", "part number"), ("B5", "part number")]);
        let occurrences = [occurrence("A1"), occurrence("B5")];
        let regions = segment(&sheet, &occurrences.iter().collect::<Vec<_>>());

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].column, "A");
        assert_eq!(regions[0].data_end_exclusive, 6);
    }

    #[test]
    fn side_by_side_tables_are_independent() {
        let sheet = sheet(&[
            ("A1", "Part Number"),
            ("A2", "x1"),
            ("D1", "Part Number"),
            ("D3", "Part Number"),
            ("D4", "y1"),
        ]);
        let occurrences = locate(&sheet, "part number", MatchMode::Substring);
        let groups = group_by_column(&occurrences);

        assert_eq!(groups.len(), 2);
        let left = segment(&sheet, &groups[0]);
        let right = segment(&sheet, &groups[1]);
        assert_eq!(left.len(), 1);
        assert_eq!((left[0].data_start, left[0].data_end_exclusive), (2, 5));
        assert_eq!(right.len(), 2);
        assert_eq!((right[0].data_start, right[0].data_end_exclusive), (2, 3));
        assert_eq!((right[1].data_start, right[1].data_end_exclusive), (4, 5));
    }

    #[test]
    fn no_occurrences_no_regions() {
        let sheet = sheet(&[("A1", "x")]);
        assert!(segment(&sheet, &[]).is_empty());
        assert!(group_by_column(&[]).is_empty());
    }
}
