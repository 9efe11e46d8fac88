use crate::grid::CellCoordinate;
use crate::grid::SheetGrid;
use crate::tally::segmenter::TableRegion;
use crate::tally::validator::is_sentinel;
use crate::tally::validator::is_valid;
use crate::tally::validator::normalize;
use std::collections::BTreeSet;
use tracing::debug;

/// Reads the data rows of a region and returns its normalized, valid values.
///
/// Blank rows, the `"key"` sentinel, and rejected values are skipped without
/// ending the scan. A region whose header cell is missing from the sheet
/// yields an empty set.
pub fn extract(sheet: &SheetGrid, region: &TableRegion) -> BTreeSet<String> {
    let mut values = BTreeSet::new();
    let header = match CellCoordinate::new(&region.column, region.header_row) {
        Ok(header) if sheet.get(&header).is_some() => header,
        _ => {
            debug!(region = %region, "header cell missing, region skipped");
            return values;
        }
    };

    for row in region.data_start..region.data_end_exclusive {
        let Some(value) = sheet.get(&header.with_row(row)) else {
            continue;
        };
        let value = normalize(&value.to_string());
        if is_sentinel(&value) || !is_valid(&value) {
            continue;
        }
        values.insert(value);
    }
    values
}
