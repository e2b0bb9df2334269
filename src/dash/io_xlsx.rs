// Primitives for reading Excel workbooks.

use std::path::Path;

use calamine::{open_workbook, DataType, Reader, Xlsx};
use region_ranks::builder::TableBuilder;

use crate::dash::*;

/// Reads a table from a worksheet (the first one if `worksheet` is not
/// provided). Same layout as the CSV files: header first, region names in the
/// first column.
pub fn read_excel_table(path: &Path, worksheet: Option<&str>) -> DashResult<RawTable> {
    let p = path.display().to_string();
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path: p.clone() })?;
    let wrange = match worksheet {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu {
                name,
                path: p.clone(),
            })?
            .context(OpeningExcelSnafu { path: p.clone() })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path: p.clone() })?
            .context(OpeningExcelSnafu { path: p.clone() })?,
    };

    let mut iter = wrange.rows();
    let header = iter.next().context(EmptyExcelSnafu { path: p.clone() })?;
    debug!("header: {:?}", header);
    let mut fields: Vec<String> = Vec::new();
    for cell in header.iter().skip(1) {
        fields.push(cell_text(cell)?.trim().to_string());
    }
    // The used range of a sheet may be wider than the table.
    while fields.last().map(|f| f.is_empty()).unwrap_or(false) {
        fields.pop();
    }

    let mut builder = TableBuilder::new(&fields).context(InvalidTableSnafu {})?;
    for row in iter {
        debug!("workbook: {:?}", row);
        let mut cells: Vec<String> = Vec::new();
        for cell in row.iter() {
            cells.push(cell_text(cell)?);
        }
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let area = cells.remove(0);
        while cells.len() > fields.len() && cells.last().map(|c| c.is_empty()).unwrap_or(false) {
            cells.pop();
        }
        builder.add_row(&area, &cells).context(InvalidTableSnafu {})?;
    }
    Ok(builder.build())
}

/// The text of a cell, as it would appear in a CSV export.
fn cell_text(cell: &DataType) -> DashResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Empty => Ok("".to_string()),
        _ => whatever!("read_excel_table: could not understand cell {:?}", cell),
    }
}
