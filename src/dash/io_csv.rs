// Primitives for reading CSV files.

use std::path::Path;

use region_ranks::builder::TableBuilder;

use crate::dash::*;

/// Reads a table whose first row is the header and whose first column holds
/// the region names.
pub fn read_csv_table(path: &Path) -> DashResult<RawTable> {
    let path_str = path.display().to_string();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        // Ragged rows are reported by the table builder with the region name.
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {
            path: path_str.clone(),
        })?;

    let header = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1usize })?
        .clone();
    if header.is_empty() {
        return EmptyInputSnafu { path: path_str }.fail();
    }
    let fields: Vec<String> = header.iter().skip(1).map(|s| s.trim().to_string()).collect();
    debug!("read_csv_table: fields {:?}", fields);

    let mut builder = TableBuilder::new(&fields).context(InvalidTableSnafu {})?;
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_csv_table: lineno: {:?} row: {:?}", lineno, line);
        let area = line.get(0).unwrap_or_default();
        let cells: Vec<String> = line.iter().skip(1).map(|s| s.to_string()).collect();
        builder.add_row(area, &cells).context(InvalidTableSnafu {})?;
    }
    Ok(builder.build())
}
