use std::collections::HashSet;

use log::debug;

pub use crate::config::*;

/// A builder for raw tables.
///
/// The readers feed it one row at a time. It checks the structural rules of
/// the table as rows come in, so that a [`RawTable`] always has one cell per
/// field for every region.
///
/// ```
/// use region_ranks::builder::TableBuilder;
/// # use region_ranks::TableError;
///
/// let mut builder = TableBuilder::new(&["Income".to_string(), "Unemployment".to_string()])?;
///
/// builder.add_row("North", &["$52,000".to_string(), "4.5%".to_string()])?;
/// builder.add_row("South", &["$48,500".to_string(), "".to_string()])?;
///
/// let table = builder.build();
/// assert_eq!(table.rows().len(), 2);
/// # Ok::<(), TableError>(())
/// ```
pub struct TableBuilder {
    pub(crate) _fields: Vec<String>,
    pub(crate) _rows: Vec<RawRow>,
    pub(crate) _seen: HashSet<String>,
}

impl TableBuilder {
    /// Starts a table with the given field names (the header without the
    /// region column). Blank names are rejected: each field becomes a key of
    /// the exported bundle.
    pub fn new(fields: &[String]) -> Result<TableBuilder, TableError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for (position, f) in fields.iter().enumerate() {
            if f.trim().is_empty() {
                return Err(TableError::EmptyFieldName { position });
            }
            if !seen.insert(f.as_str()) {
                return Err(TableError::DuplicateField { field: f.clone() });
            }
        }
        Ok(TableBuilder {
            _fields: fields.to_vec(),
            _rows: Vec::new(),
            _seen: HashSet::new(),
        })
    }

    /// Adds the row of one region.
    ///
    /// The region name is trimmed. The cells are kept verbatim: cleaning happens later.
    pub fn add_row(&mut self, area: &str, cells: &[String]) -> Result<(), TableError> {
        let area = area.trim();
        if area.is_empty() {
            return Err(TableError::EmptyRegionName {
                row: self._rows.len() + 1,
            });
        }
        if cells.len() < self._fields.len() {
            return Err(TableError::MissingRegionField {
                region: area.to_string(),
                field: self._fields[cells.len()].clone(),
            });
        }
        if cells.len() > self._fields.len() {
            return Err(TableError::UnexpectedCell {
                region: area.to_string(),
                position: self._fields.len(),
            });
        }
        if !self._seen.insert(area.to_string()) {
            return Err(TableError::DuplicateRegion {
                region: area.to_string(),
            });
        }
        debug!("add_row: {:?} {:?}", area, cells);
        self._rows.push(RawRow {
            area: area.to_string(),
            cells: cells.to_vec(),
        });
        Ok(())
    }

    pub fn build(self) -> RawTable {
        RawTable {
            fields: self._fields,
            rows: self._rows,
        }
    }
}
