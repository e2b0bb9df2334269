// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Declares whether a higher raw value is better for a field.
///
/// The polarity only changes the color channel used by the renderer. Ranks are
/// always computed descending: the largest value gets rank 1.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default, Serialize, Deserialize)]
pub enum Polarity {
    /// A higher value is better. Rendered in the green channel.
    #[default]
    Positive,
    /// A higher value is worse. Rendered in the red channel.
    Negative,
}

/// Field name -> polarity. Fields that are absent default to `Positive`.
pub type PolarityTable = BTreeMap<String, Polarity>;

/// What to do with a region that has a cell that cannot be cleaned.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum ParsePolicy {
    /// The first bad cell aborts the whole load.
    #[default]
    Abort,
    /// The offending region is dropped from the cleaned table and reported.
    SkipRegion,
}

/// One row of the source table, as read by the readers.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawRow {
    pub area: String,
    pub cells: Vec<String>,
}

/// The raw textual table.
///
/// Invariant: every row has exactly one cell per field. Use the
/// [`TableBuilder`](crate::builder::TableBuilder) to construct one.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawTable {
    pub(crate) fields: Vec<String>,
    pub(crate) rows: Vec<RawRow>,
}

impl RawTable {
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ******** Output data structures *********

/// Numeric values, row-major: `values[region][field]`.
#[derive(PartialEq, Debug, Clone)]
pub struct CleanedTable {
    pub(crate) fields: Vec<String>,
    pub(crate) areas: Vec<String>,
    pub(crate) values: Vec<Vec<f64>>,
}

impl CleanedTable {
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn areas(&self) -> &[String] {
        &self.areas
    }

    pub fn value(&self, area: &str, field: &str) -> Option<f64> {
        let r = self.areas.iter().position(|a| a == area)?;
        let f = self.fields.iter().position(|x| x == field)?;
        Some(self.values[r][f])
    }

    /// All the values of one field, in region order.
    pub fn column(&self, field_idx: usize) -> Vec<f64> {
        self.values.iter().map(|row| row[field_idx]).collect()
    }
}

/// The result of cleaning a raw table.
#[derive(PartialEq, Debug, Clone)]
pub struct CleanOutcome {
    pub table: CleanedTable,
    /// The regions dropped under [`ParsePolicy::SkipRegion`], with the first
    /// error found for each of them. Always empty under `Abort`.
    pub skipped: Vec<TableError>,
}

/// Competition ranks, row-major: `ranks[region][field]`. All ranks are >= 1.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankTable {
    pub(crate) fields: Vec<String>,
    pub(crate) areas: Vec<String>,
    pub(crate) ranks: Vec<Vec<u32>>,
}

impl RankTable {
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn areas(&self) -> &[String] {
        &self.areas
    }

    pub fn rank(&self, area: &str, field: &str) -> Option<u32> {
        let r = self.areas.iter().position(|a| a == area)?;
        let f = self.fields.iter().position(|x| x == field)?;
        Some(self.ranks[r][f])
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

/// Errors found while building, cleaning or exporting a table.
///
/// All of them are local to a cell, a row or a field name.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TableError {
    /// A cell still has non-numeric content after stripping `$`, `%` and `,`.
    ParseError {
        field: String,
        region: String,
        raw_value: String,
    },
    /// A row is shorter than the header.
    MissingRegionField { region: String, field: String },
    /// A row is longer than the header. `position` is the 0-based cell index
    /// after the region column.
    UnexpectedCell { region: String, position: usize },
    DuplicateRegion { region: String },
    DuplicateField { field: String },
    /// The region column is blank. `row` is 1-based, header excluded.
    EmptyRegionName { row: usize },
    /// A header cell is blank. `position` is the 0-based index after the
    /// region column.
    EmptyFieldName { position: usize },
    /// The field name is a key of the exported bundle.
    ReservedFieldName { field: String },
    /// The cleaned and rank tables do not describe the same dataset.
    ShapeMismatch,
}

impl Error for TableError {}

impl Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::ParseError {
                field,
                region,
                raw_value,
            } => write!(
                f,
                "cannot parse value {:?} of field {:?} for region {:?}",
                raw_value, field, region
            ),
            TableError::MissingRegionField { region, field } => {
                write!(f, "region {:?} has no value for field {:?}", region, field)
            }
            TableError::UnexpectedCell { region, position } => write!(
                f,
                "region {:?} has an extra cell at position {} (no matching field)",
                region, position
            ),
            TableError::DuplicateRegion { region } => {
                write!(f, "region {:?} appears more than once", region)
            }
            TableError::DuplicateField { field } => {
                write!(f, "field {:?} appears more than once", field)
            }
            TableError::EmptyRegionName { row } => write!(f, "row {} has no region name", row),
            TableError::EmptyFieldName { position } => {
                write!(f, "the header has no field name at position {}", position)
            }
            TableError::ReservedFieldName { field } => write!(
                f,
                "field {:?} collides with a reserved key of the exported bundle",
                field
            ),
            TableError::ShapeMismatch => {
                write!(f, "the cleaned table and the rank table do not match")
            }
        }
    }
}
