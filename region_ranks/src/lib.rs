//! Competition ranking of regional statistics.
//!
//! The pipeline is strictly sequential:
//!
//! 1. a [`RawTable`] is assembled with the [`builder::TableBuilder`],
//! 2. [`clean_table`] turns every cell into a number,
//! 3. [`rank_table`] computes, per field, a competition rank for every region,
//! 4. [`bundle::ExportBundle::assemble`] packs everything for a renderer, which
//!    uses the functions of [`encoding`] to paint it.
//!
//! All of these are plain functions over their inputs. Nothing is cached here.
mod config;
pub mod builder;
pub mod bundle;
pub mod encoding;
pub mod manual;

use log::{debug, info, warn};
use std::cmp::Ordering;

pub use crate::config::*;

// Cell separators for the digest. They cannot appear in a CSV cell without quoting.
const UNIT_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';

/// Cleans a single cell.
///
/// Removes `$`, `%` and `,`, trims the rest, and parses it as a 64-bit float.
/// An empty remainder is 0. Returns `None` for anything else that does not
/// parse, and for non-finite values (`NaN`, `inf`).
pub fn clean_cell(raw: &str) -> Option<f64> {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | '%' | ','))
        .collect();
    let s = stripped.trim();
    if s.is_empty() {
        return Some(0.0);
    }
    match s.parse::<f64>() {
        Ok(x) if x.is_finite() => Some(x),
        _ => None,
    }
}

/// Cleans every cell of the table.
///
/// Under [`ParsePolicy::Abort`] the first bad cell is returned as a
/// [`TableError::ParseError`]. Under [`ParsePolicy::SkipRegion`] the regions
/// with a bad cell are left out and listed in [`CleanOutcome::skipped`].
pub fn clean_table(raw: &RawTable, policy: ParsePolicy) -> Result<CleanOutcome, TableError> {
    let mut areas: Vec<String> = Vec::new();
    let mut values: Vec<Vec<f64>> = Vec::new();
    let mut skipped: Vec<TableError> = Vec::new();

    for row in raw.rows.iter() {
        match clean_row(row, &raw.fields) {
            Ok(vs) => {
                areas.push(row.area.clone());
                values.push(vs);
            }
            Err(e) if policy == ParsePolicy::SkipRegion => {
                warn!("clean_table: skipping region {:?}: {}", row.area, e);
                skipped.push(e);
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Cleaned {} regions x {} fields ({} skipped)",
        areas.len(),
        raw.fields.len(),
        skipped.len()
    );
    Ok(CleanOutcome {
        table: CleanedTable {
            fields: raw.fields.clone(),
            areas,
            values,
        },
        skipped,
    })
}

fn clean_row(row: &RawRow, fields: &[String]) -> Result<Vec<f64>, TableError> {
    let mut res: Vec<f64> = Vec::with_capacity(fields.len());
    for (field, cell) in fields.iter().zip(row.cells.iter()) {
        let x = clean_cell(cell).ok_or_else(|| TableError::ParseError {
            field: field.clone(),
            region: row.area.clone(),
            raw_value: cell.clone(),
        })?;
        res.push(x);
    }
    Ok(res)
}

/// Computes the competition ranks of one column.
///
/// The largest value gets rank 1. Tied values share the smallest rank of their
/// group and the next distinct value skips the intervening ranks, so that
/// `rank = 1 + (number of strictly greater values)`.
///
/// The values must not contain NaN ([`clean_cell`] never produces it). Ranks
/// are `u32`: past `u32::MAX` values, the ranks saturate at `u32::MAX`.
pub fn competition_ranks(values: &[f64]) -> Vec<u32> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    // Stable sort: ties keep their source order, which does not affect the ranks.
    order.sort_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(Ordering::Equal)
    });

    let mut ranks: Vec<u32> = vec![0; values.len()];
    let mut group_rank: u32 = 1;
    for (pos, &idx) in order.iter().enumerate() {
        if pos > 0 && values[idx] != values[order[pos - 1]] {
            group_rank = rank_at(pos);
        }
        ranks[idx] = group_rank;
    }
    ranks
}

/// The rank of the 0-based position `pos` in the sorted column.
fn rank_at(pos: usize) -> u32 {
    u32::try_from(pos).map_or(u32::MAX, |p| p.saturating_add(1))
}

/// Ranks every field of the cleaned table independently.
pub fn rank_table(cleaned: &CleanedTable) -> RankTable {
    let mut ranks: Vec<Vec<u32>> = vec![Vec::with_capacity(cleaned.fields.len()); cleaned.areas.len()];
    for (f_idx, field) in cleaned.fields.iter().enumerate() {
        let col = cleaned.column(f_idx);
        let col_ranks = competition_ranks(&col);
        debug!("rank_table: field {:?} ranks {:?}", field, col_ranks);
        for (r_idx, rank) in col_ranks.into_iter().enumerate() {
            ranks[r_idx].push(rank);
        }
    }
    RankTable {
        fields: cleaned.fields.clone(),
        areas: cleaned.areas.clone(),
        ranks,
    }
}

/// The arithmetic mean of every field, in field order.
///
/// A table without regions has a mean of 0 for every field.
pub fn field_averages(cleaned: &CleanedTable) -> Vec<(String, f64)> {
    let n = cleaned.areas.len();
    cleaned
        .fields
        .iter()
        .enumerate()
        .map(|(f_idx, field)| {
            let avg = if n == 0 {
                0.0
            } else {
                cleaned.values.iter().map(|row| row[f_idx]).sum::<f64>() / n as f64
            };
            (field.clone(), avg)
        })
        .collect()
}

impl RawTable {
    /// Hex SHA-256 digest of the header and of all the cells.
    ///
    /// Two tables with the same region order, field order and cell texts have
    /// the same digest.
    pub fn digest(&self) -> String {
        let mut canonical = String::new();
        for f in self.fields.iter() {
            canonical.push_str(f);
            canonical.push(UNIT_SEP);
        }
        canonical.push(RECORD_SEP);
        for row in self.rows.iter() {
            canonical.push_str(&row.area);
            canonical.push(UNIT_SEP);
            for c in row.cells.iter() {
                canonical.push_str(c);
                canonical.push(UNIT_SEP);
            }
            canonical.push(RECORD_SEP);
        }
        sha256::digest(canonical)
    }
}
