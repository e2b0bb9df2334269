//! The exported bundle: the only thing handed to a renderer.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::*;
use crate::encoding::{fill_color, Bar, Rgb};
use crate::field_averages;

/// Top-level keys of the serialized bundle. A field cannot use one of them
/// since every field also gets its own top-level mapping.
pub const RESERVED_KEYS: [&str; 7] = [
    "areas",
    "fields",
    "all_fields",
    "raw_values",
    "field_stats",
    "field_polarity",
    "source_digest",
];

#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FieldStats {
    pub average: f64,
}

/// Ranks, values and metadata of a dataset, in the shape the map expects.
///
/// `field_ranks` is flattened: every field appears as its own top-level key
/// mapping region -> rank. It repeats `all_fields` and is kept for the
/// renderers that look ranks up by field.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ExportBundle {
    /// Region names, in the order of the source table.
    pub areas: Vec<String>,
    /// Field names, in the order of the source table.
    pub fields: Vec<String>,
    /// region -> field -> rank
    pub all_fields: BTreeMap<String, BTreeMap<String, u32>>,
    /// region -> field -> cleaned value
    pub raw_values: BTreeMap<String, BTreeMap<String, f64>>,
    pub field_stats: BTreeMap<String, FieldStats>,
    pub field_polarity: BTreeMap<String, Polarity>,
    /// Digest of the raw table the ranks come from, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_digest: Option<String>,
    /// field -> region -> rank
    #[serde(flatten)]
    pub field_ranks: BTreeMap<String, BTreeMap<String, u32>>,
}

/// One line of the details of a region.
#[derive(PartialEq, Debug, Clone)]
pub struct FieldDetail {
    pub field: String,
    pub raw_value: f64,
    pub rank: u32,
    pub polarity: Polarity,
    pub bar: Bar,
}

impl ExportBundle {
    /// Packs a cleaned table and its ranks.
    ///
    /// Fields missing from `polarity` are `Positive`. Entries of `polarity`
    /// that are not fields of the table are ignored.
    pub fn assemble(
        cleaned: &CleanedTable,
        ranks: &RankTable,
        polarity: &PolarityTable,
        source_digest: Option<String>,
    ) -> Result<ExportBundle, TableError> {
        if cleaned.fields != ranks.fields || cleaned.areas != ranks.areas {
            return Err(TableError::ShapeMismatch);
        }
        if let Some(f) = cleaned
            .fields
            .iter()
            .find(|f| RESERVED_KEYS.contains(&f.as_str()))
        {
            return Err(TableError::ReservedFieldName { field: f.clone() });
        }
        for name in polarity.keys() {
            if !cleaned.fields.contains(name) {
                warn!("assemble: polarity given for unknown field {:?}, ignored", name);
            }
        }

        let mut all_fields: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();
        let mut raw_values: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        let mut field_ranks: BTreeMap<String, BTreeMap<String, u32>> = cleaned
            .fields
            .iter()
            .map(|f| (f.clone(), BTreeMap::new()))
            .collect();

        for (r_idx, area) in cleaned.areas.iter().enumerate() {
            let mut area_ranks: BTreeMap<String, u32> = BTreeMap::new();
            let mut area_values: BTreeMap<String, f64> = BTreeMap::new();
            for (f_idx, field) in cleaned.fields.iter().enumerate() {
                let rank = ranks.ranks[r_idx][f_idx];
                area_ranks.insert(field.clone(), rank);
                area_values.insert(field.clone(), cleaned.values[r_idx][f_idx]);
                if let Some(m) = field_ranks.get_mut(field) {
                    m.insert(area.clone(), rank);
                }
            }
            all_fields.insert(area.clone(), area_ranks);
            raw_values.insert(area.clone(), area_values);
        }

        let field_stats: BTreeMap<String, FieldStats> = field_averages(cleaned)
            .into_iter()
            .map(|(f, average)| (f, FieldStats { average }))
            .collect();
        let field_polarity: BTreeMap<String, Polarity> = cleaned
            .fields
            .iter()
            .map(|f| (f.clone(), polarity.get(f).copied().unwrap_or_default()))
            .collect();
        debug!("assemble: field polarity {:?}", field_polarity);

        Ok(ExportBundle {
            areas: cleaned.areas.clone(),
            fields: cleaned.fields.clone(),
            all_fields,
            raw_values,
            field_stats,
            field_polarity,
            source_digest,
            field_ranks,
        })
    }

    /// The scale of the color and bar encodings: the number of regions.
    pub fn max_rank(&self) -> u32 {
        self.areas.len() as u32
    }

    pub fn rank(&self, field: &str, area: &str) -> Option<u32> {
        self.all_fields.get(area)?.get(field).copied()
    }

    pub fn polarity(&self, field: &str) -> Polarity {
        self.field_polarity.get(field).copied().unwrap_or_default()
    }

    /// The fill of a region when `field` is selected. `None` when the region
    /// has no rank for that field (the renderer clears the fill).
    pub fn fill_for(&self, field: &str, area: &str) -> Option<Rgb> {
        let rank = self.rank(field, area)?;
        Some(fill_color(rank, self.max_rank(), self.polarity(field)))
    }

    /// The details of a region: every field with its value, rank and bar.
    /// Each bar uses the polarity of its own field.
    pub fn area_details(&self, area: &str) -> Option<Vec<FieldDetail>> {
        let ranks = self.all_fields.get(area)?;
        let values = self.raw_values.get(area);
        let total = self.max_rank();
        let details = self
            .fields
            .iter()
            .filter_map(|field| {
                let rank = *ranks.get(field)?;
                let polarity = self.polarity(field);
                Some(FieldDetail {
                    field: field.clone(),
                    raw_value: values.and_then(|v| v.get(field)).copied().unwrap_or(0.0),
                    rank,
                    polarity,
                    bar: Bar::new(rank, total, polarity),
                })
            })
            .collect();
        Some(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TableBuilder;
    use crate::encoding::Channel;
    use crate::{clean_table, rank_table};

    fn bundle_of(
        fields: &[&str],
        rows: &[(&str, &[&str])],
        polarity: &PolarityTable,
    ) -> Result<ExportBundle, TableError> {
        let fields: Vec<String> = fields.iter().map(|s| s.to_string()).collect();
        let mut b = TableBuilder::new(&fields)?;
        for (area, cells) in rows {
            let cells: Vec<String> = cells.iter().map(|s| s.to_string()).collect();
            b.add_row(area, &cells)?;
        }
        let raw = b.build();
        let cleaned = clean_table(&raw, ParsePolicy::Abort)?.table;
        let ranks = rank_table(&cleaned);
        ExportBundle::assemble(&cleaned, &ranks, polarity, Some(raw.digest()))
    }

    fn sample() -> ExportBundle {
        let mut polarity = PolarityTable::new();
        polarity.insert("Poverty".to_string(), Polarity::Negative);
        bundle_of(
            &["Income", "Poverty"],
            &[
                ("North", &["$51,000", "12%"]),
                ("South", &["$48,000", "12%"]),
                ("East", &["$60,000", "7.5%"]),
            ],
            &polarity,
        )
        .unwrap()
    }

    #[test]
    fn shape() {
        let b = sample();
        assert_eq!(b.areas, vec!["North", "South", "East"]);
        assert_eq!(b.fields, vec!["Income", "Poverty"]);
        assert_eq!(b.max_rank(), 3);
        assert_eq!(b.rank("Income", "East"), Some(1));
        assert_eq!(b.rank("Income", "South"), Some(3));
        assert_eq!(b.field_ranks["Poverty"]["North"], 1);
        assert_eq!(b.field_ranks["Poverty"]["South"], 1);
        assert_eq!(b.field_ranks["Poverty"]["East"], 3);
        assert_eq!(b.all_fields["North"]["Income"], 2);
        assert_eq!(b.raw_values["East"]["Poverty"], 7.5);
        assert_eq!(b.field_stats["Poverty"].average, 31.5 / 3.0);
        assert_eq!(b.field_polarity["Income"], Polarity::Positive);
        assert_eq!(b.field_polarity["Poverty"], Polarity::Negative);
        assert!(b.source_digest.is_some());
    }

    #[test]
    fn json_layout() {
        let js = serde_json::to_value(sample()).unwrap();
        assert_eq!(js["areas"][0], "North");
        assert_eq!(js["all_fields"]["South"]["Income"], 3);
        assert_eq!(js["Income"]["East"], 1);
        assert_eq!(js["field_polarity"]["Poverty"], "Negative");
        assert_eq!(js["field_stats"]["Income"]["average"].as_f64(), Some(53_000.0));
    }

    #[test]
    fn round_trip() {
        let b = sample();
        let s = serde_json::to_string(&b).unwrap();
        let back: ExportBundle = serde_json::from_str(&s).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn fills_follow_polarity() {
        let b = sample();
        assert_eq!(b.fill_for("Income", "East").unwrap().to_string(), "rgb(0,255,0)");
        assert_eq!(b.fill_for("Income", "South").unwrap().to_string(), "rgb(0,50,0)");
        assert_eq!(b.fill_for("Poverty", "North").unwrap().to_string(), "rgb(255,0,0)");
        assert_eq!(b.fill_for("Poverty", "Atlantis"), None);
        assert_eq!(b.fill_for("Rainfall", "North"), None);
    }

    #[test]
    fn details_use_each_field_polarity() {
        let b = sample();
        let details = b.area_details("East").unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].field, "Income");
        assert_eq!(details[0].raw_value, 60000.0);
        assert_eq!(details[0].bar.channel, Channel::Green);
        assert_eq!(details[0].bar.filled, 3);
        assert_eq!(details[1].field, "Poverty");
        assert_eq!(details[1].bar.channel, Channel::Red);
        assert_eq!(details[1].bar.filled, 1);
        assert!(b.area_details("Atlantis").is_none());
    }

    #[test]
    fn reserved_field_name() {
        let err = bundle_of(&["areas"], &[("North", &["1"])], &PolarityTable::new()).unwrap_err();
        assert_eq!(
            err,
            TableError::ReservedFieldName {
                field: "areas".to_string()
            }
        );
    }

    #[test]
    fn unknown_polarity_is_ignored() {
        let mut polarity = PolarityTable::new();
        polarity.insert("Rainfall".to_string(), Polarity::Negative);
        let b = bundle_of(&["Income"], &[("North", &["1"])], &polarity).unwrap();
        assert_eq!(b.field_polarity.len(), 1);
        assert_eq!(b.polarity("Income"), Polarity::Positive);
    }

    #[test]
    fn single_region_bundle() {
        let b = bundle_of(&["Income"], &[("Only", &["3"])], &PolarityTable::new()).unwrap();
        assert_eq!(b.max_rank(), 1);
        assert_eq!(b.fill_for("Income", "Only").unwrap().to_string(), "rgb(0,255,0)");
        assert_eq!(b.area_details("Only").unwrap()[0].bar.filled, 1);
    }

    #[test]
    fn empty_bundle() {
        let b = bundle_of(&["Income"], &[], &PolarityTable::new()).unwrap();
        assert_eq!(b.max_rank(), 0);
        assert!(b.areas.is_empty());
        assert!(b.field_ranks["Income"].is_empty());
        assert_eq!(b.field_stats["Income"].average, 0.0);
        let s = serde_json::to_string(&b).unwrap();
        let back: ExportBundle = serde_json::from_str(&s).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn mismatched_tables() {
        let raw_a = {
            let mut b = TableBuilder::new(&["X".to_string()]).unwrap();
            b.add_row("A", &["1".to_string()]).unwrap();
            b.build()
        };
        let raw_b = {
            let mut b = TableBuilder::new(&["X".to_string()]).unwrap();
            b.add_row("B", &["1".to_string()]).unwrap();
            b.build()
        };
        let cleaned_a = clean_table(&raw_a, ParsePolicy::Abort).unwrap().table;
        let cleaned_b = clean_table(&raw_b, ParsePolicy::Abort).unwrap().table;
        let ranks_b = rank_table(&cleaned_b);
        let err = ExportBundle::assemble(&cleaned_a, &ranks_b, &PolarityTable::new(), None);
        assert_eq!(err, Err(TableError::ShapeMismatch));
    }
}
