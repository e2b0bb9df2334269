// Text renditions of what the map shows: the colors for a field, and the
// details of a region.

use std::fmt::Write;

use region_ranks::encoding::Bar;

use crate::dash::*;

const FILLED: char = '█';
const EMPTY: char = '░';

/// Region identifiers use underscores where the labels have spaces.
pub fn display_name(area: &str) -> String {
    area.replace('_', " ")
}

pub fn bar_text(bar: &Bar) -> String {
    bar.segments().map(|s| if s { FILLED } else { EMPTY }).collect()
}

/// One line per region, best rank first: rank, region and the fill color of
/// the region on the map.
pub fn field_overview(bundle: &ExportBundle, field: &str) -> DashResult<String> {
    if !bundle.fields.iter().any(|f| f == field) {
        whatever!(
            "Unknown field {:?}. The fields are: {}",
            field,
            bundle.fields.join(", ")
        )
    }
    let mut rows: Vec<(u32, &String)> = bundle
        .areas
        .iter()
        .filter_map(|a| bundle.rank(field, a).map(|r| (r, a)))
        .collect();
    // Stable: tied regions stay in dataset order.
    rows.sort_by_key(|(r, _)| *r);
    let width = rows
        .iter()
        .map(|(_, a)| display_name(a).chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({:?}, {} regions)",
        field,
        bundle.polarity(field),
        bundle.max_rank()
    );
    for (rank, area) in rows {
        let fill = bundle
            .fill_for(field, area)
            .map(|c| c.to_string())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:>4}  {:<width$}  {}",
            rank,
            display_name(area),
            fill,
            width = width
        );
    }
    Ok(out)
}

/// The details of a region: every field with its value, its rank and a bar
/// colored by the polarity of the field.
pub fn area_details(bundle: &ExportBundle, area: &str) -> DashResult<String> {
    let details = match bundle.area_details(area) {
        Some(d) => d,
        None => whatever!("Unknown region {:?}", area),
    };
    let labels: Vec<String> = details
        .iter()
        .map(|d| format!("{} ({})", d.field, d.raw_value))
        .collect();
    let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "Rank details for {}", display_name(area));
    for (d, label) in details.iter().zip(labels.iter()) {
        let _ = writeln!(
            out,
            "  {:<width$}  {}  {:>3} {:?}",
            label,
            bar_text(&d.bar),
            d.rank,
            d.bar.channel,
            width = width
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use region_ranks::builder::TableBuilder;

    fn sample() -> ExportBundle {
        let fields = vec!["Income".to_string(), "Poverty".to_string()];
        let mut b = TableBuilder::new(&fields).unwrap();
        b.add_row("North_Shore", &["$51,000".to_string(), "12%".to_string()])
            .unwrap();
        b.add_row("Harbour", &["$48,000".to_string(), "12%".to_string()])
            .unwrap();
        b.add_row("Upper_Valley", &["$60,000".to_string(), "7.5%".to_string()])
            .unwrap();
        let raw = b.build();
        let cleaned = clean_table(&raw, ParsePolicy::Abort).unwrap().table;
        let ranks = rank_table(&cleaned);
        let mut polarity = PolarityTable::new();
        polarity.insert("Poverty".to_string(), Polarity::Negative);
        ExportBundle::assemble(&cleaned, &ranks, &polarity, None).unwrap()
    }

    #[test]
    fn overview_is_sorted_by_rank() {
        let out = field_overview(&sample(), "Poverty").unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Poverty (Negative, 3 regions)");
        assert_eq!(lines[1], "   1  North Shore   rgb(255,0,0)");
        assert_eq!(lines[2], "   1  Harbour       rgb(255,0,0)");
        assert_eq!(lines[3], "   3  Upper Valley  rgb(50,0,0)");
    }

    #[test]
    fn overview_unknown_field() {
        assert!(field_overview(&sample(), "Rainfall").is_err());
    }

    #[test]
    fn details() {
        let out = area_details(&sample(), "Upper_Valley").unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Rank details for Upper Valley");
        assert_eq!(lines[1], "  Income (60000)  ███    1 Green");
        assert_eq!(lines[2], "  Poverty (7.5)   █░░    3 Red");
        assert!(area_details(&sample(), "Atlantis").is_err());
    }

    #[test]
    fn bars() {
        let bar = Bar::new(2, 5, Polarity::Positive);
        assert_eq!(bar_text(&bar), "████░");
    }
}
