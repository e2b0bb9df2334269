/*!

This is the long-form manual for `region_ranks` and `rankmap`.

## Input formats

The following providers are supported by `rankmap`:
* `csv` Comma Separated Values (default)
* `xlsx` Excel workbooks

In both cases the first row is the header and the first column holds the region
names. Every other column is a field:

```text
Area,Median income,Unemployment,Uninsured
North_Shore,"$52,000",4.5%,8%
Harbour,"$48,500",6.1%,
Upper_Valley,"$61,250",3.2%,5.5%
```

Region names and field names must be unique and not blank. Every row must have
exactly one cell per field.

### `csv`

Read with a standard CSV reader. Quoted cells may contain commas.

### `xlsx`

The worksheet is selected with `--excel-worksheet-name` (the first worksheet if
not provided). Numeric cells are converted to text and then go through the same
cleaning as CSV cells.

## Cleaning

Every cell is cleaned on its own:
- the characters `$`, `%` and `,` are removed,
- surrounding whitespace is removed,
- an empty cell counts as 0,
- anything else must parse as a finite number.

By default a cell that does not parse stops the program with the name of the
field, the region and the content of the cell. With `--skip-bad-regions`
(`"parsePolicy": "skipRegion"`) the region is dropped instead and a warning is
logged.

## Ranking

For each field, the region with the largest value is ranked 1. Regions with the
same value share the same rank, and the following ranks are skipped:

| value | rank |
|-------|------|
| 100   | 1    |
| 100   | 1    |
| 50    | 3    |

The polarity of a field (`Positive` by default, or `Negative`) does not change
the ranks. It only selects the color: green for `Positive`, red for `Negative`.

## Color and bars

With `n` regions, a region of rank `r` is painted with the intensity
`50 + floor(205 * (n - r) / (n - 1))` in the channel of the field. A dataset with
a single region is painted at full intensity.

The details of a region show one bar of `n` segments per field, of which
`n - r + 1` are filled.

## Output

The output is a JSON document:

```text
{
  "areas": ["North_Shore", "Harbour", "Upper_Valley"],
  "fields": ["Median income", "Unemployment", "Uninsured"],
  "all_fields": {"Harbour": {"Median income": 3, ...}, ...},
  "raw_values": {"Harbour": {"Median income": 48500.0, ...}, ...},
  "field_stats": {"Median income": {"average": 53916.666666666664}, ...},
  "field_polarity": {"Median income": "Positive", "Unemployment": "Negative", ...},
  "source_digest": "5f1c...",
  "Median income": {"Harbour": 3, "North_Shore": 2, "Upper_Valley": 1},
  ...
}
```

Each field also appears as a top-level key, so a field cannot be named like one
of the other keys.

The output is written once. Later runs reuse it as it is, even if the input
changed, and log a warning. Use `--force-refresh` to always regenerate it, or
`--refresh-if-stale` to regenerate it only when `source_digest` does not match
the input. A file that cannot be read as a bundle (damaged, or written by an
older version) stops the default run with an error; `--force-refresh` and
`--refresh-if-stale` replace it. The output `stdout` prints the document without writing anything.

## Configuration

All the options can also be given in a JSON file with `--config`. Paths are
relative to the directory of the configuration file. Command line flags take
precedence over the file.

```text
{
  "inputSettings": {
    "filePath": "data.csv",
    "provider": "csv"
  },
  "outputSettings": {
    "outputPath": "assets/rank_data.json",
    "cachePolicy": "refreshIfStale"
  },
  "fieldPolarity": {
    "Unemployment": "Negative",
    "Uninsured": "Negative"
  },
  "rules": {
    "parsePolicy": "abort"
  }
}
```

`cachePolicy` is one of `reuse` (default), `refresh` or `refreshIfStale`.
`parsePolicy` is one of `abort` (default) or `skipRegion`.

 */
