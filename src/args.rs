use clap::Parser;

/// This program ranks regional statistics and exports them for a color-coded map.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. See the manual of region_ranks for its format.
    /// The options passed on the command line take precedence over the configuration file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference bundle in JSON format. If provided, rankmap will
    /// check that the exported bundle matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path or 'stdout', default assets/rank_data.json) Where the bundle is written in JSON format.
    /// 'stdout' prints it without touching any file.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, default data.csv) The table of statistics. The first column holds the region names.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (field name, repeatable) A field for which a higher value is worse. It is colored in red.
    #[clap(long, value_parser)]
    pub negative: Option<Vec<String>>,

    /// Always regenerate the bundle, even if it already exists.
    #[clap(long, takes_value = false)]
    pub force_refresh: bool,

    /// Regenerate the bundle only if it was computed from a different input.
    #[clap(long, takes_value = false)]
    pub refresh_if_stale: bool,

    /// Drop the regions with a value that cannot be read instead of stopping.
    #[clap(long, takes_value = false)]
    pub skip_bad_regions: bool,

    /// (field name) Prints the rank and the map color of every region for this field.
    #[clap(long, value_parser)]
    pub field: Option<String>,

    /// (region name) Prints the details of this region: all the fields with their ranks.
    #[clap(long, value_parser)]
    pub area: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
