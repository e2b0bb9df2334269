use crate::dash::*;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_INPUT: &str = "data.csv";
pub const DEFAULT_OUTPUT: &str = "assets/rank_data.json";
pub const STDOUT_TARGET: &str = "stdout";

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputSettings {
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    pub provider: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    #[serde(rename = "cachePolicy")]
    pub cache_policy: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashRules {
    #[serde(rename = "parsePolicy")]
    pub parse_policy: Option<String>,
}

/// The content of a configuration file. Every section is optional.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashConfig {
    #[serde(rename = "inputSettings", default)]
    pub input_settings: InputSettings,
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "fieldPolarity", default)]
    pub field_polarity: PolarityTable,
    #[serde(default)]
    pub rules: DashRules,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputType {
    Csv,
    Xlsx,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

/// The configuration file and the command line, merged and validated.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DashSettings {
    pub input_path: PathBuf,
    pub input_type: InputType,
    pub worksheet: Option<String>,
    pub output: OutputTarget,
    pub cache_policy: CachePolicy,
    pub parse_policy: ParsePolicy,
    pub polarity: PolarityTable,
}

pub fn read_config(path: &str) -> DashResult<DashConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: DashConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read config: {:?}", config);
    Ok(config)
}

fn parse_input_type(s: &str) -> DashResult<InputType> {
    match s {
        "csv" => Ok(InputType::Csv),
        "xlsx" | "excel" => Ok(InputType::Xlsx),
        x => whatever!("Input type not implemented {:?}", x),
    }
}

fn infer_input_type(path: &Path) -> InputType {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("xlsx") => InputType::Xlsx,
        _ => InputType::Csv,
    }
}

fn parse_cache_policy(s: &str) -> DashResult<CachePolicy> {
    match s {
        "reuse" => Ok(CachePolicy::ReuseExisting),
        "refresh" => Ok(CachePolicy::ForceRefresh),
        "refreshIfStale" => Ok(CachePolicy::RefreshIfStale),
        x => whatever!("unknown cache policy: {}", x),
    }
}

fn parse_parse_policy(s: &str) -> DashResult<ParsePolicy> {
    match s {
        "abort" => Ok(ParsePolicy::Abort),
        "skipRegion" => Ok(ParsePolicy::SkipRegion),
        x => whatever!("unknown parse policy: {}", x),
    }
}

/// Paths from the configuration file are relative to its directory.
fn resolve_path(root: Option<&Path>, p: &str) -> PathBuf {
    match root {
        Some(r) if Path::new(p).is_relative() => r.join(p),
        _ => PathBuf::from(p),
    }
}

/// Merges the command line with the configuration file (if any).
///
/// Command line values take precedence. Paths given on the command line are
/// used as they are.
pub fn resolve_settings(args: &Args) -> DashResult<DashSettings> {
    let config = match &args.config {
        Some(p) => read_config(p)?,
        None => DashConfig::default(),
    };
    let root: Option<PathBuf> = match &args.config {
        Some(p) => Some(
            Path::new(p)
                .parent()
                .context(MissingParentDirSnafu { path: p.clone() })?
                .to_path_buf(),
        ),
        None => None,
    };
    let root = root.as_deref();

    let input_path = match (&args.input, &config.input_settings.file_path) {
        (Some(p), _) => PathBuf::from(p),
        (None, Some(p)) => resolve_path(root, p),
        (None, None) => resolve_path(root, DEFAULT_INPUT),
    };

    let input_type = match args
        .input_type
        .as_ref()
        .or(config.input_settings.provider.as_ref())
    {
        Some(s) => parse_input_type(s)?,
        None => infer_input_type(&input_path),
    };

    let worksheet = args
        .excel_worksheet_name
        .clone()
        .or_else(|| config.input_settings.excel_worksheet_name.clone());

    let output = match (&args.out, &config.output_settings.output_path) {
        (Some(p), _) if p == STDOUT_TARGET => OutputTarget::Stdout,
        (Some(p), _) => OutputTarget::File(PathBuf::from(p)),
        (None, Some(p)) if p == STDOUT_TARGET => OutputTarget::Stdout,
        (None, Some(p)) => OutputTarget::File(resolve_path(root, p)),
        (None, None) => OutputTarget::File(resolve_path(root, DEFAULT_OUTPUT)),
    };

    let cache_policy = match (args.force_refresh, args.refresh_if_stale) {
        (true, true) => {
            whatever!("--force-refresh and --refresh-if-stale cannot be used together")
        }
        (true, false) => CachePolicy::ForceRefresh,
        (false, true) => CachePolicy::RefreshIfStale,
        (false, false) => match &config.output_settings.cache_policy {
            Some(s) => parse_cache_policy(s)?,
            None => CachePolicy::ReuseExisting,
        },
    };

    let parse_policy = if args.skip_bad_regions {
        ParsePolicy::SkipRegion
    } else {
        match &config.rules.parse_policy {
            Some(s) => parse_parse_policy(s)?,
            None => ParsePolicy::Abort,
        }
    };

    let mut polarity = config.field_polarity.clone();
    for field in args.negative.iter().flatten() {
        polarity.insert(field.clone(), Polarity::Negative);
    }

    Ok(DashSettings {
        input_path,
        input_type,
        worksheet,
        output,
        cache_policy,
        parse_policy,
        polarity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dash::test_support::scratch_dir;

    #[test]
    fn defaults_without_config() {
        let s = resolve_settings(&Args::default()).unwrap();
        assert_eq!(s.input_path, PathBuf::from("data.csv"));
        assert_eq!(s.input_type, InputType::Csv);
        assert_eq!(
            s.output,
            OutputTarget::File(PathBuf::from("assets/rank_data.json"))
        );
        assert_eq!(s.cache_policy, CachePolicy::ReuseExisting);
        assert_eq!(s.parse_policy, ParsePolicy::Abort);
        assert!(s.polarity.is_empty());
    }

    #[test]
    fn full_config_file() {
        let dir = scratch_dir("full_config_file");
        let config_path = dir.join("dash_config.json");
        fs::write(
            &config_path,
            r#"{
                "inputSettings": {"filePath": "stats.xlsx", "excelWorksheetName": "2023"},
                "outputSettings": {"outputPath": "out/ranks.json", "cachePolicy": "refreshIfStale"},
                "fieldPolarity": {"Unemployment": "Negative", "Income": "Positive"},
                "rules": {"parsePolicy": "skipRegion"}
            }"#,
        )
        .unwrap();
        let args = Args {
            config: Some(config_path.display().to_string()),
            ..Args::default()
        };
        let s = resolve_settings(&args).unwrap();
        assert_eq!(s.input_path, dir.join("stats.xlsx"));
        assert_eq!(s.input_type, InputType::Xlsx);
        assert_eq!(s.worksheet.as_deref(), Some("2023"));
        assert_eq!(s.output, OutputTarget::File(dir.join("out/ranks.json")));
        assert_eq!(s.cache_policy, CachePolicy::RefreshIfStale);
        assert_eq!(s.parse_policy, ParsePolicy::SkipRegion);
        assert_eq!(s.polarity.get("Unemployment"), Some(&Polarity::Negative));
        assert_eq!(s.polarity.get("Income"), Some(&Polarity::Positive));
    }

    #[test]
    fn command_line_overrides_config() {
        let dir = scratch_dir("command_line_overrides_config");
        let config_path = dir.join("dash_config.json");
        fs::write(
            &config_path,
            r#"{
                "inputSettings": {"filePath": "stats.csv", "provider": "csv"},
                "outputSettings": {"cachePolicy": "reuse"},
                "fieldPolarity": {"Income": "Positive"}
            }"#,
        )
        .unwrap();
        let args = Args {
            config: Some(config_path.display().to_string()),
            input: Some("other.xlsx".to_string()),
            input_type: Some("xlsx".to_string()),
            out: Some("stdout".to_string()),
            negative: Some(vec!["Income".to_string(), "Poverty".to_string()]),
            force_refresh: true,
            ..Args::default()
        };
        let s = resolve_settings(&args).unwrap();
        assert_eq!(s.input_path, PathBuf::from("other.xlsx"));
        assert_eq!(s.input_type, InputType::Xlsx);
        assert_eq!(s.output, OutputTarget::Stdout);
        assert_eq!(s.cache_policy, CachePolicy::ForceRefresh);
        assert_eq!(s.polarity.get("Income"), Some(&Polarity::Negative));
        assert_eq!(s.polarity.get("Poverty"), Some(&Polarity::Negative));
    }

    #[test]
    fn invalid_values() {
        let both = Args {
            force_refresh: true,
            refresh_if_stale: true,
            ..Args::default()
        };
        assert!(resolve_settings(&both).is_err());

        let bad_type = Args {
            input_type: Some("parquet".to_string()),
            ..Args::default()
        };
        assert!(resolve_settings(&bad_type).is_err());

        let dir = scratch_dir("invalid_values");
        let config_path = dir.join("dash_config.json");
        fs::write(&config_path, r#"{"rules": {"parsePolicy": "guess"}}"#).unwrap();
        let args = Args {
            config: Some(config_path.display().to_string()),
            ..Args::default()
        };
        assert!(resolve_settings(&args).is_err());

        fs::write(&config_path, r#"{"fieldPolarity": {"Income": "Sideways"}}"#).unwrap();
        assert!(matches!(
            resolve_settings(&args),
            Err(DashError::ParsingJson { .. })
        ));
    }

    #[test]
    fn missing_config_file() {
        let args = Args {
            config: Some("/nonexistent/rankmap/dash_config.json".to_string()),
            ..Args::default()
        };
        assert!(matches!(
            resolve_settings(&args),
            Err(DashError::OpeningJson { .. })
        ));
    }
}
