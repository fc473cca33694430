use crate::labels::Locale;
use crate::projection::{DEFAULT_GROWTH_RATE, DEFAULT_HORIZON};
use std::env::VarError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Runtime settings for the dashboard shell and report writer.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub output_dir: PathBuf,
    pub locale: Locale,
    pub growth_rate: f64,
    pub forecast_horizon: i32,
    pub model_dir: PathBuf,
    pub report_title: String,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("campaigns.csv"),
            output_dir: PathBuf::from("."),
            locale: Locale::En,
            growth_rate: DEFAULT_GROWTH_RATE,
            forecast_horizon: DEFAULT_HORIZON,
            model_dir: PathBuf::from("models"),
            report_title: "Campaign Intelligence".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Load configuration from the process environment, reading `.env` first.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to a value that does not parse.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key))
}

/// Build configuration from an arbitrary lookup so tests can use a map.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let defaults = AppConfig::default();

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let locale = match lookup("CAMPAIGN_LOCALE") {
        Ok(raw) => raw
            .parse::<Locale>()
            .map_err(|e| invalid("CAMPAIGN_LOCALE", e))?,
        Err(_) => defaults.locale,
    };

    let growth_rate = match lookup("CAMPAIGN_GROWTH_RATE") {
        Ok(raw) => {
            let v = raw
                .trim()
                .parse::<f64>()
                .map_err(|e| invalid("CAMPAIGN_GROWTH_RATE", e.to_string()))?;
            if !v.is_finite() || v <= -1.0 {
                return Err(invalid(
                    "CAMPAIGN_GROWTH_RATE",
                    format!("{v} is not a usable growth rate"),
                ));
            }
            v
        }
        Err(_) => defaults.growth_rate,
    };

    let forecast_horizon = match lookup("CAMPAIGN_FORECAST_HORIZON") {
        Ok(raw) => {
            let v = raw
                .trim()
                .parse::<i32>()
                .map_err(|e| invalid("CAMPAIGN_FORECAST_HORIZON", e.to_string()))?;
            if v <= 0 {
                return Err(invalid(
                    "CAMPAIGN_FORECAST_HORIZON",
                    format!("horizon must be positive, got {v}"),
                ));
            }
            v
        }
        Err(_) => defaults.forecast_horizon,
    };

    let path_or = |var: &str, default: PathBuf| lookup(var).map(PathBuf::from).unwrap_or(default);

    Ok(AppConfig {
        data_path: path_or("CAMPAIGN_DATA_PATH", defaults.data_path),
        output_dir: path_or("CAMPAIGN_OUTPUT_DIR", defaults.output_dir),
        model_dir: path_or("CAMPAIGN_MODEL_DIR", defaults.model_dir),
        report_title: lookup("CAMPAIGN_REPORT_TITLE").unwrap_or(defaults.report_title),
        log_level: lookup("CAMPAIGN_LOG_LEVEL").unwrap_or(defaults.log_level),
        locale,
        growth_rate,
        forecast_horizon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let map = HashMap::new();
        let config = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let map: HashMap<&str, &str> = HashMap::from([
            ("CAMPAIGN_DATA_PATH", "/data/q3.csv"),
            ("CAMPAIGN_OUTPUT_DIR", "/tmp/out"),
            ("CAMPAIGN_LOCALE", "ar"),
            ("CAMPAIGN_GROWTH_RATE", "0.1"),
            ("CAMPAIGN_FORECAST_HORIZON", "6"),
            ("CAMPAIGN_MODEL_DIR", "/models"),
            ("CAMPAIGN_REPORT_TITLE", "Q3 Review"),
            ("CAMPAIGN_LOG_LEVEL", "debug"),
        ]);
        let config = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(
            config,
            AppConfig {
                data_path: PathBuf::from("/data/q3.csv"),
                output_dir: PathBuf::from("/tmp/out"),
                locale: Locale::Ar,
                growth_rate: 0.1,
                forecast_horizon: 6,
                model_dir: PathBuf::from("/models"),
                report_title: "Q3 Review".to_string(),
                log_level: "debug".to_string(),
            }
        );
    }

    #[test]
    fn rejects_unknown_locale() {
        let map = HashMap::from([("CAMPAIGN_LOCALE", "fr")]);
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CAMPAIGN_LOCALE"),
            "got: {result:?}"
        );
    }

    #[test]
    fn rejects_non_numeric_growth() {
        let map = HashMap::from([("CAMPAIGN_GROWTH_RATE", "five percent")]);
        let result = build_app_config(lookup_from_map(&map));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CAMPAIGN_GROWTH_RATE"
        ));
    }

    #[test]
    fn rejects_non_positive_horizon() {
        for raw in ["0", "-2"] {
            let map = HashMap::from([("CAMPAIGN_FORECAST_HORIZON", raw)]);
            let result = build_app_config(lookup_from_map(&map));
            assert!(
                matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CAMPAIGN_FORECAST_HORIZON"),
                "{raw}: {result:?}"
            );
        }
    }
}
