//! Run configuration.
//!
//! A single YAML file describes the AOI, the period, where the daily inputs
//! live and how the summary is exported. `${VAR}` and `${VAR:-default}` are
//! expanded before parsing; `WIND_*` variables then override individual
//! fields.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use renderer::VisParams;
use wind_common::{AreaOfInterest, CrsCode, DateWindow};
use wind_processor::{ExportRequest, PipelineConfig, ProcessorConfig};

/// Top-level run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_aoi")]
    pub aoi: AreaOfInterest,

    #[serde(default = "default_period")]
    pub period: DateWindow,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub visualization: VisualizationConfig,

    #[serde(default)]
    pub processor: ProcessorConfig,
}

/// Daily input location and variable names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub root: PathBuf,
    pub u_variable: String,
    pub v_variable: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/era5-land/daily"),
            u_variable: "u_component_of_wind_10m".to_string(),
            v_variable: "v_component_of_wind_10m".to_string(),
        }
    }
}

/// Export target shared by both summary bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub root: PathBuf,
    /// Cell size in units of `crs`.
    pub resolution: f64,
    pub crs: CrsCode,
    pub max_pixels: u64,
    pub speed_destination: String,
    pub sector_destination: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("output/wind"),
            // ~10 km, the native ERA5-Land spacing
            resolution: 0.1,
            crs: CrsCode::Epsg4326,
            max_pixels: wind_processor::sink::DEFAULT_MAX_PIXELS,
            speed_destination: "Wind_Speed".to_string(),
            sector_destination: "Wind_Sector".to_string(),
        }
    }
}

impl ExportConfig {
    pub fn speed_request(&self) -> ExportRequest {
        self.request(&self.speed_destination)
    }

    pub fn sector_request(&self) -> ExportRequest {
        self.request(&self.sector_destination)
    }

    fn request(&self, destination: &str) -> ExportRequest {
        ExportRequest::new(destination, self.resolution, self.crs).with_max_pixels(self.max_pixels)
    }
}

/// PNG quicklooks written beside the exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    pub enabled: bool,
    /// Output directory; the export root when unset.
    pub root: Option<PathBuf>,
    pub speed: VisParams,
    pub sector: VisParams,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root: None,
            speed: VisParams::wind_speed(),
            sector: VisParams::wind_sector(),
        }
    }
}

fn default_aoi() -> AreaOfInterest {
    let ring = [
        [-11.11936435768948, 61.041472818639726],
        [-11.11936435768948, 49.70202021677499],
        [2.3279012673105193, 49.70202021677499],
        [2.3279012673105193, 61.041472818639726],
    ];
    match AreaOfInterest::new("british_isles", &ring) {
        Ok(aoi) => aoi,
        Err(e) => unreachable!("built-in AOI is valid: {}", e),
    }
}

fn default_period() -> DateWindow {
    match DateWindow::parse("2024-06-01", "2024-09-01") {
        Ok(window) => window,
        Err(e) => unreachable!("built-in period is valid: {}", e),
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            aoi: default_aoi(),
            period: default_period(),
            source: SourceConfig::default(),
            export: ExportConfig::default(),
            visualization: VisualizationConfig::default(),
            processor: ProcessorConfig::default(),
        }
    }
}

impl RunConfig {
    /// Read, expand, parse, override from the environment and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read run config from {:?}", path))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse run config from {:?}", path))?
            .with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML after `${VAR}` expansion.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        Ok(serde_yaml::from_str(&expanded)?)
    }

    /// Apply `WIND_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; unparsable values are errors.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("WIND_SOURCE_ROOT") {
            self.source.root = PathBuf::from(val);
        }

        if let Some(val) = lookup("WIND_EXPORT_ROOT") {
            self.export.root = PathBuf::from(val);
        }

        if let Some(val) = lookup("WIND_EXPORT_RESOLUTION") {
            self.export.resolution = val
                .trim()
                .parse()
                .with_context(|| format!("WIND_EXPORT_RESOLUTION: invalid number '{}'", val))?;
        }

        if let Some(val) = lookup("WIND_EXPORT_CRS") {
            self.export.crs = CrsCode::parse(&val).context("WIND_EXPORT_CRS")?;
        }

        if let Some(val) = lookup("WIND_EXPORT_MAX_PIXELS") {
            self.export.max_pixels = parse_pixel_count(&val)
                .with_context(|| format!("WIND_EXPORT_MAX_PIXELS: invalid count '{}'", val))?;
        }

        self.processor = self.processor.with_env_overrides();
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.source.u_variable.is_empty() && !self.source.v_variable.is_empty(),
            "source variable names cannot be empty"
        );
        anyhow::ensure!(
            self.source.u_variable != self.source.v_variable,
            "u and v variables must differ"
        );
        anyhow::ensure!(
            self.export.speed_destination != self.export.sector_destination,
            "speed and sector destinations must differ"
        );
        self.export.speed_request().validate()?;
        self.export.sector_request().validate()?;

        self.processor
            .validate()
            .map_err(|e| anyhow::anyhow!("processor: {}", e))?;

        if self.visualization.enabled {
            self.visualization.speed.validate().context("visualization.speed")?;
            self.visualization.sector.validate().context("visualization.sector")?;
        }
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            aoi: self.aoi.clone(),
            window: self.period,
            u_variable: self.source.u_variable.clone(),
            v_variable: self.source.v_variable.clone(),
        }
    }

    /// Directory quicklooks are written to.
    pub fn quicklook_root(&self) -> &Path {
        self.visualization.root.as_deref().unwrap_or(self.export.root.as_path())
    }
}

/// Accepts plain integers and scientific notation such as `1e13`.
fn parse_pixel_count(s: &str) -> Result<u64> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u64>() {
        return Ok(n);
    }
    let f: f64 = s.parse()?;
    anyhow::ensure!(f.is_finite() && f >= 0.0 && f.fract() == 0.0, "not a whole pixel count");
    Ok(f as u64)
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand `${VAR}` and `${VAR:-default}` in `content`.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .with_context(|| format!("Unclosed variable substitution: ${{{}", after))?;
        result.push_str(&resolve_var_expr(&after[..end])?);
        rest = &after[end + 1..];
    }
    result.push_str(rest);

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    match expr.split_once(":-") {
        Some((name, default)) => match std::env::var(name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        },
        None => std::env::var(expr.trim())
            .with_context(|| format!("Environment variable {} not set", expr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_validate() {
        let config = RunConfig::default();
        config.validate().unwrap();
        assert_eq!(config.aoi.name(), "british_isles");
        assert_eq!(config.period.num_days(), 92);
        assert_eq!(config.export.max_pixels, 10_000_000_000_000);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = RunConfig::from_yaml("{}").unwrap();
        assert_eq!(config.export.speed_destination, "Wind_Speed");
        assert_eq!(config.source.u_variable, "u_component_of_wind_10m");
        assert!(config.visualization.enabled);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
aoi:
  name: box
  coordinates: [[0, 0], [2, 0], [2, 2], [0, 2]]
period:
  start: "2024-01-01"
  end: "2024-01-08"
export:
  crs: EPSG:3857
  resolution: 10000
  max_pixels: 1000000
"#;
        let config = RunConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.aoi.name(), "box");
        assert_eq!(config.period.num_days(), 7);
        assert_eq!(config.export.crs, CrsCode::Epsg3857);
        assert_eq!(config.export.sector_destination, "Wind_Sector");
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_period_rejected() {
        let yaml = "period: { start: '2024-02-01', end: '2024-01-01' }";
        assert!(RunConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let env: HashMap<&str, &str> = [
            ("WIND_SOURCE_ROOT", "/data/in"),
            ("WIND_EXPORT_RESOLUTION", "0.25"),
            ("WIND_EXPORT_CRS", "EPSG:3857"),
            ("WIND_EXPORT_MAX_PIXELS", "1e6"),
        ]
        .into_iter()
        .collect();

        let config = RunConfig::default()
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.source.root, PathBuf::from("/data/in"));
        assert_eq!(config.export.resolution, 0.25);
        assert_eq!(config.export.crs, CrsCode::Epsg3857);
        assert_eq!(config.export.max_pixels, 1_000_000);
    }

    #[test]
    fn test_bad_override_is_error() {
        let result = RunConfig::default().apply_overrides(|k| {
            (k == "WIND_EXPORT_CRS").then(|| "EPSG:27700".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_same_destination() {
        let mut config = RunConfig::default();
        config.export.sector_destination = config.export.speed_destination.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_pixel_count() {
        assert_eq!(parse_pixel_count("1e13").unwrap(), 10_000_000_000_000);
        assert_eq!(parse_pixel_count("42").unwrap(), 42);
        assert!(parse_pixel_count("1.5").is_err());
        assert!(parse_pixel_count("-3").is_err());
    }

    #[test]
    fn test_expand_env_vars_simple() {
        std::env::set_var("WIND_SUMMARY_TEST_VAR", "test_value");
        let result = expand_env_vars("prefix_${WIND_SUMMARY_TEST_VAR}_suffix").unwrap();
        assert_eq!(result, "prefix_test_value_suffix");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("WIND_SUMMARY_UNSET_VAR");
        let result = expand_env_vars("root: ${WIND_SUMMARY_UNSET_VAR:-/tmp/wind}").unwrap();
        assert_eq!(result, "root: /tmp/wind");
    }

    #[test]
    fn test_expand_env_vars_errors() {
        std::env::remove_var("WIND_SUMMARY_REQUIRED_VAR");
        assert!(expand_env_vars("${WIND_SUMMARY_REQUIRED_VAR}").is_err());
        assert!(expand_env_vars("${UNCLOSED").is_err());
    }
}
