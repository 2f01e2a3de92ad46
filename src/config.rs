use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub thresholds: ThresholdsCfg,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("config: {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(raw).with_context(|| "parsing TOML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        if t.warning_seconds < 0 || t.error_seconds < 0 {
            bail!("thresholds must be non-negative");
        }
        if t.warning_seconds > t.error_seconds {
            bail!(
                "thresholds.warning_seconds ({}) exceeds thresholds.error_seconds ({})",
                t.warning_seconds,
                t.error_seconds
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdsCfg {
    pub warning_seconds: i64,
    pub error_seconds: i64,
}
impl Default for ThresholdsCfg {
    fn default() -> Self {
        Self {
            warning_seconds: 5 * 60,
            error_seconds: 10 * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    pub input: String,
    pub report: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            input: "data/logs.log".into(),
            report: "data/report.log".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub print_summary: bool,
    pub write_summary_json: bool,
    pub summary_filename: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            print_summary: true,
            write_summary_json: false,
            summary_filename: "summary.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
