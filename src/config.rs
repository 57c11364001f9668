use crate::sampler::SamplerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default)]
    pub gpu: GpuConfig,
    #[serde(default)]
    pub cleaner: CleanerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GpuConfig {
    #[serde(default = "default_gpu_enabled")]
    pub enabled: bool,
    #[serde(default = "default_gpu_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CleanerConfig {
    #[serde(default = "default_include_prefetch")]
    pub include_prefetch: bool,
    #[serde(default)]
    pub extra_dirs: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            gpu: GpuConfig::default(),
            cleaner: CleanerConfig::default(),
        }
    }
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            enabled: default_gpu_enabled(),
            timeout_secs: default_gpu_timeout_secs(),
        }
    }
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            include_prefetch: default_include_prefetch(),
            extra_dirs: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("не удалось прочитать файл конфигурации {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("не удалось разобрать YAML в {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("ошибка валидации конфигурации: {0}")]
    Validation(String),
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let cfg: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs < 1 {
            return Err(ConfigError::Validation(
                "interval_secs должно быть >= 1".to_string(),
            ));
        }
        if self.gpu.timeout_secs < 1 || self.gpu.timeout_secs > 60 {
            return Err(ConfigError::Validation(
                "gpu.timeout_secs должно быть в диапазоне 1..60".to_string(),
            ));
        }
        for dir in &self.cleaner.extra_dirs {
            if dir.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "cleaner.extra_dirs не должен содержать пустых путей".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            interval: Duration::from_secs(self.interval_secs),
            gpu_timeout: Duration::from_secs(self.gpu.timeout_secs),
        }
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

const fn default_interval_secs() -> u64 {
    2
}

const fn default_gpu_enabled() -> bool {
    true
}

const fn default_gpu_timeout_secs() -> u64 {
    5
}

const fn default_include_prefetch() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let cfg: Config = serde_yaml::from_str("{}").expect("пустой YAML должен разбираться");
        assert_eq!(cfg.interval_secs, 2);
        assert!(cfg.gpu.enabled);
        assert_eq!(cfg.gpu.timeout_secs, 5);
        assert!(cfg.cleaner.include_prefetch);
        assert!(cfg.cleaner.extra_dirs.is_empty());
        cfg.validate().expect("значения по умолчанию валидны");
    }

    #[test]
    fn example_config_is_valid() {
        let cfg: Config =
            serde_yaml::from_str(Config::example_yaml()).expect("пример должен разбираться");
        cfg.validate().expect("пример должен проходить валидацию");
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut cfg = Config::default();
        cfg.interval_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn gpu_timeout_bounds_are_enforced() {
        let mut cfg = Config::default();
        cfg.gpu.timeout_secs = 0;
        assert!(cfg.validate().is_err());
        cfg.gpu.timeout_secs = 61;
        assert!(cfg.validate().is_err());
        cfg.gpu.timeout_secs = 60;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_extra_dir_is_rejected() {
        let mut cfg = Config::default();
        cfg.cleaner.extra_dirs = vec!["  ".to_string()];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn sampler_config_maps_durations() {
        let cfg = Config::default();
        let sampler = cfg.sampler_config();
        assert_eq!(sampler.interval, Duration::from_secs(2));
        assert_eq!(sampler.gpu_timeout, Duration::from_secs(5));
    }
}
