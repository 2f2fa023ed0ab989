use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::AppConfig;

pub const DEFAULT_CONFIG_PATHS: &[&str] = &["ccip.toml", "config/ccip.toml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to parse deployment state at {path}: {source}")]
    State {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("缺少必填配置 {0}")]
    MissingField(&'static str),
    #[error("配置 {field} 非法: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// 显式路径必须存在；未指定时依次查找默认位置，都不存在则使用内置默认值。
pub fn load_config(path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    let found = match path {
        Some(explicit) => Some(explicit),
        None => DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.is_file()),
    };
    match found {
        Some(path) => parse_config(&path),
        None => Ok(AppConfig::default()),
    }
}

fn parse_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
