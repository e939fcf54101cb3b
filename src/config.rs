use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppError, AppResult};

const DEFAULT_CONFIG_PATH: &str = "~/.config/docmerge/config.toml";
const CONFIG_PATH_ENV: &str = "DOCMERGE_CONFIG";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub pdf: PdfConfig,
    #[serde(default)]
    pub excel: ExcelConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Limits {
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PdfConfig {
    #[serde(default = "default_bookmarks")]
    pub bookmarks: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExcelConfig {
    #[serde(default)]
    pub sheet_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputConfig {
    pub dir: Option<PathBuf>,
}

fn default_max_file_size() -> u64 {
    500 * 1024 * 1024
}

fn default_max_files() -> usize {
    50
}

fn default_bookmarks() -> bool {
    true
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            max_files: default_max_files(),
        }
    }
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            bookmarks: default_bookmarks(),
        }
    }
}

impl Config {
    /// Load the configuration from `DOCMERGE_CONFIG` or the default path.
    /// A missing file at the default path yields the built-in defaults;
    /// a missing file at an explicitly configured path is an error.
    pub fn load_default() -> AppResult<Self> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = expand_path(&path)?;
            return Self::load_from_path(&path);
        }
        let path = expand_path(DEFAULT_CONFIG_PATH)?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|err| {
            let (message, hint) = match err.kind() {
                ErrorKind::NotFound => (
                    crate::tr!(
                        "設定ファイルが見つかりません: {}",
                        "Config file not found: {}",
                        path.display()
                    ),
                    Some(crate::tr!(
                        "{} を作成してから再実行してください",
                        "Create {} and retry.",
                        DEFAULT_CONFIG_PATH
                    )),
                ),
                ErrorKind::PermissionDenied => (
                    crate::tr!(
                        "設定ファイルを読み込めません: {}",
                        "Cannot read config file: {}",
                        path.display()
                    ),
                    Some(crate::tr!(
                        "ファイルの権限を確認してください",
                        "Check the file permissions."
                    )),
                ),
                _ => (
                    crate::tr!(
                        "設定ファイルの読み込みに失敗しました: {}",
                        "Failed to read config file: {}",
                        path.display()
                    ),
                    Some(err.to_string()),
                ),
            };
            AppError::config(message, hint)
        })?;
        let mut config: Config = toml::from_str(&content).map_err(|err| {
            AppError::config(
                crate::tr!(
                    "設定ファイルの解析に失敗しました: {}",
                    "Failed to parse config file: {}",
                    path.display()
                ),
                Some(err.to_string()),
            )
        })?;
        config.expand_paths()?;
        config.validate()?;
        Ok(config)
    }

    fn expand_paths(&mut self) -> AppResult<()> {
        if let Some(dir) = &self.output.dir {
            self.output.dir = Some(expand_path(&dir.to_string_lossy())?);
        }
        Ok(())
    }

    fn validate(&self) -> AppResult<()> {
        if self.limits.max_files < 2 {
            return Err(AppError::config(
                crate::tr!(
                    "limits.max_files は 2 以上が必要です",
                    "limits.max_files must be at least 2"
                ),
                Some(crate::tr!(
                    "config.toml の limits.max_files を修正してください",
                    "Fix limits.max_files in config.toml."
                )),
            ));
        }
        if self.limits.max_file_size == 0 {
            return Err(AppError::config(
                crate::tr!(
                    "limits.max_file_size が 0 です",
                    "limits.max_file_size is zero"
                ),
                Some(crate::tr!(
                    "config.toml の limits.max_file_size を修正してください",
                    "Fix limits.max_file_size in config.toml."
                )),
            ));
        }
        Ok(())
    }
}

fn expand_path(path: &str) -> AppResult<PathBuf> {
    let expanded = shellexpand::full(path).map_err(|err| {
        AppError::config(
            crate::tr!("パス展開に失敗しました: {}", "Failed to expand path: {}", path),
            Some(err.to_string()),
        )
    })?;
    Ok(PathBuf::from(expanded.as_ref()))
}
