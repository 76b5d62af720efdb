//! Configuration for javelin: where to look for classes, how to compile sources, and how
//! to log.
//!
//! ```toml
//! [search_path]
//! source = ["src/main/java"]
//! class = ["lib/dep.jar", "out"]
//!
//! [compiler]
//! command = "javac"
//! output_dir = "build/classes"
//!
//! [logging]
//! level = "info"
//! ```

#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Once;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

/// File name looked up by [`discover_config_path`].
pub const CONFIG_FILE_NAME: &str = "javelin.toml";

/// Default external compiler program.
pub const DEFAULT_COMPILER: &str = "javac";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JavelinConfig {
    #[serde(default)]
    pub search_path: SearchPathConfig,
    #[serde(default)]
    pub compiler: CompilerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchPathConfig {
    /// Directories scanned for source files.
    #[serde(default)]
    pub source: Vec<PathBuf>,
    /// Directories and archives holding compiled classes.
    #[serde(default)]
    pub class: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    #[serde(default = "CompilerConfig::default_command")]
    pub command: String,
    /// Extra arguments passed before the source file.
    #[serde(default)]
    pub args: Vec<String>,
    /// Where compiled classes are written. A temporary directory is used when unset.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl CompilerConfig {
    fn default_command() -> String {
        DEFAULT_COMPILER.to_owned()
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            command: Self::default_command(),
            args: Vec::new(),
            output_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,
}

/// One entry of the ordered search path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SearchLocation {
    /// A directory tree holding sources and/or class binaries.
    Directory(PathBuf),
    /// A zip archive (`.jar` / `.zip`) of class binaries.
    Archive(PathBuf),
}

impl SearchLocation {
    /// Archive when the extension is `jar` or `zip`, directory otherwise.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_archive = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip"));
        if is_archive {
            SearchLocation::Archive(path)
        } else {
            SearchLocation::Directory(path)
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SearchLocation::Directory(path) | SearchLocation::Archive(path) => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err.message().to_owned())
    }
}

impl JavelinConfig {
    /// Parses TOML text. Relative paths are kept as written.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a config file; relative paths are resolved against the file's directory.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_paths(base);
        }
        Ok(config)
    }

    fn resolve_relative_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        self.search_path.source.iter_mut().for_each(resolve);
        self.search_path.class.iter_mut().for_each(resolve);
        self.compiler.output_dir.iter_mut().for_each(resolve);
    }

    /// Ordered search path: source directories first, then class entries.
    pub fn search_locations(&self) -> Vec<SearchLocation> {
        self.search_path
            .source
            .iter()
            .map(|dir| SearchLocation::Directory(dir.clone()))
            .chain(self.search_path.class.iter().map(SearchLocation::from_path))
            .collect()
    }
}

/// `root/javelin.toml`, if it exists.
pub fn discover_config_path(root: &Path) -> Option<PathBuf> {
    let candidate = root.join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

/// Loads `root/javelin.toml`, or falls back to a config that searches `root` itself.
pub fn load_for_root(root: &Path) -> Result<JavelinConfig, ConfigError> {
    match discover_config_path(root) {
        Some(path) => JavelinConfig::load_from_path(path),
        None => {
            tracing::debug!(
                target: "javelin.config",
                root = %root.display(),
                "no javelin.toml found; searching the root directory"
            );
            Ok(JavelinConfig {
                search_path: SearchPathConfig {
                    source: vec![root.to_path_buf()],
                    class: Vec::new(),
                },
                ..JavelinConfig::default()
            })
        }
    }
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "error" => trimmed.to_ascii_lowercase(),
            "warn" | "warning" => "warn".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    /// The effective filter: the configured directives, with `RUST_LOG` merged on top.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let config_directives = Self::normalize_level_directives(&self.level);
        let fallback = || {
            tracing_subscriber::EnvFilter::try_new(&config_directives).unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::default()
                    .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
            })
        };

        match std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
        {
            Some(env_directives) => {
                tracing_subscriber::EnvFilter::try_new(format!("{config_directives},{env_directives}"))
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(&env_directives))
                    .unwrap_or_else(|_| fallback())
            }
            None => fallback(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

static TRACING_INIT: Once = Once::new();

/// Installs the global `tracing` subscriber. Only the first call has an effect.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let layer: Box<dyn Layer<_> + Send + Sync> = if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry()
            .with(config.env_filter())
            .with(layer);
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            tracing::debug!(
                target: "javelin.config",
                "a global tracing subscriber was already installed"
            );
        }
    });
}
