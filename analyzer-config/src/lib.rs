//! Loader for the analyzer's runtime configuration.
//!
//! Sources are layered with the `config` crate, lowest precedence first:
//!
//! 1. built-in defaults (see [`AnalyzerConfig::default`]),
//! 2. config files attached with [`AnalyzerConfigLoader::with_file`] (format by suffix),
//! 3. inline YAML from [`AnalyzerConfigLoader::with_yaml_str`],
//! 4. the conventional unprefixed variables `DATABASE_URL`, `SECRET_KEY` and `DEBUG`,
//! 5. `ANALYZER_`-prefixed variables, `__` separating nested keys
//!    (`ANALYZER_FETCH__TIMEOUT_SECS=3`).
//!
//! String values may reference other environment variables as `${VAR}`; they
//! are expanded after the sources are merged.
use analyzer_common::observability::LogFormat;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "ANALYZER";
const CONVENTIONAL_VARS: [&str; 3] = ["DATABASE_URL", "SECRET_KEY", "DEBUG"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read configuration: {0}")]
    Source(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Everything the server needs, resolved once at process start.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub database_url: String,
    /// Signs the flash-message cookie. `None` means a random per-process key.
    pub secret_key: Option<String>,
    pub debug: bool,
    pub bind: String,
    pub fetch: FetchConfig,
    pub log: LogSettings,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://page_analyzer.db?mode=rwc".into(),
            secret_key: None,
            debug: false,
            bind: "127.0.0.1:8000".into(),
            fetch: FetchConfig::default(),
            log: LogSettings::default(),
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("database_url", &self.database_url)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("debug", &self.debug)
            .field("bind", &self.bind)
            .field("fetch", &self.fetch)
            .field("log", &self.log)
            .finish()
    }
}

/// Outbound page fetch settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            connect_timeout_secs: 5,
            max_redirects: 5,
            user_agent: concat!("page-analyzer/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub stderr: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            stderr: true,
        }
    }
}

impl AnalyzerConfig {
    /// Log filter used when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }

    fn expand_env(&mut self) {
        self.database_url = expand_env_str(&self.database_url);
        self.bind = expand_env_str(&self.bind);
        self.fetch.user_agent = expand_env_str(&self.fetch.user_agent);
        self.secret_key = self
            .secret_key
            .take()
            .map(|s| expand_env_str(&s))
            .filter(|s| !s.trim().is_empty());
        if let Some(dir) = self.log.dir.take() {
            self.log.dir = Some(PathBuf::from(expand_env_str(&dir.to_string_lossy())));
        }
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigLoadError::Invalid("database_url must not be empty".into()));
        }
        if self.bind.trim().is_empty() {
            return Err(ConfigLoadError::Invalid("bind must not be empty".into()));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigLoadError::Invalid(
                "fetch.timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Expand `$VAR` / `${VAR}` references, following values that themselves
/// reference variables up to a fixed depth. Unknown variables are left as-is.
fn expand_env_str(raw: &str) -> String {
    let mut cur = raw.to_string();
    if !cur.contains('$') {
        return cur;
    }
    for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
        let expanded = match shellexpand::env(&cur) {
            Ok(cow) => cow.into_owned(),
            Err(_) => break,
        };
        if expanded == cur {
            break;
        }
        cur = expanded;
    }
    cur
}

/// Collects sources and builds an [`AnalyzerConfig`].
#[derive(Debug, Default)]
pub struct AnalyzerConfigLoader {
    files: Vec<PathBuf>,
    snippets: Vec<String>,
}

impl AnalyzerConfigLoader {
    /// Defaults plus environment; add files or snippets before calling [`load`](Self::load).
    ///
    /// ```
    /// use analyzer_config::AnalyzerConfigLoader;
    ///
    /// let config = AnalyzerConfigLoader::new()
    ///     .with_yaml_str("bind: '0.0.0.0:9000'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.bind, "0.0.0.0:9000");
    /// assert_eq!(config.fetch.timeout_secs, 10);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push(path.as_ref().to_path_buf());
        self
    }

    /// Merge an inline YAML snippet above any files.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.snippets.push(yaml.to_string());
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders and validate the result.
    ///
    /// ```
    /// use analyzer_config::AnalyzerConfigLoader;
    ///
    /// unsafe { std::env::set_var("ANALYZER_DOCTEST_DB", "sqlite::memory:"); }
    ///
    /// let config = AnalyzerConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// database_url: "${ANALYZER_DOCTEST_DB}"
    /// fetch:
    ///   timeout_secs: 3
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.database_url, "sqlite::memory:");
    /// assert_eq!(config.fetch.timeout_secs, 3);
    ///
    /// unsafe { std::env::remove_var("ANALYZER_DOCTEST_DB"); }
    /// ```
    pub fn load(self) -> Result<AnalyzerConfig, ConfigLoadError> {
        let mut builder = Config::builder();

        for path in &self.files {
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }
        for yaml in &self.snippets {
            builder = builder.add_source(File::from_str(yaml, FileFormat::Yaml));
        }

        let conventional: config::Map<String, String> = CONVENTIONAL_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok().map(|v| (name.to_string(), v)))
            .collect();
        builder = builder
            .add_source(Environment::default().source(Some(conventional)))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );

        let mut cfg: AnalyzerConfig = builder.build()?.try_deserialize()?;
        cfg.expand_env();
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("ANALYZER_T_HOST", Some("db.internal"), || {
            assert_eq!(
                expand_env_str("postgres://${ANALYZER_T_HOST}/pages"),
                "postgres://db.internal/pages"
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("ANALYZER_T_C", Some("qux")),
                ("ANALYZER_T_B", Some("mid-${ANALYZER_T_C}")),
                ("ANALYZER_T_A", Some("start-${ANALYZER_T_B}-end")),
            ],
            || {
                assert_eq!(expand_env_str("X=${ANALYZER_T_A}"), "X=start-mid-qux-end");
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars(
            [
                ("ANALYZER_T_X", Some("${ANALYZER_T_Y}")),
                ("ANALYZER_T_Y", Some("${ANALYZER_T_X}")),
            ],
            || {
                let s = expand_env_str("x=${ANALYZER_T_X}-y");
                assert!(s.starts_with("x=") && s.ends_with("-y"));
                assert!(s.contains("${"));
            },
        );
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        assert_eq!(
            expand_env_str("hi-${ANALYZER_T_DOES_NOT_EXIST}"),
            "hi-${ANALYZER_T_DOES_NOT_EXIST}"
        );
    }

    #[test]
    fn blank_secret_becomes_none() {
        let mut cfg = AnalyzerConfig {
            secret_key: Some("   ".into()),
            ..AnalyzerConfig::default()
        };
        cfg.expand_env();
        assert!(cfg.secret_key.is_none());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut cfg = AnalyzerConfig::default();
        cfg.fetch.timeout_secs = 0;
        assert!(matches!(cfg.validate(), Err(ConfigLoadError::Invalid(_))));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let cfg = AnalyzerConfig {
            secret_key: Some("hunter2".into()),
            ..AnalyzerConfig::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn debug_flag_raises_log_filter() {
        let cfg = AnalyzerConfig {
            debug: true,
            ..AnalyzerConfig::default()
        };
        assert_eq!(cfg.default_log_filter(), "debug");
        assert_eq!(AnalyzerConfig::default().default_log_filter(), "info");
    }
}
