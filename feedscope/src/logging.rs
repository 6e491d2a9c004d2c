//! Logging utilities and configuration for feedscope.
//!
//! The engine logs through `tracing`. [`LogConfig`] controls what a profiling
//! run emits; [`setup::init_logging`] installs a `tracing-subscriber` for
//! binaries that do not bring their own.

/// Logging behaviour of a profiling run.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether per-record aggregator errors are logged
    pub log_record_errors: bool,
    /// Whether progress lines are logged while reading
    pub log_progress: bool,
    /// Maximum length for logged field values (record ids, messages)
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_record_errors: true,
            log_progress: true,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// No progress lines and shorter fields, for runs logging at warn or
    /// below.
    pub fn quiet() -> Self {
        Self {
            log_record_errors: true,
            log_progress: false,
            max_field_length: 128,
        }
    }
}

/// Truncates a string to `max_length` characters if needed.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    match value.char_indices().nth(max_length) {
        None => value.to_string(),
        Some((cut, _)) => format!("{}...(truncated)", &value[..cut]),
    }
}

/// Subscriber setup for binaries.
pub mod setup {
    use tracing::Level;

    /// Configuration for feedscope's logging setup.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for everything outside feedscope
        pub level: Level,
        /// Log level for feedscope components specifically
        pub feedscope_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::WARN,
                feedscope_level: Level::INFO,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Sets the log level for feedscope components.
        pub fn with_feedscope_level(mut self, level: Level) -> Self {
            self.feedscope_level = level;
            self
        }

        /// Sets whether to use JSON output format.
        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        /// Sets a custom environment filter.
        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            if let Some(ref filter) = self.env_filter {
                filter.clone()
            } else {
                format!(
                    "{},feedscope={}",
                    self.level.as_str().to_lowercase(),
                    self.feedscope_level.as_str().to_lowercase()
                )
            }
        }
    }

    /// Installs a global subscriber writing to stderr. `RUST_LOG` takes
    /// precedence over the configured filter.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use feedscope::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::default().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}
