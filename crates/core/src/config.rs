use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `MEDIA_PLANNER__` and an optional TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Settings for the metrics engine's collaborators.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// File holding the objective -> default metrics table. The built-in
    /// catalog is used when unset.
    #[serde(default)]
    pub templates_path: Option<String>,
    /// Reject invalid campaign input instead of coercing it to zero.
    #[serde(default = "default_strict_validation")]
    pub strict_validation: bool,
}

// Default functions
fn default_node_id() -> String {
    "planner-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_strict_validation() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            templates_path: None,
            strict_validation: default_strict_validation(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and an optional config
    /// file. The file path comes from `MEDIA_PLANNER_CONFIG` when not given.
    pub fn load(file: Option<&str>) -> Result<Self, config::ConfigError> {
        let path = file
            .map(str::to_string)
            .or_else(|| std::env::var("MEDIA_PLANNER_CONFIG").ok());

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(&path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("MEDIA_PLANNER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
