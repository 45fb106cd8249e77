//! Emergency department triage core
//!
//! Triage scoring, deterioration prediction, resource allocation and quality
//! metrics, plus the case service that keeps triage fields in step with
//! every vitals update.

pub mod clock;
pub mod core;
pub mod db;
pub mod ed;
pub mod error;
pub mod models;
pub mod telemetry;

pub use crate::error::{EdError, Result};

/// Application configuration
pub mod config {
    use serde::Deserialize;

    use crate::core::quality::DEFAULT_TIMEFRAME_HOURS;
    use crate::error::Result;
    use crate::models::{Resource, ResourceType};

    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(default)]
    pub struct Settings {
        pub logging: LoggingSettings,
        pub quality: QualitySettings,
        /// Physical inventory seeded into the resource pool.
        pub resources: Vec<Resource>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(default)]
    pub struct LoggingSettings {
        pub level: String,
        pub json: bool,
    }

    impl Default for LoggingSettings {
        fn default() -> Self {
            Self {
                level: "info".into(),
                json: false,
            }
        }
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(default)]
    pub struct QualitySettings {
        pub timeframe_hours: i64,
    }

    impl Default for QualitySettings {
        fn default() -> Self {
            Self {
                timeframe_hours: DEFAULT_TIMEFRAME_HOURS,
            }
        }
    }

    impl Settings {
        /// Settings with an inventory of `n` resources of each type, used when
        /// no inventory is configured.
        pub fn with_default_inventory(mut self, per_type: usize) -> Self {
            if self.resources.is_empty() {
                let kinds = [
                    ("TB", ResourceType::TraumaBay),
                    ("AB", ResourceType::AcuteBed),
                    ("SB", ResourceType::StandardBed),
                    ("TC", ResourceType::TriageChair),
                ];
                for (prefix, kind) in kinds {
                    for n in 1..=per_type {
                        self.resources.push(Resource::available(format!("{}-{}", prefix, n), kind));
                    }
                }
            }
            self
        }
    }

    /// Load configuration from file
    ///
    /// Layers `config/default`, `config/{ED_ENV}` and `ED__*` environment
    /// variables. An explicit `path` replaces the two file layers.
    pub fn load_settings(path: Option<&str>) -> Result<Settings> {
        dotenv::dotenv().ok();

        let mut builder = config::Config::builder();
        match path {
            Some(path) => {
                builder = builder.add_source(config::File::with_name(path));
            }
            None => {
                let env = std::env::var("ED_ENV").unwrap_or_else(|_| "development".into());
                builder = builder
                    .add_source(config::File::with_name("config/default").required(false))
                    .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
            }
        }

        let settings = builder
            .add_source(config::Environment::with_prefix("ED").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

}
