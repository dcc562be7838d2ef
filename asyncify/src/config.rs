//! Engine configuration.
//!
//! The serde-facing [`Config`] mirrors an `[asyncify]` table the host parses
//! out of its own configuration file; every field is optional and falls back
//! to the defaults in [`crate::constants`]. Programmatic hooks (seed
//! predicate, precondition classifier, per-function overrides) are not part
//! of this struct — they are installed on [`crate::engine::Asyncify`]
//! directly.

mod models;

pub(crate) mod compiled;

pub use models::{Config, EngineConfig};

impl Config {
    /// Parses a configuration from TOML text.
    ///
    /// The engine does not discover configuration files; the host reads the
    /// file and hands the text over.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
