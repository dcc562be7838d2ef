use serde::Deserialize;

/// Top-level configuration struct.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// The `[asyncify]` table.
    #[serde(default)]
    pub asyncify: EngineConfig,
}

/// Tunable knobs of the decision engine. Every field is optional; `None`
/// means the built-in default.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EngineConfig {
    /// Suffix forming an asynchronous counterpart's name (default `Async`).
    pub async_suffix: Option<String>,
    /// Type names recognized as cancellation tokens.
    pub cancellation_types: Option<Vec<String>>,
    /// Whether cancellation tokens are forwarded through converted call
    /// chains (default `true`).
    pub propagate_cancellation: Option<bool>,

    /// Counterpart search: admit same-name overloads (default `false`).
    pub allow_same_name: Option<bool>,
    /// Counterpart search: admit one extra trailing cancellation-token
    /// parameter (default `true`).
    pub accepts_cancellation: Option<bool>,
    /// Counterpart search: require exactly equal parameter types, disabling
    /// delegate upgrades (default `false`).
    pub equal_parameters: Option<bool>,
    /// Counterpart search: also search base types / interfaces
    /// (default `true`).
    pub search_inherited: Option<bool>,

    /// Members that reconfigure a deferred result without consuming it.
    pub configure_members: Option<Vec<String>>,
    /// Members that adapt a deferred result for awaiting.
    pub awaiter_members: Option<Vec<String>>,
    /// Members that block on a deferred result.
    pub blocking_members: Option<Vec<String>>,

    /// Regex patterns over `Type.function` names seeded directly to
    /// conversion.
    pub seed: Option<Vec<String>>,
    /// Regex patterns over `Type.function` names excluded from conversion.
    pub ignore: Option<Vec<String>>,
    /// Attribute names excluding a declaration from conversion.
    pub ignore_attributes: Option<Vec<String>>,
    /// Regex patterns for functions kept unconverted (pinned `Unknown`)
    /// instead of being resolved to `Ignore` after propagation.
    pub keep_unknown: Option<Vec<String>>,
    /// Regex patterns for functions converted without applying the wrapper
    /// return type.
    pub preserve_return_type: Option<Vec<String>>,
    /// Regex patterns for functions that must convert whenever a callee
    /// converts, even with no invokers or related members.
    pub force_convert: Option<Vec<String>>,
}
