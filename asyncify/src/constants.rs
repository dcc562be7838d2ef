//! Engine-wide defaults. Every one of these can be overridden through
//! [`crate::config::Config`].

/// Suffix appended to a synchronous name to form its asynchronous
/// counterpart's name.
pub const DEFAULT_ASYNC_SUFFIX: &str = "Async";

/// Type names recognized as cancellation tokens in trailing parameters.
pub const DEFAULT_CANCELLATION_TYPES: &[&str] = &["CancellationToken"];

/// Member names that reconfigure a deferred result without consuming it.
pub const DEFAULT_CONFIGURE_MEMBERS: &[&str] = &["ConfigureAwait"];

/// Member names that adapt a deferred result for awaiting.
pub const DEFAULT_AWAITER_MEMBERS: &[&str] = &["GetAwaiter"];

/// Member names that block on a deferred result; rewriting replaces the
/// blocking access with an await.
pub const DEFAULT_BLOCKING_MEMBERS: &[&str] = &["Wait", "Result", "GetResult"];
