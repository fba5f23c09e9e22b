//! Metric name and label definitions.

/// Plugin discovery metrics
pub mod discovery {
    /// Discovery runs started
    pub const RUNS_TOTAL: &str = "plinth_discovery_runs_total";
    /// Discovery runs aborted by a fatal error
    pub const FAILED_RUNS_TOTAL: &str = "plinth_discovery_failed_runs_total";
    /// Wall time of a discovery run in seconds
    pub const DURATION_SECONDS: &str = "plinth_discovery_duration_seconds";
    /// Package descriptors that survived deduplication
    pub const DESCRIPTORS_TOTAL: &str = "plinth_discovery_descriptors_total";
    /// Duplicate results dropped by deduplication
    pub const DUPLICATES_TOTAL: &str = "plinth_discovery_duplicates_total";
    /// Packs synthesized
    pub const PACKS_TOTAL: &str = "plinth_discovery_packs_total";
    /// Per-item errors, labelled by [`labels::ERROR_KIND`]
    pub const ERRORS_TOTAL: &str = "plinth_discovery_errors_total";
    /// Classified module specs, labelled by [`labels::SPEC_STATE`]
    pub const SPECS_TOTAL: &str = "plinth_discovery_specs_total";
    /// Deprecation notices emitted while extending configuration
    pub const DEPRECATIONS_TOTAL: &str = "plinth_discovery_deprecations_total";
}

/// Common label keys
pub mod labels {
    /// `invalid_directory`, `invalid_pack` or `other`
    pub const ERROR_KIND: &str = "kind";
    /// `enabled`, `disabled` or `invalid_version`
    pub const SPEC_STATE: &str = "state";
}
