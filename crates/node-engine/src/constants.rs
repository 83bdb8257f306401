//! Engine-wide constants
//!
//! Defaults applied when a node leaves a setting unconfigured.

/// Node configuration defaults
pub mod defaults {
    /// Model used by LLM nodes without a configured model
    pub const MODEL: &str = "z-ai/glm-4.5-air:free";
    /// Branch used by repository nodes without a configured branch
    pub const BRANCH: &str = "main";
    /// Iteration bound for loop nodes
    pub const MAX_ITERATIONS: usize = 10;
    /// Hard cap on configured `maxIterations`
    pub const MAX_LOOP_ITERATIONS: usize = 10_000;
    /// Variable name for variable nodes
    pub const VARIABLE_NAME: &str = "var";
    /// Separator for transform `split`
    pub const SPLIT_SEPARATOR: &str = ",";
    /// Separator for aggregate `concat`/`join`
    pub const JOIN_SEPARATOR: &str = " ";
}

/// Timeout configuration (in seconds)
pub mod timeouts {
    /// Upper bound for a single external capability call
    pub const CAPABILITY_SECS: u64 = 120;
}
