//! Engine configuration.

/// How reads of a pointer that was allocated but never set are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsetPolicy {
    /// Fail with a decode error.
    #[default]
    Reject,
    /// Decode as a null value, so `Option<T>` handles read `None`.
    DecodeAsNull,
}

/// Configuration for an engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// Treatment of reads from unset pointers.
    pub unset_reads: UnsetPolicy,

    /// Attempts made by `Stm::transact_with_retry` before giving up.
    pub max_attempts: u32,

    /// Whether a transaction writes back its changed handles before opening a
    /// child, so the child observes in-place edits.
    pub flush_before_nested: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            unset_reads: UnsetPolicy::Reject,
            max_attempts: 8,
            flush_before_nested: true,
        }
    }
}

impl Config {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the unset-read policy.
    #[must_use]
    pub const fn unset_reads(mut self, policy: UnsetPolicy) -> Self {
        self.unset_reads = policy;
        self
    }

    /// Sets the retry budget. Zero is treated as one attempt.
    #[must_use]
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets whether changed handles are flushed before nesting.
    #[must_use]
    pub const fn flush_before_nested(mut self, value: bool) -> Self {
        self.flush_before_nested = value;
        self
    }
}
