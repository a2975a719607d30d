//! Construction parameters for a table.

use core::fmt;

/// Initial bucket count of a table built with `new()`.
pub const DEFAULT_BUCKETS: usize = 512;

/// When a store that adds a new entry doubles the bucket array.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum GrowPolicy {
    /// Grow only when the receiving bucket already held an entry and the
    /// item count exceeds the mask. A store into an empty bucket never
    /// grows, even past that load, so growth waits for the next collision.
    #[default]
    OnCollision,
    /// Grow after any new entry that leaves the item count above the mask.
    OnInsert,
}

/// Builder for table construction parameters.
///
/// `TableConfig::default()` reproduces `new()`: 512 buckets and
/// [`GrowPolicy::OnCollision`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TableConfig {
    buckets: usize,
    grow_policy: GrowPolicy,
}

impl TableConfig {
    pub const fn new() -> Self {
        Self {
            buckets: DEFAULT_BUCKETS,
            grow_policy: GrowPolicy::OnCollision,
        }
    }

    /// Initial bucket count. Must be a non-zero power of two.
    pub const fn buckets(mut self, buckets: usize) -> Self {
        self.buckets = buckets;
        self
    }

    pub const fn grow_policy(mut self, policy: GrowPolicy) -> Self {
        self.grow_policy = policy;
        self
    }

    pub const fn initial_buckets(&self) -> usize {
        self.buckets
    }

    pub const fn policy(&self) -> GrowPolicy {
        self.grow_policy
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buckets == 0 {
            return Err(ConfigError::ZeroBuckets);
        }
        if !self.buckets.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo(self.buckets));
        }
        Ok(())
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Rejected construction parameters.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    ZeroBuckets,
    NotPowerOfTwo(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroBuckets => f.write_str("bucket count must be non-zero"),
            ConfigError::NotPowerOfTwo(n) => {
                write!(f, "bucket count must be a power of two, got {n}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
