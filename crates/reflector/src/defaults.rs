//! Tunable constants

/// Buffer capacity of a channel instantiated without an explicit capacity
pub const DEFAULT_CHANNEL_CAPACITY: usize = 0;
