//! Tunable constants

/// Factor by which `append` grows a full backing array
pub const SLICE_GROWTH_FACTOR: usize = 2;
