//! Constant variables.

/// Ring size used when nothing else is configured.
pub const DEFAULT_RING_BITS: u8 = 8;
/// Largest supported ring size; identifiers are carried as `u64`.
pub const MAX_RING_BITS: u8 = 64;
/// Upper bound of `find_predecessor` iterations before a lookup is reported as
/// non-convergent.
pub const DEFAULT_MAX_LOOKUP_HOPS: usize = 256;
/// Upper bound of peers a single `update_finger_table` propagation may visit.
pub const DEFAULT_MAX_UPDATE_HOPS: usize = 1024;
