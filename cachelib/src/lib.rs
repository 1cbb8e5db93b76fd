//! # CacheLib
//!
//! Cachelib is a library for replaying block address traces against a simulated cache
//!
//! It provides direct mapped and set associative mappings, three replacement policies (LIFO, a
//! simplified two queue ARC, and CLOCK), and a simulator which reports every access to an
//! observer and collects hit and miss statistics
//!
//! Everything that can fail does so while validating input, before the first access is made

/// Contains the address mappings, and a utility enum for both of them
pub mod cache;

/// Contains the configuration format, and its validation
pub mod config;

/// Contains the error type shared by the library
pub mod error;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Contains the simulator, the observer interface, and the result types
pub mod simulator;

/// Contains parsing for address traces
pub mod trace;

mod io;

#[cfg(test)]
mod test;

/// Contains utilities for running tests and benchmarks.
pub mod util;
