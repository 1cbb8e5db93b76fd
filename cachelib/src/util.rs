use crate::cache::Address;
use crate::config::{MappingKind, PolicyKind, SimulationConfig};

pub const POLICIES: [PolicyKind; 3] = [PolicyKind::Lifo, PolicyKind::Arc, PolicyKind::Clock];
pub const MAPPINGS: [MappingKind; 2] = [MappingKind::DirectMapped, MappingKind::SetAssociative];

/// Builds a configuration from typed parts
pub fn config_for(size: i64, associativity: i64, policy: PolicyKind, mapping: MappingKind) -> SimulationConfig {
    SimulationConfig {
        size,
        associativity,
        policy: policy.to_string(),
        mapping: mapping.to_string(),
    }
}

/// A deterministic pseudo random trace over `0..span`
///
/// Uses a 64-bit LCG (Knuth's MMIX constants) so benchmarks and tests replay the same trace on
/// every run
pub fn synthetic_trace(length: usize, span: u64, seed: u64) -> Vec<Address> {
    let mut state = seed;
    (0..length)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) % span.max(1)
        })
        .collect()
}

/// A trace which loops over `0..working_set` repeatedly, the classic pattern that punishes
/// recency based eviction once the working set exceeds the cache
pub fn looping_trace(length: usize, working_set: u64) -> Vec<Address> {
    (0..length as u64).map(|i| i % working_set.max(1)).collect()
}
