use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use log::debug;
use serde::{Deserialize, Serialize};
use crate::config::{MappingKind, PolicyKind, ValidatedConfig};
use crate::replacement_policies::{GenericPolicy, ReplacementPolicy};

/// An opaque block identifier. There are no byte offsets or line sizes, each address is a block
pub type Address = u64;

/// The visible contents of the part of the cache touched by an access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheState {
    /// Every slot of a direct mapped cache, `None` for slots which have never been filled
    Slots(Vec<Option<Address>>),
    /// One set of a set associative cache, in the order its policy presents it
    Set { index: usize, entries: Vec<Address> },
}

/// A generic trait for the address mappings
///
/// The trait makes no assumptions about replacement, which is left entirely to the
/// implementation. Direct mapped caches have no choice to make, set associative caches defer to
/// a policy per set
pub trait CacheTrait {
    /// Converts an address into the slot (direct mapped) or set (set associative) it belongs to
    ///
    /// # Arguments
    ///
    /// * `address`: The accessed block
    ///
    /// returns: usize
    fn address_to_set(&self, address: Address) -> usize;

    /// Looks up an address, returning true on a cache hit, and false otherwise
    ///
    /// On a miss the block is brought into the cache, evicting whatever the mapping or the
    /// policy chooses
    fn read_and_update_line(&mut self, address: Address) -> bool;

    /// Gets the visible state of a slot or set, as returned by `address_to_set`
    fn get_state(&self, set: usize) -> CacheState;

    /// Gets the number of block slots which have never been filled. Useful for analysing cache
    /// performance or debugging
    fn get_uninitialised_line_count(&self) -> usize;
}

/// A direct mapped cache. Each address has exactly one slot it can occupy, and a miss always
/// overwrites that slot
pub struct DirectMapped {
    slots: Vec<Option<Address>>,
}

impl DirectMapped {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            slots: vec![None; capacity],
        }
    }
}

impl CacheTrait for DirectMapped {
    fn address_to_set(&self, address: Address) -> usize {
        (address % self.slots.len() as u64) as usize
    }

    fn read_and_update_line(&mut self, address: Address) -> bool {
        let index = self.address_to_set(address);
        let slot = &mut self.slots[index];
        if *slot == Some(address) {
            return true;
        }
        *slot = Some(address);
        false
    }

    // The whole cache is the visible structure, not just the slot that was touched
    fn get_state(&self, _set: usize) -> CacheState {
        CacheState::Slots(self.slots.clone())
    }

    fn get_uninitialised_line_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }
}

/// A set associative cache, where every set is managed by its own replacement policy
///
/// Sets are created the first time an address maps to them and then live as long as the cache.
/// The cache is the only owner of the set index to policy mapping
pub struct SetAssociative {
    sets: BTreeMap<usize, GenericPolicy>,
    num_sets: usize,
    associativity: usize,
    policy: PolicyKind,
}

impl SetAssociative {
    pub fn new(num_sets: usize, associativity: usize, policy: PolicyKind) -> Self {
        debug_assert!(num_sets > 0 && associativity > 0);
        Self {
            sets: BTreeMap::new(),
            num_sets,
            associativity,
            policy,
        }
    }
}

impl CacheTrait for SetAssociative {
    fn address_to_set(&self, address: Address) -> usize {
        (address % self.num_sets as u64) as usize
    }

    fn read_and_update_line(&mut self, address: Address) -> bool {
        let set = self.address_to_set(address);
        let (policy, associativity) = (self.policy, self.associativity);
        self.sets
            .entry(set)
            .or_insert_with(|| {
                debug!("Creating {policy} set {set} with {associativity} ways");
                GenericPolicy::new(policy, associativity)
            })
            .access(address)
    }

    fn get_state(&self, set: usize) -> CacheState {
        CacheState::Set {
            index: set,
            entries: self.sets.get(&set).map(|p| p.view()).unwrap_or_default(),
        }
    }

    fn get_uninitialised_line_count(&self) -> usize {
        let filled: usize = self.sets.values().map(|p| p.len()).sum();
        self.num_sets * self.associativity - filled
    }
}

/// Enum for both mappings provided by the library, so the simulator can hold either without
/// boxing
pub enum GenericCache {
    DirectMapped(DirectMapped),
    SetAssociative(SetAssociative),
}

impl GenericCache {
    /// Creates an empty cache for a validated configuration
    pub fn new(config: &ValidatedConfig) -> Self {
        match config.mapping {
            MappingKind::DirectMapped => GenericCache::from(DirectMapped::new(config.capacity)),
            MappingKind::SetAssociative => GenericCache::from(SetAssociative::new(
                config.sets,
                config.associativity,
                config.policy,
            )),
        }
    }
}

impl From<DirectMapped> for GenericCache {
    fn from(value: DirectMapped) -> Self {
        Self::DirectMapped(value)
    }
}

impl From<SetAssociative> for GenericCache {
    fn from(value: SetAssociative) -> Self {
        Self::SetAssociative(value)
    }
}

impl CacheTrait for GenericCache {
    fn address_to_set(&self, address: Address) -> usize {
        match self {
            GenericCache::DirectMapped(c) => c.address_to_set(address),
            GenericCache::SetAssociative(c) => c.address_to_set(address),
        }
    }

    fn read_and_update_line(&mut self, address: Address) -> bool {
        match self {
            GenericCache::DirectMapped(c) => c.read_and_update_line(address),
            GenericCache::SetAssociative(c) => c.read_and_update_line(address),
        }
    }

    fn get_state(&self, set: usize) -> CacheState {
        match self {
            GenericCache::DirectMapped(c) => c.get_state(set),
            GenericCache::SetAssociative(c) => c.get_state(set),
        }
    }

    fn get_uninitialised_line_count(&self) -> usize {
        match self {
            GenericCache::DirectMapped(c) => c.get_uninitialised_line_count(),
            GenericCache::SetAssociative(c) => c.get_uninitialised_line_count(),
        }
    }
}

impl CacheState {
    /// The addresses currently held, skipping empty slots
    pub fn addresses(&self) -> Vec<Address> {
        match self {
            CacheState::Slots(slots) => slots.iter().flatten().copied().collect(),
            CacheState::Set { entries, .. } => entries.clone(),
        }
    }
}

impl Display for CacheState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let formatted: Vec<String> = match self {
            CacheState::Slots(slots) => slots
                .iter()
                .map(|s| s.map_or_else(|| "None".to_string(), |a| a.to_string()))
                .collect(),
            CacheState::Set { entries, .. } => entries.iter().map(|a| a.to_string()).collect(),
        };
        write!(f, "[{}]", formatted.join(", "))
    }
}
