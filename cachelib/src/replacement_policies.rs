use std::collections::VecDeque;
use crate::cache::Address;
use crate::config::PolicyKind;

/// A generic trait for replacement policies. Each instance manages exactly one set.
pub trait ReplacementPolicy {
    /// Looks up an address, returning true on a hit and false on a miss
    ///
    /// On a miss the implementation must bring the address into the set, evicting an existing
    /// entry first if the set is full
    ///
    /// # Arguments
    ///
    /// * `address`: The block being accessed
    ///
    /// returns: bool
    fn access(&mut self, address: Address) -> bool;

    /// The visible contents of the set, in the order the policy defines for display
    fn view(&self) -> Vec<Address>;

    /// The number of blocks currently held
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The maximum number of blocks the set can hold
    fn capacity(&self) -> usize;
}

/// Last in, first out replacement. The set is a stack, and a miss on a full set discards the
/// block which was pushed most recently
///
/// Hits deliberately leave the stack untouched, a block keeps the position it was inserted at
/// for as long as it stays cached
pub struct LastInFirstOut {
    stack: Vec<Address>,
    capacity: usize,
}

impl LastInFirstOut {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            stack: Vec::with_capacity(capacity),
            capacity,
        }
    }
}

impl ReplacementPolicy for LastInFirstOut {
    fn access(&mut self, address: Address) -> bool {
        if self.stack.contains(&address) {
            return true;
        }
        if self.stack.len() >= self.capacity {
            self.stack.pop();
        }
        self.stack.push(address);
        false
    }

    /// Bottom of the stack first
    fn view(&self) -> Vec<Address> {
        self.stack.clone()
    }

    fn len(&self) -> usize {
        self.stack.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

/// A reduced adaptive replacement cache with two queues
///
/// New blocks enter the recency queue (t1). A second access promotes a block to the tail of the
/// frequency queue (t2), and further accesses move it back to that tail. When the set is full,
/// the head of t1 is evicted, falling back to the head of t2 only when t1 is empty
///
/// There are no ghost lists and no adaptive target size, so the split between the two queues is
/// driven purely by the access pattern
pub struct AdaptiveReplacement {
    recent: VecDeque<Address>,
    frequent: VecDeque<Address>,
    capacity: usize,
}

impl AdaptiveReplacement {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            recent: VecDeque::with_capacity(capacity),
            frequent: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// The recency queue (t1), head first
    pub fn recent(&self) -> impl Iterator<Item = &Address> {
        self.recent.iter()
    }

    /// The frequency queue (t2), head first
    pub fn frequent(&self) -> impl Iterator<Item = &Address> {
        self.frequent.iter()
    }
}

impl ReplacementPolicy for AdaptiveReplacement {
    fn access(&mut self, address: Address) -> bool {
        if let Some(position) = self.recent.iter().position(|a| *a == address) {
            self.recent.remove(position);
            self.frequent.push_back(address);
            return true;
        }
        if let Some(position) = self.frequent.iter().position(|a| *a == address) {
            self.frequent.remove(position);
            self.frequent.push_back(address);
            return true;
        }
        if self.recent.len() + self.frequent.len() >= self.capacity
            && self.recent.pop_front().is_none()
        {
            self.frequent.pop_front();
        }
        self.recent.push_back(address);
        false
    }

    /// t1 head to tail, followed by t2 head to tail
    fn view(&self) -> Vec<Address> {
        self.recent.iter().chain(self.frequent.iter()).copied().collect()
    }

    fn len(&self) -> usize {
        self.recent.len() + self.frequent.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Second chance replacement using a reference bit per slot and a circular hand
///
/// Until the set is full, misses fill slots in arrival order and the hand stays put. After that,
/// the hand sweeps forward clearing reference bits until it reaches a slot whose bit is already
/// clear, which is the victim. A full sweep clears every bit, so a victim is always found within
/// two revolutions
pub struct Clock {
    entries: Vec<Address>,
    referenced: Vec<bool>,
    hand: usize,
    capacity: usize,
}

impl Clock {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            entries: Vec::with_capacity(capacity),
            referenced: Vec::with_capacity(capacity),
            hand: 0,
            capacity,
        }
    }

    /// The slot the next sweep starts from
    pub fn hand(&self) -> usize {
        self.hand
    }

    /// Reference bits in slot order
    pub fn reference_bits(&self) -> &[bool] {
        &self.referenced
    }
}

impl ReplacementPolicy for Clock {
    fn access(&mut self, address: Address) -> bool {
        if let Some(slot) = self.entries.iter().position(|a| *a == address) {
            self.referenced[slot] = true;
            return true;
        }
        if self.entries.len() < self.capacity {
            self.entries.push(address);
            self.referenced.push(true);
            return false;
        }
        while self.referenced[self.hand] {
            self.referenced[self.hand] = false;
            self.hand = (self.hand + 1) % self.capacity;
        }
        self.entries[self.hand] = address;
        self.referenced[self.hand] = true;
        self.hand = (self.hand + 1) % self.capacity;
        false
    }

    /// Slot order, not access order
    fn view(&self) -> Vec<Address> {
        self.entries.clone()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Enum for the three policies provided by the library
///
/// The policy is picked once when the simulator is built, so explicitly branching on the concrete
/// types keeps every call statically dispatched without boxing each set
pub enum GenericPolicy {
    LastInFirstOut(LastInFirstOut),
    AdaptiveReplacement(AdaptiveReplacement),
    Clock(Clock),
}

impl GenericPolicy {
    /// Creates an empty set of the given capacity managed by the chosen policy
    pub fn new(kind: PolicyKind, capacity: usize) -> Self {
        match kind {
            PolicyKind::Lifo => GenericPolicy::from(LastInFirstOut::new(capacity)),
            PolicyKind::Arc => GenericPolicy::from(AdaptiveReplacement::new(capacity)),
            PolicyKind::Clock => GenericPolicy::from(Clock::new(capacity)),
        }
    }
}

impl From<LastInFirstOut> for GenericPolicy {
    fn from(value: LastInFirstOut) -> Self {
        Self::LastInFirstOut(value)
    }
}

impl From<AdaptiveReplacement> for GenericPolicy {
    fn from(value: AdaptiveReplacement) -> Self {
        Self::AdaptiveReplacement(value)
    }
}

impl From<Clock> for GenericPolicy {
    fn from(value: Clock) -> Self {
        Self::Clock(value)
    }
}

impl ReplacementPolicy for GenericPolicy {
    fn access(&mut self, address: Address) -> bool {
        match self {
            GenericPolicy::LastInFirstOut(p) => p.access(address),
            GenericPolicy::AdaptiveReplacement(p) => p.access(address),
            GenericPolicy::Clock(p) => p.access(address),
        }
    }

    fn view(&self) -> Vec<Address> {
        match self {
            GenericPolicy::LastInFirstOut(p) => p.view(),
            GenericPolicy::AdaptiveReplacement(p) => p.view(),
            GenericPolicy::Clock(p) => p.view(),
        }
    }

    fn len(&self) -> usize {
        match self {
            GenericPolicy::LastInFirstOut(p) => p.len(),
            GenericPolicy::AdaptiveReplacement(p) => p.len(),
            GenericPolicy::Clock(p) => p.len(),
        }
    }

    fn capacity(&self) -> usize {
        match self {
            GenericPolicy::LastInFirstOut(p) => p.capacity(),
            GenericPolicy::AdaptiveReplacement(p) => p.capacity(),
            GenericPolicy::Clock(p) => p.capacity(),
        }
    }
}
