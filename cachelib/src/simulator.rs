use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use crate::cache::{Address, CacheState, CacheTrait, GenericCache};
use crate::config::{SimulationConfig, ValidatedConfig};
use crate::error::SimulationError;

/// The outcome of a single access, handed to the observer before the next access begins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessResult {
    pub address: Address,
    pub hit: bool,
    pub state: CacheState,
}

/// Receives every access in trace order, synchronously
///
/// Anything slow, such as pacing output for a human, belongs in the observer rather than the
/// simulator. Closures taking `&AccessResult` can be used directly
pub trait AccessObserver {
    fn on_access(&mut self, result: &AccessResult);
}

impl<F: FnMut(&AccessResult)> AccessObserver for F {
    fn on_access(&mut self, result: &AccessResult) {
        self(result)
    }
}

/// Ignores every access
#[derive(Debug, Default, Clone, Copy)]
pub struct NoObserver;

impl AccessObserver for NoObserver {
    fn on_access(&mut self, _result: &AccessResult) {}
}

/// Keeps every access result, in order
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    pub results: Vec<AccessResult>,
}

impl Recorder {
    /// The hit flags in trace order
    pub fn outcomes(&self) -> Vec<bool> {
        self.results.iter().map(|r| r.hit).collect()
    }
}

impl AccessObserver for Recorder {
    fn on_access(&mut self, result: &AccessResult) {
        self.results.push(result.clone());
    }
}

/// Running hit and miss counts. `hits + misses` is always the number of accesses processed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub hits: u64,
    pub misses: u64,
}

impl SimulationStats {
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }

    /// Zero when nothing has been accessed
    pub fn hit_ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }

    /// `1 - hit_ratio`, except for an empty trace where it is also zero
    pub fn miss_ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            _ => 1.0 - self.hit_ratio(),
        }
    }
}

/// The final result of a simulation. Can be serialised for output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub config: ValidatedConfig,
    pub total_accesses: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_ratio: f64,
    pub miss_ratio: f64,
}

/// The simulator replays traces through a cache, counts hits and misses, and reports every
/// access to its observer
///
/// It supports calling `run` multiple times, or driving it one `access` at a time, and will keep
/// accumulating statistics and simulation time. A caller which needs to stop early simply stops
/// calling `access`
pub struct Simulator<O: AccessObserver = NoObserver> {
    config: ValidatedConfig,
    cache: GenericCache,
    stats: SimulationStats,
    observer: O,
    simulation_time: Duration,
}

impl<O: AccessObserver> Simulator<O> {
    /// Validates a configuration and creates a simulator for it
    ///
    /// # Arguments
    ///
    /// * `config`: A simulation configuration, usually resulting from parsing JSON or arguments
    /// * `observer`: Receives each access as it happens
    ///
    /// returns: Result<Simulator<O>, SimulationError>
    pub fn new(config: &SimulationConfig, observer: O) -> Result<Self, SimulationError> {
        Ok(Self::from_validated(config.validate()?, observer))
    }

    /// Creates a simulator from an already validated configuration
    pub fn from_validated(config: ValidatedConfig, observer: O) -> Self {
        Self {
            cache: GenericCache::new(&config),
            config,
            stats: SimulationStats::default(),
            observer,
            simulation_time: Duration::new(0, 0),
        }
    }

    /// Accesses a single address, updating the statistics and notifying the observer
    ///
    /// returns: bool, true on a hit
    pub fn access(&mut self, address: Address) -> bool {
        let start = Instant::now();
        let set = self.cache.address_to_set(address);
        let hit = self.cache.read_and_update_line(address);
        if hit {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        debug!("Access {address} (set {set}): {}", if hit { "hit" } else { "miss" });
        let result = AccessResult {
            address,
            hit,
            state: self.cache.get_state(set),
        };
        // Observers may block, e.g. to pace output, which isn't simulation time
        self.simulation_time += start.elapsed();
        self.observer.on_access(&result);
        hit
    }

    /// Replays a trace strictly in order and reports the statistics so far
    ///
    /// # Arguments
    ///
    /// * `trace`: The addresses to access
    ///
    /// returns: SimulationReport
    pub fn run<I: IntoIterator<Item = Address>>(&mut self, trace: I) -> SimulationReport {
        for address in trace {
            self.access(address);
        }
        let report = self.report();
        info!(
            "Simulation complete: {} accesses, {} hits, {} misses",
            report.total_accesses, report.hits, report.misses
        );
        report
    }

    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            config: self.config,
            total_accesses: self.stats.total(),
            hits: self.stats.hits,
            misses: self.stats.misses,
            hit_ratio: self.stats.hit_ratio(),
            miss_ratio: self.stats.miss_ratio(),
        }
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Gets the wall-clock time spent simulating accesses, excluding time spent in the observer
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// Gets the number of block slots which are still empty
    pub fn get_uninitialised_line_count(&self) -> usize {
        self.cache.get_uninitialised_line_count()
    }
}

/// Validates a configuration and runs a whole trace through a fresh simulator without observing
/// individual accesses
pub fn simulate(config: &SimulationConfig, trace: &[Address]) -> Result<SimulationReport, SimulationError> {
    let mut simulator = Simulator::new(config, NoObserver)?;
    Ok(simulator.run(trace.iter().copied()))
}

impl Display for AccessResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Access {}: {}", self.address, if self.hit { "HIT" } else { "MISS" })?;
        write!(f, "Cache State: {}", self.state)
    }
}

impl Display for SimulationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total accesses: {}", self.total_accesses)?;
        writeln!(f, "Hits: {}", self.hits)?;
        writeln!(f, "Misses: {}", self.misses)?;
        writeln!(f, "Hit Ratio: {:.2}%", self.hit_ratio * 100.0)?;
        write!(f, "Miss Ratio: {:.2}%", self.miss_ratio * 100.0)
    }
}
