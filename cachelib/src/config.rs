use std::fmt::{Display, Formatter};
use std::io::Read;
use std::str::FromStr;
use log::warn;
use serde::{Deserialize, Serialize};
use crate::error::SimulationError;

/// A simulation configuration as supplied by the user, usually parsed from JSON
///
/// Nothing here is trusted: sizes may be zero or negative and the identifiers may be anything.
/// Use [`SimulationConfig::validate`] to turn it into something a simulator can be built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "SimulationConfig::default_size")]
    pub size: i64,
    #[serde(default = "SimulationConfig::default_associativity")]
    pub associativity: i64,
    #[serde(default = "SimulationConfig::default_policy")]
    pub policy: String,
    #[serde(default = "SimulationConfig::default_mapping")]
    pub mapping: String,
}

/// The replacement policy used by each set - LIFO, ARC, or CLOCK
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    #[serde(rename = "LIFO", alias = "lifo")]
    Lifo,
    #[serde(rename = "ARC", alias = "arc")]
    Arc,
    #[serde(rename = "CLOCK", alias = "clock")]
    Clock,
}

/// How addresses are placed - one slot per index, or sets managed by a replacement policy
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MappingKind {
    #[serde(rename = "direct-mapped", alias = "direct")]
    DirectMapped,
    #[serde(rename = "set-associative", alias = "set")]
    SetAssociative,
}

/// A configuration which has passed validation. Every field is usable as is
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedConfig {
    pub capacity: usize,
    /// Always 1 for direct mapped caches, where each slot behaves as a set of one
    pub associativity: usize,
    pub sets: usize,
    pub policy: PolicyKind,
    pub mapping: MappingKind,
}

impl SimulationConfig {
    fn default_size() -> i64 {
        4
    }

    fn default_associativity() -> i64 {
        2
    }

    fn default_policy() -> String {
        PolicyKind::Lifo.to_string()
    }

    fn default_mapping() -> String {
        MappingKind::SetAssociative.to_string()
    }

    /// Parses a configuration from a JSON document. Missing fields take their defaults
    ///
    /// Sizes which aren't integers, such as `"4"` or `4.5`, are validation errors rather than
    /// JSON errors, the document itself is well formed
    pub fn from_json<R: Read>(reader: R) -> Result<Self, SimulationError> {
        let document: serde_json::Value = serde_json::from_reader(reader)?;
        for field in ["size", "associativity"] {
            if let Some(value) = document.get(field) {
                if !value.is_i64() {
                    return Err(SimulationError::Validation(format!(
                        "{field} must be an integer, got {value}"
                    )));
                }
            }
        }
        Ok(serde_json::from_value(document)?)
    }

    /// Checks the configuration and resolves the identifiers
    ///
    /// Identifiers are checked first, then sizes, then the resulting number of sets. Any
    /// associativity which leaves at least one set is accepted, the remainder of the capacity
    /// is simply unused
    ///
    /// returns: Result<ValidatedConfig, SimulationError>
    pub fn validate(&self) -> Result<ValidatedConfig, SimulationError> {
        let policy: PolicyKind = self.policy.parse()?;
        let mapping: MappingKind = self.mapping.parse()?;
        let capacity = positive("capacity", self.size)?;
        match mapping {
            MappingKind::DirectMapped => Ok(ValidatedConfig {
                capacity,
                associativity: 1,
                sets: capacity,
                policy,
                mapping,
            }),
            MappingKind::SetAssociative => {
                let associativity = positive("associativity", self.associativity)?;
                let sets = capacity / associativity;
                if sets < 1 {
                    return Err(SimulationError::Configuration(format!(
                        "associativity {associativity} exceeds capacity {capacity}, leaving no usable sets"
                    )));
                }
                if capacity % associativity != 0 {
                    warn!(
                        "Capacity {capacity} isn't a multiple of associativity {associativity}, only {} blocks are usable",
                        sets * associativity
                    );
                }
                Ok(ValidatedConfig {
                    capacity,
                    associativity,
                    sets,
                    policy,
                    mapping,
                })
            }
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            size: Self::default_size(),
            associativity: Self::default_associativity(),
            policy: Self::default_policy(),
            mapping: Self::default_mapping(),
        }
    }
}

fn positive(name: &str, value: i64) -> Result<usize, SimulationError> {
    if value < 1 {
        return Err(SimulationError::Validation(format!("{name} must be a positive integer, got {value}")));
    }
    usize::try_from(value)
        .map_err(|_| SimulationError::Validation(format!("{name} {value} is too large for this platform")))
}

impl FromStr for PolicyKind {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lifo" => Ok(PolicyKind::Lifo),
            "arc" => Ok(PolicyKind::Arc),
            "clock" => Ok(PolicyKind::Clock),
            _ => Err(SimulationError::UnsupportedPolicy(format!(
                "unrecognised replacement policy '{s}', expected one of LIFO, ARC, CLOCK"
            ))),
        }
    }
}

impl Display for PolicyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PolicyKind::Lifo => "LIFO",
            PolicyKind::Arc => "ARC",
            PolicyKind::Clock => "CLOCK",
        };
        f.write_str(name)
    }
}

impl FromStr for MappingKind {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct-mapped" | "direct" => Ok(MappingKind::DirectMapped),
            "set-associative" | "set" | "associative" => Ok(MappingKind::SetAssociative),
            _ => Err(SimulationError::UnsupportedPolicy(format!(
                "unrecognised mapping '{s}', expected one of direct-mapped, set-associative"
            ))),
        }
    }
}

impl Display for MappingKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MappingKind::DirectMapped => "direct-mapped",
            MappingKind::SetAssociative => "set-associative",
        };
        f.write_str(name)
    }
}
