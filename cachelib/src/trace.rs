use std::fs::File;
use std::io::Read;
use std::path::Path;
use lazy_static::lazy_static;
use regex::Regex;
use crate::cache::Address;
use crate::error::SimulationError;
use crate::io::get_reader;

lazy_static! {
    static ref SEPARATOR: Regex = Regex::new(r"[,\s]+").unwrap();
}

/// Parses a trace of block addresses
///
/// Addresses may be separated by commas, whitespace, or any mix of the two, so both
/// `1,2,3` and one address per line are accepted. Each address is a non-negative decimal
/// integer, or hexadecimal with a `0x` prefix. Blank input is an empty trace
///
/// # Arguments
///
/// * `input`: The trace text
///
/// returns: Result<Vec<u64>, SimulationError>
///
/// # Examples
///
/// ```
/// use cachelib::trace::parse_trace;
/// assert_eq!(parse_trace("1, 2,0x10").unwrap(), vec![1, 2, 16]);
/// assert!(parse_trace("1,-2").is_err());
/// ```
pub fn parse_trace(input: &str) -> Result<Vec<Address>, SimulationError> {
    SEPARATOR
        .split(input.trim())
        .filter(|token| !token.is_empty())
        .enumerate()
        .map(|(position, token)| parse_address(token, position))
        .collect()
}

fn parse_address(token: &str, position: usize) -> Result<Address, SimulationError> {
    if token.starts_with('-') {
        return Err(SimulationError::Validation(format!(
            "address '{token}' at position {position} is negative"
        )));
    }
    let parsed = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => Address::from_str_radix(hex, 16),
        None => token.parse::<Address>(),
    };
    parsed.map_err(|e| {
        SimulationError::Validation(format!("address '{token}' at position {position} isn't a valid integer: {e}"))
    })
}

/// Reads and parses a trace file, see [`parse_trace`] for the accepted format
pub fn read_trace_file<P: AsRef<Path>>(path: P) -> Result<Vec<Address>, SimulationError> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(Vec::new());
    }
    let mut contents = String::new();
    get_reader(file)?.read_to_string(&mut contents)?;
    parse_trace(&contents)
}
