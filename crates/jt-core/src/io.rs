//! Reading networks, evidence, and training data from files.
//!
//! Files are JSON unless the extension is `.yaml` or `.yml`. Networks are
//! decoded into node declarations first and validated afterwards, so a bad
//! network reports its structural error instead of a generic parse error.

use jt_common::{Error, Evidence, Network, Node, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

fn parse<T: DeserializeOwned>(content: &str, yaml: bool, what: &str) -> Result<T> {
    if yaml {
        serde_yaml::from_str(content).map_err(|e| Error::Parse(format!("{}: {}", what, e)))
    } else {
        serde_json::from_str(content).map_err(|e| Error::Parse(format!("{}: {}", what, e)))
    }
}

fn read<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = fs::read_to_string(path)?;
    parse(&content, is_yaml(path), &format!("{} {}", what, path.display()))
}

pub fn read_network(path: &Path) -> Result<Network> {
    let nodes: Vec<Node> = read(path, "network")?;
    Network::new(nodes)
}

pub fn read_evidence(path: &Path) -> Result<Evidence> {
    read(path, "evidence")
}

/// A list of evidence objects, one per observation.
pub fn read_observations(path: &Path) -> Result<Vec<Evidence>> {
    read(path, "observations")
}

/// Evidence given inline on the command line.
pub fn parse_evidence_json(json: &str) -> Result<Evidence> {
    parse(json, false, "inline evidence")
}

pub fn write_network(path: &Path, network: &Network) -> Result<()> {
    let content = if is_yaml(path) {
        serde_yaml::to_string(network).map_err(|e| Error::Parse(e.to_string()))?
    } else {
        serde_json::to_string_pretty(network)?
    };
    fs::write(path, content)?;
    Ok(())
}
