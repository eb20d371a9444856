use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use toml::{Table, Value};

use crate::block::{Block, BlockConfig, BlockType};
use crate::cascade::Simulation;
use crate::error::{NetlistError, Result};

const SIM_TABLE_NAMES: [&str; 3] = ["sim", "simulator", "simulation"];

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct SimConfig {
    pin: Option<f64>,  // dBm
    bw: Option<f64>,   // Hz
    temp: Option<f64>, // Kelvin
}

impl SimConfig {
    fn simulation(&self) -> Simulation {
        let defaults = Simulation::default();
        Simulation {
            pin_dbm: self.pin.unwrap_or(defaults.pin_dbm),
            bandwidth_hz: self.bw.unwrap_or(defaults.bandwidth_hz),
            noise_temperature_k: self.temp.unwrap_or(defaults.noise_temperature_k),
        }
    }
}

/// An ordered chain of blocks, as numbered in the netlist.
#[derive(Clone, Debug)]
pub struct SignalChain {
    pub name: String,
    pub blocks: Vec<Block>,
}

/// Every signal chain of a netlist plus its simulation settings.
#[derive(Clone, Debug)]
pub struct Netlist {
    pub sim: Simulation,
    pub chains: BTreeMap<String, SignalChain>,
}

impl Netlist {
    pub fn chain(&self, name: &str) -> Result<&SignalChain> {
        self.chains
            .get(name)
            .ok_or_else(|| NetlistError::UnknownChain(name.to_string()))
    }
}

pub fn load_netlist(path: impl AsRef<Path>) -> Result<Netlist> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "loading netlist");
    let content = fs::read_to_string(path)?;
    parse_netlist(&content)
}

/// Parse `path` completely and return how many signal chains it defines.
pub fn validate_netlist(path: impl AsRef<Path>) -> Result<usize> {
    let netlist = load_netlist(path)?;
    if netlist.chains.is_empty() {
        tracing::warn!("netlist does not define any signal chain");
    }
    Ok(netlist.chains.len())
}

pub fn parse_netlist(content: &str) -> Result<Netlist> {
    let table: Table = toml::from_str(content)?;

    let mut sim = Simulation::default();
    let mut chains = BTreeMap::new();

    for (name, value) in table {
        if SIM_TABLE_NAMES.contains(&name.as_str()) {
            let sim_config: SimConfig = value.try_into()?;
            sim = sim_config.simulation();
            continue;
        }
        match value {
            Value::Table(entries) => {
                let chain = build_chain(&name, &entries)?;
                tracing::info!(
                    chain = %name,
                    blocks = chain.blocks.len(),
                    "netlisted signal chain"
                );
                chains.insert(name, chain);
            }
            other => {
                tracing::warn!(
                    key = %name,
                    kind = other.type_str(),
                    "ignoring non-table netlist entry"
                );
            }
        }
    }

    Ok(Netlist { sim, chains })
}

fn build_chain(name: &str, entries: &Table) -> Result<SignalChain> {
    if !entries.contains_key("1") {
        return Err(NetlistError::MissingFirstBlock {
            chain: name.to_string(),
        });
    }

    // numeric ordering, so block 10 follows block 9
    let mut numbered: BTreeMap<u32, (&String, &Value)> = BTreeMap::new();
    for (entry, value) in entries {
        let number = entry.parse::<u32>().map_err(|_| NetlistError::InvalidEntry {
            chain: name.to_string(),
            entry: entry.clone(),
            reason: "block number must be a positive integer".to_string(),
        })?;
        numbered.insert(number, (entry, value));
    }

    let blocks = numbered
        .into_iter()
        .map(|(number, (entry, value))| build_block(name, entry, number, value))
        .collect::<Result<Vec<Block>>>()?;

    Ok(SignalChain {
        name: name.to_string(),
        blocks,
    })
}

fn build_block(chain: &str, entry: &str, number: u32, value: &Value) -> Result<Block> {
    let invalid = |reason: String| NetlistError::InvalidEntry {
        chain: chain.to_string(),
        entry: entry.to_string(),
        reason,
    };

    let table = value
        .as_table()
        .ok_or_else(|| invalid("expected a table of block properties".to_string()))?;

    let type_name = table
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| NetlistError::MissingType {
            chain: chain.to_string(),
            entry: entry.to_string(),
        })?;

    let block_type =
        BlockType::from_name(type_name).ok_or_else(|| NetlistError::UnknownBlockType {
            chain: chain.to_string(),
            entry: entry.to_string(),
            block_type: type_name.to_string(),
        })?;

    let mut config: BlockConfig = Value::Table(table.clone())
        .try_into()
        .map_err(|e: toml::de::Error| invalid(e.message().to_string()))?;
    if config.name.is_empty() {
        config.name = format!("{} {}", block_type.label(), number);
    }

    Ok(Block::new(block_type, &config))
}
