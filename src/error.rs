use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetlistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("cannot find first block in signal chain '{chain}' (missing key: 1)")]
    MissingFirstBlock { chain: String },

    #[error("'type' not defined for block #{entry} in {chain}")]
    MissingType { chain: String, entry: String },

    #[error("{block_type} is not a valid block entry (block #{entry} in {chain})")]
    UnknownBlockType {
        chain: String,
        entry: String,
        block_type: String,
    },

    #[error("block #{entry} in {chain} is malformed: {reason}")]
    InvalidEntry {
        chain: String,
        entry: String,
        reason: String,
    },

    #[error("signal chain '{0}' not found in netlist")]
    UnknownChain(String),
}

pub type Result<T> = std::result::Result<T, NetlistError>;
