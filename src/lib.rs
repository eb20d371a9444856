//! RF system budget analysis.
//!
//! Build an ordered chain of [`Block`]s (by hand or from a TOML netlist with
//! [`load_netlist`]), then run [`cascade`] for the cascaded gain, noise figure,
//! intercept and compression figures, or drive a stimulus through the chain
//! with [`cascade_vector_return_vector`] to see the level at every node.

mod block;
mod cascade;
pub mod cli;
pub mod constants;
mod error;
mod file;
mod node;
pub mod results;
mod signal;

pub use block::{
    AmplifierBandwidth, Attribute, Block, BlockConfig, BlockType, DetectorLaw, DetectorRange,
    FilterResponse, GainControl, BLOCK_TYPE_NAMES,
};
pub use cascade::{
    cascade, cascade_gain, cascade_intercept, cascade_noise_figure, noise_floor, round2, sfdr,
    snr, CascadeResult, CascadeSummary, Simulation, StageTotals,
};
pub use error::{NetlistError, Result};
pub use file::{load_netlist, parse_netlist, validate_netlist, Netlist, SignalChain};
pub use node::SignalNode;
pub use signal::{Signal, Unit};

// returns final output signal node, handling compression point if present
pub fn cascade_vector_return_output(input: impl Into<Signal>, blocks: &mut [Block]) -> SignalNode {
    let mut cascading_signal = SignalNode::input(input);

    for block in blocks.iter_mut() {
        cascading_signal = cascading_signal.cascade_block(block);
    }
    cascading_signal
}

// returns the input node followed by every block's output node
pub fn cascade_vector_return_vector(
    input: impl Into<Signal>,
    blocks: &mut [Block],
) -> Vec<SignalNode> {
    let mut cascading_signal = SignalNode::input(input);
    let mut node_vector: Vec<SignalNode> = vec![cascading_signal.clone()];
    for block in blocks.iter_mut() {
        cascading_signal = cascading_signal.cascade_block(block);
        node_vector.push(cascading_signal.clone());
    }
    node_vector
}
