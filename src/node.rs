use std::fmt;

use crate::block::Block;
use crate::signal::{Signal, Unit};

/// Signal level at one point of the chain under a given stimulus.
#[derive(Clone, Debug, PartialEq)]
pub struct SignalNode {
    pub name: String,         // name of node, like "Input" or "LNA Output"
    pub power: Signal,        // dBm
    pub cumulative_gain: f64, // dB, actual gain from the input including compression
    pub is_compressed: bool,  // the block feeding this node is compressed
}

impl fmt::Display for SignalNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "SignalNode {{ name: {}, power: {}, cumulative_gain: {}, is_compressed: {} }}",
            self.name, self.power, self.cumulative_gain, self.is_compressed
        )
    }
}

impl SignalNode {
    /// The node at the input of the chain.
    pub fn input(power: impl Into<Signal>) -> SignalNode {
        SignalNode {
            name: "Input".to_string(),
            power: power.into().to_unit(Unit::Dbm),
            cumulative_gain: 0.0,
            is_compressed: false,
        }
    }

    /// Drive `block` with this node's level and return the node at its output.
    ///
    /// The block keeps the evaluated level and compression flag.
    pub fn cascade_block(&self, block: &mut Block) -> SignalNode {
        let output = block.evaluate_output(self.power);
        // an infinite level has no measurable gain, so count the nominal one
        let stage_gain = if output.magnitude.is_finite() && self.power.magnitude.is_finite() {
            output.magnitude - self.power.magnitude
        } else {
            block.gain()
        };

        SignalNode {
            name: block.name.clone() + " Output",
            power: output,
            cumulative_gain: self.cumulative_gain + stage_gain,
            is_compressed: block.is_compressed,
        }
    }
}
