use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::constants::{COMPRESSION_KNEE_DB, P1DB_TO_OIP3_DB};
use crate::signal::{Signal, Unit};

/// A configuration key a block understands, with its description and unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub key: &'static str,
    pub description: &'static str,
    pub unit: &'static str,
}

const fn attr(key: &'static str, description: &'static str, unit: &'static str) -> Attribute {
    Attribute {
        key,
        description,
        unit,
    }
}

pub const ATTR_NAME: Attribute = attr("name", "Name of block (for example, a part name)", "");
pub const ATTR_POWER: Attribute = attr("power", "Power consumption of the block", "W");
pub const ATTR_GAIN: Attribute = attr("gain", "Gain of the block", "dB");
pub const ATTR_NF: Attribute = attr("nf", "Noise figure of the block", "dB");
pub const ATTR_P1DB: Attribute = attr("p1db", "Output 1dB compression point", "dBm");
pub const ATTR_OIP3: Attribute = attr("oip3", "Output 3rd-order intercept", "dBm");
pub const ATTR_IIP3: Attribute = attr("iip3", "Input 3rd-order intercept", "dBm");
pub const ATTR_F3DB: Attribute = attr(
    "f3db",
    "Dominant pole frequency of the block (3dB roll-off)",
    "MHz",
);
pub const ATTR_FBW: Attribute = attr("fbw", "Cutoff frequency of the block", "MHz");
pub const ATTR_CONTROL: Attribute = attr("control", "Control voltage", "V");
pub const ATTR_GAIN_MAX: Attribute = attr("gain_max", "Maximum block gain", "dB");
pub const ATTR_GAIN_MIN: Attribute = attr("gain_min", "Minimum block gain", "dB");
pub const ATTR_GAIN_STEP: Attribute = attr("gain_step", "Gain control step/LSB", "dB");
pub const ATTR_LAW: Attribute = attr("law", "Detector law", "log/square/rms");
pub const ATTR_MDS: Attribute = attr("mds", "Minimum detectable signal", "dBm");
pub const ATTR_SMAX: Attribute = attr("smax", "Maximum input signal", "dBm");

const BASE_ATTRIBUTES: [Attribute; 7] = [
    ATTR_NAME, ATTR_POWER, ATTR_GAIN, ATTR_NF, ATTR_P1DB, ATTR_OIP3, ATTR_IIP3,
];

const AMPLIFIER_ATTRIBUTES: [Attribute; 9] = [
    ATTR_F3DB, ATTR_FBW, ATTR_NAME, ATTR_POWER, ATTR_GAIN, ATTR_NF, ATTR_P1DB, ATTR_OIP3,
    ATTR_IIP3,
];

const VGA_ATTRIBUTES: [Attribute; 13] = [
    ATTR_CONTROL,
    ATTR_GAIN_MAX,
    ATTR_GAIN_MIN,
    ATTR_GAIN_STEP,
    ATTR_F3DB,
    ATTR_FBW,
    ATTR_NAME,
    ATTR_POWER,
    ATTR_GAIN,
    ATTR_NF,
    ATTR_P1DB,
    ATTR_OIP3,
    ATTR_IIP3,
];

const DETECTOR_ATTRIBUTES: [Attribute; 12] = [
    ATTR_LAW, ATTR_MDS, ATTR_SMAX, ATTR_F3DB, ATTR_FBW, ATTR_NAME, ATTR_POWER, ATTR_GAIN,
    ATTR_NF, ATTR_P1DB, ATTR_OIP3, ATTR_IIP3,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterResponse {
    LowPass,
    HighPass,
    BandPass,
}

/// The closed set of block variants a signal chain can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockType {
    Generic,
    Passive,
    Amplifier,
    Lna,
    PowerAmp,
    Vga,
    Detector,
    Filter(FilterResponse),
    Mixer,
}

/// Netlist type names and the block variant each one builds.
pub const BLOCK_TYPE_NAMES: [(&str, BlockType); 20] = [
    ("generic", BlockType::Generic),
    ("passive", BlockType::Passive),
    ("amplifier", BlockType::Amplifier),
    ("amp", BlockType::Amplifier),
    ("lna", BlockType::Lna),
    ("poweramp", BlockType::PowerAmp),
    ("pa", BlockType::PowerAmp),
    ("power_amp", BlockType::PowerAmp),
    ("detector", BlockType::Detector),
    ("lpf", BlockType::Filter(FilterResponse::LowPass)),
    ("lowpass", BlockType::Filter(FilterResponse::LowPass)),
    ("bpf", BlockType::Filter(FilterResponse::BandPass)),
    ("bandpass", BlockType::Filter(FilterResponse::BandPass)),
    ("hpf", BlockType::Filter(FilterResponse::HighPass)),
    ("highpass", BlockType::Filter(FilterResponse::HighPass)),
    ("mixer", BlockType::Mixer),
    ("demod", BlockType::Mixer),
    ("demodulator", BlockType::Mixer),
    ("modulator", BlockType::Mixer),
    ("vga", BlockType::Vga),
];

impl BlockType {
    /// Look up a netlist type name, ignoring case.
    pub fn from_name(name: &str) -> Option<BlockType> {
        let name = name.to_lowercase();
        BLOCK_TYPE_NAMES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, block_type)| *block_type)
    }

    pub fn label(&self) -> &'static str {
        match self {
            BlockType::Generic => "Generic",
            BlockType::Passive => "Passive",
            BlockType::Amplifier => "Amplifier",
            BlockType::Lna => "LNA",
            BlockType::PowerAmp => "Power Amplifier",
            BlockType::Vga => "VGA",
            BlockType::Detector => "Detector",
            BlockType::Filter(FilterResponse::LowPass) => "Low-pass Filter",
            BlockType::Filter(FilterResponse::HighPass) => "High-pass Filter",
            BlockType::Filter(FilterResponse::BandPass) => "Band-pass Filter",
            BlockType::Mixer => "Mixer",
        }
    }

    /// Configuration keys this variant understands.
    pub fn supported(&self) -> &'static [Attribute] {
        match self {
            BlockType::Amplifier | BlockType::Lna | BlockType::PowerAmp => &AMPLIFIER_ATTRIBUTES,
            BlockType::Vga => &VGA_ATTRIBUTES,
            BlockType::Detector => &DETECTOR_ATTRIBUTES,
            BlockType::Generic | BlockType::Passive | BlockType::Filter(_) | BlockType::Mixer => {
                &BASE_ATTRIBUTES
            }
        }
    }

    fn is_amplifier(&self) -> bool {
        matches!(
            self,
            BlockType::Amplifier
                | BlockType::Lna
                | BlockType::PowerAmp
                | BlockType::Vga
                | BlockType::Detector
        )
    }
}

// serialized by label, e.g. "Band-pass Filter"
impl Serialize for BlockType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw block settings, as read from a netlist entry.
///
/// Every field is optional; unknown keys are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    pub name: String,
    pub power: Option<f64>,     // W
    pub gain: Option<f64>,      // dB
    pub nf: Option<f64>,        // dB
    pub p1db: Option<f64>,      // dBm, output referred
    pub oip3: Option<f64>,      // dBm
    pub iip3: Option<f64>,      // dBm
    pub f3db: Option<f64>,      // MHz
    pub fbw: Option<f64>,       // MHz
    pub gain_min: Option<f64>,  // dB
    pub gain_max: Option<f64>,  // dB
    pub gain_step: Option<f64>, // dB per control unit
    pub control: Option<f64>,
    pub law: Option<String>,
    pub mds: Option<f64>,  // unit follows law
    pub smax: Option<f64>, // unit follows law
}

/// Bandwidth figures carried by the amplifier family. Informational only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmplifierBandwidth {
    pub f3db_mhz: f64,
    pub fbw_mhz: f64,
}

/// Gain setting of a variable-gain amplifier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GainControl {
    pub gain_min: f64,
    pub gain_max: f64,
    pub gain_step: f64,
    pub control: f64,
}

impl GainControl {
    /// `control * gain_step + gain_min`, limited to `[gain_min, gain_max]`.
    ///
    /// The upper limit is applied first, so an inverted range yields `gain_min`.
    pub fn gain_db(&self) -> f64 {
        (self.control * self.gain_step + self.gain_min)
            .min(self.gain_max)
            .max(self.gain_min)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DetectorLaw {
    #[default]
    Log,
    Square,
    Rms,
}

impl DetectorLaw {
    /// Parse a law name, falling back to `Log` when it is not recognized.
    pub fn from_name(name: &str) -> DetectorLaw {
        match name.to_lowercase().as_str() {
            "log" => DetectorLaw::Log,
            "square" => DetectorLaw::Square,
            "rms" => DetectorLaw::Rms,
            other => {
                tracing::warn!(law = other, "unrecognized detector law, falling back to log");
                DetectorLaw::Log
            }
        }
    }

    /// Unit in which the detector's range bounds are expressed.
    pub fn unit(&self) -> Unit {
        match self {
            DetectorLaw::Log => Unit::Dbm,
            DetectorLaw::Square => Unit::Watt,
            DetectorLaw::Rms => Unit::Volt,
        }
    }
}

/// Dynamic range of a detector, stored as raw magnitudes in the law's unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorRange {
    pub law: DetectorLaw,
    pub mds: f64,
    pub smax: f64,
}

impl DetectorRange {
    pub fn mds(&self) -> Signal {
        Signal::new(self.mds, self.law.unit())
    }

    pub fn smax(&self) -> Signal {
        Signal::new(self.smax, self.law.unit())
    }
}

// Fill in whichever of P1dB, OIP3 and IIP3 were left out, returned in that order.
// Anything that cannot be derived stays at +inf (no limit).
fn complete_nonlinearities(
    gain: f64,
    p1db: Option<f64>,
    oip3: Option<f64>,
    iip3: Option<f64>,
) -> (f64, f64, f64) {
    let unset = |v: Option<f64>| v.filter(|v| *v != f64::INFINITY);
    let (mut p1db, mut oip3, mut iip3) = (unset(p1db), unset(oip3), unset(iip3));

    if p1db.is_none() && oip3.is_none() {
        oip3 = iip3.map(|iip3| iip3 + gain);
    }
    if oip3.is_none() && iip3.is_none() {
        oip3 = p1db.map(|p1db| p1db + P1DB_TO_OIP3_DB);
    }
    if iip3.is_none() {
        iip3 = oip3.map(|oip3| oip3 - gain);
    }
    if p1db.is_none() {
        p1db = oip3.map(|oip3| oip3 - P1DB_TO_OIP3_DB);
    }
    if oip3.is_none() {
        oip3 = iip3.map(|iip3| iip3 + gain);
    }

    (
        p1db.unwrap_or(f64::INFINITY),
        oip3.unwrap_or(f64::INFINITY),
        iip3.unwrap_or(f64::INFINITY),
    )
}

/// One stage of a signal chain.
#[derive(Clone, Debug)]
pub struct Block {
    pub name: String,
    pub block_type: BlockType,
    pub power: Signal, // W, consumption
    /// Nominal gain in dB as configured. For a VGA this is the gain at
    /// construction and is not updated by [`Block::set_control`]; read
    /// [`Block::gain`] for the gain in effect.
    pub gain_db: f64,
    pub noise_figure_db: f64, // nf would be ambiguous between noise factor and noise figure
    pub output_p1db: Signal, // dBm
    pub output_ip3: Signal,  // dBm
    pub input_ip3: Signal,   // dBm
    pub bandwidth: Option<AmplifierBandwidth>,
    pub gain_control: Option<GainControl>,
    pub detector: Option<DetectorRange>,
    // state of the last evaluate_output call
    pub is_compressed: bool,
    pub pout: Signal,
}

impl Default for Block {
    fn default() -> Self {
        Block::new(BlockType::Generic, &BlockConfig::default())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {{ name: {}, gain: {}, nf: {}, p1db: {}, oip3: {}, iip3: {} }}",
            self.block_type,
            self.name,
            self.gain(),
            self.noise_figure_db,
            self.output_p1db,
            self.output_ip3,
            self.input_ip3
        )
    }
}

impl Block {
    pub fn new(block_type: BlockType, config: &BlockConfig) -> Block {
        let bandwidth = block_type.is_amplifier().then(|| AmplifierBandwidth {
            f3db_mhz: config.f3db.unwrap_or(f64::INFINITY),
            fbw_mhz: config.fbw.unwrap_or(f64::INFINITY),
        });

        let gain_control = (block_type == BlockType::Vga).then(|| GainControl {
            gain_min: config.gain_min.unwrap_or(0.0),
            gain_max: config.gain_max.unwrap_or(1.0),
            gain_step: config.gain_step.unwrap_or(1.0),
            control: config.control.unwrap_or(1.0),
        });

        let detector = (block_type == BlockType::Detector).then(|| DetectorRange {
            law: config
                .law
                .as_deref()
                .map(DetectorLaw::from_name)
                .unwrap_or_default(),
            mds: config.mds.unwrap_or(0.0),
            smax: config.smax.unwrap_or(1.0),
        });

        let gain_db = match &gain_control {
            Some(control) => control.gain_db(),
            None => config.gain.unwrap_or(0.0),
        };
        let noise_figure_db = config.nf.unwrap_or(-gain_db);

        let (p1db, oip3, iip3) =
            complete_nonlinearities(gain_db, config.p1db, config.oip3, config.iip3);

        Block {
            name: config.name.clone(),
            block_type,
            power: Signal::watts(config.power.unwrap_or(0.0)),
            gain_db,
            noise_figure_db,
            output_p1db: Signal::dbm(p1db),
            output_ip3: Signal::dbm(oip3),
            input_ip3: Signal::dbm(iip3),
            bandwidth,
            gain_control,
            detector,
            is_compressed: false,
            pout: Signal::dbm(0.0),
        }
    }

    /// Small-signal gain in dB; recomputed from the control setting for a VGA.
    pub fn gain(&self) -> f64 {
        match &self.gain_control {
            Some(control) => control.gain_db(),
            None => self.gain_db,
        }
    }

    /// Change the control input of a VGA. Other blocks ignore it.
    pub fn set_control(&mut self, control: f64) {
        if let Some(gain_control) = self.gain_control.as_mut() {
            gain_control.control = control;
        }
    }

    pub fn supported_keys(&self) -> &'static [Attribute] {
        self.block_type.supported()
    }

    pub fn noise_factor(&self) -> f64 {
        rfconversions::noise::noise_factor_from_noise_figure(self.noise_figure_db)
    }

    /// Output level and compression state for `input`, without touching `self`.
    ///
    /// The stage compresses once the input reaches `p1db - 1 dB`; the output is
    /// then held at `gain + p1db - 1 dB`. A detector additionally limits the
    /// result to `[mds + gain, smax + gain]`.
    pub fn output_for(&self, input: impl Into<Signal>) -> (Signal, bool) {
        let input_dbm = input.into().as_dbm();
        let gain = self.gain();
        let p1db = self.output_p1db.as_dbm();

        let (mut output_dbm, is_compressed) = if input_dbm >= p1db - COMPRESSION_KNEE_DB {
            (gain + p1db - COMPRESSION_KNEE_DB, true)
        } else {
            (input_dbm + gain, false)
        };

        if let Some(detector) = &self.detector {
            output_dbm = output_dbm
                .max(detector.mds().as_dbm() + gain)
                .min(detector.smax().as_dbm() + gain);
        }

        (Signal::dbm(output_dbm), is_compressed)
    }

    /// Evaluate the block for `input` and remember the result in `pout` and
    /// `is_compressed`.
    pub fn evaluate_output(&mut self, input: impl Into<Signal>) -> Signal {
        let (pout, is_compressed) = self.output_for(input);
        self.pout = pout;
        self.is_compressed = is_compressed;
        pout
    }
}
