/// Boltzmann constant in J/K, as used for noise floor budgets.
pub const BOLTZMANN: f64 = 1.38e-23;

/// Reference temperature for noise calculations, in Kelvin.
pub const REFERENCE_TEMPERATURE: f64 = 290.0;

/// Reference impedance for voltage/current to power conversions, in ohms.
pub const REFERENCE_IMPEDANCE: f64 = 50.0;

/// Typical separation between OIP3 and output P1dB of a single compressive stage, in dB.
pub const P1DB_TO_OIP3_DB: f64 = 9.6;

/// Input backoff from P1dB at which a stage is treated as compressed, in dB.
pub const COMPRESSION_KNEE_DB: f64 = 1.0;
