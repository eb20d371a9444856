use std::default::Default;
use std::fmt;

use serde::Serialize;

use crate::block::{Block, BlockType};
use crate::constants::{BOLTZMANN, REFERENCE_TEMPERATURE};

/// Stimulus and noise settings for a cascade run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Simulation {
    pub pin_dbm: f64,             // dBm, input power
    pub bandwidth_hz: f64,        // Hz, signal bandwidth
    pub noise_temperature_k: f64, // Kelvin
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            pin_dbm: 0.0,
            bandwidth_hz: 1.0,
            noise_temperature_k: REFERENCE_TEMPERATURE,
        }
    }
}

impl fmt::Display for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Simulation {{ pin: {} dBm, bandwidth: {} Hz, noise_temperature: {} K }}",
            self.pin_dbm, self.bandwidth_hz, self.noise_temperature_k
        )
    }
}

/// Running totals of the chain up to and including one stage.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StageTotals {
    pub name: String,
    pub block_type: BlockType,
    pub gain: f64,        // dB, this stage only
    pub noise_figure: f64, // dB, this stage only
    pub iip3: f64,        // dBm, this stage only
    pub p1db: f64,        // dBm, this stage only
    pub total_gain: f64,  // dB
    pub total_nf: f64,    // dB
    pub total_iip3: f64,  // dBm
    pub total_p1db: f64,  // dBm
}

/// System level figures of merit for a whole chain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CascadeSummary {
    pub pin: f64,  // dBm
    pub pout: f64, // dBm
    pub gain: f64, // dB
    pub nf: f64,   // dB
    pub iip3: f64, // dBm
    pub oip3: f64, // dBm
    pub p1db: f64, // dBm
    pub snr: f64,  // dB
    pub sfdr: f64, // dB
    pub mds: f64,  // dBm, noise floor
}

impl CascadeSummary {
    /// Key/value pairs, sorted by key.
    pub fn entries(&self) -> [(&'static str, f64); 10] {
        [
            ("gain", self.gain),
            ("iip3", self.iip3),
            ("mds", self.mds),
            ("nf", self.nf),
            ("oip3", self.oip3),
            ("p1db", self.p1db),
            ("pin", self.pin),
            ("pout", self.pout),
            ("sfdr", self.sfdr),
            ("snr", self.snr),
        ]
    }
}

/// Output of [`cascade`]. Empty when the chain was empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CascadeResult {
    pub stages: Vec<StageTotals>,
    pub summary: Option<CascadeSummary>,
}

impl CascadeResult {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Thermal noise floor in dBm for a receiver with noise figure `nf` (dB).
pub fn noise_floor(nf: f64, bandwidth_hz: f64, noise_temperature_k: f64) -> f64 {
    10.0 * (BOLTZMANN * noise_temperature_k * 1000.0).log10() + nf + 10.0 * bandwidth_hz.log10()
}

pub fn snr(pin: f64, mds: f64, nf: f64) -> f64 {
    pin - mds - nf
}

pub fn sfdr(iip3: f64, mds: f64) -> f64 {
    2.0 / 3.0 * (iip3 - mds)
}

/// Cumulative gain after each stage, in dB.
pub fn cascade_gain(gains: &[f64]) -> Vec<f64> {
    gains
        .iter()
        .scan(0.0, |total, gain| {
            *total += gain;
            Some(*total)
        })
        .collect()
}

/// Friis cascade of linear noise factors.
///
/// `preceding_gain[i]` is the cumulative gain in dB of every stage before `i`.
/// Returns the cascaded noise figure in dB after each stage, rounded to 2 decimals.
pub fn cascade_noise_figure(noise_factors: &[f64], preceding_gain: &[f64]) -> Vec<f64> {
    let mut running = 0.0;
    noise_factors
        .iter()
        .zip(preceding_gain)
        .enumerate()
        .map(|(i, (factor, gain_before))| {
            if i == 0 {
                running = *factor;
            } else {
                running += (factor - 1.0) / rfconversions::power::db_to_linear(*gain_before);
            }
            round2(10.0 * running.log10())
        })
        .collect()
}

/// Cascade of intercept-like points (IIP3, P1dB) given in Watts.
///
/// Each stage's reciprocal is scaled by the gain already ahead of it, so a
/// late stage with a modest intercept can dominate a high-gain chain.
/// Returns the cascaded value in dBm after each stage, rounded to 2 decimals,
/// or +inf while the reciprocal sum is still zero.
pub fn cascade_intercept(values_w: &[f64], preceding_gain: &[f64]) -> Vec<f64> {
    let mut running = 0.0;
    values_w
        .iter()
        .zip(preceding_gain)
        .map(|(value, gain_before)| {
            running += 1.0 / value * rfconversions::power::db_to_linear(*gain_before);
            if running == 0.0 {
                f64::INFINITY
            } else {
                round2(10.0 * (1.0 / running).log10() + 30.0)
            }
        })
        .collect()
}

/// Run the cascade analysis of `chain`, in order, for the stimulus in `sim`.
///
/// The blocks are only read; every figure lands in the returned result.
pub fn cascade(chain: &[Block], sim: &Simulation) -> CascadeResult {
    if chain.is_empty() {
        return CascadeResult::default();
    }

    let gains: Vec<f64> = chain.iter().map(Block::gain).collect();
    let total_gain = cascade_gain(&gains);
    let preceding_gain: Vec<f64> = total_gain
        .iter()
        .zip(&gains)
        .map(|(total, gain)| total - gain)
        .collect();

    let noise_factors: Vec<f64> = chain.iter().map(Block::noise_factor).collect();
    let iip3_w: Vec<f64> = chain.iter().map(|block| block.input_ip3.as_w()).collect();
    let p1db_w: Vec<f64> = chain.iter().map(|block| block.output_p1db.as_w()).collect();

    let total_nf = cascade_noise_figure(&noise_factors, &preceding_gain);
    let total_iip3 = cascade_intercept(&iip3_w, &preceding_gain);
    let total_p1db = cascade_intercept(&p1db_w, &preceding_gain);

    let stages: Vec<StageTotals> = chain
        .iter()
        .enumerate()
        .map(|(i, block)| {
            let stage = StageTotals {
                name: block.name.clone(),
                block_type: block.block_type,
                gain: gains[i],
                noise_figure: block.noise_figure_db,
                iip3: block.input_ip3.as_dbm(),
                p1db: block.output_p1db.as_dbm(),
                total_gain: total_gain[i],
                total_nf: total_nf[i],
                total_iip3: total_iip3[i],
                total_p1db: total_p1db[i],
            };
            tracing::debug!(
                stage = i,
                name = %stage.name,
                total_gain = stage.total_gain,
                total_nf = stage.total_nf,
                total_iip3 = stage.total_iip3,
                total_p1db = stage.total_p1db,
                "cascaded stage"
            );
            stage
        })
        .collect();

    let last = &stages[stages.len() - 1];
    let gain = round2(last.total_gain);
    let nf = last.total_nf;
    let iip3 = last.total_iip3;
    let mds = noise_floor(nf, sim.bandwidth_hz, sim.noise_temperature_k);

    let summary = CascadeSummary {
        pin: sim.pin_dbm,
        pout: round2(sim.pin_dbm + gain),
        gain,
        nf,
        iip3,
        oip3: round2(iip3 + gain),
        p1db: last.total_p1db,
        snr: round2(snr(sim.pin_dbm, mds, nf)),
        sfdr: round2(sfdr(iip3, mds)),
        mds: round2(mds),
    };
    tracing::info!(stages = stages.len(), ?summary, "cascade complete");

    CascadeResult {
        stages,
        summary: Some(summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockConfig;

    fn stage(gain: f64, nf: f64, p1db: f64, iip3: f64) -> Block {
        Block::new(
            BlockType::Generic,
            &BlockConfig {
                gain: Some(gain),
                nf: Some(nf),
                p1db: Some(p1db),
                iip3: Some(iip3),
                ..Default::default()
            },
        )
    }

    fn two_stage() -> Vec<Block> {
        vec![stage(15.0, 3.0, 10.0, 20.0), stage(10.0, 6.0, 12.0, 30.0)]
    }

    #[test]
    fn empty_chain() {
        let result = cascade(&[], &Simulation::default());
        assert!(result.is_empty());
        assert!(result.summary.is_none());
    }

    #[test]
    fn gain_is_running_sum() {
        assert_eq!(cascade_gain(&[15.0, 10.0]), vec![15.0, 25.0]);
        assert!(cascade_gain(&[]).is_empty());
    }

    #[test]
    fn friis_two_stage() {
        let factors = [10.0_f64.powf(0.3), 10.0_f64.powf(0.6)];
        assert_eq!(cascade_noise_figure(&factors, &[0.0, 15.0]), vec![3.0, 3.2]);
    }

    #[test]
    fn intercept_two_stage() {
        let iip3 = [10.0_f64.powf(-1.0), 1.0];
        assert_eq!(cascade_intercept(&iip3, &[0.0, 15.0]), vec![20.0, 13.81]);

        let p1db = [10.0_f64.powf(-2.0), 10.0_f64.powf(-1.8)];
        assert_eq!(cascade_intercept(&p1db, &[0.0, 15.0]), vec![10.0, -3.21]);
    }

    #[test]
    fn intercept_unbounded_is_infinite() {
        let result = cascade_intercept(&[f64::INFINITY, f64::INFINITY], &[0.0, 10.0]);
        assert_eq!(result, vec![f64::INFINITY, f64::INFINITY]);
    }

    #[test]
    fn full_cascade() {
        let sim = Simulation {
            pin_dbm: -60.0,
            ..Default::default()
        };
        let result = cascade(&two_stage(), &sim);
        let summary = result.summary.unwrap();

        assert_eq!(summary.gain, 25.0);
        assert_eq!(summary.pout, -35.0);
        assert_eq!(summary.nf, 3.2);
        assert_eq!(summary.iip3, 13.81);
        assert_eq!(summary.oip3, 38.81);
        assert_eq!(summary.p1db, -3.21);
        assert!((summary.mds - -170.78).abs() < 0.011);
        assert!((summary.snr - 107.58).abs() < 0.011);
        assert!((summary.sfdr - 123.06).abs() < 0.011);

        assert_eq!(result.stages[0].total_gain, 15.0);
        assert_eq!(result.stages[0].total_nf, 3.0);
        assert_eq!(result.stages[0].total_iip3, 20.0);
        assert_eq!(result.stages[0].total_p1db, 10.0);
        assert_eq!(result.stages[1].total_gain, 25.0);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let chain = two_stage();
        let sim = Simulation::default();
        assert_eq!(cascade(&chain, &sim), cascade(&chain, &sim));
    }

    #[test]
    fn thermal_noise_floor() {
        let floor = noise_floor(0.0, 1.0, 290.0);
        assert!((floor - -174.0).abs() < 0.05, "got {floor}");
        // 1 MHz raises the floor by 60 dB
        assert!((noise_floor(0.0, 1.0e6, 290.0) - floor - 60.0).abs() < 1e-9);
    }

    #[test]
    fn snr_and_sfdr() {
        assert_eq!(snr(-60.0, -170.0, 3.0), 107.0);
        assert!((sfdr(10.0, -170.0) - 120.0).abs() < 1e-9);
    }
}
