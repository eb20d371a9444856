//! End to end cascade checks on small hand-computed chains.

use rfbudget::{
    cascade, cascade_vector_return_output, cascade_vector_return_vector, noise_floor, Block,
    BlockConfig, BlockType, Signal, Simulation,
};

/// Helper: assert float equality within tolerance
fn assert_approx(actual: f64, expected: f64, tol: f64, msg: &str) {
    assert!(
        (actual - expected).abs() < tol,
        "{msg}: expected {expected:.4}, got {actual:.4} (diff {:.6})",
        (actual - expected).abs()
    );
}

fn stage(name: &str, gain: f64, nf: f64, p1db: f64, iip3: f64) -> Block {
    Block::new(
        BlockType::Generic,
        &BlockConfig {
            name: name.to_string(),
            gain: Some(gain),
            nf: Some(nf),
            p1db: Some(p1db),
            iip3: Some(iip3),
            ..Default::default()
        },
    )
}

fn lna_mixer() -> Vec<Block> {
    vec![
        stage("LNA", 15.0, 3.0, 10.0, 20.0),
        stage("Mixer", 10.0, 6.0, 12.0, 30.0),
    ]
}

#[test]
fn total_gain_is_sum_of_stage_gains() {
    let result = cascade(&lna_mixer(), &Simulation::default());
    assert_eq!(result.summary.unwrap().gain, 25.0);
    assert_eq!(result.stages[0].total_gain, 15.0);
    assert_eq!(result.stages[1].total_gain, 25.0);
}

#[test]
fn friis_noise_figure() {
    let result = cascade(&lna_mixer(), &Simulation::default());
    assert_approx(result.summary.unwrap().nf, 3.20, 0.005, "cascaded NF");
}

#[test]
fn cascaded_iip3() {
    let result = cascade(&lna_mixer(), &Simulation::default());
    assert_approx(result.summary.unwrap().iip3, 13.81, 0.005, "cascaded IIP3");
}

#[test]
fn cascaded_p1db() {
    let result = cascade(&lna_mixer(), &Simulation::default());
    assert_approx(result.summary.unwrap().p1db, -3.21, 0.005, "cascaded P1dB");
}

#[test]
fn single_stage_compression() {
    let mut blocks = vec![Block::new(
        BlockType::Amplifier,
        &BlockConfig {
            name: "Amp".to_string(),
            gain: Some(10.0),
            p1db: Some(10.0),
            ..Default::default()
        },
    )];

    let linear = cascade_vector_return_output(1.0, &mut blocks);
    assert_eq!(linear.power, Signal::dbm(11.0));
    assert!(!linear.is_compressed);
    assert!(!blocks[0].is_compressed);

    let hot = cascade_vector_return_output(20.0, &mut blocks);
    assert_eq!(hot.power, Signal::dbm(19.0));
    assert!(hot.is_compressed);
    assert!(blocks[0].is_compressed);
    assert_eq!(blocks[0].pout, Signal::dbm(19.0));
}

#[test]
fn thermal_noise_floor_reference() {
    assert_approx(noise_floor(0.0, 1.0, 290.0), -174.0, 0.05, "kTB at 290 K");
}

#[test]
fn stage_order_matters_for_noise_and_linearity() {
    let forward = cascade(&lna_mixer(), &Simulation::default()).summary.unwrap();
    let mut reversed_chain = lna_mixer();
    reversed_chain.reverse();
    let reversed = cascade(&reversed_chain, &Simulation::default()).summary.unwrap();

    assert_eq!(forward.gain, reversed.gain);
    // mixer first: 10log10(3.981 + 0.995 / 10)
    assert_approx(reversed.nf, 6.11, 0.005, "reversed NF");
    // 1 / (1/1 W + 10/0.1 W)
    assert_approx(reversed.iip3, 9.96, 0.005, "reversed IIP3");
    // 1 / (1/15.85 mW + 10/10 mW)
    assert_approx(reversed.p1db, -0.27, 0.005, "reversed P1dB");
    assert!(reversed.nf > forward.nf);
    assert!(reversed.iip3 < forward.iip3);
    assert!(reversed.p1db != forward.p1db);
}

#[test]
fn cascade_is_repeatable_and_leaves_chain_untouched() {
    let chain = lna_mixer();
    let sim = Simulation {
        pin_dbm: -60.0,
        bandwidth_hz: 1.0e6,
        ..Default::default()
    };
    let first = cascade(&chain, &sim);
    let second = cascade(&chain, &sim);
    assert_eq!(first, second);
    assert!(chain.iter().all(|block| !block.is_compressed));
}

#[test]
fn stimulus_walks_every_node() {
    let mut blocks = lna_mixer();
    let nodes = cascade_vector_return_vector(Signal::watts(1.0e-9), &mut blocks);

    assert_eq!(nodes.len(), 3);
    assert_approx(nodes[0].power.as_dbm(), -60.0, 1e-9, "input in dBm");
    assert_approx(nodes[1].power.as_dbm(), -45.0, 1e-9, "after LNA");
    assert_approx(nodes[2].power.as_dbm(), -35.0, 1e-9, "after mixer");
    assert_eq!(nodes[2].cumulative_gain, 25.0);
    assert_eq!(nodes[2].name, "Mixer Output");
}

#[test]
fn system_figures_for_receiver() {
    let sim = Simulation {
        pin_dbm: -60.0,
        bandwidth_hz: 1.0e6,
        noise_temperature_k: 290.0,
    };
    let summary = cascade(&lna_mixer(), &sim).summary.unwrap();

    assert_eq!(summary.pin, -60.0);
    assert_eq!(summary.pout, -35.0);
    assert_approx(summary.oip3, 38.81, 0.005, "OIP3");
    // -173.98 + 3.2 + 60
    assert_approx(summary.mds, -110.78, 0.01, "noise floor");
    assert_approx(summary.snr, 47.58, 0.01, "SNR");
    assert_approx(summary.sfdr, 83.06, 0.01, "SFDR");
}
