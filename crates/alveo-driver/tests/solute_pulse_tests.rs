//! Solute pulse advection-diffusion scenario (§8): a tracer slug injected
//! into a steady uniform flow should translate downstream at roughly the
//! bulk velocity while spreading, and its total mass should stay bounded by
//! what the closed boundaries allow through (nothing here: both ends are
//! walls).

mod common;

use alveo_mesh::network::{InitialFlow, InitialTransport, Network};

const WIDTH: f64 = 2.0;
const DEPTH: f64 = 1.0;
const VELOCITY: f64 = 1.0;
const PULSE_CENTER: f64 = 200.0;
const PULSE_HALF_WIDTH: f64 = 25.0;
const DIFFUSIVITY: f64 = 5.0;

fn pulse_network() -> Network {
    let discharge = WIDTH * DEPTH * VELOCITY;
    let mut channel = common::flat_channel("reach", 5000.0, 25.0, WIDTH, DEPTH * 2.0, 0.0, 0.0001);
    channel.initial_flow = InitialFlow::Profile {
        x: vec![0.0, 5000.0],
        discharge: vec![discharge, discharge],
        depth: vec![DEPTH, DEPTH],
    };
    channel.initial_transport.push(InitialTransport::Profile {
        x: vec![0.0, PULSE_CENTER - PULSE_HALF_WIDTH, PULSE_CENTER, PULSE_CENTER + PULSE_HALF_WIDTH, 5000.0],
        concentration: vec![0.0, 0.0, 40.0, 0.0, 0.0],
    });
    Network {
        channels: vec![channel],
        solutes: vec![common::solute("tracer", 500.0, DIFFUSIVITY)],
    }
}

fn peak_position(state: &alveo_driver::SolverState) -> f64 {
    let conc = &state.mesh.concentration[0];
    let (idx, _) = conc.iter().enumerate().max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap()).unwrap();
    state.mesh.cell_x[idx]
}

#[test]
fn pulse_translates_downstream_at_roughly_the_bulk_velocity() {
    let network = pulse_network();
    let final_time = 500.0;
    let (config, _dir) = common::temp_config(final_time);
    let (state, _report, _dir2) = common::run_to_completion(network, config);

    let expected = PULSE_CENTER + VELOCITY * final_time;
    let actual = peak_position(&state);
    assert!(
        (actual - expected).abs() < 400.0,
        "pulse peak at {actual}m, expected near {expected}m after {final_time}s at {VELOCITY}m/s"
    );
    assert!(actual > PULSE_CENTER, "pulse should have moved downstream, not stayed put");
}

#[test]
fn total_solute_mass_stays_bounded_with_no_boundary_transport() {
    let network = pulse_network();
    let initial_mass = {
        let (config, _dir) = common::temp_config(1.0);
        let s = alveo_driver::SolverState::new(network.clone(), config, alveo_hydraulics::scheme::SchemeConfig::default()).unwrap();
        mass(&s)
    };

    let (config, _dir) = common::temp_config(500.0);
    let (state, _report, _dir2) = common::run_to_completion(network, config);
    let final_mass = mass(&state);

    let relative = (final_mass - initial_mass).abs() / initial_mass.max(1e-9);
    assert!(relative < 0.1, "solute mass drifted by {relative:.2} with no boundary transport");
}

fn mass(state: &alveo_driver::SolverState) -> f64 {
    let mesh = &state.mesh;
    (0..mesh.n_cells).map(|i| mesh.concentration[0][i] * mesh.volume[i] + mesh.bound_mass[0][i]).sum()
}
