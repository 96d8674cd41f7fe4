//! Conservation and stability invariants (§8): volume and solute mass are
//! neither created nor destroyed by internal redistribution, every cell
//! stays non-negative, and the explicit step never exceeds its own CFL
//! bound.

mod common;

use alveo_core::CellId;
use alveo_hydraulics::scheme::SchemeConfig;
use alveo_mesh::network::{InitialFlow, InitialTransport, Network};

/// A closed channel (no boundaries at either end) with a non-uniform
/// initial profile so cells actually exchange volume internally.
fn closed_bump_network() -> Network {
    let mut channel = common::flat_channel("c1", 1000.0, 20.0, 5.0, 3.0, 0.0, 0.03);
    channel.initial_flow = InitialFlow::Profile {
        x: vec![0.0, 400.0, 500.0, 600.0, 1000.0],
        discharge: vec![0.0, 0.0, 0.0, 0.0, 0.0],
        depth: vec![1.0, 1.0, 1.8, 1.0, 1.0],
    };
    Network {
        channels: vec![channel],
        solutes: vec![],
    }
}

#[test]
fn volume_is_conserved_with_no_boundary_flux() {
    let network = closed_bump_network();
    let (config, _dir) = common::temp_config(120.0);
    let initial_volume: f64 = {
        let s = alveo_driver::SolverState::new(network.clone(), config.clone(), SchemeConfig::default()).unwrap();
        s.mesh.volume.iter().sum()
    };

    let (state, _report, _dir2) = common::run_to_completion(network, config);
    let final_volume: f64 = state.mesh.volume.iter().sum();

    let relative = (final_volume - initial_volume).abs() / initial_volume.max(1e-9);
    assert!(
        relative < 1e-3,
        "volume drifted by {relative:.2e} with no boundary flux (before {initial_volume}, after {final_volume})"
    );
}

#[test]
fn solute_mass_is_conserved_with_no_boundary_transport() {
    let mut network = closed_bump_network();
    network.solutes.push(common::solute("tracer", 1000.0, 0.05));
    network.channels[0].initial_transport.push(InitialTransport::Profile {
        x: vec![0.0, 490.0, 500.0, 510.0, 1000.0],
        concentration: vec![0.0, 0.0, 50.0, 0.0, 0.0],
    });

    let (config, _dir) = common::temp_config(60.0);
    let initial_mass = {
        let s = alveo_driver::SolverState::new(network.clone(), config.clone(), SchemeConfig::default()).unwrap();
        total_mass(&s)
    };

    let (state, _report, _dir2) = common::run_to_completion(network, config);
    let final_mass = total_mass(&state);

    let relative = (final_mass - initial_mass).abs() / initial_mass.max(1e-9);
    assert!(
        relative < 5e-2,
        "solute mass drifted by {relative:.2e} with no boundary transport (before {initial_mass}, after {final_mass})"
    );
}

fn total_mass(state: &alveo_driver::SolverState) -> f64 {
    let mesh = &state.mesh;
    let mut mass = 0.0;
    for s in 0..mesh.concentration.len() {
        for i in 0..mesh.n_cells {
            mass += mesh.concentration[s][i] * mesh.volume[i] + mesh.bound_mass[s][i];
        }
    }
    mass
}

#[test]
fn volumes_and_concentrations_stay_non_negative() {
    let mut network = closed_bump_network();
    network.solutes.push(common::solute("tracer", 1000.0, 0.05));
    network.channels[0].initial_transport.push(InitialTransport::Profile {
        x: vec![0.0, 1000.0],
        concentration: vec![10.0, 10.0],
    });
    let (config, _dir) = common::temp_config(200.0);
    let (state, _report, _dir2) = common::run_to_completion(network, config);

    for i in 0..state.mesh.n_cells {
        assert!(state.mesh.volume[i] >= 0.0, "cell {i} went negative: {}", state.mesh.volume[i]);
        assert!(state.mesh.area(CellId::from(i)).is_finite());
        for s in 0..state.mesh.concentration.len() {
            assert!(state.mesh.concentration[s][i] >= 0.0);
            assert!(state.mesh.concentration[s][i].is_finite());
        }
    }
}

#[test]
fn time_step_never_exceeds_its_own_cfl_bound() {
    let network = closed_bump_network();
    let (config, _dir) = common::temp_config(50.0);
    let cfl = config.cfl;
    let (state, _report, _dir2) = common::run_to_completion(network, config);

    for i in 0..state.mesh.n_cells {
        let bound = state.parameters()[i].cfl_time_step(state.mesh.dx[i], cfl);
        assert!(
            state.dt <= bound + 1e-9,
            "final dt {} exceeded cell {i}'s own CFL bound {bound}",
            state.dt
        );
    }
}
