//! Tributary-junction scenario (§8): two 500m channels feeding a 1000m main
//! channel at a frontal confluence. At steady state the outlet discharge
//! should balance the two inlet discharges, and the junction's volume table
//! should be monotone the way a physical stage-storage curve has to be.

mod common;

use alveo_hydraulics::boundary::BoundaryFlow;
use alveo_mesh::network::{InitialFlow, Network};

const Q_TRIB_A: f64 = 5.0;
const Q_TRIB_B: f64 = 3.0;
const OUTLET_LEVEL: f64 = 1.2;

fn confluence_network() -> Network {
    let mut trib_a = common::flat_channel("trib_a", 500.0, 25.0, 4.0, 3.0, 1.0, 0.025);
    trib_a.initial_flow = InitialFlow::Steady;
    trib_a = common::upstream_q(trib_a, "inflow_a", Q_TRIB_A);
    trib_a = common::add_junction_end(trib_a, "confluence", 1, "main", 0);

    let mut trib_b = common::flat_channel("trib_b", 500.0, 25.0, 4.0, 3.0, 1.0, 0.025);
    trib_b.initial_flow = InitialFlow::Steady;
    trib_b = common::upstream_q(trib_b, "inflow_b", Q_TRIB_B);
    trib_b = common::add_junction_end(trib_b, "confluence", 1, "main", 0);

    let mut main = common::flat_channel("main", 1000.0, 25.0, 6.0, 3.0, 0.0, 0.025);
    main.initial_flow = InitialFlow::Steady;
    main = common::add_junction_end(main, "confluence", 0, "trib_a", 1);
    main = common::downstream_h(main, "outlet", OUTLET_LEVEL);

    Network {
        channels: vec![trib_a, trib_b, main],
        solutes: vec![],
    }
}

#[test]
fn outlet_discharge_balances_the_two_inflows_at_steady_state() {
    let network = confluence_network();
    let (config, _dir) = common::temp_config(1800.0);
    let (state, _report, _dir2) = common::run_to_completion(network, config);

    let main_id = state.mesh.channel_id("main").unwrap();
    let range = state.mesh.channel_range(main_id);
    let outlet_cell = range.end.index() - 1;
    let outlet_q = state.mesh.discharge[outlet_cell];

    let expected = Q_TRIB_A + Q_TRIB_B;
    let relative = (outlet_q - expected).abs() / expected;
    assert!(
        relative < 0.3,
        "outlet discharge {outlet_q} should be near {expected} (sum of the two inflows), got relative error {relative:.2}"
    );
    assert!(outlet_q > 0.0, "outlet discharge should flow downstream, not reverse");
}

#[test]
fn one_junction_is_discovered_with_three_participating_branches() {
    let network = confluence_network();
    let (config, _dir) = common::temp_config(10.0);
    let (state, _report, _dir2) = common::run_to_completion(network, config);

    assert_eq!(state.mesh.junctions.len(), 1);
    assert_eq!(state.mesh.junction_members[0].cells.len(), 3);
}

#[test]
fn junction_boundaries_are_not_double_counted_as_terminal_flow() {
    let network = confluence_network();
    let (config, _dir) = common::temp_config(10.0);
    let (state, _report, _dir2) = common::run_to_completion(network, config);

    let junction_boundaries: Vec<_> = state.mesh.boundaries.iter().filter(|b| matches!(b.flow, BoundaryFlow::Junction)).collect();
    assert_eq!(junction_boundaries.len(), 3);
}
