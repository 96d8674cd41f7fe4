//! Integration tests for alveo-mesh: network (de)serialisation and
//! multi-channel mesh assembly through the public API only.

use alveo_hydraulics::boundary::BoundaryFlow;
use alveo_hydraulics::section::{FrictionLaw, GeometryConfig, SectionPoint, TransientSection};

use alveo_mesh::{ChannelSpec, DiscretizationMode, InitialFlow, Network, StationSpec};

fn rect_ts(width: f64, depth: f64) -> TransientSection {
    TransientSection {
        time: 0.0,
        points: vec![
            SectionPoint::new(0.0, depth, 0.03, FrictionLaw::Pressure),
            SectionPoint::new(1e-6, 0.0, 0.03, FrictionLaw::Pressure),
            SectionPoint::new(width - 1e-6, 0.0, 0.03, FrictionLaw::Pressure),
            SectionPoint::new(width, depth, 0.03, FrictionLaw::Pressure),
        ],
        hmax: depth,
        contraction: 0.1,
        dz: depth / 10.0,
    }
}

fn simple_channel(id: &str, length: f64) -> ChannelSpec {
    ChannelSpec {
        id: id.to_string(),
        stations: vec![
            StationSpec::new(0.0, rect_ts(6.0, 3.0)),
            StationSpec::new(length, rect_ts(6.0, 3.0)),
        ],
        cell_size: 50.0,
        mode: DiscretizationMode::Uniform,
        initial_flow: InitialFlow::Dry,
        initial_transport: vec![],
        boundaries: vec![],
    }
}

#[test]
fn network_round_trips_through_json() {
    let network = Network {
        channels: vec![simple_channel("reach1", 400.0)],
        solutes: vec![],
    };
    let json = serde_json::to_string(&network).expect("serialises");
    let back: Network = serde_json::from_str(&json).expect("deserialises");
    assert_eq!(back.channels.len(), 1);
    assert_eq!(back.channel("reach1").unwrap().stations.len(), 2);
}

#[test]
fn two_independent_channels_get_disjoint_cell_ranges() {
    let network = Network {
        channels: vec![simple_channel("a", 400.0), simple_channel("b", 600.0)],
        solutes: vec![],
    };
    let mesh = alveo_mesh::Mesh::build(&network, 0.0, &GeometryConfig::default(), 1e-4).unwrap();
    let ra = mesh.channel_range(mesh.channel_id("a").unwrap());
    let rb = mesh.channel_range(mesh.channel_id("b").unwrap());
    assert_eq!(ra.end, rb.start, "second channel's cells start right after the first's");
    assert_eq!(rb.end.index(), mesh.n_cells);
}

#[test]
fn boundary_without_a_junction_peer_is_not_grouped() {
    let mut channel = simple_channel("a", 400.0);
    channel.boundaries.push(alveo_mesh::BoundarySpec {
        id: "inlet".into(),
        pos: 0,
        pos2: 0,
        flow: BoundaryFlow::Q { discharge: 5.0 },
        transport: vec![],
        junction_peer: None,
    });
    let network = Network {
        channels: vec![channel],
        solutes: vec![],
    };
    let mesh = alveo_mesh::Mesh::build(&network, 0.0, &GeometryConfig::default(), 1e-4).unwrap();
    assert_eq!(mesh.boundaries.len(), 1);
    assert!(mesh.boundaries[0].junction.is_none());
    assert!(mesh.junctions.is_empty());
}
