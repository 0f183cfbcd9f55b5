//! Properties every routing run must satisfy.

use lvplan_algo::{cluster_grid, dijkstra_connection, spider, steiner, RoutingContext, Topology};
use lvplan_core::{
    connected_components, cost_matrix, distance_matrix, Dims, Point, PointId, PointSet, INFEASIBLE,
};

/// `n` x `n` mesh of populated points, IDs row by row from 1.
fn mesh(n: u64, spacing: f64) -> PointSet {
    let mut points = Vec::new();
    for i in 0..n {
        for j in 0..n {
            points.push(
                Point::new(i * n + j + 1, j as f64 * spacing, i as f64 * spacing)
                    .with_population(1.0),
            );
        }
    }
    points.into_iter().collect()
}

fn row(count: u64, spacing: f64) -> PointSet {
    (0..count)
        .map(|i| Point::new(i + 1, i as f64 * spacing, 0.0).with_population(1.0))
        .collect()
}

#[test]
fn three_by_three_mesh_is_a_spanning_tree() {
    let grid = mesh(3, 1000.0);
    let ctx = RoutingContext::new(&grid, 1000.0, 1.0);

    let route = steiner(&ctx, &grid, &[]).unwrap();
    assert_eq!(route.network.len(), 8);
    assert_eq!(route.summary.length, 8000);
    assert_eq!(route.summary.cost, 8);

    let (_, flat) = cluster_grid(&ctx, &grid, grid.len()).unwrap();
    assert_eq!(flat.network.len(), 8);
    assert_eq!(flat.summary.length, 8000);
}

#[test]
fn sub_unit_edge_costs_keep_every_line() {
    // every mesh edge costs 0.9
    let grid = mesh(3, 900.0);
    let ctx = RoutingContext::new(&grid, 1000.0, 1.0);

    for route in [
        steiner(&ctx, &grid, &[]).unwrap(),
        spider(&ctx, &grid, &[]).unwrap(),
    ] {
        assert_eq!(route.network.len(), 8);
        assert_eq!(route.summary.length, 7200);
        assert_eq!(route.summary.cost, 7);
        assert_eq!(connected_components(&route.network.pairs()).len(), 1);
    }
}

#[test]
fn far_connection_returns_the_sentinel() {
    let grid: PointSet = vec![Point::new(1, 0.0, 0.0), Point::new(2, 100_000.0, 0.0)]
        .into_iter()
        .collect();
    let ctx = RoutingContext::new(&grid, 1000.0, 1000.0);
    let a = grid.get(PointId::new(1)).unwrap();
    let b = grid.get(PointId::new(2)).unwrap();

    let route = dijkstra_connection(&ctx, a, b, &[], &[]).unwrap();
    assert!(route.network.is_empty());
    assert_eq!(route.summary.cost, INFEASIBLE as u64);
    assert_eq!(route.summary.length, INFEASIBLE as u64);
}

#[test]
fn cost_matrix_is_symmetric_and_non_negative() {
    let points: PointSet = vec![
        Point::new(1, 0.0, 0.0).with_weight(1.0).with_elevation(10.0),
        Point::new(2, 130.0, 40.0).with_weight(2.5).with_elevation(25.0),
        Point::new(3, -70.0, 300.0).with_weight(0.0),
        Point::new(4, 500.0, -20.0).with_weight(1.7).with_elevation(3.0),
    ]
    .into_iter()
    .collect();
    let dist = distance_matrix(&points, &points, Dims::Spatial);
    let cost = cost_matrix(&points, &dist, 12_000.0).unwrap();

    for i in 0..points.len() {
        for j in 0..points.len() {
            assert_eq!(cost.at(i, j), cost.at(j, i));
            assert!(cost.at(i, j) >= 0.0);
        }
    }
}

#[test]
fn steiner_edges_respect_the_length_limit() {
    let grid = mesh(5, 100.0);
    let terminals = grid.filter(|p| p.id.value() % 3 == 0);
    let ctx = RoutingContext::new(&grid, 100.0, 1000.0);

    let route = steiner(&ctx, &terminals, &[]).unwrap();
    assert!(!route.network.is_empty());
    assert!(route.network.lines.iter().all(|l| l.length <= 150.0));
}

#[test]
fn output_connects_all_terminals() {
    let grid = mesh(5, 100.0);
    let terminals = grid.filter(|p| p.id.value() % 4 == 1);
    let ctx = RoutingContext::new(&grid, 100.0, 1000.0);

    for route in [
        steiner(&ctx, &terminals, &[]).unwrap(),
        spider(&ctx, &terminals, &[]).unwrap(),
    ] {
        let components = connected_components(&route.network.pairs());
        let first = terminals.iter().next().unwrap().id;
        let component = components
            .iter()
            .find(|c| c.contains(&first))
            .expect("first terminal is routed");
        assert!(terminals.iter().all(|t| component.contains(&t.id)));
    }
}

#[test]
fn builders_are_deterministic() {
    let grid = mesh(4, 100.0);
    let terminals = grid.filter(|p| p.id.value() % 2 == 0);
    let ctx = RoutingContext::new(&grid, 100.0, 1000.0);

    assert_eq!(
        steiner(&ctx, &terminals, &[]).unwrap(),
        steiner(&ctx, &terminals, &[]).unwrap()
    );
    assert_eq!(
        spider(&ctx, &terminals, &[]).unwrap(),
        spider(&ctx, &terminals, &[]).unwrap()
    );
}

#[test]
fn builder_choice_switches_at_a_fifth_of_the_resolution() {
    // resolution 50: Steiner is tried below 10 terminals
    let below = row(9, 50.0);
    let ctx = RoutingContext::new(&below, 50.0, 1000.0);
    let (topology, _) = cluster_grid(&ctx, &below, below.len()).unwrap();
    assert_eq!(topology, Topology::Steiner);

    let at = row(10, 50.0);
    let ctx = RoutingContext::new(&at, 50.0, 1000.0);
    let (topology, route) = cluster_grid(&ctx, &at, at.len()).unwrap();
    assert_eq!(topology, Topology::Spider);
    assert_eq!(route.summary.length, 450);
}
