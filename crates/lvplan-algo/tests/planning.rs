//! Routing, candidate links and NPC optimization chained together.

use lvplan_algo::npc::{apply_to_resume, candidate_links, solve_npc, MicrogridCost, NpcProblemBuilder};
use lvplan_algo::{route_clusters, PlanningInputs, RoutingContext};
use lvplan_core::{
    ClusterId, ClusterInfo, ConnectionType, EconomicsConfig, Point, PointSet, RoutingConfig,
    Substation, SubstationId, SubstationKind,
};

/// Cluster 1 on x 0..200, cluster 2 on x 600..800, empty points between.
fn two_villages() -> PointSet {
    (0..9)
        .map(|i| {
            let p = Point::new(i + 1, i as f64 * 100.0, 0.0);
            match i {
                0..=2 => p.with_population(5.0).with_cluster(ClusterId::new(1)),
                6..=8 => p.with_population(5.0).with_cluster(ClusterId::new(2)),
                _ => p,
            }
        })
        .collect()
}

fn roster() -> Vec<ClusterInfo> {
    [1, 2]
        .into_iter()
        .map(|id| ClusterInfo {
            id: ClusterId::new(id),
            population: 15.0,
            load_kw: 6.0,
        })
        .collect()
}

fn middle_substation() -> Substation {
    Substation {
        id: SubstationId::new(1),
        x: 400.0,
        y: 0.0,
        power_available_kw: 1000.0,
        kind: SubstationKind::Mv,
        cost_keur: 10.0,
        exists: true,
    }
}

fn microgrids(npc_keur: f64) -> Vec<MicrogridCost> {
    [1, 2]
        .into_iter()
        .map(|id| MicrogridCost {
            cluster: ClusterId::new(id),
            npc_keur,
            energy_mwh: 100.0,
        })
        .collect()
}

fn plan(microgrid_npc_keur: f64) -> (lvplan_algo::GridRouting, lvplan_algo::NpcSolution) {
    let grid = two_villages();
    let clusters = roster();
    let substations = vec![middle_substation()];
    let config = RoutingConfig::new(100.0, 1000.0);
    let economics = EconomicsConfig::default();

    let inputs = PlanningInputs {
        grid: &grid,
        clusters: &clusters,
        roads: None,
        substations: &[],
    };
    let mut routing = route_clusters(&inputs, &config).unwrap();
    let ctx = RoutingContext::from_config(&grid, None, &config);
    let links = candidate_links(&ctx, &routing.networks, &clusters, &substations, &economics)
        .unwrap();

    let problem = NpcProblemBuilder::new()
        .clusters(&clusters, &microgrids(microgrid_npc_keur))
        .unwrap()
        .substations(&substations)
        .links(links)
        .max_line_power_kw(economics.max_line_power_kw)
        .cost_of_electricity(economics.cost_of_electricity)
        .build()
        .unwrap();
    let solution = solve_npc(&problem).unwrap();
    assert_eq!(
        solution.links.len(),
        problem.clusters.len() - solution.microgrids.len()
    );
    apply_to_resume(&mut routing.resume, &problem, &solution).unwrap();
    (routing, solution)
}

#[test]
fn cheap_grid_connects_both_villages_to_the_substation() {
    let (routing, solution) = plan(500.0);
    assert!(solution.microgrids.is_empty());
    assert_eq!(solution.active_substations.len(), 1);

    for id in [1, 2] {
        let row = routing.resume.get(ClusterId::new(id)).unwrap();
        assert_eq!(row.grid_length_km, 0.2);
        assert_eq!(row.connection_type, ConnectionType::Mv);
        assert_eq!(row.substation_id(), Some(SubstationId::new(1)));
        assert_eq!(row.connection_length_km, 0.2);
    }
}

#[test]
fn cheap_microgrids_leave_villages_off_grid() {
    let (routing, solution) = plan(0.01);
    assert_eq!(solution.microgrids.len(), 2);
    assert!(solution.links.is_empty());
    assert!(solution.active_substations.is_empty());
    assert!(routing
        .resume
        .rows()
        .all(|r| r.connection_type == ConnectionType::Microgrid && r.connection_cost_keur == 0.0));
}

#[test]
fn cluster_without_terminals_records_zero_totals() {
    let grid: PointSet = vec![
        Point::new(1, 0.0, 0.0).with_cluster(ClusterId::new(3)),
        Point::new(2, 100.0, 0.0).with_cluster(ClusterId::new(3)),
    ]
    .into_iter()
    .collect();
    let clusters = vec![ClusterInfo {
        id: ClusterId::new(3),
        population: 0.0,
        load_kw: 0.0,
    }];
    let inputs = PlanningInputs {
        grid: &grid,
        clusters: &clusters,
        roads: None,
        substations: &[],
    };
    let routing = route_clusters(&inputs, &RoutingConfig::new(100.0, 1000.0)).unwrap();
    let row = routing.resume.get(ClusterId::new(3)).unwrap();
    assert!(row.error.is_none());
    assert_eq!(row.grid_length_km, 0.0);
    assert_eq!(row.grid_cost_keur, 0.0);
    assert!(routing.networks[&ClusterId::new(3)].grid.network.is_empty());
}
