//! `lvplan plan`: routing followed by the NPC optimization.

use super::LoadedInputs;
use anyhow::{Context, Result};
use lvplan_algo::npc::{apply_to_resume, candidate_links, solve_npc, NpcProblemBuilder};
use lvplan_algo::{route_clusters, PlanningInputs, RoutingContext};
use lvplan_cli::InputArgs;
use lvplan_io::{
    collect_lines, read_microgrids, read_substations, write_grid_resume, write_lines,
    write_milp_results,
};
use std::path::Path;
use tracing::info;

pub fn handle(inputs: &InputArgs, substations: &Path, microgrids: &Path) -> Result<()> {
    let loaded = LoadedInputs::load(inputs)?;
    let substations = read_substations(substations)?;
    let microgrids = read_microgrids(microgrids)?;
    let routing_config = &loaded.config.routing;
    let economics = &loaded.config.economics;

    // substations are chosen by the optimizer, not during routing
    let planning = PlanningInputs {
        grid: &loaded.grid,
        clusters: &loaded.clusters,
        roads: loaded.roads.as_ref(),
        substations: &[],
    };
    let mut routing = route_clusters(&planning, routing_config).context("routing clusters")?;

    let ctx = RoutingContext::from_config(&loaded.grid, loaded.roads.as_ref(), routing_config);
    let links = candidate_links(
        &ctx,
        &routing.networks,
        &loaded.clusters,
        &substations,
        economics,
    )
    .context("routing candidate links")?;
    info!(candidates = links.len(), "candidate links ready");

    let problem = NpcProblemBuilder::new()
        .clusters(&loaded.clusters, &microgrids)?
        .substations(&substations)
        .links(links)
        .max_line_power_kw(economics.max_line_power_kw)
        .cost_of_electricity(economics.cost_of_electricity)
        .build()?;
    let solution = solve_npc(&problem).context("solving the NPC optimization")?;
    let connections = apply_to_resume(&mut routing.resume, &problem, &solution)
        .context("assigning cluster connections")?;

    let lines = collect_lines(&routing, Some(&connections));
    write_lines(&inputs.out.join("lines.csv"), &lines)?;
    write_grid_resume(&inputs.out.join("grid_resume.csv"), &routing.resume)?;
    write_milp_results(&inputs.out.join("milp_results.json"), &solution)?;

    println!("{}", solution.summary());
    Ok(())
}
