//! `lvplan route`: per-cluster grids, optionally connected to substations.

use super::LoadedInputs;
use anyhow::{Context, Result};
use lvplan_algo::{route_clusters, PlanningInputs};
use lvplan_cli::InputArgs;
use lvplan_io::{collect_lines, read_substations, write_grid_resume, write_lines};
use std::path::Path;
use tracing::warn;

pub fn handle(inputs: &InputArgs, substations: Option<&Path>) -> Result<()> {
    let loaded = LoadedInputs::load(inputs)?;
    let substations = match substations {
        Some(path) => read_substations(path)?,
        None => Vec::new(),
    };

    let planning = PlanningInputs {
        grid: &loaded.grid,
        clusters: &loaded.clusters,
        roads: loaded.roads.as_ref(),
        substations: &substations,
    };
    let routing = route_clusters(&planning, &loaded.config.routing).context("routing clusters")?;

    for row in routing.resume.failed() {
        warn!(cluster = %row.cluster, error = row.error.as_deref().unwrap_or_default(), "cluster failed");
    }

    let lines = collect_lines(&routing, None);
    write_lines(&inputs.out.join("lines.csv"), &lines)?;
    write_grid_resume(&inputs.out.join("grid_resume.csv"), &routing.resume)?;

    let (length, cost) = routing
        .resume
        .rows()
        .fold((0.0, 0.0), |(l, c), r| (l + r.grid_length_km, c + r.grid_cost_keur));
    println!(
        "Routed {} clusters: {:.2} km, {:.2} k€ ({} failed)",
        routing.resume.len(),
        length,
        cost,
        routing.resume.failed().count()
    );
    if !routing.links.network.is_empty() {
        println!(
            "Electrification links: {:.2} km, {:.2} k€",
            routing.links.summary.length_km(),
            routing.links.summary.cost_keur()
        );
    }
    Ok(())
}
