//! `lvplan validate`: check inputs without routing.

use anyhow::Result;
use lvplan_io::{load_config, read_clusters, read_points, unknown_clusters};
use std::path::Path;

pub fn handle(
    config: &Path,
    points: Option<&Path>,
    clusters: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    println!(
        "Configuration OK: resolution {} m, {} mode",
        config.routing.resolution,
        config.routing.mode.as_str()
    );

    let grid = points.map(read_points).transpose()?;
    if let Some(grid) = &grid {
        println!("Points OK: {}", grid.len());
    }
    let roster = clusters.map(read_clusters).transpose()?;
    if let Some(roster) = &roster {
        println!("Clusters OK: {}", roster.len());
    }
    if let (Some(grid), Some(roster)) = (&grid, &roster) {
        let stray = unknown_clusters(grid, roster);
        if !stray.is_empty() {
            anyhow::bail!(
                "{} points belong to clusters missing from the roster (first: point {})",
                stray.len(),
                stray[0]
            );
        }
    }
    Ok(())
}
