//! NPC solution data structures

use super::NpcNode;
use lvplan_core::{ClusterId, SubstationId};
use serde::{Deserialize, Serialize};

/// A candidate link chosen by the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedLink {
    pub from: NpcNode,
    pub to: NpcNode,
    /// Flow from `from` to `to` (kW); negative when it runs the other way.
    pub power_kw: f64,
    pub npc_keur: f64,
}

/// Complete solution of an NPC problem. All costs in k€.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NpcSolution {
    /// Clusters supplied by a stand-alone microgrid.
    pub microgrids: Vec<ClusterId>,
    /// Active substations and their output (kW).
    pub active_substations: Vec<(SubstationId, f64)>,
    pub links: Vec<SelectedLink>,
    pub total_cost_keur: f64,
    pub microgrid_cost_keur: f64,
    pub substation_cost_keur: f64,
    pub link_cost_keur: f64,
    /// Grid energy bought by connected clusters.
    pub energy_cost_keur: f64,
    pub solve_time_ms: u64,
}

impl NpcSolution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_microgrid(&self, cluster: ClusterId) -> bool {
        self.microgrids.contains(&cluster)
    }

    /// Number of clusters supplied by the grid.
    pub fn connected_clusters(&self, total_clusters: usize) -> usize {
        total_clusters - self.microgrids.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "NPC Solution Summary:\n\
             ├─ Total cost: {:.2} k€\n\
             │  ├─ Microgrids: {:.2} k€ ({} clusters)\n\
             │  ├─ Substations: {:.2} k€ ({} active)\n\
             │  ├─ Links: {:.2} k€ ({} built)\n\
             │  └─ Grid energy: {:.2} k€\n\
             └─ Solve time: {} ms",
            self.total_cost_keur,
            self.microgrid_cost_keur,
            self.microgrids.len(),
            self.substation_cost_keur,
            self.active_substations.len(),
            self.link_cost_keur,
            self.links.len(),
            self.energy_cost_keur,
            self.solve_time_ms,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_components() {
        let solution = NpcSolution {
            microgrids: vec![ClusterId::new(2)],
            total_cost_keur: 123.456,
            link_cost_keur: 3.0,
            ..NpcSolution::new()
        };
        let text = solution.summary();
        assert!(text.contains("123.46 k€"));
        assert!(text.contains("(1 clusters)"));
        assert!(solution.is_microgrid(ClusterId::new(2)));
        assert_eq!(solution.connected_clusters(3), 2);
    }

    #[test]
    fn nodes_serialize_as_names() {
        let link = SelectedLink {
            from: NpcNode::Cluster(ClusterId::new(1)),
            to: NpcNode::Substation(SubstationId::new(7)),
            power_kw: -12.5,
            npc_keur: 4.0,
        };
        let json = serde_json::to_string(&link).unwrap();
        assert!(json.contains("\"C1\""));
        assert!(json.contains("\"S7\""));
    }
}
