//! Planning configuration schema.
//!
//! A [`PlanningConfig`] is parsed once at the boundary (TOML), validated with
//! [`PlanningConfig::validate`], and then passed by reference into every
//! routing and optimization call. Nothing in the algorithms mutates it.
//!
//! ```toml
//! [routing]
//! resolution = 200.0
//! line_base_cost = 10000.0
//! population_threshold = 1.0
//! mode = "branches"
//! use_roads = true
//!
//! [economics]
//! max_line_power_kw = 5000.0
//! cost_of_electricity = 0.1
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors. Each variant names the offending field.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be > 0 (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must be >= 0 (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("{field}: {reason}")]
    Inconsistent { field: &'static str, reason: String },
}

/// How clusters are routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    /// One Steiner/Spider network per cluster.
    #[default]
    Flat,
    /// Main branch on a downsampled grid plus collateral networks.
    Branches,
}

impl RoutingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingMode::Flat => "flat",
            RoutingMode::Branches => "branches",
        }
    }
}

/// Parameters of the intra-cluster routing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Mesh spacing of the point grid (meters).
    pub resolution: f64,
    /// Line base cost (currency per km).
    pub line_base_cost: f64,
    /// Line base cost for collateral lines; falls back to `line_base_cost`.
    #[serde(default)]
    pub collateral_line_base_cost: Option<f64>,
    /// Minimum population for a point to require electrification.
    #[serde(default = "default_population_threshold")]
    pub population_threshold: f64,
    /// Minimum population of a downsampled cell to become a main-branch terminal.
    #[serde(default = "default_branch_population_threshold")]
    pub branch_population_threshold: f64,
    /// Peak load per inhabitant (kW), used to size collateral components.
    #[serde(default = "default_load_per_capita")]
    pub load_per_capita_kw: f64,
    #[serde(default)]
    pub mode: RoutingMode,
    /// Route along road segments when road geometry is supplied.
    #[serde(default = "default_true")]
    pub use_roads: bool,
    /// Connect populated points outside every cluster to the nearest network.
    #[serde(default)]
    pub full_electrification: bool,
    /// Build cost of a new HV substation (k€).
    #[serde(default = "default_substation_cost_hv")]
    pub substation_cost_hv: f64,
    /// Build cost of a new MV substation (k€).
    #[serde(default = "default_substation_cost_mv")]
    pub substation_cost_mv: f64,
    /// Worker threads for per-cluster routing (0 = all cores).
    #[serde(default)]
    pub threads: usize,
}

/// Parameters of the network cost optimization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EconomicsConfig {
    /// Maximum power on any MV link (kW).
    #[serde(default = "default_max_line_power")]
    pub max_line_power_kw: f64,
    /// Cost of grid electricity (€/kWh).
    #[serde(default = "default_cost_of_electricity")]
    pub cost_of_electricity: f64,
    #[serde(default = "default_discount_rate")]
    pub discount_rate: f64,
    /// Yearly O&M as a fraction of the grid investment.
    #[serde(default = "default_grid_om")]
    pub grid_om: f64,
    /// Technical lifetime of grid assets (years).
    #[serde(default = "default_grid_lifetime")]
    pub grid_lifetime: u32,
    /// Evaluation horizon of the project (years).
    #[serde(default = "default_project_years")]
    pub project_years: u32,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        Self {
            max_line_power_kw: default_max_line_power(),
            cost_of_electricity: default_cost_of_electricity(),
            discount_rate: default_discount_rate(),
            grid_om: default_grid_om(),
            grid_lifetime: default_grid_lifetime(),
            project_years: default_project_years(),
        }
    }
}

/// Complete, immutable planning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanningConfig {
    pub routing: RoutingConfig,
    #[serde(default)]
    pub economics: EconomicsConfig,
}

fn default_population_threshold() -> f64 {
    1.0
}

fn default_branch_population_threshold() -> f64 {
    10.0
}

fn default_load_per_capita() -> f64 {
    0.4
}

fn default_true() -> bool {
    true
}

fn default_substation_cost_hv() -> f64 {
    25.0
}

fn default_substation_cost_mv() -> f64 {
    10.0
}

fn default_max_line_power() -> f64 {
    5000.0
}

fn default_cost_of_electricity() -> f64 {
    0.09
}

fn default_discount_rate() -> f64 {
    0.08
}

fn default_grid_om() -> f64 {
    0.025
}

fn default_grid_lifetime() -> u32 {
    40
}

fn default_project_years() -> u32 {
    20
}

impl RoutingConfig {
    /// Routing parameters with defaults for everything but the two required scalars.
    pub fn new(resolution: f64, line_base_cost: f64) -> Self {
        Self {
            resolution,
            line_base_cost,
            collateral_line_base_cost: None,
            population_threshold: default_population_threshold(),
            branch_population_threshold: default_branch_population_threshold(),
            load_per_capita_kw: default_load_per_capita(),
            mode: RoutingMode::Flat,
            use_roads: true,
            full_electrification: false,
            substation_cost_hv: default_substation_cost_hv(),
            substation_cost_mv: default_substation_cost_mv(),
            threads: 0,
        }
    }

    /// Line base cost used for collateral networks.
    pub fn collateral_cost(&self) -> f64 {
        self.collateral_line_base_cost.unwrap_or(self.line_base_cost)
    }

    /// Planar length above which a straight edge is not routed directly.
    pub fn length_limit(&self) -> f64 {
        (1.5 * self.resolution).ceil()
    }
}

impl PlanningConfig {
    pub fn new(routing: RoutingConfig) -> Self {
        Self {
            routing,
            economics: EconomicsConfig::default(),
        }
    }

    /// Check every field once, at the boundary.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.routing;
        positive("routing.resolution", r.resolution)?;
        positive("routing.line_base_cost", r.line_base_cost)?;
        if let Some(cost) = r.collateral_line_base_cost {
            positive("routing.collateral_line_base_cost", cost)?;
        }
        non_negative("routing.population_threshold", r.population_threshold)?;
        non_negative(
            "routing.branch_population_threshold",
            r.branch_population_threshold,
        )?;
        non_negative("routing.load_per_capita_kw", r.load_per_capita_kw)?;
        non_negative("routing.substation_cost_hv", r.substation_cost_hv)?;
        non_negative("routing.substation_cost_mv", r.substation_cost_mv)?;

        let e = &self.economics;
        positive("economics.max_line_power_kw", e.max_line_power_kw)?;
        non_negative("economics.cost_of_electricity", e.cost_of_electricity)?;
        non_negative("economics.discount_rate", e.discount_rate)?;
        non_negative("economics.grid_om", e.grid_om)?;
        if e.grid_lifetime == 0 {
            return Err(ConfigError::NonPositive {
                field: "economics.grid_lifetime",
                value: 0.0,
            });
        }
        if e.project_years == 0 {
            return Err(ConfigError::NonPositive {
                field: "economics.project_years",
                value: 0.0,
            });
        }
        if e.project_years > e.grid_lifetime {
            return Err(ConfigError::Inconsistent {
                field: "economics.project_years",
                reason: format!(
                    "project horizon ({}) exceeds grid lifetime ({})",
                    e.project_years, e.grid_lifetime
                ),
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}
