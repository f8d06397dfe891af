// Structured solution document

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::optimizer::{MilpOptimizer, RuntimeStats};
use crate::domain::entities::{
    OptimizationWindow, Provider, Satellite, BITS_PER_GB, SECONDS_PER_MONTH,
};
use crate::domain::models::Solution;
use crate::error::{OptimizerError, Result};
use crate::formulation::constraints::ComponentDescription;
use crate::formulation::nodes::{ContactNode, NodeCounts, NodeSet};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Objective and constraint components the model was built from
#[derive(Debug, Clone, Serialize)]
pub struct ProblemDescription {
    pub objective: ComponentDescription,
    pub constraints: Vec<ComponentDescription>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariableCounts {
    #[serde(flatten)]
    pub nodes: NodeCounts,
    /// Variables introduced by components, e.g. gap successor indicators
    pub auxiliary: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentConstraintCount {
    pub component: String,
    pub constraints: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConstraintCounts {
    pub components: Vec<ComponentConstraintCount>,
    pub objective: usize,
    pub linking: usize,
    pub total: usize,
}

/// Costs of the selected resources over the optimization horizon
#[derive(Debug, Clone, Default, Serialize)]
pub struct CostStatistics {
    pub total: f64,
    /// Provider integration, station setup and satellite licences
    pub fixed: f64,
    /// Station monthly fees and contact fees over the horizon
    pub operational: f64,
    pub monthly_operational: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SatelliteDownlink {
    pub total: f64,
    #[serde(rename = "total_GB")]
    pub total_gb: f64,
    pub daily_avg: f64,
    #[serde(rename = "daily_avg_GB")]
    pub daily_avg_gb: f64,
}

/// Volumes in bits, extrapolated to the optimization horizon
#[derive(Debug, Clone, Default, Serialize)]
pub struct DownlinkStatistics {
    pub total: f64,
    #[serde(rename = "total_GB")]
    pub total_gb: f64,
    pub by_satellite: BTreeMap<String, SatelliteDownlink>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContactTimeStatistics {
    /// Scheduled contact seconds over the horizon
    pub total: f64,
    /// Average scheduled contact seconds per day
    pub daily_avg_by_satellite: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Statistics {
    pub costs: CostStatistics,
    pub data_downlinked: DownlinkStatistics,
    pub contact_time_s: ContactTimeStatistics,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectedStation {
    pub id: String,
    pub name: String,
    pub provider: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduledContact {
    pub id: String,
    pub station_id: String,
    pub provider_id: String,
    pub satellite_id: String,
    pub t_start: DateTime<Utc>,
    pub t_end: DateTime<Utc>,
    pub t_duration: f64,
    pub cost: f64,
    pub data_volume: f64,
}

impl From<&ContactNode> for ScheduledContact {
    fn from(cn: &ContactNode) -> Self {
        let c = &cn.contact;
        Self {
            id: c.id.clone(),
            station_id: c.station_id.clone(),
            provider_id: c.provider_id.clone(),
            satellite_id: c.satellite_id.clone(),
            t_start: c.t_start,
            t_end: c.t_end,
            t_duration: c.t_duration,
            cost: c.cost,
            data_volume: c.data_volume,
        }
    }
}

/// Persistable summary of a solved optimizer
#[derive(Debug, Clone, Serialize)]
pub struct SolutionReport {
    pub runtime: RuntimeStats,
    pub problem: ProblemDescription,
    pub solver_status: String,
    pub solver_message: String,
    pub objective_value: Option<f64>,
    pub n_vars: VariableCounts,
    pub n_constraints: ConstraintCounts,
    pub statistics: Statistics,
    pub optimization_window: OptimizationWindow,
    pub satellites: Vec<Satellite>,
    pub providers: Vec<Provider>,
    /// Provider names
    pub selected_providers: Vec<String>,
    pub selected_stations: Vec<SelectedStation>,
    /// Scheduled contacts ordered by start time
    pub contacts: Vec<ScheduledContact>,
    /// Station ids licensed for each satellite
    pub stations_by_satellite: BTreeMap<String, Vec<String>>,
}

impl MilpOptimizer {
    /// Build the solution document; requires a solved model
    pub fn solution_report(&self) -> Result<SolutionReport> {
        let (Some(solution), Some(problem), Some(nodes), Some(objective_block)) = (
            self.solution(),
            self.problem(),
            self.nodes(),
            self.objective_block(),
        ) else {
            return Err(OptimizerError::InvalidState(
                "problem has not been solved; solve it before requesting the solution".into(),
            ));
        };
        let objective = self
            .objective()
            .ok_or(OptimizerError::ObjectiveNotSet)?;

        let counts = nodes.counts();
        let linking = self.linking_constraints().len();
        let components: Vec<ComponentConstraintCount> = self
            .constraint_blocks()
            .iter()
            .map(|block| ComponentConstraintCount {
                component: block.component.kind.clone(),
                constraints: block.len(),
            })
            .collect();

        Ok(SolutionReport {
            runtime: self.runtime(),
            problem: ProblemDescription {
                objective: objective.describe(),
                constraints: self
                    .constraint_blocks()
                    .iter()
                    .map(|block| block.component.clone())
                    .collect(),
            },
            solver_status: solution.status.to_string().to_uppercase(),
            solver_message: solution.message.clone(),
            objective_value: solution.optimal_value,
            n_vars: VariableCounts {
                nodes: counts,
                auxiliary: problem.num_variables().saturating_sub(counts.total()),
                total: problem.num_variables(),
            },
            n_constraints: ConstraintCounts {
                components,
                objective: objective_block.constraints.len(),
                linking,
                total: problem.constraints.len(),
            },
            statistics: statistics(nodes, self.window(), solution),
            optimization_window: *self.window(),
            satellites: nodes
                .satellites
                .values()
                .map(|sn| sn.satellite.as_ref().clone())
                .collect(),
            providers: nodes
                .providers
                .values()
                .map(|pn| pn.provider.as_ref().clone())
                .collect(),
            selected_providers: nodes
                .providers
                .values()
                .filter(|pn| solution.is_selected(pn.var))
                .map(|pn| pn.provider.name.clone())
                .collect(),
            selected_stations: nodes
                .stations
                .values()
                .filter(|sn| solution.is_selected(sn.var))
                .map(|sn| SelectedStation {
                    id: sn.station.id.clone(),
                    name: sn.station.name.clone(),
                    provider: nodes
                        .providers
                        .get(sn.provider_id())
                        .map_or_else(|| sn.provider_id().to_string(), |pn| pn.provider.name.clone()),
                })
                .collect(),
            contacts: nodes
                .contacts_chronological()
                .into_iter()
                .filter(|cn| solution.is_selected(cn.var))
                .map(ScheduledContact::from)
                .collect(),
            stations_by_satellite: stations_by_satellite(nodes, solution),
        })
    }
}

fn stations_by_satellite(nodes: &NodeSet, solution: &Solution) -> BTreeMap<String, Vec<String>> {
    let mut by_satellite: BTreeMap<String, Vec<String>> = nodes
        .satellites
        .keys()
        .map(|id| (id.clone(), Vec::new()))
        .collect();
    for (key, &indicator) in &nodes.station_satellites {
        if solution.is_selected(indicator) {
            by_satellite
                .entry(key.satellite_id.clone())
                .or_default()
                .push(key.station_id.clone());
        }
    }
    by_satellite
}

fn statistics(nodes: &NodeSet, window: &OptimizationWindow, solution: &Solution) -> Statistics {
    let scale = window.scale();
    let months = window.opt_months();
    let mut stats = Statistics::default();
    let costs = &mut stats.costs;

    for pn in nodes.providers.values() {
        if solution.is_selected(pn.var) {
            costs.fixed += pn.provider.integration_cost;
        }
    }
    for sn in nodes.stations.values() {
        if solution.is_selected(sn.var) {
            costs.fixed += sn.station.setup_cost;
            costs.operational += sn.station.monthly_cost * months;
            costs.monthly_operational += sn.station.monthly_cost;
        }
    }
    for (key, &indicator) in &nodes.station_satellites {
        if solution.is_selected(indicator) {
            if let Some(sn) = nodes.stations.get(&key.station_id) {
                costs.fixed += sn.station.per_satellite_license_cost;
            }
        }
    }

    let opt_days = window.opt_duration() / SECONDS_PER_DAY;
    let sim_days = window.sim_duration() / SECONDS_PER_DAY;
    for sat_id in nodes.satellites.keys() {
        stats
            .data_downlinked
            .by_satellite
            .insert(sat_id.clone(), SatelliteDownlink::default());
        stats
            .contact_time_s
            .daily_avg_by_satellite
            .insert(sat_id.clone(), 0.0);
    }

    for cn in nodes.contacts.values() {
        if !solution.is_selected(cn.var) {
            continue;
        }
        let contact = &cn.contact;
        let costs = &mut stats.costs;
        costs.operational += contact.cost * scale;
        costs.monthly_operational += contact.cost / window.sim_duration() * SECONDS_PER_MONTH;

        let volume = contact.data_volume * scale;
        stats.data_downlinked.total += volume;
        stats
            .data_downlinked
            .by_satellite
            .entry(contact.satellite_id.clone())
            .or_default()
            .total += volume;

        stats.contact_time_s.total += contact.t_duration * scale;
        *stats
            .contact_time_s
            .daily_avg_by_satellite
            .entry(contact.satellite_id.clone())
            .or_default() += contact.t_duration / sim_days;
    }

    stats.costs.total = stats.costs.fixed + stats.costs.operational;
    stats.data_downlinked.total_gb = stats.data_downlinked.total / BITS_PER_GB;
    for downlink in stats.data_downlinked.by_satellite.values_mut() {
        downlink.total_gb = downlink.total / BITS_PER_GB;
        downlink.daily_avg = downlink.total / opt_days;
        downlink.daily_avg_gb = downlink.daily_avg / BITS_PER_GB;
    }

    stats
}
