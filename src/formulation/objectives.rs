// Objective components
// Exactly one objective is active per model; it may contribute auxiliary constraints

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::constraints::{ComponentDescription, GenerationContext};
use super::gap::{linearize, GapBound};
use crate::domain::models::{Constraint, LinearExpr, ObjectiveFunction, Variable, VariableId};
use crate::error::Result;

/// Selectable optimization goals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Objective {
    /// Total mission cost over the optimization horizon
    MinCost,
    /// Total downlinked volume extrapolated over the optimization horizon
    MaxDataDownlink,
    /// Largest gap between consecutive contacts of any satellite
    MinMaxContactGap,
}

/// Objective function together with the constraints it introduced
#[derive(Debug, Clone)]
pub struct ObjectiveBlock {
    pub objective: ObjectiveFunction,
    pub constraints: Vec<Constraint>,
    /// The continuous worst-gap variable, when the objective created one
    pub max_gap: Option<VariableId>,
}

impl Objective {
    pub fn name(&self) -> &'static str {
        match self {
            Objective::MinCost => "MinCost",
            Objective::MaxDataDownlink => "MaxDataDownlink",
            Objective::MinMaxContactGap => "MinMaxContactGap",
        }
    }

    pub fn describe(&self) -> ComponentDescription {
        ComponentDescription::of(self.name(), &serde_json::json!({}))
    }

    pub fn generate(&self, ctx: &mut GenerationContext<'_>) -> Result<ObjectiveBlock> {
        let block = match self {
            Objective::MinCost => ObjectiveBlock {
                objective: ObjectiveFunction::minimize(mission_cost(ctx)),
                constraints: Vec::new(),
                max_gap: None,
            },
            Objective::MaxDataDownlink => {
                let scale = ctx.window.scale();
                let expr = LinearExpr::weighted_sum(
                    ctx.nodes
                        .contacts
                        .values()
                        .map(|cn| (cn.var, cn.contact.data_volume * scale)),
                );
                ObjectiveBlock {
                    objective: ObjectiveFunction::maximize(expr),
                    constraints: Vec::new(),
                    max_gap: None,
                }
            }
            Objective::MinMaxContactGap => {
                let max_gap = ctx
                    .vars
                    .add(Variable::continuous("max_gap").with_bounds(0.0, None));
                let constraints = linearize(ctx.nodes, ctx.vars, GapBound::Variable(max_gap));
                ObjectiveBlock {
                    objective: ObjectiveFunction::minimize(LinearExpr::term(max_gap, 1.0)),
                    constraints,
                    max_gap: Some(max_gap),
                }
            }
        };

        debug!(
            objective = self.name(),
            terms = block.objective.expression.terms.len(),
            constraints = block.constraints.len(),
            "generated objective"
        );
        Ok(block)
    }
}

// Fixed costs once, recurring station costs per month of horizon, contact costs extrapolated
fn mission_cost(ctx: &GenerationContext<'_>) -> LinearExpr {
    let months = ctx.window.opt_months();
    let scale = ctx.window.scale();
    let mut expr = LinearExpr::new();

    for pn in ctx.nodes.providers.values() {
        if pn.provider.integration_cost != 0.0 {
            expr.add_term(pn.var, pn.provider.integration_cost);
        }
    }
    for sn in ctx.nodes.stations.values() {
        let fixed = sn.station.setup_cost + sn.station.monthly_cost * months;
        if fixed != 0.0 {
            expr.add_term(sn.var, fixed);
        }
    }
    for (key, &indicator) in &ctx.nodes.station_satellites {
        let license = ctx
            .nodes
            .stations
            .get(&key.station_id)
            .map_or(0.0, |sn| sn.station.per_satellite_license_cost);
        if license != 0.0 {
            expr.add_term(indicator, license);
        }
    }
    for cn in ctx.nodes.contacts.values() {
        expr.add_term(cn.var, cn.contact.cost * scale);
    }

    expr
}
