// Temporal exclusion and antenna capacity

use std::collections::BTreeMap;

use tracing::debug;

use super::{ComponentDescription, ConstraintGenerator, GenerationContext};
use crate::domain::models::{Constraint, LinearExpr};
use crate::error::Result;
use crate::formulation::nodes::ContactNode;

// `x_a + x_b ≤ 1` for every overlapping pair within each group.
// Groups are sorted by start, so the scan for `a` stops at the first `b` starting after `a` ends.
fn pairwise_exclusion(groups: &BTreeMap<&str, Vec<&ContactNode>>, label: &str) -> Vec<Constraint> {
    let mut constraints = Vec::new();

    for (key, contacts) in groups {
        for (i, a) in contacts.iter().enumerate() {
            for b in &contacts[i + 1..] {
                if b.contact.t_start > a.contact.t_end {
                    break;
                }
                if a.contact.overlaps(&b.contact) {
                    constraints.push(
                        LinearExpr::sum([a.var, b.var])
                            .leq(1.0)
                            .with_name(format!("{}[{}:{},{}]", label, key, a.id(), b.id())),
                    );
                }
            }
        }
    }

    constraints
}

/// A station cannot serve two overlapping contacts
#[derive(Debug, Clone, Copy, Default)]
pub struct StationContactExclusion;

impl ConstraintGenerator for StationContactExclusion {
    fn name(&self) -> &'static str {
        "StationContactExclusion"
    }

    fn describe(&self) -> ComponentDescription {
        ComponentDescription::of(self.name(), &serde_json::json!({}))
    }

    fn generate(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Constraint>> {
        Ok(pairwise_exclusion(
            &ctx.nodes.contacts_by_station(),
            "station_exclusion",
        ))
    }
}

/// A satellite cannot downlink to two stations at once
#[derive(Debug, Clone, Copy, Default)]
pub struct SatelliteContactExclusion;

impl ConstraintGenerator for SatelliteContactExclusion {
    fn name(&self) -> &'static str {
        "SatelliteContactExclusion"
    }

    fn describe(&self) -> ComponentDescription {
        ComponentDescription::of(self.name(), &serde_json::json!({}))
    }

    fn generate(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Constraint>> {
        Ok(pairwise_exclusion(
            &ctx.nodes.contacts_by_satellite(),
            "satellite_exclusion",
        ))
    }
}

/// A station with `n` antennas cannot serve more than `n` mutually overlapping contacts
///
/// Emits `Σ x ≤ n` for every set of `n + 1` contacts at a station that pairwise overlap.
/// The number of such sets grows as `C(contacts, n + 1)` in the worst case.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxAntennaUsage;

impl ConstraintGenerator for MaxAntennaUsage {
    fn name(&self) -> &'static str {
        "MaxAntennaUsage"
    }

    fn describe(&self) -> ComponentDescription {
        ComponentDescription::of(self.name(), &serde_json::json!({}))
    }

    fn generate(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Constraint>> {
        let mut constraints = Vec::new();

        for (station_id, contacts) in ctx.nodes.contacts_by_station() {
            let antennas = ctx.nodes.stations[station_id].station.antennas;
            let cliques = mutually_overlapping(&contacts, antennas + 1);
            debug!(
                station = station_id,
                antennas,
                contacts = contacts.len(),
                sets = cliques.len(),
                "antenna capacity sets"
            );

            for (k, clique) in cliques.into_iter().enumerate() {
                constraints.push(
                    LinearExpr::sum(clique.iter().map(|&idx| contacts[idx].var))
                        .leq(antennas as f64)
                        .with_name(format!("antenna_limit[{}:{}]", station_id, k)),
                );
            }
        }

        Ok(constraints)
    }
}

/// Index sets of `size` contacts that pairwise overlap; `contacts` must be sorted by start
pub(crate) fn mutually_overlapping(contacts: &[&ContactNode], size: usize) -> Vec<Vec<usize>> {
    let mut found = Vec::new();
    if size == 0 || contacts.len() < size {
        return found;
    }
    let mut current = Vec::with_capacity(size);
    extend_clique(contacts, size, 0, &mut current, &mut found);
    found
}

fn extend_clique(
    contacts: &[&ContactNode],
    size: usize,
    from: usize,
    current: &mut Vec<usize>,
    found: &mut Vec<Vec<usize>>,
) {
    if current.len() == size {
        found.push(current.clone());
        return;
    }

    for idx in from..contacts.len() {
        let candidate = &contacts[idx].contact;
        // Later candidates start even later, so none of them can overlap either
        if current
            .iter()
            .any(|&m| candidate.t_start > contacts[m].contact.t_end)
        {
            break;
        }
        if current
            .iter()
            .all(|&m| contacts[m].contact.overlaps(candidate))
        {
            current.push(idx);
            extend_clique(contacts, size, idx + 1, current, found);
            current.pop();
        }
    }
}
