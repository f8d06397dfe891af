// Linearized maximum inter-contact gap
//
// For every satellite, each scheduled contact either hands over to exactly one later
// contact of the same satellite (successor indicator) or is the satellite's single
// terminal contact. An active successor indicator bounds `successor.start - contact.end`.

use tracing::debug;

use crate::domain::entities::seconds_between;
use crate::domain::models::{Constraint, LinearExpr, VariableId};
use crate::formulation::nodes::{NodeSet, VariableArena};

/// Right-hand side of the per-pair gap rows
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GapBound {
    /// Constant limit in seconds
    Fixed(f64),
    /// Shared continuous variable, typically minimized by an objective
    Variable(VariableId),
}

impl GapBound {
    fn row(self, pair: VariableId, gap: f64) -> Constraint {
        match self {
            GapBound::Fixed(max_gap) => LinearExpr::term(pair, gap).leq(max_gap),
            GapBound::Variable(max_gap) => LinearExpr::term(pair, gap)
                .with_term(max_gap, -1.0)
                .leq(0.0),
        }
    }
}

/// Emit the successor/terminal encoding of every satellite's contact sequence
///
/// Gaps are measured from a contact's end to its successor's start. The encoding is exact
/// for schedules in which a satellite's contacts do not overlap, e.g. together with
/// satellite contact exclusion.
pub fn linearize(nodes: &NodeSet, vars: &mut VariableArena, bound: GapBound) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    let mut pairs = 0usize;

    for (sat_id, contacts) in nodes.contacts_by_satellite() {
        let mut terminals = LinearExpr::new();

        for (i, current) in contacts.iter().enumerate() {
            let mut handover = LinearExpr::new();

            for (j, next) in contacts.iter().enumerate().skip(i + 1) {
                if next.contact.t_start <= current.contact.t_end {
                    continue;
                }
                let gap = seconds_between(current.contact.t_end, next.contact.t_start);
                let pair = vars.binary(format!("gap[{},{},{}]", sat_id, i, j));
                pairs += 1;

                constraints.push(
                    LinearExpr::term(pair, 1.0)
                        .with_term(current.var, -1.0)
                        .leq(0.0)
                        .with_name(format!("gap_from[{}:{},{}]", sat_id, i, j)),
                );
                constraints.push(
                    LinearExpr::term(pair, 1.0)
                        .with_term(next.var, -1.0)
                        .leq(0.0)
                        .with_name(format!("gap_to[{}:{},{}]", sat_id, i, j)),
                );
                constraints.push(
                    bound
                        .row(pair, gap)
                        .with_name(format!("gap_limit[{}:{},{}]", sat_id, i, j)),
                );
                handover.add_term(pair, 1.0);
            }

            let terminal = vars.binary(format!("gap_terminal[{},{}]", sat_id, i));
            terminals.add_term(terminal, 1.0);
            constraints.push(
                handover
                    .with_term(terminal, 1.0)
                    .with_term(current.var, -1.0)
                    .eq(0.0)
                    .with_name(format!("gap_successor[{}:{}]", sat_id, i)),
            );
        }

        if !terminals.is_empty() {
            constraints.push(
                terminals
                    .leq(1.0)
                    .with_name(format!("gap_single_terminal[{}]", sat_id)),
            );
        }
    }

    debug!(pairs, constraints = constraints.len(), ?bound, "linearized contact gaps");
    constraints
}
