// Solver adapters module
// Each backend is compiled only when its cargo feature is enabled

#[cfg(feature = "cbc")]
pub mod coin_cbc_solver;
pub mod factory;
#[cfg(feature = "highs")]
pub mod highs_solver;

#[cfg(feature = "cbc")]
pub use coin_cbc_solver::CoinCbcSolver;
pub use factory::SolverFactory;
#[cfg(feature = "highs")]
pub use highs_solver::HighsSolver;

use std::collections::BTreeMap;

use crate::domain::models::{LinearExpr, OptimizationProblem};

/// Terms of `expr` with repeated variables folded together, as dense indices
#[cfg_attr(not(any(feature = "cbc", feature = "highs")), allow(dead_code))]
pub(crate) fn merged_terms(expr: &LinearExpr) -> Vec<(usize, f64)> {
    let mut merged: BTreeMap<usize, f64> = BTreeMap::new();
    for (var, coeff) in &expr.terms {
        *merged.entry(var.index()).or_insert(0.0) += coeff;
    }
    merged.into_iter().filter(|(_, c)| *c != 0.0).collect()
}

/// Dense objective coefficients, one per problem variable
#[cfg_attr(not(feature = "highs"), allow(dead_code))]
pub(crate) fn objective_coefficients(problem: &OptimizationProblem) -> Vec<f64> {
    let mut coefficients = vec![0.0; problem.num_variables()];
    for (idx, coeff) in merged_terms(&problem.objective.expression) {
        if let Some(slot) = coefficients.get_mut(idx) {
            *slot = coeff;
        }
    }
    coefficients
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ObjectiveFunction, Variable, VariableId};

    #[test]
    fn repeated_variables_are_folded() {
        let expr = LinearExpr::term(VariableId(2), 1.5)
            .with_term(VariableId(0), 1.0)
            .with_term(VariableId(2), 0.5)
            .with_term(VariableId(1), 1.0)
            .with_term(VariableId(1), -1.0);
        assert_eq!(merged_terms(&expr), vec![(0, 1.0), (2, 2.0)]);
    }

    #[test]
    fn objective_is_densified() {
        let problem = OptimizationProblem::new(ObjectiveFunction::minimize(
            LinearExpr::term(VariableId(1), 3.0),
        ))
        .with_variables(vec![Variable::binary("a"), Variable::binary("b")]);
        assert_eq!(objective_coefficients(&problem), vec![0.0, 3.0]);
    }
}
