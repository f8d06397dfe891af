// COIN-OR CBC adapter
// Translates the sparse domain model into a good_lp problem solved by CBC

use crate::domain::{
    models::{OptimizationProblem, Solution as DomainSolution, SolutionQuality},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{ConstraintType, OptimizationType, SolutionStatus as DomainSolutionStatus},
};
use crate::solver::merged_terms;
use good_lp::{
    solvers::coin_cbc, variable, variables, Expression, ResolutionError,
    Solution as GoodLpSolutionTrait, SolverModel, Variable as GoodLpVariable,
};
use std::time::Instant;
use tracing::{debug, warn};

pub struct CoinCbcSolver;

impl CoinCbcSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CoinCbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

fn to_expression(lp_variables: &[GoodLpVariable], terms: &[(usize, f64)]) -> Expression {
    let mut expr: Expression = 0.into();
    for &(idx, coeff) in terms {
        expr += coeff * lp_variables[idx];
    }
    expr
}

fn presolve_setting(level: u8) -> Result<&'static str> {
    match level {
        0 => Ok("off"),
        1 => Ok("on"),
        2 => Ok("more"),
        other => Err(SolverError::InvalidConfig(format!(
            "Presolve must be 0, 1, or 2 (got {})",
            other
        ))),
    }
}

impl SolverService for CoinCbcSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<DomainSolution> {
        self.validate(problem)?;

        let start_time = Instant::now();
        let mut statistics = problem.statistics();

        let mut vars = variables!();
        let mut lp_variables: Vec<GoodLpVariable> = Vec::with_capacity(problem.num_variables());

        for var_def in &problem.variables {
            let lower = var_def.lower_bound;
            let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);

            let var = if var_def.is_integer() {
                vars.add(variable().integer().min(lower).max(upper))
            } else {
                vars.add(variable().min(lower).max(upper))
            };
            lp_variables.push(var);
        }

        // good_lp minimizes, so negate for maximization
        let sign = match problem.objective.optimization_type {
            OptimizationType::Minimize => 1.0,
            OptimizationType::Maximize => -1.0,
        };
        let objective_terms: Vec<(usize, f64)> = merged_terms(&problem.objective.expression)
            .into_iter()
            .map(|(idx, coeff)| (idx, sign * coeff))
            .collect();
        let objective = to_expression(&lp_variables, &objective_terms);

        let mut lp_model = vars.minimise(objective).using(coin_cbc::coin_cbc);

        let config = &problem.solver_config;
        if let Some(limit) = config.time_limit {
            lp_model.set_parameter("seconds", &limit.to_string());
        }
        if let Some(level) = config.presolve {
            lp_model.set_parameter("presolve", presolve_setting(level)?);
        }
        if let Some(gap) = config.gap_tolerance {
            lp_model.set_parameter("ratioGap", &gap.to_string());
        }
        lp_model.set_parameter("logLevel", if config.verbose { "1" } else { "0" });

        for constraint in &problem.constraints {
            let lhs = to_expression(&lp_variables, &merged_terms(&constraint.expression));
            let rhs = constraint.rhs();

            lp_model = match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => lp_model.with(lhs.leq(rhs)),
                ConstraintType::Equal => lp_model.with(lhs.eq(rhs)),
                ConstraintType::GreaterThanOrEqual => lp_model.with(lhs.geq(rhs)),
            };
        }

        debug!(
            variables = statistics.num_variables,
            constraints = statistics.num_constraints,
            "starting CBC"
        );
        let solution_result = lp_model.solve();
        statistics.solve_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;

        match solution_result {
            Ok(sol) => {
                let variable_values: Vec<f64> =
                    lp_variables.iter().map(|&var| sol.value(var)).collect();
                let objective_value = problem.objective.evaluate(&variable_values);
                let quality = SolutionQuality::evaluate(problem, &variable_values);

                let model = sol.model();
                let (status, message) = if model.is_proven_optimal() {
                    (
                        DomainSolutionStatus::Optimal,
                        format!("Optimal solution found for '{}'", problem.name),
                    )
                } else if model.is_seconds_limit_reached() {
                    warn!(problem = %problem.name, "CBC stopped at the time limit");
                    (
                        DomainSolutionStatus::TimeLimit,
                        "Time limit reached; returning the best solution found".to_string(),
                    )
                } else {
                    (
                        DomainSolutionStatus::Feasible,
                        "Feasible solution found without proof of optimality".to_string(),
                    )
                };

                let mut solution = DomainSolution::optimal(objective_value, variable_values)
                    .with_statistics(statistics)
                    .with_quality(quality);
                solution.status = status;
                solution.message = message;
                Ok(solution)
            }
            Err(ResolutionError::Infeasible) => Ok(DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            )
            .with_statistics(statistics)),
            Err(ResolutionError::Unbounded) => Ok(DomainSolution::new(
                DomainSolutionStatus::Unbounded,
                "Problem is unbounded: objective can be improved infinitely",
            )
            .with_statistics(statistics)),
            Err(e) => Err(SolverError::ExecutionFailed(format!("{:?}", e))),
        }
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{LinearExpr, ObjectiveFunction, Variable, VariableId};

    #[test]
    fn presolve_levels_map_to_cbc_settings() {
        assert_eq!(presolve_setting(0).unwrap(), "off");
        assert_eq!(presolve_setting(2).unwrap(), "more");
        assert!(presolve_setting(3).is_err());
    }

    #[test]
    fn solves_small_knapsack() {
        // max 3a + 2b + 2c  s.t.  a + b + c <= 2
        let objective = ObjectiveFunction::maximize(LinearExpr::weighted_sum([
            (VariableId(0), 3.0),
            (VariableId(1), 2.0),
            (VariableId(2), 2.0),
        ]));
        let problem = OptimizationProblem::new(objective)
            .with_variables(vec![
                Variable::binary("a"),
                Variable::binary("b"),
                Variable::binary("c"),
            ])
            .add_constraint(LinearExpr::sum([VariableId(0), VariableId(1), VariableId(2)]).leq(2.0));

        let solution = CoinCbcSolver::new().solve(&problem).unwrap();
        assert!(solution.is_feasible());
        assert!((solution.optimal_value.unwrap() - 5.0).abs() < 1e-6);
        assert!(solution.is_selected(VariableId(0)));
    }
}
