// HiGHS adapter
// Builds a row-wise HiGHS model from the sparse domain problem, binaries as bounded integers

use crate::domain::{
    models::{OptimizationProblem, Solution as DomainSolution, SolutionQuality},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{ConstraintType, OptimizationType, SolutionStatus as DomainSolutionStatus},
};
use crate::solver::{merged_terms, objective_coefficients};
use highs::{HighsModelStatus, RowProblem, Sense};
use std::time::Instant;
use tracing::{debug, warn};

pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

fn presolve_setting(level: u8) -> Result<&'static str> {
    match level {
        0 => Ok("off"),
        1 => Ok("choose"),
        2 => Ok("on"),
        other => Err(SolverError::InvalidConfig(format!(
            "Presolve must be 0, 1, or 2 (got {})",
            other
        ))),
    }
}

impl SolverService for HighsSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<DomainSolution> {
        self.validate(problem)?;

        let start_time = Instant::now();
        let mut statistics = problem.statistics();

        // Use HiGHS RowProblem (add variables first, then constraints)
        let mut pb = RowProblem::default();
        let objective = objective_coefficients(problem);
        let mut columns = Vec::with_capacity(problem.num_variables());

        for (var_def, &obj_coeff) in problem.variables.iter().zip(&objective) {
            let lower = var_def.lower_bound;
            let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);

            let col = if var_def.is_integer() {
                pb.add_integer_column(obj_coeff, lower..=upper)
            } else {
                pb.add_column(obj_coeff, lower..=upper)
            };
            columns.push(col);
        }

        for constraint in &problem.constraints {
            let terms: Vec<_> = merged_terms(&constraint.expression)
                .into_iter()
                .map(|(idx, coeff)| (columns[idx], coeff))
                .collect();
            let rhs = constraint.rhs();

            match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => pb.add_row(..=rhs, &terms),
                ConstraintType::Equal => pb.add_row(rhs..=rhs, &terms),
                ConstraintType::GreaterThanOrEqual => pb.add_row(rhs.., &terms),
            }
        }

        let sense = match problem.objective.optimization_type {
            OptimizationType::Maximize => Sense::Maximise,
            OptimizationType::Minimize => Sense::Minimise,
        };

        let mut model = pb.optimise(sense);
        let config = &problem.solver_config;
        model.set_option("output_flag", config.verbose);
        if let Some(limit) = config.time_limit {
            model.set_option("time_limit", limit);
        }
        if let Some(level) = config.presolve {
            model.set_option("presolve", presolve_setting(level)?);
        }
        if let Some(gap) = config.gap_tolerance {
            model.set_option("mip_rel_gap", gap);
        }

        debug!(
            variables = statistics.num_variables,
            constraints = statistics.num_constraints,
            "starting HiGHS"
        );
        let solved = model.solve();
        statistics.solve_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;

        let with_values = |status: DomainSolutionStatus, message: String| {
            let variable_values = solved.get_solution().columns().to_vec();
            let objective_value = problem.objective.evaluate(&variable_values);
            let quality = SolutionQuality::evaluate(problem, &variable_values);
            let mut solution = DomainSolution::optimal(objective_value, variable_values)
                .with_statistics(statistics.clone())
                .with_quality(quality);
            solution.status = status;
            solution.message = message;
            solution
        };

        match solved.status() {
            HighsModelStatus::Optimal => Ok(with_values(
                DomainSolutionStatus::Optimal,
                format!("Optimal solution found for '{}'", problem.name),
            )),
            HighsModelStatus::ModelEmpty => Ok(DomainSolution::optimal(
                problem.objective.expression.constant,
                Vec::new(),
            )
            .with_statistics(statistics.clone())),
            HighsModelStatus::ReachedTimeLimit => {
                warn!(problem = %problem.name, "HiGHS stopped at the time limit");
                Ok(with_values(
                    DomainSolutionStatus::TimeLimit,
                    "Time limit reached; returning the best solution found".to_string(),
                ))
            }
            HighsModelStatus::ReachedIterationLimit => Ok(DomainSolution::new(
                DomainSolutionStatus::IterationLimit,
                "Iteration limit reached",
            )
            .with_statistics(statistics.clone())),
            HighsModelStatus::Infeasible => Ok(DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            )
            .with_statistics(statistics.clone())),
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                Ok(DomainSolution::new(
                    DomainSolutionStatus::Unbounded,
                    "Problem is unbounded: objective can be improved infinitely",
                )
                .with_statistics(statistics.clone()))
            }
            status => Err(SolverError::ExecutionFailed(format!(
                "HiGHS solver returned status: {:?}",
                status
            ))),
        }
    }

    fn name(&self) -> &str {
        "HiGHS"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
