// Domain service interface for solving optimization problems
// Any MILP backend plugs in behind this contract

use super::models::{OptimizationProblem, Solution};

/// Error types for the solver service
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Invalid solver configuration: {0}")]
    InvalidConfig(String),

    #[error("Solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// Domain service interface for optimization solvers
///
/// Backends translate an [`OptimizationProblem`] into their own model, solve it, and
/// report the termination status and variable assignment.
pub trait SolverService: Send + Sync {
    /// Solve an optimization problem
    fn solve(&self, problem: &OptimizationProblem) -> Result<Solution>;

    /// Validate a problem without solving it
    fn validate(&self, problem: &OptimizationProblem) -> Result<()> {
        let config_errors = problem.solver_config.validate();
        if !config_errors.is_empty() {
            return Err(SolverError::InvalidConfig(config_errors.join("; ")));
        }

        let mut errors = Vec::new();
        let num_vars = problem.num_variables();

        // Every referenced variable must exist
        for (var, _) in &problem.objective.expression.terms {
            if var.index() >= num_vars {
                errors.push(format!("Objective references unknown variable {}", var));
            }
        }

        for (i, constraint) in problem.constraints.iter().enumerate() {
            for (var, coeff) in &constraint.expression.terms {
                if var.index() >= num_vars {
                    errors.push(format!(
                        "Constraint {} '{}' references unknown variable {}",
                        i, constraint.name, var
                    ));
                }
                if !coeff.is_finite() {
                    errors.push(format!(
                        "Constraint {} '{}' has non-finite coefficient for {}",
                        i, constraint.name, var
                    ));
                }
            }
            if !constraint.bound.is_finite() {
                errors.push(format!(
                    "Constraint {} '{}' has non-finite bound",
                    i, constraint.name
                ));
            }
        }

        // Check variable bounds
        for (i, var) in problem.variables.iter().enumerate() {
            if let Some(upper) = var.upper_bound {
                if var.lower_bound > upper {
                    errors.push(format!(
                        "Variable {} '{}' has lower bound ({}) > upper bound ({})",
                        i, var.name, var.lower_bound, upper
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SolverError::InvalidProblem(errors.join("; ")))
        }
    }

    /// Get the name of this solver backend
    fn name(&self) -> &str;

    /// Check if this solver supports mixed-integer programming
    fn supports_mip(&self) -> bool;
}
