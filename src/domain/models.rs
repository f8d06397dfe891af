use super::value_objects::{
    ConstraintType, OptimizationType, SolutionStatus, SolverBackend, VariableType,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance used when reading binary decisions and checking feasibility
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// Index of a variable inside an [`OptimizationProblem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariableId(pub usize);

impl VariableId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Decision variable in an optimization problem
#[derive(Debug, Clone)]
pub struct Variable {
    pub variable_type: VariableType,
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
    pub name: String,
}

impl Variable {
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Continuous,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Integer,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Binary,
            lower_bound: 0.0,
            upper_bound: Some(1.0),
            name: name.into(),
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: Option<f64>) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.variable_type,
            VariableType::Integer | VariableType::Binary
        )
    }
}

/// Sparse linear expression `Σ coeff·x + constant`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<(VariableId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn term(var: VariableId, coefficient: f64) -> Self {
        Self {
            terms: vec![(var, coefficient)],
            constant: 0.0,
        }
    }

    /// Unit-weighted sum of variables
    pub fn sum<I: IntoIterator<Item = VariableId>>(vars: I) -> Self {
        Self::weighted_sum(vars.into_iter().map(|v| (v, 1.0)))
    }

    pub fn weighted_sum<I: IntoIterator<Item = (VariableId, f64)>>(terms: I) -> Self {
        Self {
            terms: terms.into_iter().collect(),
            constant: 0.0,
        }
    }

    pub fn add_term(&mut self, var: VariableId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    pub fn with_term(mut self, var: VariableId, coefficient: f64) -> Self {
        self.add_term(var, coefficient);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coeff)| coeff * values.get(var.index()).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }

    pub fn leq(self, bound: f64) -> Constraint {
        Constraint::new(ConstraintType::LessThanOrEqual, self, bound)
    }

    pub fn geq(self, bound: f64) -> Constraint {
        Constraint::new(ConstraintType::GreaterThanOrEqual, self, bound)
    }

    pub fn eq(self, bound: f64) -> Constraint {
        Constraint::new(ConstraintType::Equal, self, bound)
    }
}

/// Objective function to minimize or maximize
#[derive(Debug, Clone)]
pub struct ObjectiveFunction {
    pub optimization_type: OptimizationType,
    pub expression: LinearExpr,
}

impl ObjectiveFunction {
    pub fn new(optimization_type: OptimizationType, expression: LinearExpr) -> Self {
        Self {
            optimization_type,
            expression,
        }
    }

    pub fn minimize(expression: LinearExpr) -> Self {
        Self::new(OptimizationType::Minimize, expression)
    }

    pub fn maximize(expression: LinearExpr) -> Self {
        Self::new(OptimizationType::Maximize, expression)
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.expression.evaluate(values)
    }
}

/// Linear constraint `expression <relation> bound`
#[derive(Debug, Clone)]
pub struct Constraint {
    pub constraint_type: ConstraintType,
    pub expression: LinearExpr,
    pub bound: f64,
    pub name: String,
}

impl Constraint {
    pub fn new(constraint_type: ConstraintType, expression: LinearExpr, bound: f64) -> Self {
        Self {
            constraint_type,
            expression,
            bound,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn num_terms(&self) -> usize {
        self.expression.terms.len()
    }

    /// Right-hand side once the expression constant is moved across
    pub fn rhs(&self) -> f64 {
        self.bound - self.expression.constant
    }

    /// Amount by which `values` violates the constraint (0 when satisfied)
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.expression.evaluate(values);
        match self.constraint_type {
            ConstraintType::LessThanOrEqual => (lhs - self.bound).max(0.0),
            ConstraintType::GreaterThanOrEqual => (self.bound - lhs).max(0.0),
            ConstraintType::Equal => (lhs - self.bound).abs(),
        }
    }

    pub fn is_satisfied_by(&self, values: &[f64]) -> bool {
        self.violation(values) <= FEASIBILITY_TOLERANCE
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.name.is_empty() {
            write!(f, "{}: ", self.name)?;
        }
        if self.expression.is_empty() {
            write!(f, "0")?;
        }
        for (i, (var, coeff)) in self.expression.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{}*{}", coeff, var)?;
        }
        if self.expression.constant != 0.0 {
            write!(f, " + {}", self.expression.constant)?;
        }
        write!(f, " {} {}", self.constraint_type, self.bound)
    }
}

/// Configuration for the solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    /// Wall-clock limit in seconds, forwarded to the backend
    pub time_limit: Option<f64>,
    /// Presolve level: 0 = off, 1 = automatic, 2 = aggressive
    pub presolve: Option<u8>,
    pub gap_tolerance: Option<f64>,
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Auto,
            time_limit: None,
            presolve: None,
            gap_tolerance: None,
            verbose: false,
        }
    }
}

impl SolverConfig {
    pub fn with_backend(mut self, backend: SolverBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    pub fn with_presolve(mut self, level: u8) -> Self {
        self.presolve = Some(level);
        self
    }

    pub fn with_gap_tolerance(mut self, gap: f64) -> Self {
        self.gap_tolerance = Some(gap);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check the tuning knobs, returning a description of each problem found
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(level) = self.presolve {
            if level > 2 {
                errors.push(format!("Presolve must be 0, 1, or 2 (got {})", level));
            }
        }
        if let Some(limit) = self.time_limit {
            if !(limit > 0.0) {
                errors.push(format!("Time limit must be positive (got {})", limit));
            }
        }
        if let Some(gap) = self.gap_tolerance {
            if !(gap >= 0.0) {
                errors.push(format!("Gap tolerance must be non-negative (got {})", gap));
            }
        }

        errors
    }
}

/// Complete optimization problem
#[derive(Debug, Clone)]
pub struct OptimizationProblem {
    pub name: String,
    pub description: String,
    pub objective: ObjectiveFunction,
    pub constraints: Vec<Constraint>,
    pub variables: Vec<Variable>,
    pub solver_config: SolverConfig,
}

impl OptimizationProblem {
    pub fn new(objective: ObjectiveFunction) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            objective,
            constraints: Vec::new(),
            variables: Vec::new(),
            solver_config: SolverConfig::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn add_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_variables(mut self, variables: Vec<Variable>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.solver_config = config;
        self
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.is_integer()).count()
    }

    pub fn num_binary_variables(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| v.variable_type == VariableType::Binary)
            .count()
    }

    pub fn is_mixed_integer(&self) -> bool {
        self.num_integer_variables() > 0
    }

    pub fn statistics(&self) -> SolverStatistics {
        let num_binary = self.num_binary_variables();
        SolverStatistics {
            solve_time_ms: 0.0,
            num_variables: self.num_variables() as u32,
            num_constraints: self.constraints.len() as u32,
            num_integer_vars: (self.num_integer_variables() - num_binary) as u32,
            num_binary_vars: num_binary as u32,
        }
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default, Serialize)]
pub struct SolverStatistics {
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_integer_vars: u32,
    pub num_binary_vars: u32,
}

/// Quality metrics for the solution
#[derive(Debug, Clone, Default, Serialize)]
pub struct SolutionQuality {
    pub max_constraint_violation: f64,
    pub max_integrality_violation: f64,
}

impl SolutionQuality {
    pub fn evaluate(problem: &OptimizationProblem, values: &[f64]) -> Self {
        let max_constraint_violation = problem
            .constraints
            .iter()
            .map(|c| c.violation(values))
            .fold(0.0, f64::max);

        let max_integrality_violation = problem
            .variables
            .iter()
            .zip(values)
            .filter(|(var, _)| var.is_integer())
            .map(|(_, value)| (value - value.round()).abs())
            .fold(0.0, f64::max);

        Self {
            max_constraint_violation,
            max_integrality_violation,
        }
    }
}

/// Solution to an optimization problem
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    pub optimal_value: Option<f64>,
    pub variable_values: Vec<f64>,
    pub message: String,
    pub statistics: SolverStatistics,
    pub quality: SolutionQuality,
}

impl Solution {
    pub fn new(status: SolutionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            optimal_value: None,
            variable_values: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
            quality: SolutionQuality::default(),
        }
    }

    pub fn optimal(value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            optimal_value: Some(value),
            variable_values,
            message: "Optimal solution found".to_string(),
            statistics: SolverStatistics::default(),
            quality: SolutionQuality::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_quality(mut self, quality: SolutionQuality) -> Self {
        self.quality = quality;
        self
    }

    /// Value assigned to `var`, or 0 when the solve produced no values
    pub fn value(&self, var: VariableId) -> f64 {
        self.variable_values.get(var.index()).copied().unwrap_or(0.0)
    }

    /// Binary decision read-back
    pub fn is_selected(&self, var: VariableId) -> bool {
        self.value(var) > 0.5
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub fn is_feasible(&self) -> bool {
        matches!(
            self.status,
            SolutionStatus::Optimal | SolutionStatus::Feasible
        )
    }
}
