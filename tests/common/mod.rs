// Shared helpers for integration tests
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use gsopt::domain::entities::seconds;
use gsopt::domain::solver_service;
use gsopt::{
    ConstraintType, Contact, OptimizationProblem, OptimizationType, OptimizationWindow, Provider,
    Satellite, Solution, SolutionStatus, SolverError, SolverService, Station, VariableType,
};

pub fn at(secs: f64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() + seconds(secs)
}

pub fn window(opt_secs: f64, sim_secs: f64) -> OptimizationWindow {
    OptimizationWindow::from_durations(at(0.0), opt_secs, sim_secs).unwrap()
}

/// Exhaustive solver for small models
///
/// Enumerates every assignment of the integer variables. Continuous variables are set to
/// the smallest value their `≤` rows allow, which is optimal for models that only bound
/// them from below and minimize them (the worst-gap variable).
pub struct BruteForce;

pub const MAX_ENUMERATED: usize = 22;

impl BruteForce {
    /// Every feasible assignment, in enumeration order
    pub fn feasible(problem: &OptimizationProblem) -> Vec<Vec<f64>> {
        let mut found = Vec::new();
        enumerate(problem, |values| found.push(values.to_vec()));
        found
    }
}

fn enumerate(problem: &OptimizationProblem, mut visit: impl FnMut(&[f64])) {
    let integers: Vec<usize> = problem
        .variables
        .iter()
        .enumerate()
        .filter(|(_, v)| v.variable_type != VariableType::Continuous)
        .map(|(idx, _)| idx)
        .collect();
    assert!(
        integers.len() <= MAX_ENUMERATED,
        "{} integer variables is too many to enumerate",
        integers.len()
    );

    let mut values = vec![0.0; problem.num_variables()];
    for mask in 0u64..(1u64 << integers.len()) {
        for (bit, &idx) in integers.iter().enumerate() {
            values[idx] = ((mask >> bit) & 1) as f64;
        }
        settle_continuous(problem, &mut values);
        if problem.constraints.iter().all(|c| c.is_satisfied_by(&values)) {
            visit(&values);
        }
    }
}

fn settle_continuous(problem: &OptimizationProblem, values: &mut [f64]) {
    for (idx, var) in problem.variables.iter().enumerate() {
        if var.variable_type == VariableType::Continuous {
            values[idx] = var.lower_bound;
        }
    }
    for constraint in &problem.constraints {
        if constraint.constraint_type != ConstraintType::LessThanOrEqual {
            continue;
        }
        let continuous: Vec<_> = constraint
            .expression
            .terms
            .iter()
            .filter(|(v, c)| {
                *c < 0.0 && problem.variables[v.index()].variable_type == VariableType::Continuous
            })
            .collect();
        if let [(var, coeff)] = continuous.as_slice() {
            let rest = constraint.expression.evaluate(values) - coeff * values[var.index()];
            let needed = (rest - constraint.bound) / -coeff;
            if needed > values[var.index()] {
                values[var.index()] = needed;
            }
        }
    }
}

impl SolverService for BruteForce {
    fn solve(&self, problem: &OptimizationProblem) -> solver_service::Result<Solution> {
        self.validate(problem)?;
        let integers = problem
            .variables
            .iter()
            .filter(|v| v.variable_type != VariableType::Continuous)
            .count();
        if integers > MAX_ENUMERATED {
            return Err(SolverError::InvalidProblem(format!(
                "{} integer variables is too many to enumerate",
                integers
            )));
        }

        let maximize = problem.objective.optimization_type == OptimizationType::Maximize;
        let mut best: Option<(f64, Vec<f64>)> = None;
        enumerate(problem, |values| {
            let value = problem.objective.evaluate(values);
            let better = match &best {
                None => true,
                Some((incumbent, _)) if maximize => value > incumbent + 1e-9,
                Some((incumbent, _)) => value < incumbent - 1e-9,
            };
            if better {
                best = Some((value, values.to_vec()));
            }
        });

        Ok(match best {
            Some((value, values)) => Solution::optimal(value, values),
            None => Solution::new(SolutionStatus::Infeasible, "no feasible assignment"),
        })
    }

    fn name(&self) -> &str {
        "brute-force"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}

/// One provider "Azure" (`p-azure`) owning stations `gs-a` and `gs-b`
pub fn azure() -> (Provider, Station, Station) {
    let provider = Provider::new("p-azure", "azure").with_integration_cost(100.0);
    let a = Station::new("gs-a", "Alpha", "p-azure")
        .with_costs(10.0, 5.0, 30.0)
        .with_pass_pricing(2.0, 0.0)
        .with_datarate(1.0e3);
    let b = Station::new("gs-b", "Bravo", "p-azure")
        .with_costs(20.0, 5.0, 30.0)
        .with_pass_pricing(1.0, 0.0)
        .with_datarate(1.0e3);
    (provider, a, b)
}

pub fn satellite(id: &str) -> Satellite {
    Satellite::new(id, format!("9{}", id.len()), id.to_uppercase(), 1.0e3)
}

pub fn contact(id: &str, station: &Station, satellite: &Satellite, start: f64, end: f64) -> Contact {
    Contact::new(id, station, satellite, at(start), at(end))
}
