// Declarative problem description read from TOML

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::models::SolverConfig;
use crate::error::{OptimizerError, Result};
use crate::formulation::constraints::{ConstraintGenerator, ConstraintSpec};
use crate::formulation::objectives::Objective;

/// Solver settings, objective and constraint components of one optimization run
///
/// ```toml
/// objective = { type = "MinCost" }
///
/// [solver]
/// backend = "highs"
/// time_limit = 60.0
///
/// [[constraints]]
/// type = "MaxProviders"
/// num_providers = 2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemConfig {
    #[serde(default)]
    pub solver: SolverConfig,
    pub objective: Objective,
    #[serde(default)]
    pub constraints: Vec<ConstraintSpec>,
}

impl ProblemConfig {
    pub fn new(objective: Objective) -> Self {
        Self {
            solver: SolverConfig::default(),
            objective,
            constraints: Vec::new(),
        }
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_constraint(mut self, constraint: ConstraintSpec) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Loads a problem description from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses a problem description from a TOML string and validates the solver settings.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let errors = self.solver.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(OptimizerError::config(errors.join("; ")))
        }
    }

    /// Instantiate every constraint component, failing on the first invalid one
    pub fn build_constraints(&self) -> Result<Vec<Box<dyn ConstraintGenerator>>> {
        self.constraints.iter().map(ConstraintSpec::build).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::SolverBackend;

    #[test]
    fn parses_full_problem() {
        let config = ProblemConfig::from_toml_str(
            r#"
            objective = { type = "MaxDataDownlink" }

            [solver]
            backend = "cbc"
            time_limit = 120.0
            presolve = 2

            [[constraints]]
            type = "MaxOperationalCost"
            value = 50000.0

            [[constraints]]
            type = "MinSatelliteDataDownlink"
            value = 1.0e9
            period = 86400.0
            step = 3600.0
            satellite = "ISS"

            [[constraints]]
            type = "MaxAntennaUsage"
            "#,
        )
        .unwrap();

        assert_eq!(config.objective, Objective::MaxDataDownlink);
        assert_eq!(config.solver.backend, SolverBackend::CoinCbc);
        assert_eq!(config.solver.presolve, Some(2));
        let names: Vec<_> = config
            .build_constraints()
            .unwrap()
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(
            names,
            vec!["MaxOperationalCost", "MinSatelliteDataDownlink", "MaxAntennaUsage"]
        );
    }

    #[test]
    fn solver_section_is_optional() {
        let config = ProblemConfig::from_toml_str("objective = { type = \"MinCost\" }").unwrap();
        assert_eq!(config.solver.backend, SolverBackend::Auto);
        assert!(config.constraints.is_empty());
    }

    #[test]
    fn rejects_bad_presolve_level() {
        let err = ProblemConfig::from_toml_str(
            r#"
            objective = { type = "MinCost" }
            [solver]
            presolve = 3
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, OptimizerError::Config(_)));
    }

    #[test]
    fn invalid_component_surfaces_on_build() {
        let config = ProblemConfig::new(Objective::MinCost)
            .with_constraint(ConstraintSpec::MaxStations { num_stations: 0 });
        assert!(config.build_constraints().is_err());
    }

    #[test]
    fn unknown_component_type_is_parse_error() {
        let err = ProblemConfig::from_toml_str(
            r#"
            objective = { type = "MinCost" }
            [[constraints]]
            type = "TeleportSatellite"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, OptimizerError::Toml(_)));
    }
}
