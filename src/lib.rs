// Domain layer: entities, solver-agnostic model and the solver contract
pub mod domain;

// Formulation layer: decision nodes, constraint and objective components, linking
pub mod formulation;

// Application layer: optimizer orchestration and solution reporting
pub mod application;

// Infrastructure layer: logging, problem files and solution persistence
pub mod infrastructure;

// Solver adapters: Concrete implementations of SolverService
pub mod solver;

pub mod error;

// Re-export commonly used types
pub use domain::{
    Constraint, ConstraintType, Contact, LinearExpr, ObjectiveFunction, OptimizationProblem,
    OptimizationType, OptimizationWindow, Provider, Satellite, Solution, SolutionStatus,
    SolverBackend, SolverConfig, SolverError, SolverService, Station, Variable, VariableId,
    VariableType,
};

pub use formulation::constraints::{
    ConstraintGenerator, ConstraintSpec, MaxAntennaUsage, MaxContactGap, MaxContactsPerPeriod,
    MaxOperationalCost, MaxProviders, MaxStations, MaxStationsPerProvider,
    MinConstellationDataDownlink, MinContactDuration, MinSatelliteDataDownlink,
    MinStationsPerProvider, RequireProvider, RequireStation, SatelliteContactExclusion,
    StationContactExclusion,
};
pub use formulation::{Objective, StationKey};

pub use application::{MilpOptimizer, OptimizerState, SolutionReport};
pub use error::{OptimizerError, Result};
pub use infrastructure::ProblemConfig;

#[cfg(feature = "cbc")]
pub use solver::CoinCbcSolver;
#[cfg(feature = "highs")]
pub use solver::HighsSolver;
pub use solver::SolverFactory;
