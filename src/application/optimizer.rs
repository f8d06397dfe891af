// Optimizer orchestrator
// Owns the entity catalog and the registered components, assembles the model and runs the solver

use std::fmt;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::domain::entities::{Contact, OptimizationWindow, Provider, Satellite, Station};
use crate::domain::models::{Constraint, OptimizationProblem, Solution, SolverConfig};
use crate::domain::solver_service::SolverService;
use crate::domain::value_objects::SolutionStatus;
use crate::error::{OptimizerError, Result};
use crate::formulation::constraints::{ConstraintBlock, ConstraintGenerator, GenerationContext};
use crate::formulation::linking;
use crate::formulation::nodes::{Catalog, NodeCounts, NodeSet, VariableArena};
use crate::formulation::objectives::{Objective, ObjectiveBlock};
use crate::infrastructure::config::ProblemConfig;
use crate::infrastructure::persistence;

/// Lifecycle of an optimizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OptimizerState {
    Empty,
    NodesBuilt,
    ProblemGenerated,
    Solved,
}

impl fmt::Display for OptimizerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizerState::Empty => write!(f, "Empty"),
            OptimizerState::NodesBuilt => write!(f, "Nodes Built"),
            OptimizerState::ProblemGenerated => write!(f, "Problem Generated"),
            OptimizerState::Solved => write!(f, "Solved"),
        }
    }
}

/// Wall-clock breakdown in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RuntimeStats {
    pub contact_compute_time: f64,
    pub problem_setup_time: f64,
    pub solve_time: f64,
}

/// Everything produced by one `generate_problem` call
#[derive(Debug)]
struct GeneratedModel {
    constraint_blocks: Vec<ConstraintBlock>,
    objective: ObjectiveBlock,
    linking: Vec<Constraint>,
    problem: OptimizationProblem,
}

/// Ground station selection and scheduling problem builder
///
/// Entities are registered first, then the objective and constraint components. The model
/// is assembled in a fixed order: constraint components, the objective, then the linking
/// rows. Changing the catalog or the components discards any generated model.
pub struct MilpOptimizer {
    window: OptimizationWindow,
    solver_config: SolverConfig,
    catalog: Catalog,
    objective: Option<Objective>,
    constraints: Vec<Box<dyn ConstraintGenerator>>,
    vars: VariableArena,
    nodes: Option<NodeSet>,
    model: Option<GeneratedModel>,
    solution: Option<Solution>,
    runtime: RuntimeStats,
}

impl MilpOptimizer {
    pub fn new(window: OptimizationWindow) -> Self {
        Self {
            window,
            solver_config: SolverConfig::default(),
            catalog: Catalog::new(),
            objective: None,
            constraints: Vec::new(),
            vars: VariableArena::new(),
            nodes: None,
            model: None,
            solution: None,
            runtime: RuntimeStats::default(),
        }
    }

    pub fn with_solver_config(mut self, config: SolverConfig) -> Self {
        self.set_solver_config(config);
        self
    }

    /// Optimizer set up from a declarative problem description
    pub fn from_config(window: OptimizationWindow, config: &ProblemConfig) -> Result<Self> {
        config.validate()?;
        let mut optimizer = Self::new(window).with_solver_config(config.solver.clone());
        optimizer.set_objective(config.objective);
        optimizer.add_constraints(config.build_constraints()?);
        Ok(optimizer)
    }

    // Catalog

    pub fn add_provider(&mut self, provider: Provider) {
        self.catalog.add_provider(provider);
        self.invalidate_nodes();
    }

    pub fn add_station(&mut self, station: Station) {
        self.catalog.add_station(station);
        self.invalidate_nodes();
    }

    pub fn add_satellite(&mut self, satellite: Satellite) {
        self.catalog.add_satellite(satellite);
        self.invalidate_nodes();
    }

    pub fn add_contact(&mut self, contact: Contact) {
        self.catalog.add_contact(contact);
        self.invalidate_nodes();
    }

    pub fn add_contacts(&mut self, contacts: impl IntoIterator<Item = Contact>) {
        for contact in contacts {
            self.catalog.add_contact(contact);
        }
        self.invalidate_nodes();
    }

    /// Record how long the external contact computation took, in seconds
    pub fn set_contact_compute_time(&mut self, seconds: f64) {
        self.runtime.contact_compute_time = seconds;
    }

    // Components

    /// Replace the objective; any previously generated model is discarded
    pub fn set_objective(&mut self, objective: Objective) {
        if let Some(previous) = self.objective.replace(objective) {
            if previous != objective {
                warn!(
                    previous = previous.name(),
                    objective = objective.name(),
                    "replacing objective"
                );
            }
        }
        self.invalidate_model();
    }

    pub fn add_constraint(&mut self, constraint: Box<dyn ConstraintGenerator>) {
        debug!(component = constraint.name(), "registered constraint component");
        self.constraints.push(constraint);
        self.invalidate_model();
    }

    pub fn add_constraints(&mut self, constraints: impl IntoIterator<Item = Box<dyn ConstraintGenerator>>) {
        for constraint in constraints {
            self.add_constraint(constraint);
        }
    }

    /// Solver settings; they apply to the next solve without regenerating the model
    pub fn set_solver_config(&mut self, config: SolverConfig) {
        if let Some(model) = self.model.as_mut() {
            model.problem.solver_config = config.clone();
        }
        self.solver_config = config;
    }

    // Lifecycle

    pub fn state(&self) -> OptimizerState {
        if self.solution.is_some() {
            OptimizerState::Solved
        } else if self.model.is_some() {
            OptimizerState::ProblemGenerated
        } else if self.nodes.is_some() {
            OptimizerState::NodesBuilt
        } else {
            OptimizerState::Empty
        }
    }

    /// Create one decision variable per registered entity
    pub fn generate_nodes(&mut self) -> Result<&NodeSet> {
        self.invalidate_nodes();
        let mut vars = VariableArena::new();
        let nodes = NodeSet::generate(&self.catalog, &mut vars)?;
        self.vars = vars;
        Ok(self.nodes.insert(nodes))
    }

    /// Assemble the complete model from fresh nodes
    pub fn generate_problem(&mut self) -> Result<&OptimizationProblem> {
        let objective = self.objective.ok_or(OptimizerError::ObjectiveNotSet)?;

        info!(
            providers = self.catalog.providers.len(),
            stations = self.catalog.stations.len(),
            satellites = self.catalog.satellites.len(),
            contacts = self.catalog.contacts.len(),
            "generating MILP problem"
        );
        let start = Instant::now();

        self.generate_nodes()?;
        let nodes = self
            .nodes
            .as_ref()
            .ok_or_else(|| OptimizerError::InvalidState("nodes missing after generation".into()))?;
        let mut ctx = GenerationContext {
            nodes,
            window: &self.window,
            vars: &mut self.vars,
        };

        let mut constraint_blocks = Vec::with_capacity(self.constraints.len());
        for component in &self.constraints {
            let constraints = component.generate(&mut ctx)?;
            debug!(
                component = component.name(),
                constraints = constraints.len(),
                "generated constraint component"
            );
            constraint_blocks.push(ConstraintBlock {
                component: component.describe(),
                constraints,
            });
        }

        let objective_block = objective.generate(&mut ctx)?;
        let linking = linking::generate(nodes);

        let constraints: Vec<Constraint> = constraint_blocks
            .iter()
            .flat_map(|block| block.constraints.iter().cloned())
            .chain(objective_block.constraints.iter().cloned())
            .chain(linking.iter().cloned())
            .collect();

        let problem = OptimizationProblem::new(objective_block.objective.clone())
            .with_name("ground-station-selection")
            .with_description(format!(
                "{} with {} constraint components",
                objective.name(),
                self.constraints.len()
            ))
            .with_variables(self.vars.as_slice().to_vec())
            .with_constraints(constraints)
            .with_config(self.solver_config.clone());

        self.runtime.problem_setup_time = start.elapsed().as_secs_f64();
        info!(
            variables = problem.num_variables(),
            constraints = problem.constraints.len(),
            elapsed_s = self.runtime.problem_setup_time,
            "finished generating MILP problem"
        );

        let model = self.model.insert(GeneratedModel {
            constraint_blocks,
            objective: objective_block,
            linking,
            problem,
        });
        Ok(&model.problem)
    }

    /// Solve with the backend selected by the solver configuration
    pub fn solve(&mut self) -> Result<&Solution> {
        let solver = crate::solver::SolverFactory::create_from_backend(self.solver_config.backend)?;
        self.solve_with(solver.as_ref())
    }

    /// Solve with an explicit backend
    ///
    /// Generates the model on first use only; repeated calls re-run the solver step. Solver
    /// failures are logged and recorded as an `Error` status instead of being returned.
    pub fn solve_with(&mut self, solver: &dyn SolverService) -> Result<&Solution> {
        if self.model.is_none() {
            self.generate_problem()?;
        }
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| OptimizerError::InvalidState("no generated problem".into()))?;

        info!(solver = solver.name(), "solving MILP problem");
        let start = Instant::now();
        let solution = match solver.solve(&model.problem) {
            Ok(solution) => solution,
            Err(e) => {
                error!(solver = solver.name(), error = %e, "solver error");
                let mut failed = Solution::new(SolutionStatus::Error, e.to_string());
                failed.statistics = model.problem.statistics();
                failed
            }
        };
        self.runtime.solve_time = start.elapsed().as_secs_f64();

        info!(
            status = %solution.status,
            objective = ?solution.optimal_value,
            elapsed_s = self.runtime.solve_time,
            "solved MILP problem"
        );
        Ok(self.solution.insert(solution))
    }

    /// Persist the solution report as JSON; requires a solved model
    pub fn write_solution(&self, path: impl AsRef<Path>) -> Result<()> {
        let report = self.solution_report()?;
        persistence::write_solution(&report, path)
    }

    // Accessors

    pub fn window(&self) -> &OptimizationWindow {
        &self.window
    }

    pub fn solver_config(&self) -> &SolverConfig {
        &self.solver_config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn objective(&self) -> Option<Objective> {
        self.objective
    }

    pub fn constraint_components(&self) -> &[Box<dyn ConstraintGenerator>] {
        &self.constraints
    }

    pub fn nodes(&self) -> Option<&NodeSet> {
        self.nodes.as_ref()
    }

    pub fn node_counts(&self) -> NodeCounts {
        self.nodes.as_ref().map(NodeSet::counts).unwrap_or_default()
    }

    pub fn problem(&self) -> Option<&OptimizationProblem> {
        self.model.as_ref().map(|m| &m.problem)
    }

    pub fn constraint_blocks(&self) -> &[ConstraintBlock] {
        self.model
            .as_ref()
            .map(|m| m.constraint_blocks.as_slice())
            .unwrap_or_default()
    }

    pub fn objective_block(&self) -> Option<&ObjectiveBlock> {
        self.model.as_ref().map(|m| &m.objective)
    }

    pub fn linking_constraints(&self) -> &[Constraint] {
        self.model
            .as_ref()
            .map(|m| m.linking.as_slice())
            .unwrap_or_default()
    }

    pub fn num_variables(&self) -> usize {
        self.problem().map_or(0, OptimizationProblem::num_variables)
    }

    pub fn num_constraints(&self) -> usize {
        self.problem().map_or(0, |p| p.constraints.len())
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    pub fn runtime(&self) -> RuntimeStats {
        self.runtime
    }

    fn invalidate_nodes(&mut self) {
        self.nodes = None;
        self.invalidate_model();
    }

    fn invalidate_model(&mut self) {
        self.model = None;
        self.solution = None;
    }
}

impl fmt::Display for MilpOptimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self
            .solution
            .as_ref()
            .map_or("Not Solved".to_string(), |s| s.status.to_string());
        write!(
            f,
            "<MilpOptimizer - {}: {} satellites, {} providers, {} stations, {} contacts",
            status,
            self.catalog.satellites.len(),
            self.catalog.providers.len(),
            self.catalog.stations.len(),
            self.catalog.contacts.len()
        )?;
        if let Some(model) = &self.model {
            write!(
                f,
                ", {} variables, {} constraints",
                model.problem.num_variables(),
                model.problem.constraints.len()
            )?;
        }
        write!(f, ">")
    }
}

impl fmt::Debug for MilpOptimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MilpOptimizer")
            .field("state", &self.state())
            .field("window", &self.window)
            .field("objective", &self.objective)
            .field("constraints", &self.constraints)
            .field("counts", &self.node_counts())
            .finish()
    }
}
