use crate::domain::{
    models::OptimizationProblem,
    solver_service::{Result, SolverService},
    value_objects::SolverBackend,
};
#[cfg(feature = "cbc")]
use crate::solver::CoinCbcSolver;
#[cfg(feature = "highs")]
use crate::solver::HighsSolver;
use std::sync::Arc;

/// Factory for creating solver instances based on configuration
pub struct SolverFactory;

impl SolverFactory {
    /// Create a solver based on the problem configuration
    pub fn create_solver(problem: &OptimizationProblem) -> Result<Arc<dyn SolverService>> {
        Self::create_from_backend(problem.solver_config.backend)
    }

    /// Create a solver for a specific backend
    ///
    /// `Auto` prefers HiGHS and falls back to CBC. Backends not compiled into this build
    /// are reported as unavailable.
    pub fn create_from_backend(backend: SolverBackend) -> Result<Arc<dyn SolverService>> {
        match backend {
            SolverBackend::Auto => Self::default_solver(),
            SolverBackend::CoinCbc => Self::cbc(),
            SolverBackend::Highs => Self::highs(),
        }
    }

    /// Get the default solver (HiGHS when available)
    pub fn default_solver() -> Result<Arc<dyn SolverService>> {
        Self::highs().or_else(|_| Self::cbc())
    }

    /// Backends compiled into this build
    pub fn available_backends() -> Vec<SolverBackend> {
        let mut backends = Vec::new();
        if cfg!(feature = "cbc") {
            backends.push(SolverBackend::CoinCbc);
        }
        if cfg!(feature = "highs") {
            backends.push(SolverBackend::Highs);
        }
        backends
    }

    #[cfg(feature = "cbc")]
    fn cbc() -> Result<Arc<dyn SolverService>> {
        Ok(Arc::new(CoinCbcSolver::new()))
    }

    #[cfg(not(feature = "cbc"))]
    fn cbc() -> Result<Arc<dyn SolverService>> {
        Err(crate::domain::SolverError::SolverNotAvailable(
            "COIN-OR CBC (enable the `cbc` feature)".to_string(),
        ))
    }

    #[cfg(feature = "highs")]
    fn highs() -> Result<Arc<dyn SolverService>> {
        Ok(Arc::new(HighsSolver::new()))
    }

    #[cfg(not(feature = "highs"))]
    fn highs() -> Result<Arc<dyn SolverService>> {
        Err(crate::domain::SolverError::SolverNotAvailable(
            "HiGHS (enable the `highs` feature)".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SolverError;

    #[test]
    fn auto_matches_available_backends() {
        let available = SolverFactory::available_backends();
        let auto = SolverFactory::create_from_backend(SolverBackend::Auto);
        assert_eq!(auto.is_ok(), !available.is_empty());
    }

    #[cfg(not(feature = "highs"))]
    #[test]
    fn missing_backend_is_reported() {
        let err = SolverFactory::create_from_backend(SolverBackend::Highs).err().unwrap();
        assert!(matches!(err, SolverError::SolverNotAvailable(_)));
    }

    #[cfg(feature = "highs")]
    #[test]
    fn auto_prefers_highs() {
        let solver = SolverFactory::create_from_backend(SolverBackend::Auto).unwrap();
        assert_eq!(solver.name(), "HiGHS");
    }
}
