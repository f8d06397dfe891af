// Infrastructure: logging setup, problem files and solution persistence

pub mod config;
pub mod logging;
pub mod persistence;

pub use config::ProblemConfig;
pub use persistence::write_solution;
