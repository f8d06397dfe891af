// Application layer: the optimizer use case and its solution document

pub mod optimizer;
pub mod report;

pub use optimizer::{MilpOptimizer, OptimizerState, RuntimeStats};
pub use report::SolutionReport;
