// Domain module: entities, solver-agnostic model and the solver contract

pub mod entities;
pub mod models;
pub mod solver_service;
pub mod value_objects;

pub use entities::*;
pub use models::*;
pub use solver_service::*;
pub use value_objects::*;
