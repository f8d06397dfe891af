pub mod constraints;
pub mod gap;
pub mod linking;
pub mod nodes;
pub mod objectives;

pub use constraints::{
    ComponentDescription, ConstraintBlock, ConstraintGenerator, ConstraintSpec, GenerationContext,
};
pub use gap::GapBound;
pub use nodes::{
    Catalog, ContactNode, NodeCounts, NodeSet, ProviderNode, SatelliteNode, StationKey,
    StationNode, StationSatelliteKey, VariableArena,
};
pub use objectives::{Objective, ObjectiveBlock};
