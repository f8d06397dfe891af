use serde::Serialize;

use super::{require_positive, ComponentDescription, ConstraintGenerator, GenerationContext};
use crate::domain::models::Constraint;
use crate::error::Result;
use crate::formulation::gap::{linearize, GapBound};

/// No satellite may go longer than `max_gap` seconds between consecutive scheduled contacts
#[derive(Debug, Clone, Serialize)]
pub struct MaxContactGap {
    max_gap: f64,
}

impl MaxContactGap {
    pub fn new(max_gap: f64) -> Result<Self> {
        require_positive("MaxContactGap", "max_gap", max_gap)?;
        Ok(Self { max_gap })
    }
}

impl ConstraintGenerator for MaxContactGap {
    fn name(&self) -> &'static str {
        "MaxContactGap"
    }

    fn describe(&self) -> ComponentDescription {
        ComponentDescription::of(self.name(), self)
    }

    fn generate(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Constraint>> {
        Ok(linearize(ctx.nodes, ctx.vars, GapBound::Fixed(self.max_gap)))
    }
}
