// Pluggable constraint components
// Each component validates its parameters on construction and emits its own constraint list

mod exclusion;
mod gap;
mod periodic;
mod selection;

pub use exclusion::{MaxAntennaUsage, SatelliteContactExclusion, StationContactExclusion};
pub use gap::MaxContactGap;
pub use periodic::{
    MaxContactsPerPeriod, MaxOperationalCost, MinConstellationDataDownlink,
    MinSatelliteDataDownlink, SlidingWindow,
};
pub use selection::{
    MaxProviders, MaxStations, MaxStationsPerProvider, MinContactDuration,
    MinStationsPerProvider, RequireProvider, RequireStation,
};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::entities::OptimizationWindow;
use crate::domain::models::Constraint;
use crate::error::{OptimizerError, Result};
use crate::formulation::nodes::{NodeSet, StationKey, VariableArena};

/// Inputs shared by every generator
pub struct GenerationContext<'a> {
    pub nodes: &'a NodeSet,
    pub window: &'a OptimizationWindow,
    /// Arena for auxiliary variables a component may need
    pub vars: &'a mut VariableArena,
}

/// Name and parameters of a component, as written to the solution report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentDescription {
    #[serde(rename = "type")]
    pub kind: String,
    pub args: serde_json::Value,
}

impl ComponentDescription {
    pub fn of<T: Serialize>(kind: &str, args: &T) -> Self {
        Self {
            kind: kind.to_string(),
            args: serde_json::to_value(args).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// A constraint component
pub trait ConstraintGenerator: fmt::Debug + Send + Sync {
    /// Component name used in logs and reports
    fn name(&self) -> &'static str;

    fn describe(&self) -> ComponentDescription;

    /// Emit this component's constraints for the given nodes
    fn generate(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Constraint>>;
}

/// Constraints generated by one component
#[derive(Debug, Clone)]
pub struct ConstraintBlock {
    pub component: ComponentDescription,
    pub constraints: Vec<Constraint>,
}

impl ConstraintBlock {
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

/// Declarative form of every constraint component, e.g. read from a TOML problem file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConstraintSpec {
    MinContactDuration {
        min_duration: f64,
    },
    MaxProviders {
        num_providers: usize,
    },
    MaxStations {
        num_stations: usize,
    },
    MinStationsPerProvider {
        num_stations: usize,
        #[serde(default)]
        provider: Option<String>,
    },
    MaxStationsPerProvider {
        num_stations: usize,
        #[serde(default)]
        provider: Option<String>,
    },
    RequireProvider {
        provider: String,
    },
    RequireStation {
        station: StationKey,
    },
    MinConstellationDataDownlink {
        value: f64,
        period: f64,
        step: f64,
    },
    MinSatelliteDataDownlink {
        value: f64,
        period: f64,
        step: f64,
        #[serde(default)]
        satellite: Option<String>,
    },
    MaxContactsPerPeriod {
        value: usize,
        period: f64,
        step: f64,
    },
    MaxOperationalCost {
        value: f64,
        #[serde(default)]
        period: Option<f64>,
    },
    StationContactExclusion,
    SatelliteContactExclusion,
    MaxAntennaUsage,
    MaxContactGap {
        max_gap: f64,
    },
}

impl ConstraintSpec {
    /// Run the validating constructor for this variant
    pub fn build(&self) -> Result<Box<dyn ConstraintGenerator>> {
        let generator: Box<dyn ConstraintGenerator> = match self {
            ConstraintSpec::MinContactDuration { min_duration } => {
                Box::new(MinContactDuration::new(*min_duration)?)
            }
            ConstraintSpec::MaxProviders { num_providers } => {
                Box::new(MaxProviders::new(*num_providers)?)
            }
            ConstraintSpec::MaxStations { num_stations } => {
                Box::new(MaxStations::new(*num_stations)?)
            }
            ConstraintSpec::MinStationsPerProvider {
                num_stations,
                provider,
            } => Box::new(MinStationsPerProvider::new(*num_stations, provider.clone())?),
            ConstraintSpec::MaxStationsPerProvider {
                num_stations,
                provider,
            } => Box::new(MaxStationsPerProvider::new(*num_stations, provider.clone())?),
            ConstraintSpec::RequireProvider { provider } => {
                Box::new(RequireProvider::new(provider.as_str())?)
            }
            ConstraintSpec::RequireStation { station } => {
                Box::new(RequireStation::new(station.clone())?)
            }
            ConstraintSpec::MinConstellationDataDownlink {
                value,
                period,
                step,
            } => Box::new(MinConstellationDataDownlink::new(*value, *period, *step)?),
            ConstraintSpec::MinSatelliteDataDownlink {
                value,
                period,
                step,
                satellite,
            } => {
                let constraint = MinSatelliteDataDownlink::new(*value, *period, *step)?;
                match satellite {
                    Some(key) => Box::new(constraint.for_satellite(key.as_str())),
                    None => Box::new(constraint),
                }
            }
            ConstraintSpec::MaxContactsPerPeriod {
                value,
                period,
                step,
            } => Box::new(MaxContactsPerPeriod::new(*value, *period, *step)?),
            ConstraintSpec::MaxOperationalCost { value, period } => {
                let constraint = MaxOperationalCost::new(*value)?;
                match period {
                    Some(period) => Box::new(constraint.over_period(*period)?),
                    None => Box::new(constraint),
                }
            }
            ConstraintSpec::StationContactExclusion => Box::new(StationContactExclusion),
            ConstraintSpec::SatelliteContactExclusion => Box::new(SatelliteContactExclusion),
            ConstraintSpec::MaxAntennaUsage => Box::new(MaxAntennaUsage),
            ConstraintSpec::MaxContactGap { max_gap } => Box::new(MaxContactGap::new(*max_gap)?),
        };
        Ok(generator)
    }
}

pub(crate) fn require_positive(component: &str, field: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(OptimizerError::config(format!(
            "{}: {} must be > 0 (got {})",
            component, field, value
        )))
    }
}

pub(crate) fn require_nonzero(component: &str, field: &str, value: usize) -> Result<()> {
    if value > 0 {
        Ok(())
    } else {
        Err(OptimizerError::config(format!(
            "{}: {} must be > 0",
            component, field
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_build_validates_parameters() {
        let bad = ConstraintSpec::MinConstellationDataDownlink {
            value: 1.0,
            period: 0.0,
            step: 10.0,
        };
        assert!(matches!(bad.build(), Err(OptimizerError::Config(_))));

        let good = ConstraintSpec::MaxContactsPerPeriod {
            value: 5,
            period: 86400.0,
            step: 300.0,
        };
        let generator = good.build().unwrap();
        assert_eq!(generator.name(), "MaxContactsPerPeriod");
        assert_eq!(generator.describe().args["value"], 5);
    }

    #[test]
    fn spec_deserializes_from_toml() {
        #[derive(Deserialize)]
        struct Doc {
            constraints: Vec<ConstraintSpec>,
        }

        let doc: Doc = toml::from_str(
            r#"
            [[constraints]]
            type = "MaxProviders"
            num_providers = 3

            [[constraints]]
            type = "RequireStation"
            station = { name = "Oregon", provider = "Aws" }

            [[constraints]]
            type = "SatelliteContactExclusion"
            "#,
        )
        .unwrap();

        assert_eq!(doc.constraints.len(), 3);
        assert_eq!(
            doc.constraints[1],
            ConstraintSpec::RequireStation {
                station: StationKey::Named {
                    name: "Oregon".to_string(),
                    provider: "Aws".to_string(),
                }
            }
        );
        assert!(doc.constraints.iter().all(|c| c.build().is_ok()));
    }
}
