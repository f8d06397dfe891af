// Count limits, hard requirements and per-contact filters

use serde::Serialize;

use super::{require_nonzero, require_positive, ComponentDescription, ConstraintGenerator, GenerationContext};
use crate::domain::models::{Constraint, LinearExpr};
use crate::error::{OptimizerError, Result};
use crate::formulation::nodes::{StationKey, StationNode};

/// Contacts shorter than `min_duration` seconds may not be scheduled
#[derive(Debug, Clone, Serialize)]
pub struct MinContactDuration {
    min_duration: f64,
}

impl MinContactDuration {
    pub fn new(min_duration: f64) -> Result<Self> {
        require_positive("MinContactDuration", "min_duration", min_duration)?;
        Ok(Self { min_duration })
    }
}

impl ConstraintGenerator for MinContactDuration {
    fn name(&self) -> &'static str {
        "MinContactDuration"
    }

    fn describe(&self) -> ComponentDescription {
        ComponentDescription::of(self.name(), self)
    }

    fn generate(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Constraint>> {
        Ok(ctx
            .nodes
            .contacts
            .values()
            .filter(|cn| cn.contact.t_duration < self.min_duration)
            .map(|cn| {
                LinearExpr::term(cn.var, 1.0)
                    .leq(0.0)
                    .with_name(format!("min_duration[{}]", cn.id()))
            })
            .collect())
    }
}

/// At most `num_providers` providers may be selected
#[derive(Debug, Clone, Serialize)]
pub struct MaxProviders {
    num_providers: usize,
}

impl MaxProviders {
    pub fn new(num_providers: usize) -> Result<Self> {
        require_nonzero("MaxProviders", "num_providers", num_providers)?;
        Ok(Self { num_providers })
    }
}

impl ConstraintGenerator for MaxProviders {
    fn name(&self) -> &'static str {
        "MaxProviders"
    }

    fn describe(&self) -> ComponentDescription {
        ComponentDescription::of(self.name(), self)
    }

    fn generate(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Constraint>> {
        let expr = LinearExpr::sum(ctx.nodes.providers.values().map(|pn| pn.var));
        Ok(vec![expr
            .leq(self.num_providers as f64)
            .with_name("max_providers")])
    }
}

/// At most `num_stations` stations may be selected
#[derive(Debug, Clone, Serialize)]
pub struct MaxStations {
    num_stations: usize,
}

impl MaxStations {
    pub fn new(num_stations: usize) -> Result<Self> {
        require_nonzero("MaxStations", "num_stations", num_stations)?;
        Ok(Self { num_stations })
    }
}

impl ConstraintGenerator for MaxStations {
    fn name(&self) -> &'static str {
        "MaxStations"
    }

    fn describe(&self) -> ComponentDescription {
        ComponentDescription::of(self.name(), self)
    }

    fn generate(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Constraint>> {
        let expr = LinearExpr::sum(ctx.nodes.stations.values().map(|sn| sn.var));
        Ok(vec![expr
            .leq(self.num_stations as f64)
            .with_name("max_stations")])
    }
}

// Stations of either one provider (resolved by key) or of every provider
fn provider_groups<'a>(
    ctx: &'a GenerationContext<'_>,
    provider: Option<&str>,
) -> Result<Vec<(&'a str, Vec<&'a StationNode>)>> {
    let mut groups = ctx.nodes.stations_by_provider();
    match provider {
        Some(key) => {
            let id = ctx.nodes.find_provider(key)?.provider.id.as_str();
            Ok(vec![(id, groups.remove(id).unwrap_or_default())])
        }
        None => Ok(ctx
            .nodes
            .providers
            .keys()
            .map(|id| (id.as_str(), groups.remove(id.as_str()).unwrap_or_default()))
            .collect()),
    }
}

/// A selected provider must contribute at least `num_stations` stations
#[derive(Debug, Clone, Serialize)]
pub struct MinStationsPerProvider {
    num_stations: usize,
    provider: Option<String>,
}

impl MinStationsPerProvider {
    pub fn new(num_stations: usize, provider: Option<String>) -> Result<Self> {
        require_nonzero("MinStationsPerProvider", "num_stations", num_stations)?;
        Ok(Self {
            num_stations,
            provider,
        })
    }
}

impl ConstraintGenerator for MinStationsPerProvider {
    fn name(&self) -> &'static str {
        "MinStationsPerProvider"
    }

    fn describe(&self) -> ComponentDescription {
        ComponentDescription::of(self.name(), self)
    }

    fn generate(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Constraint>> {
        let mut constraints = Vec::new();
        for (provider_id, stations) in provider_groups(ctx, self.provider.as_deref())? {
            let provider_var = ctx.nodes.providers[provider_id].var;
            // Σ stations ≥ n · provider
            let expr = LinearExpr::sum(stations.iter().map(|sn| sn.var))
                .with_term(provider_var, -(self.num_stations as f64));
            constraints.push(
                expr.geq(0.0)
                    .with_name(format!("min_stations[{}]", provider_id)),
            );
        }
        Ok(constraints)
    }
}

/// No provider may contribute more than `num_stations` stations
#[derive(Debug, Clone, Serialize)]
pub struct MaxStationsPerProvider {
    num_stations: usize,
    provider: Option<String>,
}

impl MaxStationsPerProvider {
    pub fn new(num_stations: usize, provider: Option<String>) -> Result<Self> {
        require_nonzero("MaxStationsPerProvider", "num_stations", num_stations)?;
        Ok(Self {
            num_stations,
            provider,
        })
    }
}

impl ConstraintGenerator for MaxStationsPerProvider {
    fn name(&self) -> &'static str {
        "MaxStationsPerProvider"
    }

    fn describe(&self) -> ComponentDescription {
        ComponentDescription::of(self.name(), self)
    }

    fn generate(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Constraint>> {
        let mut constraints = Vec::new();
        for (provider_id, stations) in provider_groups(ctx, self.provider.as_deref())? {
            if stations.len() <= self.num_stations {
                continue;
            }
            constraints.push(
                LinearExpr::sum(stations.iter().map(|sn| sn.var))
                    .leq(self.num_stations as f64)
                    .with_name(format!("max_stations[{}]", provider_id)),
            );
        }
        Ok(constraints)
    }
}

/// Force a provider (by id or case-insensitive name) to be selected
#[derive(Debug, Clone, Serialize)]
pub struct RequireProvider {
    provider: String,
}

impl RequireProvider {
    pub fn new(provider: impl Into<String>) -> Result<Self> {
        let provider = provider.into();
        if provider.trim().is_empty() {
            return Err(OptimizerError::config(
                "RequireProvider: provider key must not be empty",
            ));
        }
        Ok(Self { provider })
    }
}

impl ConstraintGenerator for RequireProvider {
    fn name(&self) -> &'static str {
        "RequireProvider"
    }

    fn describe(&self) -> ComponentDescription {
        ComponentDescription::of(self.name(), self)
    }

    fn generate(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Constraint>> {
        let node = ctx.nodes.find_provider(&self.provider)?;
        Ok(vec![LinearExpr::term(node.var, 1.0)
            .eq(1.0)
            .with_name(format!("require_provider[{}]", node.provider.id))])
    }
}

/// Force a station to be selected
#[derive(Debug, Clone, Serialize)]
pub struct RequireStation {
    station: StationKey,
}

impl RequireStation {
    pub fn new(station: impl Into<StationKey>) -> Result<Self> {
        let station = station.into();
        let empty = match &station {
            StationKey::Id(id) => id.trim().is_empty(),
            StationKey::Named { name, provider } => {
                name.trim().is_empty() || provider.trim().is_empty()
            }
        };
        if empty {
            return Err(OptimizerError::config(
                "RequireStation: station key must not be empty",
            ));
        }
        Ok(Self { station })
    }

    /// Station named `name` operated by `provider`
    pub fn named(name: impl Into<String>, provider: impl Into<String>) -> Result<Self> {
        Self::new(StationKey::Named {
            name: name.into(),
            provider: provider.into(),
        })
    }
}

impl ConstraintGenerator for RequireStation {
    fn name(&self) -> &'static str {
        "RequireStation"
    }

    fn describe(&self) -> ComponentDescription {
        ComponentDescription::of(self.name(), self)
    }

    fn generate(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Constraint>> {
        let node = ctx.nodes.find_station(&self.station)?;
        Ok(vec![LinearExpr::term(node.var, 1.0)
            .eq(1.0)
            .with_name(format!("require_station[{}]", node.station.id))])
    }
}
