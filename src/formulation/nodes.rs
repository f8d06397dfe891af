// Decision-variable registry
// Wraps every catalog entity with exactly one binary variable, keyed by entity id

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::entities::{Contact, Provider, Satellite, Station};
use crate::domain::models::{Variable, VariableId};
use crate::error::{OptimizerError, Result};

/// Arena of model variables; ids are dense indices into it
#[derive(Debug, Clone, Default)]
pub struct VariableArena {
    variables: Vec<Variable>,
}

impl VariableArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, variable: Variable) -> VariableId {
        self.variables.push(variable);
        VariableId(self.variables.len() - 1)
    }

    pub fn binary(&mut self, name: impl Into<String>) -> VariableId {
        self.add(Variable::binary(name))
    }

    pub fn get(&self, id: VariableId) -> Option<&Variable> {
        self.variables.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn as_slice(&self) -> &[Variable] {
        &self.variables
    }
}

/// Entities registered with the optimizer, keyed by id
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub providers: BTreeMap<String, Arc<Provider>>,
    pub stations: BTreeMap<String, Arc<Station>>,
    pub satellites: BTreeMap<String, Arc<Satellite>>,
    pub contacts: BTreeMap<String, Arc<Contact>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_provider(&mut self, provider: Provider) {
        if self.providers.contains_key(&provider.id) {
            warn!(id = %provider.id, "replacing provider already in catalog");
        }
        self.providers.insert(provider.id.clone(), Arc::new(provider));
    }

    pub fn add_station(&mut self, station: Station) {
        if self.stations.contains_key(&station.id) {
            warn!(id = %station.id, "replacing station already in catalog");
        }
        self.stations.insert(station.id.clone(), Arc::new(station));
    }

    pub fn add_satellite(&mut self, satellite: Satellite) {
        if self.satellites.contains_key(&satellite.id) {
            warn!(id = %satellite.id, "replacing satellite already in catalog");
        }
        self.satellites.insert(satellite.id.clone(), Arc::new(satellite));
    }

    pub fn add_contact(&mut self, contact: Contact) {
        if self.contacts.contains_key(&contact.id) {
            warn!(id = %contact.id, "replacing contact already in catalog");
        }
        self.contacts.insert(contact.id.clone(), Arc::new(contact));
    }
}

#[derive(Debug, Clone)]
pub struct ProviderNode {
    pub var: VariableId,
    pub provider: Arc<Provider>,
}

#[derive(Debug, Clone)]
pub struct StationNode {
    pub var: VariableId,
    pub station: Arc<Station>,
}

impl StationNode {
    pub fn provider_id(&self) -> &str {
        &self.station.provider_id
    }
}

#[derive(Debug, Clone)]
pub struct SatelliteNode {
    pub var: VariableId,
    pub satellite: Arc<Satellite>,
}

#[derive(Debug, Clone)]
pub struct ContactNode {
    pub var: VariableId,
    pub contact: Arc<Contact>,
}

impl ContactNode {
    pub fn id(&self) -> &str {
        &self.contact.id
    }

    pub fn station_id(&self) -> &str {
        &self.contact.station_id
    }

    pub fn satellite_id(&self) -> &str {
        &self.contact.satellite_id
    }

    pub fn provider_id(&self) -> &str {
        &self.contact.provider_id
    }
}

/// Key of a station×satellite licensing indicator
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct StationSatelliteKey {
    pub station_id: String,
    pub satellite_id: String,
}

impl StationSatelliteKey {
    pub fn new(station_id: impl Into<String>, satellite_id: impl Into<String>) -> Self {
        Self {
            station_id: station_id.into(),
            satellite_id: satellite_id.into(),
        }
    }
}

/// Way of naming a station in a `require` constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StationKey {
    /// Station id, or a station name unique across providers
    Id(String),
    /// Station name scoped to a provider (provider given by id or name)
    Named { name: String, provider: String },
}

impl From<&str> for StationKey {
    fn from(key: &str) -> Self {
        StationKey::Id(key.to_string())
    }
}

/// Number of variables created per node kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodeCounts {
    pub providers: usize,
    pub stations: usize,
    pub satellites: usize,
    pub contacts: usize,
    pub station_sat_indicators: usize,
}

impl NodeCounts {
    pub fn total(&self) -> usize {
        self.providers + self.stations + self.satellites + self.contacts + self.station_sat_indicators
    }
}

/// All decision nodes of one model
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    pub providers: BTreeMap<String, ProviderNode>,
    pub stations: BTreeMap<String, StationNode>,
    pub satellites: BTreeMap<String, SatelliteNode>,
    pub contacts: BTreeMap<String, ContactNode>,
    pub station_satellites: BTreeMap<StationSatelliteKey, VariableId>,
}

impl NodeSet {
    /// Create one binary variable per entity plus the sparse station×satellite indicators
    pub fn generate(catalog: &Catalog, vars: &mut VariableArena) -> Result<Self> {
        let mut nodes = NodeSet::default();

        for (id, provider) in &catalog.providers {
            let var = vars.binary(format!("provider[{}]", id));
            nodes.providers.insert(
                id.clone(),
                ProviderNode {
                    var,
                    provider: Arc::clone(provider),
                },
            );
        }

        for (id, station) in &catalog.stations {
            if !catalog.providers.contains_key(&station.provider_id) {
                return Err(OptimizerError::UnknownEntity {
                    kind: "station",
                    id: id.clone(),
                    target: "provider",
                    target_id: station.provider_id.clone(),
                });
            }
            let var = vars.binary(format!("station[{}]", id));
            nodes.stations.insert(
                id.clone(),
                StationNode {
                    var,
                    station: Arc::clone(station),
                },
            );
        }

        for (id, satellite) in &catalog.satellites {
            let var = vars.binary(format!("satellite[{}]", id));
            nodes.satellites.insert(
                id.clone(),
                SatelliteNode {
                    var,
                    satellite: Arc::clone(satellite),
                },
            );
        }

        for (id, contact) in &catalog.contacts {
            check_contact_references(catalog, contact)?;
            let var = vars.binary(format!("contact[{}]", id));
            nodes.contacts.insert(
                id.clone(),
                ContactNode {
                    var,
                    contact: Arc::clone(contact),
                },
            );

            // Indicators only exist for pairs that share at least one contact
            let key = StationSatelliteKey::new(&contact.station_id, &contact.satellite_id);
            if !nodes.station_satellites.contains_key(&key) {
                let var = vars.binary(format!(
                    "station_satellite[{},{}]",
                    key.station_id, key.satellite_id
                ));
                nodes.station_satellites.insert(key, var);
            }
        }

        debug!(counts = ?nodes.counts(), "generated decision nodes");
        Ok(nodes)
    }

    pub fn counts(&self) -> NodeCounts {
        NodeCounts {
            providers: self.providers.len(),
            stations: self.stations.len(),
            satellites: self.satellites.len(),
            contacts: self.contacts.len(),
            station_sat_indicators: self.station_satellites.len(),
        }
    }

    /// Contacts grouped by station id; groups are ordered by start time
    pub fn contacts_by_station(&self) -> BTreeMap<&str, Vec<&ContactNode>> {
        group_sorted(self.contacts.values(), |cn| cn.station_id())
    }

    /// Contacts grouped by satellite id; groups are ordered by start time
    pub fn contacts_by_satellite(&self) -> BTreeMap<&str, Vec<&ContactNode>> {
        group_sorted(self.contacts.values(), |cn| cn.satellite_id())
    }

    /// Stations grouped by owning provider id
    pub fn stations_by_provider(&self) -> BTreeMap<&str, Vec<&StationNode>> {
        let mut groups: BTreeMap<&str, Vec<&StationNode>> = BTreeMap::new();
        for sn in self.stations.values() {
            groups.entry(sn.provider_id()).or_default().push(sn);
        }
        groups
    }

    /// Contacts ordered by start time (ties broken by id)
    pub fn contacts_chronological(&self) -> Vec<&ContactNode> {
        let mut contacts: Vec<&ContactNode> = self.contacts.values().collect();
        contacts.sort_by(|a, b| chronological(a, b));
        contacts
    }

    /// Match a provider by exact id, then by case-insensitive name
    pub fn find_provider(&self, key: &str) -> Result<&ProviderNode> {
        if let Some(node) = self.providers.get(key) {
            return Ok(node);
        }
        self.providers
            .values()
            .find(|pn| same_name(&pn.provider.name, key))
            .ok_or_else(|| OptimizerError::not_found("provider", key))
    }

    /// Match a station by exact id, then by case-insensitive name (optionally within a provider)
    pub fn find_station(&self, key: &StationKey) -> Result<&StationNode> {
        match key {
            StationKey::Id(id) => {
                if let Some(node) = self.stations.get(id) {
                    return Ok(node);
                }
                self.stations
                    .values()
                    .find(|sn| same_name(&sn.station.name, id))
                    .ok_or_else(|| OptimizerError::not_found("station", id.as_str()))
            }
            StationKey::Named { name, provider } => {
                let provider_id = self.find_provider(provider)?.provider.id.as_str();
                self.stations
                    .values()
                    .filter(|sn| sn.provider_id() == provider_id)
                    .find(|sn| sn.station.id == *name || same_name(&sn.station.name, name))
                    .ok_or_else(|| {
                        OptimizerError::not_found("station", format!("{}/{}", provider, name))
                    })
            }
        }
    }

    /// Match a satellite by id, then catalog id, then case-insensitive name
    pub fn find_satellite(&self, key: &str) -> Result<&SatelliteNode> {
        if let Some(node) = self.satellites.get(key) {
            return Ok(node);
        }
        self.satellites
            .values()
            .find(|sn| sn.satellite.satcat_id == key)
            .or_else(|| {
                self.satellites
                    .values()
                    .find(|sn| same_name(&sn.satellite.name, key))
            })
            .ok_or_else(|| OptimizerError::not_found("satellite", key))
    }
}

// Case-insensitive over full Unicode, not just ASCII
fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn check_contact_references(catalog: &Catalog, contact: &Contact) -> Result<()> {
    let unknown = |target: &'static str, target_id: &str| OptimizerError::UnknownEntity {
        kind: "contact",
        id: contact.id.clone(),
        target,
        target_id: target_id.to_string(),
    };

    let station = catalog
        .stations
        .get(&contact.station_id)
        .ok_or_else(|| unknown("station", &contact.station_id))?;
    if !catalog.satellites.contains_key(&contact.satellite_id) {
        return Err(unknown("satellite", &contact.satellite_id));
    }
    if !catalog.providers.contains_key(&contact.provider_id) {
        return Err(unknown("provider", &contact.provider_id));
    }
    if station.provider_id != contact.provider_id {
        return Err(OptimizerError::config(format!(
            "contact '{}' is attributed to provider '{}' but station '{}' belongs to '{}'",
            contact.id, contact.provider_id, station.id, station.provider_id
        )));
    }
    Ok(())
}

pub(crate) fn chronological(a: &ContactNode, b: &ContactNode) -> std::cmp::Ordering {
    a.contact
        .t_start
        .cmp(&b.contact.t_start)
        .then_with(|| a.contact.t_end.cmp(&b.contact.t_end))
        .then_with(|| a.id().cmp(b.id()))
}

fn group_sorted<'a, I, F>(contacts: I, key: F) -> BTreeMap<&'a str, Vec<&'a ContactNode>>
where
    I: Iterator<Item = &'a ContactNode>,
    F: Fn(&'a ContactNode) -> &'a str,
{
    let mut groups: BTreeMap<&str, Vec<&ContactNode>> = BTreeMap::new();
    for cn in contacts {
        groups.entry(key(cn)).or_default().push(cn);
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| chronological(a, b));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulation::testing::{at, fixture_catalog};

    #[test]
    fn one_variable_per_entity_and_sparse_indicators() {
        let catalog = fixture_catalog();
        let mut vars = VariableArena::new();
        let nodes = NodeSet::generate(&catalog, &mut vars).unwrap();

        let counts = nodes.counts();
        assert_eq!(counts.providers, 2);
        assert_eq!(counts.stations, 3);
        assert_eq!(counts.satellites, 2);
        assert_eq!(counts.contacts, 4);
        assert_eq!(counts.station_sat_indicators, 4);
        assert_eq!(vars.len(), counts.total());
        assert!(nodes
            .station_satellites
            .contains_key(&StationSatelliteKey::new("gs-1", "sat-2")));
        assert!(!nodes
            .station_satellites
            .contains_key(&StationSatelliteKey::new("gs-3", "sat-2")));
    }

    #[test]
    fn unknown_station_reference_is_rejected() {
        let mut catalog = fixture_catalog();
        let mut orphan = catalog.contacts.values().next().unwrap().as_ref().clone();
        orphan.id = "orphan".to_string();
        orphan.station_id = "gs-missing".to_string();
        catalog.add_contact(orphan);

        let err = NodeSet::generate(&catalog, &mut VariableArena::new()).unwrap_err();
        assert!(matches!(
            err,
            OptimizerError::UnknownEntity { target: "station", .. }
        ));
    }

    #[test]
    fn provider_lookup_falls_back_to_name() {
        let catalog = fixture_catalog();
        let nodes = NodeSet::generate(&catalog, &mut VariableArena::new()).unwrap();

        assert_eq!(nodes.find_provider("p-azure").unwrap().provider.id, "p-azure");
        assert_eq!(nodes.find_provider("AZURE").unwrap().provider.id, "p-azure");
        assert!(matches!(
            nodes.find_provider("viasat"),
            Err(OptimizerError::NotFound { kind: "provider", .. })
        ));
    }

    #[test]
    fn name_lookup_folds_non_ascii_case() {
        let provider = Provider::new("p-oresund", "Øresund");
        let station = Station::new("gs-malmo", "Malmö", "p-oresund");
        let satellite = Satellite::new("sat-o", "40100", "Ørsted", 1.0e6);
        let mut catalog = Catalog::new();
        catalog.add_provider(provider);
        catalog.add_station(station);
        catalog.add_satellite(satellite);
        let nodes = NodeSet::generate(&catalog, &mut VariableArena::new()).unwrap();

        assert_eq!(nodes.find_provider("øRESUND").unwrap().provider.id, "p-oresund");
        assert_eq!(nodes.find_station(&"MALMÖ".into()).unwrap().station.id, "gs-malmo");
        let key = StationKey::Named {
            name: "malmö".to_string(),
            provider: "ØRESUND".to_string(),
        };
        assert_eq!(nodes.find_station(&key).unwrap().station.id, "gs-malmo");
        assert_eq!(nodes.find_satellite("ørsted").unwrap().satellite.id, "sat-o");
    }

    #[test]
    fn station_lookup_scoped_by_provider() {
        let catalog = fixture_catalog();
        let nodes = NodeSet::generate(&catalog, &mut VariableArena::new()).unwrap();

        let key = StationKey::Named {
            name: "oregon".to_string(),
            provider: "Aws".to_string(),
        };
        assert_eq!(nodes.find_station(&key).unwrap().station.id, "gs-3");
        assert_eq!(nodes.find_station(&"gs-1".into()).unwrap().station.id, "gs-1");

        let wrong_provider = StationKey::Named {
            name: "oregon".to_string(),
            provider: "azure".to_string(),
        };
        assert!(nodes.find_station(&wrong_provider).is_err());
    }

    #[test]
    fn satellite_groups_are_chronological() {
        let catalog = fixture_catalog();
        let nodes = NodeSet::generate(&catalog, &mut VariableArena::new()).unwrap();

        let groups = nodes.contacts_by_satellite();
        let sat1: Vec<&str> = groups["sat-1"].iter().map(|cn| cn.id()).collect();
        assert_eq!(sat1, vec!["c-1", "c-2", "c-4"]);
        assert!(groups["sat-1"]
            .windows(2)
            .all(|w| w[0].contact.t_start <= w[1].contact.t_start));
        assert_eq!(groups["sat-2"][0].contact.t_start, at(0.0));
    }
}
