// Indicator linking between contacts, stations, licences and providers
//
// A contact may only be scheduled through a selected station, a station only through a
// selected provider, and a selected station must carry at least one contact.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::models::{Constraint, LinearExpr, VariableId};
use crate::formulation::nodes::{NodeSet, StationSatelliteKey};

/// Emit the linking rows for every station, station×satellite pair and provider
pub fn generate(nodes: &NodeSet) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    let by_station = nodes.contacts_by_station();

    for (station_id, sn) in &nodes.stations {
        let contacts: Vec<VariableId> = by_station
            .get(station_id.as_str())
            .map(|group| group.iter().map(|cn| cn.var).collect())
            .unwrap_or_default();

        // Σ contacts ≤ N·station
        if !contacts.is_empty() {
            let n = contacts.len() as f64;
            constraints.push(
                LinearExpr::sum(contacts.iter().copied())
                    .with_term(sn.var, -n)
                    .leq(0.0)
                    .with_name(format!("station_uses[{}]", station_id)),
            );
        }

        // station ≤ Σ contacts; a station without contacts is never selected
        constraints.push(
            LinearExpr::sum(contacts)
                .with_term(sn.var, -1.0)
                .geq(0.0)
                .with_name(format!("station_needs_contact[{}]", station_id)),
        );
    }

    let mut pair_contacts: BTreeMap<&StationSatelliteKey, Vec<VariableId>> = BTreeMap::new();
    for cn in nodes.contacts.values() {
        let key = StationSatelliteKey::new(cn.station_id(), cn.satellite_id());
        if let Some((key, _)) = nodes.station_satellites.get_key_value(&key) {
            pair_contacts.entry(key).or_default().push(cn.var);
        }
    }
    for (key, contacts) in pair_contacts {
        let indicator = nodes.station_satellites[key];
        let n = contacts.len() as f64;
        constraints.push(
            LinearExpr::sum(contacts)
                .with_term(indicator, -n)
                .leq(0.0)
                .with_name(format!(
                    "station_satellite_uses[{},{}]",
                    key.station_id, key.satellite_id
                )),
        );
    }

    for (provider_id, stations) in nodes.stations_by_provider() {
        let Some(pn) = nodes.providers.get(provider_id) else {
            continue;
        };
        let m = stations.len() as f64;
        constraints.push(
            LinearExpr::sum(stations.iter().map(|sn| sn.var))
                .with_term(pn.var, -m)
                .leq(0.0)
                .with_name(format!("provider_uses[{}]", provider_id)),
        );
    }

    debug!(constraints = constraints.len(), "generated linking constraints");
    constraints
}
