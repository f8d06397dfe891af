// Sliding-window aggregate thresholds and operational cost caps

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::{require_nonzero, require_positive, ComponentDescription, ConstraintGenerator, GenerationContext};
use crate::domain::entities::{seconds, OptimizationWindow, SECONDS_PER_MONTH};
use crate::domain::models::{Constraint, LinearExpr};
use crate::domain::value_objects::ConstraintType;
use crate::error::Result;
use crate::formulation::nodes::ContactNode;

/// Window of `period` seconds advanced by `step` seconds across the simulation span
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlidingWindow {
    pub period: f64,
    pub step: f64,
}

impl SlidingWindow {
    pub fn new(component: &str, period: f64, step: f64) -> Result<Self> {
        require_positive(component, "period", period)?;
        require_positive(component, "step", step)?;
        Ok(Self { period, step })
    }

    /// Every `[ts, ts + period]` with `ts = sim_start + k·step` and `ts + period ≤ sim_end`
    ///
    /// Empty when the period is longer than the simulation span.
    pub fn instances(&self, window: &OptimizationWindow) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let mut instances = Vec::new();
        if self.period > window.sim_duration() {
            return instances;
        }

        let period = seconds(self.period);
        let mut k: u64 = 0;
        loop {
            let Some(ts) = window.sim_start.checked_add_signed(seconds(self.step * k as f64)) else {
                break;
            };
            let Some(te) = ts.checked_add_signed(period) else {
                break;
            };
            if te > window.sim_end {
                break;
            }
            instances.push((ts, te));
            k += 1;
        }

        instances
    }

    /// One `Σ weight·x <relation> threshold` row per window instance
    pub fn rows<F>(
        &self,
        window: &OptimizationWindow,
        contacts: &[&ContactNode],
        weight: F,
        relation: ConstraintType,
        threshold: f64,
        label: &str,
    ) -> Vec<Constraint>
    where
        F: Fn(&ContactNode) -> f64,
    {
        self.instances(window)
            .into_iter()
            .enumerate()
            .map(|(k, (ts, te))| {
                let expr = LinearExpr::weighted_sum(
                    contacts
                        .iter()
                        .filter(|cn| cn.contact.intersects(ts, te))
                        .map(|cn| (cn.var, weight(cn))),
                );
                Constraint::new(relation, expr, threshold).with_name(format!("{}[{}]", label, k))
            })
            .collect()
    }
}

/// Constellation-wide downlinked volume in every period must reach `value` bits
#[derive(Debug, Clone, Serialize)]
pub struct MinConstellationDataDownlink {
    value: f64,
    #[serde(flatten)]
    window: SlidingWindow,
}

impl MinConstellationDataDownlink {
    pub fn new(value: f64, period: f64, step: f64) -> Result<Self> {
        require_positive("MinConstellationDataDownlink", "value", value)?;
        Ok(Self {
            value,
            window: SlidingWindow::new("MinConstellationDataDownlink", period, step)?,
        })
    }
}

impl ConstraintGenerator for MinConstellationDataDownlink {
    fn name(&self) -> &'static str {
        "MinConstellationDataDownlink"
    }

    fn describe(&self) -> ComponentDescription {
        ComponentDescription::of(self.name(), self)
    }

    fn generate(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Constraint>> {
        let contacts = ctx.nodes.contacts_chronological();
        Ok(self.window.rows(
            ctx.window,
            &contacts,
            |cn| cn.contact.datarate * cn.contact.t_duration,
            ConstraintType::GreaterThanOrEqual,
            self.value,
            "min_constellation_downlink",
        ))
    }
}

/// Each satellite (or one chosen satellite) must downlink `value` bits in every period
#[derive(Debug, Clone, Serialize)]
pub struct MinSatelliteDataDownlink {
    value: f64,
    #[serde(flatten)]
    window: SlidingWindow,
    satellite: Option<String>,
}

impl MinSatelliteDataDownlink {
    pub fn new(value: f64, period: f64, step: f64) -> Result<Self> {
        require_positive("MinSatelliteDataDownlink", "value", value)?;
        Ok(Self {
            value,
            window: SlidingWindow::new("MinSatelliteDataDownlink", period, step)?,
            satellite: None,
        })
    }

    /// Restrict the requirement to one satellite (id, catalog id or name)
    pub fn for_satellite(mut self, satellite: impl Into<String>) -> Self {
        self.satellite = Some(satellite.into());
        self
    }
}

impl ConstraintGenerator for MinSatelliteDataDownlink {
    fn name(&self) -> &'static str {
        "MinSatelliteDataDownlink"
    }

    fn describe(&self) -> ComponentDescription {
        ComponentDescription::of(self.name(), self)
    }

    fn generate(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Constraint>> {
        let groups = ctx.nodes.contacts_by_satellite();
        let satellite_ids: Vec<&str> = match &self.satellite {
            Some(key) => vec![ctx.nodes.find_satellite(key)?.satellite.id.as_str()],
            None => ctx.nodes.satellites.keys().map(String::as_str).collect(),
        };

        let mut constraints = Vec::new();
        for sat_id in satellite_ids {
            let contacts = groups.get(sat_id).cloned().unwrap_or_default();
            constraints.extend(self.window.rows(
                ctx.window,
                &contacts,
                |cn| cn.contact.datarate * cn.contact.t_duration,
                ConstraintType::GreaterThanOrEqual,
                self.value,
                &format!("min_satellite_downlink[{}]", sat_id),
            ));
        }
        Ok(constraints)
    }
}

/// At most `value` contacts may be scheduled in any period
#[derive(Debug, Clone, Serialize)]
pub struct MaxContactsPerPeriod {
    value: usize,
    #[serde(flatten)]
    window: SlidingWindow,
}

impl MaxContactsPerPeriod {
    pub fn new(value: usize, period: f64, step: f64) -> Result<Self> {
        require_nonzero("MaxContactsPerPeriod", "value", value)?;
        Ok(Self {
            value,
            window: SlidingWindow::new("MaxContactsPerPeriod", period, step)?,
        })
    }
}

impl ConstraintGenerator for MaxContactsPerPeriod {
    fn name(&self) -> &'static str {
        "MaxContactsPerPeriod"
    }

    fn describe(&self) -> ComponentDescription {
        ComponentDescription::of(self.name(), self)
    }

    fn generate(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Constraint>> {
        let contacts = ctx.nodes.contacts_chronological();
        Ok(self.window.rows(
            ctx.window,
            &contacts,
            |_| 1.0,
            ConstraintType::LessThanOrEqual,
            self.value as f64,
            "max_contacts_per_period",
        ))
    }
}

/// Recurring (monthly station + per-pass) cost over `period` seconds must not exceed `value`
///
/// Without a period the cost is capped over the whole optimization horizon.
#[derive(Debug, Clone, Serialize)]
pub struct MaxOperationalCost {
    value: f64,
    period: Option<f64>,
}

impl MaxOperationalCost {
    pub fn new(value: f64) -> Result<Self> {
        require_positive("MaxOperationalCost", "value", value)?;
        Ok(Self {
            value,
            period: None,
        })
    }

    pub fn over_period(mut self, period: f64) -> Result<Self> {
        require_positive("MaxOperationalCost", "period", period)?;
        self.period = Some(period);
        Ok(self)
    }
}

impl ConstraintGenerator for MaxOperationalCost {
    fn name(&self) -> &'static str {
        "MaxOperationalCost"
    }

    fn describe(&self) -> ComponentDescription {
        ComponentDescription::of(self.name(), self)
    }

    fn generate(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Constraint>> {
        let horizon = self.period.unwrap_or_else(|| ctx.window.opt_duration());
        let months = horizon / SECONDS_PER_MONTH;
        let contact_scale = horizon / ctx.window.sim_duration();

        let mut expr = LinearExpr::new();
        for sn in ctx.nodes.stations.values() {
            if sn.station.monthly_cost != 0.0 {
                expr.add_term(sn.var, sn.station.monthly_cost * months);
            }
        }
        for cn in ctx.nodes.contacts.values() {
            expr.add_term(cn.var, cn.contact.cost * contact_scale);
        }

        debug!(horizon, months, contact_scale, "operational cost cap");
        Ok(vec![expr.leq(self.value).with_name("max_operational_cost")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Contact, Provider, Satellite, Station};
    use crate::formulation::nodes::Catalog;
    use crate::formulation::testing::{at, fixture_catalog, Fixture};

    #[test]
    fn windows_step_through_sim_span() {
        let fx = Fixture::with_window(fixture_catalog(), 1000.0, 1000.0);
        let sliding = SlidingWindow::new("test", 400.0, 300.0).unwrap();

        let starts: Vec<_> = sliding
            .instances(&fx.window)
            .into_iter()
            .map(|(ts, _)| ts)
            .collect();
        assert_eq!(starts, vec![at(0.0), at(300.0), at(600.0)]);
    }

    #[test]
    fn period_longer_than_sim_span_yields_no_rows() {
        let fx = Fixture::with_window(fixture_catalog(), 2000.0, 1000.0);
        let constraint = MaxContactsPerPeriod::new(1, 1500.0, 100.0).unwrap();
        assert!(fx.generate(&constraint).is_empty());
    }

    #[test]
    fn oversized_period_is_a_silent_no_op() {
        let fx = Fixture::with_window(fixture_catalog(), 86_400.0, 86_400.0);
        let sliding = SlidingWindow::new("test", 1.0e13, 3600.0).unwrap();
        assert!(sliding.instances(&fx.window).is_empty());

        let constraint = MaxContactsPerPeriod::new(1, 1.0e13, 3600.0).unwrap();
        assert!(fx.generate(&constraint).is_empty());
    }

    #[test]
    fn huge_step_stops_after_the_first_window() {
        let fx = Fixture::with_window(fixture_catalog(), 1000.0, 1000.0);
        let sliding = SlidingWindow::new("test", 400.0, 1.0e300).unwrap();
        assert_eq!(sliding.instances(&fx.window), vec![(at(0.0), at(400.0))]);
    }

    #[test]
    fn windows_collect_intersecting_contacts() {
        let fx = Fixture::with_window(fixture_catalog(), 1400.0, 1400.0);
        let rows = fx.generate(&MaxContactsPerPeriod::new(2, 500.0, 500.0).unwrap());

        // [0, 500] sees c-1, c-2, c-3; [500, 1000] sees c-2 and touches c-4 at 1000
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].num_terms(), 3);
        assert_eq!(rows[1].num_terms(), 2);
        assert_eq!(rows[0].bound, 2.0);
        assert_eq!(rows[0].constraint_type, ConstraintType::LessThanOrEqual);
    }

    #[test]
    fn single_contact_must_be_scheduled_to_meet_downlink() {
        let provider = Provider::new("p", "P");
        let station = Station::new("gs", "GS", "p").with_datarate(1.0e3);
        let satellite = Satellite::new("sat", "1", "Sat", 1.0e3);
        let mut catalog = Catalog::new();
        catalog.add_contact(Contact::new("c", &station, &satellite, at(50.0), at(350.0)));
        catalog.add_provider(provider);
        catalog.add_station(station);
        catalog.add_satellite(satellite);

        let fx = Fixture::with_window(catalog, 400.0, 400.0);
        let rows = fx.generate(&MinConstellationDataDownlink::new(200_000.0, 400.0, 400.0).unwrap());
        assert_eq!(rows.len(), 1);

        let mut values = fx.zeros();
        assert!(!rows[0].is_satisfied_by(&values));
        values[fx.contact("c").index()] = 1.0;
        assert!(rows[0].is_satisfied_by(&values));
    }

    #[test]
    fn satellite_downlink_rows_per_satellite() {
        let fx = Fixture::with_window(fixture_catalog(), 1400.0, 1400.0);
        let all = fx.generate(&MinSatelliteDataDownlink::new(1.0, 1400.0, 1400.0).unwrap());
        assert_eq!(all.len(), 2);

        let one = MinSatelliteDataDownlink::new(1.0, 1400.0, 1400.0)
            .unwrap()
            .for_satellite("SAT-TWO");
        let rows = fx.generate(&one);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].expression.terms, vec![(fx.contact("c-3"), 200.0 * 1.0e6)]);

        let missing = MinSatelliteDataDownlink::new(1.0, 1400.0, 1400.0)
            .unwrap()
            .for_satellite("sat-9");
        assert!(fx.try_generate(&missing).is_err());
    }

    #[test]
    fn operational_cost_extrapolates_contacts() {
        // 10-day horizon sampled over 1 day
        let fx = Fixture::with_window(fixture_catalog(), 864_000.0, 86_400.0);
        let rows = fx.generate(&MaxOperationalCost::new(1000.0).unwrap());
        assert_eq!(rows.len(), 1);

        let c1 = fx.contact("c-1");
        let coeff = rows[0]
            .expression
            .terms
            .iter()
            .find(|(var, _)| *var == c1)
            .map(|(_, c)| *c)
            .unwrap();
        // c-1 costs 15 per pass, scaled by 10
        assert!((coeff - 150.0).abs() < 1e-9);

        assert!(MaxOperationalCost::new(10.0).unwrap().over_period(0.0).is_err());
    }
}
