mod common;

use common::{at, azure, contact, satellite, window, BruteForce};
use gsopt::{
    MaxAntennaUsage, MaxContactGap, MaxContactsPerPeriod, MilpOptimizer, MinConstellationDataDownlink,
    MinSatelliteDataDownlink, Objective, OptimizerError, Provider, RequireProvider,
    SatelliteContactExclusion, SolutionStatus, Station,
};

fn selected(values: &[f64], optimizer: &MilpOptimizer, contact_id: &str) -> bool {
    let var = optimizer.nodes().unwrap().contacts[contact_id].var;
    values[var.index()] > 0.5
}

#[test]
fn same_satellite_never_served_by_two_stations_at_once() {
    let (provider, a, b) = azure();
    let sat = satellite("sat-1");
    let mut optimizer = MilpOptimizer::new(window(86_400.0, 86_400.0));
    optimizer.add_contact(contact("c-a", &a, &sat, 0.0, 300.0));
    optimizer.add_contact(contact("c-b", &b, &sat, 0.0, 300.0));
    optimizer.add_provider(provider);
    optimizer.add_station(a);
    optimizer.add_station(b);
    optimizer.add_satellite(sat);
    optimizer.set_objective(Objective::MaxDataDownlink);
    optimizer.add_constraint(Box::new(SatelliteContactExclusion));

    let problem = optimizer.generate_problem().unwrap().clone();
    let feasible = BruteForce::feasible(&problem);
    assert!(!feasible.is_empty());
    assert!(feasible
        .iter()
        .all(|v| !(selected(v, &optimizer, "c-a") && selected(v, &optimizer, "c-b"))));

    let solution = optimizer.solve_with(&BruteForce).unwrap().clone();
    assert_eq!(solution.status, SolutionStatus::Optimal);
    let report = optimizer.solution_report().unwrap();
    assert_eq!(report.contacts.len(), 1);
}

#[test]
fn downlink_threshold_forces_the_only_contact() {
    let provider = Provider::new("p", "P");
    let station = Station::new("gs", "GS", "p").with_datarate(1.0e3);
    let sat = satellite("sat-1");
    let mut optimizer = MilpOptimizer::new(window(400.0, 400.0));
    // 300 s at 1 kbit/s = 300,000 bits
    optimizer.add_contact(contact("c", &station, &sat, 50.0, 350.0));
    optimizer.add_provider(provider);
    optimizer.add_station(station);
    optimizer.add_satellite(sat);
    optimizer.set_objective(Objective::MinCost);
    optimizer.add_constraint(Box::new(
        MinConstellationDataDownlink::new(200_000.0, 400.0, 400.0).unwrap(),
    ));

    let problem = optimizer.generate_problem().unwrap().clone();
    let feasible = BruteForce::feasible(&problem);
    assert!(!feasible.is_empty());
    assert!(feasible.iter().all(|v| selected(v, &optimizer, "c")));
}

#[test]
fn single_antenna_allows_one_of_three_overlapping_contacts() {
    let provider = Provider::new("p", "P");
    let station = Station::new("gs", "GS", "p").with_antennas(1).with_datarate(1.0e3);
    let sats = [satellite("s1"), satellite("s2"), satellite("s3")];

    let mut optimizer = MilpOptimizer::new(window(86_400.0, 86_400.0));
    for (i, (sat, (start, end))) in sats
        .iter()
        .zip([(0.0, 300.0), (100.0, 400.0), (200.0, 500.0)])
        .enumerate()
    {
        optimizer.add_contact(contact(&format!("c-{}", i), &station, sat, start, end));
    }
    optimizer.add_provider(provider);
    optimizer.add_station(station);
    for sat in sats {
        optimizer.add_satellite(sat);
    }
    optimizer.set_objective(Objective::MaxDataDownlink);
    optimizer.add_constraint(Box::new(MaxAntennaUsage));

    let problem = optimizer.generate_problem().unwrap().clone();
    let block = &optimizer.constraint_blocks()[0];
    assert_eq!(block.len(), 3);
    assert!(block.constraints.iter().all(|c| c.num_terms() == 2));

    for values in BruteForce::feasible(&problem) {
        let scheduled = ["c-0", "c-1", "c-2"]
            .iter()
            .filter(|id| selected(&values, &optimizer, id))
            .count();
        assert!(scheduled <= 1);
    }
}

#[test]
fn required_provider_matches_name_and_is_forced_on() {
    let (provider, a, _) = azure();
    let sat = satellite("sat-1");
    let mut optimizer = MilpOptimizer::new(window(86_400.0, 86_400.0));
    optimizer.add_contact(contact("c-a", &a, &sat, 0.0, 300.0));
    optimizer.add_provider(provider);
    optimizer.add_station(a);
    optimizer.add_satellite(sat);
    optimizer.set_objective(Objective::MinCost);
    optimizer.add_constraint(Box::new(RequireProvider::new("Azure").unwrap()));

    let problem = optimizer.generate_problem().unwrap().clone();
    let provider_var = optimizer.nodes().unwrap().providers["p-azure"].var;
    let feasible = BruteForce::feasible(&problem);
    assert!(!feasible.is_empty());
    assert!(feasible.iter().all(|v| v[provider_var.index()] == 1.0));

    let solution = optimizer.solve_with(&BruteForce).unwrap();
    assert!(solution.is_selected(provider_var));
    // Integration cost only; no station or contact is needed
    assert_eq!(solution.optimal_value, Some(100.0));
}

#[test]
fn required_provider_name_matches_across_unicode_case() {
    let provider = Provider::new("p-oresund", "Øresund");
    let station = Station::new("gs", "GS", "p-oresund").with_datarate(1.0e3);
    let mut optimizer = MilpOptimizer::new(window(86_400.0, 86_400.0));
    optimizer.add_provider(provider);
    optimizer.add_station(station);
    optimizer.set_objective(Objective::MinCost);
    optimizer.add_constraint(Box::new(RequireProvider::new("øRESUND").unwrap()));

    let problem = optimizer.generate_problem().unwrap().clone();
    let provider_var = optimizer.nodes().unwrap().providers["p-oresund"].var;
    let feasible = BruteForce::feasible(&problem);
    assert!(!feasible.is_empty());
    assert!(feasible.iter().all(|v| v[provider_var.index()] == 1.0));
}

#[test]
fn period_beyond_the_calendar_generates_no_rows() {
    let (provider, a, _) = azure();
    let sat = satellite("sat-1");
    let mut optimizer = MilpOptimizer::new(window(86_400.0, 86_400.0));
    optimizer.add_contact(contact("c-a", &a, &sat, 0.0, 300.0));
    optimizer.add_provider(provider);
    optimizer.add_station(a);
    optimizer.add_satellite(sat);
    optimizer.set_objective(Objective::MaxDataDownlink);
    optimizer.add_constraint(Box::new(MaxContactsPerPeriod::new(1, 1.0e13, 3600.0).unwrap()));

    optimizer.generate_problem().unwrap();
    assert!(optimizer.constraint_blocks()[0].constraints.is_empty());
}

#[test]
fn unknown_required_provider_aborts_generation() {
    let (provider, a, _) = azure();
    let mut optimizer = MilpOptimizer::new(window(86_400.0, 86_400.0));
    optimizer.add_provider(provider);
    optimizer.add_station(a);
    optimizer.set_objective(Objective::MinCost);
    optimizer.add_constraint(Box::new(RequireProvider::new("Viasat").unwrap()));

    let err = optimizer.solve_with(&BruteForce).unwrap_err();
    assert!(matches!(err, OptimizerError::NotFound { kind: "provider", .. }));
    assert!(optimizer.solution().is_none());
}

fn three_pass_optimizer() -> MilpOptimizer {
    let provider = Provider::new("p", "P");
    let station = Station::new("gs", "GS", "p").with_datarate(1.0e3);
    let sat = satellite("sat-1");
    let mut optimizer = MilpOptimizer::new(window(1400.0, 1400.0));
    optimizer.add_contacts([
        contact("a", &station, &sat, 0.0, 100.0),
        contact("b", &station, &sat, 500.0, 600.0),
        contact("c", &station, &sat, 1200.0, 1300.0),
    ]);
    optimizer.add_provider(provider);
    optimizer.add_station(station);
    optimizer.add_satellite(sat);
    optimizer
}

#[test]
fn worst_gap_is_600_when_all_passes_are_required() {
    let mut optimizer = three_pass_optimizer();
    optimizer.set_objective(Objective::MinMaxContactGap);
    // Each pass carries 100,000 bits
    optimizer.add_constraint(Box::new(
        MinSatelliteDataDownlink::new(300_000.0, 1400.0, 1400.0).unwrap(),
    ));

    let solution = optimizer.solve_with(&BruteForce).unwrap().clone();
    assert_eq!(solution.status, SolutionStatus::Optimal);
    assert!((solution.optimal_value.unwrap() - 600.0).abs() < 1e-9);

    let max_gap = optimizer.objective_block().unwrap().max_gap.unwrap();
    assert!((solution.value(max_gap) - 600.0).abs() < 1e-9);
}

#[test]
fn dropping_a_pass_can_shrink_the_worst_gap() {
    let mut optimizer = three_pass_optimizer();
    optimizer.set_objective(Objective::MinMaxContactGap);
    optimizer.add_constraint(Box::new(
        MinSatelliteDataDownlink::new(200_000.0, 1400.0, 1400.0).unwrap(),
    ));

    let solution = optimizer.solve_with(&BruteForce).unwrap().clone();
    assert!((solution.optimal_value.unwrap() - 400.0).abs() < 1e-9);
    let report = optimizer.solution_report().unwrap();
    let ids: Vec<_> = report.contacts.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn gap_limit_below_required_gap_is_infeasible() {
    let mut optimizer = three_pass_optimizer();
    optimizer.set_objective(Objective::MaxDataDownlink);
    optimizer.add_constraint(Box::new(
        MinSatelliteDataDownlink::new(300_000.0, 1400.0, 1400.0).unwrap(),
    ));
    optimizer.add_constraint(Box::new(MaxContactGap::new(599.0).unwrap()));
    let solution = optimizer.solve_with(&BruteForce).unwrap();
    assert_eq!(solution.status, SolutionStatus::Infeasible);
    let report = optimizer.solution_report().unwrap();
    assert_eq!(report.solver_status, "INFEASIBLE");
    assert!(report.contacts.is_empty());
}

#[test]
fn generous_gap_limit_keeps_every_pass() {
    let mut optimizer = three_pass_optimizer();
    optimizer.set_objective(Objective::MaxDataDownlink);
    optimizer.add_constraint(Box::new(MaxContactGap::new(600.0).unwrap()));

    let solution = optimizer.solve_with(&BruteForce).unwrap().clone();
    assert_eq!(solution.optimal_value, Some(300_000.0));
    let report = optimizer.solution_report().unwrap();
    assert_eq!(report.contacts.len(), 3);
    assert_eq!(report.contacts[0].t_start, at(0.0));
}
