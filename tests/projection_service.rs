use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

use snowball::core::{Milestone, ProjectionConfig};
use snowball::repository::{MemoryRepository, SessionRepository};
use snowball::service::{AuthCustomer, SessionService};

const SEED: &str = include_str!("../demos/sessions.json");

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn setup() -> (Arc<MemoryRepository>, SessionService) {
    let repo = Arc::new(MemoryRepository::from_json(SEED).expect("valid seed"));
    let service = SessionService::new(repo.clone(), ProjectionConfig::default());
    (repo, service)
}

#[test]
fn debts_are_paid_in_priority_order() {
    let (repo, service) = setup();
    let auth = AuthCustomer { session_id: 1 };

    let chart = service
        .generate_chart_series(auth, today(), &CancellationToken::new())
        .expect("chart");

    let names: Vec<&str> = chart.debts.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Store card", "Credit card", "Car loan"]);
    assert!(chart.debts.iter().all(|d| !d.forecast_paid_off_date.is_empty()));

    let stored = repo.load_session(1).expect("session");
    for debt in &stored.debts {
        let returned = chart
            .debts
            .iter()
            .find(|d| d.id == debt.id)
            .expect("debt returned");
        assert_eq!(returned.forecast_paid_off_date, debt.forecast_paid_off_date);
    }
    assert!(stored.snapshot.is_some());

    let months_with_assets = chart.data.iter().filter(|p| p.group == "Assets").count();
    assert_eq!(chart.data.len(), months_with_assets * 4);
}

#[test]
fn timeline_is_chronological_and_complete() {
    let (repo, service) = setup();
    let auth = AuthCustomer { session_id: 1 };

    let timeline = service
        .generate_timeline(auth, today(), &CancellationToken::new())
        .expect("timeline");

    let debt_events = timeline
        .data
        .iter()
        .filter(|e| e.kind == Milestone::DebtPaidOff)
        .count();
    assert_eq!(debt_events, 3);
    assert!(timeline.data.windows(2).all(|w| w[0].on <= w[1].on));
    assert!(timeline.data.iter().all(|e| e.kind != Milestone::Bankrupt));

    let forecast = repo.load_session(1).expect("session").forecast;
    assert!(!forecast.forecast_emergency_fund.is_empty());
    assert!(forecast.forecast_bankrupt.is_empty());
}

#[test]
fn overspending_session_goes_bankrupt() {
    let (repo, service) = setup();
    let auth = AuthCustomer { session_id: 2 };

    let view = service.compute_current_snapshot(auth).expect("snapshot");
    assert_eq!(view.snapshot.monthly_net_flow, dec!(-500));

    let timeline = service
        .generate_timeline(auth, today(), &CancellationToken::new())
        .expect("timeline");
    let last = timeline.data.last().expect("bankrupt event");
    assert_eq!(last.kind, Milestone::Bankrupt);
    assert_eq!(last.date, "Nov 2026");
    assert_eq!(
        repo.load_session(2).expect("session").forecast.forecast_bankrupt,
        "Nov 2026"
    );
}

#[test]
fn balance_update_changes_next_projection() {
    let (_, service) = setup();
    let auth = AuthCustomer { session_id: 2 };

    service
        .update_current_balance(auth, dec!(100_000))
        .expect("updated");
    let view = service.compute_current_snapshot(auth).expect("snapshot");
    assert_eq!(view.current_balance, dec!(100_000));

    let timeline = service
        .generate_timeline(auth, today(), &CancellationToken::new())
        .expect("timeline");
    assert!(timeline.data.iter().all(|e| e.kind != Milestone::Bankrupt));
    assert!(
        timeline
            .data
            .iter()
            .any(|e| e.kind == Milestone::EmergencyFund)
    );
}

#[test]
fn debt_free_saver_reaches_investing() {
    let (_, service) = setup();
    let auth = AuthCustomer { session_id: 3 };

    let view = service.compute_current_snapshot(auth).expect("snapshot");
    assert!(view.snapshot.achieved_investing);
    assert!(view.snapshot.actual_fun_fund > Decimal::ZERO);
    assert_eq!(view.snapshot.actual_fun_fund, view.snapshot.expected_fun_fund);

    let timeline = service
        .generate_timeline(auth, today(), &CancellationToken::new())
        .expect("timeline");
    let kinds: Vec<Milestone> = timeline.data.iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&Milestone::StartInvesting));
    assert!(kinds.contains(&Milestone::Millionaire));
}
