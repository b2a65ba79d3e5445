use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::calendar::{Calendar, format_month_year};
use super::cascade::{Eligibility, resolve_month, seed_debt_nodes};
use super::milestones::{DebtPayoff, ForecastDates, ForecastEvents, InvestingBaseline};
use super::money::non_negative;
use super::node::compute_node;
use super::store::NodeStore;
use super::types::{
    ASSETS_GROUP, ChartPoint, Debt, DebtNode, Node, ProjectionConfig, SessionFinancials,
    StopReason,
};

// Growth at any accepted rate stays inside Decimal range below this.
const MAX_PROJECTED_ASSET: Decimal = dec!(1_000_000_000_000_000_000_000_000);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("projection cancelled before month {month}")]
    Cancelled { month: u32 },
    #[error("{field} is out of range")]
    AmountOutOfRange { field: &'static str },
    #[error("projected asset out of range in month {month}")]
    Overflow { month: u32 },
}

#[derive(Debug, Clone)]
pub struct Projection {
    pub start: NaiveDate,
    pub snapshot: Node,
    pub forecast: ForecastDates,
    pub debt_payoffs: Vec<DebtPayoff>,
    pub series: Vec<ChartPoint>,
    pub stop_reason: StopReason,
    store: NodeStore,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary<'a> {
    pub start: NaiveDate,
    pub months_simulated: u32,
    pub stop_reason: StopReason,
    pub snapshot: &'a Node,
    pub forecast: &'a ForecastDates,
    pub debt_payoffs: &'a [DebtPayoff],
    pub series: &'a [ChartPoint],
}

impl Projection {
    pub fn nodes(&self) -> &[Node] {
        self.store.nodes()
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn months_simulated(&self) -> u32 {
        self.store.len().saturating_sub(1) as u32
    }

    pub fn summary(&self) -> ProjectionSummary<'_> {
        ProjectionSummary {
            start: self.start,
            months_simulated: self.months_simulated(),
            stop_reason: self.stop_reason,
            snapshot: &self.snapshot,
            forecast: &self.forecast,
            debt_payoffs: &self.debt_payoffs,
            series: &self.series,
        }
    }
}

pub fn compute_current_snapshot(session: &SessionFinancials, config: &ProjectionConfig) -> Node {
    compute_node(
        0,
        session.current_balance,
        session.total_remaining_debt(),
        session.debts.is_empty(),
        session,
        config,
    )
}

struct Step {
    current_asset: Decimal,
    total_remaining_debt: Decimal,
    is_debt_free: bool,
    debt_nodes: Vec<DebtNode>,
    paid_off_now: Vec<usize>,
}

pub fn run_projection(
    session: &SessionFinancials,
    config: &ProjectionConfig,
    today: NaiveDate,
    cancel: &CancellationToken,
) -> Result<Projection, ProjectionError> {
    if let Some(field) = session.out_of_range_field() {
        return Err(ProjectionError::AmountOutOfRange { field });
    }

    let calendar = Calendar::starting(today, config.milestone_day);
    let horizon = calendar.horizon_months(config.horizon_years, config.max_horizon_months);
    let debts = &session.debts;
    let cash_flow = session.cash_flow_before_debt();

    let mut store = NodeStore::with_capacity(horizon as usize + 1);
    let mut series = Vec::with_capacity((horizon as usize + 1) * (debts.len() + 1));
    let mut eligibility = Eligibility::initial(debts.len());
    let mut payoff_months: Vec<Option<u32>> = vec![None; debts.len()];

    let snapshot = compute_current_snapshot(session, config);
    let seed = seed_debt_nodes(debts, &eligibility);
    let mut events = ForecastEvents::default().observe(
        None,
        &snapshot,
        InvestingBaseline {
            cash_flow,
            asset: session.current_balance,
        },
    );
    push_chart_points(&mut series, &calendar, &snapshot, debts, &seed);
    store.push(snapshot.clone(), seed);

    let mut stop_reason = StopReason::HorizonReached;

    for month in 1..=horizon {
        if cancel.is_cancelled() {
            return Err(ProjectionError::Cancelled { month });
        }
        let Some((previous, previous_debts)) = store.latest() else {
            break;
        };

        let asset = previous
            .current_asset
            .checked_add(cash_flow)
            .filter(|asset| asset.abs() <= MAX_PROJECTED_ASSET)
            .ok_or(ProjectionError::Overflow { month })?;
        let step = if debts.is_empty() {
            Step {
                current_asset: asset,
                total_remaining_debt: Decimal::ZERO,
                is_debt_free: true,
                debt_nodes: Vec::new(),
                paid_off_now: Vec::new(),
            }
        } else {
            let outcome = resolve_month(debts, previous_debts, asset, &eligibility);
            eligibility = outcome.eligibility;
            Step {
                current_asset: outcome.current_asset,
                total_remaining_debt: outcome.total_remaining_debt,
                is_debt_free: outcome.all_paid_off,
                debt_nodes: outcome.debt_nodes,
                paid_off_now: outcome.paid_off_now,
            }
        };

        let node = compute_node(
            month,
            step.current_asset,
            step.total_remaining_debt,
            step.is_debt_free,
            session,
            config,
        );
        events = events.observe(
            Some(previous),
            &node,
            InvestingBaseline {
                cash_flow,
                asset: step.current_asset,
            },
        );

        for idx in step.paid_off_now {
            if payoff_months[idx].is_none() {
                payoff_months[idx] = Some(month);
                debug!(session_id = session.session_id, debt_id = debts[idx].id, month, "debt paid off");
            }
        }

        let bankrupt = node.current_asset <= Decimal::ZERO;
        push_chart_points(&mut series, &calendar, &node, debts, &step.debt_nodes);
        store.push(node, step.debt_nodes);

        if bankrupt {
            debug!(session_id = session.session_id, month, "asset exhausted");
            events = events.record_bankruptcy(month);
            stop_reason = StopReason::Bankrupt;
            break;
        }
    }

    let debt_payoffs = debts
        .iter()
        .zip(payoff_months)
        .map(|(debt, month)| DebtPayoff {
            debt_id: debt.id,
            name: debt.name.clone(),
            paid_off_on: month.and_then(|m| calendar.date_at(m)),
        })
        .collect();

    Ok(Projection {
        start: calendar.start(),
        snapshot,
        forecast: events.into_dates(&calendar, config),
        debt_payoffs,
        series,
        stop_reason,
        store,
    })
}

fn push_chart_points(
    series: &mut Vec<ChartPoint>,
    calendar: &Calendar,
    node: &Node,
    debts: &[Debt],
    debt_nodes: &[DebtNode],
) {
    let key = calendar
        .date_at(node.month)
        .map(format_month_year)
        .unwrap_or_else(|| node.month.to_string());

    series.push(ChartPoint {
        group: ASSETS_GROUP.to_string(),
        key: key.clone(),
        month: node.month,
        asset: Some(non_negative(node.current_asset)),
        debt: None,
    });
    for (debt, debt_node) in debts.iter().zip(debt_nodes) {
        series.push(ChartPoint {
            group: debt.name.clone(),
            key: key.clone(),
            month: node.month,
            asset: None,
            debt: Some(debt_node.remaining_amount),
        });
    }
}
