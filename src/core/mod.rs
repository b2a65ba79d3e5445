mod calendar;
mod cascade;
mod engine;
mod milestones;
mod money;
mod node;
mod store;
mod timeline;
mod types;

pub use calendar::{Calendar, format_month_year};
pub use cascade::{CascadeOutcome, Eligibility, amortized_principal, resolve_month, seed_debt_nodes};
pub use engine::{
    Projection, ProjectionError, ProjectionSummary, compute_current_snapshot, run_projection,
};
pub use milestones::{DebtPayoff, ForecastDates, ForecastEvents, InvestingBaseline, Milestone};
pub use money::{non_negative, round2};
pub use node::{classify_status, compute_node};
pub use store::NodeStore;
pub use timeline::{TimelineEvent, build_timeline};
pub use types::{
    ASSETS_GROUP, BudgetStatus, ChartPoint, Debt, DebtNode, MAX_AMOUNT, MAX_ANNUAL_INTEREST_RATE,
    Node, ProjectionConfig, SessionFinancials, StopReason,
};
