use std::sync::Arc;

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::{
    BudgetStatus, ChartPoint, MAX_AMOUNT, Projection, ProjectionConfig, ProjectionError,
    SessionFinancials, TimelineEvent, build_timeline, compute_current_snapshot, run_projection,
};
use crate::repository::{
    DebtRecord, DebtUpdate, ForecastFields, RepoError, SessionRecord, SessionRepository,
    SessionSnapshot, SessionUpdate, format_forecast,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthCustomer {
    pub session_id: i64,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("session {0} not found")]
    SessionNotFound(i64),
    #[error("debt {0} not found")]
    DebtNotFound(i64),
    #[error("missing or invalid session credentials")]
    Unauthorized,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("projection cancelled")]
    Cancelled,
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::SessionNotFound(_) | Self::DebtNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Persistence(_) | Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::SessionNotFound(id) => Self::SessionNotFound(id),
            RepoError::DebtNotFound(id) => Self::DebtNotFound(id),
            other => Self::Persistence(other.to_string()),
        }
    }
}

impl From<ProjectionError> for ServiceError {
    fn from(err: ProjectionError) -> Self {
        match err {
            ProjectionError::Cancelled { .. } => Self::Cancelled,
            ProjectionError::AmountOutOfRange { .. } | ProjectionError::Overflow { .. } => {
                Self::InvalidInput(err.to_string())
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let mut response = (
            self.status_code(),
            Json(ErrorResponse {
                error: self.public_message(),
            }),
        )
            .into_response();
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("no-store"),
        );
        response
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub code: BudgetStatus,
    pub label: &'static str,
    pub description: &'static str,
}

impl From<BudgetStatus> for StatusView {
    fn from(status: BudgetStatus) -> Self {
        Self {
            code: status,
            label: status.label(),
            description: status.description(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: i64,
    pub current_balance: Decimal,
    pub budget_status: StatusView,
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
    #[serde(flatten)]
    pub forecast: ForecastFields,
    pub debts: Vec<DebtRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub data: Vec<ChartPoint>,
    pub debts: Vec<DebtRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub data: Vec<TimelineEvent>,
}

#[derive(Clone)]
pub struct SessionService {
    repo: Arc<dyn SessionRepository>,
    config: ProjectionConfig,
}

impl SessionService {
    pub fn new(repo: Arc<dyn SessionRepository>, config: ProjectionConfig) -> Self {
        Self { repo, config }
    }

    /// Month-0 view of the session. The derived figures are written back to
    /// the session before returning.
    pub fn compute_current_snapshot(&self, auth: AuthCustomer) -> Result<SessionView, ServiceError> {
        let record = self.repo.load_session(auth.session_id)?;
        let financials = checked_financials(&record)?;
        let snapshot = self.persist_snapshot(&financials)?;

        Ok(SessionView {
            session_id: record.id,
            current_balance: record.current_balance,
            budget_status: snapshot.status.into(),
            snapshot,
            forecast: record.forecast,
            debts: record.debts,
        })
    }

    pub fn update_current_balance(
        &self,
        auth: AuthCustomer,
        balance: Decimal,
    ) -> Result<(), ServiceError> {
        if balance < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "currentBalance must be >= 0".to_string(),
            ));
        }
        if balance > MAX_AMOUNT {
            return Err(ServiceError::InvalidInput(format!(
                "currentBalance must be <= {MAX_AMOUNT}"
            )));
        }
        self.repo
            .update_session(auth.session_id, SessionUpdate::CurrentBalance(balance))?;
        info!(session_id = auth.session_id, "current balance updated");
        Ok(())
    }

    pub fn generate_chart_series(
        &self,
        auth: AuthCustomer,
        today: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<ChartSeries, ServiceError> {
        let (record, projection) = self.project_and_persist(auth, today, cancel)?;
        Ok(ChartSeries {
            data: projection.series,
            debts: record.debts,
        })
    }

    pub fn generate_timeline(
        &self,
        auth: AuthCustomer,
        today: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Timeline, ServiceError> {
        let (_, projection) = self.project_and_persist(auth, today, cancel)?;
        Ok(Timeline {
            data: build_timeline(&projection.forecast, &projection.debt_payoffs),
        })
    }

    fn persist_snapshot(&self, financials: &SessionFinancials) -> Result<SessionSnapshot, ServiceError> {
        let node = compute_current_snapshot(financials, &self.config);
        let snapshot = SessionSnapshot::from_node(&node, financials);
        self.repo
            .update_session(financials.session_id, SessionUpdate::Snapshot(snapshot.clone()))
            .inspect_err(|err| {
                warn!(session_id = financials.session_id, error = %err, "failed to store snapshot");
            })?;
        Ok(snapshot)
    }

    // Returns the record with its refreshed payoff dates.
    fn project_and_persist(
        &self,
        auth: AuthCustomer,
        today: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<(SessionRecord, Projection), ServiceError> {
        let mut record = self.repo.load_session(auth.session_id)?;
        let financials = checked_financials(&record)?;
        let projection = run_projection(&financials, &self.config, today, cancel)?;

        info!(
            session_id = record.id,
            months = projection.months_simulated(),
            stop_reason = ?projection.stop_reason,
            "projection finished"
        );

        self.persist_snapshot(&financials)?;

        let forecast = ForecastFields::from(&projection.forecast);
        self.repo
            .update_session(record.id, SessionUpdate::Forecast(forecast.clone()))
            .inspect_err(|err| warn!(session_id = record.id, error = %err, "failed to store forecast"))?;
        record.forecast = forecast;

        for payoff in &projection.debt_payoffs {
            let date = format_forecast(payoff.paid_off_on);
            self.repo
                .update_debt(payoff.debt_id, DebtUpdate::ForecastPaidOffDate(date.clone()))
                .inspect_err(|err| warn!(debt_id = payoff.debt_id, error = %err, "failed to store payoff date"))?;
            if let Some(debt) = record.debts.iter_mut().find(|d| d.id == payoff.debt_id) {
                debt.forecast_paid_off_date = date;
            }
        }

        Ok((record, projection))
    }
}

fn checked_financials(record: &SessionRecord) -> Result<SessionFinancials, ServiceError> {
    if let Some(field) = record.out_of_range_field() {
        return Err(ProjectionError::AmountOutOfRange { field }.into());
    }
    let financials = record.financials();
    match financials.out_of_range_field() {
        Some(field) => Err(ProjectionError::AmountOutOfRange { field }.into()),
        None => Ok(financials),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;
    use rust_decimal_macros::dec;

    const SEED: &str = r#"[
        {
            "id": 7,
            "currentBalance": 500,
            "incomes": [{ "id": 1, "name": "Salary", "amount": 1000 }],
            "expenses": [
                { "id": 1, "name": "Rent", "amount": 1000 },
                { "id": 2, "name": "Games", "amount": 500, "type": "NON_ESSENTIAL" }
            ]
        }
    ]"#;

    fn service() -> (Arc<MemoryRepository>, SessionService) {
        let repo = Arc::new(MemoryRepository::from_json(SEED).expect("valid seed"));
        let service = SessionService::new(repo.clone(), ProjectionConfig::default());
        (repo, service)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn error_status_codes() {
        assert_eq!(ServiceError::SessionNotFound(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ServiceError::DebtNotFound(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ServiceError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ServiceError::InvalidInput("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Persistence("disk".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn persistence_details_are_not_exposed() {
        let err = ServiceError::Persistence("lock poisoned at shard 3".into());
        assert_eq!(err.public_message(), "Internal server error");
        let err = ServiceError::SessionNotFound(9);
        assert_eq!(err.public_message(), "session 9 not found");
    }

    #[test]
    fn repository_errors_map_to_service_errors() {
        assert!(matches!(
            ServiceError::from(RepoError::SessionNotFound(3)),
            ServiceError::SessionNotFound(3)
        ));
        assert!(matches!(
            ServiceError::from(RepoError::Storage("down".into())),
            ServiceError::Persistence(_)
        ));
    }

    #[test]
    fn snapshot_is_returned_and_stored() {
        let (repo, service) = service();
        let view = service
            .compute_current_snapshot(AuthCustomer { session_id: 7 })
            .expect("snapshot");

        assert_eq!(view.budget_status.code, BudgetStatus::BudgetDeficit);
        assert_eq!(view.budget_status.label, "Budget Deficit");
        assert_eq!(view.snapshot.monthly_net_flow, dec!(-500));
        assert_eq!(view.snapshot.expected_emergency_fund, dec!(6000));

        let stored = repo.load_session(7).expect("session").snapshot;
        assert_eq!(stored, Some(view.snapshot));
    }

    #[test]
    fn unknown_session_is_not_found() {
        let (_, service) = service();
        let err = service
            .compute_current_snapshot(AuthCustomer { session_id: 8 })
            .unwrap_err();
        assert!(matches!(err, ServiceError::SessionNotFound(8)));
    }

    #[test]
    fn negative_balance_is_rejected() {
        let (repo, service) = service();
        let auth = AuthCustomer { session_id: 7 };
        let err = service.update_current_balance(auth, dec!(-1)).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        service.update_current_balance(auth, dec!(42.5)).expect("updated");
        assert_eq!(repo.load_session(7).expect("session").current_balance, dec!(42.5));
    }

    #[test]
    fn balance_above_ceiling_is_rejected() {
        let (repo, service) = service();
        let auth = AuthCustomer { session_id: 7 };
        let err = service
            .update_current_balance(auth, MAX_AMOUNT + dec!(1))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(repo.load_session(7).expect("session").current_balance, dec!(500));

        service.update_current_balance(auth, MAX_AMOUNT).expect("at the ceiling");
    }

    #[test]
    fn oversized_stored_balance_is_a_bad_request() {
        let (repo, service) = service();
        let auth = AuthCustomer { session_id: 7 };
        repo.update_session(7, SessionUpdate::CurrentBalance(Decimal::MAX))
            .expect("stored");

        let err = service
            .generate_chart_series(auth, today(), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = service.compute_current_snapshot(auth).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(repo.load_session(7).expect("session").snapshot.is_none());
    }

    #[test]
    fn bankrupt_forecast_is_persisted() {
        let (repo, service) = service();
        let auth = AuthCustomer { session_id: 7 };
        let timeline = service
            .generate_timeline(auth, today(), &CancellationToken::new())
            .expect("timeline");

        assert_eq!(timeline.data.len(), 1);
        assert_eq!(timeline.data[0].date, "Nov 2026");
        let stored = repo.load_session(7).expect("session").forecast;
        assert_eq!(stored.forecast_bankrupt, "Nov 2026");
        assert_eq!(stored.forecast_emergency_fund, "");
    }

    #[test]
    fn cancelled_projection_persists_nothing() {
        let (repo, service) = service();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = service
            .generate_chart_series(AuthCustomer { session_id: 7 }, today(), &cancel)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Cancelled));

        let record = repo.load_session(7).expect("session");
        assert!(record.snapshot.is_none());
        assert_eq!(record.forecast, ForecastFields::default());
    }
}
