use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{
    BudgetStatus, Debt, ForecastDates, MAX_AMOUNT, MAX_ANNUAL_INTEREST_RATE, Node,
    SessionFinancials, format_month_year, round2,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("session {0} not found")]
    SessionNotFound(i64),
    #[error("debt {0} not found")]
    DebtNotFound(i64),
    #[error("duplicate session id {0}")]
    DuplicateSession(i64),
    #[error("session {session_id}: {field} is out of range")]
    AmountOutOfRange { session_id: i64, field: &'static str },
    #[error("invalid seed data: {0}")]
    InvalidSeed(#[from] serde_json::Error),
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage unavailable: {0}")]
    Storage(String),
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncomeKind {
    #[default]
    Monthly,
    Passive,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseKind {
    #[default]
    Essential,
    NonEssential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRecord {
    pub id: i64,
    pub name: String,
    pub amount: Decimal,
    #[serde(default, rename = "type")]
    pub kind: IncomeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: i64,
    pub name: String,
    pub amount: Decimal,
    #[serde(default, rename = "type")]
    pub kind: ExpenseKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtRecord {
    pub id: i64,
    pub name: String,
    pub remaining_amount: Decimal,
    pub monthly_payment: Decimal,
    pub annual_interest: Decimal,
    #[serde(default)]
    pub forecast_paid_off_date: String,
}

/// Month-0 figures stored on the session after each computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub total_income: Decimal,
    pub total_essential_expense: Decimal,
    pub total_non_essential_expense: Decimal,
    pub total_all_expense: Decimal,
    pub monthly_payment_debt: Decimal,
    pub monthly_net_flow: Decimal,
    pub status: BudgetStatus,
    pub expected_emergency_fund: Decimal,
    pub expected_rainyday_fund: Decimal,
    pub expected_fun_fund: Decimal,
    pub actual_emergency_fund: Decimal,
    pub actual_rainyday_fund: Decimal,
    pub actual_fun_fund: Decimal,
    pub retirement_plan_target: Decimal,
    pub achieved_emergency_fund: bool,
    pub achieved_rainyday_fund: bool,
    pub achieved_investing: bool,
    pub achieved_retirement_plan: bool,
    pub achieved_financial_freedom: bool,
}

impl SessionSnapshot {
    pub fn from_node(node: &Node, session: &SessionFinancials) -> Self {
        Self {
            total_income: node.total_all_income,
            total_essential_expense: round2(session.total_essential_expense),
            total_non_essential_expense: round2(session.total_non_essential_expense),
            total_all_expense: node.total_all_expense,
            monthly_payment_debt: node.total_monthly_payment_debt,
            monthly_net_flow: node.monthly_net_flow,
            status: node.status,
            expected_emergency_fund: node.expected_emergency_fund,
            expected_rainyday_fund: node.expected_rainyday_fund,
            expected_fun_fund: node.expected_fun_fund,
            actual_emergency_fund: node.actual_emergency_fund,
            actual_rainyday_fund: node.actual_rainyday_fund,
            actual_fun_fund: node.actual_fun_fund,
            retirement_plan_target: node.retirement_plan_target,
            achieved_emergency_fund: node.achieved_emergency_fund,
            achieved_rainyday_fund: node.achieved_rainyday_fund,
            achieved_investing: node.achieved_investing,
            achieved_retirement_plan: node.achieved_retirement_plan,
            achieved_financial_freedom: node.achieved_financial_freedom,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastFields {
    pub forecast_emergency_fund: String,
    pub forecast_rainyday_fund: String,
    pub forecast_start_investing: String,
    pub forecast_financial_freedom: String,
    pub forecast_millionaire: String,
    pub forecast_bankrupt: String,
}

pub fn format_forecast(date: Option<chrono::NaiveDate>) -> String {
    date.map(format_month_year).unwrap_or_default()
}

impl From<&ForecastDates> for ForecastFields {
    fn from(dates: &ForecastDates) -> Self {
        Self {
            forecast_emergency_fund: format_forecast(dates.emergency_fund),
            forecast_rainyday_fund: format_forecast(dates.rainyday_fund),
            forecast_start_investing: format_forecast(dates.start_investing),
            forecast_financial_freedom: format_forecast(dates.financial_freedom),
            forecast_millionaire: format_forecast(dates.millionaire),
            forecast_bankrupt: format_forecast(dates.bankrupt),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: i64,
    #[serde(default)]
    pub current_balance: Decimal,
    #[serde(default)]
    pub incomes: Vec<IncomeRecord>,
    #[serde(default)]
    pub expenses: Vec<ExpenseRecord>,
    #[serde(default)]
    pub debts: Vec<DebtRecord>,
    #[serde(default)]
    pub snapshot: Option<SessionSnapshot>,
    #[serde(default)]
    pub forecast: ForecastFields,
}

impl SessionRecord {
    pub fn financials(&self) -> SessionFinancials {
        let expense_total = |kind: ExpenseKind| -> Decimal {
            self.expenses
                .iter()
                .filter(|e| e.kind == kind)
                .map(|e| e.amount)
                .sum()
        };

        SessionFinancials {
            session_id: self.id,
            current_balance: self.current_balance,
            total_essential_expense: expense_total(ExpenseKind::Essential),
            total_non_essential_expense: expense_total(ExpenseKind::NonEssential),
            total_all_income: self.incomes.iter().map(|i| i.amount).sum(),
            debts: self
                .debts
                .iter()
                .map(|d| Debt {
                    id: d.id,
                    name: d.name.clone(),
                    remaining_amount: d.remaining_amount,
                    monthly_payment: d.monthly_payment,
                    annual_interest_rate: d.annual_interest,
                })
                .collect(),
        }
    }

    /// The first stored figure too large to sum or project safely.
    pub fn out_of_range_field(&self) -> Option<&'static str> {
        let too_large = |amount: Decimal| amount.abs() > MAX_AMOUNT;
        if too_large(self.current_balance) {
            Some("currentBalance")
        } else if self.incomes.iter().any(|i| too_large(i.amount)) {
            Some("incomes.amount")
        } else if self.expenses.iter().any(|e| too_large(e.amount)) {
            Some("expenses.amount")
        } else if self.debts.iter().any(|d| too_large(d.remaining_amount)) {
            Some("debts.remainingAmount")
        } else if self.debts.iter().any(|d| too_large(d.monthly_payment)) {
            Some("debts.monthlyPayment")
        } else if self
            .debts
            .iter()
            .any(|d| d.annual_interest.abs() > MAX_ANNUAL_INTEREST_RATE)
        {
            Some("debts.annualInterest")
        } else {
            None
        }
    }
}

/// Highest interest first, then the smallest balance.
pub fn sort_by_payoff_priority(debts: &mut [DebtRecord]) {
    debts.sort_by(|a, b| {
        b.annual_interest
            .cmp(&a.annual_interest)
            .then(a.remaining_amount.cmp(&b.remaining_amount))
    });
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    CurrentBalance(Decimal),
    Snapshot(SessionSnapshot),
    Forecast(ForecastFields),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebtUpdate {
    ForecastPaidOffDate(String),
}

pub trait SessionRepository: Send + Sync {
    /// Debts come back in payoff priority order.
    fn load_session(&self, session_id: i64) -> Result<SessionRecord, RepoError>;

    /// Applies one update atomically.
    fn update_session(&self, session_id: i64, update: SessionUpdate) -> Result<(), RepoError>;

    fn update_debt(&self, debt_id: i64, update: DebtUpdate) -> Result<(), RepoError>;
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    sessions: RwLock<HashMap<i64, SessionRecord>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<SessionRecord>) -> Result<Self, RepoError> {
        let mut sessions = HashMap::with_capacity(records.len());
        for record in records {
            let id = record.id;
            if let Some(field) = record.out_of_range_field() {
                return Err(RepoError::AmountOutOfRange { session_id: id, field });
            }
            if sessions.insert(id, record).is_some() {
                return Err(RepoError::DuplicateSession(id));
            }
        }
        Ok(Self {
            sessions: RwLock::new(sessions),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, RepoError> {
        Self::from_records(serde_json::from_str(json)?)
    }

    pub fn from_seed_file(path: &Path) -> Result<Self, RepoError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<i64, SessionRecord>>, RepoError> {
        self.sessions
            .read()
            .map_err(|_| RepoError::Storage("session store lock poisoned".to_string()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<i64, SessionRecord>>, RepoError> {
        self.sessions
            .write()
            .map_err(|_| RepoError::Storage("session store lock poisoned".to_string()))
    }
}

impl SessionRepository for MemoryRepository {
    fn load_session(&self, session_id: i64) -> Result<SessionRecord, RepoError> {
        let mut record = self
            .read()?
            .get(&session_id)
            .cloned()
            .ok_or(RepoError::SessionNotFound(session_id))?;
        sort_by_payoff_priority(&mut record.debts);
        Ok(record)
    }

    fn update_session(&self, session_id: i64, update: SessionUpdate) -> Result<(), RepoError> {
        let mut sessions = self.write()?;
        let record = sessions
            .get_mut(&session_id)
            .ok_or(RepoError::SessionNotFound(session_id))?;
        match update {
            SessionUpdate::CurrentBalance(balance) => record.current_balance = balance,
            SessionUpdate::Snapshot(snapshot) => record.snapshot = Some(snapshot),
            SessionUpdate::Forecast(forecast) => record.forecast = forecast,
        }
        Ok(())
    }

    fn update_debt(&self, debt_id: i64, update: DebtUpdate) -> Result<(), RepoError> {
        let mut sessions = self.write()?;
        let debt = sessions
            .values_mut()
            .flat_map(|s| s.debts.iter_mut())
            .find(|d| d.id == debt_id)
            .ok_or(RepoError::DebtNotFound(debt_id))?;
        match update {
            DebtUpdate::ForecastPaidOffDate(date) => debt.forecast_paid_off_date = date,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SEED: &str = r#"[
        {
            "id": 1,
            "currentBalance": 2500.5,
            "incomes": [
                { "id": 1, "name": "Salary", "amount": 4000 },
                { "id": 2, "name": "Rent", "amount": 350.25, "type": "PASSIVE" }
            ],
            "expenses": [
                { "id": 1, "name": "Housing", "amount": 1200 },
                { "id": 2, "name": "Food", "amount": 400, "type": "ESSENTIAL" },
                { "id": 3, "name": "Travel", "amount": 250, "type": "NON_ESSENTIAL" }
            ],
            "debts": [
                { "id": 10, "name": "Car", "remainingAmount": 9000, "monthlyPayment": 300, "annualInterest": 0.06 },
                { "id": 11, "name": "Card B", "remainingAmount": 2500, "monthlyPayment": 100, "annualInterest": 0.22 },
                { "id": 12, "name": "Card A", "remainingAmount": 800, "monthlyPayment": 50, "annualInterest": 0.22 }
            ]
        },
        { "id": 2 }
    ]"#;

    #[test]
    fn seed_loads_and_derives_totals() {
        let repo = MemoryRepository::from_json(SEED).expect("valid seed");
        let record = repo.load_session(1).expect("session exists");
        let financials = record.financials();

        assert_eq!(financials.current_balance, dec!(2500.5));
        assert_eq!(financials.total_all_income, dec!(4350.25));
        assert_eq!(financials.total_essential_expense, dec!(1600));
        assert_eq!(financials.total_non_essential_expense, dec!(250));

        let order: Vec<i64> = financials.debts.iter().map(|d| d.id).collect();
        assert_eq!(order, vec![12, 11, 10]);

        let empty = repo.load_session(2).expect("session exists").financials();
        assert!(empty.debts.is_empty());
        assert_eq!(empty.total_all_income, dec!(0));
    }

    #[test]
    fn missing_records_are_reported() {
        let repo = MemoryRepository::from_json(SEED).expect("valid seed");
        assert!(matches!(repo.load_session(99), Err(RepoError::SessionNotFound(99))));
        assert!(matches!(
            repo.update_session(99, SessionUpdate::CurrentBalance(dec!(1))),
            Err(RepoError::SessionNotFound(99))
        ));
        assert!(matches!(
            repo.update_debt(404, DebtUpdate::ForecastPaidOffDate(String::new())),
            Err(RepoError::DebtNotFound(404))
        ));
    }

    #[test]
    fn updates_are_applied() {
        let repo = MemoryRepository::from_json(SEED).expect("valid seed");
        repo.update_session(1, SessionUpdate::CurrentBalance(dec!(10)))
            .expect("updated");
        repo.update_session(
            1,
            SessionUpdate::Forecast(ForecastFields {
                forecast_bankrupt: "Mar 2027".to_string(),
                ..ForecastFields::default()
            }),
        )
        .expect("updated");
        repo.update_debt(11, DebtUpdate::ForecastPaidOffDate("Jan 2027".to_string()))
            .expect("updated");

        let record = repo.load_session(1).expect("session exists");
        assert_eq!(record.current_balance, dec!(10));
        assert_eq!(record.forecast.forecast_bankrupt, "Mar 2027");
        let card = record.debts.iter().find(|d| d.id == 11).expect("debt exists");
        assert_eq!(card.forecast_paid_off_date, "Jan 2027");
    }

    #[test]
    fn duplicate_sessions_are_rejected() {
        let err = MemoryRepository::from_json(r#"[{ "id": 3 }, { "id": 3 }]"#).unwrap_err();
        assert!(matches!(err, RepoError::DuplicateSession(3)));
    }

    #[test]
    fn oversized_amounts_are_rejected_at_load() {
        let err = MemoryRepository::from_json(r#"[{ "id": 4, "currentBalance": 1e20 }]"#).unwrap_err();
        assert!(matches!(
            err,
            RepoError::AmountOutOfRange { session_id: 4, field: "currentBalance" }
        ));

        let err = MemoryRepository::from_json(
            r#"[{ "id": 6, "expenses": [{ "id": 1, "name": "Yacht", "amount": 5e18 }] }]"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RepoError::AmountOutOfRange { session_id: 6, field: "expenses.amount" }
        ));

        let err = MemoryRepository::from_json(
            r#"[{ "id": 8, "debts": [{ "id": 1, "name": "Card", "remainingAmount": 10, "monthlyPayment": 1, "annualInterest": 40 }] }]"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RepoError::AmountOutOfRange { session_id: 8, field: "debts.annualInterest" }
        ));
    }

    #[test]
    fn malformed_seed_is_rejected() {
        let err = MemoryRepository::from_json(r#"{ "id": 1 }"#).unwrap_err();
        assert!(matches!(err, RepoError::InvalidSeed(_)));
    }

    #[test]
    fn forecast_fields_are_empty_when_unset() {
        let dates = ForecastDates {
            millionaire: chrono::NaiveDate::from_ymd_opt(2040, 2, 26),
            ..ForecastDates::default()
        };
        let fields = ForecastFields::from(&dates);
        assert_eq!(fields.forecast_millionaire, "Feb 2040");
        assert_eq!(fields.forecast_emergency_fund, "");
        assert_eq!(fields.forecast_bankrupt, "");
    }
}
