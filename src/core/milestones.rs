use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use super::calendar::Calendar;
use super::money::non_negative;
use super::types::{Node, ProjectionConfig};

/// Upper bound on how far the millionaire extrapolation may reach.
const MAX_EXTRAPOLATED_MONTHS: u32 = 12_000;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Milestone {
    EmergencyFund,
    RainydayFund,
    StartInvesting,
    FinancialFreedom,
    Millionaire,
    Bankrupt,
    DebtPaidOff,
}

impl Milestone {
    pub fn title(self) -> &'static str {
        match self {
            Milestone::EmergencyFund => "Emergency fund complete",
            Milestone::RainydayFund => "Rainy day fund complete",
            Milestone::StartInvesting => "Start investing",
            Milestone::FinancialFreedom => "Financial freedom",
            Milestone::Millionaire => "Millionaire",
            Milestone::Bankrupt => "Bankrupt",
            Milestone::DebtPaidOff => "Debt paid off",
        }
    }
}

/// Where the millionaire extrapolation starts from: the month's income less
/// expenses, and the asset before investment growth was added.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvestingBaseline {
    pub cash_flow: Decimal,
    pub asset: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastEvents {
    emergency_fund: Option<u32>,
    rainyday_fund: Option<u32>,
    start_investing: Option<u32>,
    financial_freedom: Option<u32>,
    bankrupt: Option<u32>,
    investing_baseline: Option<InvestingBaseline>,
}

fn first_transition(recorded: Option<u32>, was: bool, is: bool, month: u32) -> Option<u32> {
    recorded.or((!was && is).then_some(month))
}

impl ForecastEvents {
    /// Compares `current` to the month before it. Month 0 has no predecessor
    /// and is compared to a month where nothing was achieved. `baseline` is
    /// kept only for the month investing starts.
    pub fn observe(
        self,
        previous: Option<&Node>,
        current: &Node,
        baseline: InvestingBaseline,
    ) -> Self {
        let was = |flag: fn(&Node) -> bool| previous.is_some_and(flag);
        let month = current.month;

        let start_investing = first_transition(
            self.start_investing,
            was(|n| n.achieved_investing),
            current.achieved_investing,
            month,
        );
        let investing_baseline = match (self.investing_baseline, start_investing) {
            (None, Some(m)) if m == month => Some(baseline),
            (kept, _) => kept,
        };

        Self {
            emergency_fund: first_transition(
                self.emergency_fund,
                was(|n| n.achieved_emergency_fund),
                current.achieved_emergency_fund,
                month,
            ),
            rainyday_fund: first_transition(
                self.rainyday_fund,
                was(|n| n.achieved_rainyday_fund),
                current.achieved_rainyday_fund,
                month,
            ),
            start_investing,
            financial_freedom: first_transition(
                self.financial_freedom,
                was(|n| n.achieved_financial_freedom),
                current.achieved_financial_freedom,
                month,
            ),
            bankrupt: self.bankrupt,
            investing_baseline,
        }
    }

    pub fn record_bankruptcy(self, month: u32) -> Self {
        Self {
            bankrupt: self.bankrupt.or(Some(month)),
            ..self
        }
    }

    /// Months from the projection start until the asset reaches the
    /// millionaire target, extrapolated linearly from the month investing
    /// began and scaled by the configured horizon divisor.
    pub fn millionaire_month(&self, config: &ProjectionConfig) -> Option<u32> {
        let baseline = self.investing_baseline?;
        if baseline.cash_flow <= Decimal::ZERO || baseline.asset <= Decimal::ZERO {
            return None;
        }
        let remaining = non_negative(config.millionaire_target - baseline.asset);
        let months = remaining
            .checked_div(baseline.cash_flow)?
            .checked_div(config.millionaire_horizon_divisor)?
            .trunc();
        Some(
            months
                .to_u32()
                .unwrap_or(MAX_EXTRAPOLATED_MONTHS)
                .min(MAX_EXTRAPOLATED_MONTHS),
        )
    }

    pub fn into_dates(self, calendar: &Calendar, config: &ProjectionConfig) -> ForecastDates {
        let at = |month: Option<u32>| month.and_then(|m| calendar.date_at(m));
        ForecastDates {
            emergency_fund: at(self.emergency_fund),
            rainyday_fund: at(self.rainyday_fund),
            start_investing: at(self.start_investing),
            financial_freedom: at(self.financial_freedom),
            millionaire: at(self.millionaire_month(config)),
            bankrupt: at(self.bankrupt),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDates {
    pub emergency_fund: Option<NaiveDate>,
    pub rainyday_fund: Option<NaiveDate>,
    pub start_investing: Option<NaiveDate>,
    pub financial_freedom: Option<NaiveDate>,
    pub millionaire: Option<NaiveDate>,
    pub bankrupt: Option<NaiveDate>,
}

impl ForecastDates {
    pub fn entries(&self) -> [(Milestone, Option<NaiveDate>); 6] {
        [
            (Milestone::EmergencyFund, self.emergency_fund),
            (Milestone::RainydayFund, self.rainyday_fund),
            (Milestone::StartInvesting, self.start_investing),
            (Milestone::FinancialFreedom, self.financial_freedom),
            (Milestone::Millionaire, self.millionaire),
            (Milestone::Bankrupt, self.bankrupt),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPayoff {
    pub debt_id: i64,
    pub name: String,
    pub paid_off_on: Option<NaiveDate>,
}
