use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::money::round2;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum BudgetStatus {
    #[serde(rename = "BD")]
    BudgetDeficit,
    #[serde(rename = "PC2PC")]
    PaycheckToPaycheck,
    #[serde(rename = "LFF")]
    LimitedFlexibility,
    #[serde(rename = "GFF")]
    GoodFlexibility,
    #[default]
    #[serde(rename = "DEFAULT")]
    Default,
}

impl BudgetStatus {
    pub fn code(self) -> &'static str {
        match self {
            BudgetStatus::BudgetDeficit => "BD",
            BudgetStatus::PaycheckToPaycheck => "PC2PC",
            BudgetStatus::LimitedFlexibility => "LFF",
            BudgetStatus::GoodFlexibility => "GFF",
            BudgetStatus::Default => "DEFAULT",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BudgetStatus::BudgetDeficit => "Budget Deficit",
            BudgetStatus::PaycheckToPaycheck => "Pay Check to Pay Check",
            BudgetStatus::LimitedFlexibility => "Limited financial flexibility",
            BudgetStatus::GoodFlexibility => "Good financial flexibility",
            BudgetStatus::Default => "Default",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BudgetStatus::BudgetDeficit => {
                "Monthly spending exceeds monthly income. Raise income or cut expenses to bring the budget back into balance."
            }
            BudgetStatus::PaycheckToPaycheck => {
                "Income barely covers expenses and little is left at the end of the month, so there is no cushion for surprises."
            }
            BudgetStatus::LimitedFlexibility => {
                "Some money is left over each month, but not enough to comfortably save or invest."
            }
            BudgetStatus::GoodFlexibility => {
                "Monthly net income exceeds essential expenses, leaving room to build the emergency and rainy day funds and to invest."
            }
            BudgetStatus::Default => "Not enough information to classify this budget.",
        }
    }
}

/// Largest balance, income, expense or debt figure a projection accepts.
pub const MAX_AMOUNT: Decimal = dec!(1_000_000_000_000_000);

pub const MAX_ANNUAL_INTEREST_RATE: Decimal = dec!(10);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub id: i64,
    pub name: String,
    pub remaining_amount: Decimal,
    pub monthly_payment: Decimal,
    pub annual_interest_rate: Decimal,
}

/// `debts` must already be in payoff priority order.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionFinancials {
    pub session_id: i64,
    pub current_balance: Decimal,
    pub total_essential_expense: Decimal,
    pub total_non_essential_expense: Decimal,
    pub total_all_income: Decimal,
    pub debts: Vec<Debt>,
}

impl SessionFinancials {
    pub fn total_all_expense(&self) -> Decimal {
        round2(self.total_essential_expense + self.total_non_essential_expense)
    }

    pub fn total_monthly_payment_debt(&self) -> Decimal {
        round2(self.debts.iter().map(|d| d.monthly_payment).sum())
    }

    pub fn total_remaining_debt(&self) -> Decimal {
        round2(self.debts.iter().map(|d| d.remaining_amount.max(Decimal::ZERO)).sum())
    }

    pub fn monthly_net_flow(&self) -> Decimal {
        self.total_all_income - (self.total_monthly_payment_debt() + self.total_all_expense())
    }

    pub fn cash_flow_before_debt(&self) -> Decimal {
        self.total_all_income - self.total_all_expense()
    }

    pub fn out_of_range_field(&self) -> Option<&'static str> {
        let totals = [
            ("currentBalance", self.current_balance),
            ("totalEssentialExpense", self.total_essential_expense),
            ("totalNonEssentialExpense", self.total_non_essential_expense),
            ("totalAllIncome", self.total_all_income),
        ];
        totals
            .into_iter()
            .find(|(_, amount)| amount.abs() > MAX_AMOUNT)
            .map(|(field, _)| field)
            .or_else(|| self.debts.iter().find_map(Debt::out_of_range_field))
    }
}

impl Debt {
    fn out_of_range_field(&self) -> Option<&'static str> {
        if self.remaining_amount.abs() > MAX_AMOUNT {
            Some("remainingAmount")
        } else if self.monthly_payment.abs() > MAX_AMOUNT {
            Some("monthlyPayment")
        } else if self.annual_interest_rate.abs() > MAX_ANNUAL_INTEREST_RATE {
            Some("annualInterest")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionConfig {
    pub emergency_fund_months: Decimal,
    pub rainyday_fund_months: Decimal,
    pub fun_fund_rate: Decimal,
    pub retirement_plan_years: Decimal,
    pub investment_growth_rate: Decimal,
    pub paycheck_ceiling: Decimal,
    pub millionaire_target: Decimal,
    pub millionaire_horizon_divisor: Decimal,
    pub horizon_years: u32,
    pub max_horizon_months: u32,
    pub milestone_day: u32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            emergency_fund_months: dec!(6),
            rainyday_fund_months: dec!(3),
            fun_fund_rate: dec!(0.20),
            retirement_plan_years: dec!(10),
            investment_growth_rate: dec!(0.00966),
            paycheck_ceiling: dec!(200),
            millionaire_target: dec!(1_000_000),
            millionaire_horizon_divisor: dec!(2),
            horizon_years: 2,
            max_horizon_months: 1_200,
            milestone_day: 26,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub month: u32,
    pub current_asset: Decimal,
    pub total_all_income: Decimal,
    pub total_all_expense: Decimal,
    pub total_monthly_payment_debt: Decimal,
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
    pub is_debt_free: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtNode {
    pub debt_id: i64,
    pub remaining_amount: Decimal,
    pub monthly_payment: Decimal,
    pub is_eligible_for_accelerated_payoff: bool,
    pub is_paid_off: bool,
}

pub const ASSETS_GROUP: &str = "Assets";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub group: String,
    pub key: String,
    pub month: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    HorizonReached,
    Bankrupt,
}
