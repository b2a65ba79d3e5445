use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::money::{non_negative, round2};
use super::types::{BudgetStatus, Node, ProjectionConfig, SessionFinancials};

const MONTHS_PER_YEAR: Decimal = dec!(12);

#[derive(Debug, Default, Clone, Copy)]
struct FundProgress {
    actual_emergency_fund: Decimal,
    actual_rainyday_fund: Decimal,
    achieved_emergency_fund: bool,
    achieved_rainyday_fund: bool,
    achieved_investing: bool,
    achieved_retirement_plan: bool,
    achieved_financial_freedom: bool,
    investment_growth: Decimal,
}

/// `current_asset` is the asset after this month's cash flows and debt
/// servicing. Growth is added to the returned asset once both funds are full.
pub fn compute_node(
    month: u32,
    current_asset: Decimal,
    total_remaining_debt: Decimal,
    is_debt_free: bool,
    session: &SessionFinancials,
    config: &ProjectionConfig,
) -> Node {
    let essential = session.total_essential_expense;
    let total_all_expense = session.total_all_expense();
    let total_monthly_payment_debt = session.total_monthly_payment_debt();
    let monthly_net_flow =
        session.total_all_income - (total_monthly_payment_debt + total_all_expense);

    let expected_emergency_fund = round2(essential * config.emergency_fund_months);
    let expected_rainyday_fund = round2(essential * config.rainyday_fund_months);
    let expected_fun_fund = non_negative(round2(monthly_net_flow * config.fun_fund_rate));
    let retirement_plan_target =
        round2(essential * MONTHS_PER_YEAR * config.retirement_plan_years);

    let progress = if is_debt_free {
        evaluate_funds(
            current_asset,
            total_remaining_debt,
            expected_emergency_fund,
            expected_rainyday_fund,
            retirement_plan_target,
            essential,
            config,
        )
    } else {
        FundProgress::default()
    };

    let actual_fun_fund = if progress.achieved_investing {
        expected_fun_fund
    } else {
        Decimal::ZERO
    };

    Node {
        month,
        current_asset: round2(current_asset + progress.investment_growth),
        total_all_income: round2(session.total_all_income),
        total_all_expense,
        total_monthly_payment_debt,
        monthly_net_flow: round2(monthly_net_flow),
        status: classify_status(monthly_net_flow, essential, config.paycheck_ceiling),
        expected_emergency_fund,
        expected_rainyday_fund,
        expected_fun_fund,
        actual_emergency_fund: progress.actual_emergency_fund,
        actual_rainyday_fund: progress.actual_rainyday_fund,
        actual_fun_fund,
        retirement_plan_target,
        achieved_emergency_fund: progress.achieved_emergency_fund,
        achieved_rainyday_fund: progress.achieved_rainyday_fund,
        achieved_investing: progress.achieved_investing,
        achieved_retirement_plan: progress.achieved_retirement_plan,
        achieved_financial_freedom: progress.achieved_financial_freedom,
        is_debt_free,
    }
}

fn evaluate_funds(
    current_asset: Decimal,
    total_remaining_debt: Decimal,
    expected_emergency_fund: Decimal,
    expected_rainyday_fund: Decimal,
    retirement_plan_target: Decimal,
    essential: Decimal,
    config: &ProjectionConfig,
) -> FundProgress {
    let net_asset = current_asset - total_remaining_debt;

    let achieved_emergency_fund = net_asset >= expected_emergency_fund;
    let achieved_rainyday_fund = net_asset >= expected_emergency_fund + expected_rainyday_fund;

    let actual_emergency_fund = if achieved_emergency_fund {
        expected_emergency_fund
    } else {
        non_negative(round2(net_asset))
    };
    let actual_rainyday_fund = if achieved_rainyday_fund {
        expected_rainyday_fund
    } else {
        non_negative(round2(net_asset - expected_emergency_fund))
    };

    let mut progress = FundProgress {
        actual_emergency_fund,
        actual_rainyday_fund,
        achieved_emergency_fund,
        achieved_rainyday_fund,
        ..FundProgress::default()
    };

    if achieved_emergency_fund && achieved_rainyday_fund {
        progress.achieved_investing = true;

        let reinvestable = current_asset - (actual_emergency_fund + actual_rainyday_fund);
        if reinvestable >= Decimal::ZERO {
            let growth = reinvestable * config.investment_growth_rate;
            progress.investment_growth = growth;
            progress.achieved_financial_freedom = growth >= essential;
        }

        progress.achieved_retirement_plan =
            net_asset >= retirement_plan_target && retirement_plan_target > Decimal::ZERO;
    }

    progress
}

pub fn classify_status(
    monthly_net_flow: Decimal,
    essential_expense: Decimal,
    paycheck_ceiling: Decimal,
) -> BudgetStatus {
    match monthly_net_flow {
        n if n < Decimal::ZERO => BudgetStatus::BudgetDeficit,
        n if n < paycheck_ceiling => BudgetStatus::PaycheckToPaycheck,
        n if n <= essential_expense => BudgetStatus::LimitedFlexibility,
        n if n > essential_expense => BudgetStatus::GoodFlexibility,
        _ => BudgetStatus::Default,
    }
}
