use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::core::{MAX_AMOUNT, ProjectionConfig};

const PERCENT: Decimal = dec!(100);
const MAX_FUND_MONTHS: Decimal = dec!(1200);
const MAX_RETIREMENT_YEARS: Decimal = dec!(100);

/// Rates are given in percent.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    #[arg(
        long,
        default_value = "6",
        help = "Months of essential expenses held in the emergency fund"
    )]
    pub emergency_fund_months: Decimal,
    #[arg(
        long,
        default_value = "3",
        help = "Months of essential expenses held in the rainy day fund"
    )]
    pub rainyday_fund_months: Decimal,
    #[arg(
        long,
        default_value = "20",
        help = "Share of monthly net flow set aside as fun money, in percent"
    )]
    pub fun_fund_rate: Decimal,
    #[arg(long, default_value = "10")]
    pub retirement_plan_years: Decimal,
    #[arg(
        long,
        default_value = "0.966",
        help = "Monthly return on invested assets in percent"
    )]
    pub investment_growth_rate: Decimal,
    #[arg(
        long,
        default_value = "200",
        help = "Net flow below which a budget is paycheck to paycheck"
    )]
    pub paycheck_ceiling: Decimal,
    #[arg(long, default_value = "1000000")]
    pub millionaire_target: Decimal,
    #[arg(
        long,
        default_value = "2",
        help = "Divisor applied to the extrapolated months until the millionaire target"
    )]
    pub millionaire_horizon_divisor: Decimal,
    #[arg(
        long,
        default_value_t = 2,
        help = "Projection runs through December of the current year plus this many years"
    )]
    pub horizon_years: u32,
    #[arg(long, default_value_t = 1200)]
    pub max_horizon_months: u32,
    #[arg(
        long,
        default_value_t = 26,
        help = "Day of month every forecast date falls on"
    )]
    pub milestone_day: u32,
}

impl Default for EngineArgs {
    fn default() -> Self {
        Self {
            emergency_fund_months: dec!(6),
            rainyday_fund_months: dec!(3),
            fun_fund_rate: dec!(20),
            retirement_plan_years: dec!(10),
            investment_growth_rate: dec!(0.966),
            paycheck_ceiling: dec!(200),
            millionaire_target: dec!(1000000),
            millionaire_horizon_divisor: dec!(2),
            horizon_years: 2,
            max_horizon_months: 1200,
            milestone_day: 26,
        }
    }
}

pub fn build_config(args: &EngineArgs) -> Result<ProjectionConfig, String> {
    if !(Decimal::ZERO..=MAX_FUND_MONTHS).contains(&args.emergency_fund_months) {
        return Err(format!("--emergency-fund-months must be between 0 and {MAX_FUND_MONTHS}"));
    }

    if !(Decimal::ZERO..=MAX_FUND_MONTHS).contains(&args.rainyday_fund_months) {
        return Err(format!("--rainyday-fund-months must be between 0 and {MAX_FUND_MONTHS}"));
    }

    if !(Decimal::ZERO..=PERCENT).contains(&args.fun_fund_rate) {
        return Err("--fun-fund-rate must be between 0 and 100".to_string());
    }

    if !(Decimal::ZERO..=MAX_RETIREMENT_YEARS).contains(&args.retirement_plan_years) {
        return Err(format!(
            "--retirement-plan-years must be between 0 and {MAX_RETIREMENT_YEARS}"
        ));
    }

    if !(Decimal::ZERO..=PERCENT).contains(&args.investment_growth_rate) {
        return Err("--investment-growth-rate must be between 0 and 100".to_string());
    }

    if !(Decimal::ZERO..=MAX_AMOUNT).contains(&args.paycheck_ceiling) {
        return Err(format!("--paycheck-ceiling must be between 0 and {MAX_AMOUNT}"));
    }

    if args.millionaire_target <= Decimal::ZERO || args.millionaire_target > MAX_AMOUNT {
        return Err(format!("--millionaire-target must be > 0 and <= {MAX_AMOUNT}"));
    }

    if args.millionaire_horizon_divisor <= Decimal::ZERO {
        return Err("--millionaire-horizon-divisor must be > 0".to_string());
    }

    if args.max_horizon_months == 0 {
        return Err("--max-horizon-months must be > 0".to_string());
    }

    if !(1..=28).contains(&args.milestone_day) {
        return Err("--milestone-day must be between 1 and 28".to_string());
    }

    Ok(ProjectionConfig {
        emergency_fund_months: args.emergency_fund_months,
        rainyday_fund_months: args.rainyday_fund_months,
        fun_fund_rate: args.fun_fund_rate / PERCENT,
        retirement_plan_years: args.retirement_plan_years,
        investment_growth_rate: args.investment_growth_rate / PERCENT,
        paycheck_ceiling: args.paycheck_ceiling,
        millionaire_target: args.millionaire_target,
        millionaire_horizon_divisor: args.millionaire_horizon_divisor,
        horizon_years: args.horizon_years,
        max_horizon_months: args.max_horizon_months,
        milestone_day: args.milestone_day,
    })
}
