use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::money::{non_negative, round2};
use super::types::{Debt, DebtNode};

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Which debts may be paid off with a lump sum. Debt 0 starts eligible; the
/// next debt is promoted when the previous one is paid off, effective the
/// following month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eligibility(Vec<bool>);

impl Eligibility {
    pub fn initial(debt_count: usize) -> Self {
        let mut flags = vec![false; debt_count];
        if let Some(first) = flags.first_mut() {
            *first = true;
        }
        Self(flags)
    }

    pub fn is_eligible(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    fn promote(&mut self, index: usize) {
        if let Some(flag) = self.0.get_mut(index) {
            *flag = true;
        }
    }
}

#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub debt_nodes: Vec<DebtNode>,
    pub total_remaining_debt: Decimal,
    pub current_asset: Decimal,
    pub all_paid_off: bool,
    /// Eligibility for the next month.
    pub eligibility: Eligibility,
    /// Indices of debts that reached zero during this month.
    pub paid_off_now: Vec<usize>,
}

/// Principal retired by one regular payment.
pub fn amortized_principal(monthly_payment: Decimal, annual_interest_rate: Decimal) -> Decimal {
    let interest = round2(annual_interest_rate / MONTHS_PER_YEAR * monthly_payment);
    round2(monthly_payment - interest)
}

pub fn seed_debt_nodes(debts: &[Debt], eligibility: &Eligibility) -> Vec<DebtNode> {
    debts
        .iter()
        .enumerate()
        .map(|(idx, debt)| DebtNode {
            debt_id: debt.id,
            remaining_amount: non_negative(debt.remaining_amount),
            monthly_payment: debt.monthly_payment,
            is_eligible_for_accelerated_payoff: eligibility.is_eligible(idx),
            is_paid_off: false,
        })
        .collect()
}

/// Services every debt for one month, in priority order. `current_asset` is
/// the asset after the month's income and expenses. Settled debts cost
/// nothing, which frees their payment for the rest of the cascade.
pub fn resolve_month(
    debts: &[Debt],
    previous: &[DebtNode],
    current_asset: Decimal,
    eligibility: &Eligibility,
) -> CascadeOutcome {
    let total_monthly_payment_debt: Decimal = debts.iter().map(|d| d.monthly_payment).sum();
    let mut asset = current_asset;
    let mut next_eligibility = eligibility.clone();
    let mut total_remaining_debt = Decimal::ZERO;
    let mut paid_off_now = Vec::new();
    let mut debt_nodes = Vec::with_capacity(debts.len());

    for (idx, (debt, prev)) in debts.iter().zip(previous).enumerate() {
        let payment = debt.monthly_payment;
        let eligible = eligibility.is_eligible(idx);

        if prev.is_paid_off || prev.remaining_amount <= Decimal::ZERO {
            if !prev.is_paid_off {
                paid_off_now.push(idx);
                next_eligibility.promote(idx + 1);
            }
            debt_nodes.push(DebtNode {
                debt_id: debt.id,
                remaining_amount: Decimal::ZERO,
                monthly_payment: payment,
                is_eligible_for_accelerated_payoff: eligible,
                is_paid_off: true,
            });
            continue;
        }

        let candidate =
            prev.remaining_amount - amortized_principal(payment, debt.annual_interest_rate);
        let other_payments = total_monthly_payment_debt - payment;
        let after_lump_sum = asset - candidate;

        let (remaining, is_paid_off) = if eligible
            && candidate > Decimal::ZERO
            && after_lump_sum > Decimal::ZERO
            && after_lump_sum > other_payments
        {
            asset = after_lump_sum;
            (Decimal::ZERO, true)
        } else {
            asset -= payment;
            let remaining = non_negative(round2(candidate));
            (remaining, remaining == Decimal::ZERO)
        };

        if is_paid_off {
            paid_off_now.push(idx);
            next_eligibility.promote(idx + 1);
        }

        total_remaining_debt += remaining;
        debt_nodes.push(DebtNode {
            debt_id: debt.id,
            remaining_amount: remaining,
            monthly_payment: payment,
            is_eligible_for_accelerated_payoff: eligible,
            is_paid_off,
        });
    }

    let all_paid_off = debt_nodes.iter().all(|n| n.is_paid_off);

    CascadeOutcome {
        debt_nodes,
        total_remaining_debt,
        current_asset: asset,
        all_paid_off,
        eligibility: next_eligibility,
        paid_off_now,
    }
}
