use chrono::NaiveDate;
use serde::Serialize;

use super::calendar::format_month_year;
use super::milestones::{DebtPayoff, ForecastDates, Milestone};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub kind: Milestone,
    pub title: String,
    pub date: String,
    #[serde(skip)]
    pub on: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_id: Option<i64>,
}

/// Every forecast that has a date, plus one event per debt payoff, oldest
/// first. Events on the same date keep forecast order, then debt priority.
pub fn build_timeline(forecast: &ForecastDates, payoffs: &[DebtPayoff]) -> Vec<TimelineEvent> {
    let milestones = forecast
        .entries()
        .into_iter()
        .filter_map(|(kind, on)| {
            on.map(|on| TimelineEvent {
                kind,
                title: kind.title().to_string(),
                date: format_month_year(on),
                on,
                debt_id: None,
            })
        });
    let debts = payoffs.iter().filter_map(|payoff| {
        payoff.paid_off_on.map(|on| TimelineEvent {
            kind: Milestone::DebtPaidOff,
            title: format!("{} paid off", payoff.name),
            date: format_month_year(on),
            on,
            debt_id: Some(payoff.debt_id),
        })
    });

    let mut events: Vec<TimelineEvent> = milestones.chain(debts).collect();
    events.sort_by_key(|event| event.on);
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, 26)
    }

    #[test]
    fn events_are_sorted_by_date() {
        let forecast = ForecastDates {
            emergency_fund: date(2027, 5),
            rainyday_fund: date(2027, 9),
            start_investing: date(2027, 9),
            financial_freedom: None,
            millionaire: date(2041, 1),
            bankrupt: None,
        };
        let payoffs = vec![
            DebtPayoff {
                debt_id: 4,
                name: "Car loan".to_string(),
                paid_off_on: date(2027, 2),
            },
            DebtPayoff {
                debt_id: 9,
                name: "Student loan".to_string(),
                paid_off_on: None,
            },
        ];

        let timeline = build_timeline(&forecast, &payoffs);
        let summary: Vec<_> = timeline
            .iter()
            .map(|e| (e.kind, e.date.as_str(), e.debt_id))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Milestone::DebtPaidOff, "Feb 2027", Some(4)),
                (Milestone::EmergencyFund, "May 2027", None),
                (Milestone::RainydayFund, "Sep 2027", None),
                (Milestone::StartInvesting, "Sep 2027", None),
                (Milestone::Millionaire, "Jan 2041", None),
            ]
        );
        assert_eq!(timeline[0].title, "Car loan paid off");
    }

    #[test]
    fn empty_forecast_gives_empty_timeline() {
        assert!(build_timeline(&ForecastDates::default(), &[]).is_empty());
    }

    #[test]
    fn serialized_event_hides_raw_date() {
        let forecast = ForecastDates {
            bankrupt: date(2027, 3),
            ..ForecastDates::default()
        };
        let json = serde_json::to_value(build_timeline(&forecast, &[])).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "kind": "bankrupt", "title": "Bankrupt", "date": "Mar 2027" }])
        );
    }
}
