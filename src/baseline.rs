use crate::loan::monthly_payment;
use log::debug;

/// Remaining balance after an absolute month of the no-extra baseline.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BalancePoint {
    pub month: u32,
    pub balance: f64,
}

/// Constant-payment schedule with no extra payments, recalculation or insurance.
pub fn calculate_schedule_without_extra(
    principal: f64,
    number_of_months: u32,
    monthly_rate: f64,
) -> Vec<BalancePoint> {
    let payment = monthly_payment(principal, monthly_rate, number_of_months);
    let mut points = Vec::new();
    let mut balance = principal;

    for month in 1..=number_of_months {
        let interest = balance * monthly_rate;
        balance = (balance - (payment - interest)).max(0.);
        points.push(BalancePoint { month, balance });

        if balance == 0. {
            break;
        }
    }
    debug!("baseline schedule, {} months", points.len());
    points
}

/// Interest carried by a baseline schedule, charged on each month's opening balance.
pub fn baseline_total_interest(principal: f64, monthly_rate: f64, points: &[BalancePoint]) -> f64 {
    let mut opening = principal;
    let mut total = 0.;
    for point in points {
        total += opening * monthly_rate;
        opening = point.balance;
    }
    total
}
