use crate::loan::ScheduleRow;
use std::fmt;

fn monthly(rows: &[ScheduleRow]) -> impl Iterator<Item = &ScheduleRow> {
    rows.iter().filter(|row| !row.is_yearly_summary)
}

pub fn total_interest(rows: &[ScheduleRow]) -> f64 {
    monthly(rows).fold(0., |acc, row| acc + row.interest)
}

pub fn total_insurance(rows: &[ScheduleRow]) -> f64 {
    monthly(rows).fold(0., |acc, row| acc + row.insurance)
}

pub fn total_amount_paid(rows: &[ScheduleRow]) -> f64 {
    monthly(rows).fold(0., |acc, row| acc + row.total_payment)
}

pub fn grand_total(principal: f64, rows: &[ScheduleRow]) -> f64 {
    principal + total_interest(rows) + total_insurance(rows)
}

pub fn interest_saved(baseline_interest: f64, total_interest: f64) -> f64 {
    baseline_interest - total_interest
}

/// Column sums over the monthly rows of a schedule.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ScheduleTotals {
    pub principal: f64,
    pub interest: f64,
    pub insurance: f64,
    pub base_payment: f64,
    pub extra_amortization: f64,
    pub total_payment: f64,
}

pub fn schedule_totals(rows: &[ScheduleRow]) -> ScheduleTotals {
    monthly(rows).fold(ScheduleTotals::default(), |acc, row| ScheduleTotals {
        principal: acc.principal + row.principal,
        interest: acc.interest + row.interest,
        insurance: acc.insurance + row.insurance,
        base_payment: acc.base_payment + row.base_payment,
        extra_amortization: acc.extra_amortization + row.extra_amortization,
        total_payment: acc.total_payment + row.total_payment,
    })
}

impl fmt::Display for ScheduleTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "principal ${:.2}, interest ${:.2}, insurance ${:.2}, payment ${:.2}, extra ${:.2}, total ${:.2}",
            self.principal,
            self.interest,
            self.insurance,
            self.base_payment,
            self.extra_amortization,
            self.total_payment
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum SliceKind {
    Principal,
    ExtraPayments,
    Interest,
    Insurance,
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PieSlice {
    pub kind: SliceKind,
    pub value: f64,
    pub percent: f64,
    pub start_degrees: f64,
    pub end_degrees: f64,
}

/// Slices laid out clockwise from 0 to 360 degrees in insertion order.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PieChart {
    pub total: f64,
    pub slices: Vec<PieSlice>,
}

impl PieChart {
    fn from_parts(parts: &[(SliceKind, f64)]) -> Self {
        let total: f64 = parts.iter().fold(0., |acc, (_, value)| acc + value);
        let mut degrees = 0.;
        let slices = parts
            .iter()
            .map(|&(kind, value)| {
                let share = if total > 0. { value / total } else { 0. };
                let start_degrees = degrees;
                degrees += share * 360.;
                PieSlice {
                    kind,
                    value,
                    percent: share * 100.,
                    start_degrees,
                    end_degrees: degrees,
                }
            })
            .collect();
        Self { total, slices }
    }

    pub fn slice(&self, kind: SliceKind) -> Option<&PieSlice> {
        self.slices.iter().find(|slice| slice.kind == kind)
    }
}

/// Principal, interest and insurance shares of the grand total.
pub fn pie_chart_data(principal: f64, total_interest: f64, total_insurance: f64) -> PieChart {
    PieChart::from_parts(&[
        (SliceKind::Principal, principal),
        (SliceKind::Interest, total_interest),
        (SliceKind::Insurance, total_insurance),
    ])
}

/// Shares of everything paid, splitting scheduled principal from extra payments.
pub fn payment_breakdown(rows: &[ScheduleRow]) -> PieChart {
    let totals = schedule_totals(rows);
    PieChart::from_parts(&[
        (SliceKind::Principal, totals.principal),
        (SliceKind::ExtraPayments, totals.extra_amortization),
        (SliceKind::Interest, totals.interest),
        (SliceKind::Insurance, totals.insurance),
    ])
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PaymentAverage {
    /// Loan year the window is centred on
    pub year: u32,
    pub avg_base: f64,
    pub avg_total: f64,
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AveragePayments {
    pub first_year: PaymentAverage,
    pub thirty_percent: PaymentAverage,
    pub sixty_percent: PaymentAverage,
}

const HALF_WINDOW: usize = 6;

fn window_average(months: &[&ScheduleRow], start: usize, end: usize, year: u32) -> PaymentAverage {
    let window = &months[start.min(months.len())..end.min(months.len())];
    if window.is_empty() {
        return PaymentAverage {
            year,
            avg_base: 0.,
            avg_total: 0.,
        };
    }
    let count = window.len() as f64;
    PaymentAverage {
        year,
        avg_base: window.iter().map(|row| row.base_payment).sum::<f64>() / count,
        avg_total: window.iter().map(|row| row.total_payment).sum::<f64>() / count,
    }
}

fn centred_average(months: &[&ScheduleRow], fraction: f64) -> PaymentAverage {
    let centre = (months.len() as f64 * fraction).floor() as usize;
    // six months before the centre, the centre itself and five after
    window_average(
        months,
        centre.saturating_sub(HALF_WINDOW),
        centre + HALF_WINDOW,
        (centre / 12) as u32 + 1,
    )
}

/// Average payments over the first year and around 30% and 60% of the elapsed term.
pub fn average_payments(rows: &[ScheduleRow]) -> AveragePayments {
    let months: Vec<&ScheduleRow> = monthly(rows).collect();
    AveragePayments {
        first_year: window_average(&months, 0, 12, 1),
        thirty_percent: centred_average(&months, 0.3),
        sixty_percent: centred_average(&months, 0.6),
    }
}
