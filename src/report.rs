use crate::baseline::{baseline_total_interest, calculate_schedule_without_extra, BalancePoint};
use crate::extra::ExtraPayment;
use crate::loan::{AmortizationSchedule, LoanSpec};
use crate::summary::{
    average_payments, grand_total, interest_saved, payment_breakdown, pie_chart_data,
    schedule_totals, total_amount_paid, total_insurance, total_interest, AveragePayments,
    PieChart, ScheduleTotals,
};
use log::debug;
use std::fmt;

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Summary {
    pub monthly_payment: f64,
    pub total_interest: f64,
    pub total_insurance: f64,
    pub total_amount_paid: f64,
    pub grand_total: f64,
    pub baseline_interest: f64,
    pub interest_saved: f64,
    pub months_elapsed: usize,
    /// Months the extra payments cut from the baseline
    pub months_saved: usize,
    pub totals: ScheduleTotals,
    pub averages: AveragePayments,
    pub pie_chart: PieChart,
    /// Principal, interest and insurance of the loan without extra payments
    pub baseline_chart: PieChart,
    pub breakdown: PieChart,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "monthly payment ${:.2}", self.monthly_payment)?;
        writeln!(
            f,
            "total interest ${:.2}, total insurance ${:.2}, grand total ${:.2}",
            self.total_interest, self.total_insurance, self.grand_total
        )?;
        writeln!(f, "total amount paid ${:.2}", self.total_amount_paid)?;
        writeln!(
            f,
            "{} months elapsed, {} months saved, ${:.2} interest saved",
            self.months_elapsed, self.months_saved, self.interest_saved
        )?;
        for (label, average) in [
            ("first year", &self.averages.first_year),
            ("30%", &self.averages.thirty_percent),
            ("60%", &self.averages.sixty_percent),
        ] {
            writeln!(
                f,
                "average payment at {} (year {}): ${:.2}, with extra ${:.2}",
                label, average.year, average.avg_base, average.avg_total
            )?;
        }
        write!(f, "totals: {}", self.totals)
    }
}

/// Full schedule, no-extra baseline and derived figures for one calculation.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AmortizationReport {
    pub schedule: AmortizationSchedule,
    pub baseline: Vec<BalancePoint>,
    pub summary: Summary,
}

impl AmortizationReport {
    pub fn calculate(spec: LoanSpec, rules: &[ExtraPayment]) -> Self {
        let principal = spec.principal;
        let rate = spec.monthly_rate();
        let monthly_insurance = spec.monthly_insurance();
        let baseline = calculate_schedule_without_extra(principal, spec.number_of_months, rate);
        let schedule = AmortizationSchedule::new(spec, rules);

        let rows = schedule.rows();
        let interest = total_interest(rows);
        let insurance = total_insurance(rows);
        let baseline_interest = baseline_total_interest(principal, rate, &baseline);
        let months_elapsed = schedule.get_month_count();

        let summary = Summary {
            monthly_payment: schedule.get_monthly_payment(),
            total_interest: interest,
            total_insurance: insurance,
            total_amount_paid: total_amount_paid(rows),
            grand_total: grand_total(principal, rows),
            baseline_interest,
            interest_saved: interest_saved(baseline_interest, interest),
            months_elapsed,
            months_saved: baseline.len().saturating_sub(months_elapsed),
            totals: schedule_totals(rows),
            averages: average_payments(rows),
            pie_chart: pie_chart_data(principal, interest, insurance),
            baseline_chart: pie_chart_data(
                principal,
                baseline_interest,
                monthly_insurance * baseline.len() as f64,
            ),
            breakdown: payment_breakdown(rows),
        };
        debug!(
            "report: {} months, interest {}, saved {}",
            summary.months_elapsed, summary.total_interest, summary.interest_saved
        );

        Self {
            schedule,
            baseline,
            summary,
        }
    }
}
