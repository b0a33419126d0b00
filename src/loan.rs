use crate::extra::{extra_for_month, ExtraPayment};
use log::{debug, trace};
use std::fmt;

/// Marks a row as a calendar month of the loan or as a yearly total.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum RowMonth {
    Month(u32),
    Total,
}

impl fmt::Display for RowMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowMonth::Month(month) => write!(f, "month {}", month),
            RowMonth::Total => write!(f, "Total"),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LoanSpec {
    pub principal: f64,
    pub number_of_months: u32,
    /// Annual percentage, e.g. 3.5
    pub euribor_rate: f64,
    /// Annual percentage added on top of the euribor rate
    pub spread_rate: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub life_insurance: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub house_insurance: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub recalculate_payment: bool,
}

impl LoanSpec {
    pub fn new(principal: f64, number_of_months: u32, euribor_rate: f64, spread_rate: f64) -> Self {
        Self {
            principal,
            number_of_months,
            euribor_rate,
            spread_rate,
            life_insurance: 0.,
            house_insurance: 0.,
            recalculate_payment: false,
        }
    }

    pub fn with_insurance(mut self, life_insurance: f64, house_insurance: f64) -> Self {
        self.life_insurance = life_insurance;
        self.house_insurance = house_insurance;
        self
    }

    pub fn with_recalculation(mut self, recalculate_payment: bool) -> Self {
        self.recalculate_payment = recalculate_payment;
        self
    }

    pub fn annual_rate(&self) -> f64 {
        annual_rate(self.euribor_rate, self.spread_rate)
    }

    pub fn monthly_rate(&self) -> f64 {
        monthly_rate(self.annual_rate())
    }

    pub fn monthly_insurance(&self) -> f64 {
        self.life_insurance + self.house_insurance
    }
}

impl fmt::Display for LoanSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "principal ${:.2}, {} months, rate {:.3}% ({:.3}% + {:.3}%), insurance ${:.2}/month, recalculate {}",
            self.principal,
            self.number_of_months,
            self.annual_rate(),
            self.euribor_rate,
            self.spread_rate,
            self.monthly_insurance(),
            self.recalculate_payment
        )
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ScheduleRow {
    pub month: RowMonth,
    pub year: u32,
    /// Scheduled principal, not counting extra amortization
    pub principal: f64,
    pub interest: f64,
    pub insurance: f64,
    /// Scheduled payment plus insurance
    pub base_payment: f64,
    pub extra_amortization: f64,
    pub total_payment: f64,
    pub balance: f64,
    pub is_yearly_summary: bool,
}

impl ScheduleRow {
    fn monthly(
        absolute_month: u32,
        principal: f64,
        interest: f64,
        insurance: f64,
        base_payment: f64,
        extra_amortization: f64,
        balance: f64,
    ) -> Self {
        Self {
            month: RowMonth::Month((absolute_month - 1) % 12 + 1),
            year: (absolute_month - 1) / 12 + 1,
            principal,
            interest,
            insurance,
            base_payment,
            extra_amortization,
            total_payment: base_payment + extra_amortization,
            balance,
            is_yearly_summary: false,
        }
    }
}

impl fmt::Display for ScheduleRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "year {}, {}, principal ${:.2}, interest ${:.2}, insurance ${:.2}, payment ${:.2}, extra ${:.2}, total ${:.2}, balance ${:.2}",
            self.year,
            self.month,
            self.principal,
            self.interest,
            self.insurance,
            self.base_payment,
            self.extra_amortization,
            self.total_payment,
            self.balance
        )
    }
}

// running sums for the year being accumulated
#[derive(Default)]
struct YearTotals {
    principal: f64,
    interest: f64,
    insurance: f64,
    base_payment: f64,
    extra_amortization: f64,
    total_payment: f64,
}

impl YearTotals {
    fn add(&mut self, row: &ScheduleRow) {
        self.principal += row.principal;
        self.interest += row.interest;
        self.insurance += row.insurance;
        self.base_payment += row.base_payment;
        self.extra_amortization += row.extra_amortization;
        self.total_payment += row.total_payment;
    }

    fn summary(&self, year: u32, balance: f64) -> ScheduleRow {
        ScheduleRow {
            month: RowMonth::Total,
            year,
            principal: self.principal,
            interest: self.interest,
            insurance: self.insurance,
            base_payment: self.base_payment,
            extra_amortization: self.extra_amortization,
            total_payment: self.total_payment,
            balance: balance.max(0.),
            is_yearly_summary: true,
        }
    }
}

pub fn annual_rate(euribor: f64, spread: f64) -> f64 {
    euribor + spread
}

/// Converts an annual percentage into a monthly decimal rate.
pub fn monthly_rate(annual_rate: f64) -> f64 {
    annual_rate / 12. / 100.
}

/// Fixed annuity payment amortizing `principal` over `months` payments.
///
/// A zero rate falls back to straight-line repayment.
pub fn monthly_payment(principal: f64, monthly_rate: f64, months: u32) -> f64 {
    if monthly_rate == 0. {
        return principal / f64::from(months);
    }
    let factor = (1. + monthly_rate).powf(f64::from(months));
    (principal * monthly_rate * factor) / (factor - 1.)
}

/// Builds the month-by-month schedule with extra payments applied.
///
/// A yearly summary row follows every twelfth month. When the balance reaches
/// zero the loop stops right after that month's row, before the summary
/// check, so a payoff landing on a year boundary gets no summary for that
/// year. A trailing partial-year summary is only added when the loan ran to
/// its final month.
pub fn calculate_amortization_schedule(spec: &LoanSpec, rules: &[ExtraPayment]) -> Vec<ScheduleRow> {
    let months = spec.number_of_months;
    let rate = spec.monthly_rate();
    let insurance = spec.monthly_insurance();
    let base_payment = monthly_payment(spec.principal, rate, months);

    let mut schedule = Vec::new();
    let mut remaining_balance = spec.principal;
    let mut year_totals = YearTotals::default();
    let mut paid_off_at = None;

    for i in 1..=months {
        let current_payment = if spec.recalculate_payment && i > 1 && remaining_balance > 0. {
            monthly_payment(remaining_balance, rate, months - i + 1)
        } else {
            base_payment
        };

        let interest = remaining_balance * rate;
        let principal = current_payment - interest;
        let extra = extra_for_month(i, rules);

        remaining_balance = (remaining_balance - principal - extra).max(0.);
        trace!(
            "month # {}, payment {}, interest {}, extra {}, end bal {}",
            i,
            current_payment,
            interest,
            extra,
            remaining_balance
        );

        let row = ScheduleRow::monthly(
            i,
            principal,
            interest,
            insurance,
            current_payment + insurance,
            extra,
            remaining_balance,
        );
        year_totals.add(&row);
        schedule.push(row);

        if remaining_balance == 0. {
            paid_off_at = Some(i);
            break;
        }

        if i % 12 == 0 {
            schedule.push(year_totals.summary(i / 12, remaining_balance));
            year_totals = YearTotals::default();
        }
    }

    let ran_full_term = paid_off_at.map_or(true, |month| month == months);
    if ran_full_term && months % 12 != 0 && year_totals.total_payment > 0. {
        schedule.push(year_totals.summary(months / 12 + 1, remaining_balance));
    }

    match paid_off_at {
        Some(month) if month < months => {
            debug!("loan paid off at month {} of {}", month, months)
        }
        _ => debug!(
            "schedule complete, {} months, final balance {}",
            months, remaining_balance
        ),
    }
    schedule
}

/// A computed schedule together with the inputs it was built from.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AmortizationSchedule {
    pub spec: LoanSpec,
    pub rules: Vec<ExtraPayment>,
    monthly_payment: f64,
    rows: Vec<ScheduleRow>,
}

impl AmortizationSchedule {
    pub fn new(spec: LoanSpec, rules: &[ExtraPayment]) -> Self {
        let monthly_payment =
            monthly_payment(spec.principal, spec.monthly_rate(), spec.number_of_months);
        let rows = calculate_amortization_schedule(&spec, rules);
        Self {
            spec,
            rules: rules.to_vec(),
            monthly_payment,
            rows,
        }
    }

    /// Payment computed from the original principal and full term, without insurance.
    pub fn get_monthly_payment(&self) -> f64 {
        self.monthly_payment
    }

    /// Number of rows, yearly summaries included.
    pub fn get_row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of elapsed months.
    pub fn get_month_count(&self) -> usize {
        self.monthly_rows().count()
    }

    pub fn get_row_info(&self, row_number: usize) -> String {
        match self.get_row_detail(row_number) {
            Some(row) => row.to_string(),
            None => "No row information.".to_string(),
        }
    }

    /// 1-based lookup over all rows.
    pub fn get_row_detail(&self, row_number: usize) -> Option<&ScheduleRow> {
        row_number
            .checked_sub(1)
            .and_then(|index| self.rows.get(index))
    }

    pub fn rows(&self) -> &[ScheduleRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<ScheduleRow> {
        self.rows
    }

    pub fn monthly_rows(&self) -> impl Iterator<Item = &ScheduleRow> {
        self.rows.iter().filter(|row| !row.is_yearly_summary)
    }

    pub fn yearly_summaries(&self) -> impl Iterator<Item = &ScheduleRow> {
        self.rows.iter().filter(|row| row.is_yearly_summary)
    }

    pub fn final_balance(&self) -> f64 {
        self.monthly_rows().last().map_or(self.spec.principal, |row| row.balance)
    }

    pub fn paid_off_early(&self) -> bool {
        self.get_month_count() < self.spec.number_of_months as usize
    }

    pub fn show_amortization(&self) {
        for row in &self.rows {
            println!("{}", row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        annual_rate, calculate_amortization_schedule, monthly_payment, monthly_rate,
        AmortizationSchedule, LoanSpec, RowMonth, ScheduleRow,
    };
    use crate::extra::{ExtraPayment, PaymentPeriod};
    use test_log::test;

    fn assert_approx(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}"
        );
    }

    fn interest_of(rows: &[ScheduleRow]) -> f64 {
        rows.iter()
            .filter(|row| !row.is_yearly_summary)
            .map(|row| row.interest)
            .sum()
    }

    #[test]
    fn test_rates() {
        assert_eq!(annual_rate(3.0, 1.5), 4.5);
        assert_approx(monthly_rate(4.5), 0.00375, 1e-15);
        assert_approx(LoanSpec::new(1000., 12, 2.0, 1.0).monthly_rate(), 0.0025, 1e-15);
    }

    #[test]
    fn test_monthly_payment() {
        assert_eq!(monthly_payment(12000., 0., 30), 400.);
        assert_eq!(monthly_payment(100000., 0., 360), 100000. / 360.);
        assert_approx(monthly_payment(250000., 0.00375, 360), 1266.7132745647, 1e-6);
        assert_eq!(format!("{:.2}", monthly_payment(250000., 0.00375, 360)), "1266.71");
    }

    #[test]
    fn test_loan_without_rules_shows_positive_zero_extra() {
        let schedule = AmortizationSchedule::new(LoanSpec::new(1200., 12, 0., 0.), &[]);

        assert!(schedule.rows().iter().all(|row| !row.extra_amortization.is_sign_negative()));
        assert_eq!(schedule.get_row_info(1), "year 1, month 1, principal $100.00, interest $0.00, insurance $0.00, payment $100.00, extra $0.00, total $100.00, balance $1100.00");
        assert!(schedule.rows().iter().all(|row| !row.to_string().contains("$-0.00")));
    }

    #[test]
    fn test_standard_annuity_schedule() {
        let schedule = AmortizationSchedule::new(LoanSpec::new(250000., 360, 3.0, 1.5), &[]);

        assert_eq!(format!("{:.2}", schedule.get_monthly_payment()), "1266.71");
        assert_eq!(schedule.get_month_count(), 360);
        assert_eq!(schedule.get_row_info(1), "year 1, month 1, principal $329.21, interest $937.50, insurance $0.00, payment $1266.71, extra $0.00, total $1266.71, balance $249670.79");
        assert_eq!(schedule.get_row_info(2), "year 1, month 2, principal $330.45, interest $936.27, insurance $0.00, payment $1266.71, extra $0.00, total $1266.71, balance $249340.34");
        assert_eq!(schedule.get_row_info(5000), "No row information.");
        assert_eq!(schedule.get_row_info(0), "No row information.");

        let first = schedule.get_row_detail(1).unwrap();
        assert_approx(first.interest, 937.5, 1e-9);

        let total_interest = interest_of(schedule.rows());
        assert_approx(
            schedule.get_monthly_payment() * 360. - 250000.,
            total_interest,
            1e-4,
        );
        assert_approx(schedule.final_balance(), 0., 1e-6);
    }

    #[test]
    fn test_zero_rate_straight_line() {
        let schedule = AmortizationSchedule::new(LoanSpec::new(12000., 30, 0., 0.), &[]);
        let months: Vec<&ScheduleRow> = schedule.monthly_rows().collect();

        assert_eq!(months.len(), 30);
        for (i, row) in months.iter().enumerate() {
            assert_eq!(row.principal, 400.);
            assert_eq!(row.interest, 0.);
            assert_eq!(row.balance, 12000. - 400. * (i as f64 + 1.));
        }
        assert_eq!(schedule.final_balance(), 0.);
        assert!(!schedule.paid_off_early());
    }

    #[test]
    fn test_yearly_summaries_for_partial_final_year() {
        let spec = LoanSpec::new(12000., 30, 0., 0.).with_insurance(30., 20.);
        let schedule = AmortizationSchedule::new(spec, &[]);

        assert_eq!(schedule.get_row_count(), 33);
        let summaries: Vec<&ScheduleRow> = schedule.yearly_summaries().collect();
        assert_eq!(summaries.len(), 3);
        assert!(schedule.rows()[12].is_yearly_summary);
        assert!(schedule.rows()[25].is_yearly_summary);
        assert!(schedule.rows()[32].is_yearly_summary);

        assert_eq!(schedule.get_row_info(13), "year 1, Total, principal $4800.00, interest $0.00, insurance $600.00, payment $5400.00, extra $0.00, total $5400.00, balance $7200.00");
        assert_eq!(schedule.get_row_info(26), "year 2, Total, principal $4800.00, interest $0.00, insurance $600.00, payment $5400.00, extra $0.00, total $5400.00, balance $2400.00");
        assert_eq!(schedule.get_row_info(33), "year 3, Total, principal $2400.00, interest $0.00, insurance $300.00, payment $2700.00, extra $0.00, total $2700.00, balance $0.00");
        assert_eq!(summaries[2].month, RowMonth::Total);
    }

    #[test]
    fn test_yearly_summaries_match_constituent_months() {
        let rules = [ExtraPayment::recurring(5, PaymentPeriod::Month, 100.)];
        let spec = LoanSpec::new(100000., 30, 2.5, 0.5).with_insurance(25., 15.);
        let rows = calculate_amortization_schedule(&spec, &rules);

        let mut pending: Vec<&ScheduleRow> = Vec::new();
        let mut summaries = 0;
        for row in &rows {
            if !row.is_yearly_summary {
                pending.push(row);
                continue;
            }
            summaries += 1;
            let sum = |field: fn(&ScheduleRow) -> f64| pending.iter().map(|r| field(r)).sum::<f64>();
            assert_approx(row.principal, sum(|r| r.principal), 1e-6);
            assert_approx(row.interest, sum(|r| r.interest), 1e-6);
            assert_approx(row.insurance, sum(|r| r.insurance), 1e-6);
            assert_approx(row.base_payment, sum(|r| r.base_payment), 1e-6);
            assert_approx(row.extra_amortization, sum(|r| r.extra_amortization), 1e-6);
            assert_approx(row.total_payment, sum(|r| r.total_payment), 1e-6);
            assert_eq!(row.balance, pending.last().unwrap().balance);
            assert_eq!(pending.len(), if summaries < 3 { 12 } else { 6 });
            pending.clear();
        }
        assert_eq!(summaries, 3);
    }

    #[test]
    fn test_recurring_rule_in_schedule() {
        let rules = [ExtraPayment::recurring(1, PaymentPeriod::Year, 1000.)];
        let schedule = AmortizationSchedule::new(LoanSpec::new(100000., 24, 2.0, 1.0), &rules);

        let fired: Vec<(u32, RowMonth)> = schedule
            .monthly_rows()
            .filter(|row| row.extra_amortization > 0.)
            .map(|row| (row.year, row.month))
            .collect();
        assert_eq!(fired, vec![(1, RowMonth::Month(12)), (2, RowMonth::Month(12))]);
        let first = schedule.get_row_detail(12).unwrap();
        assert_eq!(first.total_payment, first.base_payment + 1000.);
    }

    #[test]
    fn test_one_time_rule_in_schedule() {
        let rules = [ExtraPayment::one_time(10, 4, 5000.)];
        let schedule = AmortizationSchedule::new(LoanSpec::new(150000., 60, 3.0, 1.0), &rules);

        let fired: Vec<&ScheduleRow> = schedule
            .monthly_rows()
            .filter(|row| row.extra_amortization > 0.)
            .collect();
        assert_eq!(fired.len(), 1);
        assert_eq!((fired[0].year, fired[0].month), (4, RowMonth::Month(10)));
        assert_eq!(fired[0].extra_amortization, 5000.);
    }

    #[test]
    fn test_payoff_on_year_boundary_skips_summary() {
        // balance reaches 0 at month 24: no summary for year 2 and no trailing summary
        let rules = [ExtraPayment::one_time(12, 2, 6000.)];
        let schedule = AmortizationSchedule::new(LoanSpec::new(30000., 30, 0., 0.), &rules);

        assert_eq!(schedule.get_month_count(), 24);
        assert_eq!(schedule.get_row_count(), 25);
        assert!(schedule.paid_off_early());
        assert_eq!(schedule.yearly_summaries().count(), 1);

        let last = schedule.rows().last().unwrap();
        assert!(!last.is_yearly_summary);
        assert_eq!((last.year, last.month, last.balance), (2, RowMonth::Month(12), 0.));
    }

    #[test]
    fn test_payoff_mid_year_has_no_partial_summary() {
        let rules = [ExtraPayment::one_time(6, 2, 12000.)];
        let schedule = AmortizationSchedule::new(LoanSpec::new(30000., 30, 0., 0.), &rules);

        assert_eq!(schedule.get_month_count(), 18);
        assert_eq!(schedule.get_row_count(), 19);
        assert_eq!(schedule.get_row_info(19), "year 2, month 6, principal $1000.00, interest $0.00, insurance $0.00, payment $1000.00, extra $12000.00, total $13000.00, balance $0.00");
    }

    #[test]
    fn test_payoff_in_final_month_on_year_boundary() {
        let schedule = AmortizationSchedule::new(LoanSpec::new(24000., 24, 0., 0.), &[]);

        assert_eq!(schedule.get_month_count(), 24);
        assert_eq!(schedule.yearly_summaries().count(), 1);
        assert_eq!(schedule.get_row_count(), 25);
        assert!(!schedule.paid_off_early());
    }

    #[test]
    fn test_balance_floor_on_overpayment() {
        let rules = [ExtraPayment::one_time(3, 1, 50000.)];
        let schedule = AmortizationSchedule::new(LoanSpec::new(10000., 12, 4.0, 0.), &rules);

        assert_eq!(schedule.get_month_count(), 3);
        assert_eq!(schedule.final_balance(), 0.);
        assert_eq!(schedule.get_row_detail(3).unwrap().extra_amortization, 50000.);
    }

    #[test]
    fn test_recalculated_payment_shrinks() {
        let rules = [ExtraPayment::one_time(6, 1, 3000.)];
        let recalculated = AmortizationSchedule::new(
            LoanSpec::new(12000., 12, 0., 0.).with_recalculation(true),
            &rules,
        );
        let fixed = AmortizationSchedule::new(LoanSpec::new(12000., 12, 0., 0.), &rules);

        let payments: Vec<f64> = recalculated.monthly_rows().map(|row| row.base_payment).collect();
        assert_eq!(
            payments,
            vec![1000., 1000., 1000., 1000., 1000., 1000., 500., 500., 500., 500., 500., 500.]
        );
        assert!(!recalculated.paid_off_early());
        // payoff in month 12 stops before the summary check
        assert_eq!(recalculated.yearly_summaries().count(), 0);

        assert_eq!(fixed.get_month_count(), 9);
        assert!(fixed.paid_off_early());
        assert!(fixed.monthly_rows().all(|row| row.base_payment == 1000.));
    }

    #[test]
    fn test_recalculation_policies_with_interest() {
        let rules = [ExtraPayment::recurring(1, PaymentPeriod::Year, 5000.)];
        let spec = LoanSpec::new(200000., 240, 2.5, 1.0);
        let fixed = AmortizationSchedule::new(spec.clone(), &rules);
        let recalculated = AmortizationSchedule::new(spec.clone().with_recalculation(true), &rules);
        let plain = AmortizationSchedule::new(spec, &[]);

        let first_fixed = fixed.get_row_detail(1).unwrap();
        let first_recalc = recalculated.get_row_detail(1).unwrap();
        assert_eq!(first_fixed.base_payment, first_recalc.base_payment);

        let later = recalculated
            .monthly_rows()
            .nth(12)
            .map(|row| row.base_payment)
            .unwrap();
        assert!(later < first_recalc.base_payment);

        // a fixed payment retires the loan sooner, so it carries less interest
        let fixed_interest = interest_of(fixed.rows());
        let recalc_interest = interest_of(recalculated.rows());
        let plain_interest = interest_of(plain.rows());
        assert!(fixed.get_month_count() < recalculated.get_month_count());
        assert!(fixed_interest <= recalc_interest);
        assert!(recalc_interest < plain_interest);
    }

    #[test]
    fn test_recalculation_without_extra_matches_fixed() {
        let spec = LoanSpec::new(180000., 300, 3.25, 0.75);
        let fixed = calculate_amortization_schedule(&spec, &[]);
        let recalculated = calculate_amortization_schedule(&spec.clone().with_recalculation(true), &[]);

        assert_approx(interest_of(&fixed), interest_of(&recalculated), 1e-3);
        for (a, b) in fixed.iter().zip(recalculated.iter()).filter(|(a, _)| !a.is_yearly_summary) {
            assert_approx(a.base_payment, b.base_payment, 1e-6);
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_spec_defaults_from_json() {
        let spec: LoanSpec = serde_json::from_str(
            r#"{"principal": 250000, "numberOfMonths": 360, "euriborRate": 3.0, "spreadRate": 1.5}"#,
        )
        .unwrap();
        assert_eq!(spec, LoanSpec::new(250000., 360, 3.0, 1.5));
    }
}
