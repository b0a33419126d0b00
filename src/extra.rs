use log::trace;
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum PaymentPeriod {
    #[default]
    Month,
    Year,
}

impl PaymentPeriod {
    /// Number of months in `frequency` periods.
    pub fn months(&self, frequency: u32) -> u32 {
        match self {
            PaymentPeriod::Month => frequency,
            PaymentPeriod::Year => frequency.saturating_mul(12),
        }
    }
}

impl fmt::Display for PaymentPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentPeriod::Month => write!(f, "month"),
            PaymentPeriod::Year => write!(f, "year"),
        }
    }
}

/// An extra principal payment applied on top of the scheduled payment.
///
/// Every payload field falls back to zero when it is missing from the input,
/// which leaves the rule inert rather than rejected.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "camelCase"))]
pub enum ExtraPayment {
    /// Paid every `frequency` periods, counted from the first month of the loan.
    Recurring {
        #[cfg_attr(feature = "serde", serde(default))]
        frequency: u32,
        #[cfg_attr(feature = "serde", serde(default))]
        period: PaymentPeriod,
        #[cfg_attr(feature = "serde", serde(default))]
        amount: f64,
    },
    /// Paid once, in `month` (1-12) of loan year `year` (1-based).
    OneTime {
        #[cfg_attr(feature = "serde", serde(default))]
        month: u32,
        #[cfg_attr(feature = "serde", serde(default))]
        year: u32,
        #[cfg_attr(feature = "serde", serde(default))]
        amount: f64,
    },
}

impl ExtraPayment {
    pub fn recurring(frequency: u32, period: PaymentPeriod, amount: f64) -> Self {
        ExtraPayment::Recurring {
            frequency,
            period,
            amount,
        }
    }

    pub fn one_time(month: u32, year: u32, amount: f64) -> Self {
        ExtraPayment::OneTime {
            month,
            year,
            amount,
        }
    }

    pub fn amount(&self) -> f64 {
        match self {
            ExtraPayment::Recurring { amount, .. } | ExtraPayment::OneTime { amount, .. } => {
                *amount
            }
        }
    }

    /// Interval in months between payments of a recurring rule.
    pub fn target_interval(&self) -> Option<u32> {
        match self {
            ExtraPayment::Recurring {
                frequency, period, ..
            } if *frequency > 0 => Some(period.months(*frequency)),
            _ => None,
        }
    }

    /// Absolute month (1-based from loan start) of a one-time rule.
    pub fn target_month(&self) -> Option<u32> {
        match self {
            ExtraPayment::OneTime { month, year, .. } if (1..=12).contains(month) => year
                .checked_sub(1)?
                .checked_mul(12)?
                .checked_add(*month),
            _ => None,
        }
    }

    /// Whether the rule can ever contribute to a month.
    pub fn is_effective(&self) -> bool {
        let amount = self.amount();
        if !amount.is_finite() || amount <= 0. {
            return false;
        }
        match self {
            ExtraPayment::Recurring { .. } => self.target_interval().is_some(),
            ExtraPayment::OneTime { .. } => self.target_month().is_some(),
        }
    }

    /// Contribution of this rule at `absolute_month`.
    pub fn amount_for_month(&self, absolute_month: u32) -> f64 {
        if !self.is_effective() {
            return 0.;
        }
        let fires = match self {
            ExtraPayment::Recurring { .. } => self
                .target_interval()
                .is_some_and(|interval| absolute_month % interval == 0),
            ExtraPayment::OneTime { .. } => self.target_month() == Some(absolute_month),
        };
        if fires {
            self.amount()
        } else {
            0.
        }
    }
}

impl fmt::Display for ExtraPayment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtraPayment::Recurring {
                frequency,
                period,
                amount,
            } => write!(f, "${:.2} every {} {}(s)", amount, frequency, period),
            ExtraPayment::OneTime {
                month,
                year,
                amount,
            } => write!(f, "${:.2} once in month {} of year {}", amount, month, year),
        }
    }
}

/// Sum of every rule that fires at `absolute_month` (1-based from loan start).
pub fn extra_for_month(absolute_month: u32, rules: &[ExtraPayment]) -> f64 {
    let total = rules
        .iter()
        .map(|rule| rule.amount_for_month(absolute_month))
        .fold(0., |acc, amount| acc + amount);
    if total > 0. {
        trace!("month {}, extra amortization {}", absolute_month, total);
    }
    total
}
