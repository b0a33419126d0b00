//! Loan amortization schedules with insurance add-ons and extra principal
//! payments, compared against a plain constant-payment baseline.
//!
//! ```
//! use amortize::extra::{ExtraPayment, PaymentPeriod};
//! use amortize::loan::LoanSpec;
//! use amortize::report::AmortizationReport;
//!
//! let spec = LoanSpec::new(250000., 360, 3.0, 1.5).with_insurance(20., 15.);
//! let rules = [ExtraPayment::recurring(1, PaymentPeriod::Year, 2000.)];
//! let report = AmortizationReport::calculate(spec, &rules);
//!
//! assert!(report.summary.interest_saved > 0.);
//! ```

pub mod baseline;
pub mod error;
pub mod extra;
pub mod loan;
pub mod report;
pub mod summary;

pub use error::LoanError;
pub use extra::{ExtraPayment, PaymentPeriod};
pub use loan::{AmortizationSchedule, LoanSpec, RowMonth, ScheduleRow};
pub use report::AmortizationReport;
