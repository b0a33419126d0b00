use crate::loan::LoanSpec;
use thiserror::Error;

/// Input problems rejected before a schedule is computed.
///
/// The engine never produces these itself; callers run [`LoanSpec::validate`]
/// at their boundary.
#[derive(Debug, Error, PartialEq)]
pub enum LoanError {
    #[error("principal must be a positive amount, got {0}")]
    InvalidPrincipal(f64),

    #[error("number of months must be positive")]
    InvalidTerm,

    #[error("{field} must be a non-negative percentage, got {value}")]
    InvalidRate { field: &'static str, value: f64 },

    #[error("{field} must be a non-negative amount, got {value}")]
    InvalidInsurance { field: &'static str, value: f64 },
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.
}

impl LoanSpec {
    pub fn validate(&self) -> Result<(), LoanError> {
        if !self.principal.is_finite() || self.principal <= 0. {
            return Err(LoanError::InvalidPrincipal(self.principal));
        }
        if self.number_of_months == 0 {
            return Err(LoanError::InvalidTerm);
        }
        for (field, value) in [("euribor rate", self.euribor_rate), ("spread rate", self.spread_rate)] {
            if !non_negative(value) {
                return Err(LoanError::InvalidRate { field, value });
            }
        }
        for (field, value) in [
            ("life insurance", self.life_insurance),
            ("house insurance", self.house_insurance),
        ] {
            if !non_negative(value) {
                return Err(LoanError::InvalidInsurance { field, value });
            }
        }
        Ok(())
    }
}
