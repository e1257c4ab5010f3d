use bigdecimal::{BigDecimal, RoundingMode, Zero};
use time::{PrimitiveDateTime, UtcOffset};

use crate::{domain::Reading, pricing::PricePlan};

const SECONDS_PER_HOUR: i64 = 3600;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CostError {
    #[error("division by zero: readings span no measurable time")]
    DivisionByZero,
}

/// Divides keeping the numerator's scale, rounding half up.
fn divide_half_up(numerator: &BigDecimal, denominator: &BigDecimal) -> Result<BigDecimal, CostError> {
    if denominator.is_zero() {
        return Err(CostError::DivisionByZero);
    }

    let (_, scale) = numerator.as_bigint_and_exponent();
    Ok((numerator / denominator).with_scale_round(scale, RoundingMode::HalfUp))
}

/// Cost of `readings` under `plan`. `readings` must be sorted by timestamp.
///
/// The mean reading is spread over the hours between the first and last
/// reading, then priced at the plan's rate in effect at the last reading (UTC
/// calendar). The rate is resolved once per plan, not per reading.
///
/// A lone reading is divided by its Unix timestamp in seconds and no plan rate
/// is applied; existing consumers depend on that figure.
pub fn cost(readings: &[Reading], plan: &PricePlan) -> Result<BigDecimal, CostError> {
    let (first, last) = match readings {
        [] => return Ok(BigDecimal::zero()),
        [only] => {
            let epoch_seconds = BigDecimal::from(only.ts.unix_timestamp());
            return divide_half_up(&only.value, &epoch_seconds);
        }
        [first, .., last] => (first, last),
    };

    let sum: BigDecimal = readings.iter().map(|r| &r.value).sum();
    let average = divide_half_up(&sum, &BigDecimal::from(readings.len() as u64))?;

    let elapsed_seconds = (last.ts - first.ts).whole_seconds();
    let elapsed_hours = BigDecimal::from(elapsed_seconds) / BigDecimal::from(SECONDS_PER_HOUR);
    let averaged_rate = divide_half_up(&average, &elapsed_hours)?;

    let at = last.ts.to_offset(UtcOffset::UTC);
    let rate = plan.effective_rate(PrimitiveDateTime::new(at.date(), at.time()));

    Ok(averaged_rate * rate)
}
