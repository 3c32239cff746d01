use chrono::TimeDelta;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("expiration delta overflows: {amount} x {unit}")]
    Overflow { amount: i64, unit: TimeDelta },
}

/// How long a session lives after it is issued or renewed.
///
/// `delta = amount * unit`. A negative amount is allowed and issues sessions
/// that are expired from the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationPolicy {
    amount: i64,
    unit: TimeDelta,
    delta: TimeDelta,
}

impl ExpirationPolicy {
    pub fn new(amount: i64, unit: TimeDelta) -> Result<Self, PolicyError> {
        let delta = scale(unit, amount).ok_or(PolicyError::Overflow { amount, unit })?;
        Ok(Self {
            amount,
            unit,
            delta,
        })
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn unit(&self) -> TimeDelta {
        self.unit
    }

    pub fn delta(&self) -> TimeDelta {
        self.delta
    }
}

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// `unit * amount` at nanosecond precision.
fn scale(unit: TimeDelta, amount: i64) -> Option<TimeDelta> {
    // num_seconds truncates toward zero and subsec_nanos carries the same sign
    let unit_ns =
        i128::from(unit.num_seconds()) * NANOS_PER_SEC + i128::from(unit.subsec_nanos());
    let total_ns = unit_ns.checked_mul(i128::from(amount))?;
    let secs = i64::try_from(total_ns.div_euclid(NANOS_PER_SEC)).ok()?;
    let nanos = u32::try_from(total_ns.rem_euclid(NANOS_PER_SEC)).ok()?;
    TimeDelta::new(secs, nanos)
}

impl Default for ExpirationPolicy {
    /// 30 days.
    fn default() -> Self {
        Self {
            amount: 30,
            unit: TimeDelta::days(1),
            delta: TimeDelta::days(30),
        }
    }
}
