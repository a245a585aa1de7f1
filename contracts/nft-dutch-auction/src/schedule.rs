use commons::PaymentAmount;
use concordium_std::*;

/// Price strategy of the auction, fixed at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub enum Schedule {
    /// Price opens at `reserve + step * duration` and falls by `step`
    /// every tick, never below `reserve`. The first admissible bid
    /// settles the lot.
    Descending {
        reserve: PaymentAmount,
        step: PaymentAmount,
    },
    /// Price opens at `reserve`; every bid must exceed the standing one
    /// by at least `step`. The standing bid at expiry wins.
    Ascending {
        reserve: PaymentAmount,
        step: PaymentAmount,
    },
}

impl Schedule {
    pub fn is_ascending(&self) -> bool {
        matches!(self, Schedule::Ascending { .. })
    }

    /// Price of the lot before any ticks have elapsed.
    pub fn opening_price(&self, duration_ticks: u64) -> PaymentAmount {
        match *self {
            Schedule::Descending { reserve, step } => {
                reserve.saturating_add(step.saturating_mul(duration_ticks))
            }
            Schedule::Ascending { reserve, .. } => reserve,
        }
    }

    /// Smallest admissible offer after `elapsed` ticks, given the
    /// standing highest offer. The decay clamps at the reserve and never
    /// wraps, no matter how large `step * elapsed` grows.
    pub fn threshold(
        &self,
        duration_ticks: u64,
        elapsed: u64,
        standing: Option<PaymentAmount>,
    ) -> PaymentAmount {
        match *self {
            Schedule::Descending { reserve, step } => self
                .opening_price(duration_ticks)
                .saturating_sub(step.saturating_mul(elapsed))
                .max(reserve),
            Schedule::Ascending { reserve, step } => match standing {
                None => reserve,
                // A raise must strictly exceed the standing offer even
                // with a zero increment configured.
                Some(high) => high.saturating_add(step.max(1)),
            },
        }
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    const RESERVE: PaymentAmount = 100;
    const STEP: PaymentAmount = 10;
    const DURATION: u64 = 10;

    fn descending() -> Schedule {
        Schedule::Descending {
            reserve: RESERVE,
            step: STEP,
        }
    }

    #[concordium_test]
    fn test_descending_endpoints() {
        let schedule = descending();
        claim_eq!(schedule.opening_price(DURATION), 200);
        claim_eq!(schedule.threshold(DURATION, 0, None), 200);
        claim_eq!(schedule.threshold(DURATION, 9, None), 110);
        claim_eq!(schedule.threshold(DURATION, DURATION, None), RESERVE);
    }

    #[concordium_test]
    fn test_descending_is_non_increasing() {
        let schedule = descending();
        let mut previous = schedule.threshold(DURATION, 0, None);
        for elapsed in 1..=DURATION {
            let price = schedule.threshold(DURATION, elapsed, None);
            claim!(price <= previous);
            previous = price;
        }
    }

    #[concordium_test]
    fn test_descending_clamps_at_reserve() {
        let schedule = descending();
        claim_eq!(schedule.threshold(DURATION, DURATION + 15, None), RESERVE);
    }

    #[concordium_test]
    fn test_descending_never_wraps() {
        let schedule = Schedule::Descending {
            reserve: RESERVE,
            step: PaymentAmount::MAX,
        };
        claim_eq!(schedule.opening_price(DURATION), PaymentAmount::MAX);
        claim_eq!(schedule.threshold(DURATION, u64::MAX, None), RESERVE);
    }

    #[concordium_test]
    fn test_ascending_threshold() {
        let schedule = Schedule::Ascending {
            reserve: RESERVE,
            step: STEP,
        };
        claim_eq!(schedule.opening_price(DURATION), RESERVE);
        claim_eq!(schedule.threshold(DURATION, 3, None), RESERVE);
        claim_eq!(schedule.threshold(DURATION, 3, Some(100)), 110);
    }

    #[concordium_test]
    fn test_ascending_zero_step_still_strict() {
        let schedule = Schedule::Ascending {
            reserve: RESERVE,
            step: 0,
        };
        claim_eq!(schedule.threshold(DURATION, 0, Some(100)), 101);
    }
}
