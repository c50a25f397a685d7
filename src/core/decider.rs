use crate::models::SuccessRatio;

// Absorbs binary rounding in `1 / (1 - ratio)` so that e.g. 6.9999999999 counts as 7
const PERIOD_TOLERANCE: f64 = 1e-9;

/// Result of the outcome decision for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeed,
    Fail,
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Fail)
    }
}

/// Number of requests per failure for a ratio, or `None` when no request
/// ever fails
pub fn failure_period(ratio: SuccessRatio) -> Option<u64> {
    let failure = ratio.failure_ratio();
    if failure <= 0.0 {
        return None;
    }

    let period = (1.0 / failure + PERIOD_TOLERANCE).floor() as u64;
    Some(period.max(1))
}

/// Decide whether the request holding `counter` succeeds.
///
/// Failures happen exactly when `counter` is a multiple of the failure
/// period, which makes the cadence reproducible for a given sequence.
pub fn decide(ratio: SuccessRatio, counter: u64) -> Outcome {
    match failure_period(ratio) {
        Some(period) if counter % period == 0 => Outcome::Fail,
        _ => Outcome::Succeed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(value: f64) -> SuccessRatio {
        SuccessRatio::new(value).unwrap()
    }

    #[test]
    fn test_ratio_one_never_fails() {
        for counter in 0..1000 {
            assert_eq!(decide(SuccessRatio::ALWAYS, counter), Outcome::Succeed);
        }
        assert_eq!(decide(SuccessRatio::ALWAYS, u64::MAX), Outcome::Succeed);
        assert_eq!(failure_period(SuccessRatio::ALWAYS), None);
    }

    #[test]
    fn test_half_ratio_alternates() {
        let outcomes: Vec<_> = (1..=6).map(|c| decide(ratio(0.5), c)).collect();
        assert_eq!(
            outcomes,
            vec![
                Outcome::Succeed,
                Outcome::Fail,
                Outcome::Succeed,
                Outcome::Fail,
                Outcome::Succeed,
                Outcome::Fail,
            ]
        );
    }

    #[test]
    fn test_eighty_percent_fails_every_fifth() {
        assert_eq!(failure_period(ratio(0.8)), Some(5));
        let failures: Vec<u64> = (1..=20).filter(|c| decide(ratio(0.8), *c).is_failure()).collect();
        assert_eq!(failures, vec![5, 10, 15, 20]);
    }

    #[test]
    fn test_failure_ratio_one_over_k() {
        for k in 2..=50u64 {
            let r = ratio(1.0 - 1.0 / k as f64);
            assert_eq!(failure_period(r), Some(k), "k = {}", k);

            let failures: Vec<u64> = (1..=3 * k).filter(|c| decide(r, *c).is_failure()).collect();
            assert_eq!(failures.len() as u64, 3);
            assert!(failures.iter().all(|c| c % k == 0));

            for c in 1..=3 * k {
                let expected_failures = c / k;
                let actual = (1..=c).filter(|n| decide(r, *n).is_failure()).count() as u64;
                assert_eq!(actual, expected_failures);
            }
        }
    }

    #[test]
    fn test_low_ratio_fails_every_request() {
        // failure ratio above one half floors to a period of 1
        assert_eq!(failure_period(ratio(0.3)), Some(1));
        assert!((1..10).all(|c| decide(ratio(0.3), c).is_failure()));
    }

    #[test]
    fn test_non_integral_period_is_floored() {
        // 1 / 0.3 = 3.33
        assert_eq!(failure_period(ratio(0.7)), Some(3));
        assert_eq!(decide(ratio(0.7), 3), Outcome::Fail);
        assert_eq!(decide(ratio(0.7), 4), Outcome::Succeed);
    }

    #[test]
    fn test_counter_zero_is_a_multiple() {
        assert_eq!(decide(ratio(0.5), 0), Outcome::Fail);
    }
}
