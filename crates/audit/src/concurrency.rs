//! Two-level concurrency budgets.
//!
//! An audit run executes N independent checks, and each check fans out to
//! its own concurrent sub-requests. Both levels are derived from one global
//! cap so that the total number of in-flight requests across every running
//! check stays near `max_concurrency * min_internal_concurrency`.

use serde::{Deserialize, Serialize};

/// Number of checks allowed to run at the same time.
///
/// Never exceeds the global cap nor the amount of available work.
pub fn top_level_concurrency(max_concurrency: usize, number_of_checks: usize) -> usize {
    max_concurrency.min(number_of_checks)
}

/// Number of concurrent sub-requests each running check may issue.
///
/// As more checks run side by side each gets a proportionally smaller slice
/// of `max_concurrency * min_internal_concurrency`, but never less than
/// `min_internal_concurrency`. The division truncates.
pub fn internal_concurrency(
    max_concurrency: usize,
    min_internal_concurrency: usize,
    number_of_checks: usize,
) -> usize {
    let top_level = top_level_concurrency(max_concurrency, number_of_checks);
    let total = max_concurrency.saturating_mul(min_internal_concurrency);

    if top_level == 0 {
        return total;
    }

    min_internal_concurrency.max(total / top_level)
}

/// Both budgets for one run, computed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrencyPlan {
    /// Checks admitted to run simultaneously.
    pub top_level: usize,
    /// Sub-request budget handed to each check's `execute`.
    pub internal_per_check: usize,
}

impl ConcurrencyPlan {
    pub fn new(
        max_concurrency: usize,
        min_internal_concurrency: usize,
        number_of_checks: usize,
    ) -> Self {
        Self {
            top_level: top_level_concurrency(max_concurrency, number_of_checks),
            internal_per_check: internal_concurrency(
                max_concurrency,
                min_internal_concurrency,
                number_of_checks,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_is_min_of_cap_and_work() {
        let cases = [(10, 5, 5), (5, 10, 5), (0, 0, 0), (3, 0, 0), (0, 7, 0)];

        for (max, checks, expected) in cases {
            assert_eq!(
                top_level_concurrency(max, checks),
                expected,
                "top_level_concurrency({max}, {checks})"
            );
        }
    }

    #[test]
    fn internal_scales_down_with_parallel_checks() {
        let cases = [
            (10, 2, 5, 4),
            (10, 5, 5, 10),
            (5, 10, 10, 10),
            (0, 0, 0, 0),
        ];

        for (max, min_internal, checks, expected) in cases {
            assert_eq!(
                internal_concurrency(max, min_internal, checks),
                expected,
                "internal_concurrency({max}, {min_internal}, {checks})"
            );
        }
    }

    #[test]
    fn internal_with_no_checks_is_the_full_product() {
        assert_eq!(internal_concurrency(10, 2, 0), 20);
        assert_eq!(internal_concurrency(4, 3, 0), 12);
    }

    #[test]
    fn internal_division_truncates() {
        // 7 * 2 / 3 = 4.67, which truncates to 4 rather than rounding to 5.
        assert_eq!(internal_concurrency(7, 2, 3), 4);
        // 10 * 1 / 4 = 2.5 truncates to 2.
        assert_eq!(internal_concurrency(10, 1, 4), 2);
    }

    #[test]
    fn internal_never_drops_below_minimum() {
        for checks in 1..50 {
            assert!(internal_concurrency(10, 3, checks) >= 3);
        }
    }

    #[test]
    fn plan_bundles_both_levels() {
        let plan = ConcurrencyPlan::new(10, 2, 5);
        assert_eq!(
            plan,
            ConcurrencyPlan {
                top_level: 5,
                internal_per_check: 4
            }
        );
    }
}
