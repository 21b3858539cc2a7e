//! # Stable Argmax
//!
//! Viterbi has two places where it picks a best tag, and they break ties in
//! the same direction but start from different baselines:
//!
//! - [`first_max`]: the recurrence. The first maximum in enumeration order
//!   wins; any finite value can win, including 0.
//! - [`first_above_zero_max`]: the termination. The scan starts from a running
//!   best of `0.0` and adopts a candidate only if it is **strictly** greater,
//!   so a column of zeros selects nothing.
//!
//! Both scans use `>`, which also means a `NaN` is never adopted.

/// Index and value of the first maximum, or `None` for an empty input.
///
/// ```rust
/// use hmm_core::argmax::first_max;
///
/// assert_eq!(first_max([0.2, 0.5, 0.5]), Some((1, 0.5)));
/// ```
pub fn first_max<I>(scores: I) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = f64>,
{
    let mut iter = scores.into_iter().enumerate();
    let mut best = iter.next()?;
    for (i, score) in iter {
        if score > best.1 {
            best = (i, score);
        }
    }
    Some(best)
}

/// Index and value of the first maximum strictly above zero, or `None` if
/// no score is positive.
///
/// ```rust
/// use hmm_core::argmax::first_above_zero_max;
///
/// assert_eq!(first_above_zero_max([0.0, 0.3, 0.3]), Some((1, 0.3)));
/// assert_eq!(first_above_zero_max([0.0, 0.0]), None);
/// ```
pub fn first_above_zero_max<I>(scores: I) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = f64>,
{
    let mut best: Option<(usize, f64)> = None;
    let mut best_score = 0.0;
    for (i, score) in scores.into_iter().enumerate() {
        if score > best_score {
            best_score = score;
            best = Some((i, score));
        }
    }
    best
}
