//! Piecewise-linear percentile interpolation.

use serde::Serialize;

/// A percentile and the metric value observed at it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bracket {
    pub percentile: f64,
    pub value: f64,
}

impl Bracket {
    #[must_use]
    pub const fn new(percentile: f64, value: f64) -> Self {
        Self { percentile, value }
    }
}

/// Position of `value` within `brackets`, on a 0-100 scale.
///
/// `brackets` must be sorted ascending by both percentile and value. A value at
/// or below the first bracket is 0, at or above the last is 100, and anything in
/// between is interpolated linearly within the first adjacent pair that contains
/// it. A pair of equal values yields the lower percentile. The result is always
/// clamped into `0..=100`.
#[must_use]
pub fn interpolate(value: f64, brackets: &[Bracket]) -> f64 {
    let (Some(first), Some(last)) = (brackets.first(), brackets.last()) else {
        return 0.0;
    };

    if value <= first.value {
        return 0.0;
    }

    if value >= last.value {
        return 100.0;
    }

    for pair in brackets.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if lo.value <= value && value <= hi.value {
            let span = hi.value - lo.value;
            if span <= 0.0 {
                return clamp(lo.percentile);
            }

            return clamp((value - lo.value).mul_add((hi.percentile - lo.percentile) / span, lo.percentile));
        }
    }

    // only reachable when the brackets are not sorted
    clamp(
        brackets
            .iter()
            .filter(|b| b.value <= value)
            .map(|b| b.percentile)
            .fold(0.0, f64::max),
    )
}

fn clamp(percentile: f64) -> f64 {
    percentile.clamp(0.0, 100.0)
}
