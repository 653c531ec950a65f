// Nearest-sample lookup for pointer positions on the time axis
use super::sample::{Series, Timed};
use chrono::NaiveTime;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("no samples to resolve against")]
    NotFound,
}

/// Resolve `t` to the closest sample of a time-ordered slice.
///
/// The earlier neighbour wins unless the later one is strictly closer, so a
/// query exactly halfway between two samples resolves to the earlier one,
/// and a query on a grid point resolves to that point.
pub fn nearest<T: Timed>(samples: &[T], t: NaiveTime) -> Result<&T, LookupError> {
    let i = samples.partition_point(|s| s.time() < t);
    let before = i.checked_sub(1).and_then(|j| samples.get(j));
    let after = samples.get(i);

    match (before, after) {
        (Some(before), Some(after)) => {
            if t.signed_duration_since(before.time()) > after.time().signed_duration_since(t) {
                Ok(after)
            } else {
                Ok(before)
            }
        }
        (Some(only), None) | (None, Some(only)) => Ok(only),
        (None, None) => Err(LookupError::NotFound),
    }
}

impl<T: Timed> Series<T> {
    pub fn nearest(&self, t: NaiveTime) -> Result<&T, LookupError> {
        nearest(self.samples(), t)
    }
}
