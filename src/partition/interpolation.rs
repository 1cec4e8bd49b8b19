//! Gap filling of daily parameter estimates.
//!
//! Days without an accepted fit take values from their accepted neighbours:
//! linear interpolation in day index when both sides exist, the nearest
//! accepted value carried across the start or end of the series otherwise.
//! Every filled value records where it came from.
use chrono::NaiveDate;
use serde::Serialize;

use crate::partition::window::DailyEstimate;

/// Origin of a day's parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum Provenance {
    /// The day's own adaptive fit, accepted on a window covering `window_days`
    /// calendar days.
    Fitted { window_days: usize },
    /// Linear in day index between the nearest accepted days.
    Interpolated { previous: NaiveDate, next: NaiveDate },
    /// After the last accepted day.
    CarriedForward { from: NaiveDate },
    /// Before the first accepted day.
    CarriedBackward { from: NaiveDate },
}

/// Parameter values in effect on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilledValue {
    pub values: Vec<f64>,
    pub provenance: Provenance,
}

/// Fill every day of `daily` from its accepted neighbours.
///
/// `daily` must hold one entry per calendar day, in day order. Returns `None`
/// when no day was accepted.
pub fn fill_gaps(daily: &[DailyEstimate]) -> Option<Vec<FilledValue>> {
    let anchors: Vec<(usize, Vec<f64>, usize)> = daily
        .iter()
        .enumerate()
        .filter_map(|(i, d)| d.outcome.fit().map(|fit| (i, fit.values(), fit.window_days)))
        .collect();
    if anchors.is_empty() {
        return None;
    }

    // Index in `anchors` of the first accepted day at or after `i`.
    let mut next = 0;
    (0..daily.len())
        .map(|i| {
            while next < anchors.len() && anchors[next].0 < i {
                next += 1;
            }
            let after = anchors.get(next);
            let before = next.checked_sub(1).map(|p| &anchors[p]);
            match (before, after) {
                (_, Some((j, values, window_days))) if *j == i => Some(FilledValue {
                    values: values.clone(),
                    provenance: Provenance::Fitted { window_days: *window_days },
                }),
                (Some((p, lo, _)), Some((n, hi, _))) => {
                    let w = (i - p) as f64 / (n - p) as f64;
                    Some(FilledValue {
                        values: lo.iter().zip(hi).map(|(a, b)| a + (b - a) * w).collect(),
                        provenance: Provenance::Interpolated {
                            previous: daily[*p].day,
                            next: daily[*n].day,
                        },
                    })
                }
                (Some((p, lo, _)), None) => Some(FilledValue {
                    values: lo.clone(),
                    provenance: Provenance::CarriedForward { from: daily[*p].day },
                }),
                (None, Some((n, hi, _))) => Some(FilledValue {
                    values: hi.clone(),
                    provenance: Provenance::CarriedBackward { from: daily[*n].day },
                }),
                (None, None) => None,
            }
        })
        .collect()
}
