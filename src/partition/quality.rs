//! Quality filter: day/night classification and validity flags.
//!
//! A pure transform from a [`RawRecord`] to `(Period, Validity)`. Only
//! `Valid` observations are ever handed to a fit; invalid ones stay in the
//! output with their reason.
use crate::partition::{
    data::{InvalidReason, Period, RawRecord, Validity},
    models::T0,
    options::QualityOptions,
};

/// Day when `ppfd >= day_ppfd_threshold`, night below, `Unknown` when PPFD is
/// missing or non-finite.
pub fn classify_period(ppfd: Option<f64>, opts: &QualityOptions) -> Period {
    match ppfd {
        Some(p) if p.is_finite() => {
            if p >= opts.day_ppfd_threshold {
                Period::Day
            } else {
                Period::Night
            }
        }
        _ => Period::Unknown,
    }
}

/// First failing check, in order: temperature present and finite, `T > T0`,
/// NEE present and finite, NEE within range, PPFD present and finite, QC flag.
pub fn assess_validity(record: &RawRecord, opts: &QualityOptions) -> Validity {
    let temperature = match required("temperature", record.temperature) {
        Ok(t) => t,
        Err(reason) => return Validity::Invalid(reason),
    };
    if temperature <= T0 {
        return Validity::Invalid(InvalidReason::BelowT0 { temperature });
    }
    let nee = match required("nee", record.nee) {
        Ok(v) => v,
        Err(reason) => return Validity::Invalid(reason),
    };
    if nee < opts.nee_min || nee > opts.nee_max {
        return Validity::Invalid(InvalidReason::NeeOutOfRange { value: nee });
    }
    if let Err(reason) = required("ppfd", record.ppfd) {
        return Validity::Invalid(reason);
    }
    match record.qc_flag {
        Some(flag) if flag > opts.max_qc_flag => {
            Validity::Invalid(InvalidReason::QualityFlag { flag })
        }
        _ => Validity::Valid,
    }
}

/// Classify a record.
pub fn classify(record: &RawRecord, opts: &QualityOptions) -> (Period, Validity) {
    (classify_period(record.ppfd, opts), assess_validity(record, opts))
}

fn required(field: &'static str, value: Option<f64>) -> Result<f64, InvalidReason> {
    match value {
        None => Err(InvalidReason::Missing { field }),
        Some(v) if !v.is_finite() => Err(InvalidReason::NonFinite { field }),
        Some(v) => Ok(v),
    }
}
