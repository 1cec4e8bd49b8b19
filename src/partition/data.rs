//! Observation containers for NEE partitioning.
//!
//! Purpose
//! -------
//! Provide the validated, quality-classified time series every stage of the
//! pipeline reads from. This module centralizes input validation for the raw
//! records handed over by an external loader and precomputes the per-day
//! buckets of eligible night and day observations used by the windowed fits.
//!
//! Key behaviors
//! -------------
//! - [`RawRecord`] is the input contract: one timestamp plus optional NEE,
//!   temperature (K), PPFD and upstream QC flag.
//! - [`ObservationSeries::from_records`] enforces a non-empty, strictly
//!   increasing, regularly sampled series and classifies every record with
//!   the [`quality`](super::quality) filter.
//! - Calendar days form a contiguous range from the first to the last
//!   timestamp; `day_index` is the 0-based position in that range.
//!
//! Invariants & assumptions
//! ------------------------
//! - Observations keep the input order and length: the output has exactly one
//!   record per input record.
//! - Per-day buckets hold only `Valid` observations; `Unknown`-period records
//!   are never fitted.
//! - Missing values are represented as `None` in the records, never as gaps
//!   in the timestamp sequence.
//!
//! Testing notes
//! -------------
//! - Unit tests cover construction errors (empty, non-monotonic, irregular),
//!   day bucketing across midnight, and window point extraction.
use std::ops::Range;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::partition::{
    errors::{PartitionError, PartitionResult},
    fit::FitPoint,
    options::QualityOptions,
    quality::classify,
};

/// One input record as delivered by the external loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub timestamp: NaiveDateTime,
    /// Net ecosystem exchange (µmol m⁻² s⁻¹, positive = release).
    pub nee: Option<f64>,
    /// Air or soil temperature in kelvin.
    pub temperature: Option<f64>,
    /// Photosynthetic photon flux density (µmol m⁻² s⁻¹).
    pub ppfd: Option<f64>,
    /// Upstream quality flag (0 = best); `None` means "not flagged".
    pub qc_flag: Option<u8>,
}

/// Light period of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Period {
    Day,
    Night,
    Unknown,
}

/// Why an observation is excluded from fitting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum InvalidReason {
    Missing { field: &'static str },
    NonFinite { field: &'static str },
    BelowT0 { temperature: f64 },
    NeeOutOfRange { value: f64 },
    QualityFlag { flag: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Validity {
    Valid,
    Invalid(InvalidReason),
}

/// A classified observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub day: NaiveDate,
    pub day_index: usize,
    pub temperature: Option<f64>,
    pub ppfd: Option<f64>,
    pub nee: Option<f64>,
    pub period: Period,
    pub validity: Validity,
}

impl Observation {
    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }
}

/// Validated, classified, regularly sampled observation series.
///
/// Fields
/// ------
/// - `observations`: one [`Observation`] per input record, in input order.
/// - `days`: contiguous calendar days spanned by the series.
/// - `night` / `day`: for each entry of `days`, indices of the valid night
///   (resp. day) observations on that date.
/// - `step`: sampling interval (`None` for a single record).
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSeries {
    observations: Vec<Observation>,
    days: Vec<NaiveDate>,
    night: Vec<Vec<usize>>,
    day: Vec<Vec<usize>>,
    step: Option<Duration>,
}

impl ObservationSeries {
    /// Validate and classify raw records.
    ///
    /// Errors
    /// ------
    /// - `PartitionError::EmptySeries` when `records` is empty.
    /// - `PartitionError::NonMonotonicTimestamps` when a timestamp does not
    ///   strictly increase.
    /// - `PartitionError::IrregularSampling` when a step differs from the
    ///   first one.
    pub fn from_records(records: &[RawRecord], quality: &QualityOptions) -> PartitionResult<Self> {
        let first = records.first().ok_or(PartitionError::EmptySeries)?;
        let step = check_sampling(records)?;

        let first_day = first.timestamp.date();
        let last_day = records[records.len() - 1].timestamp.date();
        let n_days = (last_day - first_day).num_days() as usize + 1;
        let days: Vec<NaiveDate> = first_day.iter_days().take(n_days).collect();

        let mut night = vec![Vec::new(); n_days];
        let mut day = vec![Vec::new(); n_days];
        let observations: Vec<Observation> = records
            .iter()
            .enumerate()
            .map(|(i, rec)| {
                let date = rec.timestamp.date();
                let day_index = (date - first_day).num_days() as usize;
                let (period, validity) = classify(rec, quality);
                if validity == Validity::Valid {
                    match period {
                        Period::Night => night[day_index].push(i),
                        Period::Day => day[day_index].push(i),
                        Period::Unknown => {}
                    }
                }
                Observation {
                    timestamp: rec.timestamp,
                    day: date,
                    day_index,
                    temperature: rec.temperature,
                    ppfd: rec.ppfd,
                    nee: rec.nee,
                    period,
                    validity,
                }
            })
            .collect();

        Ok(Self { observations, days, night, day, step })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn n_days(&self) -> usize {
        self.days.len()
    }

    pub fn step(&self) -> Option<Duration> {
        self.step
    }

    /// Valid night observations on `day_index`.
    pub fn night_indices(&self, day_index: usize) -> &[usize] {
        &self.night[day_index]
    }

    /// Valid daytime observations on `day_index`.
    pub fn day_indices(&self, day_index: usize) -> &[usize] {
        &self.day[day_index]
    }

    /// Night `(temperature, NEE)` points of every day in `span`.
    pub fn night_points(&self, span: Range<usize>) -> Vec<FitPoint> {
        self.night[span]
            .iter()
            .flatten()
            .filter_map(|&i| {
                let obs = &self.observations[i];
                Some(FitPoint { x: obs.temperature?, y: obs.nee? })
            })
            .collect()
    }

}

fn check_sampling(records: &[RawRecord]) -> PartitionResult<Option<Duration>> {
    let mut step = None;
    for (index, pair) in records.windows(2).enumerate() {
        let (previous, current) = (pair[0].timestamp, pair[1].timestamp);
        let found = current - previous;
        if found <= Duration::zero() {
            return Err(PartitionError::NonMonotonicTimestamps { index: index + 1, previous, current });
        }
        match step {
            None => step = Some(found),
            Some(expected) if expected != found => {
                return Err(PartitionError::IrregularSampling { index: index + 1, expected, found })
            }
            Some(_) => {}
        }
    }
    Ok(step)
}
