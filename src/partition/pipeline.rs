//! Partition orchestrator.
//!
//! Purpose
//! -------
//! Sequence the estimation stages and assemble one [`PartitionedObservation`]
//! per input timestamp:
//!
//! `ObservationSeries` → E0 → daily R10 → [`RespirationModel`] → apparent
//! GPP → daily (α, GPmax) → [`LightResponseModel`] → output table.
//!
//! Key behaviors
//! -------------
//! - Each stage fully produces its owned output before the next one borrows
//!   it; nothing is mutated after construction.
//! - The only fatal estimation failure is an unavailable temperature
//!   sensitivity. Every other local failure becomes a missing value plus a
//!   diagnostic.
//! - NEE is passed through unchanged; TER is the model value at every
//!   timestamp with an evaluable temperature; GPP is zero at night and the
//!   light-response model value by day.
//!
//! Invariants & assumptions
//! ------------------------
//! - `records.len()` of the output equals the number of input records, in
//!   input order.
//! - Identical inputs and options produce identical outputs; parallel stages
//!   collect in day order.
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

use crate::partition::{
    data::{ObservationSeries, Period, RawRecord, Validity},
    errors::{PartitionResult, RejectionCounts, RejectionReason},
    interpolation::Provenance,
    light_response::{estimate_light_response, LightResponseModel},
    options::PartitionOptions,
    respiration::{day_rejection, estimate_e0, estimate_r10, RespirationModel, TemperatureSensitivity},
    window::DailyEstimate,
};

/// Where a record's TER or GPP value came from, or why it is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateDiagnostics {
    /// Provenance of the day's parameters; `None` when nothing could be filled.
    pub provenance: Option<Provenance>,
    /// Terminal rejection of the day's own adaptive fit, if it was rejected.
    pub day_rejection: Option<RejectionReason>,
    /// Why the value itself is missing.
    pub unavailable: Option<RejectionReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub period: Period,
    pub validity: Validity,
    pub respiration: EstimateDiagnostics,
    pub light_response: EstimateDiagnostics,
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionedObservation {
    pub timestamp: NaiveDateTime,
    pub nee: Option<f64>,
    pub ter: Option<f64>,
    pub gpp: Option<f64>,
    pub diagnostics: Diagnostics,
}

/// Counts over the whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionSummary {
    pub n_records: usize,
    pub n_days: usize,
    pub n_valid_night: usize,
    pub n_valid_day: usize,
    pub e0: f64,
    pub e0_std_dev: Option<f64>,
    pub e0_windows: usize,
    pub e0_windows_accepted: usize,
    pub r10_days_accepted: usize,
    pub light_response_days_accepted: usize,
    pub ter_missing: usize,
    pub gpp_missing: usize,
    pub r10_rejections: RejectionCounts,
    pub light_response_rejections: RejectionCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionOutput {
    pub records: Vec<PartitionedObservation>,
    pub temperature_sensitivity: TemperatureSensitivity,
    pub daily_respiration: Vec<DailyEstimate>,
    pub daily_light_response: Vec<DailyEstimate>,
    pub summary: PartitionSummary,
}

/// Validated options bound to the partitioning pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct NeePartitioner {
    options: PartitionOptions,
}

impl NeePartitioner {
    /// # Errors
    /// - Any error of [`PartitionOptions::validate`].
    pub fn new(options: PartitionOptions) -> PartitionResult<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &PartitionOptions {
        &self.options
    }

    /// Validate and classify `records`, then partition them.
    pub fn partition_records(&self, records: &[RawRecord]) -> PartitionResult<PartitionOutput> {
        let series = ObservationSeries::from_records(records, &self.options.quality)?;
        self.partition(&series)
    }

    /// Run every stage on an already classified series.
    ///
    /// # Errors
    /// - [`PartitionError::TemperatureSensitivityUnavailable`](crate::partition::errors::PartitionError::TemperatureSensitivityUnavailable)
    ///   when no E0 window is accepted.
    pub fn partition(&self, series: &ObservationSeries) -> PartitionResult<PartitionOutput> {
        let opts = &self.options;
        let observations = series.observations();
        info!(records = observations.len(), days = series.n_days(), "partitioning NEE");

        let temperature_sensitivity =
            estimate_e0(series, &opts.temperature_sensitivity, &opts.optimizer)?;
        let e0 = temperature_sensitivity.e0;

        let daily_respiration = estimate_r10(series, e0, &opts.respiration_rate, &opts.optimizer);
        let respiration = RespirationModel::new(e0, &daily_respiration);

        let daily_light_response =
            estimate_light_response(series, &respiration, &opts.light_response, &opts.optimizer);
        let light = LightResponseModel::new(&daily_light_response);

        let records: Vec<PartitionedObservation> = observations
            .iter()
            .map(|obs| {
                let day = obs.day_index;
                let ter = respiration.respiration_at(obs);
                let gpp = light.gpp_at(obs);
                PartitionedObservation {
                    timestamp: obs.timestamp,
                    nee: obs.nee,
                    ter: ter.as_ref().ok().copied(),
                    gpp: gpp.as_ref().ok().copied(),
                    diagnostics: Diagnostics {
                        period: obs.period,
                        validity: obs.validity,
                        respiration: EstimateDiagnostics {
                            provenance: respiration.r10(day).ok().map(|(_, p)| p),
                            day_rejection: day_rejection(&daily_respiration, day),
                            unavailable: ter.err(),
                        },
                        light_response: EstimateDiagnostics {
                            provenance: light.parameters(day).ok().map(|(_, _, p)| p),
                            day_rejection: day_rejection(&daily_light_response, day),
                            unavailable: gpp.err(),
                        },
                    },
                }
            })
            .collect();

        let summary = summarize(
            series,
            &temperature_sensitivity,
            &daily_respiration,
            &daily_light_response,
            &records,
        );
        info!(
            ter_missing = summary.ter_missing,
            gpp_missing = summary.gpp_missing,
            r10_days_accepted = summary.r10_days_accepted,
            light_response_days_accepted = summary.light_response_days_accepted,
            "partitioning finished"
        );

        Ok(PartitionOutput {
            records,
            temperature_sensitivity,
            daily_respiration,
            daily_light_response,
            summary,
        })
    }
}

/// Validate `options` and partition `records` in one call.
pub fn partition(records: &[RawRecord], options: &PartitionOptions) -> PartitionResult<PartitionOutput> {
    NeePartitioner::new(options.clone())?.partition_records(records)
}

fn summarize(
    series: &ObservationSeries, ts: &TemperatureSensitivity, daily_r10: &[DailyEstimate],
    daily_lr: &[DailyEstimate], records: &[PartitionedObservation],
) -> PartitionSummary {
    let accepted = |daily: &[DailyEstimate]| daily.iter().filter(|d| d.outcome.fit().is_some()).count();
    let rejections =
        |daily: &[DailyEstimate]| RejectionCounts::tally(daily.iter().filter_map(|d| d.outcome.rejection()));
    let days = 0..series.n_days();
    PartitionSummary {
        n_records: records.len(),
        n_days: series.n_days(),
        n_valid_night: days.clone().map(|d| series.night_indices(d).len()).sum(),
        n_valid_day: days.map(|d| series.day_indices(d).len()).sum(),
        e0: ts.e0,
        e0_std_dev: ts.std_dev,
        e0_windows: ts.windows.len(),
        e0_windows_accepted: ts.accepted,
        r10_days_accepted: accepted(daily_r10),
        light_response_days_accepted: accepted(daily_lr),
        ter_missing: records.iter().filter(|r| r.ter.is_none()).count(),
        gpp_missing: records.iter().filter(|r| r.gpp.is_none()).count(),
        r10_rejections: rejections(daily_r10),
        light_response_rejections: rejections(daily_lr),
    }
}
