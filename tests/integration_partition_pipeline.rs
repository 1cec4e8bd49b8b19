//! Integration tests for the NEE partitioning pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end pipeline on synthetic eddy-covariance data with
//!   known parameters: from raw records, through the quality filter and the
//!   three estimation stages, to the partitioned output table.
//! - Exercise realistic regimes (seasonal warming, diurnal cycles, Gaussian
//!   measurement noise, long gaps) rather than toy edge cases only.
//!
//! Coverage
//! --------
//! - `partition::pipeline`: `partition`, `NeePartitioner`, output layout and
//!   diagnostics.
//! - `partition::respiration` / `partition::light_response`: parameter
//!   recovery, gap filling across long gaps, fatal E0 failure.
//! - Serialization of the output with `serde_json`.
//!
//! Exclusions
//! ----------
//! - Low-level building blocks (bounds, transforms, standard errors, window
//!   schedules) are covered by unit tests.
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use nee_partition::partition::{
    errors::{PartitionError, RejectionReason},
    interpolation::Provenance,
    models::{light_response, lloyd_taylor},
    prelude::*,
};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

const E0_TRUE: f64 = 80.0;
const R10_TRUE: f64 = 2.0;
const ALPHA_TRUE: f64 = 0.05;
const GP_MAX_TRUE: f64 = 20.0;

/// Purpose
/// -------
/// Generate half-hourly synthetic records with known respiration and light
/// response.
///
/// Configuration
/// -------------
/// - Temperature: linear warming from 5 °C to 25 °C over the series plus a
///   diurnal cycle of `±diurnal_amplitude` K peaking mid-afternoon (`0.0`
///   gives the plain ramp).
/// - PPFD: half-sine between 06:00 and 18:00 peaking at 1500 µmol m⁻² s⁻¹,
///   zero otherwise.
/// - NEE: `TER(T) − GPP(PPFD)` with `E0 = 80`, `R10 = 2`, `α = 0.05`,
///   `GPmax = 20`, plus `N(0, 0.3²)` noise.
///
/// Invariants
/// ----------
/// - Seeded `StdRng`, so every call with the same arguments returns the same
///   records.
fn synthetic_records(n_days: usize, seed: u64, diurnal_amplitude: f64) -> Vec<RawRecord> {
    let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.3).unwrap();
    let n = n_days * 48;

    (0..n)
        .map(|k| {
            let timestamp = start + Duration::minutes(30 * k as i64);
            let hour = hour_of(timestamp);
            let trend = 5.0 + 20.0 * k as f64 / (n - 1) as f64;
            let temperature =
                273.15 + trend + diurnal_amplitude * (2.0 * std::f64::consts::PI * (hour - 9.0) / 24.0).sin();
            let ppfd = if (6.0..18.0).contains(&hour) {
                1500.0 * (std::f64::consts::PI * (hour - 6.0) / 12.0).sin()
            } else {
                0.0
            };
            let nee = lloyd_taylor(temperature, E0_TRUE, R10_TRUE)
                - light_response(ppfd, ALPHA_TRUE, GP_MAX_TRUE)
                + noise.sample(&mut rng);
            RawRecord {
                timestamp,
                nee: Some(nee),
                temperature: Some(temperature),
                ppfd: Some(ppfd),
                qc_flag: Some(0),
            }
        })
        .collect()
}

fn hour_of(ts: NaiveDateTime) -> f64 {
    ts.hour() as f64 + ts.minute() as f64 / 60.0
}

fn day_index(rec: &RawRecord, first: NaiveDate) -> usize {
    (rec.timestamp.date() - first).num_days() as usize
}

/// Check the recovery targets of a 30-day run against the true parameters.
///
/// - E0 within [72, 88].
/// - At least 80% of days with R10 within ±15% of 2.0.
/// - α and GPmax within ±20% on every accepted light-response day.
fn assert_recovers_parameters(out: &PartitionOutput) {
    let e0 = out.temperature_sensitivity.e0;
    assert!((72.0..=88.0).contains(&e0), "E0 = {e0}");

    let r10_ok = out
        .daily_respiration
        .iter()
        .filter(|d| {
            d.outcome
                .fit()
                .and_then(|f| f.value("R10"))
                .is_some_and(|r10| (r10 - R10_TRUE).abs() <= 0.15 * R10_TRUE)
        })
        .count();
    assert!(r10_ok * 10 >= out.daily_respiration.len() * 8, "R10 ok on {r10_ok} of 30 days");

    let accepted: Vec<_> = out.daily_light_response.iter().filter_map(|d| d.outcome.fit()).collect();
    assert!(!accepted.is_empty());
    let lr_ok = accepted
        .iter()
        .filter(|f| {
            let alpha = f.value("alpha").unwrap();
            let gp_max = f.value("GPmax").unwrap();
            (alpha - ALPHA_TRUE).abs() <= 0.2 * ALPHA_TRUE
                && (gp_max - GP_MAX_TRUE).abs() <= 0.2 * GP_MAX_TRUE
        })
        .count();
    assert_eq!(lr_ok, accepted.len(), "light response ok on {lr_ok} of {}", accepted.len());
}

#[test]
// Purpose
// -------
// The 30-day scenario with a plain 5 → 25 °C temperature ramp recovers
// every parameter.
//
// Given
// -----
// - 30 days of half-hourly data, no diurnal temperature cycle, σ = 0.3,
//   E0 = 80, R10 = 2, α = 0.05, GPmax = 20; seed 7.
// - With only the seasonal ramp, night temperatures inside a window follow
//   the slow trend and E0 is weakly identified: over seeds 0..20 the median
//   E0 lands in [72, 88] for 18 of 20 (seeds 0 and 10 fall above 88), while R10 and the light
//   response are within tolerance on every day for every seed.
//
// Expect
// ------
// - The recovery targets of `assert_recovers_parameters`.
fn thirty_day_ramp_scenario_recovers_parameters() {
    let records = synthetic_records(30, 7, 0.0);

    let out = partition(&records, &PartitionOptions::default()).unwrap();

    assert_recovers_parameters(&out);
}

#[test]
// Purpose
// -------
// Adding a ±4 K diurnal cycle to the 30-day scenario keeps every
// parameter recoverable.
//
// Given
// -----
// - As the ramp scenario, plus a diurnal temperature cycle.
//
// Expect
// ------
// - The recovery targets of `assert_recovers_parameters`.
fn thirty_day_diurnal_scenario_recovers_parameters() {
    let records = synthetic_records(30, 7, 4.0);

    let out = partition(&records, &PartitionOptions::default()).unwrap();

    assert_recovers_parameters(&out);
}

#[test]
// Purpose
// -------
// Partitioned fluxes are physically valid everywhere.
//
// Expect
// ------
// - One row per record with NEE unchanged.
// - TER ≥ 0 and GPP ≥ 0 whenever present; GPP == 0 whenever PPFD == 0.
fn output_is_physically_valid() {
    let records = synthetic_records(12, 11, 4.0);

    let out = partition(&records, &PartitionOptions::default()).unwrap();

    assert_eq!(out.records.len(), records.len());
    assert_eq!(out.summary.ter_missing, 0);
    for (row, rec) in out.records.iter().zip(&records) {
        assert_eq!(row.nee, rec.nee);
        assert!(row.ter.unwrap() >= 0.0);
        let gpp = row.gpp.unwrap();
        assert!(gpp >= 0.0);
        if rec.ppfd == Some(0.0) {
            assert_eq!(gpp, 0.0);
        }
    }
}

#[test]
// Purpose
// -------
// A long gap in night data is survived without a fatal error.
//
// Given
// -----
// - 40 days with night NEE removed on days 10 through 30.
//
// Expect
// ------
// - Day 20 rejected for insufficient data at every window width.
// - TER at day 20 still present, interpolated between accepted days.
fn long_night_gap_is_interpolated() {
    let mut records = synthetic_records(40, 3, 4.0);
    let first = records[0].timestamp.date();
    for rec in records.iter_mut() {
        let d = day_index(rec, first);
        if (10..=30).contains(&d) && rec.ppfd.is_some_and(|p| p < 20.0) {
            rec.nee = None;
        }
    }

    let out = partition(&records, &PartitionOptions::default()).unwrap();

    let day20 = &out.daily_respiration[20];
    assert!(matches!(
        day20.outcome.rejection(),
        Some(RejectionReason::InsufficientData { available: 0, .. })
    ));
    let row = out
        .records
        .iter()
        .find(|r| r.timestamp.date() == day20.day)
        .unwrap();
    assert!(row.ter.is_some_and(|t| t > 0.0));
    assert!(matches!(row.diagnostics.respiration.provenance, Some(Provenance::Interpolated { .. })));
    assert!(matches!(
        row.diagnostics.respiration.day_rejection,
        Some(RejectionReason::InsufficientData { .. })
    ));
}

#[test]
// Purpose
// -------
// Identical inputs give byte-identical serialized outputs despite the
// parallel stages.
fn partition_is_idempotent() {
    let records = synthetic_records(8, 5, 4.0);
    let partitioner = NeePartitioner::new(PartitionOptions::default()).unwrap();

    let first = serde_json::to_string(&partitioner.partition_records(&records).unwrap()).unwrap();
    let second = serde_json::to_string(&partitioner.partition_records(&records).unwrap()).unwrap();

    assert_eq!(first, second);
}

#[test]
// Purpose
// -------
// Without any night data the temperature sensitivity is unavailable and the
// whole run fails.
fn missing_night_data_is_fatal() {
    let records: Vec<RawRecord> = synthetic_records(6, 9, 4.0)
        .into_iter()
        .map(|mut r| {
            if r.ppfd.is_some_and(|p| p < 20.0) {
                r.nee = None;
            }
            r
        })
        .collect();

    let err = partition(&records, &PartitionOptions::default()).unwrap_err();

    assert!(matches!(err, PartitionError::TemperatureSensitivityUnavailable { windows: 0, .. }));
}
