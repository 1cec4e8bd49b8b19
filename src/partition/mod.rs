//! partition — flux partitioning of net ecosystem exchange into respiration
//! and gross primary productivity.
//!
//! Purpose
//! -------
//! Decompose a regular series of NEE, temperature and PPFD into total
//! ecosystem respiration (TER) and gross primary productivity (GPP) with the
//! night-time/daytime windowed-regression approach: a global temperature
//! sensitivity from night data, a daily reference respiration rate, and a
//! daily hyperbolic light response fitted to daytime apparent GPP.
//!
//! Key behaviors
//! -------------
//! - [`data`] and [`quality`] validate the input series and classify every
//!   record as day/night and valid/invalid.
//! - [`fit`] and [`window`] form the single windowed-fit engine: a
//!   [`CurveModel`](models::CurveModel) fitted by bounded least squares, one
//!   acceptance predicate, and an explicit adaptive widening schedule.
//! - [`respiration`] estimates E0 and daily R10 and builds the continuous
//!   [`RespirationModel`]; [`light_response`] does the same for (α, GPmax).
//! - [`interpolation`] fills days without an accepted fit, recording the
//!   provenance of every value.
//! - [`pipeline`] sequences the stages and builds the output table.
//!
//! Invariants & assumptions
//! ------------------------
//! - Temperatures are in kelvin; Lloyd–Taylor is only evaluated above
//!   [`T0`](models::T0).
//! - Only `Valid` observations are fitted; every record still appears in the
//!   output, in input order.
//! - Local failures are diagnostics ([`RejectionReason`]); only invalid input,
//!   invalid options, or zero accepted E0 windows are errors
//!   ([`PartitionError`]).
//!
//! Conventions
//! -----------
//! - Fluxes in µmol m⁻² s⁻¹; NEE positive for release to the atmosphere.
//! - Window widths are odd numbers of whole calendar days centred on the
//!   target day and clipped at the series edges.
//! - Parallel stages use `rayon` and collect in day order.
//!
//! Downstream usage
//! ----------------
//! - Build [`PartitionOptions`] (or deserialize it), create a
//!   [`NeePartitioner`], and call `partition_records` with the loader's
//!   [`RawRecord`]s. The returned [`PartitionOutput`] is `Serialize`.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests; end-to-end scenarios on synthetic
//!   data live in `tests/integration_partition_pipeline.rs`.
pub mod data;
pub mod errors;
pub mod fit;
pub mod interpolation;
pub mod light_response;
pub mod models;
pub mod options;
pub mod pipeline;
pub mod quality;
pub mod respiration;
pub mod window;

pub use self::data::{InvalidReason, Observation, ObservationSeries, Period, RawRecord, Validity};
pub use self::errors::{PartitionError, PartitionResult, RejectionCounts, RejectionReason};
pub use self::fit::{fit_window, FitOutcome, FitPoint, FitResult, ParamEstimate, ParamSpec, Rejection};
pub use self::interpolation::{fill_gaps, FilledValue, Provenance};
pub use self::light_response::{estimate_light_response, LightResponseModel};
pub use self::models::{lloyd_taylor, light_response, CurveModel, HyperbolicLightResponse, LloydTaylor, T0, TREF};
pub use self::options::{
    AcceptanceCriteria, LightResponseOptions, PartitionOptions, QualityOptions, RespirationRateOptions,
    TemperatureSensitivityOptions,
};
pub use self::pipeline::{
    partition, Diagnostics, EstimateDiagnostics, NeePartitioner, PartitionOutput, PartitionSummary,
    PartitionedObservation,
};
pub use self::respiration::{estimate_e0, estimate_r10, RespirationModel, TemperatureSensitivity, WindowFit};
pub use self::window::{fit_adaptive, AdaptiveOutcome, DailyEstimate, WindowSchedule};

// Downstream code can write
//
//     use nee_partition::partition::prelude::*;
//
// to import the pipeline entry points and configuration in one line.

pub mod prelude {
    pub use super::data::{ObservationSeries, RawRecord};
    pub use super::errors::{PartitionError, PartitionResult, RejectionReason};
    pub use super::options::PartitionOptions;
    pub use super::pipeline::{partition, NeePartitioner, PartitionOutput, PartitionedObservation};
}
