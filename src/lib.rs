//! nee_partition — partitioning of net ecosystem exchange into ecosystem
//! respiration and gross primary productivity.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers. The crate consumes an in-memory,
//! regularly sampled series of eddy-covariance NEE, temperature and PPFD and
//! returns continuous TER and GPP series with per-record diagnostics.
//!
//! Key behaviors
//! -------------
//! - [`partition`]: the estimation pipeline (quality filter, temperature
//!   sensitivity, daily respiration rate, light response, gap filling, and the
//!   orchestrator).
//! - [`optimization`]: argmin-backed bounded least-squares minimizer with
//!   finite-difference and Nelder–Mead fallbacks.
//! - [`inference`]: least-squares standard errors used by the acceptance rules.
//! - [`utils`]: robust statistics (median, spread, percentiles) and small
//!   regressions for starting values.
//!
//! Invariants & assumptions
//! ------------------------
//! - All heavy numerical work is deterministic for identical inputs; parallel
//!   stages collect their results in day order.
//! - The library installs no `tracing` subscriber and performs no I/O; hosts
//!   decide where logs and results go.
//!
//! Downstream usage
//! ----------------
//! ```no_run
//! use nee_partition::partition::prelude::*;
//!
//! # fn run(records: Vec<RawRecord>) -> PartitionResult<()> {
//! let partitioner = NeePartitioner::new(PartitionOptions::default())?;
//! let output = partitioner.partition_records(&records)?;
//! println!("E0 = {:.1} K", output.temperature_sensitivity.e0);
//! # Ok(())
//! # }
//! ```
//!
//! Testing notes
//! -------------
//! - Unit tests live next to the code; end-to-end scenarios on synthetic data
//!   are in `tests/`.

pub mod inference;
pub mod optimization;
pub mod partition;
pub mod utils;
