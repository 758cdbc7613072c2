#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Acquisition and curve-fit engine for a light-intensity PCR reader (hardware-agnostic).
//!
//! All hardware access goes through `pcr_traits::SensorPort`, and all
//! persistence through [`DocumentStore`].
//!
//! ## Architecture
//!
//! - **Samples**: fixed-capacity circular buffer per experiment (`buffer`)
//! - **Math**: mean-centered least squares and PCR efficiency (`regression`)
//! - **Standard curve**: dilution points, fit and reliability summary (`curve`)
//! - **Experiments**: one record per name (`experiment`), kept in a never-empty
//!   [`ExperimentStore`] backed by a [`DocumentStore`]
//! - **Acquisition**: `Idle -> Running -> Idle` state machine (`controller`),
//!   driven tick by tick from [`runner::run_acquisition`]
//! - **Events**: ordered notifications over crossbeam channels (`events`)
//!
//! ## Timing
//!
//! One tick per `tick_ms` (default 2000 ms); each tick triggers the sensor,
//! waits `settle_ms` (default 180 ms) and reads. The settle delay must be
//! shorter than the tick period.

pub mod buffer;
pub mod builder;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod curve;
pub mod document_store;
pub mod error;
pub mod events;
pub mod experiment;
pub mod hw_error;
pub mod mocks;
pub mod regression;
pub mod runner;
pub mod session;
pub mod status;
pub mod store;
pub mod util;

pub use buffer::SampleBuffer;
pub use builder::SessionBuilder;
pub use config::{AcquisitionCfg, LedCfg};
pub use controller::AcquisitionController;
pub use curve::{CurveAnalysis, Reliability, StandardCurvePoint, StandardCurveSet};
pub use document_store::{DocumentStore, FsDocumentStore, MemoryDocumentStore};
pub use error::{PcrError, Result};
pub use events::{Event, EventBus};
pub use experiment::ExperimentRecord;
pub use regression::{Regression, efficiency, fit};
pub use runner::{RunReport, run_acquisition};
pub use session::Session;
pub use status::{ControllerState, TickOutcome};
pub use store::ExperimentStore;
