//! # LSR Common Library
//!
//! Annotation record model and update discipline for the lab safety review
//! tool:
//! - Dataset item and normalized annotation types
//! - Record store (annotation file load/persist)
//! - One-time schema expansion
//! - Field update controller with typed keys
//! - Review session and navigation
//! - Configuration loading
//! - Status summary

pub mod config;
pub mod controller;
pub mod error;
pub mod expander;
pub mod model;
pub mod session;
pub mod status;
pub mod store;

pub use config::{ChoiceConfig, ChoiceSet, ReviewConfig};
pub use controller::{AspectKey, Judgement, PointKey, ScenarioKey, SituationKey};
pub use error::{Error, Result};
pub use model::DatasetItem;
pub use session::{Navigation, ReviewSession};
