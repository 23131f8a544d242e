//! # LeadScore Core
//!
//! Core library for the LeadScore lead-scoring service.
//!
//! This crate provides the scoring pipeline:
//!
//! - [`LeadRecord`] - A raw lead, field name to JSON value
//! - [`FeatureSchema`] - Column layout learned once at training time
//! - [`LogisticRegression`] - Multinomial logistic regression
//! - [`ScoringPipeline`] - Train once, predict many, with atomic model swaps
//! - [`Evaluation`] - Held-out accuracy, confusion matrix, classification report
//!
//! ## Example
//!
//! ```rust,no_run
//! use leadscore_core::{LeadRecord, ScoringPipeline};
//!
//! # fn load_leads() -> Vec<LeadRecord> { Vec::new() }
//! let pipeline = ScoringPipeline::new();
//!
//! // Train on labeled leads
//! let evaluation = pipeline.train(&load_leads()).unwrap();
//! println!("accuracy: {:.3}", evaluation.accuracy);
//!
//! // Score new ones
//! for result in pipeline.predict(&load_leads()).unwrap() {
//!     println!("{} ({:.2})", result.predicted_status, result.confidence_score);
//! }
//! ```

pub mod error;
pub mod fields;
pub mod record;
pub mod features;
pub mod split;
pub mod classifier;
pub mod metrics;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
pub use fields::{FieldKind, FieldSpec, LEAD_FIELDS, LABEL_FIELD, TAG_FIELD};
pub use record::LeadRecord;
pub use features::{FeatureMatrix, FeatureSchema, CategoryEncoding, SCHEMA_VERSION};
pub use split::{stratified_split, StratifiedSplit};
pub use classifier::{LogisticRegression, SolverConfig};
pub use metrics::{ClassMetrics, ClassificationReport, Evaluation};
pub use pipeline::{
    PredictionResult, PrepareMode, PreparedBatch, ScoringPipeline, TrainedModel, TrainingConfig,
};
