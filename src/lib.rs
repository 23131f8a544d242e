//! # LeadScore
//!
//! A demo lead-scoring service: synthetic B2B sales leads, a logistic
//! regression model predicting deal conversion, and a small REST API.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! cargo install leadscore
//! leadscore --http-port 8000 --training-records 1000
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use leadscore::prelude::*;
//!
//! // Train on a synthetic batch
//! let pipeline = ScoringPipeline::new();
//! let evaluation = pipeline.train(&LeadGenerator::with_seed(1000, 42).generate()).unwrap();
//! println!("held-out accuracy: {:.3}", evaluation.accuracy);
//!
//! // Score new leads
//! let leads = LeadGenerator::new(10).generate();
//! for result in pipeline.predict(&leads).unwrap() {
//!     println!("{} {:.2}", result.predicted_status, result.confidence_score);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - [`leadscore-core`](https://docs.rs/leadscore-core) - Field table, feature schema, classifier, pipeline
//! - [`leadscore-generator`](https://docs.rs/leadscore-generator) - Synthetic lead generator
//! - [`leadscore-api`](https://docs.rs/leadscore-api) - REST API

// Re-export core types
pub use leadscore_core::{
    LeadRecord, FeatureSchema, FeatureMatrix,
    ScoringPipeline, TrainedModel, TrainingConfig, PrepareMode,
    PredictionResult, Evaluation, ClassificationReport,
    LogisticRegression, SolverConfig,
    Error, Result,
};

// Re-export generator
pub use leadscore_generator::LeadGenerator;

// Re-export API
pub use leadscore_api::{AppState, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        LeadRecord, FeatureSchema,
        ScoringPipeline, TrainingConfig, PrepareMode,
        PredictionResult, Evaluation,
        Error, Result,
        LeadGenerator,
        AppState, RestApi,
    };
}
