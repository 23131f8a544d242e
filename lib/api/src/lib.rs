//! # LeadScore API
//!
//! REST endpoints over a trained [`ScoringPipeline`](leadscore_core::ScoringPipeline):
//!
//! | Method | Path           | Description                                  |
//! |--------|----------------|----------------------------------------------|
//! | GET    | `/`            | Service banner                               |
//! | POST   | `/predict`     | Score a single lead                          |
//! | GET    | `/leads`       | Fresh synthetic leads with their predictions |
//! | GET    | `/model-stats` | Held-out accuracy, confusion matrix, report  |
//! | GET    | `/stats`       | Dashboard aggregates over a live batch       |

pub mod rest;

pub use rest::{AppState, LeadInput, RestApi};
