//! # LeadScore Generator
//!
//! Synthetic B2B sales leads with the full LeadScore field table.
//!
//! Outcomes are drawn as Closed-Won 20%, Closed-Lost 50%, Disqualified 30%.
//! `time_to_conversion_days` and `deal_value_usd` are only non-zero for
//! Closed-Won leads. Every other field is drawn independently of the outcome.
//!
//! ```rust
//! use leadscore_generator::LeadGenerator;
//!
//! let mut generator = LeadGenerator::with_seed(5, 42);
//! let leads = generator.generate();
//! assert_eq!(leads.len(), 5);
//! ```

pub mod generator;

pub use generator::{LeadGenerator, CONVERSION_STATUSES, WON_STATUS};
