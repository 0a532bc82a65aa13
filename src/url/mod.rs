//! URL handling module for Final-Hop
//!
//! Domain keys are the unit of politeness: all URLs sharing a key are
//! fetched by one worker, one at a time.

mod domain;

pub use domain::extract_domain;
