//! State module for per-domain politeness tracking
//!
//! # Components
//!
//! - `DomainState`: last access time and request count for one domain
//! - `DomainClock`: the map of domain states that gates the frontier

mod domain_state;

// Re-export main types
pub use domain_state::{DomainClock, DomainState};
