//! Unit tests for configuration loading and precedence.
//!
//! - `helpers`: shared layer composition
//! - `precedence`: layer precedence and defaults
//! - `field_resolution`: token, repository, queue, and address resolution

mod helpers;
