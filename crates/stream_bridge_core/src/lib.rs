//! Shared stream bridge domain primitives.
//!
//! This crate owns the change record wire model, attribute decoding, batch
//! planning and transport entry assembly. It intentionally excludes AWS SDK and
//! Lambda runtime concerns.

pub mod batching;
pub mod entry;
pub mod record;
pub mod value;
