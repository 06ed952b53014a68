//! Connection hub: registry, delivery channels, SSE streams, and deferred
//! follow-up broadcasts.

pub mod notifier;
pub mod registry;
pub mod stream;
