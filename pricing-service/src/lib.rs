pub mod api;
pub mod backfill;
pub mod config;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod seed;
pub mod sinks;
pub mod sources;
pub mod transform;

pub use api::router;
pub use pipeline::{Envelope, Pipeline};
