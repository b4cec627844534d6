//! Transiter proxy library entry points.
//!
//! This crate holds everything the GraphQL resolver needs below the Lambda
//! boundary: typed queries, the Transiter wire model, the [`Upstream`] seam
//! with its HTTP implementation, bounded fan-out, and the two query
//! translators with their response assembly. The Lambda crates should only
//! depend on the items exported here.
//!

#![deny(warnings)]

pub mod assemble;
pub mod client;
pub mod config;
pub mod distance;
pub mod error;
pub mod fanout;
pub mod model;
pub mod nearby;
pub mod statuses;
pub mod transiter;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use assemble::Assembled;
pub use client::{TransiterClient, Upstream};
pub use config::UpstreamConfig;
pub use error::{Error, Result, UpstreamError, UpstreamErrorKind};
pub use model::{
    AlertText, Coordinate, Direction, NearbyQuery, RouteAlert, RouteStatus, RouteStatusQuery,
    TrainTime,
};
pub use nearby::nearby_train_times;
pub use statuses::route_statuses;
