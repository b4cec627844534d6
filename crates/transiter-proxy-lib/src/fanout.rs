//! Bounded concurrent fan-out for multi-call translators.

use std::future::Future;

use futures::stream::{self, StreamExt};

/// Maximum number of upstream calls one invocation keeps in flight.
pub const FAN_OUT_LIMIT: usize = 8;

/// Run `call` for every item with at most `limit` futures in flight and
/// collect every outcome.
///
/// Results come back in input order regardless of completion order.
pub async fn fan_out<I, F, Fut>(items: I, limit: usize, call: F) -> Vec<Fut::Output>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future,
{
    stream::iter(items)
        .map(call)
        .buffered(limit.max(1))
        .collect()
        .await
}
