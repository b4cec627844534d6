mod models;

use std::future::Future;
use std::time::{Duration, Instant};

use lambda_runtime::{service_fn, Diagnostic, Error, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use transiter_proxy_lambda_shared::{
    from_lib_error, init_tracing, InvocationEnvelope, NearbyTrainTimesArgs, ProblemDetails,
    ProxyRuntime, ResolverField, RouteStatusesArgs,
};
use transiter_proxy_lib::{nearby_train_times, route_statuses, Assembled};

pub use models::{AlertMessagesDto, AlertTextDto, RouteAlertDto, RouteStatusDto, TrainTimeDto};

/// Successful resolver result: the bare list the GraphQL field returns.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum FieldPayload {
    TrainTimes(Vec<TrainTimeDto>),
    RouteStatuses(Vec<RouteStatusDto>),
}

impl FieldPayload {
    pub fn len(&self) -> usize {
        match self {
            FieldPayload::TrainTimes(items) => items.len(),
            FieldPayload::RouteStatuses(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A resolved field together with the number of items the upstream could
/// not answer for.
struct Resolved {
    payload: FieldPayload,
    unresolved: usize,
}

impl Resolved {
    fn new<T, D>(assembled: Assembled<T>, wrap: fn(Vec<D>) -> FieldPayload) -> Self
    where
        D: From<T>,
    {
        let unresolved = assembled.unresolved.len();
        let items = assembled.items.into_iter().map(D::from).collect();
        Self {
            payload: wrap(items),
            unresolved,
        }
    }

    fn outcome(&self) -> &'static str {
        if self.unresolved > 0 {
            "partial"
        } else {
            "ok"
        }
    }
}

/// Entry point used by the Lambda runtime.
pub async fn run() -> Result<(), Error> {
    init_tracing();

    // Builds the pooled upstream client once per execution environment
    let runtime = ProxyRuntime::from_env()?;
    let runtime = &runtime;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handler(runtime, event).await
    }))
    .await
}

/// Lambda handler invoked per request.
///
/// Failures are returned as a [`Diagnostic`] so AppSync reports them as
/// field-scoped GraphQL errors whose `errorType` is the problem kind and whose
/// message is the problem's `title: detail`.
pub async fn handler(
    runtime: &ProxyRuntime,
    event: LambdaEvent<Value>,
) -> Result<FieldPayload, Diagnostic> {
    let (payload, context) = event.into_parts();
    let budget = runtime.deadline().for_context(&context);

    dispatch(runtime, payload, &context.request_id, budget)
        .await
        .map_err(Diagnostic::from)
}

/// Resolve one invocation payload within `budget`.
///
/// Emits exactly one `info` record describing the outcome.
pub async fn dispatch(
    runtime: &ProxyRuntime,
    payload: Value,
    request_id: &str,
    budget: Duration,
) -> Result<FieldPayload, ProblemDetails> {
    let started = Instant::now();

    let envelope = InvocationEnvelope::from_payload(payload, request_id);
    let field = envelope
        .as_ref()
        .map(|envelope| envelope.info.field_name.clone())
        .unwrap_or_default();

    let result = match envelope {
        Ok(envelope) => resolve(runtime, &envelope, request_id, budget).await,
        Err(problem) => Err(*problem),
    };

    let latency_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(resolved) => info!(
            request_id = %request_id,
            field = %field,
            outcome = resolved.outcome(),
            latency_ms,
            items = resolved.payload.len(),
            unresolved = resolved.unresolved,
            "invocation complete"
        ),
        Err(problem) => info!(
            request_id = %request_id,
            field = %field,
            outcome = problem.kind(),
            latency_ms,
            items = 0usize,
            error = %problem,
            "invocation failed"
        ),
    }

    result.map(|resolved| resolved.payload)
}

async fn resolve(
    runtime: &ProxyRuntime,
    envelope: &InvocationEnvelope,
    request_id: &str,
    budget: Duration,
) -> Result<Resolved, ProblemDetails> {
    let field = ResolverField::from_name(&envelope.info.field_name).ok_or_else(|| {
        ProblemDetails::unsupported_field(&envelope.info.field_name, request_id)
    })?;

    match field {
        ResolverField::NearbyTrainTimes => {
            let args: NearbyTrainTimesArgs = envelope.arguments(request_id).map_err(|p| *p)?;
            let query = args.to_query();

            let assembled = within(budget, request_id, nearby_train_times(runtime.upstream(), &query))
                .await?
                .map_err(|e| from_lib_error(&e, request_id))?;
            Ok(Resolved::new(assembled, FieldPayload::TrainTimes))
        }
        ResolverField::RouteStatuses => {
            let args: RouteStatusesArgs = envelope.arguments(request_id).map_err(|p| *p)?;
            let query = args.to_query(envelope.info.selects("running"));

            let assembled =
                within(budget, request_id, route_statuses(runtime.upstream(), &query)).await?;
            Ok(Resolved::new(assembled, FieldPayload::RouteStatuses))
        }
    }
}

/// Run `work`, abandoning it once `budget` has elapsed.
async fn within<F>(budget: Duration, request_id: &str, work: F) -> Result<F::Output, ProblemDetails>
where
    F: Future,
{
    tokio::time::timeout(budget, work).await.map_err(|_| {
        ProblemDetails::upstream_timeout(
            format!("No upstream answer within {} ms", budget.as_millis()),
            request_id,
        )
    })
}
