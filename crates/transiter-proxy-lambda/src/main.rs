//! Lambda entry point for the `nearbyTrainTimes` and `routeStatuses` resolver.

use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    transiter_proxy_lambda::run().await
}
