use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use stream_bridge_lambda::adapters::eventbridge::EventBridgeSink;
use stream_bridge_lambda::config::publish_target_from_env;
use stream_bridge_lambda::handlers::stream::handle_stream_event;
use stream_bridge_lambda::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing().map_err(Error::from)?;

    let target = publish_target_from_env().map_err(|error| Error::from(error.to_string()))?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let sink = Arc::new(EventBridgeSink::new(aws_sdk_eventbridge::Client::new(
        &aws_config,
    )));

    lambda_runtime::run(service_fn(|event: LambdaEvent<Value>| {
        let target = target.clone();
        let sink = Arc::clone(&sink);
        async move {
            handle_stream_event(event.payload, &target, sink).await?;
            Ok::<(), Error>(())
        }
    }))
    .await
}
