use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing::error;

use contentful_slack_notifier::{handlers::{handle_request, AppState}, logging};

#[tokio::main]
async fn main() -> Result<(), Error> {
    logging::init();

    let state = match AppState::from_env().await {
        Ok(state) => state,
        Err(err) => {
            error!(error = ?err, "Failed to initialise notifier");
            return Err(err.into());
        }
    };

    let state = &state;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<ApiGatewayProxyRequest>| async move {
        func(state, event).await
    })).await
}

async fn func(state: &AppState, event: LambdaEvent<ApiGatewayProxyRequest>) -> Result<ApiGatewayProxyResponse, Error> {
    let (request, _context) = event.into_parts();

    Ok(handle_request(state, request).await)
}
