use clap::ValueEnum;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{info, warn};

use crate::controllers::paste;
use crate::error::AppError;
use crate::storage::Storage;
use crate::types::api::{GatewayRequest, GatewayResponse};
use crate::App;

/// Which handler a function deployment runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum HandlerKind {
    /// Store pastes (POST).
    Submit,
    /// Look pastes up (GET).
    Retrieve,
    /// Pick by the event's `httpMethod`.
    #[default]
    Auto,
}

pub async fn run(app: App, handler: HandlerKind) -> anyhow::Result<()> {
    info!(?handler, "waiting for invocations");

    let app = &app;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        Ok::<_, Error>(handle_event(app, handler, event).await)
    }))
    .await
    .map_err(|err| anyhow::anyhow!(err))
}

async fn handle_event<S: Storage>(
    app: &App<S>,
    handler: HandlerKind,
    event: LambdaEvent<Value>,
) -> GatewayResponse {
    let request_id = event.context.request_id.clone();
    info!(%request_id, "invocation");

    let request: GatewayRequest = match serde_json::from_value(event.payload) {
        Ok(request) => request,
        Err(source) => {
            warn!(%request_id, error = %source, "event is not an API Gateway proxy request");
            return paste::internal_error(AppError::MalformedJson { source });
        }
    };

    dispatch(app, handler, &request).await
}

async fn dispatch<S: Storage>(
    app: &App<S>,
    handler: HandlerKind,
    request: &GatewayRequest,
) -> GatewayResponse {
    match handler {
        HandlerKind::Submit => paste::submit(app, request).await,
        HandlerKind::Retrieve => paste::retrieve(app, request).await,
        HandlerKind::Auto => paste::handle(app, request).await,
    }
}
