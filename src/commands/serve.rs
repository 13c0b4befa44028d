use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::controllers::paste;
use crate::types::api::{GatewayRequest, GatewayResponse};
use crate::App;

pub async fn run(app: App) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], app.config.port));
    let router = router(app);

    info!(%addr, "listening");
    axum::Server::bind(&addr)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

fn router(app: App) -> Router {
    let max_upload_size = app.config.limits.max_upload_size;

    Router::new()
        .route(
            "/",
            get(retrieve_paste)
                .post(submit_paste)
                .options(preflight),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_size))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

async fn retrieve_paste(
    State(app): State<App>,
    Query(params): Query<BTreeMap<String, String>>,
) -> GatewayResponse {
    let request = GatewayRequest {
        http_method: Some("GET".to_owned()),
        query_string_parameters: Some(params),
        body: None,
    };
    paste::retrieve(&app, &request).await
}

async fn submit_paste(State(app): State<App>, body: Bytes) -> GatewayResponse {
    let body = match String::from_utf8(body.to_vec()) {
        Ok(body) => body,
        Err(err) => return paste::internal_error(err.into()),
    };
    let request = GatewayRequest {
        http_method: Some("POST".to_owned()),
        query_string_parameters: None,
        body: Some(body),
    };
    paste::submit(&app, &request).await
}

async fn preflight() -> GatewayResponse {
    paste::preflight()
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST);
        let mut response = (status, self.body).into_response();

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!(%name, "dropping invalid response header"),
            }
        }

        response
    }
}
