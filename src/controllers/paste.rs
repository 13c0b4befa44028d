use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{error, info};

use crate::error::AppError;
use crate::models::PasteRecord;
use crate::response::respond;
use crate::storage::Storage;
use crate::types::api::{
    Failure, GatewayRequest, GatewayResponse, Notice, PasteNotFound, PasteRetrieved,
    PasteSubmitted,
};
use crate::App;

const REQUIRED_FIELDS: [&str; 3] = ["paste", "creator_gh_user", "recipient_gh_username"];

const MISSING_FIELDS: &str =
    "Missing required fields: paste, creator_gh_user, recipient_gh_username";
const TOO_LARGE: &str = "That was a big one. Try to send a smaller one just in case.";
const STORED: &str = "The paste was successfully inserted into the database";
const NOT_STORED: &str = "The paste could not be stored";
const RETRIEVED: &str = "The paste was successfully retrieved from the database";
const NOT_RETRIEVED: &str = "The paste was unsuccessfully retrieved from the database";
const BAD_PARAMETER: &str =
    "The paste was unsuccessfully retrieved from the database. Parameter is not correct";

/// Route on the HTTP method, for deployments that serve both handlers from
/// one function.
pub async fn handle<S: Storage>(app: &App<S>, request: &GatewayRequest) -> GatewayResponse {
    match request.http_method.as_deref().map(str::to_ascii_uppercase).as_deref() {
        Some("POST") => submit(app, request).await,
        Some("GET") => retrieve(app, request).await,
        Some("OPTIONS") => preflight(),
        method => {
            info!(?method, "unsupported method");
            respond(
                405,
                Notice {
                    message: "Method not allowed",
                    joke: None,
                },
            )
        }
    }
}

/// Validate a submission, store it under a fresh id and echo it back.
pub async fn submit<S: Storage>(app: &App<S>, request: &GatewayRequest) -> GatewayResponse {
    if let Err(err) = app.store.check_config() {
        return internal_error(err);
    }

    let raw_data = match request.body.as_deref() {
        Some(body) => body,
        None => return internal_error(AppError::MissingBody),
    };
    let body: Value = match serde_json::from_str(raw_data) {
        Ok(body) => body,
        Err(source) => return internal_error(AppError::MalformedJson { source }),
    };

    let [paste, creator_gh_user, recipient_gh_username] = match required_fields(&body) {
        Some(fields) => fields,
        None => {
            info!("submission rejected: missing required fields");
            return respond(
                400,
                Notice {
                    message: MISSING_FIELDS,
                    joke: app.banter().comment(),
                },
            );
        }
    };

    let max_paste_size = app.config.limits.max_paste_size;
    if paste.len() > max_paste_size {
        info!(size = paste.len(), max_paste_size, "submission rejected: paste too large");
        return respond(
            413,
            Notice {
                message: TOO_LARGE,
                joke: app.banter().comment(),
            },
        );
    }

    let record = PasteRecord::new(&paste, &creator_gh_user, &recipient_gh_username);

    if !app.store.put(&record).await {
        return respond(
            500,
            Failure {
                error: "storage_error",
                message: NOT_STORED,
            },
        );
    }

    respond(
        200,
        PasteSubmitted {
            message: STORED,
            id: record.id,
            timestamp: record.timestamp,
            raw_data: raw_data.to_owned(),
            paste,
            joke: app.banter().comment(),
        },
    )
}

/// Look a paste up by the single `id` query parameter.
pub async fn retrieve<S: Storage>(app: &App<S>, request: &GatewayRequest) -> GatewayResponse {
    if let Err(err) = app.store.check_config() {
        return internal_error(err);
    }

    let params = normalize_params(request.query_string_parameters.as_ref());
    let id = match (params.len(), params.get("id")) {
        (1, Some(id)) => id,
        _ => {
            let names: Vec<&String> = params.keys().collect();
            info!(?names, "retrieval rejected: bad parameters");
            return respond(
                400,
                Notice {
                    message: BAD_PARAMETER,
                    joke: app.banter().comment(),
                },
            );
        }
    };

    // not found stays a 400 so existing clients keep working
    let Some(record) = app.store.get(id).await else {
        info!(id = %id, "paste not found");
        return respond(
            400,
            PasteNotFound {
                message: NOT_RETRIEVED,
                id: "Not Found",
                joke: app.banter().comment(),
            },
        );
    };

    info!(id = %record.id, "paste retrieved");
    respond(
        200,
        PasteRetrieved {
            message: RETRIEVED,
            id: record.id,
            paste: record.paste,
            joke: app.banter().comment(),
            creator_gh_user: record.creator_gh_user,
            recipient_gh_username: record.recipient_gh_username,
        },
    )
}

/// CORS preflight; the envelope headers carry the allowed origins and methods.
pub fn preflight() -> GatewayResponse {
    respond(
        200,
        Notice {
            message: "OK",
            joke: None,
        },
    )
}

/// Parameter names are matched case-insensitively.
fn normalize_params(params: Option<&BTreeMap<String, String>>) -> BTreeMap<String, String> {
    params
        .into_iter()
        .flatten()
        .map(|(key, value)| (key.to_lowercase(), value.clone()))
        .collect()
}

/// All three fields, or `None` if any is absent. Non-string values are kept
/// as their JSON text.
fn required_fields(body: &Value) -> Option<[String; 3]> {
    let field = |name: &str| {
        body.get(name).map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    };

    let [paste, creator, recipient] = REQUIRED_FIELDS.map(field);
    Some([paste?, creator?, recipient?])
}

/// Opaque 500 for failures the client cannot act on; details go to the log.
pub fn internal_error(err: AppError) -> GatewayResponse {
    error!(error = ?err, "request failed");
    respond(
        500,
        Failure {
            error: err.code(),
            message: "Internal server error",
        },
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::config::Config;
    use crate::storage::memory::MemoryStorage;
    use crate::storage::RecordStore;

    /// Memory storage that counts calls and can be told to fail.
    #[derive(Clone, Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        reads: Arc<AtomicUsize>,
        writes: Arc<AtomicUsize>,
        fail_writes: bool,
        unconfigured: bool,
    }

    impl CountingStorage {
        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    impl Storage for CountingStorage {
        async fn get_record(&self, id: &str) -> crate::AppResult<Option<PasteRecord>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get_record(id).await
        }

        async fn put_record(&self, record: &PasteRecord) -> crate::AppResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes {
                return Err(AppError::TableNotFound {
                    table: "pastes".to_owned(),
                });
            }
            self.inner.put_record(record).await
        }

        fn check_config(&self) -> crate::AppResult<()> {
            if self.unconfigured {
                return Err(AppError::MissingTableName);
            }
            Ok(())
        }
    }

    fn app(storage: &CountingStorage) -> App<CountingStorage> {
        App {
            config: Config::default(),
            store: RecordStore::new(storage.clone()),
        }
    }

    fn post(body: Value) -> GatewayRequest {
        GatewayRequest {
            http_method: Some("POST".to_owned()),
            body: Some(body.to_string()),
            ..Default::default()
        }
    }

    fn get(params: &[(&str, &str)]) -> GatewayRequest {
        GatewayRequest {
            http_method: Some("GET".to_owned()),
            query_string_parameters: Some(
                params
                    .iter()
                    .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    fn response_body(response: &GatewayResponse) -> Value {
        let body: Value = serde_json::from_str(&response.body).unwrap();
        body["response"].clone()
    }

    fn is_paste_id(id: &str) -> bool {
        id.len() == 6 && id.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
    }

    #[tokio::test]
    async fn submit_then_retrieve_round_trips() {
        let storage = CountingStorage::default();
        let app = app(&storage);

        let submitted = submit(
            &app,
            &post(json!({"paste": "hello", "creator_gh_user": "alice", "recipient_gh_username": "bob"})),
        )
        .await;
        assert_eq!(submitted.status_code, 200);
        let submitted = response_body(&submitted);
        let id = submitted["id"].as_str().unwrap().to_owned();
        assert!(is_paste_id(&id));
        assert_eq!(submitted["paste"], "hello");
        assert!(submitted["timestamp"].is_string());
        assert!(submitted["joke"].is_string());

        let retrieved = retrieve(&app, &get(&[("id", id.as_str())])).await;
        assert_eq!(retrieved.status_code, 200);
        let retrieved = response_body(&retrieved);
        assert_eq!(retrieved["id"], id.as_str());
        assert_eq!(retrieved["paste"], "hello");
        assert_eq!(retrieved["creator_gh_user"], "alice");
        assert_eq!(retrieved["recipient_gh_username"], "bob");
        assert!(retrieved.get("timestamp").is_none());
    }

    #[tokio::test]
    async fn submission_echoes_raw_body() {
        let storage = CountingStorage::default();
        let raw = r#"{"paste":"x","creator_gh_user":"u1","recipient_gh_username":"u2"}"#;
        let request = GatewayRequest {
            body: Some(raw.to_owned()),
            ..Default::default()
        };

        let response = submit(&app(&storage), &request).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response_body(&response)["raw_data"], raw);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_without_writing() {
        let full = json!({"paste": "x", "creator_gh_user": "u1", "recipient_gh_username": "u2"});

        for missing in REQUIRED_FIELDS {
            let storage = CountingStorage::default();
            let mut body = full.clone();
            body.as_object_mut().unwrap().remove(missing);

            let response = submit(&app(&storage), &post(body)).await;

            assert_eq!(response.status_code, 400, "without {missing}");
            assert_eq!(response_body(&response)["message"], MISSING_FIELDS);
            assert_eq!(storage.writes(), 0);
        }
    }

    #[tokio::test]
    async fn non_object_body_is_missing_fields() {
        let storage = CountingStorage::default();

        let response = submit(&app(&storage), &post(json!(["paste"]))).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(storage.writes(), 0);
    }

    #[tokio::test]
    async fn malformed_json_is_an_opaque_internal_error() {
        let storage = CountingStorage::default();
        let request = GatewayRequest {
            body: Some("{not json".to_owned()),
            ..Default::default()
        };

        let response = submit(&app(&storage), &request).await;

        assert_eq!(response.status_code, 500);
        let body = response_body(&response);
        assert_eq!(body["error"], "malformed_request");
        assert_eq!(body["message"], "Internal server error");
        assert_eq!(storage.writes(), 0);
    }

    #[tokio::test]
    async fn missing_body_is_an_internal_error() {
        let storage = CountingStorage::default();

        let response = submit(&app(&storage), &GatewayRequest::default()).await;

        assert_eq!(response.status_code, 500);
    }

    #[tokio::test]
    async fn failed_write_is_reported() {
        let storage = CountingStorage {
            fail_writes: true,
            ..Default::default()
        };

        let response = submit(
            &app(&storage),
            &post(json!({"paste": "x", "creator_gh_user": "u1", "recipient_gh_username": "u2"})),
        )
        .await;

        assert_eq!(response.status_code, 500);
        assert_eq!(response_body(&response)["error"], "storage_error");
        assert_eq!(storage.writes(), 1);
    }

    #[tokio::test]
    async fn unconfigured_store_fails_both_handlers() {
        let storage = CountingStorage {
            unconfigured: true,
            ..Default::default()
        };
        let app = app(&storage);

        let submitted = submit(
            &app,
            &post(json!({"paste": "x", "creator_gh_user": "u1", "recipient_gh_username": "u2"})),
        )
        .await;
        let retrieved = retrieve(&app, &get(&[("id", "abcdef")])).await;

        for response in [submitted, retrieved] {
            assert_eq!(response.status_code, 500);
            assert_eq!(response_body(&response)["error"], "misconfiguration");
        }
        assert_eq!(storage.reads() + storage.writes(), 0);
    }

    #[tokio::test]
    async fn oversized_paste_is_rejected() {
        let storage = CountingStorage::default();
        let mut app = app(&storage);
        app.config.limits.max_paste_size = 4;

        let response = submit(
            &app,
            &post(json!({"paste": "too long", "creator_gh_user": "u1", "recipient_gh_username": "u2"})),
        )
        .await;

        assert_eq!(response.status_code, 413);
        assert_eq!(response_body(&response)["message"], TOO_LARGE);
        assert_eq!(storage.writes(), 0);
    }

    #[tokio::test]
    async fn quotes_are_doubled_in_storage_only() {
        let storage = CountingStorage::default();
        let app = app(&storage);

        let submitted = submit(
            &app,
            &post(json!({"paste": "it's", "creator_gh_user": "u1", "recipient_gh_username": "u2"})),
        )
        .await;
        let submitted = response_body(&submitted);
        assert_eq!(submitted["paste"], "it's");

        let id = submitted["id"].as_str().unwrap();
        let stored = storage.inner.get_record(id).await.unwrap().unwrap();
        assert_eq!(stored.paste, "it''s");
    }

    #[tokio::test]
    async fn non_string_fields_are_stringified() {
        let storage = CountingStorage::default();

        let response = submit(
            &app(&storage),
            &post(json!({"paste": 42, "creator_gh_user": "u1", "recipient_gh_username": "u2"})),
        )
        .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response_body(&response)["paste"], "42");
    }

    #[tokio::test]
    async fn bad_query_shapes_are_rejected_without_lookup() {
        let storage = CountingStorage::default();
        let app = app(&storage);

        let shapes: [&[(&str, &str)]; 3] = [
            &[],
            &[("key", "abcdef")],
            &[("id", "abcdef"), ("extra", "1")],
        ];
        for params in shapes {
            let response = retrieve(&app, &get(params)).await;
            assert_eq!(response.status_code, 400, "{params:?}");
            assert_eq!(response_body(&response)["message"], BAD_PARAMETER);
        }

        let response = retrieve(&app, &GatewayRequest::default()).await;
        assert_eq!(response.status_code, 400);

        assert_eq!(storage.reads(), 0);
    }

    #[tokio::test]
    async fn id_parameter_is_case_insensitive() {
        let storage = CountingStorage::default();
        let app = app(&storage);
        let record = PasteRecord::new("x", "u1", "u2");
        storage.inner.put_record(&record).await.unwrap();

        let response = retrieve(&app, &get(&[("ID", record.id.as_str())])).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response_body(&response)["paste"], "x");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let storage = CountingStorage::default();

        let response = retrieve(&app(&storage), &get(&[("id", "ffffff")])).await;

        assert_eq!(response.status_code, 400);
        let body = response_body(&response);
        assert_eq!(body["message"], NOT_RETRIEVED);
        assert_eq!(body["id"], "Not Found");
        assert!(body["joke"].is_string());
        assert_eq!(storage.reads(), 1);
    }

    #[tokio::test]
    async fn handle_routes_on_method() {
        let storage = CountingStorage::default();
        let app = app(&storage);

        let options = GatewayRequest {
            http_method: Some("OPTIONS".to_owned()),
            ..Default::default()
        };
        assert_eq!(handle(&app, &options).await.status_code, 200);

        let delete = GatewayRequest {
            http_method: Some("DELETE".to_owned()),
            ..Default::default()
        };
        assert_eq!(handle(&app, &delete).await.status_code, 405);

        let mut lowercase_post =
            post(json!({"paste": "x", "creator_gh_user": "u1", "recipient_gh_username": "u2"}));
        lowercase_post.http_method = Some("post".to_owned());
        assert_eq!(handle(&app, &lowercase_post).await.status_code, 200);
        assert_eq!(storage.writes(), 1);
    }

    #[tokio::test]
    async fn banter_can_be_disabled() {
        let storage = CountingStorage::default();
        let mut app = app(&storage);
        app.config.banter = false;

        let response = retrieve(&app, &get(&[("id", "ffffff")])).await;

        assert!(response_body(&response).get("joke").is_none());
    }
}
