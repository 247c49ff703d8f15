//! In-process mock S3 endpoint for CORS and object PUT traffic.
//!
//! Stores the CORS document exactly as the SDK serialized it and echoes it
//! back on reads, so round-trip assertions see the same XML the SDK expects.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use axum::body::{to_bytes, Bytes};
use axum::extract::{Request, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::sync::Mutex;

const NO_SUCH_CORS_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<Error><Code>NoSuchCORSConfiguration</Code>\
<Message>The CORS configuration does not exist</Message></Error>";

/// Shared state of the mock endpoint
pub struct MockS3 {
    cors_document: Mutex<Option<Bytes>>,
    /// Number of PutBucketCors requests observed
    pub cors_writes: AtomicUsize,
    /// Number of DeleteBucketCors requests observed
    pub cors_deletes: AtomicUsize,
}

impl MockS3 {
    pub async fn cors_document(&self) -> Option<Bytes> {
        self.cors_document.lock().await.clone()
    }
}

pub struct MockS3Server {
    pub state: Arc<MockS3>,
    pub endpoint: String,
}

pub async fn spawn_mock_s3() -> MockS3Server {
    let state = Arc::new(MockS3 {
        cors_document: Mutex::new(None),
        cors_writes: AtomicUsize::new(0),
        cors_deletes: AtomicUsize::new(0),
    });

    let app = Router::new().fallback(handle).with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock S3 listener");
    let addr = listener.local_addr().expect("mock S3 has no local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock S3 crashed");
    });

    MockS3Server {
        state,
        endpoint: format!("http://{addr}"),
    }
}

async fn handle(State(state): State<Arc<MockS3>>, request: Request) -> Response {
    let method = request.method().clone();
    let is_cors_subresource = request
        .uri()
        .query()
        .unwrap_or("")
        .split('&')
        .any(|param| param == "cors" || param.starts_with("cors="));
    let body = to_bytes(request.into_body(), usize::MAX)
        .await
        .unwrap_or_default();

    if is_cors_subresource {
        match method {
            Method::PUT => {
                *state.cors_document.lock().await = Some(body);
                state.cors_writes.fetch_add(1, Ordering::SeqCst);
                StatusCode::OK.into_response()
            }
            Method::GET => match state.cors_document.lock().await.clone() {
                Some(document) => {
                    ([(header::CONTENT_TYPE, "application/xml")], document).into_response()
                }
                None => (
                    StatusCode::NOT_FOUND,
                    [(header::CONTENT_TYPE, "application/xml")],
                    NO_SUCH_CORS_XML,
                )
                    .into_response(),
            },
            Method::DELETE => {
                *state.cors_document.lock().await = None;
                state.cors_deletes.fetch_add(1, Ordering::SeqCst);
                StatusCode::NO_CONTENT.into_response()
            }
            _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
        }
    } else if method == Method::PUT {
        StatusCode::OK.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// S3 client pointed at the mock endpoint, path-style, with test credentials
pub async fn test_s3_client(endpoint: &str) -> aws_sdk_s3::Client {
    let credentials = Credentials::from_keys("test", "test", None);
    let config = aws_config::defaults(BehaviorVersion::latest())
        .endpoint_url(endpoint)
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .load()
        .await;

    let s3_config: aws_sdk_s3::Config = (&config).into();
    let mut builder = s3_config.to_builder();
    builder.set_force_path_style(Some(true));
    aws_sdk_s3::Client::from_conf(builder.build())
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
