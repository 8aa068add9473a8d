//! Test helpers: build AppState and router for integration tests.
//!
//! Each test app gets its own temporary storage root. The classifier is either
//! a [`StubClassifier`] or a real `HttpClassifier` pointed at a mock server.

#![allow(dead_code)]

pub mod fixtures;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use imghost_api::setup::routes;
use imghost_api::state::AppState;
use imghost_core::{Config, ImageHostConfig, ModerationVerdict};
use imghost_moderation::{Classifier, ModerationError};
use imghost_storage::{LocalStorage, ViolationLog};
use tempfile::TempDir;

/// How the stub classifier answers.
#[derive(Debug, Clone)]
pub enum StubOutcome {
    Verdict(ModerationVerdict),
    Unavailable,
    ServiceError,
}

/// Classifier double that returns a fixed outcome and counts calls.
pub struct StubClassifier {
    outcome: StubOutcome,
    calls: AtomicUsize,
    seen_paths: std::sync::Mutex<Vec<PathBuf>>,
}

impl StubClassifier {
    pub fn new(outcome: StubOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
            seen_paths: std::sync::Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_paths(&self) -> Vec<PathBuf> {
        self.seen_paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn classify(&self, file_path: &Path) -> Result<ModerationVerdict, ModerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_paths.lock().unwrap().push(file_path.to_path_buf());
        assert!(file_path.exists(), "classifier must see a staged file");

        match &self.outcome {
            StubOutcome::Verdict(verdict) => Ok(verdict.clone()),
            StubOutcome::Unavailable => Err(ModerationError::ServiceUnavailable(
                "connection refused".to_string(),
            )),
            StubOutcome::ServiceError => Err(ModerationError::ServiceError(
                "classifier reported an error: model not loaded".to_string(),
            )),
        }
    }

    async fn ping(&self) -> Result<(), ModerationError> {
        match &self.outcome {
            StubOutcome::Unavailable => Err(ModerationError::ServiceUnavailable(
                "connection refused".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Test application: server, state, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub config: Config,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn public_files(&self) -> Vec<String> {
        list_files(&self.config.public_path())
    }

    pub fn quarantine_files(&self) -> Vec<String> {
        list_files(&self.config.quarantine_path())
    }

    pub fn staging_files(&self) -> Vec<String> {
        list_files(&self.config.staging_path())
    }

    pub async fn violation_count(&self) -> usize {
        self.state
            .moderation
            .violations
            .entries()
            .await
            .unwrap()
            .len()
    }
}

/// File names in `dir`, sorted.
pub fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Setup a test app with a stub classifier.
pub async fn setup_test_app(classifier: Arc<StubClassifier>) -> TestApp {
    setup_test_app_with(classifier, |_| {}).await
}

/// Setup a test app with any classifier, letting the caller adjust the
/// configuration first.
pub async fn setup_test_app_with(
    classifier: Arc<dyn Classifier>,
    configure: impl FnOnce(&mut ImageHostConfig),
) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let mut inner = ImageHostConfig::for_storage_root(temp_dir.path());
    configure(&mut inner);
    let config = Config::new(inner);
    config.validate().unwrap();

    let storage = LocalStorage::new(
        config.public_path(),
        config.quarantine_path(),
        config.staging_path(),
        config.allowed_extensions().to_vec(),
    )
    .await
    .unwrap();
    let violations = Arc::new(ViolationLog::new(config.violation_log_path()));

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::new(storage),
        classifier,
        violations,
    ));
    let router = routes::setup_routes(&config, state.clone()).unwrap();
    let server = TestServer::new(router).unwrap();

    TestApp {
        server,
        state,
        config,
        _temp_dir: temp_dir,
    }
}

/// Serve the app's router on a localhost socket. Unlike the in-memory
/// transport, real HTTP clients send `Content-Length` on uploads.
pub async fn spawn_socket_server(app: &TestApp) -> SocketAddr {
    let router = routes::setup_routes(&app.config, app.state.clone()).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

/// Multipart form with a single `image` file field.
pub fn image_form(filename: &str, mime_type: &str, data: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        "image",
        Part::bytes(data).file_name(filename).mime_type(mime_type),
    )
}
