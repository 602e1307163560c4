//! HTTP listener and worker pool.
//!
//! A single `tiny_http` listener is shared by `workers` threads, each of
//! which pulls one request at a time and runs it to completion. Requests to
//! the configured endpoint go to [`Intake::handle`] regardless of method, so
//! a `GET` gets the "invalid access" page rather than a 404.

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use contact_intake_core::FormFields;
use contact_intake_core::Intake;
use contact_intake_core::IntakeRequest;
use contact_intake_core::IntakeResponse;
use contact_intake_core::error::GENERIC_FAILURE_MESSAGE;
use contact_intake_core::handler::CONTENT_TYPE_HTML;
use contact_intake_core::handler::CONTENT_TYPE_TEXT;
use thiserror::Error;
use tiny_http::Header;
use tiny_http::Method;
use tiny_http::Request;
use tiny_http::Response;
use tiny_http::Server;
use tiny_http::StatusCode;

use crate::config::ServerConfig;
use crate::form::Body;
use crate::form::decode_form;
use crate::form::read_body;

pub const HEALTH_PATH: &str = "/healthz";

const RECV_BACKOFF_INITIAL: Duration = Duration::from_millis(10);
const RECV_BACKOFF_MAX: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {message}")]
    Bind { addr: String, message: String },

    #[error("listener on {0} has no IP address")]
    NoIpAddress(String),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

struct Router {
    intake: Intake,
    endpoint: String,
    max_body_bytes: usize,
}

/// Running server. Dropping it leaves the workers running; call
/// [`IntakeServer::shutdown`] or [`IntakeServer::wait`].
pub struct IntakeServer {
    server: Arc<Server>,
    workers: Vec<JoinHandle<()>>,
    stopping: Arc<AtomicBool>,
    local_addr: SocketAddr,
}

impl IntakeServer {
    /// Bind and start the worker pool.
    pub fn start(config: &ServerConfig, intake: Intake) -> Result<Self, ServeError> {
        let server = Server::http(config.bind.as_str()).map_err(|err| ServeError::Bind {
            addr: config.bind.clone(),
            message: err.to_string(),
        })?;
        let local_addr = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| ServeError::NoIpAddress(config.bind.clone()))?;

        let server = Arc::new(server);
        let stopping = Arc::new(AtomicBool::new(false));
        let router = Arc::new(Router {
            intake,
            endpoint: config.endpoint.clone(),
            max_body_bytes: config.max_body_bytes,
        });

        let mut workers = Vec::with_capacity(config.workers);
        for id in 0..config.workers {
            let server = Arc::clone(&server);
            let stopping = Arc::clone(&stopping);
            let router = Arc::clone(&router);
            let handle = thread::Builder::new()
                .name(format!("intake-worker-{id}"))
                .spawn(move || worker_loop(&server, &stopping, &router))?;
            workers.push(handle);
        }

        tracing::info!(
            "listening on http://{local_addr}{} with {} workers",
            config.endpoint,
            config.workers
        );
        Ok(Self {
            server,
            workers,
            stopping,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, let in-flight requests finish, join every worker.
    pub fn shutdown(self) {
        self.stopping.store(true, Ordering::SeqCst);
        for _ in &self.workers {
            self.server.unblock();
        }
        self.wait();
    }

    /// Block until every worker exits.
    pub fn wait(self) {
        for worker in self.workers {
            if worker.join().is_err() {
                tracing::error!("intake worker panicked");
            }
        }
    }
}

fn worker_loop(server: &Server, stopping: &AtomicBool, router: &Router) {
    let mut backoff = RECV_BACKOFF_INITIAL;
    loop {
        match server.recv() {
            Ok(request) => {
                backoff = RECV_BACKOFF_INITIAL;
                route(router, request);
            }
            Err(err) => {
                if stopping.load(Ordering::SeqCst) {
                    break;
                }
                tracing::warn!("failed to receive request, retrying in {backoff:?}: {err}");
                thread::sleep(backoff);
                backoff = next_backoff(backoff);
            }
        }
    }
}

fn next_backoff(current: Duration) -> Duration {
    current.saturating_mul(2).min(RECV_BACKOFF_MAX)
}

fn route(router: &Router, mut request: Request) {
    let path = request.url().split('?').next().unwrap_or_default().to_string();

    let response = if path == router.endpoint {
        handle_intake(router, &mut request)
    } else if path == HEALTH_PATH && *request.method() == Method::Get {
        plain(200, "ok")
    } else {
        plain(404, "not found")
    };

    let status = response.status;
    let method = request.method().to_string();
    if let Err(err) = request.respond(into_http(response)) {
        tracing::warn!("failed to send response: {err}");
    }
    tracing::debug!("{method} {path} -> {status}");
}

fn handle_intake(router: &Router, request: &mut Request) -> IntakeResponse {
    // Only a POST body is worth reading; any other method is rejected on
    // the method alone.
    let fields = if *request.method() == Method::Post {
        match read_body(request.as_reader(), router.max_body_bytes) {
            Ok(Body::Complete(body)) => decode_form(&body),
            Ok(Body::TooLarge) => {
                tracing::info!("request body exceeds {} bytes", router.max_body_bytes);
                return generic_failure(router, 413);
            }
            Err(err) => {
                tracing::warn!("failed to read request body: {err}");
                return generic_failure(router, 400);
            }
        }
    } else {
        FormFields::new()
    };

    let intake_request = IntakeRequest {
        method: request.method().to_string(),
        fields,
        remote_addr: request.remote_addr().map(|addr| addr.ip().to_string()),
        user_agent: header_value(request, "User-Agent"),
    };
    router.intake.handle(&intake_request)
}

fn generic_failure(router: &Router, status: u16) -> IntakeResponse {
    match router.intake.pages().render_error(GENERIC_FAILURE_MESSAGE) {
        Ok(body) => IntakeResponse {
            status,
            content_type: CONTENT_TYPE_HTML,
            body,
        },
        Err(err) => {
            tracing::error!("failed to render page: {err}");
            plain(500, "internal server error")
        }
    }
}

fn header_value(request: &Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.equiv(name))
        .map(|header| header.value.as_str().to_string())
}

fn plain(status: u16, body: &str) -> IntakeResponse {
    IntakeResponse {
        status,
        content_type: CONTENT_TYPE_TEXT,
        body: body.to_string(),
    }
}

fn into_http(response: IntakeResponse) -> Response<Cursor<Vec<u8>>> {
    let mut headers = Vec::with_capacity(1);
    match Header::from_bytes(&b"Content-Type"[..], response.content_type.as_bytes()) {
        Ok(header) => headers.push(header),
        Err(()) => tracing::warn!("invalid content type {}", response.content_type),
    }
    let data = response.body.into_bytes();
    let len = data.len();
    Response::new(StatusCode(response.status), headers, Cursor::new(data), Some(len), None)
}
