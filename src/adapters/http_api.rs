//! HTTP API dispatcher over the [`TelemetryStore`].
//!
//! **Transport-decoupled**: [`handle`] takes `(method, path, query, body)`
//! and returns status + JSON body.  On ESP-IDF, [`start_server`] binds each
//! route on `EspHttpServer` and forwards to the same dispatcher; on host the
//! dispatcher is called directly.
//!
//! | Method | Path           | Body                                   |
//! |--------|----------------|----------------------------------------|
//! | GET    | `/api/sensor`  | current snapshot                       |
//! | GET    | `/api/status`  | snapshot + sample health               |
//! | GET    | `/api/buzzer`  | sounder state                          |
//! | GET    | `/api/config`  | live thresholds / interval / alarm     |
//! | POST   | `/api/config`  | partial update, 400 when invalid       |
//! | GET    | `/api/history` | `?limit=&offset=`, oldest first        |

use log::{debug, warn};
use serde::Serialize;

use super::telemetry::{ConfigUpdate, TelemetryStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Sensor,
    Status,
    Buzzer,
    Config,
    History,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::Sensor,
        Route::Status,
        Route::Buzzer,
        Route::Config,
        Route::History,
    ];

    pub fn parse(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "/api/sensor" => Some(Self::Sensor),
            "/api/status" => Some(Self::Status),
            "/api/buzzer" => Some(Self::Buzzer),
            "/api/config" => Some(Self::Config),
            "/api/history" => Some(Self::History),
            _ => None,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Sensor => "/api/sensor",
            Self::Status => "/api/status",
            Self::Buzzer => "/api/buzzer",
            Self::Config => "/api/config",
            Self::History => "/api/history",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiResponse {
    fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status: 200, body },
            Err(_) => Self::error(500, "serialization failed"),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        let body = serde_json::to_string(&ErrorBody { error: message })
            .unwrap_or_else(|_| String::from("{}"));
        Self { status, body }
    }
}

/// Pagination parameters from a query string.  Unparseable values fall
/// back to the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl HistoryQuery {
    pub fn parse(query: Option<&str>) -> Self {
        let mut q = Self::default();
        for pair in query.unwrap_or("").split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "offset" => q.offset = value.parse().unwrap_or(0),
                "limit" => q.limit = value.parse().ok(),
                _ => {}
            }
        }
        q
    }
}

/// Dispatch one request.
pub fn handle(
    store: &TelemetryStore,
    method: Method,
    path: &str,
    query: Option<&str>,
    body: &[u8],
) -> ApiResponse {
    debug!("HTTP | {:?} {} {:?}", method, path, query);
    let Some(route) = Route::parse(path) else {
        return ApiResponse::error(404, "not found");
    };

    match (method, route) {
        (Method::Get, Route::Sensor) => ApiResponse::json(&store.snapshot()),
        (Method::Get, Route::Status) => ApiResponse::json(&store.status()),
        (Method::Get, Route::Buzzer) => ApiResponse::json(&store.alarm()),
        (Method::Get, Route::Config) => ApiResponse::json(&store.config()),
        (Method::Post, Route::Config) => post_config(store, body),
        (Method::Get, Route::History) => {
            let q = HistoryQuery::parse(query);
            ApiResponse::json(&store.history(q.offset, q.limit))
        }
        _ => ApiResponse::error(404, "not found"),
    }
}

fn post_config(store: &TelemetryStore, body: &[u8]) -> ApiResponse {
    let update: ConfigUpdate = match serde_json::from_slice(body) {
        Ok(u) => u,
        Err(_) => {
            warn!("HTTP | config update rejected: malformed JSON");
            return ApiResponse::error(400, "malformed JSON");
        }
    };
    match store.update_config(update) {
        Ok(view) => ApiResponse::json(&view),
        Err(e) => ApiResponse::error(400, &e.to_string()),
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF binding
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
const MAX_BODY: usize = 512;

/// Bind every route on an `EspHttpServer`.  The server stops when the
/// returned handle is dropped.
#[cfg(target_os = "espidf")]
pub fn start_server(
    store: std::sync::Arc<TelemetryStore>,
) -> Result<esp_idf_svc::http::server::EspHttpServer<'static>, crate::error::InitError> {
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::io::{Read, Write};

    use crate::error::{InitError, ResourceKind};

    let err = |e| {
        log::error!("HTTP server setup failed: {:?}", e);
        InitError::ResourceAllocationFailed(ResourceKind::Task)
    };

    let mut server = EspHttpServer::new(&Configuration::default()).map_err(err)?;

    for route in Route::ALL {
        let methods: &[(esp_idf_svc::http::Method, Method)] = if route == Route::Config {
            &[
                (esp_idf_svc::http::Method::Get, Method::Get),
                (esp_idf_svc::http::Method::Post, Method::Post),
            ]
        } else {
            &[(esp_idf_svc::http::Method::Get, Method::Get)]
        };

        for &(svc_method, method) in methods {
            let store = std::sync::Arc::clone(&store);
            server
                .fn_handler::<esp_idf_svc::io::EspIOError, _>(
                    route.path(),
                    svc_method,
                    move |mut req| {
                        let mut buf = [0u8; MAX_BODY];
                        let mut len = 0;
                        if method == Method::Post {
                            while len < buf.len() {
                                let n = req.read(&mut buf[len..])?;
                                if n == 0 {
                                    break;
                                }
                                len += n;
                            }
                        }
                        let uri = req.uri().to_owned();
                        let (path, query) = match uri.split_once('?') {
                            Some((p, q)) => (p, Some(q)),
                            None => (uri.as_str(), None),
                        };
                        let resp = handle(&store, method, path, query, &buf[..len]);
                        let mut out = req.into_response(
                            resp.status,
                            None,
                            &[("Content-Type", "application/json")],
                        )?;
                        out.write_all(resp.body.as_bytes())?;
                        Ok(())
                    },
                )
                .map_err(err)?;
        }
    }

    log::info!("HTTP API listening ({} routes)", Route::ALL.len());
    Ok(server)
}
