//! HTTP transport
//!
//! Every request carries `action` and `cmd` in its query string and a session
//! cookie. The handler maps it onto [`Terminal::handle`] and returns the JSON
//! payload; there is no routing by path.
//!
//! Protocol:
//! - Input: `GET /?action=exec&cmd=ls%20-la` with `Cookie: webterm_session=<id>`
//! - Output: `application/json`, status 200, or 500 with `{"error": ...}` when
//!   the session store fails

use anyhow::{Context, Result};
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use webterm::{Terminal, validate_session_id};

/// Cookie holding the session id.
pub const SESSION_COOKIE: &str = "webterm_session";

const POWERED_BY: &str = "webterm";

/// Accept connections on `addr` until Ctrl-C.
pub async fn serve(addr: SocketAddr, terminal: Terminal) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    let terminal = Arc::new(terminal);
    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    continue;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                return Ok(());
            }
        };

        let terminal = Arc::clone(&terminal);
        tokio::spawn(async move {
            let service = service_fn(move |req| handle_request(Arc::clone(&terminal), req));
            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                tracing::debug!(peer = %peer, error = %e, "connection closed with error");
            }
        });
    }
}

async fn handle_request(
    terminal: Arc<Terminal>,
    req: Request<Incoming>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let query = parse_query(req.uri().query().unwrap_or(""));
    let (session_id, is_new) = match session_from_headers(req.headers()) {
        Some(id) => (id, false),
        None => (uuid::Uuid::new_v4().to_string(), true),
    };

    let session = terminal.with_session(session_id.as_str());
    let (status, body) = match session.handle(&query.action, &query.cmd).await {
        Ok(value) => (StatusCode::OK, value),
        Err(e) => {
            tracing::error!(
                session = %session_id,
                action = %query.action,
                kind = e.kind(),
                error = %e,
                "request failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": e.to_string() }),
            )
        }
    };

    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert("x-powered-by", HeaderValue::from_static(POWERED_BY));
    if is_new && let Ok(cookie) = HeaderValue::from_str(&session_cookie(&session_id)) {
        headers.insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

/// The `action` and `cmd` query parameters; missing ones are empty.
#[derive(Debug, Default, PartialEq, Eq)]
struct Query {
    action: String,
    cmd: String,
}

fn parse_query(query: &str) -> Query {
    let mut parsed = Query::default();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "action" => parsed.action = value.into_owned(),
            "cmd" => parsed.cmd = value.into_owned(),
            _ => {}
        }
    }
    parsed
}

/// A well-formed session id from the request cookies, if any.
fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|id| validate_session_id(id).is_ok())
}

fn session_cookie(id: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict",
        SESSION_COOKIE, id
    )
}
