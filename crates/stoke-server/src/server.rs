//! Development server implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, Method, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use console::{style, Term};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::compiler::{BuildContext, BuildMode, Compiler};
use crate::livereload::{reload_client_script, ReloadHub, ReloadMessage};
use crate::proxy::{should_proxy, ProxyRules};
use crate::watcher::FileWatcher;

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Directory containing static assets
    pub public_dir: PathBuf,

    /// Application entry module
    pub entry: PathBuf,

    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Backend to forward API requests to, if declared
    pub proxy: Option<ProxyRules>,

    /// URL shown to (and opened for) the user
    pub pretty_url: String,

    /// Open browser on start
    pub open: bool,

    /// Whether stdout is a terminal; governs screen clearing
    pub interactive: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            public_dir: PathBuf::from("public"),
            entry: PathBuf::from("src/index.js"),
            host: "0.0.0.0".to_string(),
            port: 3000,
            proxy: None,
            pretty_url: "http://localhost:3000/".to_string(),
            open: false,
            interactive: false,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("File watch error: {0}")]
    Watch(String),

    #[error("Server error: {0}")]
    Serve(String),
}

/// Shared server state.
struct ServerState {
    config: DevServerConfig,
    hub: ReloadHub,
    client: Client<HttpConnector, Body>,
}

/// Development server.
pub struct DevServer {
    compiler: Arc<Compiler>,
    config: DevServerConfig,
}

impl DevServer {
    /// Create a new development server.
    pub fn new(compiler: Arc<Compiler>, config: DevServerConfig) -> Self {
        Self { compiler, config }
    }

    fn build_context(&self) -> BuildContext {
        BuildContext {
            public_dir: self.config.public_dir.clone(),
            entry: self.config.entry.clone(),
            mode: BuildMode::Development,
            output_dir: None,
        }
    }

    /// Bind and serve until the process is terminated.
    ///
    /// A failed bind is logged and the server simply does not start; the
    /// flow stops advancing without crashing.
    pub async fn start(self) -> Result<(), ServerError> {
        let listener =
            match TcpListener::bind((self.config.host.as_str(), self.config.port)).await {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::error!(
                        host = %self.config.host,
                        port = self.config.port,
                        error = %e,
                        "Failed to bind development server"
                    );
                    return Ok(());
                }
            };

        let hub = ReloadHub::new();
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let state = Arc::new(ServerState {
            config: self.config.clone(),
            hub: hub.clone(),
            client,
        });

        // Watch assets and sources, recompiling and reloading on change
        let src_dir = self.config.entry.parent().map(Path::to_path_buf);
        let watch_paths: Vec<PathBuf> = [Some(self.config.public_dir.clone()), src_dir.clone()]
            .into_iter()
            .flatten()
            .collect();
        let (watcher, mut rx) =
            FileWatcher::new(&watch_paths).map_err(|e| ServerError::Watch(e.to_string()))?;

        let compiler = Arc::clone(&self.compiler);
        let rebuild_ctx = self.build_context();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                tracing::debug!(path = %event.path().display(), "file changed");
                match compiler.compile(rebuild_ctx.clone()).await {
                    Ok(_) => hub.send(ReloadMessage::Reload),
                    Err(e) => hub.send(ReloadMessage::BuildFailed {
                        message: e.to_string(),
                    }),
                }
            }
            drop(watcher);
        });

        let mut app = Router::new()
            .route("/", get(index_handler))
            .route("/__livereload", get(ws_handler))
            .route("/__livereload.js", get(reload_script_handler));

        if let Some(src_dir) = src_dir {
            app = app.nest_service("/src", ServeDir::new(src_dir));
        }

        let app = app.fallback(static_or_proxy_handler).with_state(state);

        if self.config.interactive {
            let _ = Term::stdout().clear_screen();
        }
        println!("{}", style("Starting the development server...").cyan());
        println!();

        if self.config.open {
            open_browser(&self.config.pretty_url);
        }

        // First compile; subscribers hear about it once it finishes
        let compiler = Arc::clone(&self.compiler);
        let ctx = self.build_context();
        tokio::spawn(async move {
            let _ = compiler.compile(ctx).await;
        });

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        Ok(())
    }
}

/// Open the default browser unless `BROWSER=none` asks us not to.
fn open_browser(url: &str) {
    if std::env::var("BROWSER").as_deref() == Ok("none") {
        return;
    }
    if let Err(e) = open::that(url) {
        tracing::debug!(error = %e, "Failed to open browser");
    }
}

/// Handler for the app shell.
async fn index_handler(State(state): State<Arc<ServerState>>) -> Response {
    render_index(&state.config.public_dir).await
}

async fn render_index(public_dir: &Path) -> Response {
    let index_path = public_dir.join("index.html");
    match tokio::fs::read_to_string(&index_path).await {
        Ok(html) => Html(inject_reload_script(&html)).into_response(),
        Err(e) => {
            tracing::warn!(
                path = %index_path.display(),
                error = %e,
                "Failed to read index.html"
            );
            (StatusCode::NOT_FOUND, "index.html not found").into_response()
        }
    }
}

/// Insert the live-reload client script before `</body>`.
fn inject_reload_script(html: &str) -> String {
    let tag = r#"<script src="/__livereload.js"></script>"#;
    match html.rfind("</body>") {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..pos]);
            out.push_str(tag);
            out.push_str(&html[pos..]);
            out
        }
        None => format!("{html}{tag}"),
    }
}

/// Handler for the live-reload WebSocket endpoint.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut rx = state.hub.subscribe();

    let Ok(greeting) = serde_json::to_string(&ReloadMessage::Connected) else {
        return;
    };
    if socket.send(Message::Text(greeting.into())).await.is_err() {
        return;
    }

    while let Ok(msg) = rx.recv().await {
        let Ok(json) = serde_json::to_string(&msg) else {
            continue;
        };
        if socket.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
}

/// Handler for the live-reload client script.
async fn reload_script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        reload_client_script(),
    )
}

/// Fallback: static assets first, then the proxy backend, then the app
/// shell for HTML navigation (history API fallback).
async fn static_or_proxy_handler(
    State(state): State<Arc<ServerState>>,
    mut req: Request<Body>,
) -> Response {
    // ServeDir percent-decodes the path and refuses traversal; a miss comes
    // back as 404 and falls through to the proxy or the app shell.
    if *req.method() == Method::GET || *req.method() == Method::HEAD {
        let (parts, body) = req.into_parts();
        let probe = head_only_request(&parts);
        let served = ServeDir::new(&state.config.public_dir).oneshot(probe).await;
        req = Request::from_parts(parts, body);

        match served {
            Ok(res) if res.status() != StatusCode::NOT_FOUND => return res.into_response(),
            Ok(_) => {}
            Err(infallible) => match infallible {},
        }
    }

    let accept = req
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok());
    let wants_html =
        *req.method() == Method::GET && accept.map_or(false, |a| a.contains("text/html"));
    let proxyable = state.config.proxy.is_some() && should_proxy(req.method(), accept);

    if proxyable {
        if let Some(rules) = &state.config.proxy {
            return forward(&state.client, rules, req).await;
        }
    }

    if wants_html {
        return render_index(&state.config.public_dir).await;
    }

    StatusCode::NOT_FOUND.into_response()
}

/// GET/HEAD bodies are irrelevant to static serving; rebuild just the
/// request head for the probe.
fn head_only_request(parts: &axum::http::request::Parts) -> Request<Body> {
    let mut probe = Request::new(Body::empty());
    *probe.method_mut() = parts.method.clone();
    *probe.uri_mut() = parts.uri.clone();
    *probe.headers_mut() = parts.headers.clone();
    probe
}

/// Forward a request to the proxy backend.
async fn forward(
    client: &Client<HttpConnector, Body>,
    rules: &ProxyRules,
    req: Request<Body>,
) -> Response {
    let (mut parts, body) = req.into_parts();
    let origin = parts.uri.clone();
    parts.uri = rules.rewrite(&origin);
    // The backend should see its own authority, not ours
    parts.headers.remove(header::HOST);
    let upstream = Request::from_parts(parts, body);

    match client.request(upstream).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                target = %rules.describe(),
                "Proxy request failed"
            );
            (
                StatusCode::BAD_GATEWAY,
                format!(
                    "Proxy error: could not proxy request {} to {}.",
                    origin.path(),
                    rules.describe()
                ),
            )
                .into_response()
        }
    }
}
