//! Small in-process HTTP server used by the pipeline tests. Pages are scripted
//! per path; gated pages hold their response until permits are released so
//! tests can pin requests at a deterministic point.

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinHandle;

#[derive(Clone)]
enum Page {
    Body(String),
    Status(u16),
    Gated(String),
}

struct SiteState {
    pages: RwLock<HashMap<String, Page>>,
    gate: Semaphore,
    held: AtomicUsize,
}

pub struct MockSite {
    addr: SocketAddr,
    state: Arc<SiteState>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MockSite {
    /// Binds to an ephemeral localhost port and starts serving. Must be
    /// called from within a tokio runtime.
    pub fn start() -> Self {
        let state = Arc::new(SiteState {
            pages: RwLock::new(HashMap::new()),
            gate: Semaphore::new(0),
            held: AtomicUsize::new(0),
        });

        let service_state = state.clone();
        let make_svc = make_service_fn(move |_conn| {
            let state = service_state.clone();
            async move { Ok::<_, Infallible>(service_fn(move |req| handle(state.clone(), req))) }
        });

        let bind_addr: SocketAddr = ([127, 0, 0, 1], 0).into();
        let server = Server::bind(&bind_addr).serve(make_svc);
        let addr = server.local_addr();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let graceful = server.with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        let handle = tokio::spawn(async move {
            if let Err(err) = graceful.await {
                eprintln!("mock site server error: {err}");
            }
        });

        Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn set_body(&self, path: &str, body: impl Into<String>) {
        self.set_page(path, Page::Body(body.into()));
    }

    pub fn set_status(&self, path: &str, code: u16) {
        self.set_page(path, Page::Status(code));
    }

    /// Scripts a page whose response is held at the gate until [`Self::release`].
    pub fn set_gated(&self, path: &str, body: impl Into<String>) {
        self.set_page(path, Page::Gated(body.into()));
    }

    fn set_page(&self, path: &str, page: Page) {
        self.state
            .pages
            .write()
            .expect("pages lock poisoned")
            .insert(path.to_owned(), page);
    }

    /// Lets `permits` gated requests through.
    pub fn release(&self, permits: usize) {
        self.state.gate.add_permits(permits);
    }

    /// Number of requests currently held at the gate.
    pub fn held(&self) -> usize {
        self.state.held.load(Ordering::SeqCst)
    }

    pub async fn shutdown(mut self) {
        // Unstick anything still held so graceful shutdown can finish.
        self.state.gate.add_permits(Semaphore::MAX_PERMITS / 2);
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

async fn handle(state: Arc<SiteState>, req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let path = req.uri().path().to_owned();
    let page = state
        .pages
        .read()
        .expect("pages lock poisoned")
        .get(&path)
        .cloned();

    let response = match page {
        Some(Page::Body(body)) => Response::new(Body::from(body)),
        Some(Page::Status(code)) => {
            let status = StatusCode::from_u16(code).expect("valid status code");
            Response::builder()
                .status(status)
                .body(Body::empty())
                .expect("valid response")
        }
        Some(Page::Gated(body)) => {
            state.held.fetch_add(1, Ordering::SeqCst);
            let permit = state.gate.acquire().await.expect("gate semaphore closed");
            permit.forget();
            state.held.fetch_sub(1, Ordering::SeqCst);
            Response::new(Body::from(body))
        }
        None => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::empty())
            .expect("valid response"),
    };

    Ok(response)
}
