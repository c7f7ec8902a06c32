#![allow(dead_code)]

use bundlesync::{BundleError, BundleMetadata, Notifier};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;
use std::sync::{Arc, Mutex, Once};
use std::thread;
use tiny_http::{Header, Response, Server};
use walkdir::WalkDir;
use zip::write::FileOptions;

pub const LAST_MODIFIED: &str = "Wed, 21 Oct 2015 07:28:00 GMT";
pub const LAST_MODIFIED_MS: i64 = 1_445_412_480_000;

static INIT_LOGGING: Once = Once::new();

/// `RUST_LOG=bundlesync=debug cargo test` shows library logs.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        }
    });
}

#[derive(Clone)]
struct Route {
    status: u16,
    body: Vec<u8>,
    last_modified: Option<String>,
}

/// Minimal release host: fixed routes, request log.
pub struct FeedServer {
    server: Arc<Server>,
    base: String,
    routes: Arc<Mutex<HashMap<String, Route>>>,
    hits: Arc<Mutex<Vec<String>>>,
}

impl FeedServer {
    pub fn start() -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("bind test server"));
        let addr = server.server_addr().to_ip().expect("ip listener");
        let routes: Arc<Mutex<HashMap<String, Route>>> = Arc::default();
        let hits: Arc<Mutex<Vec<String>>> = Arc::default();

        let (srv, r, h) = (server.clone(), routes.clone(), hits.clone());
        thread::spawn(move || {
            for req in srv.incoming_requests() {
                let path = req.url().to_string();
                h.lock().unwrap().push(format!("{} {}", req.method(), path));
                let route = r.lock().unwrap().get(&path).cloned();
                let _ = match route {
                    Some(route) => {
                        let mut resp =
                            Response::from_data(route.body).with_status_code(route.status);
                        if let Some(lm) = route.last_modified {
                            resp.add_header(
                                Header::from_bytes(&b"Last-Modified"[..], lm.as_bytes()).unwrap(),
                            );
                        }
                        req.respond(resp)
                    }
                    None => req.respond(Response::empty(404)),
                };
            }
        });

        Self {
            server,
            base: format!("http://{addr}/"),
            routes,
            hits,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path.trim_start_matches('/'))
    }

    pub fn route(&self, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.insert(path, status, body.into(), None);
    }

    pub fn route_with_date(&self, path: &str, body: impl Into<Vec<u8>>, date: &str) {
        self.insert(path, 200, body.into(), Some(date.to_string()));
    }

    fn insert(&self, path: &str, status: u16, body: Vec<u8>, last_modified: Option<String>) {
        self.routes.lock().unwrap().insert(
            format!("/{}", path.trim_start_matches('/')),
            Route {
                status,
                body,
                last_modified,
            },
        );
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    pub fn clear_hits(&self) {
        self.hits.lock().unwrap().clear();
    }
}

impl Drop for FeedServer {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

/// Zip with the given `(name, bytes)` entries.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zw = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in entries {
        zw.start_file(*name, FileOptions::default().unix_permissions(0o755))
            .unwrap();
        zw.write_all(data).unwrap();
    }
    zw.finish().unwrap().into_inner()
}

pub fn exe_name() -> String {
    format!("tool{}", bundlesync_platform::exe_extension())
}

/// Lay down an installed bundle by hand.
pub fn preinstall(root: &Path, meta: &BundleMetadata, exe: &[u8]) {
    let dir = root.join("tool-pkg");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(exe_name()), exe).unwrap();
    fs::write(dir.join("metadata.json"), serde_json::to_vec(meta).unwrap()).unwrap();
}

/// Sorted `(relative path, contents)` of every file under `dir`.
pub fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    if !dir.exists() {
        return Vec::new();
    }
    let mut out: Vec<(String, Vec<u8>)> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(dir).unwrap().display().to_string();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect();
    out.sort();
    out
}

/// Notifier that appends a short tag per event.
pub struct Recorder(pub Rc<RefCell<Vec<String>>>);

impl Recorder {
    pub fn new() -> (Self, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        (Self(log.clone()), log)
    }
}

impl Notifier for Recorder {
    fn busy_changed(&mut self, busy: bool) {
        self.0.borrow_mut().push(format!("busy:{busy}"));
    }
    fn io_error(&mut self, error: &BundleError) {
        self.0.borrow_mut().push(format!("error:{:?}", error.kind()));
    }
    fn metadata_downloaded(&mut self, metadata: &BundleMetadata) {
        self.0.borrow_mut().push(format!("metadata:{}", metadata.version));
    }
    fn update_available(&mut self, metadata: &BundleMetadata) {
        self.0.borrow_mut().push(format!("available:{}", metadata.version));
    }
    fn up_to_date(&mut self) {
        self.0.borrow_mut().push("up-to-date".into());
    }
    fn unpacked(&mut self) {
        self.0.borrow_mut().push("unpacked".into());
    }
    fn canceled(&mut self) {
        self.0.borrow_mut().push("canceled".into());
    }
}
