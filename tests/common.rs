#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use attsync::config::Config;
use attsync::db::pool::DbPool;
use attsync::device::{Terminal, TerminalSession};
use attsync::errors::{AppError, AppResult};
use attsync::models::RawRecord;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::env;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::rc::Rc;
use std::thread;

pub fn att() -> Command {
    cargo_bin_cmd!("attsync")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_attsync.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Create a temporary output file path inside tempdir and ensure it's removed
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

/// Create a unique fake home directory for CLI tests; config and database
/// land under <home>/.attsync just as they would for a real user.
pub fn setup_test_home(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_attsync_home", name));
    fs::remove_dir_all(&path).ok();
    fs::create_dir_all(&path).expect("create test home");
    path.to_string_lossy().to_string()
}

/// Open a pool on the given path and run all migrations.
pub fn open_test_pool(db_path: &str) -> DbPool {
    let pool = DbPool::new(db_path).expect("open pool");
    attsync::db::initialize::init_db(&pool.conn).expect("init db");
    pool
}

/// Config preset for library-level tests: temp database, no retry sleeps.
pub fn test_config(db_path: &str, api_url: &str, http_retries: u32) -> Config {
    Config {
        database: db_path.to_string(),
        api_url: api_url.to_string(),
        http_retries,
        http_retry_base_ms: 0,
        fetch_retry_delay_ms: 0,
        ..Config::default()
    }
}

/// Write a config file for CLI tests.
pub fn write_config(path: &str, cfg: &Config) {
    let yaml = serde_yaml::to_string(cfg).expect("serialize config");
    fs::write(path, yaml).expect("write config file");
}

// ---------------------------------------------------------------------------
// Scripted in-memory terminal
// ---------------------------------------------------------------------------

/// What the next connection to the fake terminal should do.
#[derive(Clone)]
pub enum FetchScript {
    /// Connection attempt fails outright.
    Fail,
    /// Connection succeeds, reading the log fails.
    ReadError,
    /// Connection succeeds, pausing capture fails, the log still
    /// yields these records.
    DisableError(Vec<RawRecord>),
    /// Connection succeeds and yields these records.
    Records(Vec<RawRecord>),
}

#[derive(Default)]
pub struct FakeState {
    pub connects: Cell<u32>,
    pub disables: Cell<u32>,
    pub enables: Cell<u32>,
    pub closes: Cell<u32>,
    pub clears: Cell<u32>,
    pub script: RefCell<VecDeque<FetchScript>>,
}

impl FakeState {
    pub fn scripted(steps: Vec<FetchScript>) -> Rc<Self> {
        let state = Rc::new(Self::default());
        *state.script.borrow_mut() = steps.into();
        state
    }
}

pub struct FakeTerminal {
    pub state: Rc<FakeState>,
}

pub struct FakeSession {
    state: Rc<FakeState>,
    step: FetchScript,
}

impl Terminal for FakeTerminal {
    type Session = FakeSession;

    fn connect(&self) -> AppResult<FakeSession> {
        self.state.connects.set(self.state.connects.get() + 1);

        let step = self
            .state
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or(FetchScript::Records(Vec::new()));

        match step {
            FetchScript::Fail => Err(AppError::Device("scripted connection failure".into())),
            other => Ok(FakeSession {
                state: self.state.clone(),
                step: other,
            }),
        }
    }

    fn describe(&self) -> String {
        "fake-terminal".to_string()
    }
}

impl TerminalSession for FakeSession {
    fn disable_capture(&mut self) -> AppResult<()> {
        self.state.disables.set(self.state.disables.get() + 1);
        match &self.step {
            FetchScript::DisableError(_) => {
                Err(AppError::Device("scripted capture pause failure".into()))
            }
            _ => Ok(()),
        }
    }

    fn enable_capture(&mut self) -> AppResult<()> {
        self.state.enables.set(self.state.enables.get() + 1);
        Ok(())
    }

    fn read_records(&mut self) -> AppResult<Vec<RawRecord>> {
        match &self.step {
            FetchScript::ReadError => Err(AppError::Device("scripted read failure".into())),
            FetchScript::Records(records) | FetchScript::DisableError(records) => {
                Ok(records.clone())
            }
            FetchScript::Fail => unreachable!("failed connections never produce a session"),
        }
    }

    fn clear_log(&mut self) -> AppResult<()> {
        self.state.clears.set(self.state.clears.get() + 1);
        Ok(())
    }

    fn close(&mut self) -> AppResult<()> {
        self.state.closes.set(self.state.closes.get() + 1);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Minimal scripted HTTP server
// ---------------------------------------------------------------------------

pub struct StubResponse {
    pub status: u16,
    pub body: String,
}

impl StubResponse {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

/// One-thread HTTP responder that serves a fixed script of responses and
/// records the request bodies it saw. `finish` joins the thread, so a test
/// must trigger exactly as many requests as it scripted responses.
pub struct StubServer {
    pub url: String,
    handle: thread::JoinHandle<Vec<String>>,
}

pub fn spawn_stub(responses: Vec<StubResponse>) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
    let addr = listener.local_addr().expect("stub server addr");

    let handle = thread::spawn(move || {
        let mut bodies = Vec::new();
        for resp in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                break;
            };
            bodies.push(read_request_body(&mut stream));
            let payload = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                resp.status,
                reason_for(resp.status),
                resp.body.len(),
                resp.body
            );
            stream.write_all(payload.as_bytes()).ok();
        }
        bodies
    });

    StubServer {
        url: format!("http://{}", addr),
        handle,
    }
}

impl StubServer {
    /// Wait for the script to be fully served and return the request bodies.
    pub fn finish(self) -> Vec<String> {
        self.handle.join().expect("stub server thread")
    }
}

/// A URL nothing listens on; connections get refused.
pub fn dead_url() -> String {
    format!("http://127.0.0.1:{}", dead_port())
}

/// A local port nothing listens on.
pub fn dead_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind throwaway listener");
    let port = listener.local_addr().expect("throwaway addr").port();
    drop(listener);
    port
}

fn read_request_body(stream: &mut TcpStream) -> String {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    let mut content_length = 0usize;

    loop {
        line.clear();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        if line == "\r\n" || line == "\n" {
            break;
        }
        let lower = line.to_ascii_lowercase();
        if let Some(rest) = lower.strip_prefix("content-length:") {
            content_length = rest.trim().parse().unwrap_or(0);
        }
    }

    let mut body = vec![0u8; content_length];
    if content_length > 0 {
        reader.read_exact(&mut body).ok();
    }
    String::from_utf8_lossy(&body).into_owned()
}

fn reason_for(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}
