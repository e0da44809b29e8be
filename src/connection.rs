use crate::error::{FlapiError, Result};
use crate::handle::{Handle, HandleRegistry, HandleType};
use serde_json::{json, Value};
use std::fs;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::process::Child;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle of a session. Connecting only exists while the handshake is in
/// flight; everything after close() is Closed, permanently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

/// What start_render should do when the processor is busy with another job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusyPolicy {
    /// Surface AlreadyRunning to the caller.
    #[default]
    Reject,
    /// Stop the current job, then start the new one.
    Preempt,
}

/// Connection settings. Launch mode is a separate constructor
/// ([`crate::launch`]), not a hidden default in here.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Credentials for the handshake. When connecting to localhost with
    /// neither set, the per-user token file is used instead.
    pub username: Option<String>,
    pub token: Option<String>,
    /// Deadline for any single request/reply exchange.
    pub call_timeout: Duration,
    pub connect_attempts: u32,
    pub busy_policy: BusyPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "localhost".to_owned(),
            port: 1984,
            username: None,
            token: None,
            call_timeout: Duration::from_secs(30),
            connect_attempts: 1,
            busy_policy: BusyPolicy::default(),
        }
    }
}

impl Config {
    pub fn new(host: impl Into<String>) -> Self {
        Config {
            host: host.into(),
            ..Default::default()
        }
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A live session with the flapi service. All calls are serialized through
/// `&mut self`; independent sessions are independent values. The session owns
/// every handle it hands out and releases any still alive when it closes.
pub struct Connection {
    session: Uuid,
    config: Config,
    state: ConnectionState,
    reader: Option<BufReader<TcpStream>>,
    writer: Option<TcpStream>,
    next_id: u64,
    registry: HandleRegistry,
    /// Child process when this session was created via launch().
    child: Option<Child>,
    /// Cached singleton processor handle, see render::render_processor.
    pub(crate) processor: Option<Handle>,
}

impl Connection {
    /// Connect to an already-running service and authenticate.
    pub fn connect(config: &Config) -> Result<Connection> {
        let mut conn = Connection::open_socket(config, None)?;

        // Authenticate. Launched sessions skip this; the daemon trusts the
        // process that spawned it.
        conn.state = ConnectionState::Connecting;
        let (username, token) = conn.credentials();
        let result = conn
            .call(
                None,
                "connect",
                json!({ "username": username, "token": token }),
            )
            .map_err(|e| match e {
                FlapiError::Remote { message, .. } => conn.connect_error(message),
                other => other,
            })?;

        if result.as_i64() != Some(1) {
            return Err(conn.connect_error("authentication failed".to_owned()));
        }

        conn.state = ConnectionState::Connected;
        info!(endpoint = %config.endpoint(), session = %conn.session, "connected");
        Ok(conn)
    }

    /// Attach to a daemon we spawned ourselves. No handshake.
    pub(crate) fn attach(config: &Config, child: Child) -> Result<Connection> {
        let mut conn = Connection::open_socket(config, Some(child))?;
        conn.state = ConnectionState::Connected;
        info!(endpoint = %config.endpoint(), session = %conn.session, "attached to launched service");
        Ok(conn)
    }

    fn open_socket(config: &Config, child: Option<Child>) -> Result<Connection> {
        let endpoint = config.endpoint();
        let addrs: Vec<_> = endpoint
            .to_socket_addrs()
            .map_err(|e| FlapiError::Connection {
                host: config.host.clone(),
                port: config.port,
                reason: e.to_string(),
            })?
            .collect();

        let attempts = config.connect_attempts.max(1);
        let mut last_err = None;
        let mut stream = None;
        'outer: for _ in 0..attempts {
            for addr in &addrs {
                match TcpStream::connect_timeout(addr, config.call_timeout) {
                    Ok(s) => {
                        stream = Some(s);
                        break 'outer;
                    }
                    Err(e) => last_err = Some(e),
                }
            }
        }

        let stream = match stream {
            Some(s) => s,
            None => {
                return Err(FlapiError::Connection {
                    host: config.host.clone(),
                    port: config.port,
                    reason: last_err
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "no addresses resolved".to_owned()),
                })
            }
        };

        stream.set_read_timeout(Some(config.call_timeout))?;
        stream.set_nodelay(true)?;
        let reader = BufReader::new(stream.try_clone()?);

        let session = Uuid::new_v4();
        Ok(Connection {
            session,
            config: config.clone(),
            state: ConnectionState::Disconnected,
            reader: Some(reader),
            writer: Some(stream),
            next_id: 1,
            registry: HandleRegistry::new(session),
            child,
            processor: None,
        })
    }

    fn connect_error(&self, reason: String) -> FlapiError {
        FlapiError::Connection {
            host: self.config.host.clone(),
            port: self.config.port,
            reason,
        }
    }

    /// Resolve credentials for the handshake. Local connections without
    /// explicit credentials fall back to the per-user token file, creating
    /// one if missing so the daemon can authenticate us.
    fn credentials(&self) -> (Option<String>, Option<String>) {
        if self.config.token.is_some() || self.config.username.is_some() {
            return (self.config.username.clone(), self.config.token.clone());
        }
        if self.config.host == "localhost" {
            let user = std::env::var("USER").ok();
            return (user, read_or_create_token());
        }
        (None, None)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn session_id(&self) -> Uuid {
        self.session
    }

    /// Number of handles this session still owns.
    pub fn open_handles(&self) -> usize {
        self.registry.len()
    }

    pub(crate) fn busy_policy(&self) -> BusyPolicy {
        self.config.busy_policy
    }

    /// One synchronous request/reply exchange. Server error replies are
    /// mapped onto the typed taxonomy by code.
    pub(crate) fn call(
        &mut self,
        target: Option<i64>,
        method: &str,
        params: Value,
    ) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let msg = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "target": target,
            "params": params,
        });
        self.send(&msg)?;

        loop {
            let mut reply = self.recv()?;
            if reply.get("id").and_then(Value::as_u64) != Some(id) {
                // Unsolicited message (e.g. a signal we never subscribed
                // to). Ignore it and keep waiting for our reply.
                debug!(method, "skipping unsolicited message");
                continue;
            }
            if let Some(err) = reply.get("error") {
                let code = err.get("code").and_then(Value::as_i64).unwrap_or(0);
                let message = err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown server error")
                    .to_owned();
                return Err(FlapiError::from_remote(code, message));
            }
            return Ok(reply
                .get_mut("result")
                .map(Value::take)
                .unwrap_or(Value::Null));
        }
    }

    fn send(&mut self, msg: &Value) -> Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            FlapiError::Transport(std::io::Error::new(
                ErrorKind::NotConnected,
                "session is closed",
            ))
        })?;
        let mut line = serde_json::to_string(msg)
            .map_err(|e| FlapiError::Protocol(e.to_string()))?;
        debug!(%line, "send");
        line.push('\n');
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn recv(&mut self) -> Result<Value> {
        let reader = self.reader.as_mut().ok_or_else(|| {
            FlapiError::Transport(std::io::Error::new(
                ErrorKind::NotConnected,
                "session is closed",
            ))
        })?;
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => Err(FlapiError::Transport(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "connection closed by server",
            ))),
            Ok(_) => {
                debug!(line = line.trim_end(), "recv");
                serde_json::from_str(&line).map_err(|e| FlapiError::Protocol(e.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                Err(FlapiError::Timeout)
            }
            Err(e) => Err(FlapiError::Transport(e)),
        }
    }

    /// Register a handle object from a reply value.
    pub(crate) fn take_handle(&mut self, value: &Value, kind: HandleType) -> Result<Handle> {
        let id = value
            .get("_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| FlapiError::Protocol(format!("expected a {} handle", kind)))?;
        Ok(self.registry.register(id, kind))
    }

    /// Validate a handle before forwarding it to the server.
    pub(crate) fn check_handle(&self, handle: &Handle, expected: HandleType) -> Result<()> {
        self.registry.check(handle, expected)
    }

    /// Release a handle's server-side resources. Idempotent: releasing a
    /// handle this session no longer tracks is a no-op.
    pub fn release(&mut self, handle: &Handle) -> Result<()> {
        if handle.session() != self.session {
            return Err(FlapiError::StaleHandle(format!(
                "{} belongs to another session",
                handle
            )));
        }
        if !self.registry.remove(handle.id()) {
            return Ok(());
        }
        if self.processor.map(|p| p.id()) == Some(handle.id()) {
            self.processor = None;
        }
        self.call(Some(handle.id()), "forget", json!({}))?;
        Ok(())
    }

    /// Close the session: release every handle still owned, then tear down
    /// the connection. Idempotent, and safe to call on every error path.
    /// Individual release failures are logged, never raised, so cleanup
    /// cannot mask whatever error got us here.
    pub fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }

        if !self.registry.is_empty() {
            debug!(count = self.registry.len(), "releasing handles left open at close");
        }
        for (id, kind) in self.registry.drain() {
            if let Err(e) = self.call(Some(id), "forget", json!({})) {
                warn!(%id, %kind, error = %e, "failed to release handle during close");
            }
        }
        self.processor = None;

        if let Some(stream) = self.writer.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        self.reader = None;

        if let Some(mut child) = self.child.take() {
            // flapid exits when its socket drops; reap it, kill if wedged.
            let _ = child.kill();
            let _ = child.wait();
        }

        self.state = ConnectionState::Closed;
        info!(session = %self.session, "session closed");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

fn token_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".filmlight").join("flapi-token"))
}

/// Read the per-user auth token, generating and persisting a fresh one if
/// none exists yet. The daemon reads the same file to authenticate us.
fn read_or_create_token() -> Option<String> {
    let path = token_path()?;
    if let Ok(content) = fs::read_to_string(&path) {
        if let Some(first) = content.lines().next() {
            if !first.is_empty() {
                return Some(first.to_owned());
            }
        }
    }

    let token = Uuid::new_v4().simple().to_string();
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return None;
        }
    }
    match fs::write(&path, &token) {
        Ok(()) => Some(token),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot write token file");
            None
        }
    }
}
