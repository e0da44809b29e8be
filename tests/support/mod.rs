//! In-process stand-in for the flapi service: one TCP connection, one JSON
//! message per line, replies scripted by the test.

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

pub struct MockService {
    pub port: u16,
    requests: Arc<Mutex<Vec<Value>>>,
    thread: Option<JoinHandle<()>>,
}

impl MockService {
    /// Start the service on an ephemeral port. `respond` maps each request
    /// to a reply body; the matching id is filled in automatically.
    pub fn spawn(mut respond: impl FnMut(&Value) -> Value + Send + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock service");
        let port = listener.local_addr().expect("local addr").port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        let thread = std::thread::spawn(move || {
            let (stream, _) = match listener.accept() {
                Ok(accepted) => accepted,
                Err(_) => return,
            };
            let mut writer = stream.try_clone().expect("clone stream");
            let reader = BufReader::new(stream);
            for line in reader.lines() {
                let line = match line {
                    Ok(line) if !line.is_empty() => line,
                    Ok(_) => continue,
                    Err(_) => break,
                };
                let request: Value = serde_json::from_str(&line).expect("request is JSON");
                seen.lock().unwrap().push(request.clone());

                let mut reply = respond(&request);
                if reply.get("id").is_none() {
                    reply["id"] = request["id"].clone();
                }
                let mut out = reply.to_string();
                out.push('\n');
                if writer.write_all(out.as_bytes()).is_err() {
                    break;
                }
            }
        });

        MockService {
            port,
            requests,
            thread: Some(thread),
        }
    }

    pub fn config(&self) -> flapi::Config {
        flapi::Config {
            host: "127.0.0.1".to_owned(),
            port: self.port,
            ..Default::default()
        }
    }

    /// Everything received so far.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests for one method, in arrival order.
    pub fn requests_for(&self, method: &str) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|r| r["method"] == method)
            .collect()
    }
}

impl Drop for MockService {
    fn drop(&mut self) {
        // The read loop ends when the client side shuts down.
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

pub fn method(request: &Value) -> &str {
    request["method"].as_str().unwrap_or("")
}

pub fn ok(result: Value) -> Value {
    json!({ "result": result })
}

pub fn err(code: i64, message: &str) -> Value {
    json!({ "error": { "code": code, "message": message } })
}

pub fn handle(kind: &str, id: i64) -> Value {
    json!({ "_handle": kind, "_id": id })
}
