use crate::connection::{Config, Connection};
use crate::error::{FlapiError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Which product's daemon to launch when no explicit path is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Product {
    #[default]
    Baselight,
    Daylight,
    BaselightServer,
}

impl Product {
    fn name(&self) -> &'static str {
        match self {
            Product::Baselight => "baselight",
            Product::Daylight => "daylight",
            Product::BaselightServer => "baselightserver",
        }
    }

    fn mac_name(&self) -> &'static str {
        match self {
            Product::Baselight => "Baselight",
            Product::Daylight => "Daylight",
            Product::BaselightServer => "BaselightServer",
        }
    }
}

/// Settings for launching a local flapid and connecting to it.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub product: Product,
    /// Specific installed version, or the current one when None.
    pub version: Option<String>,
    /// Explicit path to the flapid executable, overriding discovery.
    pub program: Option<PathBuf>,
    /// How long to wait for the daemon to publish its port.
    pub startup_timeout: Duration,
    pub config: Config,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        LaunchOptions {
            product: Product::default(),
            version: None,
            program: None,
            startup_timeout: Duration::from_secs(30),
            config: Config::default(),
        }
    }
}

impl Connection {
    /// Start a local flapid process and connect to it. The daemon writes its
    /// listen port to a file we name; we wait a bounded window for that to
    /// appear, then attach without an auth handshake.
    pub fn launch(options: &LaunchOptions) -> Result<Connection> {
        let program = match &options.program {
            Some(path) => path.clone(),
            None => flapid_path(options.product, options.version.as_deref()),
        };
        let program_str = program.display().to_string();

        let port_file = std::env::temp_dir().join(format!("flapid-port-{}", std::process::id()));
        // Stale file from a crashed previous run would satisfy the wait
        // below with a dead port.
        let _ = fs::remove_file(&port_file);

        info!(program = %program_str, "launching flapid");
        let child = Command::new(&program)
            .arg("--slave")
            .arg("--port-file")
            .arg(&port_file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| FlapiError::Launch {
                program: program_str.clone(),
                reason: e.to_string(),
            })?;

        let port = match wait_for_port_file(&port_file, options.startup_timeout) {
            Ok(port) => port,
            Err(e) => {
                let mut child = child;
                let _ = child.kill();
                let _ = child.wait();
                let _ = fs::remove_file(&port_file);
                return Err(FlapiError::Launch {
                    program: program_str,
                    reason: e,
                });
            }
        };
        let _ = fs::remove_file(&port_file);
        debug!(port, "flapid ready");

        let mut config = options.config.clone();
        config.host = "localhost".to_owned();
        config.port = port;
        Connection::attach(&config, child)
    }
}

/// Locate the flapid executable. The FLAPI_PATH environment variable wins,
/// otherwise use the product's install location for this OS.
fn flapid_path(product: Product, version: Option<&str>) -> PathBuf {
    if let Ok(path) = std::env::var("FLAPI_PATH") {
        return PathBuf::from(path);
    }

    if cfg!(target_os = "macos") {
        let version = version.unwrap_or("Current");
        PathBuf::from(format!(
            "/Applications/{}/{}/Utilities/Tools/flapid",
            product.mac_name(),
            version
        ))
    } else {
        match version {
            Some(v) => PathBuf::from(format!("/usr/fl/{}-{}/bin/flapid", product.name(), v)),
            None => PathBuf::from(format!("/usr/fl/{}/bin/flapid", product.name())),
        }
    }
}

/// Poll for the daemon's port file until it holds a parseable port or the
/// startup window runs out.
fn wait_for_port_file(path: &Path, timeout: Duration) -> std::result::Result<u16, String> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(content) = fs::read_to_string(path) {
            let content = content.trim();
            if !content.is_empty() {
                return content
                    .parse::<u16>()
                    .map_err(|_| format!("bad port number in {}: {:?}", path.display(), content));
            }
        }
        if Instant::now() >= deadline {
            return Err(format!(
                "service did not become ready within {:?}",
                timeout
            ));
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn port_file_appears_late() {
        let path = std::env::temp_dir().join(format!("flapi-test-port-{}", uuid::Uuid::new_v4()));
        let writer_path = path.clone();
        let t = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(80));
            let mut f = fs::File::create(&writer_path).unwrap();
            write!(f, "4551\n").unwrap();
        });

        let port = wait_for_port_file(&path, Duration::from_secs(2)).unwrap();
        assert_eq!(port, 4551);
        t.join().unwrap();
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn port_file_never_appears() {
        let path = std::env::temp_dir().join(format!("flapi-test-port-{}", uuid::Uuid::new_v4()));
        let err = wait_for_port_file(&path, Duration::from_millis(120)).unwrap_err();
        assert!(err.contains("did not become ready"));
    }

    #[test]
    fn port_file_with_garbage() {
        let path = std::env::temp_dir().join(format!("flapi-test-port-{}", uuid::Uuid::new_v4()));
        fs::write(&path, "not-a-port\n").unwrap();
        let err = wait_for_port_file(&path, Duration::from_millis(120)).unwrap_err();
        assert!(err.contains("bad port number"));
        let _ = fs::remove_file(&path);
    }
}
