//! In-memory modems for unit tests.

use super::device::SerialOpener;
use super::errors::SerialError;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

/// Reply for one received command. Message bodies arrive as `BODY:<text>`.
pub(crate) type Script = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

#[derive(Debug, Default)]
struct LogInner {
    commands: Vec<String>,
    opens: usize,
    closes: usize,
}

/// What the fake modems saw.
#[derive(Debug, Clone, Default)]
pub(crate) struct ModemLog {
    inner: Arc<Mutex<LogInner>>,
}

impl ModemLog {
    pub(crate) fn commands(&self) -> Vec<String> {
        self.inner.lock().unwrap().commands.clone()
    }

    pub(crate) fn opens(&self) -> usize {
        self.inner.lock().unwrap().opens
    }

    pub(crate) fn closes(&self) -> usize {
        self.inner.lock().unwrap().closes
    }

    /// Let the modem tasks observe EOF, then check the close count.
    pub(crate) async fn wait_for_closes(&self, expected: usize) -> bool {
        for _ in 0..100 {
            if self.closes() >= expected {
                return true;
            }
            tokio::task::yield_now().await;
        }
        self.closes() >= expected
    }

    fn record(&self, command: String) {
        self.inner.lock().unwrap().commands.push(command);
    }
}

/// [`SerialOpener`] serving scripted modems over in-memory pipes.
#[derive(Clone, Default)]
pub(crate) struct FakeOpener {
    devices: HashMap<String, Script>,
    broken: HashSet<String>,
    log: ModemLog,
}

impl FakeOpener {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_device<F>(mut self, path: &str, script: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.devices.insert(path.to_string(), Arc::new(script));
        self
    }

    /// A device that exists but cannot be opened.
    pub(crate) fn with_broken_device(mut self, path: &str) -> Self {
        self.broken.insert(path.to_string());
        self
    }

    pub(crate) fn log(&self) -> ModemLog {
        self.log.clone()
    }
}

impl SerialOpener for FakeOpener {
    type Port = DuplexStream;

    fn exists(&self, path: &str) -> bool {
        self.devices.contains_key(path) || self.broken.contains(path)
    }

    fn open(&self, path: &str, _baud_rate: u32) -> Result<Self::Port, SerialError> {
        let script = self
            .devices
            .get(path)
            .filter(|_| !self.broken.contains(path))
            .cloned()
            .ok_or_else(|| SerialError::Open {
                path: path.to_string(),
                source: tokio_serial::Error::new(tokio_serial::ErrorKind::NoDevice, "device busy"),
            })?;

        let (host, modem) = tokio::io::duplex(1024);
        self.log.inner.lock().unwrap().opens += 1;
        tokio::spawn(run_modem(modem, script, self.log.clone()));
        Ok(host)
    }
}

async fn run_modem(mut io: DuplexStream, script: Script, log: ModemLog) {
    let mut buf = [0u8; 256];
    let mut pending = Vec::new();

    'session: loop {
        let n = match io.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };

        for &byte in &buf[..n] {
            let entry = match byte {
                b'\r' => String::from_utf8_lossy(&pending).into_owned(),
                0x1A => format!("BODY:{}", String::from_utf8_lossy(&pending)),
                b'\n' => continue,
                other => {
                    pending.push(other);
                    continue;
                }
            };
            pending.clear();
            log.record(entry.clone());

            if let Some(reply) = script(&entry) {
                if io.write_all(reply.as_bytes()).await.is_err() {
                    break 'session;
                }
            }
        }
    }

    log.inner.lock().unwrap().closes += 1;
}

/// A modem that accepts a complete text-mode send.
pub(crate) fn standard_modem() -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
    |command: &str| {
        let reply = match command {
            "AT" | "AT+CMGF=1" => "\r\nOK\r\n",
            c if c.starts_with("AT+CMGS=") => "\r\n> ",
            c if c.starts_with("BODY:") => "\r\n+CMGS: 17\r\n\r\nOK\r\n",
            _ => "\r\nERROR\r\n",
        };
        Some(reply.to_string())
    }
}

/// Like [`standard_modem`], but echoes every command first (`ATE1`).
pub(crate) fn echoing_modem() -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
    let inner = standard_modem();
    move |command: &str| {
        let echo = match command.strip_prefix("BODY:") {
            Some(body) => format!("{}\x1a\r\n", body),
            None => format!("{}\r\r\n", command),
        };
        inner(command).map(|reply| format!("{}{}", echo, reply))
    }
}
