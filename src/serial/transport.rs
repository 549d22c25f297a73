//! Line-oriented AT command exchange over a serial device.

use super::device::{SerialDeviceHandle, SerialOpener};
use super::errors::{AtError, SerialError};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

/// Final result code of a successful command.
pub const OK_TOKEN: &str = "OK";

/// Prompt the modem sends when it is ready for the message body.
pub const PROMPT_TOKEN: &str = ">";

/// Token carried by every failure result code (`ERROR`, `+CMS ERROR: n`, `+CME ERROR: n`).
pub const ERROR_TOKEN: &str = "ERROR";

/// SUB (Ctrl-Z), terminates the message body in text mode.
pub const CTRL_Z: u8 = 0x1A;

/// ESC, aborts message body input.
const ESC: char = '\u{1b}';

const CRLF: &[u8] = b"\r\n";

/// How a command is terminated on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// Regular command, followed by CR LF.
    CrLf,
    /// Message body, followed by Ctrl-Z and nothing else.
    CtrlZ,
}

/// One command of an AT exchange together with what must come back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtStep {
    command: String,
    expected: &'static str,
    timeout: Duration,
    terminator: Terminator,
}

impl AtStep {
    /// A regular command terminated with CR LF.
    pub fn command(command: impl Into<String>, expected: &'static str, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            expected,
            timeout,
            terminator: Terminator::CrLf,
        }
    }

    /// The message body of a text-mode send, terminated with Ctrl-Z.
    ///
    /// Ctrl-Z and ESC inside the text would end or abort the input early, so
    /// they are removed.
    pub fn message_body(text: &str, timeout: Duration) -> Self {
        let command = text
            .chars()
            .filter(|c| *c != char::from(CTRL_Z) && *c != ESC)
            .collect();

        Self {
            command,
            expected: OK_TOKEN,
            timeout,
            terminator: Terminator::CtrlZ,
        }
    }

    /// Command text without terminator.
    pub fn text(&self) -> &str {
        &self.command
    }

    /// Token that completes this step.
    pub fn expected(&self) -> &'static str {
        self.expected
    }

    /// Time allowed for the expected token to arrive.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wire terminator of this step.
    pub fn terminator(&self) -> Terminator {
        self.terminator
    }

    /// Name used in logs and errors. Message bodies are not repeated.
    pub fn label(&self) -> String {
        match self.terminator {
            Terminator::CrLf => self.command.clone(),
            Terminator::CtrlZ => format!("<message body, {} chars>", self.command.chars().count()),
        }
    }

    /// Exact bytes written to the device.
    pub fn wire_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.command.len() + 2);
        bytes.extend_from_slice(self.command.as_bytes());
        match self.terminator {
            Terminator::CrLf => bytes.extend_from_slice(CRLF),
            Terminator::CtrlZ => bytes.push(CTRL_Z),
        }
        bytes
    }
}

/// Progress of a single command exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtCommandState {
    /// Command not written yet.
    AwaitingOpen,
    /// Command written, reading response lines.
    AwaitingLine,
    /// A line carried the expected token.
    Matched,
    /// A line carried the error token.
    Rejected,
    /// The timeout elapsed first.
    TimedOut,
}

/// Response of a command that matched its expected token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtResponse {
    /// Final state, always [`AtCommandState::Matched`].
    pub state: AtCommandState,
    /// Everything the modem sent during the exchange.
    pub text: String,
}

/// Accumulates modem output and decides when a command is complete.
#[derive(Debug)]
struct ResponseReader {
    expected: &'static str,
    echo: VecDeque<String>,
    pending: Vec<u8>,
    received: Vec<u8>,
    state: AtCommandState,
}

impl ResponseReader {
    fn new(step: &AtStep) -> Self {
        let echo = step
            .text()
            .split(['\r', '\n'])
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            expected: step.expected(),
            echo,
            pending: Vec::new(),
            received: Vec::new(),
            state: AtCommandState::AwaitingOpen,
        }
    }

    fn start(&mut self) {
        self.state = AtCommandState::AwaitingLine;
    }

    fn feed(&mut self, bytes: &[u8]) -> AtCommandState {
        self.received.extend_from_slice(bytes);

        for &byte in bytes {
            if byte != b'\n' {
                self.pending.push(byte);
                continue;
            }

            let line = std::mem::take(&mut self.pending);
            if let Some(state) = self.classify_line(&line) {
                self.state = state;
                return state;
            }
        }

        // The body prompt is not followed by a line break.
        if self.expected == PROMPT_TOKEN
            && String::from_utf8_lossy(&self.pending)
                .trim_start()
                .starts_with(PROMPT_TOKEN)
        {
            self.state = AtCommandState::Matched;
        }

        self.state
    }

    fn classify_line(&mut self, line: &[u8]) -> Option<AtCommandState> {
        let text = String::from_utf8_lossy(line);
        let line = text.trim_matches(|c: char| c.is_whitespace() || c == char::from(CTRL_Z));
        if line.is_empty() {
            // Responses open with CRLF; echo only ever comes before it.
            self.echo.clear();
            return None;
        }
        if self.is_echo(line) {
            return None;
        }
        self.echo.clear();

        if line.contains(ERROR_TOKEN) {
            Some(AtCommandState::Rejected)
        } else if line.contains(self.expected) {
            Some(AtCommandState::Matched)
        } else {
            None
        }
    }

    fn is_echo(&mut self, line: &str) -> bool {
        let candidate = line.trim_start_matches(PROMPT_TOKEN).trim();
        if self.echo.front().is_some_and(|echo| echo == candidate) {
            self.echo.pop_front();
            return true;
        }
        false
    }

    fn response(&self) -> String {
        String::from_utf8_lossy(&self.received).into_owned()
    }
}

/// Sends AT commands to serial devices.
///
/// Each exchange writes one command and waits until a response line carries
/// the expected token, a line carries `ERROR`, or the step's timeout elapses.
/// Any failure closes the device handle before the error is returned.
///
/// # Example
///
/// ```rust,ignore
/// use sms_relay::serial::{SerialAtTransport, TokioSerialOpener, OK_TOKEN};
/// use std::time::Duration;
///
/// let transport = SerialAtTransport::new(TokioSerialOpener, 9600);
/// let response = transport
///     .send_command("/dev/ttyUSB0", "AT", OK_TOKEN, Duration::from_secs(2))
///     .await?;
/// println!("{}", response.text);
/// ```
#[derive(Debug, Clone)]
pub struct SerialAtTransport<O> {
    opener: O,
    baud_rate: u32,
}

impl<O: SerialOpener> SerialAtTransport<O> {
    /// Create a transport that opens devices through `opener`.
    pub fn new(opener: O, baud_rate: u32) -> Self {
        Self { opener, baud_rate }
    }

    /// Get reference to the device opener.
    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Baud rate used for every device.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Open a device for a multi-command session.
    pub fn open(&self, path: &str) -> Result<SerialDeviceHandle<O::Port>, AtError> {
        Ok(SerialDeviceHandle::open(&self.opener, path, self.baud_rate)?)
    }

    /// Open `path`, run one command, and close the device again.
    pub async fn send_command(
        &self,
        path: &str,
        command: &str,
        expected: &'static str,
        timeout: Duration,
    ) -> Result<AtResponse, AtError> {
        self.send_step(path, &AtStep::command(command, expected, timeout))
            .await
    }

    /// Open `path`, run one step, and close the device again.
    pub async fn send_step(&self, path: &str, step: &AtStep) -> Result<AtResponse, AtError> {
        let mut handle = self.open(path)?;
        let result = self.execute(&mut handle, step).await;
        handle.close().await;
        result
    }

    /// Run one step on an open device.
    ///
    /// On success the handle stays open for the next step; on any failure it
    /// is closed.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SerialAtTransport::execute",
            skip_all,
            fields(path = %handle.path(), command = %step.label())
        )
    )]
    pub async fn execute(
        &self,
        handle: &mut SerialDeviceHandle<O::Port>,
        step: &AtStep,
    ) -> Result<AtResponse, AtError> {
        let result = exchange(handle, step).await;
        if result.is_err() {
            handle.close().await;
        }
        result
    }
}

async fn exchange<P>(
    handle: &mut SerialDeviceHandle<P>,
    step: &AtStep,
) -> Result<AtResponse, AtError>
where
    P: AsyncRead + AsyncWrite + Unpin + Send,
{
    let path = handle.path().to_string();
    let io_error = |source: std::io::Error| {
        AtError::Serial(SerialError::Io {
            path: path.clone(),
            source,
        })
    };

    let port = handle.port_mut()?;
    let mut reader = ResponseReader::new(step);

    #[cfg(feature = "tracing")]
    debug!(expected = step.expected(), "Writing AT command");

    port.write_all(&step.wire_bytes()).await.map_err(io_error)?;
    port.flush().await.map_err(io_error)?;
    reader.start();

    let read_loop = async {
        let mut buf = [0u8; 256];
        loop {
            let n = port.read(&mut buf).await.map_err(io_error)?;
            if n == 0 {
                return Ok::<_, AtError>(reader.state);
            }

            #[cfg(feature = "tracing")]
            trace!(bytes = n, "Received modem output");

            match reader.feed(&buf[..n]) {
                AtCommandState::AwaitingLine => continue,
                state => return Ok(state),
            }
        }
    };
    let outcome = tokio::time::timeout(step.timeout(), read_loop).await;

    let command = step.label();
    let expected = step.expected();
    match outcome {
        Ok(Ok(AtCommandState::Matched)) => Ok(AtResponse {
            state: AtCommandState::Matched,
            text: reader.response(),
        }),
        Ok(Ok(AtCommandState::Rejected)) => Err(AtError::Rejected {
            command,
            expected,
            response: reader.response(),
        }),
        Ok(Ok(_)) => Err(AtError::Disconnected {
            command,
            expected,
            response: reader.response(),
        }),
        Ok(Err(e)) => Err(e),
        Err(_elapsed) => {
            reader.state = AtCommandState::TimedOut;
            Err(AtError::Timeout {
                command,
                expected,
                timeout: step.timeout(),
                response: reader.response(),
            })
        }
    }
}
