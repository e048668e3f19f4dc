use std::io::{self, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::cancel::CancelToken;
use crate::error::QueryError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const STDERR_SUMMARY_LIMIT: usize = 2048;
/// How long output pipes may stay open once the tool itself has exited
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// One invocation of an external tool whose stdout is the query result
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn to_shell_command(&self) -> String {
        let mut cmd = String::new();
        for (key, value) in &self.env {
            cmd.push_str(&format!("{key}={} ", shell_quote(value)));
        }
        cmd.push_str(&shell_quote(&self.program));
        for arg in &self.args {
            cmd.push(' ');
            cmd.push_str(&shell_quote(arg));
        }
        cmd
    }

    /// Run the tool to completion and return its stdout.
    ///
    /// The child is killed when `cancel` fires or the timeout elapses. Output
    /// pipes are drained on background threads so a chatty tool cannot block
    /// on a full pipe while we wait for it. A helper process that inherits the
    /// pipes and outlives the tool holds them open for at most [`DRAIN_GRACE`],
    /// and never past the timeout or cancellation.
    pub fn run(&self, cancel: &CancelToken) -> Result<String, QueryError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        tracing::debug!("Running: {}", self.to_shell_command());

        let mut child = cmd.spawn().map_err(|source| QueryError::Spawn {
            tool: self.program.clone(),
            source,
        })?;
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(source) => {
                    terminate(&mut child);
                    return Err(QueryError::Spawn {
                        tool: self.program.clone(),
                        source,
                    });
                }
            }

            if cancel.is_cancelled() {
                tracing::debug!("Cancelling {} after {:?}", self.program, started.elapsed());
                terminate(&mut child);
                return Err(QueryError::Cancelled);
            }

            if let Some(limit) = self.timeout {
                if started.elapsed() >= limit {
                    terminate(&mut child);
                    return Err(QueryError::TimedOut {
                        tool: self.program.clone(),
                        after: limit,
                    });
                }
            }

            thread::sleep(POLL_INTERVAL);
        };

        let grace_end = Instant::now() + DRAIN_GRACE;
        for pipe in [&stdout, &stderr].into_iter().flatten() {
            self.await_eof(pipe, started, grace_end, cancel)?;
        }
        let stdout = stdout.map(Drain::take).unwrap_or_default();
        let stderr = stderr.map(Drain::take).unwrap_or_default();

        if !status.success() {
            return Err(QueryError::failed(
                &self.program,
                status.to_string(),
                summarize(&stderr),
            ));
        }

        String::from_utf8(stdout)
            .map_err(|e| QueryError::invalid_output(&self.program, format!("invalid UTF-8: {e}")))
    }

    /// Wait for `pipe` to reach end of output after the tool has exited
    fn await_eof(
        &self,
        pipe: &Drain,
        started: Instant,
        grace_end: Instant,
        cancel: &CancelToken,
    ) -> Result<(), QueryError> {
        loop {
            match pipe.done.recv_timeout(POLL_INTERVAL) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return Ok(()),
                Err(RecvTimeoutError::Timeout) => {}
            }

            if cancel.is_cancelled() {
                return Err(QueryError::Cancelled);
            }

            if let Some(limit) = self.timeout {
                if started.elapsed() >= limit {
                    return Err(QueryError::TimedOut {
                        tool: self.program.clone(),
                        after: limit,
                    });
                }
            }

            if Instant::now() >= grace_end {
                tracing::debug!(
                    "Output of {} still open {:?} after exit, using what was read",
                    self.program,
                    DRAIN_GRACE
                );
                return Ok(());
            }
        }
    }
}

/// Output read so far from one pipe, and a signal for end of output
struct Drain {
    buf: Arc<Mutex<Vec<u8>>>,
    done: Receiver<()>,
}

impl Drain {
    fn take(self) -> Vec<u8> {
        std::mem::take(&mut *self.buf.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Single-quote `value` for a POSIX shell if it is empty or has special characters
pub fn shell_quote(value: &str) -> String {
    if value.is_empty() || value.contains([' ', '\t', '"', '\'', '$']) {
        format!("'{}'", value.replace('\'', r"'\''"))
    } else {
        value.to_string()
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Drain {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let (signal, done) = mpsc::channel();
    let sink = Arc::clone(&buf);

    thread::spawn(move || {
        let mut chunk = [0u8; 8192];
        loop {
            match pipe.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => sink
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(_) => break,
            }
        }
        let _ = signal.send(());
    });

    Drain { buf, done }
}

fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn summarize(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.is_empty() {
        return "no error output".to_string();
    }
    match text.char_indices().nth(STDERR_SUMMARY_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
