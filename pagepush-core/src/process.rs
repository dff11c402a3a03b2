//! Subprocess execution with structured failures
//!
//! Every git command goes through [`ProcessRunner`]. A run produces either the
//! accumulated stdout of the process or an [`Error::Process`] carrying the exit
//! code and stderr.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{Error, Result};

/// Exit code reported for processes terminated by a signal
const SIGNAL_EXIT_CODE: i32 = -1;

/// Read buffer size for process output
const CHUNK_SIZE: usize = 8 * 1024;

/// Runs native executables to completion
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a new runner
    pub fn new() -> Self {
        Self
    }

    /// Run `program` with `args` in `cwd` and return its stdout
    pub async fn run<S: AsRef<str>>(&self, program: &str, args: &[S], cwd: &Path) -> Result<String> {
        self.execute(program, args, cwd, None).await
    }

    /// Like [`run`](Self::run), but also sends each stdout chunk on `progress`
    /// as it arrives
    ///
    /// A closed receiver does not abort the process; chunks are still
    /// accumulated into the returned output. The receiver must be drained
    /// concurrently once the channel capacity could be exceeded.
    pub async fn run_with_progress<S: AsRef<str>>(
        &self,
        program: &str,
        args: &[S],
        cwd: &Path,
        progress: mpsc::Sender<String>,
    ) -> Result<String> {
        self.execute(program, args, cwd, Some(progress)).await
    }

    async fn execute<S: AsRef<str>>(
        &self,
        program: &str,
        args: &[S],
        cwd: &Path,
        progress: Option<mpsc::Sender<String>>,
    ) -> Result<String> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        debug!(program, args = ?args, cwd = %cwd.display(), "Spawning process");

        let mut child = Command::new(program)
            .args(&args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound && cwd.is_dir() {
                    Error::GitNotFound(program.to_string())
                } else {
                    Error::Io(e)
                }
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Other("stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Other("stderr was not captured".to_string()))?;

        let (stdout, stderr) = tokio::try_join!(
            read_chunks(stdout, progress),
            read_chunks(stderr, None)
        )?;
        let status = child.wait().await?;

        if status.success() {
            return Ok(stdout);
        }

        let code = status.code().unwrap_or(SIGNAL_EXIT_CODE);
        debug!(program, code, "Process failed");
        Err(process_failure(code, stderr))
    }
}

/// Build the failure for a non-zero exit
fn process_failure(code: i32, stderr: String) -> Error {
    let message = if stderr.is_empty() {
        format!("Process failed: {}", code)
    } else {
        stderr
    };
    Error::Process { code, message }
}

/// Accumulate a stream, forwarding decoded chunks to `progress` if given
///
/// Output is decoded once at the end. Forwarded chunks hold back an
/// incomplete UTF-8 sequence until the rest of it has been read.
async fn read_chunks<R>(mut reader: R, progress: Option<mpsc::Sender<String>>) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut output = Vec::new();
    let mut pending = Vec::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        output.extend_from_slice(&buf[..n]);

        if let Some(tx) = &progress {
            pending.extend_from_slice(&buf[..n]);
            let complete = complete_utf8_len(&pending);
            if complete > 0 {
                let chunk = String::from_utf8_lossy(&pending[..complete]).into_owned();
                pending.drain(..complete);
                // Receiver may have gone away; the output is still collected
                let _ = tx.send(chunk).await;
            }
        }
    }

    if let Some(tx) = &progress {
        if !pending.is_empty() {
            let _ = tx.send(String::from_utf8_lossy(&pending).into_owned()).await;
        }
    }

    Ok(String::from_utf8_lossy(&output).into_owned())
}

/// Length of the prefix of `bytes` that does not end inside a UTF-8 sequence
///
/// Invalid bytes are not held back; they decode to U+FFFD.
fn complete_utf8_len(bytes: &[u8]) -> usize {
    match std::str::from_utf8(bytes) {
        Ok(_) => bytes.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => bytes.len(),
    }
}
