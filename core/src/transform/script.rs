// reqchain/src/transform/script.rs

//! Pipes a body through an external process.
//!
//! Protocol: the whole body goes to the child's stdin (which is then closed),
//! stdout is the transformed body, stderr must stay empty and the exit status
//! must be zero. stdin is written while stdout and stderr are drained, so a
//! payload larger than the OS pipe buffer cannot deadlock the exchange.

use crate::error::{ChainError, ChainResult};
use crate::settings::Settings;
use bytes::Bytes;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio_util::sync::CancellationToken;
use tracing::{event, Level};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTransformer {
  program: String,
  args: Vec<String>,
  timeout: Option<Duration>,
}

enum Interrupted {
  Cancelled,
  TimedOut(Duration),
}

struct Exchange {
  status: ExitStatus,
  stdout: Vec<u8>,
  stderr: Vec<u8>,
}

impl ScriptTransformer {
  /// Bounded by the default `custom_script_timeout` until told otherwise.
  pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      program: program.into(),
      args: args.into_iter().map(Into::into).collect(),
      timeout: Settings::default().script_timeout(),
    }
  }

  /// Builds a transformer bounded by `settings.custom_script_timeout`.
  pub fn from_settings<I, S>(program: impl Into<String>, args: I, settings: &Settings) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut script = Self::new(program, args);
    script.timeout = settings.script_timeout();
    script
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  /// Lets the process run for as long as it takes.
  pub fn without_timeout(mut self) -> Self {
    self.timeout = None;
    self
  }

  pub fn program(&self) -> &str {
    &self.program
  }

  pub fn args(&self) -> &[String] {
    &self.args
  }

  pub fn timeout(&self) -> Option<Duration> {
    self.timeout
  }

  pub(crate) async fn run(&self, cancel: &CancellationToken, body: Bytes) -> ChainResult<Bytes> {
    let mut child = Command::new(&self.program)
      .args(&self.args)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .spawn()
      .map_err(|source| ChainError::ProcessStart {
        program: self.program.clone(),
        source,
      })?;
    event!(Level::DEBUG, program = %self.program, pid = ?child.id(), "Script started.");

    let deadline = async {
      match self.timeout {
        Some(timeout) => {
          tokio::time::sleep(timeout).await;
          timeout
        }
        None => std::future::pending().await,
      }
    };

    let outcome = tokio::select! {
      exchanged = exchange(&mut child, body) => Ok(exchanged),
      _ = cancel.cancelled() => Err(Interrupted::Cancelled),
      timeout = deadline => Err(Interrupted::TimedOut(timeout)),
    };

    let finished = match outcome {
      Ok(exchanged) => exchanged.map_err(|source| ChainError::Io {
        program: self.program.clone(),
        source,
      })?,
      Err(interrupted) => {
        if let Err(err) = child.kill().await {
          event!(Level::WARN, program = %self.program, error = %err, "Failed to kill interrupted script.");
        }
        return Err(match interrupted {
          Interrupted::Cancelled => {
            event!(Level::INFO, program = %self.program, "Script cancelled.");
            ChainError::Cancelled
          }
          Interrupted::TimedOut(timeout) => {
            event!(Level::WARN, program = %self.program, ?timeout, "Script timed out.");
            ChainError::ProcessTimeout {
              program: self.program.clone(),
              timeout_secs: timeout.as_secs_f64(),
            }
          }
        });
      }
    };

    if !finished.stderr.is_empty() {
      let stderr = String::from_utf8_lossy(&finished.stderr).trim_end().to_string();
      event!(Level::ERROR, program = %self.program, %stderr, "Script wrote to stderr.");
      return Err(ChainError::ProcessStderr {
        program: self.program.clone(),
        stderr,
      });
    }

    if !finished.status.success() {
      event!(Level::ERROR, program = %self.program, status = %finished.status, "Script exited unsuccessfully.");
      return Err(ChainError::ProcessExit {
        program: self.program.clone(),
        code: finished.status.code(),
      });
    }

    Ok(Bytes::from(finished.stdout))
  }
}

async fn exchange(child: &mut Child, body: Bytes) -> io::Result<Exchange> {
  let stdin = child.stdin.take().ok_or_else(|| io::Error::other("stdin was not captured"))?;
  let stdout = child.stdout.take().ok_or_else(|| io::Error::other("stdout was not captured"))?;
  let stderr = child.stderr.take().ok_or_else(|| io::Error::other("stderr was not captured"))?;

  let (written, stdout, stderr) = tokio::join!(write_all_and_close(stdin, body), drain(stdout), drain(stderr));
  written?;
  let stdout = stdout?;
  let stderr = stderr?;

  let status = child.wait().await?;
  Ok(Exchange { status, stdout, stderr })
}

async fn write_all_and_close(mut stdin: ChildStdin, body: Bytes) -> io::Result<()> {
  match stdin.write_all(&body).await {
    Ok(()) => {}
    // The process may legitimately exit without consuming its input.
    Err(err) if err.kind() == io::ErrorKind::BrokenPipe => return Ok(()),
    Err(err) => return Err(err),
  }
  match stdin.shutdown().await {
    Err(err) if err.kind() != io::ErrorKind::BrokenPipe => Err(err),
    _ => Ok(()),
  }
}

async fn drain(mut pipe: impl AsyncRead + Unpin) -> io::Result<Vec<u8>> {
  let mut buf = Vec::new();
  pipe.read_to_end(&mut buf).await?;
  Ok(buf)
}
