/// Utility functions for formatting and external process invocation
use std::process::Stdio;
use time::{format_description, OffsetDateTime};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use crate::error::{MonitorError, Result};

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    match format_description::parse("[day].[month].[year] - [hour]:[minute]:[second]") {
        Ok(format) => dt.format(&format).unwrap_or_else(|_| dt.to_string()),
        Err(_) => dt.to_string(),
    }
}

/// Round to a fixed number of decimal places for storage and display
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Run an external command and return its stdout.
///
/// `stdin` is written and closed before waiting. A non-zero exit status,
/// or no exit within `limit` (input included), is an error; the child is
/// killed on timeout.
pub async fn run_command(
    command: &[String],
    stdin: Option<&[u8]>,
    limit: Duration,
    what: &'static str,
) -> Result<String> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| MonitorError::Config(format!("empty command for {}", what)))?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let input_pipe = child.stdin.take();
    let finished = async move {
        if let (Some(input), Some(mut pipe)) = (stdin, input_pipe) {
            // The child may exit without reading its input
            match pipe.write_all(input).await {
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e.into()),
                _ => {}
            }
        }
        child.wait_with_output().await.map_err(MonitorError::from)
    };

    let output = timeout(limit, finished)
        .await
        .map_err(|_| MonitorError::Timeout {
            what,
            secs: limit.as_secs(),
        })??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MonitorError::CommandFailed {
            command: command.join(" "),
            status: format!("{} {}", output.status, stderr.trim()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
