//! JSON-lines metric input.

use std::path::{Path, PathBuf};

use contracts::Metric;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{CliError, Result};

/// Where metrics are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Standard input
    Stdin,
    /// A JSON-lines file
    File(PathBuf),
}

impl InputSource {
    /// `-` selects stdin, anything else is a file path
    pub fn from_arg(arg: &Path) -> Self {
        if arg == Path::new("-") {
            Self::Stdin
        } else {
            Self::File(arg.to_path_buf())
        }
    }

    /// Display name for logs and errors
    pub fn describe(&self) -> String {
        match self {
            Self::Stdin => "<stdin>".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }

    pub(crate) async fn open(&self) -> Result<Box<dyn AsyncRead + Unpin + Send>> {
        match self {
            Self::Stdin => Ok(Box::new(tokio::io::stdin())),
            Self::File(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .map_err(|e| CliError::input(self.describe(), e))?;
                Ok(Box::new(file))
            }
        }
    }
}

/// Counters for one input run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputStats {
    pub lines_read: u64,
    pub metrics_accepted: u64,
    pub lines_rejected: u64,
}

/// Read JSON-lines metrics from `reader` and send them to `tx`
///
/// Blank lines are skipped, malformed lines (including invalid UTF-8) are
/// logged and counted. Only I/O errors end the stream early.
/// Stops at end of input, when `cancel` fires, or when the receiver is gone.
pub(crate) async fn forward_metrics<R>(
    reader: R,
    tx: mpsc::Sender<Metric>,
    cancel: CancellationToken,
) -> std::io::Result<InputStats>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut stats = InputStats::default();

    loop {
        buf.clear();
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Input cancelled");
                break;
            }
            read = reader.read_until(b'\n', &mut buf) => read?,
        };
        if read == 0 {
            break;
        }

        stats.lines_read += 1;
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                stats.lines_rejected += 1;
                warn!(line = stats.lines_read, error = %e, "Skipping non UTF-8 line");
                continue;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<Metric>(trimmed) {
            Ok(metric) => {
                if tx.send(metric).await.is_err() {
                    warn!("Outputs stopped before input was exhausted");
                    break;
                }
                stats.metrics_accepted += 1;
            }
            Err(e) => {
                stats.lines_rejected += 1;
                warn!(line = stats.lines_read, error = %e, "Skipping malformed metric");
            }
        }
    }

    Ok(stats)
}
