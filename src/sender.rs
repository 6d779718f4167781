//! The `Sender` contract and the local (file/stderr) variant.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Delivers a generated code to an address.
#[async_trait]
pub trait Sender: Send + Sync {
    /// Sends `code` to `address`.
    async fn send(&self, address: &str, code: &str) -> Result<()>;

    /// Releases resources held by this sender (e.g. closes a file
    /// handle). Safe to call more than once.
    async fn close(&self) -> Result<()>;
}

enum Sink {
    Stderr,
    File(File),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Sink::Stderr => std::io::stderr().write(buf),
            Sink::File(f) => f.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Sink::Stderr => std::io::stderr().flush(),
            Sink::File(f) => f.flush(),
        }
    }
}

/// Configuration for [`LocalSender`].
#[derive(Debug, Clone, Default)]
pub struct LocalSenderConfig {
    /// If set, codes are appended to this file instead of stderr.
    pub log_file: Option<String>,
}

/// Writes `"Send {code} to {address}\n"` to stderr, or to an append-mode
/// file when `LocalSenderConfig::log_file` is set.
///
/// Intended for local development and tests, not production delivery.
pub struct LocalSender {
    sink: Arc<Mutex<Sink>>,
}

impl LocalSender {
    /// Builds a `LocalSender` per `config`.
    ///
    /// Falls back to stderr if the configured log file cannot be opened.
    #[must_use]
    pub fn new(config: LocalSenderConfig) -> Self {
        let sink = match config.log_file {
            Some(path) => match OpenOptions::new()
                .create(true)
                .read(true)
                .append(true)
                .open(&path)
            {
                Ok(file) => Sink::File(file),
                Err(_) => Sink::Stderr,
            },
            None => Sink::Stderr,
        };

        Self {
            sink: Arc::new(Mutex::new(sink)),
        }
    }
}

impl Default for LocalSender {
    fn default() -> Self {
        Self::new(LocalSenderConfig::default())
    }
}

#[async_trait]
impl Sender for LocalSender {
    async fn send(&self, address: &str, code: &str) -> Result<()> {
        let sink = self.sink.clone();
        let line = format!("Send {code} to {address}\n");
        tokio::task::spawn_blocking(move || {
            let mut sink = sink.lock();
            sink.write_all(line.as_bytes())
        })
        .await
        .context("local sender task panicked")?
        .context("failed to write code to sink")
    }

    async fn close(&self) -> Result<()> {
        let sink = self.sink.clone();
        tokio::task::spawn_blocking(move || {
            let mut sink = sink.lock();
            sink.flush()
        })
        .await
        .context("local sender task panicked")?
        .context("failed to flush sink")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[tokio::test]
    async fn writes_code_then_address_in_that_order() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("dawn-cache-sender-test-{}", std::process::id()));
        let path_str = path.to_string_lossy().to_string();

        let sender = LocalSender::new(LocalSenderConfig {
            log_file: Some(path_str.clone()),
        });
        sender.send("alice@example.com", "123456").await.unwrap();
        sender.close().await.unwrap();

        let mut contents = String::new();
        File::open(&path).unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "Send 123456 to alice@example.com\n");

        let _ = std::fs::remove_file(&path);
    }
}
