//! Re-usable functions for integration tests.
use axum::body::Body;
use http::Response;
use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};
use tracing_subscriber::fmt::MakeWriter;

/// Consume the body and return it as a String.
pub async fn body_as_str(response: Response<Body>) -> String {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map(|b| String::from_utf8(b.to_vec()).unwrap())
        .unwrap()
}

/// Captures formatted log output so tests can assert on emitted events.
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Everything written so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }

    /// Number of captured lines containing `needle`.
    #[allow(dead_code)]
    pub fn count(&self, needle: &str) -> usize {
        self.contents()
            .lines()
            .filter(|line| line.contains(needle))
            .count()
    }

    /// Byte offset of the first occurrence of `needle`, for ordering checks.
    #[allow(dead_code)]
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.contents().find(needle)
    }

    /// The first captured line containing `needle`.
    #[allow(dead_code)]
    pub fn line_with(&self, needle: &str) -> Option<String> {
        self.contents()
            .lines()
            .find(|line| line.contains(needle))
            .map(str::to_owned)
    }

    /// A fmt subscriber writing into this capture.
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter(self.buf.clone())
    }
}

pub struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
