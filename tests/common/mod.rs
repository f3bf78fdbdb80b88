#![allow(dead_code)]

use std::{collections::HashMap, io, sync::Mutex, time::Duration};

use async_trait::async_trait;
use filmow_export::{FetchError, Fetcher};

#[derive(Debug, Clone)]
enum Outcome {
    Body(String),
    Status(u16),
    Unreachable,
}

#[derive(Debug, Clone)]
struct Script {
    failures_left: usize,
    outcome: Outcome,
}

/// Offline fetcher answering from a fixed script
///
/// Unknown URLs answer with a 404 status.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(self, url: &str, failures_left: usize, outcome: Outcome) -> Self {
        self.scripts.lock().unwrap().insert(
            url.to_string(),
            Script {
                failures_left,
                outcome,
            },
        );
        self
    }

    pub fn page(self, url: &str, body: &str) -> Self {
        self.script(url, 0, Outcome::Body(body.to_string()))
    }

    /// Fails with a transport error `failures` times, then serves `body`
    pub fn flaky(self, url: &str, failures: usize, body: &str) -> Self {
        self.script(url, failures, Outcome::Body(body.to_string()))
    }

    pub fn status(self, url: &str, status: u16) -> Self {
        self.script(url, 0, Outcome::Status(status))
    }

    pub fn unreachable(self, url: &str) -> Self {
        self.script(url, 0, Outcome::Unreachable)
    }

    /// Sleep before every answer
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of requests made for `url`
    pub fn calls(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|called| called.as_str() == url)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    async fn answer(&self, url: &str) -> Result<Outcome, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut scripts = self.scripts.lock().unwrap();
        let Some(script) = scripts.get_mut(url) else {
            return Ok(Outcome::Status(404));
        };
        if script.failures_left > 0 {
            script.failures_left -= 1;
            return Err(FetchError::transport(
                url,
                io::Error::new(io::ErrorKind::TimedOut, "timed out"),
            ));
        }
        Ok(script.outcome.clone())
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
        match self.answer(url).await? {
            Outcome::Body(body) => Ok(body),
            Outcome::Status(status) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            Outcome::Unreachable => Err(FetchError::transport(
                url,
                io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            )),
        }
    }

    async fn head(&self, url: &str, _timeout: Duration) -> Result<u16, FetchError> {
        match self.answer(url).await? {
            Outcome::Body(_) => Ok(200),
            Outcome::Status(status) => Ok(status),
            Outcome::Unreachable => Err(FetchError::transport(
                url,
                io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            )),
        }
    }
}
