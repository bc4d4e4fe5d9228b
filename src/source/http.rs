//! HTTP data source.
//!
//! Fetches the status document from the monitoring endpoint on a fixed
//! interval. A background task owns the HTTP client and pushes document
//! bodies through a channel; the UI thread polls without blocking. The
//! interval is externally configured (90 seconds by default) and a manual
//! refresh can be requested at any time.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tracing::debug;

use super::DataSource;

/// A data source that periodically fetches the status endpoint.
///
/// Must be constructed inside a tokio runtime context; the fetch loop is
/// spawned onto it. Dropping the source stops the loop on its next cycle.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use nagwatch::source::HttpSource;
///
/// # tokio_test::block_on(async {
/// let source = HttpSource::spawn(
///     "http://monitor.example.net/nagios",
///     "/cgi-bin/status.cgi",
///     Duration::from_secs(90),
/// );
/// # });
/// ```
#[derive(Debug)]
pub struct HttpSource {
    receiver: mpsc::Receiver<String>,
    refresh_tx: mpsc::Sender<()>,
    description: String,
    last_error: Arc<Mutex<Option<String>>>,
}

impl HttpSource {
    /// Spawn the fetch loop for `base_url` + `status_path`.
    pub fn spawn(base_url: &str, status_path: &str, interval: Duration) -> Self {
        let url = format!("{}{}", base_url.trim_end_matches('/'), status_path);
        let description = format!("http: {}", base_url);
        let (tx, rx) = mpsc::channel(4);
        let (refresh_tx, mut refresh_rx) = mpsc::channel(1);
        let last_error = Arc::new(Mutex::new(None));
        let error_slot = last_error.clone();

        tokio::spawn(async move {
            let client = reqwest::Client::new();
            loop {
                match fetch_document(&client, &url).await {
                    Ok(body) => {
                        set_error(&error_slot, None);
                        debug!("fetched status document ({} bytes)", body.len());
                        if tx.send(body).await.is_err() {
                            // Receiver dropped; stop fetching.
                            break;
                        }
                    }
                    Err(e) => {
                        set_error(&error_slot, Some(format!("Fetch error: {e:#}")));
                    }
                }

                // Sleep out the interval, or wake early for a manual
                // refresh. A closed refresh channel means the source is
                // gone.
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    request = refresh_rx.recv() => {
                        if request.is_none() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            receiver: rx,
            refresh_tx,
            description,
            last_error,
        }
    }
}

async fn fetch_document(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client.get(url).header(reqwest::header::ACCEPT, "text/html").send().await?;
    if !response.status().is_success() {
        bail!("HTTP {}", response.status());
    }
    Ok(response.text().await?)
}

fn set_error(slot: &Mutex<Option<String>>, value: Option<String>) {
    if let Ok(mut guard) = slot.lock() {
        *guard = value;
    }
}

impl DataSource for HttpSource {
    fn poll(&mut self) -> Option<String> {
        match self.receiver.try_recv() {
            Ok(document) => Some(document),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                set_error(&self.last_error, Some("Fetch loop stopped".to_string()));
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|guard| guard.clone())
    }

    fn request_refresh(&mut self) {
        // A full channel already has a pending refresh; that is enough.
        let _ = self.refresh_tx.try_send(());
    }
}
