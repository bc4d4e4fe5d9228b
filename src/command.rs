//! Outgoing forced-check commands.
//!
//! The monitoring system accepts external commands through its command
//! CGI; the only one issued here is "schedule a forced service check".
//! [`dispatch`] fans a batch of commands out concurrently and reports one
//! aggregated outcome - an individual failure never aborts its siblings,
//! and nothing here retries. Overlap protection (not re-dispatching a host
//! that is already in flight) is the caller's job.

use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Local;
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::data::ServiceRecord;

/// Command-type code for a forced service check.
const FORCED_SERVICE_CHECK: u32 = 7;

/// Command modifier that commits (rather than previews) the command.
const COMMIT: u32 = 2;

/// One forced-check command, addressed by the identifiers recovered from
/// the status document's links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckCommand {
    pub host: String,
    pub service: String,
    pub start_time: String,
}

impl CheckCommand {
    /// Build the command for one record. The document's link parameters
    /// are URL-encoded (`+` for spaces); they are decoded here so the
    /// command carries the identifiers verbatim.
    pub fn for_record(record: &ServiceRecord) -> Self {
        Self {
            host: decode_key(&record.host_key),
            service: decode_key(&record.service_key),
            start_time: Local::now().format("%d/%m/%Y, %H:%M:%S").to_string(),
        }
    }

    /// The full form field set the command endpoint expects.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("cmd_typ", FORCED_SERVICE_CHECK.to_string()),
            ("cmd_mod", COMMIT.to_string()),
            ("host", self.host.clone()),
            ("service", self.service.clone()),
            ("force_check", String::new()),
            ("start_time", self.start_time.clone()),
        ]
    }
}

/// Percent-decode a link parameter, treating `+` as space. Undecodable
/// input falls back to the space-substituted original.
fn decode_key(key: &str) -> String {
    let spaced = key.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// Transport for submitting commands; swappable so dispatch logic can be
/// exercised without a live endpoint.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    async fn submit(&self, command: &CheckCommand) -> Result<()>;
}

/// HTTP transport: form-encoded POST to the command CGI.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, command_path: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), command_path),
        }
    }
}

#[async_trait]
impl CommandTransport for HttpTransport {
    async fn submit(&self, command: &CheckCommand) -> Result<()> {
        let response = self.client.post(&self.endpoint).form(&command.form_fields()).send().await?;
        if !response.status().is_success() {
            bail!("command endpoint returned {}", response.status());
        }
        Ok(())
    }
}

/// Issue one forced check per record, all concurrently, and wait for every
/// one to settle. Returns true only if all succeeded; an empty batch is
/// vacuously successful.
pub async fn dispatch(transport: &dyn CommandTransport, records: &[ServiceRecord]) -> bool {
    if records.is_empty() {
        return true;
    }
    let commands: Vec<CheckCommand> = records.iter().map(CheckCommand::for_record).collect();
    debug!("dispatching {} forced checks", commands.len());

    let results = join_all(commands.iter().map(|c| transport.submit(c))).await;

    let mut all_ok = true;
    for (command, result) in commands.iter().zip(&results) {
        if let Err(e) = result {
            warn!("forced check for {}/{} failed: {e:#}", command.host, command.service);
            all_ok = false;
        }
    }
    all_ok
}

/// Outcome of one dispatched batch, keyed by the host it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub host_key: String,
    pub host: String,
    pub success: bool,
}

/// Bridges the synchronous UI loop to the async dispatcher: spawns each
/// batch onto the runtime and delivers outcomes through a channel the
/// loop drains on its next tick.
pub struct CheckDispatcher {
    transport: Arc<dyn CommandTransport>,
    handle: tokio::runtime::Handle,
    outcome_tx: mpsc::Sender<DispatchOutcome>,
    outcome_rx: mpsc::Receiver<DispatchOutcome>,
}

impl CheckDispatcher {
    pub fn new(transport: Arc<dyn CommandTransport>, handle: tokio::runtime::Handle) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::channel();
        Self {
            transport,
            handle,
            outcome_tx,
            outcome_rx,
        }
    }

    /// Fire a batch for one host's records. Returns immediately; the
    /// outcome arrives via [`CheckDispatcher::drain_outcomes`].
    pub fn dispatch_batch(&self, host_key: String, host: String, records: Vec<ServiceRecord>) {
        let transport = self.transport.clone();
        let tx = self.outcome_tx.clone();
        self.handle.spawn(async move {
            let success = dispatch(transport.as_ref(), &records).await;
            let _ = tx.send(DispatchOutcome {
                host_key,
                host,
                success,
            });
        });
    }

    /// All outcomes that have settled since the last drain.
    pub fn drain_outcomes(&self) -> Vec<DispatchOutcome> {
        self.outcome_rx.try_iter().collect()
    }
}

impl std::fmt::Debug for CheckDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckDispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn record(host: &str, service: &str) -> ServiceRecord {
        ServiceRecord {
            host: host.to_string(),
            host_title: String::new(),
            host_key: host.replace(' ', "+"),
            service: service.to_string(),
            service_key: service.replace(' ', "+"),
            status: crate::data::ServiceStatus::Ok,
            last_check: String::new(),
            duration: String::new(),
            attempt: String::new(),
            status_info: String::new(),
        }
    }

    /// Transport that records every submission and fails chosen services.
    struct RecordingTransport {
        attempts: AtomicUsize,
        seen: Mutex<Vec<String>>,
        fail_service: Option<String>,
    }

    impl RecordingTransport {
        fn new(fail_service: Option<&str>) -> Self {
            Self {
                attempts: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
                fail_service: fail_service.map(str::to_string),
            }
        }
    }

    #[async_trait]
    impl CommandTransport for RecordingTransport {
        async fn submit(&self, command: &CheckCommand) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(command.service.clone());
            if self.fail_service.as_deref() == Some(command.service.as_str()) {
                bail!("refused");
            }
            Ok(())
        }
    }

    #[test]
    fn command_decodes_link_parameters() {
        let rec = record("DC - Alpha", "CPU Load");
        let cmd = CheckCommand::for_record(&rec);
        assert_eq!(cmd.host, "DC - Alpha");
        assert_eq!(cmd.service, "CPU Load");
        // DD/MM/YYYY, HH:MM:SS
        assert_eq!(cmd.start_time.len(), 20);
        assert_eq!(&cmd.start_time[10..12], ", ");
    }

    #[test]
    fn command_decodes_percent_escapes() {
        let mut rec = record("h", "s");
        rec.host_key = "All%2BCustomers".to_string();
        rec.service_key = "SSL+%26+Certs".to_string();
        let cmd = CheckCommand::for_record(&rec);
        assert_eq!(cmd.host, "All+Customers");
        assert_eq!(cmd.service, "SSL & Certs");
    }

    #[test]
    fn form_fields_carry_the_full_command() {
        let cmd = CheckCommand::for_record(&record("h", "s"));
        let fields = cmd.form_fields();
        assert_eq!(fields[0], ("cmd_typ", "7".to_string()));
        assert_eq!(fields[1], ("cmd_mod", "2".to_string()));
        assert_eq!(fields[4], ("force_check", String::new()));
    }

    #[tokio::test]
    async fn dispatch_of_empty_batch_succeeds() {
        let transport = RecordingTransport::new(None);
        assert!(dispatch(&transport, &[]).await);
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dispatch_attempts_all_and_reports_any_failure() {
        let transport = RecordingTransport::new(Some("b"));
        let records = vec![record("h", "a"), record("h", "b"), record("h", "c")];
        let success = dispatch(&transport, &records).await;
        assert!(!success);
        // The failing sibling did not short-circuit the other two.
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 3);
        let mut seen = transport.seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn dispatch_succeeds_when_all_succeed() {
        let transport = RecordingTransport::new(None);
        let records = vec![record("h", "a"), record("h", "b")];
        assert!(dispatch(&transport, &records).await);
    }

    #[tokio::test]
    async fn dispatcher_delivers_outcomes_through_the_channel() {
        let transport = Arc::new(RecordingTransport::new(Some("bad")));
        let dispatcher = CheckDispatcher::new(transport, tokio::runtime::Handle::current());

        dispatcher.dispatch_batch("h1".into(), "host one".into(), vec![record("host one", "ok")]);
        dispatcher.dispatch_batch("h2".into(), "host two".into(), vec![record("host two", "bad")]);

        // Let the spawned batches settle.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let mut outcomes = dispatcher.drain_outcomes();
        outcomes.sort_by(|a, b| a.host_key.cmp(&b.host_key));
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert!(dispatcher.drain_outcomes().is_empty());
    }
}
