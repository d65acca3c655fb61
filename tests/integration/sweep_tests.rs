//! Integration tests for the sweep loop
//!
//! These tests drive the orchestrator end-to-end with a fake VPN client and a
//! scripted content source, and check the results file and the rotation
//! state file the run leaves behind.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use vpn_sweep::config::ExtractConfig;
use vpn_sweep::crawler::{
    BlockDetector, ContentFetcher, FetchError, FetchedPage, Located, Orchestrator,
    ProfileExtractor, RunSummary, WorkProcessor,
};
use vpn_sweep::egress::{EgressCommand, EgressController, EgressError, EgressSettings, ProcessOutput};
use vpn_sweep::input::WorkItem;
use vpn_sweep::output::{CsvSink, ExtractionResult, OutputError, OutputResult, ResultSink};
use vpn_sweep::state::RotationStateStore;
use vpn_sweep::{ConfigError, Identity, IdentityPool, SweepError};

const BLOCK_PAGE: &str = "https://registry.example/registracija";

/// Fake VPN client: records every call and refuses the named identities
#[derive(Clone, Default)]
struct FakeVpn {
    refused: Arc<HashSet<String>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeVpn {
    fn refusing(names: &[&str]) -> Self {
        Self {
            refused: Arc::new(names.iter().map(|s| s.to_string()).collect()),
            calls: Arc::default(),
        }
    }

    fn connects(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| c.strip_prefix("connect ").map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl EgressCommand for FakeVpn {
    async fn disconnect(&self) -> Result<ProcessOutput, EgressError> {
        self.calls.lock().unwrap().push("disconnect".to_string());
        Ok(ProcessOutput::new(0, "You are disconnected from NordVPN."))
    }

    async fn connect(&self, identity: &Identity) -> Result<ProcessOutput, EgressError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("connect {}", identity));
        if self.refused.contains(identity.name()) {
            Ok(ProcessOutput::new(1, "Whoops! Connection failed."))
        } else {
            Ok(ProcessOutput::new(0, format!("You are connected to {}", identity)))
        }
    }
}

/// Content source that serves a profile per key, with scripted blocks
#[derive(Default)]
struct ScriptedSite {
    /// Keys whose next search lands on the block page (consumed on use)
    block_once: Mutex<HashSet<String>>,
    /// Keys that are blocked every time
    block_always: HashSet<String>,
    /// Keys with no search hit
    unknown: HashSet<String>,
    /// Key whose search hangs after cancelling the token
    cancel_on: Option<(String, CancellationToken)>,
}

impl ScriptedSite {
    fn block_once(self, key: &str) -> Self {
        self.block_once.lock().unwrap().insert(key.to_string());
        self
    }
}

#[async_trait]
impl ContentFetcher for ScriptedSite {
    async fn locate(&self, key: &str) -> Result<Located, FetchError> {
        if let Some((cancel_key, token)) = &self.cancel_on {
            if cancel_key == key {
                token.cancel();
                std::future::pending::<()>().await;
            }
        }

        if self.block_always.contains(key) || self.block_once.lock().unwrap().remove(key) {
            return Ok(Located {
                landed_at: BLOCK_PAGE.to_string(),
                status: 200,
                target: None,
            });
        }

        Ok(Located {
            landed_at: format!("https://registry.example/pretraga?n={}", key),
            status: 200,
            target: (!self.unknown.contains(key))
                .then(|| format!("https://registry.example/firma/{}", key)),
        })
    }

    async fn fetch(&self, location: &str) -> Result<FetchedPage, FetchError> {
        let key = location.rsplit('/').next().unwrap_or_default();
        Ok(FetchedPage {
            final_url: location.to_string(),
            status: 200,
            body: format!(
                "<html><body><h1>Firma {}</h1><p>Email: kontakt{}@firma.me</p></body></html>",
                key, key
            ),
        })
    }
}

struct Harness {
    dir: TempDir,
    vpn: FakeVpn,
}

impl Harness {
    fn new(vpn: FakeVpn) -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            vpn,
        }
    }

    fn state_path(&self) -> PathBuf {
        self.dir.path().join("vpn_state.json")
    }

    fn results_path(&self) -> PathBuf {
        self.dir.path().join("results.csv")
    }

    fn orchestrator(&self, identities: &[&str], site: ScriptedSite) -> Orchestrator {
        self.orchestrator_with_sink(
            identities,
            site,
            Box::new(CsvSink::new(self.results_path())),
        )
    }

    fn orchestrator_with_sink(
        &self,
        identities: &[&str],
        site: ScriptedSite,
        sink: Box<dyn ResultSink>,
    ) -> Orchestrator {
        let pool = Arc::new(IdentityPool::from_names(identities.iter().copied()));
        let store = RotationStateStore::new(self.state_path(), pool);
        let controller = EgressController::new(
            Box::new(self.vpn.clone()),
            store,
            EgressSettings::immediate(),
        );
        let processor = WorkProcessor::new(
            Box::new(site),
            Box::new(ProfileExtractor::new(&ExtractConfig::default()).unwrap()),
            BlockDetector::new(vec!["registracija".to_string()], vec![]),
        );
        Orchestrator::new(controller, processor, sink)
    }

    fn rows(&self) -> Vec<ExtractionResult> {
        CsvSink::new(self.results_path()).read_all().unwrap()
    }

    fn state_json(&self) -> serde_json::Value {
        read_json(&self.state_path())
    }
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// Sink that accepts a fixed number of rows, then fails every write
struct FailingSink {
    accepted: Arc<Mutex<Vec<String>>>,
    capacity: usize,
}

impl ResultSink for FailingSink {
    fn append(&mut self, result: &ExtractionResult) -> OutputResult<()> {
        let mut accepted = self.accepted.lock().unwrap();
        if accepted.len() >= self.capacity {
            return Err(OutputError::Io {
                path: "results.csv".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        accepted.push(result.key.clone());
        Ok(())
    }
}

fn items(keys: &[&str]) -> Vec<WorkItem> {
    keys.iter().map(|k| WorkItem::new(*k)).collect()
}

#[tokio::test]
async fn test_rotation_cadence_walks_catalog() {
    let harness = Harness::new(FakeVpn::default());
    let mut orchestrator = harness.orchestrator(&["A", "B", "C"], ScriptedSite::default());

    let summary = orchestrator
        .run(&items(&["1", "2", "3", "4", "5"]), 2)
        .await
        .unwrap();

    assert_eq!(harness.vpn.connects(), vec!["A", "B", "C"]);
    assert_eq!(summary.processed, 5);
    assert_eq!(summary.with_data, 5);
    assert_eq!(summary.scheduled_rotations, 2);
    assert_eq!(summary.forced_rotations, 0);

    let state = harness.state_json();
    assert_eq!(state["currentIndex"], 2);
    assert_eq!(state["usedServers"], serde_json::json!(["A", "B", "C"]));
    assert_eq!(state["totalServers"], 3);

    let rows = harness.rows();
    let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["1", "2", "3", "4", "5"]);
    assert_eq!(rows[2].fields.name, "Firma 3");
    assert_eq!(rows[2].fields.contact_email, "kontakt3@firma.me");
}

#[tokio::test]
async fn test_resumes_from_saved_state() {
    let harness = Harness::new(FakeVpn::default());
    std::fs::write(
        harness.state_path(),
        r#"{"currentIndex": 1, "usedServers": ["A", "B"], "lastUpdated": "2024-01-01 00:00:00", "totalServers": 3}"#,
    )
    .unwrap();
    let mut orchestrator = harness.orchestrator(&["A", "B", "C"], ScriptedSite::default());

    orchestrator.run(&items(&["1", "2", "3"]), 2).await.unwrap();

    // Starts on B, then C finishes the cycle
    assert_eq!(harness.vpn.connects(), vec!["B", "C"]);
    let state = harness.state_json();
    assert_eq!(state["currentIndex"], 2);
    assert_eq!(state["usedServers"], serde_json::json!(["A", "B", "C"]));
}

#[tokio::test]
async fn test_block_forces_rotation_and_one_retry() {
    let harness = Harness::new(FakeVpn::default());
    let site = ScriptedSite::default().block_once("2");
    let mut orchestrator = harness.orchestrator(&["A", "B", "C"], site);

    let summary = orchestrator.run(&items(&["1", "2", "3"]), 10).await.unwrap();

    assert_eq!(summary.blocks, 1);
    assert_eq!(summary.forced_rotations, 1);
    assert_eq!(summary.scheduled_rotations, 0);
    assert_eq!(harness.vpn.connects(), vec!["A", "B"]);

    let rows = harness.rows();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].key, "2");
    assert_eq!(rows[1].fields.name, "Firma 2");
}

#[tokio::test]
async fn test_second_block_records_empty_row() {
    let harness = Harness::new(FakeVpn::default());
    let site = ScriptedSite {
        block_always: ["2".to_string()].into_iter().collect(),
        ..ScriptedSite::default()
    };
    let mut orchestrator = harness.orchestrator(&["A", "B", "C"], site);

    let summary = orchestrator.run(&items(&["1", "2", "3"]), 10).await.unwrap();

    assert_eq!(summary.blocks, 2);
    assert_eq!(summary.forced_rotations, 1);
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.with_data, 2);

    let rows = harness.rows();
    assert_eq!(rows[1], ExtractionResult::empty("2"));
}

#[tokio::test]
async fn test_failed_forced_rotation_continues_on_current_identity() {
    let harness = Harness::new(FakeVpn::refusing(&["B"]));
    let site = ScriptedSite::default().block_once("1");
    let mut orchestrator = harness.orchestrator(&["A", "B"], site);

    let summary = orchestrator.run(&items(&["1", "2"]), 10).await.unwrap();

    assert_eq!(summary.rotation_failures, 1);
    assert_eq!(summary.forced_rotations, 0);
    assert_eq!(summary.processed, 2);
    assert_eq!(harness.rows()[0].fields.name, "Firma 1");

    // B was tried three times, state still points at A
    assert_eq!(harness.vpn.connects(), vec!["A", "B", "B", "B"]);
    let state = harness.state_json();
    assert_eq!(state["currentIndex"], 0);
    assert_eq!(state["usedServers"], serde_json::json!(["A"]));
}

#[tokio::test]
async fn test_unknown_key_gives_empty_row() {
    let harness = Harness::new(FakeVpn::default());
    let site = ScriptedSite {
        unknown: ["404".to_string()].into_iter().collect(),
        ..ScriptedSite::default()
    };
    let mut orchestrator = harness.orchestrator(&["A"], site);

    let summary = orchestrator.run(&items(&["404", "1"]), 5).await.unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.with_data, 1);
    assert!(!harness.rows()[0].has_data());
}

#[tokio::test]
async fn test_empty_catalog_is_a_configuration_error() {
    let harness = Harness::new(FakeVpn::default());
    let mut orchestrator = harness.orchestrator(&[], ScriptedSite::default());

    let result = orchestrator.run(&items(&["1", "2"]), 2).await;

    let err = result.unwrap_err();
    assert!(matches!(err, SweepError::Config(ConfigError::EmptyCatalog)));
    assert_eq!(err.exit_code(), 2);
    assert!(harness.vpn.connects().is_empty());
    assert!(!harness.results_path().exists());
}

#[tokio::test]
async fn test_zero_cadence_is_a_configuration_error() {
    let harness = Harness::new(FakeVpn::default());
    let mut orchestrator = harness.orchestrator(&["A"], ScriptedSite::default());

    let result = orchestrator.run(&items(&["1"]), 0).await;
    assert!(matches!(result, Err(SweepError::Config(_))));
    assert!(harness.vpn.connects().is_empty());
}

#[tokio::test]
async fn test_initial_connection_failure_is_fatal() {
    let harness = Harness::new(FakeVpn::refusing(&["A"]));
    let mut orchestrator = harness.orchestrator(&["A", "B"], ScriptedSite::default());

    let result = orchestrator.run(&items(&["1"]), 2).await;

    let err = result.unwrap_err();
    assert!(matches!(err, SweepError::Initialization(_)));
    assert_eq!(err.exit_code(), 3);
    assert!(!harness.results_path().exists());
    assert!(!harness.state_path().exists());
}

#[tokio::test]
async fn test_cancellation_drops_in_flight_item() {
    let harness = Harness::new(FakeVpn::default());
    let token = CancellationToken::new();
    let site = ScriptedSite {
        cancel_on: Some(("2".to_string(), token.clone())),
        ..ScriptedSite::default()
    };
    let mut orchestrator = harness
        .orchestrator(&["A", "B"], site)
        .with_cancellation(token);

    let summary = orchestrator.run(&items(&["1", "2", "3"]), 10).await.unwrap();

    assert_eq!(
        summary,
        RunSummary {
            processed: 1,
            with_data: 1,
            cancelled: true,
            ..RunSummary::default()
        }
    );
    let rows = harness.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].key, "1");

    // The egress path is still released
    let calls = harness.vpn.calls.lock().unwrap().clone();
    assert_eq!(calls.last().map(String::as_str), Some("disconnect"));
}

#[tokio::test]
async fn test_rerun_appends_without_rewriting_rows() {
    let harness = Harness::new(FakeVpn::default());

    harness
        .orchestrator(&["A", "B"], ScriptedSite::default())
        .run(&items(&["1", "2"]), 5)
        .await
        .unwrap();
    harness
        .orchestrator(&["A", "B"], ScriptedSite::default())
        .run(&items(&["3"]), 5)
        .await
        .unwrap();

    let content = std::fs::read_to_string(harness.results_path()).unwrap();
    assert_eq!(content.matches("key,name").count(), 1);

    let keys: Vec<String> = harness.rows().into_iter().map(|r| r.key).collect();
    assert_eq!(keys, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_failed_result_write_is_fatal_and_releases_egress() {
    let harness = Harness::new(FakeVpn::default());
    let accepted = Arc::new(Mutex::new(Vec::new()));
    let sink = FailingSink {
        accepted: accepted.clone(),
        capacity: 1,
    };
    let mut orchestrator =
        harness.orchestrator_with_sink(&["A", "B"], ScriptedSite::default(), Box::new(sink));

    let result = orchestrator.run(&items(&["1", "2", "3"]), 10).await;

    let err = result.unwrap_err();
    assert!(matches!(err, SweepError::Output(_)));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(*accepted.lock().unwrap(), vec!["1"]);

    let calls = harness.vpn.calls.lock().unwrap().clone();
    assert_eq!(calls.last().map(String::as_str), Some("disconnect"));
}
