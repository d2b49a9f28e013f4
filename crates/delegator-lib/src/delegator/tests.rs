//! Pipeline tests against scripted clusters

use super::*;
use crate::models::{Candidate, ClusterStatus, JobHistory, JobRecord, JobState, ServiceDescriptor};
use crate::strategy::DelegationStrategy;
use crate::telemetry::async_trait;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Clone)]
struct Cluster {
    status: ClusterStatus,
    history_delay: Duration,
    history: JobHistory,
    submit_status: u16,
}

#[derive(Default)]
struct ScriptedApi {
    clusters: HashMap<String, Cluster>,
    status_calls: AtomicUsize,
    history_calls: AtomicUsize,
    submissions: Mutex<Vec<String>>,
}

impl ScriptedApi {
    fn new(clusters: Vec<(&str, Cluster)>) -> Arc<Self> {
        Arc::new(Self {
            clusters: clusters
                .into_iter()
                .map(|(url, cluster)| (url.to_string(), cluster))
                .collect(),
            ..Self::default()
        })
    }

    fn cluster(&self, candidate: &Candidate) -> Result<Cluster> {
        self.clusters
            .get(&candidate.url)
            .cloned()
            .ok_or_else(|| DelegationError::Transport {
                endpoint: candidate.url.clone(),
                message: "connection refused".to_string(),
            })
    }

    fn submissions(&self) -> Vec<String> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClusterApi for ScriptedApi {
    async fn service(&self, candidate: &Candidate) -> Result<ServiceDescriptor> {
        self.cluster(candidate)?;
        Ok(ServiceDescriptor {
            cpu: 0.5,
            token: Some("svc-token".to_string()),
        })
    }

    async fn status(&self, candidate: &Candidate) -> Result<ClusterStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.cluster(candidate)?.status)
    }

    async fn job_history(&self, candidate: &Candidate) -> Result<JobHistory> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let cluster = self.cluster(candidate)?;
        tokio::time::sleep(cluster.history_delay).await;
        Ok(cluster.history)
    }

    async fn submit_job(&self, candidate: &Candidate, _token: &str, _payload: &[u8]) -> Result<u16> {
        self.submissions.lock().unwrap().push(candidate.url.clone());
        Ok(self.cluster(candidate)?.submit_status)
    }
}

fn status(nodes: u64, memory: f64, cpu_free: f64, cpu_max_free: f64) -> ClusterStatus {
    ClusterStatus {
        number_nodes: nodes,
        memory_free_total: memory,
        cpu_free_total: cpu_free,
        cpu_max_free,
        memory_max_free: None,
        nodes: Vec::new(),
    }
}

fn history(exec_secs: u32, pending: usize) -> JobHistory {
    let mut jobs = JobHistory::new();
    jobs.insert(
        "done".to_string(),
        JobRecord {
            status: JobState::Succeeded,
            creation_time: Some("2024-05-01T10:00:00Z".to_string()),
            start_time: None,
            finish_time: Some(format!("2024-05-01T10:{:02}:{:02}Z", exec_secs / 60, exec_secs % 60)),
        },
    );
    for i in 0..pending {
        jobs.insert(
            format!("pending-{i}"),
            JobRecord {
                status: JobState::Pending,
                creation_time: None,
                start_time: None,
                finish_time: None,
            },
        );
    }
    jobs
}

fn cluster(status: ClusterStatus, history_delay: Duration, history: JobHistory, submit_status: u16) -> Cluster {
    Cluster {
        status,
        history_delay,
        history,
        submit_status,
    }
}

fn config(urls: &[&str], strategy: DelegationStrategy) -> DelegationConfig {
    DelegationConfig::new(
        urls.iter()
            .map(|url| Candidate::new(*url, "svc").with_token("admin").with_cpu(0.5))
            .collect(),
        strategy,
    )
}

fn positions(plan: &DelegationPlan) -> Vec<usize> {
    plan.entries.iter().map(|e| e.position).collect()
}

/// fast, hung and slow clusters, in that configured order
fn fast_hung_slow(submit_status: u16) -> Arc<ScriptedApi> {
    ScriptedApi::new(vec![
        (
            "https://fast",
            cluster(
                status(10, 8000.0, 3000.0, 1000.0),
                Duration::from_millis(100),
                history(5, 2),
                submit_status,
            ),
        ),
        (
            "https://hung",
            cluster(
                status(4, 4000.0, 2000.0, 1000.0),
                Duration::from_secs(600),
                history(5, 0),
                submit_status,
            ),
        ),
        (
            "https://slow",
            cluster(
                status(2, 1000.0, 500.0, 500.0),
                Duration::from_secs(2),
                history(60, 20),
                submit_status,
            ),
        ),
    ])
}

#[test]
fn test_rejects_invalid_config() {
    let api = ScriptedApi::new(vec![]);
    let result = Delegator::new(DelegationConfig::default(), api);
    assert!(matches!(result, Err(DelegationError::InvalidConfig(_))));
}

#[tokio::test(start_paused = true)]
async fn test_topsis_prefers_fast_and_demotes_timed_out() {
    let api = fast_hung_slow(200);
    let delegator = Delegator::new(
        config(&["https://fast", "https://hung", "https://slow"], DelegationStrategy::Topsis),
        api.clone(),
    )
    .unwrap();

    for seed in 0..8 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let plan = delegator.plan(&mut rng).await.unwrap();

        assert_eq!(positions(&plan), vec![0, 2, 1]);
        assert_eq!(plan.entries[0].candidate.priority, Some(0));
        assert_eq!(plan.entries[2].candidate.priority, Some(100));
        assert!(plan.entries[2].metric_row().unwrap().is_sentinel());
    }
}

#[tokio::test(start_paused = true)]
async fn test_delegate_lands_on_best_candidate() {
    let api = fast_hung_slow(201);
    let delegator = Delegator::new(
        config(&["https://fast", "https://hung", "https://slow"], DelegationStrategy::Topsis),
        api.clone(),
    )
    .unwrap();
    let mut rng = SmallRng::seed_from_u64(7);

    let receipt = delegator.delegate(b"{\"image\":\"aGVsbG8=\"}", &mut rng).await.unwrap();

    assert_eq!(receipt.url, "https://fast");
    assert_eq!(receipt.status, 201);
    assert_eq!(api.submissions(), vec!["https://fast"]);
}

#[tokio::test]
async fn test_all_inadmissible_are_still_attempted() {
    let small = |submit| cluster(status(1, 512.0, 100.0, 100.0), Duration::ZERO, history(5, 0), submit);
    let api = ScriptedApi::new(vec![
        ("https://a", small(500)),
        ("https://b", small(500)),
        ("https://c", small(503)),
    ]);
    let delegator = Delegator::new(
        config(&["https://a", "https://b", "https://c"], DelegationStrategy::Topsis),
        api.clone(),
    )
    .unwrap();
    let mut rng = SmallRng::seed_from_u64(11);

    let plan = delegator.plan(&mut rng).await.unwrap();
    assert!(plan
        .entries
        .iter()
        .all(|e| e.metric_row().is_some_and(|row| row.is_sentinel())));
    assert_eq!(api.history_calls.load(Ordering::SeqCst), 0);

    let err = delegator.dispatch(&plan, b"{}").await.unwrap_err();
    match err {
        DelegationError::AllCandidatesExhausted { failures } => assert_eq!(failures.len(), 3),
        other => panic!("unexpected error: {other:?}"),
    }
    let mut attempted = api.submissions();
    attempted.sort();
    assert_eq!(attempted, vec!["https://a", "https://b", "https://c"]);
}

#[tokio::test]
async fn test_static_makes_no_telemetry_calls() {
    let ok = || cluster(status(1, 512.0, 100.0, 100.0), Duration::ZERO, JobHistory::new(), 200);
    let api = ScriptedApi::new(vec![("https://a", ok()), ("https://b", ok())]);
    let mut cfg = config(&["https://a", "https://b"], DelegationStrategy::Static);
    cfg.candidates[0].priority = Some(5);
    cfg.candidates[1].priority = Some(1);
    let delegator = Delegator::new(cfg, api.clone()).unwrap();
    let mut rng = SmallRng::seed_from_u64(0);

    let receipt = delegator.delegate(b"{}", &mut rng).await.unwrap();

    assert_eq!(receipt.url, "https://b");
    assert_eq!(api.status_calls.load(Ordering::SeqCst), 0);
    assert_eq!(api.history_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_load_based_maps_half_free_cpu_to_fifty() {
    let api = ScriptedApi::new(vec![
        ("https://half", cluster(status(2, 2048.0, 2000.0, 1000.0), Duration::ZERO, JobHistory::new(), 200)),
        ("https://full", cluster(status(2, 2048.0, 4000.0, 2000.0), Duration::ZERO, JobHistory::new(), 200)),
    ]);
    let delegator = Delegator::new(
        config(&["https://half", "https://full"], DelegationStrategy::LoadBased),
        api.clone(),
    )
    .unwrap();
    let mut rng = SmallRng::seed_from_u64(0);

    let plan = delegator.plan(&mut rng).await.unwrap();

    assert_eq!(positions(&plan), vec![1, 0]);
    assert_eq!(plan.entries[1].candidate.priority, Some(50));
    assert_eq!(api.history_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_random_puts_unreachable_last() {
    let ok = || cluster(status(2, 2048.0, 2000.0, 1000.0), Duration::ZERO, JobHistory::new(), 200);
    let api = ScriptedApi::new(vec![("https://a", ok()), ("https://c", ok())]);
    let delegator = Delegator::new(
        config(&["https://gone", "https://a", "https://c"], DelegationStrategy::Random),
        api,
    )
    .unwrap();

    for seed in 0..8 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let plan = delegator.plan(&mut rng).await.unwrap();
        let last = plan.entries.last().unwrap();
        assert_eq!(last.position, 0);
        assert_eq!(last.candidate.priority, Some(crate::models::NON_DELEGABLE_PRIORITY));
    }
}

#[tokio::test]
async fn test_status_report_covers_every_candidate() {
    let api = ScriptedApi::new(vec![(
        "https://a",
        cluster(status(2, 2048.0, 300.0, 300.0), Duration::ZERO, JobHistory::new(), 200),
    )]);
    let delegator = Delegator::new(config(&["https://a", "https://gone"], DelegationStrategy::Topsis), api.clone())
        .unwrap();

    let report = delegator.status_report().await;

    assert_eq!(report.len(), 2);
    assert!(matches!(report[0], TelemetryOutcome::Inadmissible { .. }));
    assert!(matches!(report[1], TelemetryOutcome::Unavailable(_)));
    assert_eq!(api.history_calls.load(Ordering::SeqCst), 0);
}
