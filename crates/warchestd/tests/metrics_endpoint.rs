//! End-to-end: poll results flow through the engine and show up on the
//! metrics endpoint.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;
use warchest_api::build_router;
use warchest_core::{CommandTemplates, EpochSnapshot, StakeMethod};
use warchest_engine::{CycleOutcome, DecisionEngine, EngineConfig};
use warchest_exec::{CommandError, CommandFuture, CommandRunner};
use warchest_metrics::Gauges;
use warchest_rpc::PollError;

struct ScriptedRunner {
    outputs: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl CommandRunner for ScriptedRunner {
    fn run<'a>(&'a self, command: &'a str) -> CommandFuture<'a> {
        self.calls.lock().unwrap().push(command.to_string());
        let output = self.outputs.get(command).cloned();
        Box::pin(async move {
            output.ok_or(CommandError::NonZeroExit {
                code: Some(1),
                stderr: "unscripted".to_string(),
            })
        })
    }
}

fn fixed(amount: u64) -> String {
    format!("{amount}{}", "0".repeat(24))
}

fn runner() -> Arc<ScriptedRunner> {
    let mut outputs = HashMap::new();
    for (cmd, out) in [
        ("current", "900".to_string()),
        ("next", "905".to_string()),
        ("expected", "900".to_string()),
        ("proposals pool.betanet", "| 1 | pool.betanet | 990 => 1,000 |".to_string()),
        ("staked pool.betanet alice", fixed(60)),
        ("staked pool.betanet bob", fixed(200)),
        ("unstaked pool.betanet alice", fixed(5)),
        ("unstaked pool.betanet bob", fixed(7)),
    ] {
        outputs.insert(cmd.to_string(), out);
    }
    outputs.insert(
        format!("stake pool.betanet unstake {} bob", fixed(90)),
        "ok".to_string(),
    );
    Arc::new(ScriptedRunner {
        outputs,
        calls: Mutex::new(Vec::new()),
    })
}

fn engine(runner: Arc<ScriptedRunner>, gauges: Arc<Gauges>) -> DecisionEngine {
    let config = EngineConfig {
        pool_id: "pool.betanet".into(),
        delegator_ids: vec!["alice".into(), "bob".into()],
        safety_margin: 10,
        ratio_tolerance: 0.001,
        ping_sentinel: 100_000,
    };
    let commands = CommandTemplates {
        current_seat_price: "current".into(),
        next_seat_price: "next".into(),
        expected_seat_price: "expected".into(),
        proposals: "proposals %s".into(),
        staked_balance: "staked %s %s".into(),
        unstaked_balance: "unstaked %s %s".into(),
        stake: "stake %s %s %s %s".into(),
        ping: "ping %s %s".into(),
    };
    DecisionEngine::new(config, runner, commands, gauges)
}

fn snapshot() -> EpochSnapshot {
    EpochSnapshot {
        latest_block_height: 100_400,
        epoch_start_height: 100_000,
        epoch_length: 10_000,
        current_stake: 1_000,
        next_stake: 1_000,
        expected_stake: 1_000,
        kicked_out: false,
        threshold: Some(99.0),
    }
}

async fn scrape(gauges: Arc<Gauges>) -> String {
    let router = build_router(gauges);
    let req = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn unstake_cycle_is_visible_on_metrics() {
    let gauges = Arc::new(Gauges::new());
    let runner = runner();
    let engine = engine(runner.clone(), gauges.clone());

    let outcome = engine.cycle(Ok(snapshot())).await;
    assert_eq!(
        outcome,
        CycleOutcome::Executed {
            method: StakeMethod::Unstake,
            planned: 1,
            completed: 1,
        }
    );

    let body = scrape(gauges).await;
    assert!(body.contains("warchest_left_blocks 9600\n"), "{body}");
    assert!(body.contains("warchest_restake 90\n"), "{body}");
    assert!(body.contains("warchest_expected_stake 1000\n"), "{body}");
    assert!(body.contains("warchest_next_seat_price 905\n"), "{body}");
    assert!(body.contains("warchest_expected_seat_price 900\n"), "{body}");
    assert!(body.contains("warchest_threshold 99\n"), "{body}");
    assert!(body.contains("warchest_delegator_staked_balance 260\n"), "{body}");
    assert!(body.contains("warchest_delegator_unstaked_balance 12\n"), "{body}");
    assert!(body.contains("warchest_rpc_success_total 1\n"), "{body}");
}

#[tokio::test]
async fn dropped_tick_leaves_metrics_untouched() {
    let gauges = Arc::new(Gauges::new());
    let runner = runner();
    let engine = engine(runner.clone(), gauges.clone());

    let outcome = engine
        .cycle(Err(PollError::Transport {
            method: "status",
            message: "connection refused".into(),
        }))
        .await;
    assert_eq!(outcome, CycleOutcome::Dropped);
    assert!(runner.calls.lock().unwrap().is_empty());

    let body = scrape(gauges).await;
    for line in body.lines().filter(|l| !l.starts_with('#')) {
        assert!(line.ends_with(" 0"), "gauge written on a dropped tick: {line}");
    }
}

#[tokio::test]
async fn healthz_responds_ok() {
    let router = build_router(Arc::new(Gauges::new()));
    let req = Request::builder()
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let router = build_router(Arc::new(Gauges::new()));
    let req = Request::builder()
        .uri("/api/v1/deployments")
        .body(Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
