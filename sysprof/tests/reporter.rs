//! A full reporting pass with scripted probes.
mod common;

use common::{credentials, MockApi};
use serde_json::{json, Value};
use sysprof::report::{preview, Reporter, Routes};
use sysprof::{ApiError, ReportSession, Session};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sysprof_probe::{Probe, Reading};

/// Blocks its thread for `hold`, like the CPU sampling window does.
struct SlowProbe {
    hold: Duration,
}

impl Probe for SlowProbe {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn read(&mut self) -> Vec<Reading> {
        std::thread::sleep(self.hold);
        vec![Reading::new("mem_data", Some(json!({"percent": 5.0})))]
    }
}

struct ScriptedProbe {
    name: &'static str,
    readings: Vec<Reading>,
}

impl Probe for ScriptedProbe {
    fn name(&self) -> &'static str {
        self.name
    }

    fn read(&mut self) -> Vec<Reading> {
        self.readings.clone()
    }
}

fn probe(name: &'static str, readings: Vec<(&'static str, Option<Value>)>) -> Box<dyn Probe> {
    Box::new(ScriptedProbe {
        name,
        readings: readings
            .into_iter()
            .map(|(f, v)| Reading::new(f, v))
            .collect(),
    })
}

async fn registered(api: &MockApi) -> ReportSession {
    Session::new(api.client())
        .authenticate(&credentials())
        .await
        .unwrap()
        .register_report("host-1", "/api/report/new")
        .await
        .unwrap()
}

#[tokio::test]
async fn failed_cpu_probe_does_not_block_disk() {
    let api = MockApi::start().await;
    let report = registered(&api).await;
    let routes = Routes::default();
    let probes = vec![
        probe("cpu", vec![("cpu_data", None), ("process_data", None)]),
        probe(
            "disk",
            vec![("disk_data", Some(json!([{"mount_point": "/", "percent": 40.0}])))],
        ),
    ];

    let summary = Reporter::new(&report, &routes).run(probes).await;
    assert_eq!(summary.submitted(), 3);
    assert_eq!(summary.failed(), 0);
    assert!(summary.outcome("cpu_data").unwrap().snapshot_missing);

    let cpu = api.requests_to("/api/cpu/info");
    assert_eq!(cpu.len(), 1);
    assert_eq!(cpu[0].body["cpu_data"], Value::Null);

    let disk = api.requests_to("/api/disk/info");
    assert_eq!(disk.len(), 1);
    assert_eq!(disk[0].body["disk_data"][0]["mount_point"], "/");
    assert_eq!(disk[0].body["report_id"], "R123");
}

#[tokio::test]
async fn failed_submission_does_not_stop_the_run() {
    let api = MockApi::start().await;
    api.respond("/api/system/os", 500, r#"{"error":"db down"}"#);
    let report = registered(&api).await;
    let routes = Routes::default();
    let probes = vec![probe(
        "system",
        vec![
            ("os", Some(json!({"name": "Linux"}))),
            ("uptime", Some(json!("1:01:01"))),
            ("users", Some(json!([]))),
        ],
    )];

    let summary = Reporter::new(&report, &routes).run(probes).await;
    assert_eq!(summary.submitted(), 3);
    assert_eq!(summary.failed(), 1);
    let os = summary.outcome("os").unwrap();
    assert!(matches!(os.result, Err(ApiError::Status { status: 500, .. })));
    assert!(summary.outcome("uptime").unwrap().is_ok());
    assert!(summary.outcome("users").unwrap().is_ok());
    assert_eq!(api.requests_to("/api/system/users").len(), 1);
}

#[tokio::test]
async fn every_submission_carries_the_same_report_id() {
    let api = MockApi::start().await;
    let report = registered(&api).await;
    let routes = Routes::default();
    let probes = vec![
        probe("cpu", vec![("cpu_data", Some(json!({"CPU_1": 1.0}))), ("process_data", Some(json!([])))]),
        probe("memory", vec![("mem_data", Some(json!({"percent": 10.0})))]),
        probe("network", vec![("network_data", Some(json!({}))), ("ips", Some(json!({"interfaces": []})))]),
    ];
    Reporter::new(&report, &routes).run(probes).await;

    let subs: Vec<_> = api
        .requests()
        .into_iter()
        .filter(|r| r.path != "/authenticate" && r.path != "/api/report/new")
        .collect();
    assert_eq!(subs.len(), 5);
    let ids: Vec<_> = subs.iter().map(|r| r.body["report_id"].clone()).collect();
    assert!(ids.iter().all(|id| id == &ids[0]));
    assert_eq!(ids[0], "R123");
}

#[tokio::test]
async fn unrouted_readings_are_skipped() {
    let api = MockApi::start().await;
    let report = registered(&api).await;
    let mut routes = Routes::empty();
    routes.set("mem_data", "/custom/memory");
    let probes = vec![
        probe("memory", vec![("mem_data", Some(json!({"percent": 1.0})))]),
        probe("gpu", vec![("gpu_data", Some(json!({})))]),
    ];

    let summary = Reporter::new(&report, &routes).run(probes).await;
    assert_eq!(summary.submitted(), 1);
    assert_eq!(summary.skipped, vec!["gpu_data"]);
    assert_eq!(api.requests_to("/custom/memory").len(), 1);
}

#[test]
fn default_routes_cover_all_domains() {
    let routes = Routes::default();
    for (field, path) in [
        ("cpu_data", "/api/cpu/info"),
        ("process_data", "/api/cpu/processes"),
        ("disk_data", "/api/disk/info"),
        ("mem_data", "/api/memory/info"),
        ("network_data", "/api/network/info"),
        ("ips", "/api/network/ip"),
        ("os", "/api/system/os"),
        ("uptime", "/api/system/uptime"),
        ("users", "/api/system/users"),
    ] {
        assert_eq!(routes.path(field), Some(path), "{field}");
    }
}

#[tokio::test]
async fn preview_builds_envelopes_without_report_id() {
    let probes = vec![probe("memory", vec![("mem_data", None)])];
    let envs = preview(probes, "host-9").await;
    assert_eq!(envs.len(), 1);
    assert_eq!(envs[0].get("mem_data"), Some(&Value::Null));
    assert_eq!(envs[0].get("target"), Some(&json!("host-9")));
    assert_eq!(envs[0].get("report_id"), Some(&Value::Null));
}

#[tokio::test]
async fn blocking_probe_reads_leave_the_runtime_responsive() {
    let api = MockApi::start().await;
    let report = registered(&api).await;
    let routes = Routes::default();

    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = {
        let ticks = ticks.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(10)).await;
                ticks.fetch_add(1, Ordering::Relaxed);
            }
        })
    };

    let probes: Vec<Box<dyn Probe>> = vec![Box::new(SlowProbe {
        hold: Duration::from_millis(400),
    })];
    let summary = Reporter::new(&report, &routes).run(probes).await;
    ticker.abort();

    assert_eq!(summary.submitted(), 1);
    assert!(summary.outcome("mem_data").unwrap().is_ok());
    // current_thread runtime: the ticker only advances if the read ran elsewhere
    let seen = ticks.load(Ordering::Relaxed);
    assert!(seen >= 5, "runtime stalled during probe read, ticks = {seen}");
}
