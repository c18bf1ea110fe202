//! End-to-end tests: audit log on disk -> runner -> registry -> HTTP.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use audit_exporter::{Lifecycle, MetricsServer, SourceRunner, SourceSpec};
use audit_metrics::{ExporterRegistry, PodDeletedLabels};
use audit_tail::TailerConfig;
use audit_types::Target;
use serde_json::json;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const T0: &str = "2024-03-01T10:00:00.000000Z";
const T5: &str = "2024-03-01T10:00:05.000000Z";
const T9: &str = "2024-03-01T10:00:09.000000Z";

fn append(path: &Path, events: &[serde_json::Value]) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    for event in events {
        writeln!(file, "{event}").unwrap();
    }
}

fn pod_create() -> serde_json::Value {
    json!({
        "kind": "Event",
        "apiVersion": "audit.k8s.io/v1",
        "level": "RequestResponse",
        "auditID": "a1",
        "stage": "ResponseComplete",
        "requestURI": "/api/v1/namespaces/default/pods",
        "verb": "create",
        "userAgent": "kubectl/v1.29.0 (linux/amd64) kubernetes/abcdef",
        "objectRef": {"resource": "pods", "namespace": "default", "apiVersion": "v1"},
        "responseStatus": {"metadata": {}, "code": 201},
        "responseObject": {
            "kind": "Pod",
            "metadata": {"name": "web-0", "namespace": "default", "uid": "u1", "creationTimestamp": "2024-03-01T09:59:58Z"},
            "spec": {"containers": [{"name": "web", "image": "nginx"}]},
            "status": {"phase": "Pending"}
        },
        "requestReceivedTimestamp": T0,
        "stageTimestamp": T0
    })
}

fn pod_binding() -> serde_json::Value {
    json!({
        "kind": "Event",
        "apiVersion": "audit.k8s.io/v1",
        "level": "Metadata",
        "auditID": "a2",
        "stage": "ResponseComplete",
        "requestURI": "/api/v1/namespaces/default/pods/web-0/binding",
        "verb": "create",
        "userAgent": "kube-scheduler/v1.29.0 (linux/amd64) kubernetes/abcdef/scheduler",
        "objectRef": {"resource": "pods", "namespace": "default", "name": "web-0", "apiVersion": "v1", "subresource": "binding"},
        "responseStatus": {"metadata": {}, "status": "Success", "code": 201},
        "requestReceivedTimestamp": T5,
        "stageTimestamp": T5
    })
}

fn pod_delete() -> serde_json::Value {
    json!({
        "kind": "Event",
        "apiVersion": "audit.k8s.io/v1",
        "level": "RequestResponse",
        "auditID": "a3",
        "stage": "ResponseComplete",
        "requestURI": "/api/v1/namespaces/default/pods/web-0",
        "verb": "delete",
        "userAgent": "kubectl/v1.29.0 (linux/amd64) kubernetes/abcdef",
        "objectRef": {"resource": "pods", "namespace": "default", "name": "web-0", "apiVersion": "v1"},
        "responseStatus": {"metadata": {}, "code": 200},
        "responseObject": {
            "kind": "Pod",
            "metadata": {"name": "web-0", "namespace": "default", "uid": "u1"},
            "spec": {"nodeName": "node-1"},
            "status": {"phase": "Succeeded"}
        },
        "requestReceivedTimestamp": T9,
        "stageTimestamp": T9
    })
}

fn runner(path: &Path, cluster: &str, registry: &ExporterRegistry) -> SourceRunner<ExporterRegistry> {
    SourceRunner::new(
        SourceSpec::new(path, cluster),
        TailerConfig::new(),
        false,
        registry.clone(),
    )
}

#[test]
fn pod_lifecycle_produces_metrics() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.log");
    let registry = ExporterRegistry::new();
    let mut runner = runner(&path, "prod", &registry);

    append(&path, &[pod_create(), pod_binding(), pod_delete()]);
    let report = runner.cycle().unwrap();
    assert_eq!(report.records, 3);

    let output = registry.encode().unwrap();
    assert!(output.contains(
        "pod_scheduling_latency_seconds_count{cluster=\"prod\",namespace=\"default\",user=\"kube-scheduler\"} 1"
    ));
    assert!(output.contains(
        "pod_scheduling_latency_seconds_sum{cluster=\"prod\",namespace=\"default\",user=\"kube-scheduler\"} 5.0"
    ));
    assert_eq!(
        registry.metrics().get_pod_deleted(&PodDeletedLabels {
            cluster: "prod".to_string(),
            namespace: "default".to_string(),
            user: "kubectl".to_string(),
            phase: "Succeeded".to_string(),
        }),
        1
    );
    assert!(output.contains(
        "api_requests_total{cluster=\"prod\",namespace=\"default\",user=\"kube-scheduler\",verb=\"create\",resource=\"pods/binding\",code=\"201\"} 1"
    ));

    assert_eq!(runner.engine().state().pod(&Target::new("web-0", "default")), None);
}

#[test]
fn events_split_across_cycles() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.log");
    let registry = ExporterRegistry::new();
    let mut runner = runner(&path, "prod", &registry);

    append(&path, &[pod_create()]);
    runner.cycle().unwrap();
    assert!(matches!(
        runner.engine().state().pod(&Target::new("web-0", "default")),
        Some(Lifecycle::Pending(_))
    ));

    // Binding line lands in two writes.
    let binding = pod_binding().to_string();
    let (head, tail) = binding.split_at(binding.len() / 2);
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(head.as_bytes()).unwrap();
    }
    assert_eq!(runner.cycle().unwrap().records, 0);
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{tail}").unwrap();
    }
    assert_eq!(runner.cycle().unwrap().records, 1);

    assert_eq!(
        runner.engine().state().pod(&Target::new("web-0", "default")),
        Some(Lifecycle::Resolved)
    );
    let output = registry.encode().unwrap();
    assert!(output.contains("pod_scheduling_latency_seconds_sum{cluster=\"prod\",namespace=\"default\",user=\"kube-scheduler\"} 5.0"));
}

#[test]
fn clusters_are_isolated() {
    let dir = TempDir::new().unwrap();
    let east_path = dir.path().join("east.log");
    let west_path = dir.path().join("west.log");
    let registry = ExporterRegistry::new();
    let mut east = runner(&east_path, "east", &registry);
    let mut west = runner(&west_path, "west", &registry);

    append(&east_path, &[pod_create(), pod_binding()]);
    append(&west_path, &[pod_binding()]);
    east.cycle().unwrap();
    west.cycle().unwrap();

    let output = registry.encode().unwrap();
    assert!(output.contains(
        "pod_scheduling_latency_seconds_sum{cluster=\"east\",namespace=\"default\",user=\"kube-scheduler\"} 5.0"
    ));
    assert!(output.contains(
        "pod_scheduling_latency_seconds_sum{cluster=\"west\",namespace=\"default\",user=\"kube-scheduler\"} 0.0"
    ));
    assert_eq!(west.engine().state().pod_count(), 1);
    assert_eq!(east.engine().state().pod_count(), 1);
}

#[tokio::test]
async fn metrics_served_over_http() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.log");
    let registry = ExporterRegistry::new();
    let mut runner = runner(&path, "prod", &registry);
    append(&path, &[pod_create(), pod_binding()]);
    runner.cycle().unwrap();

    let server = MetricsServer::bind("127.0.0.1:0".parse().unwrap(), "/metrics", registry)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    let (_shutdown, rx) = tokio::sync::watch::channel(false);
    tokio::spawn(server.serve(rx));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains("pod_scheduling_latency_seconds_count"));
    assert!(response.contains("pod_deleted"));
    assert!(response.contains("batchjob_completion_latency_seconds"));
}
