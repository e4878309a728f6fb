use super::{CheckSeverity, CheckStatus, ReadinessGate, ReadinessReport};
use crate::error::{CoreError, ServiceError};
use crate::service::ReadinessService;

struct DownService;

impl ReadinessService for DownService {
    fn get_readiness(&self) -> Result<ReadinessReport, ServiceError> {
        Err(ServiceError::Status {
            status: 503,
            message: "service unavailable".to_string(),
        })
    }
}

fn parse(text: &str) -> ReadinessReport {
    serde_json::from_str(text).expect("parse readiness")
}

#[test]
fn gate_fails_closed_before_first_report() {
    let gate = ReadinessGate::new();
    let verdict = gate.check();
    assert!(!verdict.pass);
    assert_eq!(verdict.reason_text(), "Checking data readiness.");
    assert!(matches!(
        gate.ensure_pass(),
        Err(CoreError::ReadinessBlocked { .. })
    ));
}

#[test]
fn primary_reason_is_first_failing_blocker() {
    let report = parse(
        r#"{
            "overall_status": "fail",
            "checks": [
                {"id": "db.file", "status": "pass", "severity": "blocker", "message": "ok"},
                {"id": "jobs.count", "status": "fail", "severity": "warning", "message": "few jobs"},
                {"id": "traits.count", "status": "fail", "severity": "blocker", "message": "Trait table is empty."},
                {"id": "states", "status": "fail", "severity": "blocker", "message": "No states."}
            ],
            "remediation": ["npm run build:mvqs", "  "]
        }"#,
    );
    let gate = ReadinessGate::with_report(report);
    let verdict = gate.check();
    assert!(!verdict.pass);
    assert_eq!(verdict.reason_text(), "Trait table is empty.");
    assert_eq!(verdict.remediation, vec!["npm run build:mvqs".to_string()]);
    match gate.ensure_pass() {
        Err(CoreError::ReadinessBlocked { reason }) => assert_eq!(reason, "Trait table is empty."),
        other => panic!("expected readiness block, got {other:?}"),
    }
}

#[test]
fn failing_report_without_blockers_uses_generic_reason() {
    let report = parse(r#"{"overall_status": "fail", "checks": []}"#);
    assert_eq!(report.primary_failure(), "Data readiness checks failed.");
}

#[test]
fn unknown_severity_parses_as_info() {
    let report = parse(
        r#"{"overall_status": "pass", "checks": [{"id": "x", "status": "pass", "severity": "notice"}]}"#,
    );
    assert_eq!(report.checks[0].severity, CheckSeverity::Info);
    assert!(ReadinessGate::with_report(report).ensure_pass().is_ok());
}

#[test]
fn refresh_converts_transport_failure_into_blocker() {
    let mut gate = ReadinessGate::with_report(parse(r#"{"overall_status": "pass"}"#));
    assert!(gate.is_pass());
    let flipped = gate.refresh(&DownService);
    assert!(flipped);
    let report = gate.report().expect("report");
    assert_eq!(report.overall_status, CheckStatus::Fail);
    assert_eq!(report.checks[0].id, "readiness.endpoint");
    assert_eq!(gate.check().reason_text(), "503: service unavailable");
}

#[test]
fn update_reports_flips_only() {
    let mut gate = ReadinessGate::new();
    assert!(!gate.update(ReadinessReport::endpoint_failure("down")));
    assert!(gate.update(parse(r#"{"overall_status": "pass"}"#)));
    assert!(!gate.update(parse(r#"{"overall_status": "pass"}"#)));
}
