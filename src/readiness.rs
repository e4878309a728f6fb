//! Readiness gate over the backing dataset and services.
//!
//! The readiness report is fetched from an external service and cached here.
//! Consumers call [`ReadinessGate::ensure_pass`] before any gated operation;
//! a failing gate rejects with the gate's reason verbatim.
use crate::error::CoreError;
use crate::service::ReadinessService;
use serde::{Deserialize, Serialize};
use std::fmt;

const READINESS_PENDING: &str = "Checking data readiness.";
const READINESS_FAILED: &str = "Data readiness checks failed.";

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
}

impl CheckStatus {
    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "fail",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckSeverity {
    Blocker,
    Warning,
    #[serde(other)]
    Info,
}

/// One named readiness check.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ReadinessCheck {
    pub id: String,
    pub status: CheckStatus,
    pub severity: CheckSeverity,
    #[serde(default)]
    pub message: String,
}

/// Readiness payload as served by `GET /api/readiness`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ReadinessReport {
    pub overall_status: CheckStatus,
    #[serde(default)]
    pub checks: Vec<ReadinessCheck>,
    #[serde(default)]
    pub remediation: Vec<String>,
}

impl ReadinessReport {
    /// Synthetic failing report used when the readiness endpoint itself fails.
    pub fn endpoint_failure(message: impl Into<String>) -> Self {
        ReadinessReport {
            overall_status: CheckStatus::Fail,
            checks: vec![ReadinessCheck {
                id: "readiness.endpoint".to_string(),
                status: CheckStatus::Fail,
                severity: CheckSeverity::Blocker,
                message: message.into(),
            }],
            remediation: vec![
                "confirm the case service is running at the configured base_url".to_string(),
                "re-run `casework readiness` once the data build completes".to_string(),
            ],
        }
    }

    pub fn is_pass(&self) -> bool {
        self.overall_status == CheckStatus::Pass
    }

    /// Message of the first failing blocker check, else a generic failure line.
    pub fn primary_failure(&self) -> String {
        self.checks
            .iter()
            .find(|check| {
                check.severity == CheckSeverity::Blocker
                    && check.status == CheckStatus::Fail
                    && !check.message.trim().is_empty()
            })
            .map(|check| check.message.clone())
            .unwrap_or_else(|| READINESS_FAILED.to_string())
    }

    pub fn verdict(&self) -> GateVerdict {
        if self.is_pass() {
            return GateVerdict {
                pass: true,
                reason: None,
                remediation: Vec::new(),
            };
        }
        GateVerdict {
            pass: false,
            reason: Some(self.primary_failure()),
            remediation: self
                .remediation
                .iter()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Result of consulting the gate.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct GateVerdict {
    pub pass: bool,
    pub reason: Option<String>,
    pub remediation: Vec<String>,
}

impl GateVerdict {
    /// Reason text, or the empty string when passing.
    pub fn reason_text(&self) -> &str {
        self.reason.as_deref().unwrap_or("")
    }
}

/// Cached readiness state; fails closed until a report arrives.
#[derive(Debug, Clone, Default)]
pub struct ReadinessGate {
    report: Option<ReadinessReport>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_report(report: ReadinessReport) -> Self {
        ReadinessGate {
            report: Some(report),
        }
    }

    pub fn report(&self) -> Option<&ReadinessReport> {
        self.report.as_ref()
    }

    /// Replace the cached report. Returns whether pass/fail flipped.
    pub fn update(&mut self, report: ReadinessReport) -> bool {
        let was_pass = self.is_pass();
        if !report.is_pass() {
            tracing::warn!(reason = %report.primary_failure(), "readiness checks failing");
        }
        self.report = Some(report);
        was_pass != self.is_pass()
    }

    /// Fetch a fresh report; a transport failure becomes a failing report.
    pub fn refresh(&mut self, service: &dyn ReadinessService) -> bool {
        let report = match service.get_readiness() {
            Ok(report) => report,
            Err(err) => ReadinessReport::endpoint_failure(err.to_string()),
        };
        self.update(report)
    }

    pub fn is_pass(&self) -> bool {
        self.report.as_ref().is_some_and(ReadinessReport::is_pass)
    }

    pub fn check(&self) -> GateVerdict {
        match self.report.as_ref() {
            Some(report) => report.verdict(),
            None => GateVerdict {
                pass: false,
                reason: Some(READINESS_PENDING.to_string()),
                remediation: Vec::new(),
            },
        }
    }

    /// Gate a mutating or network operation.
    pub fn ensure_pass(&self) -> Result<(), CoreError> {
        let verdict = self.check();
        if verdict.pass {
            return Ok(());
        }
        Err(CoreError::ReadinessBlocked {
            reason: verdict.reason.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
#[path = "readiness_tests.rs"]
mod tests;
