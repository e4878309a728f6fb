//! Parameterized step-table workflow evaluator.
//!
//! A workflow is a static, ordered table of [`StepDefinition`]s. Each step
//! computes its own status from a context value; [`evaluate`] layers the
//! shared rules on top:
//!
//! ```text
//! readiness failing   every step after the first is blocked
//! dependency not done step is blocked, unless it was already done
//! own condition false step drops out of the ratchet memory
//! ```
//!
//! The same evaluator drives both the case wizard and the operational
//! workflow; only the tables differ (see [`case_wizard`] and [`operational`]).
use crate::readiness::GateVerdict;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub mod case_wizard;
pub mod operational;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    NotStarted,
    InProgress,
    Done,
    Blocked,
}

impl StepStatus {
    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::NotStarted => "not_started",
            StepStatus::InProgress => "in_progress",
            StepStatus::Done => "done",
            StepStatus::Blocked => "blocked",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StepStatus::NotStarted => "Not started",
            StepStatus::InProgress => "In progress",
            StepStatus::Done => "Done",
            StepStatus::Blocked => "Blocked",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step's own verdict, before dependency and readiness rules apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub status: StepStatus,
    pub detail: String,
}

impl StepOutcome {
    pub fn done(detail: impl Into<String>) -> Self {
        Self::with_status(StepStatus::Done, detail)
    }

    pub fn in_progress(detail: impl Into<String>) -> Self {
        Self::with_status(StepStatus::InProgress, detail)
    }

    pub fn not_started(detail: impl Into<String>) -> Self {
        Self::with_status(StepStatus::NotStarted, detail)
    }

    pub fn blocked(detail: impl Into<String>) -> Self {
        Self::with_status(StepStatus::Blocked, detail)
    }

    /// `done` when `ready`, else `in_progress`.
    pub fn ready_or_in_progress(
        ready: bool,
        done: impl Into<String>,
        pending: impl Into<String>,
    ) -> Self {
        if ready {
            Self::done(done)
        } else {
            Self::in_progress(pending)
        }
    }

    fn with_status(status: StepStatus, detail: impl Into<String>) -> Self {
        StepOutcome {
            status,
            detail: detail.into(),
        }
    }
}

/// One row of a step table.
///
/// `compute` only looks at the context and readiness; it must not consult
/// later steps. `depends_on` names earlier steps in the same table.
pub struct StepDefinition<C> {
    pub id: &'static str,
    pub title: &'static str,
    pub help: &'static str,
    pub depends_on: &'static [&'static str],
    pub optional: bool,
    pub compute: fn(&C, &GateVerdict) -> StepOutcome,
}

impl<C> fmt::Debug for StepDefinition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("id", &self.id)
            .field("depends_on", &self.depends_on)
            .field("optional", &self.optional)
            .finish()
    }
}

/// Evaluated status of one step.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct StepState {
    pub id: &'static str,
    pub title: &'static str,
    pub help: &'static str,
    pub status: StepStatus,
    pub detail: String,
    pub optional: bool,
}

/// Steps that have reached `done` and stay there until their own condition fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowMemory {
    done: BTreeSet<&'static str>,
}

impl WorkflowMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self, id: &str) -> bool {
        self.done.contains(id)
    }

    pub fn len(&self) -> usize {
        self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }
}

/// Result of one evaluation pass: the step list plus the memory to carry forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowEvaluation {
    pub steps: Vec<StepState>,
    pub memory: WorkflowMemory,
}

/// Evaluate `table` against `context`.
///
/// Deterministic and side-effect free; the caller keeps the returned memory
/// and passes it to the next evaluation to get the done-ratchet.
pub fn evaluate<C>(
    table: &[StepDefinition<C>],
    context: &C,
    readiness: &GateVerdict,
    memory: &WorkflowMemory,
) -> WorkflowEvaluation {
    let mut next_memory = memory.clone();
    let mut steps: Vec<StepState> = Vec::with_capacity(table.len());

    for (index, def) in table.iter().enumerate() {
        let (status, detail) = if index > 0 && !readiness.pass {
            (StepStatus::Blocked, readiness.reason_text().to_string())
        } else {
            let own = (def.compute)(context, readiness);
            let waiting_on = def
                .depends_on
                .iter()
                .find(|dep| !is_step_done(&steps, dep))
                .map(|dep| step_title(table, dep));
            match own.status {
                StepStatus::Done => {
                    if waiting_on.is_none() || memory.is_done(def.id) {
                        next_memory.done.insert(def.id);
                        (StepStatus::Done, own.detail)
                    } else {
                        (StepStatus::Blocked, waiting_detail(waiting_on))
                    }
                }
                _ => {
                    next_memory.done.remove(def.id);
                    match (own.status, waiting_on) {
                        (StepStatus::Blocked, _) => (StepStatus::Blocked, own.detail),
                        (_, Some(title)) => (StepStatus::Blocked, waiting_detail(Some(title))),
                        (status, None) => (status, own.detail),
                    }
                }
            }
        };
        steps.push(StepState {
            id: def.id,
            title: def.title,
            help: def.help,
            status,
            detail,
            optional: def.optional,
        });
    }

    WorkflowEvaluation {
        steps,
        memory: next_memory,
    }
}

fn is_step_done(steps: &[StepState], id: &str) -> bool {
    steps
        .iter()
        .any(|step| step.id == id && step.status == StepStatus::Done)
}

fn step_title<C>(table: &[StepDefinition<C>], id: &str) -> &'static str {
    table
        .iter()
        .find(|def| def.id == id)
        .map(|def| def.title)
        .unwrap_or("an earlier step")
}

fn waiting_detail(title: Option<&'static str>) -> String {
    format!("Complete \"{}\" first.", title.unwrap_or("an earlier step"))
}

/// One-line description of where the workflow stands.
///
/// Optional steps never become the "current" step on their own.
pub fn current_step_summary(steps: &[StepState]) -> String {
    if let Some(step) = steps.iter().find(|step| step.status == StepStatus::Blocked) {
        return format!(
            "Current step: blocked at \"{}\" - {}",
            step.title, step.detail
        );
    }
    if let Some(step) = steps
        .iter()
        .find(|step| !step.optional && step.status != StepStatus::Done)
    {
        return format!("Current step: {}. {}", step.title, step.detail);
    }
    "Current step: workflow complete.".to_string()
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
