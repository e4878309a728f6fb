//! Six-step case wizard: welcome through report export.
use super::{StepDefinition, StepOutcome};
use crate::readiness::GateVerdict;
use serde::{Deserialize, Serialize};

/// Client/case fields the workflows read. Other case columns are ignored.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct CaseRecord {
    #[serde(alias = "caseId", alias = "user_id")]
    pub case_id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub demographic_state_id: Option<i64>,
    #[serde(default)]
    pub demographic_county_id: Option<i64>,
    #[serde(default)]
    pub reason_for_referral: Option<String>,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|text| !text.trim().is_empty())
}

impl CaseRecord {
    pub fn new(case_id: i64) -> Self {
        CaseRecord {
            case_id,
            ..Self::default()
        }
    }

    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        match (first.is_empty(), last.is_empty()) {
            (true, true) => format!("case {}", self.case_id),
            _ => format!("{first} {last}").trim().to_string(),
        }
    }

    /// Name and address fields plus a demographic state.
    pub fn demographics_complete(&self) -> bool {
        present(&self.first_name)
            && present(&self.last_name)
            && present(&self.address_line1)
            && present(&self.city)
            && present(&self.postal_code)
            && self.demographic_state_id.is_some()
    }

    /// Every field the intake step requires.
    pub fn intake_complete(&self) -> bool {
        self.demographics_complete() && present(&self.reason_for_referral)
    }
}

/// Inputs for the case wizard; counts come from the work-history,
/// analysis and report collaborators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardContext {
    pub case: Option<CaseRecord>,
    pub work_history_count: usize,
    pub profiles_loaded: bool,
    pub analysis_result_count: usize,
    pub has_rendered_report: bool,
}

pub static STEPS: [StepDefinition<WizardContext>; 6] = [
    StepDefinition {
        id: "welcome",
        title: "Welcome Cases",
        help: "Select an existing case or create a new one.",
        depends_on: &[],
        optional: false,
        compute: welcome,
    },
    StepDefinition {
        id: "intake",
        title: "Intake",
        help: "Fill in name, address, demographic state and reason for referral.",
        depends_on: &["welcome"],
        optional: false,
        compute: intake,
    },
    StepDefinition {
        id: "work-history",
        title: "Work History DOTs",
        help: "Record at least one job from the client's work history.",
        depends_on: &["intake"],
        optional: false,
        compute: work_history,
    },
    StepDefinition {
        id: "profiles",
        title: "Profiles",
        help: "Review the four trait profiles derived from work history.",
        depends_on: &["work-history"],
        optional: false,
        compute: profiles,
    },
    StepDefinition {
        id: "analysis",
        title: "Analysis",
        help: "Run transferable-skills analysis against the residual profile.",
        depends_on: &["profiles"],
        optional: false,
        compute: analysis,
    },
    StepDefinition {
        id: "report",
        title: "Report / Export",
        help: "Render the case report and export it.",
        depends_on: &["analysis"],
        optional: false,
        compute: report,
    },
];

fn welcome(ctx: &WizardContext, _: &GateVerdict) -> StepOutcome {
    match ctx.case.as_ref() {
        Some(case) => StepOutcome::done(format!("Case selected: {}.", case.display_name())),
        None => StepOutcome::in_progress("Select or create a case."),
    }
}

fn intake(ctx: &WizardContext, _: &GateVerdict) -> StepOutcome {
    match ctx.case.as_ref() {
        None => StepOutcome::not_started("Select a case first."),
        Some(case) => StepOutcome::ready_or_in_progress(
            case.intake_complete(),
            "Intake fields completed.",
            "Complete name, address, demographic state and referral reason.",
        ),
    }
}

fn work_history(ctx: &WizardContext, _: &GateVerdict) -> StepOutcome {
    if ctx.case.is_none() {
        return StepOutcome::not_started("Select a case first.");
    }
    StepOutcome::ready_or_in_progress(
        ctx.work_history_count > 0,
        format!("{} work history jobs recorded.", ctx.work_history_count),
        "Add at least one work history job.",
    )
}

fn profiles(ctx: &WizardContext, _: &GateVerdict) -> StepOutcome {
    StepOutcome::ready_or_in_progress(
        ctx.profiles_loaded,
        "Profiles loaded.",
        "Load the case profiles.",
    )
}

fn analysis(ctx: &WizardContext, _: &GateVerdict) -> StepOutcome {
    StepOutcome::ready_or_in_progress(
        ctx.analysis_result_count > 0,
        format!("{} analysis results.", ctx.analysis_result_count),
        "Run analysis to produce ranked results.",
    )
}

fn report(ctx: &WizardContext, _: &GateVerdict) -> StepOutcome {
    StepOutcome::ready_or_in_progress(
        ctx.has_rendered_report,
        "Report rendered.",
        "Render the case report.",
    )
}
