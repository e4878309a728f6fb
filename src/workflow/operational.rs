//! Nine-step operational workflow: data verified through packet exported.
use super::case_wizard::CaseRecord;
use super::{StepDefinition, StepOutcome};
use crate::readiness::GateVerdict;
use serde::{Deserialize, Serialize};

/// Which result-producing run populated the results list.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    #[default]
    Search,
    Match,
    Tsa,
}

impl AnalysisMode {
    /// Match and transferable-skills runs count toward the workflow; plain search does not.
    pub fn is_analysis(&self) -> bool {
        matches!(self, AnalysisMode::Match | AnalysisMode::Tsa)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationalContext {
    pub region_run_executed: bool,
    pub client: Option<CaseRecord>,
    /// Whether the client's demographic state has counties to pick from.
    pub region_has_counties: bool,
    pub psychometric_result_count: usize,
    pub analysis_mode: AnalysisMode,
    pub analysis_result_count: usize,
    pub selected_job: Option<String>,
    pub detail_loaded_job: Option<String>,
    pub has_rendered_report: bool,
    pub saved_report_ids: Vec<i64>,
    pub last_packet_report_id: Option<i64>,
}

/// Each required step depends on the required step before it; the optional
/// psychometrics step hangs off client selection and gates nothing.
pub static STEPS: [StepDefinition<OperationalContext>; 9] = [
    StepDefinition {
        id: "verify_data_load",
        title: "Verify Data Load",
        help: "Check readiness. If blocked, run the listed remediation commands.",
        depends_on: &[],
        optional: false,
        compute: verify_data_load,
    },
    StepDefinition {
        id: "set_search_region",
        title: "Set Search Region",
        help: "Choose state/county filters, then run a match.",
        depends_on: &["verify_data_load"],
        optional: false,
        compute: set_search_region,
    },
    StepDefinition {
        id: "create_or_select_client",
        title: "Create or Select Client",
        help: "Create a client or pick an existing one.",
        depends_on: &["set_search_region"],
        optional: false,
        compute: create_or_select_client,
    },
    StepDefinition {
        id: "enter_demographics",
        title: "Enter Demographics",
        help: "Complete name/address fields and choose demographic state/county.",
        depends_on: &["create_or_select_client"],
        optional: false,
        compute: enter_demographics,
    },
    StepDefinition {
        id: "add_psychometrics",
        title: "Add Psychometric Results (Recommended)",
        help: "Record psychometric test results for the client.",
        depends_on: &["create_or_select_client"],
        optional: true,
        compute: add_psychometrics,
    },
    StepDefinition {
        id: "run_match_or_tsa",
        title: "Run Match or Transferable Skills",
        help: "Run Match or Transferable Skills to produce ranked results.",
        depends_on: &["enter_demographics"],
        optional: false,
        compute: run_match_or_tsa,
    },
    StepDefinition {
        id: "select_target_job",
        title: "Select Target Job",
        help: "Select a result row to load job detail.",
        depends_on: &["run_match_or_tsa"],
        optional: false,
        compute: select_target_job,
    },
    StepDefinition {
        id: "generate_report",
        title: "Generate Report",
        help: "Generate the report after selecting a target job.",
        depends_on: &["select_target_job"],
        optional: false,
        compute: generate_report,
    },
    StepDefinition {
        id: "save_export_case_packet",
        title: "Save and Export Case Packet",
        help: "Save the report, then export the case packet.",
        depends_on: &["generate_report"],
        optional: false,
        compute: save_export_case_packet,
    },
];

fn verify_data_load(_: &OperationalContext, readiness: &GateVerdict) -> StepOutcome {
    if readiness.pass {
        StepOutcome::done("Readiness checks passed.")
    } else {
        StepOutcome::blocked(readiness.reason_text())
    }
}

fn set_search_region(ctx: &OperationalContext, _: &GateVerdict) -> StepOutcome {
    StepOutcome::ready_or_in_progress(
        ctx.region_run_executed,
        "Search region confirmed in at least one run.",
        "Set state/county filters and run Search or Match.",
    )
}

fn create_or_select_client(ctx: &OperationalContext, _: &GateVerdict) -> StepOutcome {
    match ctx.client.as_ref() {
        Some(client) => StepOutcome::done(format!("Client selected: {}.", client.display_name())),
        None => StepOutcome::in_progress("Create or select an active client."),
    }
}

fn enter_demographics(ctx: &OperationalContext, _: &GateVerdict) -> StepOutcome {
    let Some(client) = ctx.client.as_ref() else {
        return StepOutcome::not_started("Select a client first.");
    };
    let county_ok = !ctx.region_has_counties || client.demographic_county_id.is_some();
    StepOutcome::ready_or_in_progress(
        client.demographics_complete() && county_ok,
        "Demographic and address fields completed.",
        "Complete name/address/city/postal and demographic region fields.",
    )
}

fn add_psychometrics(ctx: &OperationalContext, _: &GateVerdict) -> StepOutcome {
    if ctx.client.is_none() {
        return StepOutcome::not_started("Select a client to add psychometric results.");
    }
    StepOutcome::ready_or_in_progress(
        ctx.psychometric_result_count > 0,
        format!(
            "{} psychometric results recorded.",
            ctx.psychometric_result_count
        ),
        "Optional but recommended: add at least one psychometric result.",
    )
}

fn run_match_or_tsa(ctx: &OperationalContext, _: &GateVerdict) -> StepOutcome {
    StepOutcome::ready_or_in_progress(
        ctx.analysis_mode.is_analysis() && ctx.analysis_result_count > 0,
        format!("Results available ({} loaded).", ctx.analysis_result_count),
        "Run Match or Transferable Skills to load ranked rows.",
    )
}

fn select_target_job(ctx: &OperationalContext, _: &GateVerdict) -> StepOutcome {
    match ctx.selected_job.as_deref() {
        Some(job) if ctx.detail_loaded_job.as_deref() == Some(job) => {
            StepOutcome::done(format!("Selected DOT {job}."))
        }
        _ => StepOutcome::in_progress("Select a job row to load detailed DOT information."),
    }
}

fn generate_report(ctx: &OperationalContext, _: &GateVerdict) -> StepOutcome {
    StepOutcome::ready_or_in_progress(
        ctx.has_rendered_report,
        "Report generated and ready for save/export.",
        "Generate report from current selected job.",
    )
}

fn save_export_case_packet(ctx: &OperationalContext, _: &GateVerdict) -> StepOutcome {
    if ctx.client.is_none() || ctx.saved_report_ids.is_empty() {
        return StepOutcome::not_started("Save a report for the selected client first.");
    }
    match ctx.last_packet_report_id {
        Some(id) if ctx.saved_report_ids.contains(&id) => {
            StepOutcome::done(format!("Case packet exported for saved report #{id}."))
        }
        _ => StepOutcome::in_progress(
            "Saved report is present. Export Case Packet to complete the workflow.",
        ),
    }
}
