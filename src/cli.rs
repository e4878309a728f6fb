//! Command-line host for the case service.
//!
//! The CLI is a thin outer layer: it builds a [`CaseSession`] against the
//! HTTP backend, runs one command, and prints the session state.
use crate::catalog::{GroupFilter, TraitCatalog, TraitDef};
use crate::config::{self, CaseworkConfig};
use crate::coordinator::{CancelSignal, Completion};
use crate::profile::{vq, LockFlags, ProfileKey, ProfileMethodology, ProfileMode, VqEstimates};
use crate::service::{CaseService, CatalogService, HttpBackend};
use crate::session::CaseSession;
use crate::workflow::{current_step_summary, StepState};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(
    name = "casework",
    version,
    about = "Inspect and adjust case worker-trait profiles",
    after_help = "Examples:\n  casework readiness\n  casework profiles --case 12 --copy-3-to-4 --lower profile4:2:pd\n  casework profiles --case 12 --mode clinical_override --save\n  casework status --case 12 --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Config file (defaults to $CASEWORK_CONFIG, then the platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log debug detail to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the trait catalog and default profile
    Traits(TraitsArgs),
    /// Show the data readiness gate
    Readiness(OutputArgs),
    /// Load, adjust, and optionally save a case's profiles
    Profiles(ProfilesArgs),
    /// Evaluate the case wizard for one case
    Status(StatusArgs),
    /// Write a default config file
    InitConfig(InitConfigArgs),
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct TraitsArgs {
    /// Use the built-in 24-trait catalog instead of asking the service
    #[arg(long)]
    pub builtin: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct ProfilesArgs {
    #[arg(long, value_name = "ID")]
    pub case: i64,

    /// Methodology mode (strict_derived or clinical_override)
    #[arg(long, value_name = "MODE")]
    pub mode: Option<ProfileMode>,

    /// Cap profile4 at profile3
    #[arg(long, value_name = "BOOL")]
    pub residual_cap: Option<bool>,

    /// Trait group for --lower (all, ged, apt, pd, ec)
    #[arg(long, value_name = "GROUP")]
    pub group: Option<GroupFilter>,

    /// Reset to strict derivation before any edits
    #[arg(long)]
    pub reset: bool,

    /// Copy profile3 into profile4 before lowering
    #[arg(long = "copy-3-to-4")]
    pub copy_composite: bool,

    /// Lower a vector: TARGET:AMOUNT[:GROUP], repeatable
    #[arg(long, value_name = "SPEC")]
    pub lower: Vec<LowerSpec>,

    /// Persist the result
    #[arg(long)]
    pub save: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct StatusArgs {
    #[arg(long, value_name = "ID")]
    pub case: i64,

    /// Analysis rows already produced for the case
    #[arg(long, default_value_t = 0)]
    pub analysis_results: usize,

    /// A report has been rendered for the case
    #[arg(long)]
    pub report_rendered: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct InitConfigArgs {
    /// Destination (defaults to the resolved config path)
    #[arg(long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

/// `--lower` argument: `profile4:2` or `profile4:2:pd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowerSpec {
    pub target: ProfileKey,
    pub amount: i32,
    pub group: Option<GroupFilter>,
}

impl FromStr for LowerSpec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.split(':');
        let target = parts
            .next()
            .filter(|part| !part.trim().is_empty())
            .ok_or_else(|| format!("missing target in {value:?}"))?
            .parse::<ProfileKey>()?;
        let amount = parts
            .next()
            .ok_or_else(|| format!("missing amount in {value:?} (expected TARGET:AMOUNT)"))?
            .trim()
            .parse::<i32>()
            .map_err(|err| format!("invalid amount in {value:?}: {err}"))?;
        let group = parts.next().map(str::parse::<GroupFilter>).transpose()?;
        if parts.next().is_some() {
            return Err(format!("too many fields in {value:?}"));
        }
        Ok(LowerSpec {
            target,
            amount,
            group,
        })
    }
}

fn config_source(cli: &Cli) -> Option<(PathBuf, bool)> {
    config::resolve_config_path(
        cli.config.as_deref(),
        std::env::var_os(config::CONFIG_ENV).map(PathBuf::from),
        config::default_config_path(),
    )
}

/// Resolve config from flags and the environment.
///
/// `init-config` runs on defaults since its target usually does not exist yet.
pub fn resolve_config(cli: &Cli) -> Result<CaseworkConfig> {
    if matches!(cli.command, Command::InitConfig(_)) {
        return Ok(config::default_config());
    }
    config::load_effective_config(config_source(cli), std::env::var(config::BASE_URL_ENV).ok())
}

pub fn run(cli: Cli, config: CaseworkConfig) -> Result<()> {
    match &cli.command {
        Command::Traits(args) => run_traits(args, &config),
        Command::Readiness(args) => run_readiness(args, &config),
        Command::Profiles(args) => run_profiles(args, &config),
        Command::Status(args) => run_status(args, &config),
        Command::InitConfig(args) => run_init_config(args, &cli),
    }
}

fn backend(config: &CaseworkConfig) -> HttpBackend {
    HttpBackend::new(&config.base_url, config.request_timeout())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{text}");
    Ok(())
}

#[derive(Serialize)]
struct TraitsView<'a> {
    traits: &'a [TraitDef],
    default_profile: &'a [i32],
}

fn run_traits(args: &TraitsArgs, config: &CaseworkConfig) -> Result<()> {
    let catalog = if args.builtin {
        TraitCatalog::standard()
    } else {
        backend(config).get_traits().context("fetch trait catalog")?
    };
    if args.output.json {
        return print_json(&TraitsView {
            traits: catalog.traits(),
            default_profile: catalog.default_profile(),
        });
    }
    for (index, def) in catalog.traits().iter().enumerate() {
        let default = catalog.default_profile().get(index).copied().unwrap_or(def.min);
        println!(
            "{index:>2} {:<6} {:<4} [{}..{}] default {default}  {}",
            def.code,
            def.group.as_str(),
            def.min,
            def.max,
            def.label
        );
    }
    Ok(())
}

fn run_readiness(args: &OutputArgs, config: &CaseworkConfig) -> Result<()> {
    let backend = backend(config);
    let catalog = TraitCatalog::standard();
    let mut session = CaseSession::new(catalog);
    let verdict = session.refresh_readiness(&backend);
    if args.json {
        return print_json(&verdict);
    }
    if verdict.pass {
        println!("readiness: pass");
        return Ok(());
    }
    println!("readiness: fail - {}", verdict.reason_text());
    for line in &verdict.remediation {
        println!("  remediation: {line}");
    }
    Ok(())
}

/// Build a session for `case_id` with readiness refreshed and the case selected.
fn open_session(config: &CaseworkConfig, case_id: i64) -> Result<(HttpBackend, CaseSession)> {
    let backend = backend(config);
    let catalog = backend.get_traits().context("fetch trait catalog")?;
    let mut session = CaseSession::new(catalog);
    session.set_default_methodology(config.default_methodology);
    let verdict = session.refresh_readiness(&backend);
    if !verdict.pass {
        return Err(anyhow!("data not ready: {}", verdict.reason_text()));
    }
    let record = backend
        .get_case(case_id, &CancelSignal::new())
        .with_context(|| format!("fetch case {case_id}"))?;
    session.select_case(record);
    Ok((backend, session))
}

fn expect_applied(completion: Completion<()>, action: &str) -> Result<()> {
    if completion.is_applied() {
        return Ok(());
    }
    Err(anyhow!("{action} was superseded"))
}

#[derive(Serialize)]
struct ProfilesView {
    case_id: i64,
    methodology: ProfileMethodology,
    lock_flags: LockFlags,
    profile1: Vec<i32>,
    profile2: Vec<i32>,
    profile3: Vec<i32>,
    profile4: Vec<i32>,
    vq_method: &'static str,
    vq_estimates: Option<VqEstimates>,
    changed_traits: usize,
    focus: ProfileKey,
    group_filter: &'static str,
}

fn run_profiles(args: &ProfilesArgs, config: &CaseworkConfig) -> Result<()> {
    let (backend, mut session) = open_session(config, args.case)?;
    let overrides = (args.mode.is_some() || args.residual_cap.is_some()).then(|| {
        let base = config.default_methodology;
        ProfileMethodology {
            mode: args.mode.unwrap_or(base.mode),
            enforce_residual_cap: args.residual_cap.unwrap_or(base.enforce_residual_cap),
        }
    });
    expect_applied(session.load_profiles(&backend, overrides)?, "profile load")?;
    if args.reset {
        expect_applied(session.reset_to_derived(&backend)?, "reset")?;
    }
    if let Some(group) = args.group {
        session.set_group_filter(group);
    }
    if args.copy_composite {
        session.copy_composite_to_residual()?;
    }
    for spec in &args.lower {
        if let Some(group) = spec.group {
            session.set_group_filter(group);
        }
        session.lower(spec.target, spec.amount)?;
    }
    let changed_before_save = session.changed_trait_count();
    if args.save {
        expect_applied(session.save_profiles(&backend)?, "save")?;
        tracing::info!(case_id = args.case, changed_before_save, "profiles saved");
    }

    let profiles = session
        .profiles()
        .ok_or_else(|| anyhow!("profiles not loaded for case {}", args.case))?;
    let methodology = session.methodology();
    let view = ProfilesView {
        case_id: args.case,
        methodology,
        lock_flags: methodology.lock_flags(),
        profile1: profiles.vector(ProfileKey::Profile1).to_vec(),
        profile2: profiles.vector(ProfileKey::Profile2).to_vec(),
        profile3: profiles.vector(ProfileKey::Profile3).to_vec(),
        profile4: profiles.vector(ProfileKey::Profile4).to_vec(),
        vq_method: vq::VQ_METHOD,
        vq_estimates: session.vq_estimates(),
        changed_traits: session.changed_trait_count(),
        focus: session.focus(),
        group_filter: session.group_filter().as_str(),
    };
    if args.output.json {
        return print_json(&view);
    }
    println!(
        "case {} ({}, residual cap {})",
        view.case_id,
        methodology.mode,
        if methodology.enforce_residual_cap { "on" } else { "off" }
    );
    println!("{:<6} {:>3} {:>3} {:>3} {:>3}", "trait", "p1", "p2", "p3", "p4");
    for (index, def) in session.catalog().traits().iter().enumerate() {
        println!(
            "{:<6} {:>3} {:>3} {:>3} {:>3}",
            def.code,
            view.profile1[index],
            view.profile2[index],
            view.profile3[index],
            view.profile4[index]
        );
    }
    if let Some(vq) = view.vq_estimates {
        println!(
            "VQ     {:.2} {:.2} {:.2} {:.2}  ({})",
            vq.profile1, vq.profile2, vq.profile3, vq.profile4, view.vq_method
        );
    }
    if !args.save {
        println!("{} traits changed (not saved)", view.changed_traits);
    }
    Ok(())
}

#[derive(Serialize)]
struct StatusView {
    case_id: i64,
    summary: String,
    steps: Vec<StepState>,
}

fn run_status(args: &StatusArgs, config: &CaseworkConfig) -> Result<()> {
    let (backend, mut session) = open_session(config, args.case)?;
    let work_history = backend
        .work_history_count(args.case, &CancelSignal::new())
        .context("fetch work history")?;
    session.record_work_history_count(work_history)?;
    session.record_analysis_results(args.analysis_results)?;
    session.record_rendered_report(args.report_rendered)?;
    if work_history > 0 {
        expect_applied(session.load_profiles(&backend, None)?, "profile load")?;
    }
    let steps = session.case_workflow();
    let view = StatusView {
        case_id: args.case,
        summary: current_step_summary(&steps),
        steps,
    };
    if args.output.json {
        return print_json(&view);
    }
    println!("{}", view.summary);
    for step in &view.steps {
        println!("  [{:<11}] {:<18} {}", step.status.label(), step.title, step.detail);
    }
    Ok(())
}

fn run_init_config(args: &InitConfigArgs, cli: &Cli) -> Result<()> {
    let path = args
        .path
        .clone()
        .or_else(|| config_source(cli).map(|(path, _)| path))
        .ok_or_else(|| anyhow!("no config directory available; pass --path"))?;
    if path.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }
    config::write_config(&path, &config::default_config())?;
    println!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
