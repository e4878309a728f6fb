use super::{Cli, Command, LowerSpec};
use crate::catalog::{GroupFilter, TraitGroup};
use crate::profile::{ProfileKey, ProfileMode};
use clap::{CommandFactory, Parser};

#[test]
fn command_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn lower_spec_parses_target_amount_and_group() {
    assert_eq!(
        "profile4:2".parse::<LowerSpec>(),
        Ok(LowerSpec {
            target: ProfileKey::Profile4,
            amount: 2,
            group: None,
        })
    );
    assert_eq!(
        "p2:1:pd".parse::<LowerSpec>(),
        Ok(LowerSpec {
            target: ProfileKey::Profile2,
            amount: 1,
            group: Some(GroupFilter::Only(TraitGroup::Pd)),
        })
    );
}

#[test]
fn lower_spec_rejects_malformed_values() {
    assert!("profile4".parse::<LowerSpec>().is_err());
    assert!(":2".parse::<LowerSpec>().is_err());
    assert!("profile9:2".parse::<LowerSpec>().is_err());
    assert!("profile4:two".parse::<LowerSpec>().is_err());
    assert!("profile4:2:xyz".parse::<LowerSpec>().is_err());
    assert!("profile4:2:pd:extra".parse::<LowerSpec>().is_err());
}

#[test]
fn profiles_command_collects_repeated_lowers() {
    let cli = Cli::try_parse_from([
        "casework",
        "profiles",
        "--case",
        "12",
        "--mode",
        "clinical_override",
        "--copy-3-to-4",
        "--lower",
        "profile4:2:pd",
        "--lower",
        "profile4:1",
        "--json",
    ])
    .expect("parse");
    let Command::Profiles(args) = cli.command else {
        panic!("expected profiles command");
    };
    assert_eq!(args.case, 12);
    assert_eq!(args.mode, Some(ProfileMode::ClinicalOverride));
    assert!(args.copy_composite);
    assert_eq!(args.lower.len(), 2);
    assert!(args.output.json);
    assert!(!args.save);
}

#[test]
fn global_flags_follow_subcommands() {
    let cli = Cli::try_parse_from(["casework", "readiness", "--verbose", "--config", "/tmp/c.json"])
        .expect("parse");
    assert!(cli.verbose);
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/c.json")));
}

#[test]
fn profiles_requires_a_case() {
    assert!(Cli::try_parse_from(["casework", "profiles"]).is_err());
}

#[test]
fn init_config_skips_loading_a_missing_config() {
    let cli = Cli::try_parse_from([
        "casework",
        "init-config",
        "--config",
        "/nonexistent/casework/config.json",
    ])
    .expect("parse");
    let config = super::resolve_config(&cli).expect("defaults");
    assert_eq!(config, crate::config::default_config());
}
