//! CLI entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `central_core` linkage.
//! - Answer one authorization question against a configured store.

use central_core::db::open_db;
use central_core::{
    init_logging, parse_action, AccessService, CoreConfig, ProjectId, SqliteStore,
};
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Access core probe and authorization checker.
#[derive(Parser, Debug)]
#[command(name = "central_cli")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the decision for one actor, action and target.
    Check {
        /// JSON config file (`db_path`, `log_level`, `log_dir`)
        config: PathBuf,
        /// Login email of the acting user
        email: String,
        /// Dotted action id, e.g. `submission.create`
        action: String,
        /// Target project id
        project_id: ProjectId,
        /// Target form, required for form-level actions
        xml_form_id: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        None => {
            println!("central_core ping={}", central_core::ping());
            println!("central_core version={}", central_core::core_version());
            ExitCode::SUCCESS
        }
        Some(Command::Check {
            config,
            email,
            action,
            project_id,
            xml_form_id,
        }) => match run_check(&config, &email, &action, project_id, xml_form_id.as_deref()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                eprintln!("error: {message}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run_check(
    config_path: &Path,
    email: &str,
    action_id: &str,
    project_id: ProjectId,
    xml_form_id: Option<&str>,
) -> Result<(), String> {
    let config = CoreConfig::load(config_path).map_err(|err| err.to_string())?;
    if let Some(dir) = &config.log_dir {
        init_logging(&config.log_level, &dir.to_string_lossy())?;
    }

    let action = parse_action(action_id).map_err(|err| err.to_string())?;

    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let service = AccessService::new(SqliteStore::new(&conn));
    let actor = service
        .resolve_actor_by_email(email)
        .map_err(|err| format!("{} ({})", err, err.status_code()))?;
    let decision = service
        .check(&actor, action, Some(project_id), xml_form_id)
        .map_err(|err| format!("{} ({})", err, err.status_code()))?;

    info!(
        "event=cli_check module=cli status=ok actor_id={} action={} project_id={} decision={}",
        actor.id, action, project_id, decision
    );
    println!("decision={} status={}", decision, decision.status_code());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn no_subcommand_is_the_probe() {
        let cli = Cli::try_parse_from(["central_cli"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn check_parses_positionals_with_optional_form() {
        let cli = Cli::try_parse_from([
            "central_cli",
            "check",
            "/etc/central.json",
            "chelsea@getodk.org",
            "submission.create",
            "1",
            "simple",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Check {
                project_id,
                xml_form_id,
                ..
            }) => {
                assert_eq!(project_id, 1);
                assert_eq!(xml_form_id.as_deref(), Some("simple"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn check_rejects_bad_project_id_and_extra_args() {
        assert!(Cli::try_parse_from([
            "central_cli",
            "check",
            "c.json",
            "a@b.c",
            "project.read",
            "one",
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "central_cli",
            "check",
            "c.json",
            "a@b.c",
            "form.read",
            "1",
            "simple",
            "extra",
        ])
        .is_err());
    }
}
