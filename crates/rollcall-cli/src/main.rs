use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rollcall_cli::commands::{
    adhoc, attendance, member, roster, scan, schedule, season, tag, template,
};
use rollcall_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Some(Commands::Template { action }) => match action {
            template::TemplateAction::Create(args) => template::create(&mut stdout, args, &config)?,
            template::TemplateAction::Delete(args) => template::delete(&mut stdout, args, &config)?,
        },
        Some(Commands::Schedule { action }) => match action {
            schedule::ScheduleAction::Add(args) => schedule::add(&mut stdout, args, &config)?,
            schedule::ScheduleAction::List(args) => schedule::list(&mut stdout, args, &config)?,
        },
        Some(Commands::Checkin(args)) => attendance::checkin(&mut stdout, args, &config)?,
        Some(Commands::Checkout(args)) => attendance::checkout(&mut stdout, args, &config)?,
        Some(Commands::Mark(args)) => attendance::mark(&mut stdout, args, &config)?,
        Some(Commands::Scan(args)) => scan::run(&mut stdout, args, &config)?,
        Some(Commands::Adhoc { action }) => match action {
            adhoc::AdhocAction::Register(args) => adhoc::register(&mut stdout, args, &config)?,
            adhoc::AdhocAction::Approve(args) => adhoc::approve(&mut stdout, args, &config)?,
            adhoc::AdhocAction::Deny(args) => adhoc::deny(&mut stdout, args, &config)?,
        },
        Some(Commands::Season { action }) => match action {
            season::SeasonAction::Define(args) => season::define(&mut stdout, args, &config)?,
            season::SeasonAction::Assign(args) => season::assign(&mut stdout, args, &config)?,
            season::SeasonAction::Status(args) => season::status(&mut stdout, args, &config)?,
        },
        Some(Commands::Roster(args)) => roster::run(&mut stdout, args, &config)?,
        Some(Commands::Member { action }) => match action {
            member::MemberAction::Add(args) => member::add(&mut stdout, args, &config)?,
            member::MemberAction::AddTeam(args) => member::add_team(&mut stdout, args, &config)?,
            member::MemberAction::Guardian(args) => member::guardian(&mut stdout, args, &config)?,
        },
        Some(Commands::Tag { action }) => match action {
            tag::TagAction::Register(args) => tag::register(&mut stdout, args, &config)?,
            tag::TagAction::Activate(args) => tag::set_active(&mut stdout, args, true, &config)?,
            tag::TagAction::Deactivate(args) => tag::set_active(&mut stdout, args, false, &config)?,
        },
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}
