use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wt_cli::commands::{exercise, plan, session, status};
use wt_cli::{Cli, Commands, Config, ExerciseAction, PlanAction, SessionAction};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(wt_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = wt_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

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

    let mut stdout = std::io::stdout().lock();

    match &cli.command {
        Some(Commands::Exercise { action }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                ExerciseAction::Add {
                    name,
                    muscle,
                    desc,
                    unilateral,
                } => exercise::add(
                    &mut db,
                    &mut stdout,
                    name,
                    *muscle,
                    desc.clone(),
                    *unilateral,
                    Utc::now(),
                )?,
                ExerciseAction::List { muscle, json } => {
                    exercise::list(&db, &mut stdout, *muscle, *json)?;
                }
                ExerciseAction::Delete { name } => exercise::delete(&mut db, &mut stdout, name)?,
            }
        }
        Some(Commands::Plan { action }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                PlanAction::Create { name, desc } => {
                    plan::create(&mut db, &mut stdout, name, desc.clone(), Utc::now())?;
                }
                PlanAction::AddExercise(args) => {
                    plan::add_exercise(&mut db, &mut stdout, args, Utc::now())?;
                }
                PlanAction::List { json } => plan::list(&db, &mut stdout, *json)?,
                PlanAction::Show { plan } => plan::show(&db, &mut stdout, plan)?,
                PlanAction::Delete { plan } => plan::delete(&mut db, &mut stdout, plan)?,
            }
        }
        Some(Commands::Session { action }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                SessionAction::Start { plan } => {
                    session::start(&mut db, &mut stdout, plan, Utc::now())?;
                }
                SessionAction::Log(args) => {
                    session::log_set(&mut db, &mut stdout, args, Utc::now())?;
                }
                SessionAction::Edit(args) => session::edit(&mut db, &mut stdout, args)?,
                SessionAction::Pause => session::pause(&mut db, &mut stdout, Utc::now())?,
                SessionAction::Resume => session::resume(&mut db, &mut stdout, Utc::now())?,
                SessionAction::Finish => session::finish(&mut db, &mut stdout, Utc::now())?,
                SessionAction::Show => session::show(&db, &mut stdout)?,
                SessionAction::Cancel => session::cancel(&mut db, &mut stdout)?,
            }
        }
        Some(Commands::Status { json }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            status::run(&db, &mut stdout, &config.database_path, *json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}
