// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use env_logger::{Env, Target};
use hermes_app::{
    ApplicationView, ApplicationsPresenter, BadgeTable, GridSchema, Location, ModalNotifications,
    ViewConfig,
};
use hermes_db::Store;
use hermes_tui::TuiOptions;
use log::info;
use runtime::DbRepository;
use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `hermes --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    init_logging(&config)?;

    let initial_location = match &options.open {
        Some(path) => Location::parse(path).with_context(|| {
            format!("--open {path:?}; expected /applications or /applications/<id>")
        })?,
        None => Location::List,
    };

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or HERMES_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;
    store.set_busy_timeout(config.busy_timeout()?)?;
    if options.demo {
        let seeded = store.seed_demo_data()?;
        info!("seeded {seeded} demo applications");
    }

    let badges = BadgeTable::standard().context("build state badge table")?;
    let schema = GridSchema::standard(badges).context("build application grid")?;
    if options.check_only {
        return Ok(());
    }

    let actor = config.session_user();
    info!("starting session for {actor} on {}", db_path.display());
    let view_config = ViewConfig {
        allow_new: config.allow_new(),
        actor: actor.clone(),
    };
    let mut view = ApplicationView::new(view_config);
    let mut presenter = ApplicationsPresenter::new(DbRepository::new(&store, actor));
    let mut notifications = ModalNotifications::new();
    let tui_options = TuiOptions {
        page_size: config.page_size(),
        initial_location,
    };
    hermes_tui::run_app(
        &mut view,
        &mut presenter,
        &mut notifications,
        schema,
        &tui_options,
    )
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging(config: &Config) -> Result<()> {
    let log_path = config.log_path()?;
    let file = open_log_file(&log_path)?;
    env_logger::Builder::from_env(Env::default().filter_or("HERMES_LOG", config.log_level()))
        .target(Target::Pipe(Box::new(file)))
        .try_init()
        .context("initialise logger")
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| {
            format!(
                "open log file {} -- set [log].path to a writable file",
                path.display()
            )
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
    open: Option<String>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_db_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
        open: None,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--open" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--open requires a location such as /applications/<id>")
                })?;
                options.open = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("hermes");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Launch with seeded demo data (in-memory)");
    println!("  --check                  Validate config + DB + startup dependencies");
    println!("  --open <location>        Start at /applications or /applications/<id>");
    println!("  --help                   Show this help");
}
