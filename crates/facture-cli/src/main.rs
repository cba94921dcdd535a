// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use facture_app::InvoiceSession;
use facture_catalog::{CatalogSource, Loader};
use runtime::{CatalogFeed, CatalogRuntime};
use std::env;
use std::path::PathBuf;
use time::OffsetDateTime;

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
            "load config {}; run `facture --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let source = match &options.catalog {
        Some(raw) => CatalogSource::parse(raw).context("invalid --catalog value")?,
        None => config.catalog_source()?,
    };
    let loader = Loader::new(config.catalog_timeout()?).with_context(|| {
        format!(
            "invalid [catalog] config in {}; fix source/timeout values",
            options.config_path.display()
        )
    })?;

    if options.check_only {
        return check_catalog(&loader, &source, options.demo);
    }

    let log_path = config.log_file()?;
    logging::init(&log_path, config.log_level())?;
    tracing::info!(
        config = %options.config_path.display(),
        catalog = %source,
        demo = options.demo,
        "starting facture"
    );

    let feed = if options.demo {
        CatalogFeed::Demo
    } else {
        CatalogFeed::Remote { loader, source }
    };
    let mut runtime = CatalogRuntime::new(feed, config.print_output_dir());
    let issue_date = OffsetDateTime::now_utc().date();
    let mut session = InvoiceSession::with_initial_rows(issue_date, config.initial_rows());
    facture_tui::run_app(&mut session, &mut runtime)
}

fn check_catalog(loader: &Loader, source: &CatalogSource, demo: bool) -> Result<()> {
    if demo {
        println!(
            "config ok; demo catalog has {} products",
            facture_catalog::demo_entries().len()
        );
        return Ok(());
    }

    let entries = loader.load(source)?;
    println!("config ok; catalog {source} has {} products", entries.len());
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    catalog: Option<String>,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        catalog: None,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--catalog" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow!("--catalog requires a URL or file path")
                })?;
                options.catalog = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
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
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("facture: invoice line-item editor");
    println!("  --config <path>          Use a specific config path");
    println!("  --catalog <source>       Load products from a URL or JSON file");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Launch with the built-in demo catalog");
    println!("  --check                  Validate config and load the catalog once");
    println!("  --help                   Show this help");
}
