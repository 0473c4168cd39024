// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `citymesh <document.json> [--config cfg.json] [--output out.obj]`
//!
//! Generates meshes for a saved map document and writes them as OBJ.
//! Settings come from the optional config file, then `CITYMESH_*`
//! environment variables.

use anyhow::{bail, Context};
use citymesh_processing::{write_obj_file, FileSource, GenerationConfig, GenerationSession};
use std::path::PathBuf;

const USAGE: &str = "usage: citymesh <document.json> [--config cfg.json] [--output out.obj]";

struct Args {
    document: PathBuf,
    config: Option<PathBuf>,
    output: PathBuf,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut document = None;
    let mut config = None;
    let mut output = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => config = Some(args.next().context("--config needs a path")?.into()),
            "--output" | "-o" => output = Some(args.next().context("--output needs a path")?.into()),
            "--help" | "-h" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            flag if flag.starts_with('-') => bail!("unknown option '{}'\n{}", flag, USAGE),
            _ if document.is_none() => document = Some(PathBuf::from(&arg)),
            _ => bail!("unexpected argument '{}'\n{}", arg, USAGE),
        }
    }

    let document: PathBuf = document.context(USAGE)?;
    let output = output.unwrap_or_else(|| document.with_extension("obj"));
    Ok(Args {
        document,
        config,
        output,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,citymesh=debug".into()),
        )
        .init();

    let args = parse_args()?;

    let config = GenerationConfig::load(args.config.as_deref()).with_context(|| match &args.config {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Invalid configuration".to_string(),
    })?;

    tracing::info!(
        document = %args.document.display(),
        lat = config.lat,
        lon = config.lon,
        radius = config.radius,
        seed = config.seed,
        "Starting citymesh"
    );

    let mut session = GenerationSession::new(config);
    let output = session
        .generate_from(&FileSource::new(&args.document))
        .with_context(|| format!("Failed to generate {}", args.document.display()))?;

    write_obj_file(&args.output, &output.meshes)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    tracing::info!(
        buildings = output.stats.buildings,
        roads = output.stats.roads,
        bridges = output.stats.bridges,
        trees = output.stats.trees,
        total_time_ms = output.stats.total_time_ms,
        "Done"
    );
    Ok(())
}
