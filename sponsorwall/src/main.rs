// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Command-line interface for the sponsorwall binary.
//!
//! `generate` fetches sponsors from GitHub and writes every artifact,
//! `render` rebuilds the artifacts from a snapshot and `tiers` prints the
//! effective configuration.

use std::{
    io,
    path::{Path, PathBuf},
    process,
};

use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use sponsorwall::{
    ChromeRasterizer, Error, GenerateOptions, GithubSponsorshipSource, HttpAvatarLoader,
    WallConfig, generate, load_config, render_snapshot, resolve_login, resolve_token,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Command line interface for rendering GitHub Sponsors walls.
#[derive(Debug, Parser,)]
#[command(name = "sponsorwall", version, about = "Render a GitHub Sponsors wall as SVG and PNG")]
struct Cli
{
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand,)]
/// Supported commands exposed by the CLI.
enum Command
{
    /// Fetch sponsors from GitHub and render every artifact.
    Generate(GenerateArgs,),
    /// Render every artifact from a previously written snapshot.
    Render(RenderArgs,),
    /// Print the effective configuration as JSON.
    Tiers(TiersArgs,),
}

/// Options shared by the rendering commands.
#[derive(Debug, Args, Default,)]
struct RenderingArgs
{
    /// Path to the YAML configuration file.
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf,>,

    /// Directory receiving the generated artifacts.
    #[arg(long = "output-dir", value_name = "DIR")]
    output_dir: Option<PathBuf,>,

    /// Canvas width in pixels.
    #[arg(long = "width", value_name = "PIXELS")]
    width: Option<u32,>,

    /// Skip PNG rasterization.
    #[arg(long = "no-png", action = ArgAction::SetTrue)]
    no_png: bool,

    /// Reference remote avatar URLs instead of embedding the images.
    #[arg(long = "no-avatars", action = ArgAction::SetTrue)]
    no_avatars: bool,

    /// Output formatted JSON for easier inspection.
    #[arg(long = "pretty", action = ArgAction::SetTrue)]
    pretty: bool,
}

#[derive(Debug, Args,)]
struct GenerateArgs
{
    #[command(flatten)]
    rendering: RenderingArgs,

    /// GitHub account whose sponsors are rendered.
    #[arg(long = "login", env = "GITHUB_LOGIN", value_name = "LOGIN")]
    login: Option<String,>,

    /// GitHub token with access to the sponsorships.
    #[arg(long = "token", env = "GITHUB_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    token: Option<String,>,

    /// Write the fetched sponsor list to this JSON file.
    #[arg(long = "snapshot", value_name = "PATH")]
    snapshot: Option<PathBuf,>,
}

#[derive(Debug, Args,)]
struct RenderArgs
{
    #[command(flatten)]
    rendering: RenderingArgs,

    /// Snapshot written by `generate --snapshot`.
    #[arg(long = "snapshot", value_name = "PATH")]
    snapshot: PathBuf,
}

#[derive(Debug, Args,)]
struct TiersArgs
{
    /// Path to the YAML configuration file.
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf,>,

    /// Output formatted JSON for easier inspection.
    #[arg(long = "pretty", action = ArgAction::SetTrue)]
    pretty: bool,
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main]
async fn main()
{
    init_tracing();

    if let Err(error,) = run(Cli::parse(),).await {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

/// Logs go to stderr so stdout carries only the JSON report.
fn init_tracing()
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info",),);
    let _ = tracing_subscriber::registry()
        .with(filter,)
        .with(fmt::layer().with_writer(io::stderr,).with_target(false,),)
        .try_init();
}

/// Executes the CLI using parsed arguments.
///
/// # Errors
///
/// Propagates configuration, credential, fetch and output errors.
async fn run(cli: Cli,) -> Result<(), Error,>
{
    match cli.command {
        Command::Generate(args,) => run_generate(args,).await,
        Command::Render(args,) => run_render(args,).await,
        Command::Tiers(args,) => run_tiers(&args,),
    }
}

async fn run_generate(args: GenerateArgs,) -> Result<(), Error,>
{
    let config = load_wall_config(&args.rendering,)?;
    let login = resolve_login(args.login.as_deref(),)?;
    let token = resolve_token(args.token.as_deref(),)?;
    info!("Token source: {:?}", token.origin());

    let source = GithubSponsorshipSource::new(&token,)?;
    let loader = HttpAvatarLoader::new()?;
    let mut options = generate_options(&args.rendering,);
    options.snapshot = args.snapshot;

    let report = generate(
        &config,
        &source,
        &login,
        &loader,
        &ChromeRasterizer::default(),
        &options,
    )
    .await?;

    write_json(&mut io::stdout().lock(), &report, args.rendering.pretty,)
}

async fn run_render(args: RenderArgs,) -> Result<(), Error,>
{
    let config = load_wall_config(&args.rendering,)?;
    let loader = HttpAvatarLoader::new()?;
    let options = generate_options(&args.rendering,);

    let report = render_snapshot(
        &config,
        &args.snapshot,
        &loader,
        &ChromeRasterizer::default(),
        &options,
    )
    .await?;

    write_json(&mut io::stdout().lock(), &report, args.rendering.pretty,)
}

fn run_tiers(args: &TiersArgs,) -> Result<(), Error,>
{
    let config = read_config(args.config.as_deref(),)?;
    write_json(&mut io::stdout().lock(), &config, args.pretty,)
}

fn read_config(path: Option<&Path,>,) -> Result<WallConfig, Error,>
{
    match path {
        Some(path,) => load_config(path,),
        None => Ok(WallConfig::default(),),
    }
}

/// Loads the configuration and applies command line overrides.
fn load_wall_config(args: &RenderingArgs,) -> Result<WallConfig, Error,>
{
    let mut config = read_config(args.config.as_deref(),)?;
    if let Some(width,) = args.width {
        config.width = width;
    }
    if let Some(output_dir,) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
    config.validate()?;
    Ok(config,)
}

fn generate_options(args: &RenderingArgs,) -> GenerateOptions
{
    GenerateOptions {
        embed_avatars: !args.no_avatars,
        rasterize:     !args.no_png,
        snapshot:      None,
    }
}

fn write_json<W: io::Write, T: Serialize,>(writer: &mut W, value: &T, pretty: bool,) -> Result<(), Error,>
{
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, value,)?;
    } else {
        serde_json::to_writer(&mut *writer, value,)?;
    }
    writeln!(writer).map_err(|e| Error::service(format!("failed to write to stdout: {e}"),),)?;

    Ok((),)
}
