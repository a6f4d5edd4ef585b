// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! End-to-end generation of the sponsor wall artifacts.
//!
//! [`generate`] fetches sponsors from a [`SponsorshipSource`];
//! [`render_snapshot`] starts from a previously written snapshot. Both then
//! embed avatars, classify, compose every variant, write the SVG and HTML
//! files and rasterize the PNGs.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    avatar::{AvatarLoader, embed_avatars},
    classify::classify,
    compose::{VARIANTS, compose_svg},
    config::WallConfig,
    error::{Error, output_io_error},
    github::{SponsorshipSource, fetch_sponsors},
    html::embed_page,
    layout::layout,
    rasterize::Rasterizer,
    snapshot::{read_snapshot, write_snapshot},
    sponsor::{Sponsor, apply_amount_overrides},
};

/// Switches controlling the optional pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct GenerateOptions
{
    /// Download and embed avatars as `data:` URIs.
    pub embed_avatars: bool,
    /// Produce PNG files next to the SVGs.
    pub rasterize:     bool,
    /// Write the fetched sponsor list to this path.
    pub snapshot:      Option<PathBuf,>,
}

impl Default for GenerateOptions
{
    fn default() -> Self
    {
        Self {
            embed_avatars: true, rasterize: true, snapshot: None,
        }
    }
}

/// Number of sponsors placed into one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
pub struct TierCount
{
    pub title: String,
    pub count: usize,
}

/// Files written for one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
pub struct VariantOutput
{
    pub svg: PathBuf,
    /// `None` when rasterization was disabled or failed.
    pub png: Option<PathBuf,>,
}

/// Summary of a generation run, printed as JSON by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
pub struct GenerationReport
{
    pub total:    usize,
    pub active:   usize,
    pub past:     usize,
    /// Non-empty tiers in configuration order.
    pub tiers:    Vec<TierCount,>,
    pub html:     PathBuf,
    pub variants: Vec<VariantOutput,>,
}

/// Fetches the sponsors of `login` and renders every artifact.
///
/// # Errors
///
/// Returns the fetch error, [`Error::OutputIo`] when artifacts cannot be
/// written and [`Error::Serialize`] when the snapshot cannot be encoded.
/// PNG failures are logged and never abort the run.
pub async fn generate<S, L, R,>(
    config: &WallConfig,
    source: &S,
    login: &str,
    loader: &L,
    rasterizer: &R,
    options: &GenerateOptions,
) -> Result<GenerationReport, Error,>
where
    S: SponsorshipSource + Sync,
    L: AvatarLoader + Sync,
    R: Rasterizer + Sync,
{
    info!("Fetching sponsors of {} from GitHub", login);
    let mut sponsors = fetch_sponsors(source, login, &config.amount_overrides,).await?;
    info!("Found {} sponsors", sponsors.len());

    apply_amount_overrides(&mut sponsors, &config.amount_overrides,);

    if let Some(path,) = &options.snapshot {
        write_snapshot(path, &sponsors,)?;
        info!("Snapshot written to {}", path.display());
    }

    render_sponsors(config, sponsors, loader, rasterizer, options,).await
}

/// Renders every artifact from a snapshot written by an earlier run.
///
/// # Errors
///
/// Returns snapshot read errors and [`Error::OutputIo`] when artifacts
/// cannot be written.
pub async fn render_snapshot<L, R,>(
    config: &WallConfig,
    snapshot: &Path,
    loader: &L,
    rasterizer: &R,
    options: &GenerateOptions,
) -> Result<GenerationReport, Error,>
where
    L: AvatarLoader + Sync,
    R: Rasterizer + Sync,
{
    let mut sponsors = read_snapshot(snapshot,)?;
    info!("Loaded {} sponsors from {}", sponsors.len(), snapshot.display());
    apply_amount_overrides(&mut sponsors, &config.amount_overrides,);
    render_sponsors(config, sponsors, loader, rasterizer, options,).await
}

async fn render_sponsors<L, R,>(
    config: &WallConfig,
    mut sponsors: Vec<Sponsor,>,
    loader: &L,
    rasterizer: &R,
    options: &GenerateOptions,
) -> Result<GenerationReport, Error,>
where
    L: AvatarLoader + Sync,
    R: Rasterizer + Sync,
{
    if options.embed_avatars {
        info!("Embedding avatar images");
        embed_avatars(loader, &mut sponsors,).await;
    }

    let classification = classify(&sponsors, &config.tiers,);
    let tiers: Vec<TierCount,> = classification
        .counts()
        .map(|(title, count,)| {
            info!("{}: {}", title, count);
            TierCount {
                title: title.to_owned(),
                count,
            }
        },)
        .collect();

    let wall = layout(&classification, config.width, config.min_height,);
    let rendered: Vec<String,> = VARIANTS
        .iter()
        .map(|variant| compose_svg(&wall, &config.header, variant.options,),)
        .collect();

    let (svg_paths, html,) = write_outputs(config, &rendered,)?;

    let mut variants = Vec::with_capacity(VARIANTS.len(),);
    for ((variant, svg,), svg_path,) in VARIANTS.iter().zip(&rendered,).zip(svg_paths,) {
        let png = if options.rasterize {
            let png_path = config.output_dir.join(variant.file_name(&config.file_stem, "png",),);
            match rasterizer.rasterize(svg, &png_path, variant.is_transparent(),).await {
                Ok((),) => {
                    info!("Wrote {}", png_path.display());
                    Some(png_path,)
                }
                Err(error,) => {
                    warn!("PNG generation failed for {}: {}", png_path.display(), error);
                    None
                }
            }
        } else {
            None
        };
        variants.push(VariantOutput {
            svg: svg_path,
            png,
        },);
    }

    let active = sponsors.iter().filter(|sponsor| sponsor.is_active,).count();
    Ok(GenerationReport {
        total: sponsors.len(),
        active,
        past: sponsors.len() - active,
        tiers,
        html,
        variants,
    },)
}

/// Writes one SVG per variant and the HTML wrapper of the primary variant.
///
/// `rendered` holds the composed documents in [`VARIANTS`] order. The output
/// directory is created when missing.
///
/// # Errors
///
/// Returns [`Error::OutputIo`] for the first file that cannot be written.
pub fn write_outputs(
    config: &WallConfig,
    rendered: &[String],
) -> Result<(Vec<PathBuf,>, PathBuf,), Error,>
{
    let directory = &config.output_dir;
    fs::create_dir_all(directory,).map_err(|e| output_io_error(directory, e,),)?;

    let mut svg_paths = Vec::with_capacity(rendered.len(),);
    for (variant, svg,) in VARIANTS.iter().zip(rendered,) {
        let path = directory.join(variant.file_name(&config.file_stem, "svg",),);
        fs::write(&path, svg,).map_err(|e| output_io_error(&path, e,),)?;
        info!("Wrote {}", path.display());
        svg_paths.push(path,);
    }

    let html_path = directory.join(format!("{}.html", config.file_stem),);
    let primary = rendered.first().map(String::as_str,).unwrap_or_default();
    fs::write(&html_path, embed_page(primary, &config.header,),)
        .map_err(|e| output_io_error(&html_path, e,),)?;
    info!("Wrote {}", html_path.display());

    Ok((svg_paths, html_path,),)
}
