// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Configuration document describing how the sponsor wall is rendered.
//!
//! The document is YAML. Every field is optional and falls back to the
//! defaults below, so an absent configuration file renders a wall with the
//! stock tier list. [`load_config`] and [`parse_config`] validate the
//! document before handing it out; the remaining stages rely on those
//! invariants (unique titles, at least one non-past tier).

use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{self, Error},
    layout::PADDING,
    tier::Tier,
};

const DEFAULT_WIDTH: u32 = 800;
const DEFAULT_MIN_HEIGHT: u32 = 600;
const DEFAULT_OUTPUT_DIR: &str = ".";
const DEFAULT_FILE_STEM: &str = "sponsors";
const DEFAULT_HEADER: &str = "Sponsors";

/// Root configuration document.
///
/// # Examples
///
/// ```
/// use sponsorwall::parse_config;
///
/// let yaml = r#"
/// width: 640
/// tiers:
///   - title: Past Sponsors
///     monthly_dollars: -1
///   - title: Backers
///     monthly_dollars: 1
/// amount_overrides:
///   octocat: 64
/// "#;
/// let config = parse_config(yaml,).expect("valid configuration",);
/// assert_eq!(config.width, 640);
/// assert_eq!(config.tiers.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize,)]
#[serde(deny_unknown_fields)]
pub struct WallConfig
{
    /// Canvas width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Minimum canvas height in pixels.
    #[serde(default = "default_min_height")]
    pub min_height: u32,

    /// Directory receiving the generated artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name prefix shared by all variants.
    #[serde(default = "default_file_stem")]
    pub file_stem: String,

    /// Header text printed above the first tier.
    #[serde(default = "default_header")]
    pub header: String,

    /// Ordered tier list.
    #[serde(default = "default_tiers")]
    pub tiers: Vec<Tier,>,

    /// Pledge overrides keyed by sponsor login, in dollars.
    #[serde(default)]
    pub amount_overrides: BTreeMap<String, f64,>,
}

impl Default for WallConfig
{
    fn default() -> Self
    {
        Self {
            width:            default_width(),
            min_height:       default_min_height(),
            output_dir:       default_output_dir(),
            file_stem:        default_file_stem(),
            header:           default_header(),
            tiers:            default_tiers(),
            amount_overrides: BTreeMap::new(),
        }
    }
}

impl WallConfig
{
    /// Checks the invariants the classifier and layout engine rely on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`](Error::Validation) describing the first
    /// violated rule.
    pub fn validate(&self,) -> Result<(), Error,>
    {
        if self.width <= (2.0 * PADDING) as u32 {
            return Err(Error::validation(format!(
                "width must exceed {} pixels",
                (2.0 * PADDING) as u32
            ),),);
        }

        let stem = self.file_stem.trim();
        if stem.is_empty() || stem.contains(['/', '\\',],) {
            return Err(Error::validation("file_stem must be a plain non-empty file name",),);
        }

        if self.tiers.is_empty() {
            return Err(Error::validation("configuration must include at least one tier",),);
        }

        let mut seen_titles = HashSet::with_capacity(self.tiers.len(),);
        for tier in &self.tiers {
            let title = tier.title.trim();
            if title.is_empty() {
                return Err(Error::validation("tier title cannot be empty",),);
            }
            if !tier.monthly_dollars.is_finite() {
                return Err(Error::validation(format!(
                    "tier '{title}' must have a finite monthly_dollars value"
                ),),);
            }
            if !seen_titles.insert(title.to_lowercase(),) {
                return Err(Error::validation(format!("duplicate tier title '{title}'"),),);
            }
        }

        if self.tiers.iter().all(Tier::is_past,) {
            return Err(Error::validation(
                "configuration must include at least one tier for active sponsors",
            ),);
        }

        for (login, amount,) in &self.amount_overrides {
            if !amount.is_finite() || *amount < 0.0 {
                return Err(Error::validation(format!(
                    "amount override for '{login}' must be a non-negative number"
                ),),);
            }
        }

        Ok((),)
    }
}

/// Loads and validates the configuration at `path`.
///
/// # Errors
///
/// Returns [`Error::Io`](Error::Io) when the file cannot be read,
/// [`Error::Parse`](Error::Parse) when the YAML is malformed and
/// [`Error::Validation`](Error::Validation) when invariants are violated.
pub fn load_config(path: &Path,) -> Result<WallConfig, Error,>
{
    let contents = fs::read_to_string(path,).map_err(|source| error::io_error(path, source,),)?;
    parse_config(&contents,)
}

/// Parses and validates a configuration document held in memory.
///
/// An empty document yields the defaults.
///
/// # Errors
///
/// Propagates [`Error::Parse`](Error::Parse) and
/// [`Error::Validation`](Error::Validation).
pub fn parse_config(contents: &str,) -> Result<WallConfig, Error,>
{
    let config: WallConfig = if contents.trim().is_empty() {
        WallConfig::default()
    } else {
        serde_yaml::from_str(contents,)?
    };
    config.validate()?;
    Ok(config,)
}

fn default_width() -> u32
{
    DEFAULT_WIDTH
}

fn default_min_height() -> u32
{
    DEFAULT_MIN_HEIGHT
}

fn default_output_dir() -> PathBuf
{
    PathBuf::from(DEFAULT_OUTPUT_DIR,)
}

fn default_file_stem() -> String
{
    DEFAULT_FILE_STEM.to_owned()
}

fn default_header() -> String
{
    DEFAULT_HEADER.to_owned()
}

fn default_tiers() -> Vec<Tier,>
{
    vec![
        Tier::new("Past Sponsors", -1.0,),
        Tier::new("chibi Funs", 0.0,),
        Tier::new("Drink Sponsors", 4.0,),
        Tier::new("Lunch Sponsors", 8.0,),
        Tier::new("Shiropractic Sponsors", 24.0,),
        Tier::new("Slightly Fancier Hair Salon Sponsors", 64.0,),
        Tier::new("Rent Relief Sponsors", 256.0,),
    ]
}
