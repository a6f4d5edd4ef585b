// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Renders the GitHub Sponsors of an account as a tiered sponsor wall.
//!
//! The pipeline fetches sponsorships through the GitHub GraphQL API, sorts
//! sponsors into configured tiers, lays them out on a centred grid and
//! composes three SVG variants (opaque, transparent and transparent with dark
//! text). Each variant can additionally be rasterized to PNG through headless
//! Chrome. Every stage is exposed separately so callers can substitute the
//! network and browser seams with their own implementations.

mod avatar;
mod classify;
mod compose;
mod config;
mod credentials;
mod error;
mod generate;
mod github;
mod html;
mod layout;
mod rasterize;
mod retry;
mod snapshot;
mod sponsor;
mod tier;

pub use avatar::{AvatarLoader, EmbedSummary, HttpAvatarLoader, embed_avatars, mime_type, to_data_uri};
pub use classify::{Classification, TierBucket, classify};
pub use compose::{ComposeOptions, VARIANTS, Variant, compose_svg, escape_xml};
pub use config::{WallConfig, load_config, parse_config};
pub use credentials::{ResolvedToken, TokenOrigin, resolve_login, resolve_token};
pub use error::{Error, io_error, output_io_error};
pub use generate::{
    GenerateOptions, GenerationReport, TierCount, VariantOutput, generate, render_snapshot,
    write_outputs,
};
pub use github::{
    GithubSponsorshipSource, PageQuery, SponsorEntity, SponsorshipPage, SponsorshipRecord,
    SponsorshipSource, fetch_sponsors,
};
pub use html::{embed_page, raster_page};
pub use layout::{Layout, Placement, Section, layout};
pub use rasterize::{ChromeRasterizer, Rasterizer, svg_dimensions};
pub use retry::{RetryConfig, retry_with_backoff};
pub use snapshot::{read_snapshot, write_snapshot};
pub use sponsor::{Sponsor, UpstreamTier, apply_amount_overrides};
pub use tier::Tier;
