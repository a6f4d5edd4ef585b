// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Geometric layout of classified sponsors.
//!
//! Tiers are displayed highest threshold first with the past tier forced to
//! the end. Avatars of a tier wrap into rows that are centered
//! independently, so a short last row stays centered as well. The canvas
//! width is fixed; the height follows from a vertical cursor that only moves
//! down.

use crate::{classify::Classification, sponsor::Sponsor, tier::Tier};

/// Horizontal and vertical canvas padding.
pub const PADDING: f64 = 64.0;
/// Height reserved for the header block.
pub const HEADER_HEIGHT: f64 = 80.0;

const TITLE_HEIGHT: f64 = 56.0;
const PAST_TITLE_HEIGHT: f64 = 36.0;
const SECTION_GAP: f64 = 72.0;
const PAST_SECTION_GAP: f64 = 48.0;
const PAST_AVATAR_SIZE: f64 = 36.0;
const PAST_GAP: f64 = 12.0;
const MIN_GAP: f64 = 16.0;
const GAP_RATIO: f64 = 0.3;
const FEATURED_THRESHOLD: f64 = 256.0;
const FEATURED_AVATAR_SIZE: f64 = 120.0;
const RANKED_AVATAR_SIZES: [f64; 5] = [80.0, 68.0, 56.0, 48.0, 44.0];

/// Position of one avatar on the canvas.
#[derive(Debug, Clone, Copy, PartialEq,)]
pub struct Placement<'a,>
{
    /// Left edge of the avatar.
    pub x:       f64,
    /// Top edge of the avatar.
    pub y:       f64,
    /// Avatar diameter.
    pub size:    f64,
    /// Row index inside the tier grid.
    pub row:     usize,
    /// Column index inside the row.
    pub column:  usize,
    /// Sponsor drawn at this position.
    pub sponsor: &'a Sponsor,
}

/// Layout of one non-empty tier.
#[derive(Debug, Clone, PartialEq,)]
pub struct Section<'a,>
{
    /// Tier rendered by the section.
    pub tier:        Tier,
    /// Index in display order.
    pub rank:        usize,
    /// Whether this is the past tier.
    pub is_past:     bool,
    /// Baseline of the tier title, centered on the canvas.
    pub title_y:     f64,
    /// Avatar diameter used throughout the section.
    pub avatar_size: f64,
    /// Horizontal and vertical gap between avatars.
    pub gap:         f64,
    /// Avatars per full row.
    pub per_row:     usize,
    /// Avatar placements in sponsor order.
    pub placements:  Vec<Placement<'a,>,>,
}

impl Section<'_,>
{
    /// Number of avatar rows.
    pub fn rows(&self,) -> usize
    {
        self.placements.len().div_ceil(self.per_row,)
    }

    /// Height of the avatar grid.
    pub fn grid_height(&self,) -> f64
    {
        self.rows() as f64 * (self.avatar_size + self.gap) - self.gap
    }
}

/// Complete canvas layout.
#[derive(Debug, Clone, PartialEq,)]
pub struct Layout<'a,>
{
    /// Configured canvas width.
    pub width:    f64,
    /// Computed canvas height.
    pub height:   f64,
    /// Non-empty tiers in display order.
    pub sections: Vec<Section<'a,>,>,
}

impl Layout<'_,>
{
    /// Horizontal center of the canvas.
    pub fn center_x(&self,) -> f64
    {
        self.width / 2.0
    }
}

/// Computes avatar placements for `classification` on a canvas `width`
/// pixels wide whose height is at least `min_height`.
///
/// The computation is pure: identical inputs yield identical layouts.
///
/// # Examples
///
/// ```
/// use sponsorwall::{Sponsor, Tier, classify, layout};
///
/// let sponsors = [Sponsor {
///     login:           "octocat".to_owned(),
///     name:            "The Octocat".to_owned(),
///     avatar_url:      String::new(),
///     profile_url:     String::new(),
///     monthly_dollars: 10.0,
///     is_active:       true,
///     tier:            None,
///     avatar_data_uri: None,
/// }];
/// let tiers = [Tier::new("Past", -1.0,), Tier::new("Lunch", 8.0,)];
/// let classification = classify(&sponsors, &tiers,);
///
/// let layout = layout(&classification, 800, 600,);
/// assert_eq!(layout.sections.len(), 1);
/// assert_eq!(layout.sections[0].placements[0].x, 360.0);
/// ```
pub fn layout<'a,>(
    classification: &Classification<'a,>,
    width: u32,
    min_height: u32,
) -> Layout<'a,>
{
    let width = f64::from(width,);
    let center_x = width / 2.0;
    let ordered = display_order(classification,);

    let mut sections = Vec::with_capacity(ordered.len(),);
    let mut cursor = PADDING + HEADER_HEIGHT;

    for (rank, (tier, sponsors,),) in ordered.into_iter().enumerate() {
        let is_past = tier.is_past();
        let avatar_size = avatar_size(tier, rank,);
        let gap = if is_past { PAST_GAP } else { MIN_GAP.max(avatar_size * GAP_RATIO,) };
        let per_row = items_per_row(width, avatar_size, gap,);

        let title_y = cursor;
        cursor += if is_past { PAST_TITLE_HEIGHT } else { TITLE_HEIGHT };

        let placements = sponsors
            .iter()
            .enumerate()
            .map(|(index, sponsor,)| {
                let row = index / per_row;
                let column = index % per_row;
                let in_row = (sponsors.len() - row * per_row).min(per_row,);
                let row_width = in_row as f64 * avatar_size + (in_row as f64 - 1.0) * gap;
                let start_x = center_x - row_width / 2.0;

                Placement {
                    x: start_x + column as f64 * (avatar_size + gap),
                    y: cursor + row as f64 * (avatar_size + gap),
                    size: avatar_size,
                    row,
                    column,
                    sponsor,
                }
            },)
            .collect();

        let section = Section {
            tier: tier.clone(),
            rank,
            is_past,
            title_y,
            avatar_size,
            gap,
            per_row,
            placements,
        };

        cursor += section.grid_height() + if is_past { PAST_SECTION_GAP } else { SECTION_GAP };
        sections.push(section,);
    }

    Layout {
        width,
        height: f64::from(min_height,).max(cursor + PADDING,),
        sections,
    }
}

/// Orders non-empty buckets for display: highest threshold first, the first
/// past tier last.
fn display_order<'c, 'a,>(
    classification: &'c Classification<'a,>,
) -> Vec<(&'c Tier, &'c [&'a Sponsor],),>
{
    let mut ordered: Vec<(&Tier, &[&Sponsor],),> = classification
        .buckets()
        .iter()
        .filter(|bucket| !bucket.sponsors.is_empty(),)
        .map(|bucket| (&bucket.tier, bucket.sponsors.as_slice(),),)
        .collect();

    let past = ordered.iter().position(|(tier, _,)| tier.is_past(),).map(|index| ordered.remove(index,),);

    ordered.sort_by(|(a, _,), (b, _,)| b.monthly_dollars.total_cmp(&a.monthly_dollars,),);
    ordered.extend(past,);
    ordered
}

fn avatar_size(tier: &Tier, rank: usize,) -> f64
{
    if tier.is_past() {
        PAST_AVATAR_SIZE
    } else if tier.monthly_dollars >= FEATURED_THRESHOLD {
        FEATURED_AVATAR_SIZE
    } else {
        RANKED_AVATAR_SIZES[rank.min(RANKED_AVATAR_SIZES.len() - 1,)]
    }
}

fn items_per_row(width: f64, size: f64, gap: f64,) -> usize
{
    let fitting = ((width - 2.0 * PADDING + gap) / (size + gap)).floor();
    if fitting >= 1.0 { fitting as usize } else { 1 }
}
