// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Sponsorship tiers as configured by the maintainer.
//!
//! A tier is identified by its display title and qualifies sponsors whose
//! monthly pledge meets its threshold. The tier whose title mentions "past"
//! collects inactive sponsors and is conventionally configured with a
//! negative threshold.

use serde::{Deserialize, Serialize};

/// Marker searched (case-insensitively) in tier titles to identify the
/// catch-all tier for inactive sponsors.
const PAST_MARKER: &str = "past";

/// Configured sponsorship tier.
///
/// # Examples
///
/// ```
/// use sponsorwall::Tier;
///
/// let tier = Tier::new("Past Sponsors", -1.0,);
/// assert!(tier.is_past());
/// assert!(!Tier::new("Lunch Sponsors", 8.0,).is_past());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
pub struct Tier
{
    /// Display label, unique across the configuration.
    pub title:           String,
    /// Inclusive minimum monthly pledge in dollars.
    pub monthly_dollars: f64,
}

impl Tier
{
    /// Creates a tier from a title and threshold.
    pub fn new(title: impl Into<String,>, monthly_dollars: f64,) -> Self
    {
        Self {
            title: title.into(), monthly_dollars,
        }
    }

    /// Returns `true` when this tier collects inactive sponsors.
    pub fn is_past(&self,) -> bool
    {
        self.title.to_lowercase().contains(PAST_MARKER,)
    }

    /// Returns `true` when the tier title equals `name` ignoring case.
    pub fn matches_name(&self, name: &str,) -> bool
    {
        self.title.to_lowercase() == name.to_lowercase()
    }
}
