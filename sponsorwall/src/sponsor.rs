// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Sponsor records produced by the fetcher and enriched before rendering.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tier reported by the sponsorship API at pledge time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
pub struct UpstreamTier
{
    /// Tier name as configured on the sponsorship platform.
    pub title:           String,
    /// Monthly price of the upstream tier in dollars.
    pub monthly_dollars: f64,
}

/// A single sponsor of the maintainer account.
///
/// `login` is the unique key. Instances are created by the fetcher, receive
/// an optional embedded avatar and are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
pub struct Sponsor
{
    /// GitHub login of the user or organization.
    pub login:           String,
    /// Display name, falls back to the login.
    pub name:            String,
    /// Remote avatar image URL.
    pub avatar_url:      String,
    /// Profile URL the avatar links to.
    pub profile_url:     String,
    /// Monthly pledge in dollars.
    pub monthly_dollars: f64,
    /// Whether the sponsorship is currently active.
    pub is_active:       bool,
    /// Upstream tier information, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier:            Option<UpstreamTier,>,
    /// Avatar embedded as a base64 `data:` URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_data_uri: Option<String,>,
}

impl Sponsor
{
    /// Returns the image reference used when rendering, preferring the
    /// embedded avatar over the remote URL.
    pub fn avatar_href(&self,) -> Option<&str,>
    {
        self.avatar_data_uri
            .as_deref()
            .filter(|value| !value.is_empty(),)
            .or_else(|| Some(self.avatar_url.as_str(),).filter(|value| !value.is_empty(),),)
    }
}

/// Replaces the pledge of sponsors listed in `overrides`.
///
/// The upstream tier name is cleared for overridden sponsors so the
/// classifier places them by amount. Returns the number of sponsors changed.
pub fn apply_amount_overrides(
    sponsors: &mut [Sponsor],
    overrides: &BTreeMap<String, f64,>,
) -> usize
{
    if overrides.is_empty() {
        return 0;
    }

    let mut applied = 0;
    for sponsor in sponsors.iter_mut() {
        if let Some(amount,) = overrides.get(&sponsor.login,) {
            debug!("Overriding pledge of {} to ${}", sponsor.login, amount);
            sponsor.monthly_dollars = *amount;
            sponsor.tier = None;
            applied += 1;
        }
    }
    applied
}

#[cfg(test)]
pub(crate) mod test_support
{
    use super::{Sponsor, UpstreamTier};

    /// Builds an active sponsor pledging `dollars` without upstream tier name.
    pub(crate) fn sponsor(login: &str, dollars: f64,) -> Sponsor
    {
        Sponsor {
            login:           login.to_owned(),
            name:            login.to_owned(),
            avatar_url:      format!("https://avatars.example.com/{login}.png"),
            profile_url:     format!("https://github.com/{login}"),
            monthly_dollars: dollars,
            is_active:       true,
            tier:            None,
            avatar_data_uri: None,
        }
    }

    pub(crate) fn past_sponsor(login: &str, dollars: f64,) -> Sponsor
    {
        Sponsor {
            is_active: false, ..sponsor(login, dollars,)
        }
    }

    pub(crate) fn with_tier(mut sponsor: Sponsor, title: &str,) -> Sponsor
    {
        sponsor.tier = Some(UpstreamTier {
            title: title.to_owned(), monthly_dollars: sponsor.monthly_dollars,
        },);
        sponsor
    }
}
