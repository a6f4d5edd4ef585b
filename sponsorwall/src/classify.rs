// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Assignment of sponsors to configured tiers.
//!
//! Each sponsor is placed by the first matching rule:
//!
//! 1. inactive sponsors go to the past tier, when one is configured;
//! 2. an upstream tier name equal to a configured title (ignoring case);
//! 3. the highest non-past tier whose threshold the pledge meets;
//! 4. the first non-past tier in configuration order.
//!
//! Rule 3 picks the best qualifying tier, not the first configured one.

use tracing::warn;

use crate::{sponsor::Sponsor, tier::Tier};

/// Sponsors assigned to a single tier, in input order.
#[derive(Debug, Clone, PartialEq,)]
pub struct TierBucket<'a,>
{
    /// Configured tier.
    pub tier:     Tier,
    /// Sponsors placed into the tier.
    pub sponsors: Vec<&'a Sponsor,>,
}

/// Result of [`classify`]: one bucket per configured tier, in configuration
/// order, including empty buckets.
#[derive(Debug, Clone, PartialEq,)]
pub struct Classification<'a,>
{
    buckets: Vec<TierBucket<'a,>,>,
}

impl<'a,> Classification<'a,>
{
    /// Returns all buckets in configuration order.
    pub fn buckets(&self,) -> &[TierBucket<'a,>]
    {
        &self.buckets
    }

    /// Returns the sponsors assigned to the tier titled `title`.
    pub fn get(&self, title: &str,) -> Option<&[&'a Sponsor]>
    {
        self.buckets
            .iter()
            .find(|bucket| bucket.tier.title == title,)
            .map(|bucket| bucket.sponsors.as_slice(),)
    }

    /// Total number of classified sponsors.
    pub fn sponsor_count(&self,) -> usize
    {
        self.buckets.iter().map(|bucket| bucket.sponsors.len(),).sum()
    }

    /// Iterates over non-empty buckets as `(title, count)` pairs.
    pub fn counts(&self,) -> impl Iterator<Item = (&str, usize,),> + '_
    {
        self.buckets
            .iter()
            .filter(|bucket| !bucket.sponsors.is_empty(),)
            .map(|bucket| (bucket.tier.title.as_str(), bucket.sponsors.len(),),)
    }
}

/// Classifies `sponsors` into `tiers`.
///
/// The function is total over validated configurations: every sponsor ends
/// up in exactly one bucket and every tier has a bucket. With a tier list
/// lacking any non-past tier, sponsors that fit nowhere are dropped with a
/// warning.
///
/// # Examples
///
/// ```
/// use sponsorwall::{Sponsor, Tier, classify};
///
/// let tiers = [
///     Tier::new("Past", -1.0,),
///     Tier::new("Free", 0.0,),
///     Tier::new("Drink", 4.0,),
///     Tier::new("Lunch", 8.0,),
/// ];
/// let sponsor = Sponsor {
///     login:           "octocat".to_owned(),
///     name:            "The Octocat".to_owned(),
///     avatar_url:      String::new(),
///     profile_url:     "https://github.com/octocat".to_owned(),
///     monthly_dollars: 10.0,
///     is_active:       true,
///     tier:            None,
///     avatar_data_uri: None,
/// };
/// let sponsors = [sponsor];
///
/// let classification = classify(&sponsors, &tiers,);
/// assert_eq!(classification.get("Lunch",).map(<[_]>::len), Some(1));
/// ```
pub fn classify<'a,>(sponsors: &'a [Sponsor], tiers: &[Tier],) -> Classification<'a,>
{
    let mut buckets: Vec<TierBucket<'a,>,> = tiers
        .iter()
        .map(|tier| TierBucket {
            tier: tier.clone(), sponsors: Vec::new(),
        },)
        .collect();

    let past_index = tiers.iter().position(Tier::is_past,);

    let mut by_amount: Vec<usize,> =
        (0..tiers.len()).filter(|&index| !tiers[index].is_past(),).collect();
    // Stable sort keeps configuration order among equal thresholds.
    by_amount.sort_by(|&a, &b| tiers[b].monthly_dollars.total_cmp(&tiers[a].monthly_dollars,),);

    let fallback_index = tiers.iter().position(|tier| !tier.is_past(),);

    for sponsor in sponsors {
        match place(sponsor, tiers, past_index, &by_amount, fallback_index,) {
            Some(index,) => buckets[index].sponsors.push(sponsor,),
            None => warn!("No tier can hold sponsor {}; skipping", sponsor.login),
        }
    }

    Classification {
        buckets,
    }
}

fn place(
    sponsor: &Sponsor,
    tiers: &[Tier],
    past_index: Option<usize,>,
    by_amount: &[usize],
    fallback_index: Option<usize,>,
) -> Option<usize,>
{
    if !sponsor.is_active {
        if let Some(index,) = past_index {
            return Some(index,);
        }
    }

    if let Some(upstream,) = sponsor.tier.as_ref() {
        if let Some(index,) = tiers.iter().position(|tier| tier.matches_name(&upstream.title,),) {
            return Some(index,);
        }
    }

    by_amount
        .iter()
        .copied()
        .find(|&index| sponsor.monthly_dollars >= tiers[index].monthly_dollars,)
        .or(fallback_index,)
}

#[cfg(test)]
mod tests
{
    use proptest::prelude::*;

    use super::classify;
    use crate::{
        sponsor::{Sponsor, test_support::*},
        tier::Tier,
    };

    fn ladder() -> Vec<Tier,>
    {
        vec![
            Tier::new("Free", 0.0,),
            Tier::new("Drink", 4.0,),
            Tier::new("Lunch", 8.0,),
            Tier::new("Dinner", 24.0,),
            Tier::new("Salon", 64.0,),
            Tier::new("Rent", 256.0,),
        ]
    }

    fn with_past(mut tiers: Vec<Tier,>,) -> Vec<Tier,>
    {
        tiers.insert(0, Tier::new("Past Sponsors", -1.0,),);
        tiers
    }

    #[test]
    fn highest_qualifying_tier_wins()
    {
        let sponsors = [sponsor("ten", 10.0,)];
        let classification = classify(&sponsors, &ladder(),);

        assert_eq!(classification.get("Lunch").map(<[_]>::len), Some(1));
        assert_eq!(classification.get("Drink").map(<[_]>::len), Some(0));
        assert_eq!(classification.get("Dinner").map(<[_]>::len), Some(0));
    }

    #[test]
    fn threshold_is_inclusive()
    {
        let sponsors = [sponsor("exact", 64.0,)];
        let classification = classify(&sponsors, &ladder(),);
        assert_eq!(classification.get("Salon").map(<[_]>::len), Some(1));
    }

    #[test]
    fn unordered_configuration_still_picks_highest_tier()
    {
        let tiers = vec![
            Tier::new("Rent", 256.0,),
            Tier::new("Free", 0.0,),
            Tier::new("Lunch", 8.0,),
            Tier::new("Drink", 4.0,),
        ];
        let sponsors = [sponsor("ten", 10.0,)];
        let classification = classify(&sponsors, &tiers,);
        assert_eq!(classification.get("Lunch").map(<[_]>::len), Some(1));
    }

    #[test]
    fn inactive_sponsor_goes_to_past_regardless_of_amount()
    {
        let sponsors = [with_tier(past_sponsor("rich", 1000.0,), "Rent",)];
        let classification = classify(&sponsors, &with_past(ladder(),),);

        assert_eq!(classification.get("Past Sponsors").map(<[_]>::len), Some(1));
        assert_eq!(classification.get("Rent").map(<[_]>::len), Some(0));
    }

    #[test]
    fn inactive_sponsor_without_past_tier_is_classified_by_amount()
    {
        let sponsors = [past_sponsor("former", 24.0,)];
        let classification = classify(&sponsors, &ladder(),);
        assert_eq!(classification.get("Dinner").map(<[_]>::len), Some(1));
    }

    #[test]
    fn upstream_tier_name_beats_amount()
    {
        let sponsors = [with_tier(sponsor("named", 300.0,), "drink",)];
        let classification = classify(&sponsors, &ladder(),);
        assert_eq!(classification.get("Drink").map(<[_]>::len), Some(1));
        assert_eq!(classification.get("Rent").map(<[_]>::len), Some(0));
    }

    #[test]
    fn unknown_upstream_tier_name_falls_back_to_amount()
    {
        let sponsors = [with_tier(sponsor("named", 5.0,), "$5 a month",)];
        let classification = classify(&sponsors, &ladder(),);
        assert_eq!(classification.get("Drink").map(<[_]>::len), Some(1));
    }

    #[test]
    fn pledge_below_every_threshold_lands_in_first_active_tier()
    {
        let tiers = with_past(vec![Tier::new("Backers", 5.0,), Tier::new("Patrons", 50.0,)],);
        let sponsors = [sponsor("small", 1.0,)];
        let classification = classify(&sponsors, &tiers,);
        assert_eq!(classification.get("Backers").map(<[_]>::len), Some(1));
    }

    #[test]
    fn every_tier_key_is_present_and_ordered()
    {
        let tiers = with_past(ladder(),);
        let classification = classify(&[], &tiers,);
        let titles: Vec<&str,> =
            classification.buckets().iter().map(|bucket| bucket.tier.title.as_str(),).collect();
        let expected: Vec<&str,> = tiers.iter().map(|tier| tier.title.as_str(),).collect();
        assert_eq!(titles, expected);
        assert_eq!(classification.sponsor_count(), 0);
        assert_eq!(classification.counts().count(), 0);
    }

    #[test]
    fn counts_report_non_empty_tiers_only()
    {
        let sponsors = [sponsor("a", 0.0,), sponsor("b", 0.0,), sponsor("c", 8.0,)];
        let classification = classify(&sponsors, &ladder(),);
        let counts: Vec<(&str, usize,),> = classification.counts().collect();
        assert_eq!(counts, vec![("Free", 2), ("Lunch", 1)]);
    }

    #[test]
    fn end_to_end_single_sponsor_scenario()
    {
        let tiers = vec![
            Tier::new("Past", -1.0,),
            Tier::new("Free", 0.0,),
            Tier::new("Drink", 4.0,),
            Tier::new("Lunch", 8.0,),
        ];
        let sponsors = [sponsor("solo", 10.0,)];
        let classification = classify(&sponsors, &tiers,);
        assert_eq!(classification.get("Lunch").map(<[_]>::len), Some(1));
        assert_eq!(classification.sponsor_count(), 1);
    }

    fn arbitrary_sponsor() -> impl Strategy<Value = Sponsor,>
    {
        ("[a-z]{1,12}", 0.0f64..500.0, any::<bool>(), prop::option::of(0usize..8),).prop_map(
            |(login, dollars, active, tier_name,)| {
                let base = if active { sponsor(&login, dollars,) } else { past_sponsor(&login, dollars,) };
                match tier_name {
                    Some(index,) => {
                        let names = ["free", "DRINK", "Lunch", "nope", "Rent", "past sponsors", "x", "Salon"];
                        with_tier(base, names[index],)
                    }
                    None => base,
                }
            },
        )
    }

    proptest! {
        #[test]
        fn every_sponsor_is_placed_exactly_once(sponsors in prop::collection::vec(arbitrary_sponsor(), 0..64)) {
            let tiers = with_past(ladder());
            let classification = classify(&sponsors, &tiers);

            prop_assert_eq!(classification.buckets().len(), tiers.len());
            prop_assert_eq!(classification.sponsor_count(), sponsors.len());
            for sponsor in &sponsors {
                let occurrences = classification
                    .buckets()
                    .iter()
                    .flat_map(|bucket| bucket.sponsors.iter())
                    .filter(|placed| std::ptr::eq(**placed, sponsor))
                    .count();
                prop_assert_eq!(occurrences, 1);
            }
        }

        #[test]
        fn inactive_sponsors_always_land_in_past(sponsors in prop::collection::vec(arbitrary_sponsor(), 0..64)) {
            let tiers = with_past(ladder());
            let classification = classify(&sponsors, &tiers);
            let past = classification.get("Past Sponsors").unwrap_or_default();
            for sponsor in sponsors.iter().filter(|sponsor| !sponsor.is_active) {
                prop_assert!(past.iter().any(|placed| std::ptr::eq(*placed, sponsor)));
            }
        }
    }
}
