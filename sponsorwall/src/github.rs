// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Fetches the sponsors of a maintainer account from the GitHub Sponsors
/// GraphQL API.
///
/// Two fully paginated passes are made: one over active sponsorships and one
/// over every sponsorship ever recorded. Sponsors that only appear in the
/// second pass are past sponsors.
use std::{
    collections::{BTreeMap, HashSet},
    future::Future,
};

use octocrab::Octocrab;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    credentials::ResolvedToken,
    error::Error,
    sponsor::{Sponsor, UpstreamTier},
};

/// Number of sponsorships requested per page.
pub const PAGE_SIZE: u32 = 100;

const SPONSORS_QUERY: &str = r#"
query($login: String!, $cursor: String, $activeOnly: Boolean!, $pageSize: Int!) {
  user(login: $login) {
    sponsorshipsAsMaintainer(first: $pageSize, after: $cursor, activeOnly: $activeOnly) {
      totalCount
      pageInfo {
        hasNextPage
        endCursor
      }
      nodes {
        tier {
          name
          monthlyPriceInCents
        }
        sponsorEntity {
          __typename
          ... on User {
            login
            name
            avatarUrl
            url
          }
          ... on Organization {
            login
            name
            avatarUrl
            url
          }
        }
      }
    }
  }
}
"#;

/// Parameters of a single page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct PageQuery<'a,>
{
    /// Maintainer account whose sponsorships are listed.
    pub login:       &'a str,
    /// Restrict the listing to currently active sponsorships.
    pub active_only: bool,
    /// Cursor returned by the previous page.
    pub after:       Option<&'a str,>,
}

/// Account behind a sponsorship.
#[derive(Debug, Clone, PartialEq,)]
pub struct SponsorEntity
{
    pub login:      String,
    pub name:       Option<String,>,
    pub avatar_url: String,
    pub url:        String,
}

/// One sponsorship node as returned by the API.
#[derive(Debug, Clone, PartialEq,)]
pub struct SponsorshipRecord
{
    /// `None` when the sponsoring account no longer exists.
    pub entity: Option<SponsorEntity,>,
    /// `None` for sponsorships without tier information.
    pub tier:   Option<UpstreamTier,>,
}

/// One page of sponsorship records.
#[derive(Debug, Clone, Default, PartialEq,)]
pub struct SponsorshipPage
{
    pub records:       Vec<SponsorshipRecord,>,
    pub has_next_page: bool,
    pub end_cursor:    Option<String,>,
}

/// Provider of sponsorship pages.
pub trait SponsorshipSource
{
    /// Requests one page of sponsorships.
    ///
    /// # Errors
    ///
    /// Implementations return [`Error::Validation`] for an unknown account
    /// and [`Error::Service`] for transport or API failures.
    fn fetch_page(
        &self,
        query: PageQuery<'_,>,
    ) -> impl Future<Output = Result<SponsorshipPage, Error,>,> + Send;
}

/// [`SponsorshipSource`] backed by the GitHub GraphQL API.
#[derive(Debug, Clone,)]
pub struct GithubSponsorshipSource
{
    octocrab: Octocrab,
}

impl GithubSponsorshipSource
{
    /// Builds an authenticated client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] when the HTTP client cannot be initialised.
    pub fn new(token: &ResolvedToken,) -> Result<Self, Error,>
    {
        let octocrab = Octocrab::builder()
            .personal_token(token.expose().to_owned(),)
            .build()
            .map_err(|e| Error::service(format!("failed to initialize GitHub client: {e}"),),)?;
        Ok(Self::from_client(octocrab,),)
    }

    /// Wraps an existing client.
    pub fn from_client(octocrab: Octocrab,) -> Self
    {
        Self {
            octocrab,
        }
    }
}

impl SponsorshipSource for GithubSponsorshipSource
{
    async fn fetch_page(&self, query: PageQuery<'_,>,) -> Result<SponsorshipPage, Error,>
    {
        let body = serde_json::json!({
            "query": SPONSORS_QUERY,
            "variables": {
                "login": query.login,
                "cursor": query.after,
                "activeOnly": query.active_only,
                "pageSize": PAGE_SIZE,
            },
        });

        let response: GraphqlResponse = self
            .octocrab
            .graphql(&body,)
            .await
            .map_err(|e| Error::service(format!("GitHub GraphQL request failed: {e}"),),)?;

        response.into_page(query.login,)
    }
}

#[derive(Debug, Deserialize,)]
struct GraphqlResponse
{
    data:   Option<ResponseData,>,
    #[serde(default)]
    errors: Vec<GraphqlError,>,
}

#[derive(Debug, Deserialize,)]
struct GraphqlError
{
    message: String,
}

#[derive(Debug, Deserialize,)]
struct ResponseData
{
    user: Option<UserNode,>,
}

#[derive(Debug, Deserialize,)]
#[serde(rename_all = "camelCase")]
struct UserNode
{
    sponsorships_as_maintainer: SponsorshipConnection,
}

#[derive(Debug, Deserialize,)]
#[serde(rename_all = "camelCase")]
struct SponsorshipConnection
{
    page_info: PageInfo,
    #[serde(default)]
    nodes:     Vec<Option<SponsorshipNode,>,>,
}

#[derive(Debug, Deserialize,)]
#[serde(rename_all = "camelCase")]
struct PageInfo
{
    has_next_page: bool,
    end_cursor:    Option<String,>,
}

#[derive(Debug, Deserialize,)]
#[serde(rename_all = "camelCase")]
struct SponsorshipNode
{
    tier:           Option<TierNode,>,
    sponsor_entity: Option<EntityNode,>,
}

#[derive(Debug, Deserialize,)]
#[serde(rename_all = "camelCase")]
struct TierNode
{
    name:                   String,
    monthly_price_in_cents: u64,
}

#[derive(Debug, Deserialize,)]
#[serde(rename_all = "camelCase")]
struct EntityNode
{
    login:      Option<String,>,
    name:       Option<String,>,
    avatar_url: Option<String,>,
    url:        Option<String,>,
}

impl GraphqlResponse
{
    fn into_page(self, login: &str,) -> Result<SponsorshipPage, Error,>
    {
        if !self.errors.is_empty() {
            let messages: Vec<&str,> =
                self.errors.iter().map(|error| error.message.as_str(),).collect();
            return Err(Error::service(format!("GitHub GraphQL error: {}", messages.join("; ")),),);
        }

        let user = self
            .data
            .and_then(|data| data.user,)
            .ok_or_else(|| Error::validation(format!("GitHub user '{login}' not found"),),)?;
        let connection = user.sponsorships_as_maintainer;

        let records = connection
            .nodes
            .into_iter()
            .flatten()
            .map(|node| SponsorshipRecord {
                entity: node.sponsor_entity.and_then(EntityNode::into_entity,),
                tier:   node.tier.map(|tier| UpstreamTier {
                    title:           tier.name,
                    monthly_dollars: cents_to_dollars(tier.monthly_price_in_cents,),
                },),
            },)
            .collect();

        Ok(SponsorshipPage {
            records,
            has_next_page: connection.page_info.has_next_page,
            end_cursor: connection.page_info.end_cursor,
        },)
    }
}

impl EntityNode
{
    /// Entities of unsupported types arrive without a login and are dropped.
    fn into_entity(self,) -> Option<SponsorEntity,>
    {
        let login = self.login.filter(|login| !login.is_empty(),)?;
        Some(SponsorEntity {
            name: self.name.filter(|name| !name.trim().is_empty(),),
            avatar_url: self.avatar_url.unwrap_or_default(),
            url: self.url.unwrap_or_else(|| format!("https://github.com/{login}"),),
            login,
        },)
    }
}

fn cents_to_dollars(cents: u64,) -> f64
{
    cents as f64 / 100.0
}

/// Fetches every sponsor of `login`, active sponsors first.
///
/// Records without tier information are skipped unless `overrides` carries
/// an amount for their login, in which case that amount becomes the pledge.
///
/// # Errors
///
/// Propagates the first error returned by `source`.
///
/// # Example
///
/// ```no_run
/// use std::collections::BTreeMap;
///
/// use sponsorwall::{GithubSponsorshipSource, fetch_sponsors, resolve_token};
///
/// # async fn example() -> Result<(), sponsorwall::Error> {
/// let token = resolve_token(None,)?;
/// let source = GithubSponsorshipSource::new(&token,)?;
/// let sponsors = fetch_sponsors(&source, "octocat", &BTreeMap::new(),).await?;
/// println!("{} sponsors", sponsors.len());
/// # Ok(())
/// # }
/// ```
pub async fn fetch_sponsors<S,>(
    source: &S,
    login: &str,
    overrides: &BTreeMap<String, f64,>,
) -> Result<Vec<Sponsor,>, Error,>
where
    S: SponsorshipSource + Sync,
{
    let active = collect_sponsors(source, login, true, overrides,).await?;
    let active_logins: HashSet<&str,> = active.iter().map(|sponsor| sponsor.login.as_str(),).collect();

    let everyone = collect_sponsors(source, login, false, overrides,).await?;
    let past: Vec<Sponsor,> = everyone
        .into_iter()
        .filter(|sponsor| !active_logins.contains(sponsor.login.as_str(),),)
        .map(|sponsor| Sponsor {
            is_active: false, ..sponsor
        },)
        .collect();

    info!("Active: {}, Past: {}", active.len(), past.len());

    let mut sponsors = active;
    sponsors.extend(past,);
    Ok(sponsors,)
}

async fn collect_sponsors<S,>(
    source: &S,
    login: &str,
    active_only: bool,
    overrides: &BTreeMap<String, f64,>,
) -> Result<Vec<Sponsor,>, Error,>
where
    S: SponsorshipSource + Sync,
{
    let mut sponsors = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor: Option<String,> = None;
    let mut page_number = 1u32;

    loop {
        let page = source
            .fetch_page(PageQuery {
                login,
                active_only,
                after: cursor.as_deref(),
            },)
            .await?;

        debug!(
            "Fetched page {} ({} records, active_only={})",
            page_number,
            page.records.len(),
            active_only
        );

        for record in page.records {
            let Some(entity,) = record.entity else {
                debug!("Skipping sponsorship without sponsor entity");
                continue;
            };

            if seen.contains(&entity.login,) {
                continue;
            }

            let Some(sponsor,) = to_sponsor(entity, record.tier, overrides,) else {
                continue;
            };

            seen.insert(sponsor.login.clone(),);
            sponsors.push(sponsor,);
        }

        if !page.has_next_page {
            break;
        }

        match page.end_cursor {
            Some(next,) => cursor = Some(next,),
            None => {
                warn!("Page {} reports more results but no cursor, stopping", page_number);
                break;
            }
        }
        page_number += 1;
    }

    Ok(sponsors,)
}

fn to_sponsor(
    entity: SponsorEntity,
    tier: Option<UpstreamTier,>,
    overrides: &BTreeMap<String, f64,>,
) -> Option<Sponsor,>
{
    let monthly_dollars = match (&tier, overrides.get(&entity.login,),) {
        (Some(tier,), _,) => tier.monthly_dollars,
        (None, Some(amount,),) => *amount,
        (None, None,) => {
            debug!("Skipping {} without tier information", entity.login);
            return None;
        }
    };

    Some(Sponsor {
        name: entity.name.unwrap_or_else(|| entity.login.clone(),),
        avatar_url: entity.avatar_url,
        profile_url: entity.url,
        monthly_dollars,
        is_active: true,
        tier,
        avatar_data_uri: None,
        login: entity.login,
    },)
}

#[cfg(test)]
pub(crate) mod test_support
{
    use std::sync::Mutex;

    use super::*;

    /// In-memory source serving prepared pages in request order.
    #[derive(Debug, Default,)]
    pub(crate) struct FakeSource
    {
        active:       Vec<SponsorshipPage,>,
        all:          Vec<SponsorshipPage,>,
        pub(crate) requests: Mutex<Vec<(bool, Option<String,>,),>,>,
        fail_with:    Option<String,>,
    }

    impl FakeSource
    {
        pub(crate) fn new(active: Vec<SponsorshipPage,>, all: Vec<SponsorshipPage,>,) -> Self
        {
            Self {
                active,
                all,
                ..Self::default()
            }
        }

        pub(crate) fn failing(message: &str,) -> Self
        {
            Self {
                fail_with: Some(message.to_owned(),),
                ..Self::default()
            }
        }
    }

    impl SponsorshipSource for FakeSource
    {
        async fn fetch_page(&self, query: PageQuery<'_,>,) -> Result<SponsorshipPage, Error,>
        {
            let mut requests = self.requests.lock().expect("requests lock",);
            let pages = if query.active_only { &self.active } else { &self.all };
            let index =
                requests.iter().filter(|(active, _,)| *active == query.active_only,).count();
            requests.push((query.active_only, query.after.map(str::to_owned,),),);
            drop(requests,);

            if let Some(message,) = &self.fail_with {
                return Err(Error::service(message.clone(),),);
            }
            Ok(pages.get(index,).cloned().unwrap_or_default(),)
        }
    }

    pub(crate) fn record(login: &str, cents: Option<u64,>,) -> SponsorshipRecord
    {
        SponsorshipRecord {
            entity: Some(SponsorEntity {
                login:      login.to_owned(),
                name:       None,
                avatar_url: format!("https://avatars.example.com/{login}"),
                url:        format!("https://github.com/{login}"),
            },),
            tier:   cents.map(|cents| UpstreamTier {
                title:           format!("${} a month", cents / 100),
                monthly_dollars: cents_to_dollars(cents,),
            },),
        }
    }

    pub(crate) fn page(records: Vec<SponsorshipRecord,>, next: Option<&str,>,) -> SponsorshipPage
    {
        SponsorshipPage {
            records,
            has_next_page: next.is_some(),
            end_cursor: next.map(str::to_owned,),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::{test_support::*, *};

    fn logins(sponsors: &[Sponsor],) -> Vec<&str,>
    {
        sponsors.iter().map(|sponsor| sponsor.login.as_str(),).collect()
    }

    #[tokio::test]
    async fn marks_sponsors_missing_from_active_pass_as_past()
    {
        let source = FakeSource::new(
            vec![page(vec![record("alice", Some(500,),)], None,)],
            vec![page(vec![record("alice", Some(500,),), record("bob", Some(1000,),)], None,)],
        );

        let sponsors = fetch_sponsors(&source, "maintainer", &BTreeMap::new(),)
            .await
            .expect("fetch should succeed",);

        assert_eq!(logins(&sponsors), vec!["alice", "bob"]);
        assert!(sponsors[0].is_active);
        assert!(!sponsors[1].is_active);
        assert_eq!(sponsors[1].monthly_dollars, 10.0);
    }

    #[tokio::test]
    async fn follows_cursors_across_pages()
    {
        let source = FakeSource::new(
            vec![
                page(vec![record("a", Some(100,),)], Some("c1",),),
                page(vec![record("b", Some(200,),)], Some("c2",),),
                page(vec![record("c", Some(300,),)], None,),
            ],
            vec![],
        );

        let sponsors =
            fetch_sponsors(&source, "maintainer", &BTreeMap::new(),).await.expect("fetch",);

        assert_eq!(logins(&sponsors), vec!["a", "b", "c"]);
        let requests = source.requests.lock().expect("lock",);
        let active_cursors: Vec<Option<&str,>,> = requests
            .iter()
            .filter(|(active, _,)| *active,)
            .map(|(_, cursor,)| cursor.as_deref(),)
            .collect();
        assert_eq!(active_cursors, vec![None, Some("c1"), Some("c2")]);
    }

    #[tokio::test]
    async fn skips_tierless_and_deleted_sponsorships()
    {
        let deleted = SponsorshipRecord {
            entity: None, tier: Some(UpstreamTier {
                title: "Ghost".to_owned(), monthly_dollars: 5.0,
            },),
        };
        let source = FakeSource::new(
            vec![page(vec![record("tierless", None,), deleted, record("kept", Some(400,),)], None,)],
            vec![],
        );

        let sponsors =
            fetch_sponsors(&source, "maintainer", &BTreeMap::new(),).await.expect("fetch",);

        assert_eq!(logins(&sponsors), vec!["kept"]);
    }

    #[tokio::test]
    async fn tierless_sponsor_with_override_is_kept()
    {
        let source = FakeSource::new(vec![page(vec![record("patron", None,)], None,)], vec![],);
        let overrides = BTreeMap::from([("patron".to_owned(), 42.0,)],);

        let sponsors = fetch_sponsors(&source, "maintainer", &overrides,).await.expect("fetch",);

        assert_eq!(sponsors.len(), 1);
        assert_eq!(sponsors[0].monthly_dollars, 42.0);
        assert!(sponsors[0].tier.is_none());
    }

    #[tokio::test]
    async fn duplicate_logins_keep_first_occurrence()
    {
        let source = FakeSource::new(
            vec![page(vec![record("dup", Some(500,),), record("dup", Some(9900,),)], None,)],
            vec![],
        );

        let sponsors =
            fetch_sponsors(&source, "maintainer", &BTreeMap::new(),).await.expect("fetch",);

        assert_eq!(sponsors.len(), 1);
        assert_eq!(sponsors[0].monthly_dollars, 5.0);
    }

    #[tokio::test]
    async fn missing_cursor_stops_pagination()
    {
        let broken = SponsorshipPage {
            records:       vec![record("a", Some(100,),)],
            has_next_page: true,
            end_cursor:    None,
        };
        let source = FakeSource::new(vec![broken], vec![],);

        let sponsors =
            fetch_sponsors(&source, "maintainer", &BTreeMap::new(),).await.expect("fetch",);

        assert_eq!(logins(&sponsors), vec!["a"]);
        let active_requests =
            source.requests.lock().expect("lock",).iter().filter(|(active, _,)| *active,).count();
        assert_eq!(active_requests, 1);
    }

    #[tokio::test]
    async fn display_name_falls_back_to_login()
    {
        let source = FakeSource::new(vec![page(vec![record("nameless", Some(100,),)], None,)], vec![],);

        let sponsors =
            fetch_sponsors(&source, "maintainer", &BTreeMap::new(),).await.expect("fetch",);

        assert_eq!(sponsors[0].name, "nameless");
    }

    #[tokio::test]
    async fn source_errors_propagate()
    {
        let source = FakeSource::failing("rate limited",);

        let error = fetch_sponsors(&source, "maintainer", &BTreeMap::new(),)
            .await
            .expect_err("fetch should fail",);

        assert!(matches!(error, Error::Service { .. }));
        assert!(error.to_string().contains("rate limited"));
    }

    #[test]
    fn response_with_null_user_is_a_validation_error()
    {
        let response: GraphqlResponse =
            serde_json::from_str(r#"{"data":{"user":null}}"#,).expect("valid json",);

        let error = response.into_page("ghost",).expect_err("missing user",);

        assert!(matches!(error, Error::Validation { .. }));
        assert!(error.to_string().contains("ghost"));
    }

    #[test]
    fn graphql_errors_become_service_errors()
    {
        let response: GraphqlResponse = serde_json::from_str(
            r#"{"data":null,"errors":[{"message":"Bad credentials"},{"message":"Try again"}]}"#,
        )
        .expect("valid json",);

        let error = response.into_page("octocat",).expect_err("errors present",);

        assert!(matches!(error, Error::Service { .. }));
        assert!(error.to_string().contains("Bad credentials; Try again"));
    }

    #[test]
    fn response_nodes_are_decoded()
    {
        let response: GraphqlResponse = serde_json::from_str(
            r#"{
                "data": {
                    "user": {
                        "sponsorshipsAsMaintainer": {
                            "totalCount": 2,
                            "pageInfo": {"hasNextPage": true, "endCursor": "Y3Vyc29y"},
                            "nodes": [
                                {
                                    "tier": {"name": "$8 a month", "monthlyPriceInCents": 800},
                                    "sponsorEntity": {
                                        "__typename": "Organization",
                                        "login": "acme",
                                        "name": "Acme Corp",
                                        "avatarUrl": "https://avatars.githubusercontent.com/u/1",
                                        "url": "https://github.com/acme"
                                    }
                                },
                                {"tier": null, "sponsorEntity": null}
                            ]
                        }
                    }
                }
            }"#,
        )
        .expect("valid json",);

        let page = response.into_page("octocat",).expect("page",);

        assert!(page.has_next_page);
        assert_eq!(page.end_cursor.as_deref(), Some("Y3Vyc29y"));
        assert_eq!(page.records.len(), 2);
        let first = &page.records[0];
        let entity = first.entity.as_ref().expect("entity",);
        assert_eq!(entity.login, "acme");
        assert_eq!(entity.name.as_deref(), Some("Acme Corp"));
        let tier = first.tier.as_ref().expect("tier",);
        assert_eq!(tier.monthly_dollars, 8.0);
        assert!(page.records[1].entity.is_none());
    }
}
