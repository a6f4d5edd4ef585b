// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Resolution of the GitHub account login and API token.
///
/// Values are taken from explicit input first, then from the environment,
/// and for the token finally from an authenticated GitHub CLI (`gh`).
use std::{env, fmt, process::Command};

use tracing::{debug, info};

use crate::error::Error;

/// Environment variable consulted after the explicit token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
/// Secondary environment variable for the token.
pub const FALLBACK_TOKEN_ENV: &str = "SPONSORKIT_GITHUB_TOKEN";
/// Environment variable consulted after the explicit login.
pub const LOGIN_ENV: &str = "GITHUB_LOGIN";
/// Secondary environment variable for the login.
pub const FALLBACK_LOGIN_ENV: &str = "SPONSORKIT_GITHUB_LOGIN";

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum TokenOrigin
{
    /// Passed explicitly or read from `GITHUB_TOKEN`.
    Explicit,
    /// Read from the secondary environment variable.
    Environment,
    /// Printed by `gh auth token`.
    GithubCli,
}

/// API token together with its origin.
#[derive(Clone, PartialEq, Eq,)]
pub struct ResolvedToken
{
    value:  String,
    origin: TokenOrigin,
}

impl ResolvedToken
{
    /// Secret token value.
    pub fn expose(&self,) -> &str
    {
        &self.value
    }

    /// Source the token was obtained from.
    pub fn origin(&self,) -> TokenOrigin
    {
        self.origin
    }
}

impl fmt::Debug for ResolvedToken
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.debug_struct("ResolvedToken",)
            .field("value", &"<redacted>",)
            .field("origin", &self.origin,)
            .finish()
    }
}

/// Resolves the API token from explicit input, the environment or `gh`.
///
/// # Errors
///
/// Returns [`Error::Credential`](Error::Credential) when no source yields a
/// non-blank token.
pub fn resolve_token(explicit: Option<&str,>,) -> Result<ResolvedToken, Error,>
{
    resolve_token_with(explicit, |name| env::var(name,).ok(), github_cli_token,)
}

/// Resolves the token with injectable environment and CLI lookups.
///
/// # Errors
///
/// See [`resolve_token`].
pub fn resolve_token_with<E, G,>(
    explicit: Option<&str,>,
    lookup_env: E,
    lookup_cli: G,
) -> Result<ResolvedToken, Error,>
where
    E: Fn(&str,) -> Option<String,>,
    G: FnOnce() -> Option<String,>,
{
    let resolved = non_blank(explicit.map(str::to_owned,),)
        .map(|value| (value, TokenOrigin::Explicit,),)
        .or_else(|| {
            non_blank(lookup_env(TOKEN_ENV,),).map(|value| (value, TokenOrigin::Explicit,),)
        },)
        .or_else(|| {
            non_blank(lookup_env(FALLBACK_TOKEN_ENV,),)
                .map(|value| (value, TokenOrigin::Environment,),)
        },)
        .or_else(|| non_blank(lookup_cli(),).map(|value| (value, TokenOrigin::GithubCli,),),);

    match resolved {
        Some((value, origin,),) => {
            if origin == TokenOrigin::GithubCli {
                info!("Using GitHub CLI authentication");
            }
            Ok(ResolvedToken {
                value,
                origin,
            },)
        }
        None => Err(Error::credential(format!(
            "GitHub token is required. Either:\n1. Set {TOKEN_ENV} or {FALLBACK_TOKEN_ENV} environment variable\n2. Install GitHub CLI (gh) and authenticate with: gh auth login"
        ),),),
    }
}

/// Resolves the sponsored account login.
///
/// # Errors
///
/// Returns [`Error::Credential`](Error::Credential) when neither the
/// explicit value nor the environment provides a login.
pub fn resolve_login(explicit: Option<&str,>,) -> Result<String, Error,>
{
    resolve_login_with(explicit, |name| env::var(name,).ok(),)
}

/// Resolves the login with an injectable environment lookup.
///
/// # Errors
///
/// See [`resolve_login`].
pub fn resolve_login_with<E,>(explicit: Option<&str,>, lookup_env: E,) -> Result<String, Error,>
where
    E: Fn(&str,) -> Option<String,>,
{
    non_blank(explicit.map(str::to_owned,),)
        .or_else(|| non_blank(lookup_env(LOGIN_ENV,),),)
        .or_else(|| non_blank(lookup_env(FALLBACK_LOGIN_ENV,),),)
        .map(|login| login.trim().to_owned(),)
        .ok_or_else(|| {
            Error::credential(format!(
                "GitHub login is required. Set {LOGIN_ENV} or {FALLBACK_LOGIN_ENV} environment variable or pass --login"
            ),)
        },)
}

fn non_blank(value: Option<String,>,) -> Option<String,>
{
    value.map(|raw| raw.trim().to_owned(),).filter(|trimmed| !trimmed.is_empty(),)
}

/// Asks an installed and authenticated GitHub CLI for its token.
fn github_cli_token() -> Option<String,>
{
    let output = match Command::new("gh",).args(["auth", "token"],).output() {
        Ok(output,) => output,
        Err(error,) => {
            debug!("gh auth token unavailable: {error}");
            return None;
        }
    };

    if !output.status.success() {
        debug!("gh auth token exited with {}", output.status);
        return None;
    }

    Some(String::from_utf8_lossy(&output.stdout,).trim().to_owned(),)
}
