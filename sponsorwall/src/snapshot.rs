// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// JSON snapshots of a fetched sponsor list, used to re-render offline.
use std::{fs, path::Path};

use tracing::debug;

use crate::{
    error::{Error, io_error, output_io_error},
    sponsor::Sponsor,
};

/// Writes `sponsors` to `path` as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns [`Error::Serialize`] when encoding fails and
/// [`Error::OutputIo`] when the file cannot be written.
pub fn write_snapshot(path: &Path, sponsors: &[Sponsor],) -> Result<(), Error,>
{
    let mut json = serde_json::to_string_pretty(sponsors,)?;
    json.push('\n',);
    if let Some(parent,) = path.parent().filter(|parent| !parent.as_os_str().is_empty(),) {
        fs::create_dir_all(parent,).map_err(|e| output_io_error(parent, e,),)?;
    }
    fs::write(path, json,).map_err(|e| output_io_error(path, e,),)?;
    debug!("Wrote snapshot of {} sponsors to {}", sponsors.len(), path.display());
    Ok((),)
}

/// Reads a sponsor list previously written by [`write_snapshot`].
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read,
/// [`Error::Serialize`] for malformed JSON and [`Error::Validation`] when
/// logins are blank or repeated.
pub fn read_snapshot(path: &Path,) -> Result<Vec<Sponsor,>, Error,>
{
    let contents = fs::read_to_string(path,).map_err(|e| io_error(path, e,),)?;
    let sponsors: Vec<Sponsor,> = serde_json::from_str(&contents,)?;

    let mut seen = std::collections::HashSet::with_capacity(sponsors.len(),);
    for sponsor in &sponsors {
        if sponsor.login.trim().is_empty() {
            return Err(Error::validation(format!(
                "snapshot {} contains a sponsor without login",
                path.display()
            ),),);
        }
        if !seen.insert(sponsor.login.as_str(),) {
            return Err(Error::validation(format!(
                "snapshot {} lists sponsor '{}' more than once",
                path.display(),
                sponsor.login
            ),),);
        }
    }

    debug!("Read snapshot of {} sponsors from {}", sponsors.len(), path.display());
    Ok(sponsors,)
}
