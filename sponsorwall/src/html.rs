// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! HTML documents embedding a rendered sponsor wall.

use crate::compose::escape_xml;

/// Page background matching the opaque SVG variant.
pub const PAGE_BACKGROUND: &str = "#0A0A0A";

/// Wraps `svg` in a standalone page suitable for iframe embedding.
pub fn embed_page(svg: &str, title: &str,) -> String
{
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <style>
    body {{
      margin: 0;
      padding: 0;
      background: {PAGE_BACKGROUND};
      display: flex;
      justify-content: center;
      align-items: flex-start;
      min-height: 100vh;
    }}
    svg {{
      display: block;
      max-width: 100%;
      height: auto;
    }}
  </style>
</head>
<body>
{svg}
</body>
</html>"#,
        title = escape_xml(title,),
    )
}

/// Wraps `svg` in the page loaded by the headless browser.
pub fn raster_page(svg: &str, transparent: bool,) -> String
{
    let background = if transparent { "transparent" } else { PAGE_BACKGROUND };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <style>
    * {{ margin: 0; padding: 0; }}
    body {{ background: {background}; }}
    svg {{ display: block; }}
  </style>
</head>
<body>
{svg}
</body>
</html>"#
    )
}
