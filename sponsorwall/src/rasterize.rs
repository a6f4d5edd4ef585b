// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! PNG rasterization of composed SVG documents through headless Chrome.

use std::{
    fs,
    future::Future,
    path::{Path, PathBuf},
    sync::LazyLock,
    time::Duration,
};

use headless_chrome::{
    Browser, LaunchOptions,
    protocol::cdp::{Page, types::Method},
};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::{
    error::{Error, output_io_error},
    html::raster_page,
};

/// Name of the scratch page written next to each PNG.
pub const TEMP_PAGE_NAME: &str = ".sponsors-temp.html";

const FALLBACK_WIDTH: u32 = 800;
const FALLBACK_HEIGHT: u32 = 900;
const RESIZE_SETTLE: Duration = Duration::from_millis(500,);

static SVG_ROOT: LazyLock<Regex,> =
    LazyLock::new(|| Regex::new(r"(?s)<svg\b[^>]*>",).expect("valid svg root pattern",),);
static VIEW_BOX: LazyLock<Regex,> =
    LazyLock::new(|| Regex::new(r#"\bviewBox="([^"]*)""#,).expect("valid viewBox pattern",),);
static WIDTH_ATTR: LazyLock<Regex,> =
    LazyLock::new(|| Regex::new(r#"\swidth="([^"]*)""#,).expect("valid width pattern",),);
static HEIGHT_ATTR: LazyLock<Regex,> =
    LazyLock::new(|| Regex::new(r#"\sheight="([^"]*)""#,).expect("valid height pattern",),);

/// Converts an SVG document into a PNG file.
pub trait Rasterizer
{
    /// Renders `svg` into `output`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] when the browser session fails and
    /// [`Error::OutputIo`] when the PNG cannot be written.
    fn rasterize(
        &self,
        svg: &str,
        output: &Path,
        transparent: bool,
    ) -> impl Future<Output = Result<(), Error,>,> + Send;
}

/// [`Rasterizer`] driving a fresh headless Chrome instance per image.
#[derive(Debug, Clone,)]
pub struct ChromeRasterizer
{
    /// Time granted to remote images and fonts after navigation.
    pub settle_delay: Duration,
}

impl Default for ChromeRasterizer
{
    fn default() -> Self
    {
        Self {
            settle_delay: Duration::from_secs(2,),
        }
    }
}

impl Rasterizer for ChromeRasterizer
{
    async fn rasterize(&self, svg: &str, output: &Path, transparent: bool,) -> Result<(), Error,>
    {
        let page = raster_page(svg, transparent,);
        let (width, height,) = svg_dimensions(svg,);
        let output = output.to_path_buf();
        let settle_delay = self.settle_delay;

        tokio::task::spawn_blocking(move || {
            let temp = TempPage::write(&output, &page,)?;
            let png = capture(temp.path(), width, height, transparent, settle_delay,)?;
            fs::write(&output, png,).map_err(|e| output_io_error(&output, e,),)
        },)
        .await
        .map_err(|e| Error::render(format!("rasterizer task failed: {e}"),),)?
    }
}

fn capture(
    page: &Path,
    width: u32,
    height: u32,
    transparent: bool,
    settle_delay: Duration,
) -> Result<Vec<u8,>, Error,>
{
    let url = file_url(page,)?;

    let browser = Browser::new(LaunchOptions {
        window_size: Some((width, height,),),
        ..Default::default()
    },)
    .map_err(|e| Error::render(format!("failed to launch browser: {e}"),),)?;

    let tab = browser.new_tab().map_err(|e| Error::render(format!("failed to open tab: {e}"),),)?;

    if transparent {
        tab.set_transparent_background_color()
            .map_err(|e| Error::render(format!("failed to clear background: {e}"),),)?;
    }

    debug!("Navigating to {} ({}x{})", url, width, height);
    tab.navigate_to(&url,)
        .map_err(|e| Error::render(format!("navigation failed: {e}"),),)?
        .wait_until_navigated()
        .map_err(|e| Error::render(format!("wait for navigation failed: {e}"),),)?;

    std::thread::sleep(settle_delay,);

    tab.call_method(DeviceMetricsOverride::new(width, height,),)
        .map_err(|e| Error::render(format!("failed to resize viewport: {e}"),),)?;
    std::thread::sleep(RESIZE_SETTLE,);

    let clip = Page::Viewport {
        x:      0.0,
        y:      0.0,
        width:  f64::from(width,),
        height: f64::from(height,),
        scale:  1.0,
    };
    tab.capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, Some(clip,), true,)
        .map_err(|e| Error::render(format!("screenshot failed: {e}"),),)
}

/// `Emulation.setDeviceMetricsOverride` pinning the viewport to the SVG size.
#[derive(Debug, Clone, PartialEq, Serialize,)]
#[serde(rename_all = "camelCase")]
struct DeviceMetricsOverride
{
    width:               u32,
    height:              u32,
    device_scale_factor: f64,
    mobile:              bool,
}

impl DeviceMetricsOverride
{
    fn new(width: u32, height: u32,) -> Self
    {
        Self {
            width,
            height,
            device_scale_factor: 1.0,
            mobile: false,
        }
    }
}

impl Method for DeviceMetricsOverride
{
    const NAME: &'static str = "Emulation.setDeviceMetricsOverride";
    type ReturnObject = serde_json::Value;
}

fn file_url(path: &Path,) -> Result<String, Error,>
{
    let absolute = std::path::absolute(path,)
        .map_err(|e| Error::render(format!("failed to resolve {}: {e}", path.display()),),)?;
    Ok(format!("file://{}", absolute.display()),)
}

/// Intrinsic pixel size of an SVG document.
///
/// Each dimension is read from the root `viewBox`, then from the matching
/// `width`/`height` attribute, and defaults to 800x900.
pub fn svg_dimensions(svg: &str,) -> (u32, u32,)
{
    let Some(root,) = SVG_ROOT.find(svg,).map(|found| found.as_str(),) else {
        return (FALLBACK_WIDTH, FALLBACK_HEIGHT,);
    };

    let view_box: Vec<&str,> = VIEW_BOX
        .captures(root,)
        .and_then(|captures| captures.get(1,),)
        .map(|value| value.as_str().split_whitespace().collect(),)
        .unwrap_or_default();

    let width = view_box
        .get(2,)
        .and_then(|value| parse_pixels(value,),)
        .or_else(|| attribute(&WIDTH_ATTR, root,),)
        .unwrap_or(FALLBACK_WIDTH,);
    let height = view_box
        .get(3,)
        .and_then(|value| parse_pixels(value,),)
        .or_else(|| attribute(&HEIGHT_ATTR, root,),)
        .unwrap_or(FALLBACK_HEIGHT,);

    (width, height,)
}

fn attribute(pattern: &Regex, root: &str,) -> Option<u32,>
{
    pattern.captures(root,).and_then(|captures| captures.get(1,),).and_then(|value| {
        parse_pixels(value.as_str(),)
    },)
}

fn parse_pixels(value: &str,) -> Option<u32,>
{
    let number = value.trim().trim_end_matches("px",).parse::<f64>().ok()?;
    (number.is_finite() && number >= 1.0).then(|| number as u32,)
}

/// Scratch HTML page removed when dropped.
#[derive(Debug,)]
struct TempPage
{
    path: PathBuf,
}

impl TempPage
{
    fn write(png_path: &Path, contents: &str,) -> Result<Self, Error,>
    {
        let directory = png_path.parent().filter(|parent| !parent.as_os_str().is_empty(),);
        let path = directory.unwrap_or_else(|| Path::new(".",),).join(TEMP_PAGE_NAME,);
        fs::write(&path, contents,).map_err(|e| output_io_error(&path, e,),)?;
        Ok(Self {
            path,
        },)
    }

    fn path(&self,) -> &Path
    {
        &self.path
    }
}

impl Drop for TempPage
{
    fn drop(&mut self,)
    {
        if let Err(error,) = fs::remove_file(&self.path,) {
            debug!("Failed to remove {}: {}", self.path.display(), error);
        }
    }
}
