// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! SVG composition of a computed [`Layout`].
//!
//! The composer is a pure function of the layout and the variant options, so
//! the opaque, transparent and dark-text variants are produced by calling it
//! three times.

use std::{borrow::Cow, fmt::Write as _, sync::LazyLock};

use regex::Regex;

use crate::layout::{Layout, PADDING, Section};

static CLIP_ID_SANITIZER: LazyLock<Regex,> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]",).expect("valid sanitizer pattern",),);

const FONT_IMPORT: &str =
    "https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600&amp;display=swap";
const UNDERLINE_MAX_WIDTH: f64 = 120.0;
const UNDERLINE_CHAR_WIDTH: f64 = 12.0;
const ACCENT_OFFSET: f64 = 20.0;
const DECORATED_SECTIONS: usize = 3;

/// Flags selecting a visual variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq,)]
pub struct ComposeOptions
{
    /// Omit the background rectangle.
    pub transparent: bool,
    /// Use dark text for light backgrounds.
    pub dark_text:   bool,
}

/// Output variant written on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct Variant
{
    /// Suffix appended to the configured file stem.
    pub suffix:  &'static str,
    /// Composer flags for the variant.
    pub options: ComposeOptions,
}

impl Variant
{
    /// Builds the file name for this variant with the given extension.
    pub fn file_name(&self, stem: &str, extension: &str,) -> String
    {
        format!("{stem}{}.{extension}", self.suffix)
    }

    /// Whether the PNG of this variant needs a transparent background.
    pub fn is_transparent(&self,) -> bool
    {
        self.options.transparent
    }
}

/// Variants in generation order; the first one is the primary variant.
pub const VARIANTS: [Variant; 3] = [
    Variant {
        suffix:  "",
        options: ComposeOptions {
            transparent: false, dark_text: false,
        },
    },
    Variant {
        suffix:  "-transparent",
        options: ComposeOptions {
            transparent: true, dark_text: false,
        },
    },
    Variant {
        suffix:  "-transparent-dark",
        options: ComposeOptions {
            transparent: true, dark_text: true,
        },
    },
];

struct Palette
{
    title_large:     &'static str,
    title_medium:    &'static str,
    title_small:     &'static str,
    header:          &'static str,
    line:            &'static str,
    title_line:      &'static str,
    ring:            &'static str,
    fallback_avatar: &'static str,
}

fn palette(dark_text: bool,) -> Palette
{
    if dark_text {
        Palette {
            title_large:     "#212121",
            title_medium:    "rgba(33,33,33,0.85)",
            title_small:     "rgba(33,33,33,0.6)",
            header:          "rgba(33,33,33,0.4)",
            line:            "rgba(33,33,33,0.08)",
            title_line:      "rgba(33,33,33,0.15)",
            ring:            "rgba(33,33,33,0.1)",
            fallback_avatar: "#e0e0e0",
        }
    } else {
        Palette {
            title_large:     "#fff",
            title_medium:    "rgba(255,255,255,0.85)",
            title_small:     "rgba(255,255,255,0.6)",
            header:          "rgba(255,255,255,0.4)",
            line:            "rgba(255,255,255,0.08)",
            title_line:      "rgba(255,255,255,0.15)",
            ring:            "rgba(255,255,255,0.1)",
            fallback_avatar: "#1a1a1a",
        }
    }
}

/// Renders `layout` into a standalone SVG document.
///
/// `header` is printed above the first tier. All text and attribute values
/// are XML-escaped.
pub fn compose_svg(layout: &Layout<'_,>, header: &str, options: ComposeOptions,) -> String
{
    let colors = palette(options.dark_text,);
    let width = layout.width;
    let height = layout.height;
    let center_x = layout.center_x();

    let mut svg = String::with_capacity(4096,);
    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",);
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" viewBox=\"0 0 {width} {height}\" width=\"{width}\" height=\"{height}\">",
    );

    write_style(&mut svg, &colors,);

    svg.push_str("<defs>\n",);
    svg.push_str(
        "<linearGradient id=\"bgGrad\" x1=\"0%\" y1=\"0%\" x2=\"0%\" y2=\"100%\">\n<stop offset=\"0%\" stop-color=\"#0a0a0a\"/>\n<stop offset=\"100%\" stop-color=\"#000000\"/>\n</linearGradient>\n",
    );
    for placement in layout.sections.iter().flat_map(|section| &section.placements,) {
        let radius = placement.size / 2.0;
        let _ = writeln!(
            svg,
            "<clipPath id=\"clip-{}\"><circle cx=\"{radius}\" cy=\"{radius}\" r=\"{radius}\"/></clipPath>",
            clip_id(&placement.sponsor.login,),
        );
    }
    svg.push_str("</defs>\n",);

    if !options.transparent {
        let _ = writeln!(
            svg,
            "<rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"url(#bgGrad)\"/>",
        );
    }

    write_accent_line(&mut svg, width, PADDING - ACCENT_OFFSET, colors.line,);
    let _ = writeln!(
        svg,
        "<text x=\"{center_x}\" y=\"{}\" text-anchor=\"middle\" class=\"header-text\">{}</text>",
        PADDING + 24.0,
        escape_xml(header,),
    );

    for section in &layout.sections {
        write_section(&mut svg, section, center_x, &colors,);
    }

    write_accent_line(&mut svg, width, height - PADDING + ACCENT_OFFSET, colors.line,);
    svg.push_str("</svg>",);
    svg
}

fn write_style(svg: &mut String, colors: &Palette,)
{
    let _ = writeln!(
        svg,
        "<style>\n@import url('{FONT_IMPORT}');\ntext {{ font-family: 'Inter', -apple-system, BlinkMacSystemFont, 'SF Pro Display', sans-serif; }}\n.tier-title {{ font-weight: 300; letter-spacing: 0.25em; text-transform: uppercase; }}\n.tier-title-large {{ font-size: 24px; fill: {}; }}\n.tier-title-medium {{ font-size: 18px; fill: {}; }}\n.tier-title-small {{ font-size: 14px; fill: {}; }}\n.header-text {{ font-weight: 500; font-size: 11px; letter-spacing: 0.3em; text-transform: uppercase; fill: {}; }}\na:hover g {{ opacity: 0.8; }}\n</style>",
        colors.title_large, colors.title_medium, colors.title_small, colors.header,
    );
}

fn write_accent_line(svg: &mut String, width: f64, y: f64, stroke: &str,)
{
    let _ = writeln!(
        svg,
        "<line x1=\"{PADDING}\" y1=\"{y}\" x2=\"{}\" y2=\"{y}\" stroke=\"{stroke}\" stroke-width=\"1\"/>",
        width - PADDING,
    );
}

fn write_section(svg: &mut String, section: &Section<'_,>, center_x: f64, colors: &Palette,)
{
    let title_class = title_class(section,);
    let title_y = section.title_y;
    let _ = writeln!(
        svg,
        "<text x=\"{center_x}\" y=\"{title_y}\" text-anchor=\"middle\" class=\"tier-title {title_class}\">{}</text>",
        escape_xml(&section.tier.title,),
    );

    if !section.is_past && section.rank < DECORATED_SECTIONS {
        let line_width = underline_width(&section.tier.title,);
        let _ = writeln!(
            svg,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
            center_x - line_width / 2.0,
            title_y + 12.0,
            center_x + line_width / 2.0,
            title_y + 12.0,
            colors.title_line,
        );
    }

    let opacity = if section.is_past { 0.5 } else { 1.0 };
    for placement in &section.placements {
        let sponsor = placement.sponsor;
        let size = placement.size;
        let half = size / 2.0;
        let profile: &str =
            if sponsor.profile_url.is_empty() { "#" } else { &sponsor.profile_url };

        let _ = writeln!(svg, "<a href=\"{}\" target=\"_blank\">", escape_xml(profile,));
        let _ = writeln!(
            svg,
            "<g transform=\"translate({}, {})\" opacity=\"{opacity}\">",
            placement.x, placement.y,
        );

        if !section.is_past {
            let _ = writeln!(
                svg,
                "<circle cx=\"{half}\" cy=\"{half}\" r=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1\"/>",
                half + 2.0,
                colors.ring,
            );
        }

        match sponsor.avatar_href() {
            Some(href,) => {
                let _ = writeln!(
                    svg,
                    "<image x=\"0\" y=\"0\" width=\"{size}\" height=\"{size}\" href=\"{}\" clip-path=\"url(#clip-{})\" preserveAspectRatio=\"xMidYMid slice\"/>",
                    escape_xml(href,),
                    clip_id(&sponsor.login,),
                );
            }
            None => {
                let _ = writeln!(
                    svg,
                    "<circle cx=\"{half}\" cy=\"{half}\" r=\"{half}\" fill=\"{}\"/>",
                    colors.fallback_avatar,
                );
            }
        }

        svg.push_str("</g>\n</a>\n",);
    }
}

fn title_class(section: &Section<'_,>,) -> &'static str
{
    if section.is_past {
        "tier-title-small"
    } else {
        match section.rank {
            0 => "tier-title-large",
            1 | 2 => "tier-title-medium",
            _ => "tier-title-small",
        }
    }
}

fn underline_width(title: &str,) -> f64
{
    UNDERLINE_MAX_WIDTH.min(title.chars().count() as f64 * UNDERLINE_CHAR_WIDTH,)
}

/// Maps a login onto a string usable inside an XML `id` attribute.
pub fn clip_id(login: &str,) -> Cow<'_, str,>
{
    CLIP_ID_SANITIZER.replace_all(login, "_",)
}

/// Escapes the five XML special characters.
pub fn escape_xml(value: &str,) -> Cow<'_, str,>
{
    if value.chars().any(|character| matches!(character, '&' | '<' | '>' | '\"' | '\''),) {
        let mut escaped = String::with_capacity(value.len() + 16,);
        for character in value.chars() {
            match character {
                '&' => escaped.push_str("&amp;",),
                '<' => escaped.push_str("&lt;",),
                '>' => escaped.push_str("&gt;",),
                '\"' => escaped.push_str("&quot;",),
                '\'' => escaped.push_str("&apos;",),
                other => escaped.push(other,),
            }
        }
        Cow::Owned(escaped,)
    } else {
        Cow::Borrowed(value,)
    }
}
