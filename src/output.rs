//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Crop
//!
//! ```text
//! twitter 16:9 → out/twitter.png
//!     Source: photo.jpg (1000x1000)
//!     Selection: x 10.00% y 10.00% w 80.00% h 45.00%
//!     Region: 800x450 at 100,100
//! ```
//!
//! ## Crop all
//!
//! ```text
//! facebook: 800x419 → out/facebook.png
//! instagram: 800x800 → out/instagram.png
//! tiktok: failed: Invalid input: crop region 0x0 px is empty at this image size
//! Cropped 2 of 3 platforms
//! ```
//!
//! ## Overlay
//!
//! ```text
//! "Launch day" → poster.png
//!     Source: photo.jpg (1000x600)
//!     Font: 64.0px, baseline at 500,300
//! ```
//!
//! ## Platforms
//!
//! ```text
//! Platforms
//!     facebook         191:100  1.9100
//!     instagram        1:1      1.0000
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::crop::{CropSelection, CropSession};
use crate::imaging::{PercentRect, PixelRect};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

// ============================================================================
// Crop
// ============================================================================

/// Everything worth reporting about one applied crop.
///
/// Also the `--json` payload of the `crop` command.
#[derive(Debug, Clone, Serialize)]
pub struct CropReport {
    /// Platform name, or the ratio as typed.
    pub label: String,
    pub ratio: f64,
    pub source: String,
    pub source_size: (u32, u32),
    pub selection: CropSelection,
    pub rect: PercentRect,
    pub region: PixelRect,
    pub output: String,
}

impl CropReport {
    pub fn new(label: &str, session: &CropSession, source: &Path, output: &Path) -> Self {
        Self {
            label: label.to_string(),
            ratio: session.ratio().value(),
            source: source.display().to_string(),
            source_size: session.image().dimensions(),
            selection: session.selection(),
            rect: session.rect(),
            region: session.pixel_region(),
            output: output.display().to_string(),
        }
    }
}

pub fn format_crop_report(report: &CropReport) -> Vec<String> {
    let (w, h) = report.source_size;
    let r = &report.rect;
    let px = &report.region;
    vec![
        format!("{} → {}", report.label, report.output),
        format!("{}Source: {} ({}x{})", indent(1), report.source, w, h),
        format!(
            "{}Selection: x {:.2}% y {:.2}% w {:.2}% h {:.2}%",
            indent(1),
            r.x,
            r.y,
            r.width,
            r.height
        ),
        format!(
            "{}Region: {}x{} at {},{}",
            indent(1),
            px.width,
            px.height,
            px.x,
            px.y
        ),
    ]
}

pub fn print_crop_report(report: &CropReport) {
    for line in format_crop_report(report) {
        println!("{}", line);
    }
}

/// Result of one platform in `crop-all`.
#[derive(Debug, Clone)]
pub enum CropOutcome {
    Written(CropReport),
    Failed { label: String, error: String },
}

impl CropOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, CropOutcome::Written(_))
    }
}

pub fn format_crop_all_summary(outcomes: &[CropOutcome]) -> Vec<String> {
    let mut lines: Vec<String> = outcomes
        .iter()
        .map(|outcome| match outcome {
            CropOutcome::Written(report) => format!(
                "{}: {}x{} → {}",
                report.label, report.region.width, report.region.height, report.output
            ),
            CropOutcome::Failed { label, error } => format!("{}: failed: {}", label, error),
        })
        .collect();
    let written = outcomes.iter().filter(|o| o.is_written()).count();
    lines.push(format!(
        "Cropped {} of {} platforms",
        written,
        outcomes.len()
    ));
    lines
}

pub fn print_crop_all_summary(outcomes: &[CropOutcome]) {
    for line in format_crop_all_summary(outcomes) {
        println!("{}", line);
    }
}

// ============================================================================
// Overlay
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct OverlayReport {
    pub text: String,
    pub source: String,
    pub source_size: (u32, u32),
    pub size_px: f32,
    pub anchor: (f32, f32),
    pub output: String,
}

pub fn format_overlay_report(report: &OverlayReport) -> Vec<String> {
    let (w, h) = report.source_size;
    let headline = if report.text.is_empty() {
        "(no text)".to_string()
    } else {
        format!("{:?}", report.text)
    };
    let mut lines = vec![
        format!("{} → {}", headline, report.output),
        format!("{}Source: {} ({}x{})", indent(1), report.source, w, h),
    ];
    if !report.text.is_empty() {
        let (x, y) = report.anchor;
        lines.push(format!(
            "{}Font: {:.1}px, baseline at {},{}",
            indent(1),
            report.size_px,
            x.round(),
            y.round()
        ));
    }
    lines
}

pub fn print_overlay_report(report: &OverlayReport) {
    for line in format_overlay_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Platforms
// ============================================================================

pub fn format_platforms(platforms: &BTreeMap<String, [u32; 2]>) -> Vec<String> {
    let name_width = platforms.keys().map(|k| k.len()).max().unwrap_or(0);
    let aspects: Vec<String> = platforms.values().map(|[w, h]| format!("{w}:{h}")).collect();
    let aspect_width = aspects.iter().map(|a| a.len()).max().unwrap_or(0);

    let mut lines = vec!["Platforms".to_string()];
    for ((name, [w, h]), aspect) in platforms.iter().zip(&aspects) {
        lines.push(format!(
            "{}{:<nw$}  {:<aw$}  {:.4}",
            indent(1),
            name,
            aspect,
            *w as f64 / *h as f64,
            nw = name_width,
            aw = aspect_width,
        ));
    }
    lines
}

pub fn print_platforms(platforms: &BTreeMap<String, [u32; 2]>) {
    for line in format_platforms(platforms) {
        println!("{}", line);
    }
}
