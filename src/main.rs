use brandkit::config::{self, BrandConfig};
use brandkit::crop::CropEngine;
use brandkit::imaging::{CpuBackend, RasterImage, TargetRatio, effective_font_size, text_anchor};
use brandkit::output::{self, CropOutcome, CropReport, OverlayReport};
use brandkit::overlay::OverlayCompositor;
use brandkit::types::ComposeError;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "brandkit")]
#[command(about = "Crop and caption campaign images for social platforms")]
#[command(long_about = "\
Crop and caption campaign images for social platforms

Crops keep the source resolution and lock the selection to the platform's
aspect ratio. The selection starts at 10%,10% with 80% width and can be
moved with --drag, which re-centers it on a pointer position given in
percent of the image (repeat to replay a drag).

Overlays draw one line of centered text with a soft shadow. Font size is
given for a 500px-wide image and scaled to the real width.

Run 'brandkit gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Pointer positions replayed through the selection before cropping.
#[derive(clap::Args, Clone)]
struct DragArgs {
    /// Re-center the selection on X,Y (percent); repeatable
    #[arg(long = "drag", value_name = "X,Y", value_parser = parse_point)]
    drags: Vec<(f64, f64)>,
}

#[derive(Subcommand)]
enum Command {
    /// Crop an image to one platform or aspect ratio
    Crop {
        input: PathBuf,
        /// Configured platform name (see `brandkit platforms`)
        #[arg(long, conflicts_with = "ratio", required_unless_present = "ratio")]
        platform: Option<String>,
        /// Aspect ratio as W:H, W/H or a decimal
        #[arg(long)]
        ratio: Option<TargetRatio>,
        #[command(flatten)]
        drag: DragArgs,
        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
        /// Print the crop as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Crop an image once per configured platform
    CropAll {
        input: PathBuf,
        /// Directory receiving one <platform>.png per platform
        #[arg(long)]
        out_dir: PathBuf,
        #[command(flatten)]
        drag: DragArgs,
    },
    /// Draw a line of text over an image
    Overlay {
        input: PathBuf,
        #[arg(long)]
        text: String,
        #[arg(long)]
        font_family: Option<String>,
        #[arg(long)]
        font_weight: Option<String>,
        /// Hex color (#rgb, #rrggbb or #rrggbbaa)
        #[arg(long)]
        color: Option<String>,
        /// Font size in px at 500px image width (10-100)
        #[arg(long)]
        size: Option<u32>,
        /// Baseline position in percent of the image height
        #[arg(long)]
        position: Option<u32>,
        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List configured platforms and their ratios
    Platforms,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Crop {
            input,
            platform,
            ratio,
            drag,
            output: dest,
            json,
        } => {
            let config = config::load_config(&cli.config)?;
            let (label, ratio) = match (platform, ratio) {
                (Some(name), _) => {
                    let ratio = config
                        .platform_ratio(&name)
                        .ok_or_else(|| format!("unknown platform {name:?}"))?;
                    (name, ratio)
                }
                (None, Some(ratio)) => (ratio.to_string(), ratio),
                (None, None) => return Err("either --platform or --ratio is required".into()),
            };
            let engine = crop_engine(&config)?;
            let image = Arc::new(RasterImage::open(&input)?);
            let report = crop_to_file(&engine, image, &label, ratio, &drag.drags, &input, &dest)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_crop_report(&report);
            }
        }
        Command::CropAll {
            input,
            out_dir,
            drag,
        } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let engine = crop_engine(&config)?;
            let image = Arc::new(RasterImage::open(&input)?);
            std::fs::create_dir_all(&out_dir)?;

            let platforms: Vec<(&String, &[u32; 2])> = config.platforms.iter().collect();
            let outcomes: Vec<CropOutcome> = platforms
                .par_iter()
                .map(|&(name, &[w, h])| {
                    let dest = out_dir.join(format!("{name}.png"));
                    TargetRatio::from_aspect(w, h)
                        .map_err(|e| e.to_string())
                        .and_then(|ratio| {
                            crop_to_file(
                                &engine,
                                Arc::clone(&image),
                                name,
                                ratio,
                                &drag.drags,
                                &input,
                                &dest,
                            )
                            .map_err(|e| e.to_string())
                        })
                        .map_or_else(
                            |error| CropOutcome::Failed {
                                label: name.to_string(),
                                error,
                            },
                            CropOutcome::Written,
                        )
                })
                .collect();

            output::print_crop_all_summary(&outcomes);
            let failed = outcomes.iter().filter(|o| !o.is_written()).count();
            if failed > 0 {
                return Err(format!("{failed} platform(s) failed").into());
            }
        }
        Command::Overlay {
            input,
            text,
            font_family,
            font_weight,
            color,
            size,
            position,
            output: dest,
        } => {
            let config = config::load_config(&cli.config)?;
            let mut style = config.overlay.style(&text);
            if let Some(family) = font_family {
                style.font_family = family;
            }
            if let Some(weight) = font_weight {
                style.font_weight = weight;
            }
            if let Some(color) = color {
                style.color = color;
            }
            if let Some(size) = size {
                style.font_size = size;
            }
            if let Some(position) = position {
                style.position_y = position;
            }

            let compositor = OverlayCompositor::new(overlay_backend(&config, &cli.config)?);
            let image = RasterImage::open(&input)?;
            let rendered = compositor.render(&image, &style)?;
            rendered.save_png(&dest)?;

            let (width, height) = image.dimensions();
            output::print_overlay_report(&OverlayReport {
                text: style.text,
                source: input.display().to_string(),
                source_size: (width, height),
                size_px: effective_font_size(style.font_size, width),
                anchor: text_anchor((width, height), style.position_y),
                output: dest.display().to_string(),
            });
        }
        Command::Platforms => {
            let config = config::load_config(&cli.config)?;
            output::print_platforms(&config.platforms);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Begin a crop, replay the drags, apply it and write the PNG.
fn crop_to_file(
    engine: &CropEngine<CpuBackend>,
    image: Arc<RasterImage>,
    label: &str,
    ratio: TargetRatio,
    drags: &[(f64, f64)],
    source: &Path,
    dest: &Path,
) -> Result<CropReport, ComposeError> {
    let session = drags
        .iter()
        .fold(engine.begin_crop(image, ratio.value())?, |session, &(x, y)| {
            session.update_selection(x, y)
        });
    let report = CropReport::new(label, &session, source, dest);
    engine.apply_crop(session)?.save_png(dest)?;
    Ok(report)
}

/// Backend with the configured font book, for text rendering.
fn overlay_backend(
    config: &BrandConfig,
    config_dir: &Path,
) -> Result<CpuBackend, Box<dyn std::error::Error>> {
    let fonts = config.fonts.build(config_dir)?;
    let backend =
        CpuBackend::new(Arc::new(fonts)).with_max_dimension(config.render.max_dimension);
    tracing::debug!(
        faces = backend.fonts().face_count(),
        system = backend.fonts().system_fonts_enabled(),
        "font book ready"
    );
    Ok(backend)
}

/// Crops draw no text, so the engine gets a backend without fonts.
fn crop_engine(config: &BrandConfig) -> Result<CropEngine<CpuBackend>, ComposeError> {
    let backend = CpuBackend::default().with_max_dimension(config.render.max_dimension);
    CropEngine::new(backend).with_initial(config.crop.selection())
}

/// Parse a `X,Y` pointer position in percent.
fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| format!("invalid coordinate {v:?}"))
    };
    Ok((parse(x)?, parse(y)?))
}

/// Install the stderr log subscriber.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. The user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_point_accepts_pairs() {
        assert_eq!(parse_point("5,5"), Ok((5.0, 5.0)));
        assert_eq!(parse_point(" 12.5 , 90 "), Ok((12.5, 90.0)));
    }

    #[test]
    fn parse_point_rejects_garbage() {
        assert!(parse_point("5").is_err());
        assert!(parse_point("a,b").is_err());
        assert!(parse_point("NaN,1").is_err());
    }

    #[test]
    fn cli_parses_crop_with_drags() {
        let cli = Cli::try_parse_from([
            "brandkit", "crop", "in.jpg", "--ratio", "16:9", "--drag", "5,5", "--drag",
            "50,50", "-o", "out.png",
        ])
        .unwrap();
        match cli.command {
            Command::Crop { ratio, drag, .. } => {
                assert!((ratio.unwrap().value() - 16.0 / 9.0).abs() < 1e-12);
                assert_eq!(drag.drags, vec![(5.0, 5.0), (50.0, 50.0)]);
            }
            _ => panic!("expected crop"),
        }
    }

    #[test]
    fn cli_crop_needs_platform_or_ratio() {
        assert!(Cli::try_parse_from(["brandkit", "crop", "in.jpg", "-o", "out.png"]).is_err());
        assert!(
            Cli::try_parse_from([
                "brandkit", "crop", "in.jpg", "--platform", "twitter", "--ratio", "1:1", "-o",
                "out.png",
            ])
            .is_err()
        );
    }

    #[test]
    fn crop_engine_ignores_font_faces() {
        let mut config = BrandConfig::default();
        config.fonts.faces.push(config::FaceConfig {
            family: "Gone".into(),
            weight: 400,
            path: "missing/font.ttf".into(),
        });
        assert!(overlay_backend(&config, Path::new(".")).is_err());

        let engine = crop_engine(&config).unwrap();
        let image = RasterImage::from_rgba(image::RgbaImage::new(100, 100));
        let session = engine.begin_crop(image, 1.0).unwrap();
        assert_eq!(engine.apply_crop(session).unwrap().dimensions(), (80, 80));
    }

    #[test]
    fn cli_counts_verbosity() {
        let cli = Cli::try_parse_from(["brandkit", "-vv", "platforms"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
