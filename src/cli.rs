// ============================================================================
// CutoutFE CLI — headless batch background removal and editing
// ============================================================================
//
// Usage examples:
//   cutoutfe -i photo.jpg --mask photo-mask.png
//   cutoutfe -i shots/*.jpg --mask-dir masks/ --output-dir out/ --preset vivid
//   cutoutfe -i cutout.png --wand 3,3 --crop 10,10,200,150 --rotate 90
//
// Each file runs its pipeline sequentially; files are processed in parallel.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use rayon::prelude::*;

use crate::components::crop::CropRect;
use crate::components::tools::{GestureEvent, Tool};
use crate::io::{self, SUPPORTED_EXTENSIONS};
use crate::ops::filters::{FilterPreset, FilterStack};
use crate::ops::transform::QuarterTurn;
use crate::segmentation::{KeepAlphaSegmenter, MaskFileSegmenter, Segmenter};
use crate::session::EditorSession;
use crate::settings::EditorSettings;
use crate::viewport::Point;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// CutoutFE headless cut-out processor.
#[derive(Parser, Debug, Default)]
#[command(
    name = "cutoutfe",
    about = "Background-removed photo editor, batch mode",
    long_about = "Apply a segmentation mask to each input image, optionally edit the\n\
                  result (magic wand, crop, flips, rotation, filters) and export it\n\
                  as a transparent PNG named <stem>-no-bg.png.\n\n\
                  Example:\n  \
                  cutoutfe -i photo.jpg --mask photo-mask.png\n  \
                  cutoutfe -i *.jpg --mask-dir masks/ --output-dir out/ --preset noir"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.jpg", "shots/*.png").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Grayscale mask image applied to every input. Resized to fit.
    #[arg(long, value_name = "FILE", conflicts_with = "mask_dir")]
    pub mask: Option<PathBuf>,

    /// Directory holding one mask per input, matched by file stem.
    /// Without --mask or --mask-dir the input's own alpha channel is kept.
    #[arg(long, value_name = "DIR")]
    pub mask_dir: Option<PathBuf>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Filter preset: none, vivid, vintage, noir, warm, cool, fade, dramatic.
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Brightness percent (0–200, 100 = unchanged).
    #[arg(long)]
    pub brightness: Option<f32>,

    /// Contrast percent (0–200).
    #[arg(long)]
    pub contrast: Option<f32>,

    /// Saturation percent (0–200).
    #[arg(long)]
    pub saturation: Option<f32>,

    /// Hue rotation in degrees (-180–180).
    #[arg(long, allow_hyphen_values = true)]
    pub hue: Option<f32>,

    /// Blur radius in pixels (0–10).
    #[arg(long)]
    pub blur: Option<f32>,

    /// Sepia percent (0–100).
    #[arg(long)]
    pub sepia: Option<f32>,

    /// Grayscale percent (0–100).
    #[arg(long)]
    pub grayscale: Option<f32>,

    /// Invert percent (0–100).
    #[arg(long)]
    pub invert: Option<f32>,

    /// Opacity percent (0–100).
    #[arg(long)]
    pub opacity: Option<f32>,

    #[arg(long)]
    pub flip_h: bool,

    #[arg(long)]
    pub flip_v: bool,

    /// Quarter-turn rotation: 90, -90, 180 or 270.
    #[arg(long, allow_hyphen_values = true, value_name = "DEG")]
    pub rotate: Option<i32>,

    /// Free rotation in degrees applied at export (canvas size kept).
    #[arg(long, allow_hyphen_values = true, value_name = "DEG")]
    pub angle: Option<f32>,

    /// Crop rectangle in image pixels, after any --wand clicks.
    #[arg(long, value_name = "X,Y,W,H")]
    pub crop: Option<String>,

    /// Magic-wand click position in image pixels. Repeatable.
    #[arg(long, value_name = "X,Y")]
    pub wand: Vec<String>,

    /// Magic-wand colour tolerance (0–100).
    #[arg(long)]
    pub tolerance: Option<f32>,

    /// Settings JSON file (defaults to the user config file).
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Per-file timing and log lines on stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Everything parsed from the arguments that every file shares.
#[derive(Debug, Clone)]
struct Plan {
    settings: EditorSettings,
    wand: Vec<(u32, u32)>,
    crop: Option<(u32, u32, u32, u32)>,
    flip_h: bool,
    flip_v: bool,
    turn: Option<QuarterTurn>,
    filters: FilterStack,
    angle: f32,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let plan = match build_plan(&args) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
        return ExitCode::FAILURE;
    }

    let total = inputs.len();
    log::info!("batch: {} file(s)", total);

    let failures: usize = inputs
        .par_iter()
        .map(|input_path| {
            let file_start = Instant::now();
            let Some(output_path) =
                build_output_path(input_path, args.output.as_deref(), args.output_dir.as_deref())
            else {
                eprintln!("error: cannot determine output path for '{}'.", input_path.display());
                return 1;
            };
            let mask = match mask_for(input_path, args.mask.as_deref(), args.mask_dir.as_deref()) {
                Ok(mask) => mask,
                Err(e) => {
                    eprintln!("error: {}: {}", input_path.display(), e);
                    return 1;
                }
            };
            match run_one(input_path, &output_path, mask.as_deref(), &plan) {
                Ok(()) => {
                    if args.verbose || total > 1 {
                        println!(
                            "{} → {} ({:.0}ms)",
                            input_path.display(),
                            output_path.display(),
                            file_start.elapsed().as_secs_f64() * 1000.0
                        );
                    }
                    0
                }
                Err(e) => {
                    log::error!("{}: {}", input_path.display(), e);
                    eprintln!("error: {}: {}", input_path.display(), e);
                    1
                }
            }
        })
        .sum();

    if failures > 0 {
        log::warn!("batch: {} of {} file(s) failed", failures, total);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn build_plan(args: &CliArgs) -> Result<Plan, String> {
    let mut settings = match &args.settings {
        Some(path) => EditorSettings::load_from(path)
            .map_err(|e| format!("could not read settings '{}': {}", path.display(), e))?,
        None => EditorSettings::load().unwrap_or_else(|e| {
            log::warn!("settings unavailable, using defaults: {}", e);
            EditorSettings::default()
        }),
    };
    if let Some(t) = args.tolerance {
        settings.tolerance = t;
    }

    let mut filters = match &args.preset {
        Some(name) => FilterPreset::from_name(name)
            .ok_or_else(|| format!("unknown preset '{}'", name))?
            .stack(),
        None => FilterStack::default(),
    };
    let overrides = [
        (args.brightness, &mut filters.brightness),
        (args.contrast, &mut filters.contrast),
        (args.saturation, &mut filters.saturation),
        (args.hue, &mut filters.hue),
        (args.blur, &mut filters.blur),
        (args.sepia, &mut filters.sepia),
        (args.grayscale, &mut filters.grayscale),
        (args.invert, &mut filters.invert),
        (args.opacity, &mut filters.opacity),
    ];
    for (value, slot) in overrides {
        if let Some(v) = value {
            *slot = v;
        }
    }

    let turn = match args.rotate {
        Some(deg) => Some(
            QuarterTurn::from_degrees(deg).ok_or_else(|| format!("--rotate must be a multiple of 90, got {}", deg))?,
        ),
        None => None,
    };

    let crop = args.crop.as_deref().map(parse_crop).transpose()?;
    let wand = args.wand.iter().map(|s| parse_pair(s)).collect::<Result<Vec<_>, _>>()?;

    Ok(Plan {
        settings: settings.sanitized(),
        wand,
        crop,
        flip_h: args.flip_h,
        flip_v: args.flip_v,
        turn,
        filters,
        angle: args.angle.unwrap_or(0.0),
    })
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(input: &Path, output: &Path, mask: Option<&Path>, plan: &Plan) -> Result<(), String> {
    // -- Step 1: Load + segment -----------------------------------------
    let bytes = std::fs::read(input).map_err(|e| format!("load failed: {}", e))?;
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let mut session = match mask {
        Some(path) => open(&name, &bytes, &MaskFileSegmenter::new(path), plan)?,
        None => open(&name, &bytes, &KeepAlphaSegmenter, plan)?,
    };

    // -- Step 2: Edit ---------------------------------------------------
    for &(x, y) in &plan.wand {
        let click = GestureEvent::Down(Point::new(x as f32 + 0.5, y as f32 + 0.5));
        session.apply_tool(Tool::MagicWand, &[click]);
    }
    if let Some((x, y, w, h)) = plan.crop {
        session.set_crop_selection(CropRect::new(x as f32, y as f32, w as f32, h as f32));
        if !session.commit_crop() {
            return Err(format!("crop {}x{} rejected (below minimum size or outside the image)", w, h));
        }
    }
    if plan.flip_h {
        session.flip_horizontal();
    }
    if plan.flip_v {
        session.flip_vertical();
    }
    if let Some(turn) = plan.turn {
        session.rotate(turn);
    }
    session.set_filter(plan.filters);
    session.set_rotation(plan.angle);

    // -- Step 3: Export -------------------------------------------------
    session.export_to(output).map_err(|e| format!("save failed: {}", e))?;
    session.close();
    Ok(())
}

fn open<S: Segmenter>(name: &str, bytes: &[u8], segmenter: &S, plan: &Plan) -> Result<EditorSession, String> {
    pollster::block_on(EditorSession::open(name, bytes, segmenter, plan.settings.clone()))
        .map_err(|e| e.to_string())
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !io::is_supported_extension(&entry) {
                        continue;
                    }
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no image files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// The mask to use for `input`: the shared `--mask`, a same-stem file in
/// `--mask-dir`, or none (keep the input's alpha).
fn mask_for(input: &Path, mask: Option<&Path>, mask_dir: Option<&Path>) -> Result<Option<PathBuf>, String> {
    if let Some(m) = mask {
        return Ok(Some(m.to_path_buf()));
    }
    let Some(dir) = mask_dir else {
        return Ok(None);
    };
    let stem = input
        .file_stem()
        .ok_or_else(|| "input has no file name".to_string())?
        .to_string_lossy();
    SUPPORTED_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|p| p.is_file())
        .map(Some)
        .ok_or_else(|| format!("no mask named '{}.*' in {}", stem, dir.display()))
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, single-file input)
/// 2. `--output-dir` joined with `<stem>-no-bg.png`
/// 3. `<stem>-no-bg.png` beside the input
fn build_output_path(input: &Path, output: Option<&Path>, output_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }
    let file_name = io::output_file_name(&input.file_name()?.to_string_lossy());
    match output_dir {
        Some(dir) => Some(dir.join(file_name)),
        None => Some(input.with_file_name(file_name)),
    }
}

/// `"12,34"` → `(12, 34)`.
fn parse_pair(s: &str) -> Result<(u32, u32), String> {
    let nums = parse_list(s, 2)?;
    Ok((nums[0], nums[1]))
}

/// `"X,Y,W,H"` → `(x, y, w, h)`.
fn parse_crop(s: &str) -> Result<(u32, u32, u32, u32), String> {
    let nums = parse_list(s, 4)?;
    Ok((nums[0], nums[1], nums[2], nums[3]))
}

fn parse_list(s: &str, expected: usize) -> Result<Vec<u32>, String> {
    let nums = s
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid number list '{}': {}", s, e))?;
    if nums.len() != expected {
        return Err(format!("expected {} comma-separated values, got '{}'", expected, s));
    }
    Ok(nums)
}
