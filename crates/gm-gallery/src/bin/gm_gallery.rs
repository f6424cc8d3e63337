use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use gm_core::{ChannelStack, Image};
use gm_golgi::{CropConfig, CropReport, candidate_contours, evaluate_candidates};
use gm_measure::{DescribeConfig, GolgiDescriptors, RadialProfile, describe};
use gm_tile::{extract_patches, pad, predictions_to_mask, stitch, unpad};
use image::{GrayImage, ImageBuffer, Luma};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gm_gallery")]
#[command(about = "Run golgi-metrology stages on image files")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pad and cut an image into model-sized patches.
    #[command(name = "tiling")]
    Tiling(TilingArgs),
    /// Validate candidate contours of a probability mask.
    #[command(name = "validate")]
    Validate(ValidateArgs),
    /// Describe an already cropped Golgi stack.
    #[command(name = "profile")]
    Profile(ProfileArgs),
}

#[derive(Args, Debug, Clone)]
struct TilingArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    #[arg(long, default_value_t = 256)]
    patch_size: usize,
    /// Stride between patches; 206 leaves a 50 px overlap at the default size.
    #[arg(long, default_value_t = 206)]
    step: usize,
    /// Erase foreground components that touch a patch border.
    #[arg(long)]
    clear_edge_rois: bool,
    /// Directory of per-patch model outputs, row-major by file name, to
    /// stitch back into a full-size mask.
    #[arg(long)]
    predictions: Option<PathBuf>,
    #[arg(long, default_value = "out/tiling")]
    out: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct ValidateArgs {
    /// One grayscale image per channel, in channel order.
    #[arg(long, required = true, num_args = 1..)]
    channels: Vec<PathBuf>,
    /// Model probability map, 8-bit grayscale scaled to [0, 1].
    #[arg(long, required = true)]
    mask: PathBuf,
    /// JSON `CropConfig`; command-line values override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    marker_channel: Option<usize>,
    /// Channel left out of validation; `-1` for none.
    #[arg(long, allow_hyphen_values = true)]
    ignored_channel: Option<i64>,
    #[arg(long)]
    min_marker_area: Option<f64>,
    #[arg(long)]
    probability_threshold: Option<f64>,
    #[arg(long)]
    rect_size: Option<usize>,
    /// Do not require companion channels to overlap the marker.
    #[arg(long)]
    no_overlap: bool,
    /// Candidate contours are taken at `mask > mask_threshold`.
    #[arg(long, default_value_t = 0.5)]
    mask_threshold: f32,
    #[arg(long, default_value = "out/validate")]
    out: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct ProfileArgs {
    #[arg(long, required = true, num_args = 1..)]
    channels: Vec<PathBuf>,
    #[arg(long, default_value_t = 0)]
    marker_channel: usize,
    /// Scale every channel to this total intensity before profiling.
    #[arg(long)]
    target_total_intensity: Option<f64>,
    #[arg(long, default_value = "out/profile")]
    out: PathBuf,
}

// ── JSON DTOs ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
struct MetaTiling {
    width: usize,
    height: usize,
    padded_side: usize,
    padding: [usize; 4],
    patch_size: usize,
    step: usize,
    rows: usize,
    cols: usize,
    clear_edge_rois: bool,
    round_trip_exact: bool,
    stitched_mask: bool,
}

#[derive(Debug, Clone, Serialize)]
struct MetaValidate {
    width: usize,
    height: usize,
    channels: usize,
    candidates: usize,
    accepted: usize,
    final_floors: Vec<u32>,
    elapsed_ms: f64,
    config: CropConfig,
}

#[derive(Debug, Clone, Serialize)]
struct DescribedCrop {
    candidate: usize,
    origin: (usize, usize),
    descriptors: GolgiDescriptors,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Tiling(args) => run_tiling(args),
        Command::Validate(args) => run_validate(args),
        Command::Profile(args) => run_profile(args),
    }
}

fn run_tiling(args: TilingArgs) -> Result<()> {
    ensure_file_exists(&args.input, "input")?;
    let out = prepare_out_dir(&args.out)?;
    let img = load_input_u8(&args.input)?;

    let padded = pad(&img.as_view(), args.patch_size, args.step)
        .with_context(|| format!("padding {}", args.input.display()))?;
    let grid = extract_patches(
        &padded.image.as_view(),
        args.patch_size,
        args.step,
        args.clear_edge_rois,
    )
    .context("extracting patches")?;

    let patch_dir = out.join("patches");
    fs::create_dir_all(&patch_dir)
        .with_context(|| format!("creating output directory {}", patch_dir.display()))?;
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let patch = grid
                .get(row, col)
                .expect("patch index validated by loop bounds");
            save_u8_image(patch_dir.join(format!("patch_{row:03}_{col:03}.png")), patch)?;
        }
    }

    let stitched = stitch(&grid, (padded.target, padded.target));
    let restored = unpad(&stitched, &padded.padding).context("removing padding")?;
    save_u8_image(out.join("stitched.png"), &restored)?;

    let stitched_mask = match &args.predictions {
        Some(dir) => {
            let predictions = load_predictions(dir)?;
            let mask = predictions_to_mask(predictions, args.patch_size, args.step)
                .context("stitching predictions")?;
            let mask = unpad(&mask, &padded.padding).context("removing padding from mask")?;
            save_u8_image(
                out.join("mask.png"),
                &mask.map(|&p| (p * 255.0).round().clamp(0.0, 255.0) as u8),
            )?;
            true
        }
        None => false,
    };

    let p = padded.padding;
    println!(
        "tiled {}x{} into {}x{} patches of {}px",
        img.width(),
        img.height(),
        grid.rows,
        grid.cols,
        args.patch_size
    );

    write_json(
        out.join("meta.json"),
        &MetaTiling {
            width: img.width(),
            height: img.height(),
            padded_side: padded.target,
            padding: [p.left, p.top, p.right, p.bottom],
            patch_size: args.patch_size,
            step: args.step,
            rows: grid.rows,
            cols: grid.cols,
            clear_edge_rois: args.clear_edge_rois,
            round_trip_exact: restored == img,
            stitched_mask,
        },
    )
}

fn run_validate(args: ValidateArgs) -> Result<()> {
    ensure_file_exists(&args.mask, "mask")?;
    let out = prepare_out_dir(&args.out)?;

    let stack = load_stack_u16(&args.channels)?;
    let mask = load_mask_f32(&args.mask)?;
    if mask.shape() != stack.shape() {
        bail!(
            "mask dimensions {:?} do not match channel dimensions {:?}.",
            mask.shape(),
            stack.shape()
        );
    }

    let cfg = resolve_crop_config(&args)?;
    if cfg.validation.marker_channel >= stack.num_channels() {
        bail!(
            "marker channel {} out of range for {} channels.",
            cfg.validation.marker_channel,
            stack.num_channels()
        );
    }

    let t0 = Instant::now();
    let candidates = candidate_contours(&mask, args.mask_threshold);
    let (evaluations, state) = evaluate_candidates(&stack, &mask, &candidates, &cfg)
        .context("evaluating candidate contours")?;
    let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;

    let describe_cfg = DescribeConfig {
        marker_channel: cfg.validation.marker_channel,
        ..DescribeConfig::default()
    };
    let mut described = Vec::new();
    for (i, eval) in evaluations.iter().enumerate() {
        let (Some(clean), Some(marker_mask)) = (&eval.clean, eval.marker_mask()) else {
            continue;
        };
        save_u8_image(
            out.join(format!("mask_{i:04}.png")),
            &marker_mask.map(|&v| v * 255),
        )?;
        match describe(clean, &describe_cfg) {
            Ok(descriptors) => described.push(DescribedCrop {
                candidate: i,
                origin: eval.origin,
                descriptors,
            }),
            Err(err) => tracing::warn!(candidate = i, %err, "crop could not be described"),
        }
    }

    let reports: Vec<CropReport> = evaluations.iter().map(|e| e.report()).collect();
    let accepted = reports.iter().filter(|r| r.accepted).count();
    println!(
        "{} candidates, {accepted} accepted ({elapsed_ms:.2} ms)",
        candidates.len()
    );

    write_json(out.join("evaluations.json"), &reports)?;
    write_json(out.join("descriptors.json"), &described)?;
    write_json(
        out.join("meta.json"),
        &MetaValidate {
            width: stack.width(),
            height: stack.height(),
            channels: stack.num_channels(),
            candidates: candidates.len(),
            accepted,
            final_floors: state.floors,
            elapsed_ms,
            config: cfg,
        },
    )
}

fn run_profile(args: ProfileArgs) -> Result<()> {
    let out = prepare_out_dir(&args.out)?;
    let stack = load_stack_u16(&args.channels)?;

    let cfg = DescribeConfig {
        marker_channel: args.marker_channel,
        target_total_intensity: args.target_total_intensity,
        ..DescribeConfig::default()
    };
    let descriptors = describe(&stack, &cfg).context("describing crop")?;

    for profile in &descriptors.profiles {
        write_profile_csv(out.join(format!("profile_c{}.csv", profile.channel)), profile)?;
    }
    println!(
        "center of mass ({:.2}, {:.2}), gyradius {:.2}, radii {:?}",
        descriptors.center_of_mass.0,
        descriptors.center_of_mass.1,
        descriptors.gyradius,
        descriptors.radii
    );

    write_json(out.join("descriptors.json"), &descriptors)
}

/// File config first, then explicit command-line overrides.
fn resolve_crop_config(args: &ValidateArgs) -> Result<CropConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            ensure_file_exists(path, "config")?;
            read_json::<CropConfig>(path)?
        }
        None => CropConfig::default(),
    };

    let v = &mut cfg.validation;
    if let Some(c) = args.marker_channel {
        v.marker_channel = c;
    }
    if let Some(c) = args.ignored_channel {
        v.ignored_channel = match c {
            -1 => None,
            c if c >= 0 => Some(c as usize),
            c => bail!("ignored channel must be -1 or a channel index, got {c}."),
        };
    }
    if let Some(a) = args.min_marker_area {
        v.min_marker_area = a;
    }
    if let Some(p) = args.probability_threshold {
        v.probability_threshold = p;
    }
    if args.no_overlap {
        v.channels_overlap = false;
    }
    if let Some(r) = args.rect_size {
        cfg.rect_size = r;
    }
    Ok(cfg)
}

fn prepare_out_dir(out: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out)
        .with_context(|| format!("creating output directory {}", out.display()))?;
    Ok(out.to_path_buf())
}

fn load_input_u8(path: &Path) -> Result<Image<u8>> {
    let dyn_img =
        image::open(path).with_context(|| format!("opening input image {}", path.display()))?;
    let luma = dyn_img.to_luma8();
    let (w, h) = luma.dimensions();

    Image::from_vec(w as usize, h as usize, luma.into_raw())
        .with_context(|| format!("constructing gm-core image from {}", path.display()))
}

fn load_input_u16(path: &Path) -> Result<Image<u16>> {
    ensure_file_exists(path, "channel")?;
    let dyn_img =
        image::open(path).with_context(|| format!("opening channel image {}", path.display()))?;
    let luma = dyn_img.to_luma16();
    let (w, h) = luma.dimensions();

    Image::from_vec(w as usize, h as usize, luma.into_raw())
        .with_context(|| format!("constructing gm-core image from {}", path.display()))
}

fn load_stack_u16(paths: &[PathBuf]) -> Result<ChannelStack<u16>> {
    let channels = paths
        .iter()
        .map(|p| load_input_u16(p))
        .collect::<Result<Vec<_>>>()?;
    ChannelStack::from_channels(channels).context("stacking channel images")
}

fn load_mask_f32(path: &Path) -> Result<Image<f32>> {
    Ok(load_input_u8(path)?.map(|&v| f32::from(v) / 255.0))
}

fn load_predictions(dir: &Path) -> Result<Vec<Image<f32>>> {
    let mut paths = fs::read_dir(dir)
        .with_context(|| format!("listing predictions in {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("listing predictions in {}", dir.display()))?;
    paths.retain(|p| p.extension().is_some_and(|e| e.eq_ignore_ascii_case("png")));
    paths.sort();
    if paths.is_empty() {
        bail!("no png predictions found in {}", dir.display());
    }
    paths.iter().map(|p| load_mask_f32(p)).collect()
}

fn save_u8_image(path: PathBuf, img: &Image<u8>) -> Result<()> {
    let gray: GrayImage = ImageBuffer::<Luma<u8>, _>::from_raw(
        img.width() as u32,
        img.height() as u32,
        img.data().to_vec(),
    )
    .context("constructing GrayImage from raw bytes")?;
    gray.save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing json {}", path.display()))
}

fn write_profile_csv(path: PathBuf, profile: &RadialProfile) -> Result<()> {
    let mut file =
        fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    writeln!(
        file,
        "index,count,total_intensity,mean_intensity,normalized_mean_intensity"
    )
    .context("writing csv header")?;
    for b in &profile.buckets {
        writeln!(
            file,
            "{},{},{},{},{}",
            b.index,
            b.count,
            b.total_intensity,
            b.mean_intensity.map(|m| m.to_string()).unwrap_or_default(),
            b.normalized_mean_intensity
                .map(|m| m.to_string())
                .unwrap_or_default()
        )
        .context("writing csv row")?;
    }
    Ok(())
}

fn ensure_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", what, path.display());
    }
    Ok(())
}
