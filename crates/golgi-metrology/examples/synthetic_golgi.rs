//! Run the full validation and measurement chain on a synthetic field of
//! view: giantin rings in channel 0, filled companion disks in channel 1, and
//! a matching probability mask.
//!
//! ```text
//! cargo run -p golgi-metrology --example synthetic_golgi -- --count 6
//! RUST_LOG=gm_golgi=debug cargo run -p golgi-metrology --example synthetic_golgi
//! ```

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use golgi_metrology::{
    ChannelStack, CropConfig, DescribeConfig, Image, candidate_contours, describe,
    evaluate_candidates,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Validate and profile synthetic Golgi rings")]
struct Args {
    /// Number of rings, laid out on a row every 40 px.
    #[arg(long, default_value_t = 4)]
    count: usize,

    /// Uniform background added to every channel.
    #[arg(long, default_value_t = 30)]
    background: u16,

    /// Peak marker intensity.
    #[arg(long, default_value_t = 1200)]
    marker: u16,

    /// Write the summary here instead of stdout.
    #[arg(long)]
    out: Option<String>,
}

// ── JSON DTOs ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CandidateDto {
    origin: (usize, usize),
    accepted: bool,
    message: String,
    gyradius: Option<f64>,
    radii: Vec<Option<usize>>,
}

#[derive(Serialize)]
struct Summary {
    width: usize,
    height: usize,
    elapsed_ms: f64,
    final_floors: Vec<u32>,
    candidates: Vec<CandidateDto>,
}

// ── Scene ─────────────────────────────────────────────────────────────────────

fn synthetic_scene(args: &Args) -> Result<(ChannelStack<u16>, Image<f32>)> {
    let (w, h) = (40 * args.count + 40, 80);
    let mut marker = Image::new_fill(w, h, args.background);
    let mut companion = Image::new_fill(w, h, args.background);
    let mut mask = Image::new_fill(w, h, 0.0f32);

    for i in 0..args.count {
        let (cx, cy) = (40.5 + 40.0 * i as f64, 40.5);
        for y in 0..h {
            for x in 0..w {
                let d = (x as f64 - cx).hypot(y as f64 - cy);
                if d > 5.0 && d <= 12.0 {
                    *marker.get_mut(x, y).context("marker pixel")? = args.marker;
                }
                if d <= 8.0 {
                    *companion.get_mut(x, y).context("companion pixel")? = args.marker / 2;
                }
                if d <= 12.0 {
                    *mask.get_mut(x, y).context("mask pixel")? = 0.9;
                }
            }
        }
    }

    let stack = ChannelStack::from_channels(vec![marker, companion]).context("stacking")?;
    Ok((stack, mask))
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let (stack, mask) = synthetic_scene(&args)?;
    let cfg = CropConfig::default();

    let t0 = Instant::now();
    let candidates = candidate_contours(&mask, 0.5);
    let (evaluations, state) =
        evaluate_candidates(&stack, &mask, &candidates, &cfg).context("evaluating candidates")?;
    let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;

    let describe_cfg = DescribeConfig::default();
    let mut dtos = Vec::with_capacity(evaluations.len());
    for eval in &evaluations {
        let descriptors = match &eval.clean {
            Some(clean) if eval.accepted() => Some(describe(clean, &describe_cfg)?),
            _ => None,
        };
        dtos.push(CandidateDto {
            origin: eval.origin,
            accepted: eval.accepted(),
            message: eval.message.clone(),
            gyradius: descriptors.as_ref().map(|d| d.gyradius),
            radii: descriptors.map(|d| d.radii).unwrap_or_default(),
        });
    }

    let summary = Summary {
        width: stack.width(),
        height: stack.height(),
        elapsed_ms,
        final_floors: state.floors,
        candidates: dtos,
    };
    let json = serde_json::to_string_pretty(&summary).context("serializing summary")?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {path}"))?;
            println!("summary written to {path}");
        }
        None => println!("{json}"),
    }
    Ok(())
}
