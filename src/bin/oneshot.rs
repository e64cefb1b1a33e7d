use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "oneshot", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Paste an object onto backgrounds and write labelled synthetic images.
    Synth(SynthArgs),
    /// Print a sampled warp as JSON.
    Sample(SampleArgs),
}

#[derive(Parser, Debug)]
struct SynthArgs {
    /// Object image (PNG with alpha recommended).
    #[arg(long)]
    object: PathBuf,

    /// Background images.
    #[arg(long = "background", required = true, num_args = 1..)]
    backgrounds: Vec<PathBuf>,

    /// Output directory for NNNN.png files and annotations.json.
    #[arg(long)]
    out: PathBuf,

    /// Class label recorded in the annotations.
    #[arg(long, default_value = "object")]
    label: String,

    /// Overrides the seed from `--config`.
    #[arg(long)]
    seed: Option<u64>,

    /// Augmentation config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SampleArgs {
    /// Object size as WxH.
    #[arg(long, value_parser = parse_size)]
    object_size: (u32, u32),

    /// Canvas size as WxH.
    #[arg(long, value_parser = parse_size)]
    canvas: (u32, u32),

    /// Seed for the placement draw.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Sample index within the seed's stream.
    #[arg(long, default_value_t = 0)]
    row: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Synth(args) => cmd_synth(args),
        Command::Sample(args) => cmd_sample(args),
    }
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
    let w = w.trim().parse().map_err(|e| format!("bad width '{w}': {e}"))?;
    let h = h.trim().parse().map_err(|e| format!("bad height '{h}': {e}"))?;
    Ok((w, h))
}

#[derive(serde::Serialize)]
struct AnnotationRecord<'a> {
    file: String,
    background: &'a Path,
    params: oneshot::WarpParams,
    corners: oneshot::Quad,
    annotation: &'a oneshot::BoundingBox,
}

fn cmd_synth(args: SynthArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => oneshot::AugmentConfig::from_json_file(path)?,
        None => oneshot::AugmentConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let object = oneshot::FlexImage::open(&args.object)?;
    let backgrounds = args
        .backgrounds
        .iter()
        .map(|p| {
            oneshot::FlexImage::open(p)
                .and_then(oneshot::FlexImage::into_decoded)
                .with_context(|| format!("load background '{}'", p.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let samples = oneshot::augment(&backgrounds, &object, &args.label, &config)?;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;
    let mut records = Vec::with_capacity(samples.len());
    for (i, sample) in samples.iter().enumerate() {
        let file = format!("{i:04}.png");
        sample.image.save_png(&args.out.join(&file))?;
        records.push(AnnotationRecord {
            file,
            background: &args.backgrounds[sample.background_index],
            params: sample.params,
            corners: sample.corners,
            annotation: &sample.annotation,
        });
    }

    let ann_path = args.out.join("annotations.json");
    let f = File::create(&ann_path)
        .with_context(|| format!("create '{}'", ann_path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(f), &records)
        .with_context(|| format!("write '{}'", ann_path.display()))?;

    eprintln!("wrote {} images to {}", records.len(), args.out.display());
    Ok(())
}

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    let (ow, oh) = args.object_size;
    let canvas = oneshot::Canvas::new(args.canvas.0, args.canvas.1)?;
    let mut sampler =
        oneshot::ParameterSampler::new(ow, oh, oneshot::SamplerConfig::default())?;
    let params = sampler.sample(canvas, args.seed, args.row)?;

    let out = serde_json::json!({
        "params": params,
        "corners": oneshot::Warp::warped_corners(&sampler),
        "transform": oneshot::Warp::transform(&sampler),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
