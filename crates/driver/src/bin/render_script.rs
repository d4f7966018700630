//! Renders one frame from script files and writes it as a PNG.
//!
//! ```text
//! render_script --out frame.png [--size WxH] [--clear r,g,b,a] [--config cfg.json]
//!               [--image id=path]... [--font id=path]... root.bin [id=path]...
//! ```
//!
//! A script argument without `id=` is the root script.

use std::env;
use std::fs;
use std::io::{Write as _, stderr};
use std::path::PathBuf;

use anyhow::{Context as _, Result, anyhow};
use image::RgbaImage;
use log::info;
use renderer::ROOT_ID;
use scene_driver::{DriverConfig, RendererHandle, init_logging, parse_color, parse_viewport};

#[derive(Default)]
struct Args {
    out: Option<PathBuf>,
    size: Option<(u32, u32)>,
    clear: Option<[u8; 4]>,
    config: Option<PathBuf>,
    images: Vec<(String, PathBuf)>,
    fonts: Vec<(String, PathBuf)>,
    scripts: Vec<(String, PathBuf)>,
}

fn print_usage() {
    drop(writeln!(
        stderr(),
        "Usage:\n  render_script --out <PNG> [--size WxH] [--clear r,g,b,a] [--config <JSON>]\n                [--image id=path]... [--font id=path]... <root> [id=path]..."
    ));
}

fn split_pair(text: &str) -> Result<(String, PathBuf)> {
    let (id, path) = text
        .split_once('=')
        .ok_or_else(|| anyhow!("expected id=path, got `{text}`"))?;
    Ok((id.to_owned(), PathBuf::from(path)))
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    while let Some(arg) = raw.next() {
        let mut value = |flag: &str| raw.next().ok_or_else(|| anyhow!("{flag} needs a value"));
        match arg.as_str() {
            "--out" => args.out = Some(PathBuf::from(value("--out")?)),
            "--size" => {
                let text = value("--size")?;
                args.size = Some(parse_viewport(&text).ok_or_else(|| anyhow!("bad --size `{text}`"))?);
            }
            "--clear" => {
                let text = value("--clear")?;
                args.clear = Some(parse_color(&text).ok_or_else(|| anyhow!("bad --clear `{text}`"))?);
            }
            "--config" => args.config = Some(PathBuf::from(value("--config")?)),
            "--image" => args.images.push(split_pair(&value("--image")?)?),
            "--font" => args.fonts.push(split_pair(&value("--font")?)?),
            other if other.starts_with("--") => return Err(anyhow!("unknown flag `{other}`")),
            other if other.contains('=') => args.scripts.push(split_pair(other)?),
            other => args.scripts.push((ROOT_ID.to_owned(), PathBuf::from(other))),
        }
    }
    Ok(args)
}

fn load_config(args: &Args) -> Result<DriverConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            DriverConfig::from_json(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => DriverConfig::from_env(),
    };
    if let Some((width, height)) = args.size {
        config = DriverConfig {
            viewport_width: width,
            viewport_height: height,
            ..config
        };
    }
    if let Some(clear) = args.clear {
        config.clear_color = clear;
    }
    Ok(config)
}

fn main() -> Result<()> {
    init_logging()?;
    let args = parse_args(env::args().skip(1))?;
    let Some(out) = args.out.clone() else {
        print_usage();
        return Err(anyhow!("--out is required"));
    };
    if args.scripts.is_empty() {
        print_usage();
        return Err(anyhow!("no scripts given"));
    }

    let config = load_config(&args)?;
    let handle = RendererHandle::spawn(&config).context("starting renderer")?;

    for (id, path) in &args.images {
        let bytes = fs::read(path).with_context(|| format!("reading image {}", path.display()))?;
        handle
            .on_image_put(id, &bytes)
            .with_context(|| format!("loading image `{id}`"))?;
    }
    for (id, path) in &args.fonts {
        let bytes = fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
        handle
            .on_font_put(id, bytes)
            .with_context(|| format!("loading font `{id}`"))?;
    }
    let mut batch = Vec::with_capacity(args.scripts.len());
    for (id, path) in &args.scripts {
        let bytes = fs::read(path).with_context(|| format!("reading script {}", path.display()))?;
        batch.push((id.clone(), bytes));
    }
    handle.submit_batch(&batch).context("decoding scripts")?;
    handle.flush()?;

    let frame = handle
        .latest_frame()?
        .ok_or_else(|| anyhow!("no frame was rendered; is a root script present?"))?;
    handle.stop()?;

    let (width, height) = (frame.width(), frame.height());
    let image = RgbaImage::from_raw(width, height, frame.into_rgba())
        .ok_or_else(|| anyhow!("frame buffer does not match {width}x{height}"))?;
    image
        .save(&out)
        .with_context(|| format!("writing {}", out.display()))?;
    info!(target: "scene_driver", "wrote {width}x{height} frame to {}", out.display());
    Ok(())
}
