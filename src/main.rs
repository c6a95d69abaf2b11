//! Retrocam CLI - Retro Camera Filter Engine
//!
//! Lists styles, shows style details and filters single images or batches.
//! Logging is controlled with `RUST_LOG` (e.g. `RUST_LOG=debug`).

use anyhow::{bail, Context, Result};
use retrocam::prelude::*;
use std::path::Path;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("retrocam");

    if args.len() < 2 {
        print_usage(program);
        return;
    }

    let result = match args[1].as_str() {
        "list" => list_styles(&args[2..]),
        "info" => match args.get(2) {
            Some(id) => style_info(id, &args[3..]),
            None => Err(anyhow::anyhow!("please specify a style id")),
        },
        "process" => {
            if args.len() < 4 {
                eprintln!("Usage: {} process <input> <output> [options]", program);
                std::process::exit(2);
            }
            process_image(&args[2], &args[3], &args[4..])
        }
        "batch" => {
            if args.len() < 4 {
                eprintln!("Usage: {} batch <glob> <out-dir> [options]", program);
                std::process::exit(2);
            }
            process_batch(&args[2], &args[3], &args[4..])
        }
        "help" | "--help" | "-h" => {
            print_usage(program);
            Ok(())
        }
        "--version" | "-V" => {
            println!("{} {}", retrocam::NAME, retrocam::VERSION);
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(program);
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    println!("Retrocam v{} - retro camera filters", retrocam::VERSION);
    println!();
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  list [--json]                     List styles, frames and watermarks");
    println!("  info <style>                      Show the stages of a style");
    println!("  process <in> <out> [options]      Filter one image");
    println!("  batch <glob> <out-dir> [options]  Filter every matching image");
    println!("  help                              Show this help message");
    println!();
    println!("Options:");
    println!("  --style <id>          Style id (default: ccd-classic)");
    println!("  --intensity <0..1>    Blend with the original (default: 1.0)");
    println!("  --frame <id>          Frame around each result (default: none)");
    println!("  --frame-scale <k>     Frame and watermark size multiplier (default: 1.0)");
    println!("  --watermark <id>      Watermark stamped onto each photo (default: none)");
    println!("  --watermark-text <t>  Text of the custom-text watermark");
    println!("  --serial              Process a batch one image at a time");
    println!("  --config <file>       TOML engine configuration");
}

/// Options shared by `process` and `batch`.
struct RunOptions {
    style: String,
    intensity: f32,
    frame: FrameStyle,
    frame_scale: f32,
    watermark: WatermarkType,
    watermark_text: String,
    serial: bool,
    config: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            style: FilterStyle::CcdClassic.id().to_string(),
            intensity: 1.0,
            frame: FrameStyle::None,
            frame_scale: 1.0,
            watermark: WatermarkType::None,
            watermark_text: String::new(),
            serial: false,
            config: None,
        }
    }
}

impl RunOptions {
    fn parse(args: &[String]) -> Result<Self> {
        let mut options = Self::default();
        let mut i = 0;
        while i < args.len() {
            let value = || {
                args.get(i + 1)
                    .with_context(|| format!("missing value for {}", args[i]))
            };
            match args[i].as_str() {
                "--style" => {
                    options.style = value()?.clone();
                    i += 2;
                }
                "--intensity" => {
                    options.intensity = value()?.parse().context("--intensity expects a number")?;
                    i += 2;
                }
                "--frame" => {
                    options.frame = value()?.parse()?;
                    i += 2;
                }
                "--frame-scale" => {
                    options.frame_scale = value()?.parse().context("--frame-scale expects a number")?;
                    i += 2;
                }
                "--watermark" => {
                    options.watermark = value()?.parse()?;
                    i += 2;
                }
                "--watermark-text" => {
                    options.watermark_text = value()?.clone();
                    i += 2;
                }
                "--config" => {
                    options.config = Some(value()?.clone());
                    i += 2;
                }
                "--serial" => {
                    options.serial = true;
                    i += 1;
                }
                other => bail!("unknown option: {}", other),
            }
        }
        Ok(options)
    }

    fn request(&self) -> StillRequest {
        StillRequest::new(self.style.clone())
            .with_intensity(self.intensity)
            .with_frame(self.frame, self.frame_scale)
            .with_watermark(self.watermark, self.watermark_text.clone())
    }
}

fn load_pipeline(config: Option<&str>) -> Result<FilterPipeline> {
    let config = match config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    Ok(FilterPipeline::new(config))
}

fn list_styles(args: &[String]) -> Result<()> {
    let json = args.iter().any(|a| a == "--json");
    let config = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(String::as_str);
    let pipeline = load_pipeline(config)?;
    let registry = pipeline.registry();

    if json {
        let styles: Vec<_> = registry.metadata().collect();
        let frames: Vec<_> = FrameStyle::ALL
            .iter()
            .map(|f| {
                serde_json::json!({
                    "id": f.id(),
                    "name": f.display_name(),
                    "premium": f.is_premium(),
                })
            })
            .collect();
        let watermarks: Vec<_> = WatermarkType::ALL
            .iter()
            .map(|w| {
                serde_json::json!({
                    "id": w.id(),
                    "name": w.display_name(),
                    "premium": w.is_premium(),
                })
            })
            .collect();
        let doc = serde_json::json!({ "styles": styles, "frames": frames, "watermarks": watermarks });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("Available styles ({} total):", registry.len());
    println!();
    for (category, styles) in registry.grouped_by_category() {
        println!("  {}", category.display_name());
        for metadata in styles {
            let premium = if metadata.premium { " [premium]" } else { "" };
            println!("      {:<16} {}{}", metadata.id, metadata.name, premium);
        }
        println!();
    }

    println!("Frames:");
    for frame in FrameStyle::ALL {
        let premium = if frame.is_premium() { " [premium]" } else { "" };
        println!("      {:<16} {}{}", frame.id(), frame.display_name(), premium);
    }
    println!();

    println!("Watermarks:");
    for watermark in WatermarkType::ALL {
        let premium = if watermark.is_premium() { " [premium]" } else { "" };
        println!("      {:<16} {}{}", watermark.id(), watermark.display_name(), premium);
    }
    Ok(())
}

fn style_info(id: &str, args: &[String]) -> Result<()> {
    let options = RunOptions::parse(args)?;
    let pipeline = load_pipeline(options.config.as_deref())?;
    let entry = pipeline
        .registry()
        .get(id)
        .with_context(|| format!("style not found: {} (use 'list' to see available styles)", id))?;
    let metadata = &entry.metadata;

    println!("Style: {}", metadata.name);
    println!("ID: {}", metadata.id);
    println!("Category: {}", metadata.category.display_name());
    println!("Premium: {}", if metadata.premium { "yes" } else { "no" });
    if !metadata.description.is_empty() {
        println!();
        println!("Description:");
        println!("  {}", metadata.description);
    }
    println!();

    if entry.chain.is_empty() {
        println!("Stages: none (identity)");
        return Ok(());
    }
    println!("Stages:");
    for (index, stage) in entry.chain.stages().iter().enumerate() {
        let op = stage.metadata();
        let params: Vec<String> = op
            .parameters
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        println!("  {}. {} ({})", index + 1, op.name, params.join(", "));
    }
    Ok(())
}

fn process_image(input: &str, output: &str, args: &[String]) -> Result<()> {
    let options = RunOptions::parse(args)?;
    let pipeline = load_pipeline(options.config.as_deref())?;

    let photo = image::open(input).with_context(|| format!("failed to read {}", input))?;
    let rendered = pipeline.render_still(&photo, &options.request())?;
    if let RenderStatus::Degraded { failures } = &rendered.status {
        for failure in failures {
            eprintln!("warning: skipped stage {} ({}): {}", failure.index, failure.operator, failure.error);
        }
    }

    let is_jpeg = matches!(image::ImageFormat::from_path(output), Ok(image::ImageFormat::Jpeg));
    let encoded = if is_jpeg {
        image::DynamicImage::ImageRgb8(rendered.image.to_rgb8())
    } else {
        rendered.image
    };
    encoded
        .save(output)
        .with_context(|| format!("failed to write {}", output))?;
    println!("{} -> {} ({})", input, output, options.style);
    Ok(())
}

fn process_batch(pattern: &str, output_dir: &str, args: &[String]) -> Result<()> {
    let options = RunOptions::parse(args)?;
    let pipeline = load_pipeline(options.config.as_deref())?;

    let output_dir = Path::new(output_dir);
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let mut processor = BatchProcessor::new(&pipeline);
    if options.serial {
        processor = processor.with_parallel(false);
    }
    let report = processor.process_files(pattern, output_dir, &options.request())?;

    for (path, error) in report.failures() {
        eprintln!("failed: {}: {}", path.display(), error);
    }
    println!(
        "Processed: {} succeeded, {} failed ({} degraded) in {:.2?}",
        report.succeeded(),
        report.failed(),
        report.degraded(),
        report.duration
    );
    if report.failed() > 0 {
        bail!("{} files failed", report.failed());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_request_carries_frame_and_watermark() {
        let options = RunOptions::parse(&args(&[
            "--style",
            "lofi",
            "--frame",
            "film_strip",
            "--frame-scale",
            "0.5",
            "--watermark",
            "custom-text",
            "--watermark-text",
            "Summer",
            "--serial",
        ]))
        .unwrap();
        let request = options.request();
        assert_eq!(request.style, "lofi");
        assert_eq!(request.frame, FrameStyle::FilmStrip);
        assert_eq!(request.frame_scale, 0.5);
        assert_eq!(request.watermark, WatermarkType::CustomText);
        assert_eq!(request.watermark_text, "Summer");
        assert!(options.serial);
    }

    #[test]
    fn test_rejects_bad_options() {
        assert!(RunOptions::parse(&args(&["--watermark", "signature"])).is_err());
        assert!(RunOptions::parse(&args(&["--frame"])).is_err());
        assert!(RunOptions::parse(&args(&["--bogus"])).is_err());
    }
}
