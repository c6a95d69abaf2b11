//! Batch processing across many images.
//!
//! The pipeline keeps no state between calls, so images are independent
//! units of work: they run in parallel on a rayon pool (or serially), and
//! one failing file does not stop the others.

use crate::config::BatchConfig;
use crate::core::error::BatchError;
use crate::core::types::Image;
use crate::execution::engine::FilterPipeline;
use crate::execution::render::StillRequest;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Outcome of one file.
#[derive(Debug)]
pub struct BatchItem {
    /// Source file.
    pub input: PathBuf,
    /// Written file, or why the item failed.
    pub result: Result<PathBuf, BatchError>,
    /// Whether some stages were skipped for this file.
    pub degraded: bool,
}

/// Outcome of a file batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Per-file results, in input order.
    pub items: Vec<BatchItem>,
    /// Wall time of the whole batch.
    pub duration: Duration,
}

impl BatchReport {
    /// Number of files written.
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_ok()).count()
    }

    /// Number of files that failed.
    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    /// Number of files written with skipped stages.
    pub fn degraded(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_ok() && i.degraded).count()
    }

    /// The failed items.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &BatchError)> {
        self.items
            .iter()
            .filter_map(|i| i.result.as_ref().err().map(|e| (i.input.as_path(), e)))
    }
}

/// Runs the pipeline over many images.
#[derive(Debug, Clone)]
pub struct BatchProcessor<'a> {
    pipeline: &'a FilterPipeline,
    options: BatchConfig,
}

impl<'a> BatchProcessor<'a> {
    /// Create a processor using the pipeline's batch options.
    pub fn new(pipeline: &'a FilterPipeline) -> Self {
        Self {
            options: pipeline.config().batch.clone(),
            pipeline,
        }
    }

    /// Override the batch options.
    pub fn with_options(mut self, options: BatchConfig) -> Self {
        self.options = options;
        self
    }

    /// Enable/disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.options.parallel = parallel;
        self
    }

    /// Get the batch options.
    pub fn options(&self) -> &BatchConfig {
        &self.options
    }

    /// Filter in-memory images with a style id. Output order matches input
    /// order; unknown ids return the inputs unchanged.
    pub fn process_images(&self, images: &[Image], style: &str, intensity: f32) -> Result<Vec<Image>, BatchError> {
        let run = |img: &Image| self.pipeline.apply_named(img, style, intensity);
        self.run(|| {
            if self.options.parallel {
                images.par_iter().map(run).collect()
            } else {
                images.iter().map(run).collect()
            }
        })
    }

    /// Expand a glob pattern into input files, sorted.
    pub fn collect_inputs(pattern: &str) -> Result<Vec<PathBuf>, BatchError> {
        let paths = glob::glob(pattern).map_err(|e| BatchError::InvalidPattern {
            pattern: pattern.to_string(),
            error: e.to_string(),
        })?;
        let mut files: Vec<PathBuf> = paths.filter_map(|r| r.ok()).filter(|p| p.is_file()).collect();
        files.sort();
        if files.is_empty() {
            return Err(BatchError::NoInputsFound {
                pattern: pattern.to_string(),
            });
        }
        Ok(files)
    }

    /// Where `input` is written inside `output_dir`.
    pub fn output_path(&self, input: &Path, output_dir: &Path) -> PathBuf {
        let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
        output_dir.join(format!("{}.{}", stem, self.options.output_format))
    }

    /// Render every file matching `pattern` through
    /// [`FilterPipeline::render_still`] and encode it into `output_dir`.
    ///
    /// Fails only when there is nothing to do (bad pattern, no inputs,
    /// missing output directory, thread pool); per-file errors are reported
    /// in the returned [`BatchReport`].
    pub fn process_files(
        &self,
        pattern: &str,
        output_dir: &Path,
        request: &StillRequest,
    ) -> Result<BatchReport, BatchError> {
        if !output_dir.is_dir() {
            return Err(BatchError::OutputDirectoryMissing {
                path: output_dir.to_path_buf(),
            });
        }
        let files = Self::collect_inputs(pattern)?;
        log::info!(
            "batch: {} files matching '{}', style '{}', {}",
            files.len(),
            pattern,
            request.style,
            if self.options.parallel { "parallel" } else { "serial" }
        );

        let start_time = Instant::now();
        let process = |input: &PathBuf| self.process_file(input, output_dir, request);
        let items = self.run(|| {
            if self.options.parallel {
                files.par_iter().map(process).collect()
            } else {
                files.iter().map(process).collect()
            }
        })?;

        let report = BatchReport {
            items,
            duration: start_time.elapsed(),
        };
        log::info!(
            "batch complete: {} succeeded, {} failed, {} degraded in {:?}",
            report.succeeded(),
            report.failed(),
            report.degraded(),
            report.duration
        );
        Ok(report)
    }

    fn process_file(&self, input: &Path, output_dir: &Path, request: &StillRequest) -> BatchItem {
        let (result, degraded) = match self.write_one(input, output_dir, request) {
            Ok((target, degraded)) => (Ok(target), degraded),
            Err(e) => {
                log::warn!("{}", e);
                (Err(e), false)
            }
        };
        BatchItem {
            input: input.to_path_buf(),
            result,
            degraded,
        }
    }

    fn write_one(&self, input: &Path, output_dir: &Path, request: &StillRequest) -> Result<(PathBuf, bool), BatchError> {
        let decoded = image::open(input).map_err(|error| BatchError::Decode {
            path: input.to_path_buf(),
            error,
        })?;
        let output = self
            .pipeline
            .render_still(&decoded, request)
            .map_err(|e| BatchError::Render {
                path: input.to_path_buf(),
                error: e.to_string(),
            })?;
        let degraded = output.status.is_degraded();

        let target = self.output_path(input, output_dir);
        let encoded = if matches!(image::ImageFormat::from_path(&target), Ok(image::ImageFormat::Jpeg)) {
            // JPEG has no alpha channel.
            image::DynamicImage::ImageRgb8(output.image.to_rgb8())
        } else {
            output.image
        };
        encoded.save(&target).map_err(|error| BatchError::Encode {
            path: target.clone(),
            error,
        })?;
        log::debug!("{} -> {}", input.display(), target.display());
        Ok((target, degraded))
    }

    /// Run `job` on a dedicated pool when a thread limit is set.
    fn run<T, F>(&self, job: F) -> Result<T, BatchError>
    where
        T: Send,
        F: FnOnce() -> T + Send,
    {
        if !self.options.parallel || self.options.threads == 0 {
            return Ok(job());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.threads)
            .build()
            .map_err(|e| BatchError::ThreadPool(e.to_string()))?;
        Ok(pool.install(job))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::filters::styles::FilterStyle;
    use image::{Rgb, RgbImage};

    fn write_inputs(dir: &Path, count: u32) {
        for i in 0..count {
            let img = RgbImage::from_fn(12, 8, |x, y| Rgb([(x * 20) as u8, (y * 30) as u8, (i * 50) as u8]));
            img.save(dir.join(format!("shot_{i}.png"))).unwrap();
        }
    }

    #[test]
    fn test_process_images_parallel_matches_serial() {
        let pipeline = FilterPipeline::default();
        let images: Vec<_> = (0..6)
            .map(|i| Image::solid(16, 16, [0.1 * i as f32, 0.5, 0.4, 1.0]))
            .collect();
        let parallel = BatchProcessor::new(&pipeline)
            .process_images(&images, "ccd-night", 0.8)
            .unwrap();
        let serial = BatchProcessor::new(&pipeline)
            .with_parallel(false)
            .process_images(&images, "ccd-night", 0.8)
            .unwrap();
        assert_eq!(parallel, serial);
        assert_eq!(
            parallel[2],
            pipeline.apply_style_with_intensity(&images[2], FilterStyle::CcdNight, 0.8)
        );
    }

    #[test]
    fn test_dedicated_pool() {
        let pipeline = FilterPipeline::new(EngineConfig::new().with_threads(2));
        let images = vec![Image::solid(4, 4, [0.5, 0.5, 0.5, 1.0]); 3];
        let out = BatchProcessor::new(&pipeline)
            .process_images(&images, "lofi", 1.0)
            .unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_process_files() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        write_inputs(input_dir.path(), 3);
        std::fs::write(input_dir.path().join("broken.png"), b"not a png").unwrap();

        let pipeline = FilterPipeline::default();
        let pattern = format!("{}/*.png", input_dir.path().display());
        let report = BatchProcessor::new(&pipeline)
            .process_files(&pattern, output_dir.path(), &StillRequest::new("kodak-gold-200"))
            .unwrap();

        assert_eq!(report.items.len(), 4);
        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.failed(), 1);
        let (path, error) = report.failures().next().unwrap();
        assert!(path.ends_with("broken.png"));
        assert!(matches!(error, BatchError::Decode { .. }));

        let written = image::open(output_dir.path().join("shot_1.png")).unwrap();
        assert_eq!((written.width(), written.height()), (12, 8));
    }

    #[test]
    fn test_unknown_style_fails_each_file() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        write_inputs(input_dir.path(), 2);

        let pipeline = FilterPipeline::default();
        let pattern = format!("{}/*.png", input_dir.path().display());
        let report = BatchProcessor::new(&pipeline)
            .with_parallel(false)
            .process_files(&pattern, output_dir.path(), &StillRequest::new("ektar"))
            .unwrap();
        assert_eq!(report.failed(), 2);
    }

    #[test]
    fn test_jpeg_output() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        write_inputs(input_dir.path(), 1);

        let mut options = BatchConfig::default();
        options.output_format = "jpg".to_string();
        let pipeline = FilterPipeline::default();
        let pattern = format!("{}/*.png", input_dir.path().display());
        let report = BatchProcessor::new(&pipeline)
            .with_options(options)
            .process_files(&pattern, output_dir.path(), &StillRequest::new("leica"))
            .unwrap();
        assert_eq!(report.succeeded(), 1);
        assert!(output_dir.path().join("shot_0.jpg").is_file());
    }

    #[test]
    fn test_no_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.tiff", dir.path().display());
        assert!(matches!(
            BatchProcessor::collect_inputs(&pattern),
            Err(BatchError::NoInputsFound { .. })
        ));
    }

    #[test]
    fn test_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = FilterPipeline::default();
        let result = BatchProcessor::new(&pipeline).process_files(
            "*.png",
            &dir.path().join("nope"),
            &StillRequest::default(),
        );
        assert!(matches!(result, Err(BatchError::OutputDirectoryMissing { .. })));
    }
}
