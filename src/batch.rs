//! The batch loop: open, process, save, release.
//!
//! Each input file is handled end to end by one rayon worker:
//!
//! ```text
//! open (decode, metadata, orientation fix)
//!   -> ProcessorChain::process
//!   -> save (inverse orientation, RGB, density, EXIF)
//!   -> close
//! ```
//!
//! Containers are never shared between workers; the chain and the render
//! context are shared read-only. A failure is scoped to its file: it is
//! reported as a [`FailedImage`] and the batch moves on, unless `fail_fast` is
//! set, in which case files not yet started are skipped.
//!
//! ## Output layout
//!
//! Outputs mirror the input tree under the output directory and keep their
//! file names, so `in/trip/a.jpg` becomes `out/trip/a.jpg`.
//!
//! ## Progress
//!
//! Progress goes out as [`ProcessEvent`]s over an optional channel; the CLI
//! prints them from a separate thread (see `output::format_process_event`).

use crate::config::AppConfig;
use crate::container::ImageContainer;
use crate::effects::EffectError;
use crate::imaging::{BackendError, ImageBackend, Quality, RustBackend};
use crate::processor::{ProcessorChain, build_chain};
use crate::resources::RenderContext;
use crate::scan::{ScanError, collect_images};
use crate::store::{ConfigStore, StoreError};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Backend(#[from] BackendError),
    #[error("Effect error: {0}")]
    Effect(#[from] EffectError),
    #[error("Config error: {0}")]
    Config(#[from] StoreError),
    #[error("Input error: {0}")]
    Scan(#[from] ScanError),
}

/// Per-run settings of the batch loop.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    pub quality: Quality,
    pub fail_fast: bool,
    pub use_equivalent_focal_length: bool,
}

impl BatchOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&config.output.dir),
            quality: Quality::new(config.output.quality),
            fail_fast: config.processing.fail_fast,
            use_equivalent_focal_length: config.watermark.use_equivalent_focal_length,
        }
    }
}

/// Progress of a batch, one event per file plus a header.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    Started {
        image_count: usize,
        chain: Vec<String>,
    },
    ImageProcessed {
        /// 1-based position in the input list.
        index: usize,
        source_path: String,
        output_path: String,
        width: u32,
        height: u32,
    },
    ImageFailed {
        index: usize,
        source_path: String,
        reason: String,
    },
    /// Not attempted because an earlier file failed under `fail_fast`.
    ImageSkipped {
        index: usize,
        source_path: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedImage {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Written files, in input order.
    pub outputs: Vec<PathBuf>,
    pub failed: Vec<FailedImage>,
    pub skipped: Vec<PathBuf>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

enum Outcome {
    Saved(PathBuf),
    Failed(FailedImage),
    Skipped(PathBuf),
}

/// Where the output for `input` goes: its path relative to `input_root`,
/// re-rooted under `output_dir`.
pub fn output_path(input: &Path, input_root: &Path, output_dir: &Path) -> PathBuf {
    let relative = input
        .strip_prefix(input_root)
        .ok()
        .filter(|r| !r.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .or_else(|| input.file_name().map(PathBuf::from))
        .unwrap_or_else(|| input.to_path_buf());
    output_dir.join(relative)
}

/// Open, process and save one file. Returns the final pixel size.
fn process_one(
    backend: &impl ImageBackend,
    chain: &ProcessorChain,
    source: &Path,
    target: &Path,
    options: &BatchOptions,
) -> Result<(u32, u32), BatchError> {
    let mut container = ImageContainer::open(source, backend, options.use_equivalent_focal_length)?;
    chain.process(&mut container)?;
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    container.save(backend, target, options.quality)?;
    let size = (container.width(), container.height());
    container.close();
    Ok(size)
}

/// Run `chain` over every file in `inputs` in parallel.
///
/// Only setup failures (creating the output directory) abort the batch;
/// per-file failures end up in the report.
pub fn process_batch(
    backend: &impl ImageBackend,
    chain: &ProcessorChain,
    inputs: &[PathBuf],
    input_root: &Path,
    options: &BatchOptions,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, BatchError> {
    std::fs::create_dir_all(&options.output_dir)?;

    let emit = |event: ProcessEvent| {
        if let Some(tx) = &events {
            // A closed receiver only loses progress lines
            tx.send(event).ok();
        }
    };
    emit(ProcessEvent::Started {
        image_count: inputs.len(),
        chain: chain.ids().into_iter().map(str::to_string).collect(),
    });

    let cancelled = AtomicBool::new(false);
    let outcomes: Vec<Outcome> = inputs
        .par_iter()
        .enumerate()
        .map(|(i, source)| {
            let index = i + 1;
            let source_path = source.display().to_string();
            if options.fail_fast && cancelled.load(Ordering::Relaxed) {
                emit(ProcessEvent::ImageSkipped { index, source_path });
                return Outcome::Skipped(source.clone());
            }

            let target = output_path(source, input_root, &options.output_dir);
            match process_one(backend, chain, source, &target, options) {
                Ok((width, height)) => {
                    emit(ProcessEvent::ImageProcessed {
                        index,
                        source_path,
                        output_path: target.display().to_string(),
                        width,
                        height,
                    });
                    Outcome::Saved(target)
                }
                Err(e) => {
                    log::warn!("{source_path}: {e}");
                    if options.fail_fast {
                        cancelled.store(true, Ordering::Relaxed);
                    }
                    let reason = e.to_string();
                    emit(ProcessEvent::ImageFailed {
                        index,
                        source_path,
                        reason: reason.clone(),
                    });
                    Outcome::Failed(FailedImage {
                        path: source.clone(),
                        reason,
                    })
                }
            }
        })
        .collect();

    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Saved(path) => report.outputs.push(path),
            Outcome::Failed(failure) => report.failed.push(failure),
            Outcome::Skipped(path) => report.skipped.push(path),
        }
    }
    Ok(report)
}

/// Everything `exif-frame process` does: discover inputs, load resources,
/// resolve the chain, run the batch with the production backend.
pub fn run(
    config: &AppConfig,
    input: &Path,
    chain_ids: &[String],
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, BatchError> {
    let inputs = collect_images(input, config.processing.recursive)?;
    let input_root = if input.is_dir() {
        input
    } else {
        input.parent().unwrap_or(input)
    };

    let context = Arc::new(RenderContext::load(config.clone()));
    let store = ConfigStore::open(&config.processing.processor_store)?;
    let chain = build_chain(chain_ids, &context, Some(&store))?;

    process_batch(
        &RustBackend::new(),
        &chain,
        &inputs,
        input_root,
        &BatchOptions::from_config(config),
        events,
    )
}
