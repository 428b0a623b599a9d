//! CLI output formatting.
//!
//! Each command has a `format_*` function returning display lines, plus a
//! `print_*` wrapper that writes them to stdout. Format functions are pure so
//! the exact output is testable.
//!
//! ## Process
//!
//! ```text
//! Processing 3 images: square -> watermark_left_logo
//!     001 IMG_0001.jpg -> out/IMG_0001.jpg (6000x4392)
//!     002 IMG_0002.jpg FAILED
//!         Image error: Decode failed: ...
//!     003 IMG_0003.jpg skipped
//!
//! Done: 1 processed, 1 failed, 1 skipped
//! ```
//!
//! ## Processors
//!
//! ```text
//! 001 Thin border [border]
//!     Id: border_20240501103000
//! 002 Framed [composite]
//!     Id: composite_20240501104500
//! ```

use crate::batch::{BatchReport, ProcessEvent};
use crate::processor::builtin::BUILTINS;
use crate::store::StoredConfig;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

// ============================================================================
// process
// ============================================================================

/// Display lines for one progress event.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started { image_count, chain } => {
            let noun = if *image_count == 1 { "image" } else { "images" };
            vec![format!(
                "Processing {} {}: {}",
                image_count,
                noun,
                chain.join(" -> ")
            )]
        }
        ProcessEvent::ImageProcessed {
            index,
            source_path,
            output_path,
            width,
            height,
        } => vec![format!(
            "{}{} {} -> {} ({}x{})",
            indent(1),
            format_index(*index),
            file_name(source_path),
            output_path,
            width,
            height
        )],
        ProcessEvent::ImageFailed {
            index,
            source_path,
            reason,
        } => vec![
            format!(
                "{}{} {} FAILED",
                indent(1),
                format_index(*index),
                file_name(source_path)
            ),
            format!("{}{}", indent(2), reason),
        ],
        ProcessEvent::ImageSkipped { index, source_path } => vec![format!(
            "{}{} {} skipped",
            indent(1),
            format_index(*index),
            file_name(source_path)
        )],
    }
}

/// Final counts, then every failed file with its reason.
pub fn format_batch_summary(report: &BatchReport) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!(
            "Done: {} processed, {} failed, {} skipped",
            report.succeeded(),
            report.failed.len(),
            report.skipped.len()
        ),
    ];
    for failure in &report.failed {
        lines.push(format!(
            "{}{}: {}",
            indent(1),
            failure.path.display(),
            failure.reason
        ));
    }
    lines
}

pub fn print_batch_summary(report: &BatchReport) {
    for line in format_batch_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// processors / builtins
// ============================================================================

pub fn format_processor_list(configs: &[StoredConfig]) -> Vec<String> {
    if configs.is_empty() {
        return vec!["No stored processors".to_string()];
    }
    let mut lines = Vec::new();
    for (i, config) in configs.iter().enumerate() {
        lines.push(format!(
            "{} {} [{}]",
            format_index(i + 1),
            config.name(),
            config.kind()
        ));
        lines.push(format!("{}Id: {}", indent(1), config.id()));
    }
    lines
}

pub fn print_processor_list(configs: &[StoredConfig]) {
    for line in format_processor_list(configs) {
        println!("{}", line);
    }
}

pub fn format_builtins() -> Vec<String> {
    let width = BUILTINS.iter().map(|(id, _)| id.len()).max().unwrap_or(0);
    BUILTINS
        .iter()
        .map(|(id, name)| format!("{:<width$}  {}", id, name, width = width))
        .collect()
}

pub fn print_builtins() {
    for line in format_builtins() {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::FailedImage;
    use crate::processor_config::{
        Category, CompositeProcessorConfig, ProcessorConfig, ProcessorParams,
    };
    use std::path::PathBuf;

    // =========================================================================
    // Process event formatting
    // =========================================================================

    #[test]
    fn format_started() {
        let event = ProcessEvent::Started {
            image_count: 3,
            chain: vec!["square".into(), "watermark_left_logo".into()],
        };
        assert_eq!(
            format_process_event(&event),
            vec!["Processing 3 images: square -> watermark_left_logo"]
        );
        let single = ProcessEvent::Started {
            image_count: 1,
            chain: vec!["shadow".into()],
        };
        assert_eq!(format_process_event(&single), vec!["Processing 1 image: shadow"]);
    }

    #[test]
    fn format_processed() {
        let event = ProcessEvent::ImageProcessed {
            index: 1,
            source_path: "photos/IMG_0001.jpg".into(),
            output_path: "out/IMG_0001.jpg".into(),
            width: 6000,
            height: 4392,
        };
        assert_eq!(
            format_process_event(&event),
            vec!["    001 IMG_0001.jpg -> out/IMG_0001.jpg (6000x4392)"]
        );
    }

    #[test]
    fn format_failed_and_skipped() {
        let failed = ProcessEvent::ImageFailed {
            index: 12,
            source_path: "photos/bad.jpg".into(),
            reason: "Image error: truncated".into(),
        };
        assert_eq!(
            format_process_event(&failed),
            vec!["    012 bad.jpg FAILED", "        Image error: truncated"]
        );
        let skipped = ProcessEvent::ImageSkipped {
            index: 13,
            source_path: "photos/next.jpg".into(),
        };
        assert_eq!(format_process_event(&skipped), vec!["    013 next.jpg skipped"]);
    }

    #[test]
    fn summary_lists_failures() {
        let report = BatchReport {
            outputs: vec![PathBuf::from("out/a.jpg")],
            failed: vec![FailedImage {
                path: PathBuf::from("in/b.jpg"),
                reason: "boom".into(),
            }],
            skipped: vec![],
        };
        let lines = format_batch_summary(&report);
        assert_eq!(lines[1], "Done: 1 processed, 1 failed, 0 skipped");
        assert_eq!(lines[2], "    in/b.jpg: boom");
    }

    // =========================================================================
    // Processor listings
    // =========================================================================

    #[test]
    fn processor_list_shows_kind_and_id() {
        let single = ProcessorConfig::new(
            "border_1",
            "Thin border",
            ProcessorParams::default_for(Category::Border),
        );
        let composite = CompositeProcessorConfig {
            id: "composite_1".into(),
            name: "Framed".into(),
            ..CompositeProcessorConfig::from_configs(None, vec![])
        };
        let lines = format_processor_list(&[
            StoredConfig::Single(single),
            StoredConfig::Composite(composite),
        ]);
        assert_eq!(
            lines,
            vec![
                "001 Thin border [border]",
                "    Id: border_1",
                "002 Framed [composite]",
                "    Id: composite_1",
            ]
        );
        assert_eq!(format_processor_list(&[]), vec!["No stored processors"]);
    }

    #[test]
    fn builtins_are_aligned() {
        let lines = format_builtins();
        assert_eq!(lines.len(), BUILTINS.len());
        let column = lines[0].find("Rounded corners").unwrap();
        let last = lines.last().unwrap();
        assert_eq!(last.find("Configured watermark").unwrap(), column);
    }
}
