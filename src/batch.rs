//! Page and batch drivers
//!
//! A page runs the full pipeline on one file and writes its artifacts; a
//! batch fans pages out over the blocking pool with a bounded job count.

use crate::config::Config;
use crate::error::PipelineError;
use crate::io::{image_info, load_image, save_image, ColorMode, ImageInfo};
use crate::overlay::{draw_boxes, CHARACTER_COLOR, LINE_COLOR, REGION_COLOR};
use crate::preprocessing::{Pipeline, PreprocessingResult};
use crate::segmentation::regions::text_area_bounds;
use crate::segmentation::{
    BoundingBox, Cached, CharacterCandidate, CharacterSegmenter, LineSegmenter, RegionSegmenter,
    TextLine, TextRegion,
};
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Everything extracted from one page
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub source: PathBuf,
    pub image: ImageInfo,
    pub preprocessing: PreprocessingResult,
    pub line_height: f64,
    pub lines: Vec<TextLine>,
    pub characters: Vec<CharacterCandidate>,
    pub regions: Vec<TextRegion>,
    /// Padded crop rectangle, absent when no region was found
    pub text_area: Option<BoundingBox>,
    /// Files written for this page
    pub outputs: Vec<PathBuf>,
    pub total_time_ms: u64,
}

/// Failure record for a page that could not be processed
#[derive(Debug, Clone, Serialize)]
pub struct PageFailure {
    pub code: &'static str,
    pub message: String,
}

impl From<&PipelineError> for PageFailure {
    fn from(err: &PipelineError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Result of one batch entry
#[derive(Debug, Clone, Serialize)]
pub struct PageOutcome {
    pub source: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PageReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PageFailure>,
}

impl PageOutcome {
    fn success(report: PageReport) -> Self {
        Self {
            source: report.source.clone(),
            report: Some(report),
            error: None,
        }
    }

    fn failure(source: PathBuf, err: &PipelineError) -> Self {
        Self {
            source,
            report: None,
            error: Some(err.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.report.is_some()
    }
}

/// Unique artifact base name for each input, in input order
///
/// The base name is the file stem. Later inputs whose name is already taken
/// get a `-2`, `-3`, ... suffix, so no two pages write the same files.
pub fn artifact_names(inputs: &[PathBuf]) -> Vec<String> {
    let mut taken = HashSet::new();
    inputs
        .iter()
        .map(|path| {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "page".to_string());
            let mut name = stem.clone();
            let mut n = 1;
            while !taken.insert(name.clone()) {
                n += 1;
                name = format!("{stem}-{n}");
            }
            name
        })
        .collect()
}

/// Process one page file and write its mask, crop, overlays and report
///
/// Artifacts are written to `config.output_dir` as `<name>_mask.png`,
/// `<name>_roi.png`, optional overlays and `<name>.json`.
pub fn process_page(
    path: &Path,
    name: &str,
    config: &Config,
) -> Result<PageReport, PipelineError> {
    let start = Instant::now();
    let image = load_image(path, ColorMode::Color)?;

    let preprocessing = Pipeline::new(config.conditioner)
        .with_geometry(config.geometry)
        .process(&image)?;
    let mask = &preprocessing.mask;

    let line_analysis = LineSegmenter::default().analyze(mask);
    let characters = CharacterSegmenter::default().find_character_contours(mask);
    let mut regions = Cached::new(RegionSegmenter::default());
    regions.detect(mask);

    let mask_image = DynamicImage::ImageLuma8(mask.clone());
    let roi = regions.get_text_area_roi(&mask_image, config.padding);
    let text_area = text_area_bounds(regions.last(), config.padding, mask.width(), mask.height());

    let artifact = |suffix: &str| config.output_dir.join(format!("{name}{suffix}"));

    let mut outputs = Vec::new();
    let mask_path = artifact("_mask.png");
    save_image(&mask_image, &mask_path)?;
    outputs.push(mask_path);

    let roi_path = artifact("_roi.png");
    save_image(&roi, &roi_path)?;
    outputs.push(roi_path);

    if config.overlays {
        let overlays = [
            (
                "_lines.png",
                draw_boxes(mask, line_analysis.lines.iter().map(|l| &l.bbox), LINE_COLOR),
            ),
            (
                "_chars.png",
                draw_boxes(mask, characters.iter().map(|c| &c.bbox), CHARACTER_COLOR),
            ),
            (
                "_regions.png",
                draw_boxes(mask, regions.last().iter().map(|r| &r.bbox), REGION_COLOR),
            ),
        ];
        for (suffix, canvas) in overlays {
            let overlay_path = artifact(suffix);
            save_image(&DynamicImage::ImageRgb8(canvas), &overlay_path)?;
            outputs.push(overlay_path);
        }
    }

    let report_path = artifact(".json");
    outputs.push(report_path.clone());

    let report = PageReport {
        source: path.to_path_buf(),
        image: image_info(&image),
        preprocessing,
        line_height: line_analysis.line_height,
        lines: line_analysis.lines,
        characters,
        regions: regions.last().to_vec(),
        text_area,
        outputs,
        total_time_ms: start.elapsed().as_millis() as u64,
    };
    write_report(&report, &report_path)?;

    info!(
        source = %path.display(),
        lines = report.lines.len(),
        characters = report.characters.len(),
        regions = report.regions.len(),
        time_ms = report.total_time_ms,
        "Page processed"
    );

    Ok(report)
}

fn write_report(report: &PageReport, path: &Path) -> Result<(), PipelineError> {
    let output_err = |reason: String| PipelineError::Output {
        path: path.to_path_buf(),
        reason,
    };
    let json = serde_json::to_vec_pretty(report).map_err(|e| output_err(e.to_string()))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| output_err(e.to_string()))?;
    }
    std::fs::write(path, json).map_err(|e| output_err(e.to_string()))
}

/// Process pages concurrently, at most `config.jobs` at a time
///
/// Returns one outcome per input, in input order. A failing page is
/// recorded and never stops the others.
pub async fn process_batch(inputs: Vec<PathBuf>, config: Arc<Config>) -> Vec<PageOutcome> {
    let jobs = config.jobs.max(1);
    let total = inputs.len();
    info!(pages = total, jobs, "Starting batch");

    let names = artifact_names(&inputs);
    let pages = inputs.into_iter().zip(names).enumerate();
    let mut outcomes: Vec<(usize, PageOutcome)> = stream::iter(pages)
        .map(|(index, (path, name))| {
            let config = Arc::clone(&config);
            async move {
                let source = path.clone();
                let joined =
                    tokio::task::spawn_blocking(move || process_page(&path, &name, &config)).await;
                let outcome = match joined {
                    Ok(Ok(report)) => PageOutcome::success(report),
                    Ok(Err(err)) => {
                        warn!(source = %source.display(), error = %err, "Page failed");
                        PageOutcome::failure(source, &err)
                    }
                    Err(join_err) => {
                        let err = PipelineError::Internal(join_err.to_string());
                        warn!(source = %source.display(), error = %err, "Page worker aborted");
                        PageOutcome::failure(source, &err)
                    }
                };
                (index, outcome)
            }
        })
        .buffer_unordered(jobs)
        .collect()
        .await;

    outcomes.sort_by_key(|(index, _)| *index);
    let outcomes: Vec<PageOutcome> = outcomes.into_iter().map(|(_, o)| o).collect();

    let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
    info!(
        pages = total,
        succeeded,
        failed = total - succeeded,
        "Batch finished"
    );
    outcomes
}
