//! Scan orchestration: size gate, file collection, parallel assessment.
//!
//! The model is fit once by the caller and only borrowed here. Every file is
//! assessed independently; a failure on one file lands in its report.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::features::extract;
use crate::model::AnomalyModel;
use crate::report::FileReport;
use crate::risk::{assess, RiskLevel};

/// Largest upload accepted for assessment (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const TOO_LARGE_MESSAGE: &str = "File too large. Maximum size is 10MB.";

/// Atomic progress counters, safe to read from another thread mid-scan.
pub struct ScanProgress {
    pub total_files: AtomicUsize,
    pub scanned_files: AtomicUsize,
    pub high_risk_count: AtomicUsize,
    pub error_count: AtomicUsize,
}

impl ScanProgress {
    pub fn new() -> Self {
        Self {
            total_files: AtomicUsize::new(0),
            scanned_files: AtomicUsize::new(0),
            high_risk_count: AtomicUsize::new(0),
            error_count: AtomicUsize::new(0),
        }
    }

    fn record(&self, report: &FileReport) {
        match report.level() {
            Some(RiskLevel::High) => {
                self.high_risk_count.fetch_add(1, Ordering::Relaxed);
            }
            Some(_) => {}
            None => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.scanned_files.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect all file paths from the given paths (expanding directories).
pub fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path).follow_links(false).into_iter().flatten() {
                let p = entry.into_path();
                if p.is_file() {
                    files.push(p);
                }
            }
        } else {
            warn!(path = %path.display(), "skipping path that is neither file nor directory");
        }
    }

    files
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Assess an in-memory upload. Rejects anything over [`MAX_UPLOAD_BYTES`]
/// without touching the bytes.
pub fn assess_upload(model: &AnomalyModel, path: PathBuf, file_name: String, data: &[u8]) -> FileReport {
    let size = data.len() as u64;
    if size > MAX_UPLOAD_BYTES {
        return FileReport::failed(path, file_name, size, TOO_LARGE_MESSAGE.to_string());
    }

    let features = extract(data, &file_name);
    debug!(file = %file_name, ?features, "extracted features");
    let assessment = assess(model, features);
    FileReport::assessed(path, file_name, size, assessment)
}

fn read_upload(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Assess one file on disk. The size gate uses metadata, so oversized files
/// are never read.
pub fn scan_file(model: &AnomalyModel, path: &Path) -> FileReport {
    let file_name = display_name(path);

    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            warn!(path = %path.display(), "stat failed: {e}");
            return FileReport::failed(path.to_path_buf(), file_name, 0, format!("read error: {e}"));
        }
    };
    if size > MAX_UPLOAD_BYTES {
        warn!(path = %path.display(), size, "rejecting oversized file");
        return FileReport::failed(path.to_path_buf(), file_name, size, TOO_LARGE_MESSAGE.to_string());
    }

    match read_upload(path) {
        Ok(data) => assess_upload(model, path.to_path_buf(), file_name, &data),
        Err(e) => {
            warn!(path = %path.display(), "{e:#}");
            FileReport::failed(path.to_path_buf(), file_name, size, format!("read error: {e:#}"))
        }
    }
}

/// Assess every file under `targets` in parallel against one shared model.
pub fn run_scan(model: &AnomalyModel, targets: &[PathBuf], progress: &ScanProgress) -> Vec<FileReport> {
    let files = collect_files(targets);
    progress.total_files.store(files.len(), Ordering::Relaxed);

    files
        .par_iter()
        .map(|path| {
            let report = scan_file(model, path);
            progress.record(&report);
            report
        })
        .collect()
}
