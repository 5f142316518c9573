//! Assets pass-through.
//!
//! Asset directories (`_assets` by default) hold images and attachments next
//! to the documents that use them. They are mirrored into the destination
//! file by file with a newer-wins policy: a file is copied when the
//! destination copy is absent or older than the source. Everything else is
//! left alone, so a preserved destination is not rewritten on every run.
//!
//! Legacy `.heic` images are converted to `.jpeg` by an external process.
//! Their freshness is judged against the converted name: once `photo.jpeg`
//! exists and is at least as new as `photo.heic`, the source is considered
//! up to date. Until then the original is copied across and counted as
//! pending conversion.

use crate::naming::converted_image_name;
use crate::stats::Stats;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Asset path {0} is outside its directory")]
    OutsideRoot(PathBuf),
}

/// What the sync decided for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetAction {
    /// Copied under its own name.
    Copied,
    /// Copied, but still waiting for external conversion.
    CopiedPendingConversion,
    /// Destination (or its converted counterpart) is current.
    UpToDate,
}

/// Per-directory tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetSummary {
    pub copied: u32,
    pub up_to_date: u32,
    pub pending_conversion: u32,
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// True when `dest` is missing or older than `src`.
pub fn is_stale(src: &Path, dest: &Path) -> bool {
    match (modified(src), modified(dest)) {
        (_, None) => true,
        (Some(src_time), Some(dest_time)) => src_time > dest_time,
        (None, Some(_)) => false,
    }
}

/// Decide and perform the copy for a single asset file.
pub fn sync_file(src: &Path, dest: &Path) -> Result<AssetAction, AssetError> {
    let file_name = src.file_name().and_then(|n| n.to_str()).unwrap_or_default();

    if let Some(converted) = converted_image_name(file_name) {
        let converted_dest = dest.with_file_name(converted);
        if !is_stale(src, &converted_dest) {
            return Ok(AssetAction::UpToDate);
        }
        if is_stale(src, dest) {
            copy(src, dest)?;
        }
        return Ok(AssetAction::CopiedPendingConversion);
    }

    if !is_stale(src, dest) {
        return Ok(AssetAction::UpToDate);
    }
    copy(src, dest)?;
    Ok(AssetAction::Copied)
}

fn copy(src: &Path, dest: &Path) -> Result<(), AssetError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dest)?;
    trace!(from = %src.display(), to = %dest.display(), "copied asset");
    Ok(())
}

/// Mirror an asset directory into `dest_dir`.
pub fn sync_assets(
    src_dir: &Path,
    dest_dir: &Path,
    stats: &mut Stats,
) -> Result<AssetSummary, AssetError> {
    let mut summary = AssetSummary::default();

    for entry in WalkDir::new(src_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(src_dir)
            .map_err(|_| AssetError::OutsideRoot(entry.path().to_path_buf()))?;
        let dest = dest_dir.join(rel);

        match sync_file(entry.path(), &dest)? {
            AssetAction::Copied => summary.copied += 1,
            AssetAction::CopiedPendingConversion => summary.pending_conversion += 1,
            AssetAction::UpToDate => summary.up_to_date += 1,
        }
    }

    debug!(
        dir = %src_dir.display(),
        copied = summary.copied,
        up_to_date = summary.up_to_date,
        pending = summary.pending_conversion,
        "synced assets"
    );
    stats.assets_copied += summary.copied;
    stats.assets_up_to_date += summary.up_to_date;
    stats.assets_pending_conversion += summary.pending_conversion;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    fn hours_ago(h: u64) -> SystemTime {
        SystemTime::now() - Duration::from_secs(h * 3600)
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src/_assets");
        let dest = tmp.path().join("dest/_assets");
        fs::create_dir_all(&src).unwrap();
        (tmp, src, dest)
    }

    #[test]
    fn copies_missing_files_recursively() {
        let (_tmp, src, dest) = setup();
        fs::write(src.join("a.png"), "a").unwrap();
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("sub/b.pdf"), "b").unwrap();

        let mut stats = Stats::default();
        let summary = sync_assets(&src, &dest, &mut stats).unwrap();

        assert_eq!(summary.copied, 2);
        assert_eq!(fs::read_to_string(dest.join("sub/b.pdf")).unwrap(), "b");
        assert_eq!(stats.assets_copied, 2);
    }

    #[test]
    fn newer_destination_is_kept() {
        let (_tmp, src, dest) = setup();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("a.png"), "new source").unwrap();
        fs::write(dest.join("a.png"), "edited copy").unwrap();
        set_mtime(&src.join("a.png"), hours_ago(2));
        set_mtime(&dest.join("a.png"), hours_ago(1));

        let summary = sync_assets(&src, &dest, &mut Stats::default()).unwrap();

        assert_eq!(summary.up_to_date, 1);
        assert_eq!(fs::read_to_string(dest.join("a.png")).unwrap(), "edited copy");
    }

    #[test]
    fn older_destination_is_replaced() {
        let (_tmp, src, dest) = setup();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("a.png"), "fresh").unwrap();
        fs::write(dest.join("a.png"), "stale").unwrap();
        set_mtime(&src.join("a.png"), hours_ago(1));
        set_mtime(&dest.join("a.png"), hours_ago(5));

        let summary = sync_assets(&src, &dest, &mut Stats::default()).unwrap();

        assert_eq!(summary.copied, 1);
        assert_eq!(fs::read_to_string(dest.join("a.png")).unwrap(), "fresh");
    }

    #[test]
    fn heic_with_converted_jpeg_is_up_to_date() {
        let (_tmp, src, dest) = setup();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("photo.heic"), "raw").unwrap();
        fs::write(dest.join("photo.jpeg"), "converted").unwrap();
        set_mtime(&src.join("photo.heic"), hours_ago(3));

        let summary = sync_assets(&src, &dest, &mut Stats::default()).unwrap();

        assert_eq!(summary.up_to_date, 1);
        assert!(!dest.join("photo.heic").exists());
    }

    #[test]
    fn heic_without_conversion_is_copied_and_pending() {
        let (_tmp, src, dest) = setup();
        fs::write(src.join("photo.HEIC"), "raw").unwrap();

        let mut stats = Stats::default();
        let summary = sync_assets(&src, &dest, &mut stats).unwrap();

        assert_eq!(summary.pending_conversion, 1);
        assert_eq!(summary.copied, 0);
        assert!(dest.join("photo.HEIC").exists());
        assert_eq!(stats.assets_pending_conversion, 1);
    }

    #[test]
    fn stale_when_destination_missing() {
        let (tmp, src, _dest) = setup();
        fs::write(src.join("a"), "").unwrap();
        assert!(is_stale(&src.join("a"), &tmp.path().join("missing")));
    }

    #[test]
    fn second_run_copies_nothing() {
        let (_tmp, src, dest) = setup();
        fs::write(src.join("a.png"), "a").unwrap();
        set_mtime(&src.join("a.png"), hours_ago(1));

        sync_assets(&src, &dest, &mut Stats::default()).unwrap();
        let again = sync_assets(&src, &dest, &mut Stats::default()).unwrap();

        assert_eq!(again.copied, 0);
        assert_eq!(again.up_to_date, 1);
    }
}
