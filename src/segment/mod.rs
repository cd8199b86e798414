//! Size-bounded segmentation of a single audio stream.
//!
//! The planner works on time ranges only; the cutter turns each range into a
//! file whose size is then measured.

mod planner;

pub use planner::{plan, MAX_SEGMENTS};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A half-open time range `[start, start + length)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start offset in seconds.
    pub start_seconds: f64,
    /// Length in seconds.
    pub length_seconds: f64,
}

impl TimeRange {
    pub fn new(start_seconds: f64, length_seconds: f64) -> Self {
        Self {
            start_seconds,
            length_seconds,
        }
    }

    /// End offset in seconds.
    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.length_seconds
    }
}

/// A segment realized on disk by the cutter.
#[derive(Debug, Clone)]
pub struct Segment {
    /// 1-based position; equal to chronological order.
    pub index: usize,
    /// Time range covered in the source stream.
    pub range: TimeRange,
    /// Size measured after cutting.
    pub size_bytes: u64,
    /// Location of the cut file.
    pub path: PathBuf,
}

/// File name for segment `index` of `total`.
///
/// A single segment keeps the plain title; split output gets a zero-padded
/// `_part_NNN` suffix.
pub fn segment_file_name(title: &str, extension: &str, index: usize, total: usize) -> String {
    if total > 1 {
        format!("{}_part_{:03}.{}", title, index, extension)
    } else {
        format!("{}.{}", title, extension)
    }
}

/// Name shown for the attachment. Only split output carries the part label.
pub fn attachment_name(title: &str, extension: &str, index: usize, total: usize) -> String {
    let file_name = segment_file_name(title, extension, index, total);
    if total > 1 {
        format!("Part {} - {}", index, file_name)
    } else {
        file_name
    }
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
