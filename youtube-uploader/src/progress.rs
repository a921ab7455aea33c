//! Upload progress estimation.
//!
//! [`estimate`] is a pure function of bytes sent, total size and elapsed time.
//! [`ProgressTracker`] feeds it from a running upload and only lets through snapshots
//! whose percentage is strictly higher than the last one it reported.

use std::fmt;
use std::time::{Duration, Instant};

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Shown as the ETA until a throughput measurement is available.
pub const ETA_CALCULATING: &str = "Calculating...";
/// Shown as the ETA once every byte has been sent and YouTube takes over.
pub const ETA_PROCESSING: &str = "Processing on YouTube...";

/// Coarse phase of an upload, derived from its percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadStatus {
    /// Below 95%.
    Uploading,
    /// 95% to 99%.
    AlmostDone,
    /// 100%: all bytes are sent and YouTube is processing the video.
    Processing,
}

impl UploadStatus {
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            0..95 => Self::Uploading,
            95..100 => Self::AlmostDone,
            _ => Self::Processing,
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uploading => write!(f, "Uploading"),
            Self::AlmostDone => write!(f, "Almost done"),
            Self::Processing => write!(f, "Processing"),
        }
    }
}

/// What [`estimate`] derives from a single progress measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub percentage: u8,
    /// Average throughput so far in MiB/s, rounded to two decimals.
    pub speed_mbps: f64,
    /// Human-readable remaining time.
    pub eta: String,
    pub status: UploadStatus,
}

/// A progress report for an in-flight upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadProgress {
    pub percentage: u8,
    pub bytes_uploaded: u64,
    pub total_bytes: u64,
    pub status: UploadStatus,
    pub eta: String,
    pub speed_mbps: f64,
}

/// Derives percentage, throughput and remaining time for an upload.
///
/// Throughput is the average since the upload started (`bytes_uploaded / elapsed`), and
/// the remaining time projects that rate over the bytes still to send.
pub fn estimate(bytes_uploaded: u64, total_bytes: u64, elapsed: Duration) -> Estimate {
    let bytes_uploaded = bytes_uploaded.min(total_bytes);
    let percentage = if total_bytes == 0 {
        100
    } else {
        (bytes_uploaded as f64 * 100.0 / total_bytes as f64)
            .round()
            .min(100.0) as u8
    };

    let elapsed_secs = elapsed.as_secs_f64();
    let bytes_per_sec = if elapsed_secs > 0.0 {
        bytes_uploaded as f64 / elapsed_secs
    } else {
        0.0
    };

    let eta = if percentage >= 100 {
        ETA_PROCESSING.to_string()
    } else if bytes_per_sec <= 0.0 {
        ETA_CALCULATING.to_string()
    } else {
        let remaining = (total_bytes - bytes_uploaded) as f64 / bytes_per_sec;
        format_remaining(Duration::from_secs_f64(remaining.ceil()))
    };

    Estimate {
        percentage,
        speed_mbps: (bytes_per_sec / BYTES_PER_MEGABYTE * 100.0).round() / 100.0,
        eta,
        status: UploadStatus::from_percentage(percentage),
    }
}

fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m remaining")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s remaining")
    } else {
        format!("{seconds}s remaining")
    }
}

/// Turns a stream of byte counts into de-duplicated [`UploadProgress`] snapshots.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total_bytes: u64,
    started: Instant,
    last_percentage: u8,
}

impl ProgressTracker {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            started: Instant::now(),
            last_percentage: 0,
        }
    }

    /// Records that `bytes_uploaded` bytes have been sent so far.
    ///
    /// Returns a snapshot only if the rounded percentage went up since the last one.
    pub fn observe(&mut self, bytes_uploaded: u64) -> Option<UploadProgress> {
        let elapsed = self.started.elapsed();
        self.observe_at(bytes_uploaded, elapsed)
    }

    /// Like [`Self::observe`], with an explicit elapsed time.
    pub fn observe_at(&mut self, bytes_uploaded: u64, elapsed: Duration) -> Option<UploadProgress> {
        let estimate = estimate(bytes_uploaded, self.total_bytes, elapsed);
        if estimate.percentage <= self.last_percentage {
            return None;
        }
        self.last_percentage = estimate.percentage;
        Some(UploadProgress {
            percentage: estimate.percentage,
            bytes_uploaded: bytes_uploaded.min(self.total_bytes),
            total_bytes: self.total_bytes,
            status: estimate.status,
            eta: estimate.eta,
            speed_mbps: estimate.speed_mbps,
        })
    }
}
