use chrono::{DateTime, TimeDelta, TimeZone};
use octoprint::{JobStatus, LayerProgress};

use crate::{
    camera::{self, AspectRatio, CameraOrientation},
    store::{PrinterProfile, ProfileId},
};

/// What a status tile shows for one printer. Every field is display text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileStatus {
    /// Printer state, like `Printing` or `Offline`.
    pub printer_status: String,
    /// Percentage printed.
    pub progress: Option<String>,
    /// Time spent printing.
    pub print_time: Option<String>,
    /// Estimated time left.
    pub print_time_left: Option<String>,
    /// Estimated wall clock time the print completes at.
    pub completion: Option<String>,
    /// Layer being printed, `current / total`.
    pub layer: Option<String>,
}

impl TileStatus {
    /// Shown until an observer reports for the first time.
    pub fn connecting() -> Self {
        Self {
            printer_status: "Connecting".to_owned(),
            ..Default::default()
        }
    }

    /// Shown while a server can't be reached.
    pub fn offline() -> Self {
        Self {
            printer_status: "Offline".to_owned(),
            ..Default::default()
        }
    }

    /// Build the tile text from a job status. `now` anchors the estimated
    /// completion time.
    pub fn from_job<Tz>(job: &JobStatus, layer: Option<&LayerProgress>, now: DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let progress = &job.progress;
        let completion = progress
            .print_time_left
            .filter(|left| *left > 0.0)
            .and_then(|left| format_completion(&now, left));

        Self {
            printer_status: job.state.clone(),
            progress: progress.completion.map(|completion| format!("{:.1}%", completion)),
            print_time: progress.print_time.map(format_duration),
            print_time_left: progress.print_time_left.map(format_duration),
            completion,
            layer: layer.and_then(LayerProgress::display),
        }
    }
}

/// `1h 05m`, `12m 03s` or `42s`.
pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0).round() as u64;
    let (hours, minutes, seconds) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);

    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// `None` when the server reports a time left past what a date can hold.
fn format_completion<Tz>(now: &DateTime<Tz>, seconds_left: f64) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let left = TimeDelta::try_seconds(seconds_left.round() as i64)?;
    let done = now.clone().checked_add_signed(left)?;
    if done.date_naive() == now.date_naive() {
        Some(done.format("%H:%M").to_string())
    } else {
        Some(done.format("%a %H:%M").to_string())
    }
}

/// A status tile: one printer and the latest status its observer reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTile {
    /// Printer the tile belongs to.
    pub profile: ProfileId,
    /// Printer name.
    pub name: String,
    /// Latest reported status.
    pub status: TileStatus,
}

/// How a camera stream has to be played.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StreamKind {
    /// Motion JPEG over http.
    Mjpeg,
    /// HTTP live streaming playlist.
    Hls,
}

/// A camera tile: the main camera of one printer.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraTile {
    /// Opaque reference to the printer, see [ProfileId::reference].
    pub reference: String,
    /// Label drawn over the video.
    pub label: String,
    /// Absolute stream url.
    pub url: String,
    /// Player to use.
    pub kind: StreamKind,
    /// Rotation to apply to frames.
    pub orientation: CameraOrientation,
    /// Aspect ratio of the stream.
    pub aspect_ratio: AspectRatio,
}

impl CameraTile {
    pub(crate) fn for_profile(profile: &PrinterProfile) -> Self {
        let url = profile.camera_url();
        Self {
            reference: profile.id().reference(),
            label: profile.name.clone(),
            kind: if camera::is_hls(&url) {
                StreamKind::Hls
            } else {
                StreamKind::Mjpeg
            },
            url,
            orientation: profile.camera_orientation,
            aspect_ratio: profile.camera_aspect_ratio,
        }
    }

    /// Height of the tile when laid out `width` wide.
    pub fn height_for_width(&self, width: f64) -> f64 {
        width * self.aspect_ratio.height_factor()
    }
}
