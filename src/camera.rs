//! Helpers to turn the camera settings of a printer profile into something a
//! video player can open.

use parse_display::{Display, FromStr};
use serde::{Deserialize, Serialize};

/// Stream path OctoPrint ships with when the webcam is configured with
/// mjpg-streamer.
pub const DEFAULT_STREAM_PATH: &str = "/webcam/?action=stream";

/// Rotation and mirroring to apply to camera frames before display.
///
/// The integer codes are the ones stored in the profile database.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, FromStr)]
#[display(style = "kebab-case")]
pub enum CameraOrientation {
    /// No rotation.
    #[default]
    Up,
    /// Rotated 180 degrees.
    Down,
    /// Rotated 90 degrees counter-clockwise.
    Left,
    /// Rotated 90 degrees clockwise.
    Right,
    /// Flipped horizontally.
    UpMirrored,
    /// Flipped vertically.
    DownMirrored,
    /// Flipped horizontally and rotated 90 degrees counter-clockwise.
    LeftMirrored,
    /// Flipped horizontally and rotated 90 degrees clockwise.
    RightMirrored,
}

impl CameraOrientation {
    /// Integer code persisted for this orientation.
    pub fn code(&self) -> i64 {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::Left => 2,
            Self::Right => 3,
            Self::UpMirrored => 4,
            Self::DownMirrored => 5,
            Self::LeftMirrored => 6,
            Self::RightMirrored => 7,
        }
    }

    /// Orientation for a persisted code. Unknown codes fall back to [CameraOrientation::Up].
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Down,
            2 => Self::Left,
            3 => Self::Right,
            4 => Self::UpMirrored,
            5 => Self::DownMirrored,
            6 => Self::LeftMirrored,
            7 => Self::RightMirrored,
            _ => Self::Up,
        }
    }
}

/// Aspect ratio of a camera stream.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Display, FromStr)]
pub enum AspectRatio {
    /// Classic webcam ratio.
    #[default]
    #[display("4:3")]
    FourByThree,
    /// Widescreen.
    #[display("16:9")]
    SixteenByNine,
}

impl AspectRatio {
    /// Height of the stream relative to its width.
    pub fn height_factor(&self) -> f64 {
        match self {
            Self::FourByThree => 0.75,
            Self::SixteenByNine => 0.5625,
        }
    }
}

/// Build the url of a camera stream. Streams hosted by OctoPrint are stored
/// as a path relative to the server, external cameras as a full url.
pub fn absolute_url(hostname: &str, stream_url: &str) -> String {
    if stream_url.starts_with("http://") || stream_url.starts_with("https://") {
        return stream_url.to_owned();
    }

    format!(
        "{}/{}",
        hostname.trim_end_matches('/'),
        stream_url.trim_start_matches('/')
    )
}

/// Whether `url` points at an HLS playlist rather than an MJPEG stream.
pub fn is_hls(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.to_ascii_lowercase().ends_with(".m3u8")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_absolute_url_relative_path() {
        assert_eq!(
            absolute_url("http://octopi.local", DEFAULT_STREAM_PATH),
            "http://octopi.local/webcam/?action=stream"
        );
        assert_eq!(
            absolute_url("http://octopi.local/", "webcam/?action=stream"),
            "http://octopi.local/webcam/?action=stream"
        );
    }

    #[test]
    fn test_absolute_url_external_camera() {
        assert_eq!(
            absolute_url("http://octopi.local", "https://cam.example.com/live.m3u8"),
            "https://cam.example.com/live.m3u8"
        );
    }

    #[test]
    fn test_is_hls() {
        assert!(is_hls("https://cam.example.com/live.m3u8"));
        assert!(is_hls("https://cam.example.com/LIVE.M3U8?token=abc"));
        assert!(!is_hls("http://octopi.local/webcam/?action=stream"));
        assert!(!is_hls("http://octopi.local/webcam/?file=live.m3u8x"));
    }

    #[test]
    fn test_orientation_codes() {
        for code in 0..8 {
            assert_eq!(CameraOrientation::from_code(code).code(), code);
        }
        assert_eq!(CameraOrientation::from_code(42), CameraOrientation::Up);
    }

    #[test]
    fn test_orientation_from_str() {
        assert_eq!(
            "left-mirrored".parse::<CameraOrientation>().unwrap(),
            CameraOrientation::LeftMirrored
        );
        assert_eq!(CameraOrientation::Down.to_string(), "down");
    }

    #[test]
    fn test_aspect_ratio() {
        assert_eq!("16:9".parse::<AspectRatio>().unwrap(), AspectRatio::SixteenByNine);
        assert_eq!(AspectRatio::SixteenByNine.height_factor(), 0.5625);
        assert_eq!(AspectRatio::default().height_factor(), 0.75);
    }
}
