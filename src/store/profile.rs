use chrono::{DateTime, Utc};
use parse_display::{Display, FromStr};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::camera::{AspectRatio, CameraOrientation, DEFAULT_STREAM_PATH};

const REFERENCE_PREFIX: &str = "printer-fleet://profile/";

/// Identity of a stored printer profile.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[display("{0}")]
pub struct ProfileId(pub(crate) i64);

impl ProfileId {
    /// Opaque reference to this profile, stable for the lifetime of the
    /// record. Handed to views that need to point back at a profile without
    /// holding on to it.
    pub fn reference(&self) -> String {
        format!("{}{}", REFERENCE_PREFIX, self.0)
    }

    /// Parse a reference built by [ProfileId::reference].
    pub fn from_reference(reference: &str) -> Option<Self> {
        reference.strip_prefix(REFERENCE_PREFIX)?.parse().ok().map(Self)
    }
}

/// Kind of server a profile connects to.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Display, FromStr)]
#[display(style = "kebab-case")]
pub enum ConnectionType {
    /// OctoPrint server.
    #[default]
    #[display("octoprint")]
    OctoPrint,
    /// Klipper through Moonraker's OctoPrint compatible api.
    Klipper,
}

impl ConnectionType {
    pub(crate) fn code(&self) -> i64 {
        match self {
            Self::OctoPrint => 0,
            Self::Klipper => 1,
        }
    }

    pub(crate) fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Klipper,
            _ => Self::OctoPrint,
        }
    }
}

/// Fields supplied by the caller when adding a printer. Everything else is
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewPrinter {
    /// Kind of server.
    pub connection_type: ConnectionType,
    /// Display name.
    pub name: String,
    /// Base url of the server.
    pub hostname: String,
    /// Api key used to authenticate.
    pub api_key: String,
    /// Username for http basic auth, if the server sits behind one.
    pub username: Option<String>,
    /// Password for http basic auth.
    pub password: Option<String>,
    /// Ordering key in printer lists.
    pub position: i32,
    /// Whether the new record still has to be pushed to the sync backend.
    pub needs_sync: bool,
    /// When the settings were last edited by the user.
    pub modified: DateTime<Utc>,
}

impl NewPrinter {
    /// A new OctoPrint printer at position 0, without basic auth.
    pub fn new(name: &str, hostname: &str, api_key: &str) -> Self {
        Self {
            connection_type: ConnectionType::OctoPrint,
            name: name.to_owned(),
            hostname: hostname.to_owned(),
            api_key: api_key.to_owned(),
            username: None,
            password: None,
            position: 0,
            needs_sync: false,
            modified: Utc::now(),
        }
    }
}

/// A persisted printer server connection configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PrinterProfile {
    pub(crate) id: ProfileId,
    pub(crate) is_default: bool,

    /// Kind of server.
    pub connection_type: ConnectionType,
    /// Display name.
    pub name: String,
    /// Base url of the server.
    pub hostname: String,
    /// Api key used to authenticate.
    pub api_key: String,
    /// Username for http basic auth.
    pub username: Option<String>,
    /// Password for http basic auth.
    pub password: Option<String>,
    /// Ordering key in printer lists.
    pub position: i32,

    /// Rotation to apply to the main camera.
    pub camera_orientation: CameraOrientation,
    /// Invert jogging on the X axis.
    pub invert_x: bool,
    /// Invert jogging on the Y axis.
    pub invert_y: bool,
    /// Invert jogging on the Z axis.
    pub invert_z: bool,
    /// Whether the printer has an SD card reader.
    pub sd_support: bool,
    /// Whether the printer shows up in the dashboard.
    pub include_in_dashboard: bool,
    /// Hide the main camera everywhere.
    pub hide_camera: bool,
    /// Main camera stream, relative to the server or absolute.
    pub stream_url: String,
    /// Aspect ratio of the main camera.
    pub camera_aspect_ratio: AspectRatio,

    /// Identifier of the record in the sync backend.
    pub record_name: Option<String>,
    /// Opaque payload kept for the sync backend.
    pub record_data: Option<Vec<u8>>,
    /// Whether local changes still have to be pushed to the sync backend.
    pub needs_sync: bool,
    /// When the settings were last edited by the user.
    pub user_modified: DateTime<Utc>,
}

impl PrinterProfile {
    /// Identity of the profile.
    pub fn id(&self) -> ProfileId {
        self.id
    }

    /// Whether this is the default printer. Only the store changes this flag.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Url of the main camera stream.
    pub fn camera_url(&self) -> String {
        crate::camera::absolute_url(&self.hostname, &self.stream_url)
    }

    pub(crate) fn from_new(id: ProfileId, is_default: bool, new: NewPrinter) -> Self {
        Self {
            id,
            is_default,
            connection_type: new.connection_type,
            name: new.name,
            hostname: new.hostname,
            api_key: new.api_key,
            username: new.username,
            password: new.password,
            position: new.position,
            // Real values get filled in once the server has been queried.
            camera_orientation: CameraOrientation::Up,
            invert_x: false,
            invert_y: false,
            invert_z: false,
            sd_support: true,
            include_in_dashboard: true,
            hide_camera: false,
            stream_url: DEFAULT_STREAM_PATH.to_owned(),
            camera_aspect_ratio: AspectRatio::FourByThree,
            record_name: None,
            record_data: None,
            needs_sync: new.needs_sync,
            user_modified: new.modified,
        }
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: ProfileId(row.get("id")?),
            is_default: row.get("default_printer")?,
            connection_type: ConnectionType::from_code(row.get("connection_type")?),
            name: row.get("name")?,
            hostname: row.get("hostname")?,
            api_key: row.get("api_key")?,
            username: row.get("username")?,
            password: row.get("password")?,
            position: row.get("position")?,
            camera_orientation: CameraOrientation::from_code(row.get("camera_orientation")?),
            invert_x: row.get("invert_x")?,
            invert_y: row.get("invert_y")?,
            invert_z: row.get("invert_z")?,
            sd_support: row.get("sd_support")?,
            include_in_dashboard: row.get("include_in_dashboard")?,
            hide_camera: row.get("hide_camera")?,
            stream_url: row.get("stream_url")?,
            camera_aspect_ratio: if row.get::<_, bool>("camera_aspect_ratio_16_9")? {
                AspectRatio::SixteenByNine
            } else {
                AspectRatio::FourByThree
            },
            record_name: row.get("record_name")?,
            record_data: row.get("record_data")?,
            needs_sync: row.get("needs_sync")?,
            user_modified: row.get("user_modified")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_reference_round_trip() {
        let id = ProfileId(42);
        assert_eq!(id.reference(), "printer-fleet://profile/42");
        assert_eq!(ProfileId::from_reference(&id.reference()), Some(id));
    }

    #[test]
    fn test_reference_rejects_foreign_urls() {
        assert_eq!(ProfileId::from_reference("printer-fleet://camera/42"), None);
        assert_eq!(ProfileId::from_reference("printer-fleet://profile/"), None);
        assert_eq!(ProfileId::from_reference("printer-fleet://profile/abc"), None);
    }

    #[test]
    fn test_connection_type_from_str() {
        assert_eq!("klipper".parse::<ConnectionType>().unwrap(), ConnectionType::Klipper);
        assert_eq!(ConnectionType::OctoPrint.to_string(), "octoprint");
    }
}
