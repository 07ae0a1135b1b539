//! Accessory records owned by a printer profile. They describe hardware the
//! server's plugins expose, and are deleted along with their profile.

use rusqlite::{params, Row, Transaction};

use super::ProfileId;
use crate::camera::{AspectRatio, CameraOrientation};

/// Sensor of the Enclosure plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnclosureInput {
    /// Index of the sensor in the plugin's configuration.
    pub index: i32,
    /// Sensor type, like `temp` or `gpio`.
    pub kind: String,
    /// Label configured in the plugin.
    pub label: String,
    /// Report temperatures in Fahrenheit.
    pub use_fahrenheit: bool,
}

/// Output (relay, PWM, LED strip...) of the Enclosure plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnclosureOutput {
    /// Index of the output in the plugin's configuration.
    pub index: i32,
    /// Output type, like `regular` or `pwm`.
    pub kind: String,
    /// Label configured in the plugin.
    pub label: String,
}

/// Extra camera configured through the MultiCam plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiCamera {
    /// Position of the camera in the plugin's list.
    pub index: i32,
    /// Name of the camera.
    pub name: String,
    /// Stream url, relative to the server or absolute.
    pub camera_url: String,
    /// Rotation to apply to frames.
    pub orientation: CameraOrientation,
    /// Aspect ratio of the stream.
    pub stream_ratio: AspectRatio,
}

/// Gcode commands driving a BLTouch bed leveling probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedProbeCommands {
    /// Retract the probe pin.
    pub probe_up: String,
    /// Deploy the probe pin.
    pub probe_down: String,
    /// Run the probe self test.
    pub self_test: String,
    /// Clear the probe alarm.
    pub release_alarm: String,
    /// Probe the bed.
    pub probe_bed: String,
    /// Persist settings to EEPROM.
    pub save_settings: String,
}

/// Any record that can be attached to a printer profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessory {
    /// See [EnclosureInput].
    EnclosureInput(EnclosureInput),
    /// See [EnclosureOutput].
    EnclosureOutput(EnclosureOutput),
    /// See [MultiCamera].
    MultiCamera(MultiCamera),
    /// See [BedProbeCommands]. A profile holds at most one.
    BedProbe(BedProbeCommands),
}

/// All accessory records of a profile, each list ordered by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accessories {
    /// Enclosure plugin sensors.
    pub enclosure_inputs: Vec<EnclosureInput>,
    /// Enclosure plugin outputs.
    pub enclosure_outputs: Vec<EnclosureOutput>,
    /// MultiCam plugin cameras.
    pub cameras: Vec<MultiCamera>,
    /// BLTouch commands.
    pub bed_probe: Option<BedProbeCommands>,
}

/// Tables holding accessory records, all keyed by `printer_id`.
pub(crate) const ACCESSORY_TABLES: [&str; 4] = ["enclosure_inputs", "enclosure_outputs", "multi_cameras", "bed_probes"];

pub(crate) fn insert(tx: &Transaction<'_>, owner: ProfileId, accessory: &Accessory) -> rusqlite::Result<()> {
    match accessory {
        Accessory::EnclosureInput(input) => tx.execute(
            "INSERT INTO enclosure_inputs (printer_id, index_id, type, label, use_fahrenheit)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![owner.0, input.index, input.kind, input.label, input.use_fahrenheit],
        )?,
        Accessory::EnclosureOutput(output) => tx.execute(
            "INSERT INTO enclosure_outputs (printer_id, index_id, type, label) VALUES (?1, ?2, ?3, ?4)",
            params![owner.0, output.index, output.kind, output.label],
        )?,
        Accessory::MultiCamera(camera) => tx.execute(
            "INSERT INTO multi_cameras (printer_id, index_id, name, camera_url, camera_orientation, stream_ratio)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                owner.0,
                camera.index,
                camera.name,
                camera.camera_url,
                camera.orientation.code(),
                camera.stream_ratio.to_string()
            ],
        )?,
        Accessory::BedProbe(probe) => tx.execute(
            "INSERT OR REPLACE INTO bed_probes (printer_id, cmd_probe_up, cmd_probe_down, cmd_self_test,
                                                cmd_release_alarm, cmd_probe_bed, cmd_save_settings)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                owner.0,
                probe.probe_up,
                probe.probe_down,
                probe.self_test,
                probe.release_alarm,
                probe.probe_bed,
                probe.save_settings
            ],
        )?,
    };
    Ok(())
}

pub(crate) fn delete_for(tx: &Transaction<'_>, owner: Option<ProfileId>) -> rusqlite::Result<()> {
    for table in ACCESSORY_TABLES {
        match owner {
            Some(owner) => tx.execute(&format!("DELETE FROM {table} WHERE printer_id = ?1"), params![owner.0])?,
            None => tx.execute(&format!("DELETE FROM {table}"), [])?,
        };
    }
    Ok(())
}

pub(crate) fn load(conn: &rusqlite::Connection, owner: ProfileId) -> rusqlite::Result<Accessories> {
    let mut stmt = conn.prepare(
        "SELECT index_id, type, label, use_fahrenheit FROM enclosure_inputs
         WHERE printer_id = ?1 ORDER BY index_id, id",
    )?;
    let enclosure_inputs = stmt
        .query_map(params![owner.0], |row| {
            Ok(EnclosureInput {
                index: row.get(0)?,
                kind: row.get(1)?,
                label: row.get(2)?,
                use_fahrenheit: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(
        "SELECT index_id, type, label FROM enclosure_outputs
         WHERE printer_id = ?1 ORDER BY index_id, id",
    )?;
    let enclosure_outputs = stmt
        .query_map(params![owner.0], |row| {
            Ok(EnclosureOutput {
                index: row.get(0)?,
                kind: row.get(1)?,
                label: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(
        "SELECT index_id, name, camera_url, camera_orientation, stream_ratio FROM multi_cameras
         WHERE printer_id = ?1 ORDER BY index_id, id",
    )?;
    let cameras = stmt
        .query_map(params![owner.0], camera_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(
        "SELECT cmd_probe_up, cmd_probe_down, cmd_self_test, cmd_release_alarm, cmd_probe_bed, cmd_save_settings
         FROM bed_probes WHERE printer_id = ?1",
    )?;
    let mut rows = stmt.query(params![owner.0])?;
    let bed_probe = match rows.next()? {
        Some(row) => Some(BedProbeCommands {
            probe_up: row.get(0)?,
            probe_down: row.get(1)?,
            self_test: row.get(2)?,
            release_alarm: row.get(3)?,
            probe_bed: row.get(4)?,
            save_settings: row.get(5)?,
        }),
        None => None,
    };

    Ok(Accessories {
        enclosure_inputs,
        enclosure_outputs,
        cameras,
        bed_probe,
    })
}

fn camera_from_row(row: &Row<'_>) -> rusqlite::Result<MultiCamera> {
    let stream_ratio: String = row.get(4)?;
    Ok(MultiCamera {
        index: row.get(0)?,
        name: row.get(1)?,
        camera_url: row.get(2)?,
        orientation: CameraOrientation::from_code(row.get(3)?),
        stream_ratio: stream_ratio.parse().unwrap_or_default(),
    })
}
