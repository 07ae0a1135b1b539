use rusqlite::Connection;

use super::PrinterProfile;

/// Columns of the `printers` table.
pub(crate) const PROFILE_COLUMNS: &str = "id, connection_type, name, hostname, api_key, username, password,
    default_printer, position, camera_orientation, invert_x, invert_y, invert_z, sd_support,
    include_in_dashboard, hide_camera, stream_url, camera_aspect_ratio_16_9, record_name, record_data,
    needs_sync, user_modified";

/// Listing order of profiles. `id` makes ties on `(position, name)` stable.
pub(crate) const PROFILE_ORDER: &str = "ORDER BY position ASC, name ASC, id ASC";

pub(crate) fn initialize(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS printers (
            id INTEGER PRIMARY KEY,
            connection_type INTEGER NOT NULL DEFAULT 0,
            name TEXT NOT NULL,
            hostname TEXT NOT NULL,
            api_key TEXT NOT NULL,
            username TEXT,
            password TEXT,
            default_printer INTEGER NOT NULL DEFAULT 0,
            position INTEGER NOT NULL DEFAULT 0,
            camera_orientation INTEGER NOT NULL DEFAULT 0,
            invert_x INTEGER NOT NULL DEFAULT 0,
            invert_y INTEGER NOT NULL DEFAULT 0,
            invert_z INTEGER NOT NULL DEFAULT 0,
            sd_support INTEGER NOT NULL DEFAULT 1,
            include_in_dashboard INTEGER NOT NULL DEFAULT 1,
            hide_camera INTEGER NOT NULL DEFAULT 0,
            stream_url TEXT NOT NULL DEFAULT '/webcam/?action=stream',
            camera_aspect_ratio_16_9 INTEGER NOT NULL DEFAULT 0,
            record_name TEXT,
            record_data BLOB,
            needs_sync INTEGER NOT NULL DEFAULT 0,
            user_modified TEXT NOT NULL
        );

        -- At most one default printer.
        CREATE UNIQUE INDEX IF NOT EXISTS printers_default
            ON printers (default_printer) WHERE default_printer = 1;

        CREATE TABLE IF NOT EXISTS enclosure_inputs (
            id INTEGER PRIMARY KEY,
            printer_id INTEGER NOT NULL,
            index_id INTEGER NOT NULL,
            type TEXT NOT NULL,
            label TEXT NOT NULL,
            use_fahrenheit INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (printer_id) REFERENCES printers(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS enclosure_outputs (
            id INTEGER PRIMARY KEY,
            printer_id INTEGER NOT NULL,
            index_id INTEGER NOT NULL,
            type TEXT NOT NULL,
            label TEXT NOT NULL,
            FOREIGN KEY (printer_id) REFERENCES printers(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS multi_cameras (
            id INTEGER PRIMARY KEY,
            printer_id INTEGER NOT NULL,
            index_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            camera_url TEXT NOT NULL,
            camera_orientation INTEGER NOT NULL DEFAULT 0,
            stream_ratio TEXT NOT NULL DEFAULT '4:3',
            FOREIGN KEY (printer_id) REFERENCES printers(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS bed_probes (
            printer_id INTEGER PRIMARY KEY,
            cmd_probe_up TEXT NOT NULL,
            cmd_probe_down TEXT NOT NULL,
            cmd_self_test TEXT NOT NULL,
            cmd_release_alarm TEXT NOT NULL,
            cmd_probe_bed TEXT NOT NULL,
            cmd_save_settings TEXT NOT NULL,
            FOREIGN KEY (printer_id) REFERENCES printers(id) ON DELETE CASCADE
        );",
    )
}

/// Load every profile in listing order.
pub(crate) fn load_profiles(conn: &Connection) -> rusqlite::Result<Vec<PrinterProfile>> {
    let mut stmt = conn.prepare(&format!("SELECT {PROFILE_COLUMNS} FROM printers {PROFILE_ORDER}"))?;
    let rows = stmt.query_map([], PrinterProfile::from_row)?;
    rows.collect()
}
