//! Durable store of printer profiles, backed by SQLite.
//!
//! Every write runs in one SQLite transaction while holding the single writer
//! lock. Before the lock is released the read view (the list every `get_*`
//! call is served from) is replaced with the committed state, so a write made
//! from a background thread is visible to the interactive thread by the time
//! the call returns. A failed write rolls back and leaves the read view as it
//! was.
//!
//! The store also owns the default printer rule: while profiles exist,
//! exactly one of them is the default.

mod accessory;
mod profile;
mod schema;

pub use accessory::{Accessories, Accessory, BedProbeCommands, EnclosureInput, EnclosureOutput, MultiCamera};
pub use profile::{ConnectionType, NewPrinter, PrinterProfile, ProfileId};

use std::{
    path::Path,
    sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard},
};

use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::camera::AspectRatio;

/// Errors returned by [PrinterStore].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database rejected a statement.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database file's directory could not be created.
    #[error("failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),

    /// No profile with this id.
    #[error("printer profile {0} does not exist")]
    UnknownProfile(ProfileId),

    /// A thread panicked while holding the writer lock.
    #[error("printer store writer lock poisoned")]
    LockPoisoned,
}

/// Handle to the printer profile database. Clones share the same database
/// and read view, and can be moved to other threads.
#[derive(Clone)]
pub struct PrinterStore {
    inner: Arc<Inner>,
}

struct Inner {
    writer: Mutex<Connection>,
    view: RwLock<Vec<PrinterProfile>>,
}

impl std::fmt::Debug for PrinterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrinterStore").field("profiles", &self.view().len()).finish()
    }
}

impl PrinterStore {
    /// Open (or create) the database at `path`. Missing parent directories
    /// are created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        tracing::debug!(path = %path.display(), "opening printer store");
        Self::from_connection(Connection::open(path)?)
    }

    /// Open a store that lives only as long as this handle and its clones.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        schema::initialize(&conn)?;
        let profiles = schema::load_profiles(&conn)?;

        Ok(Self {
            inner: Arc::new(Inner {
                writer: Mutex::new(conn),
                view: RwLock::new(profiles),
            }),
        })
    }

    // Reads, served from the read view.

    fn view(&self) -> RwLockReadGuard<'_, Vec<PrinterProfile>> {
        // The view is only ever replaced wholesale, so a poisoned lock still
        // guards a complete list.
        self.inner.view.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// All profiles, ordered by position then name.
    pub fn list(&self) -> Vec<PrinterProfile> {
        self.view().clone()
    }

    /// Profiles to show in the dashboard, in listing order.
    pub fn dashboard_profiles(&self) -> Vec<PrinterProfile> {
        self.view()
            .iter()
            .filter(|profile| profile.include_in_dashboard)
            .cloned()
            .collect()
    }

    /// The default printer, if any profile exists.
    pub fn get_default(&self) -> Option<PrinterProfile> {
        self.find(|profile| profile.is_default)
    }

    /// Look up a profile by id.
    pub fn get_by_id(&self, id: ProfileId) -> Option<PrinterProfile> {
        self.find(|profile| profile.id == id)
    }

    /// Look up a profile by display name. With duplicate names, the first one
    /// in listing order wins.
    pub fn get_by_name(&self, name: &str) -> Option<PrinterProfile> {
        self.find(|profile| profile.name == name)
    }

    /// Look up a profile by its identifier in the sync backend.
    pub fn get_by_record_name(&self, record_name: &str) -> Option<PrinterProfile> {
        self.find(|profile| profile.record_name.as_deref() == Some(record_name))
    }

    /// Look up a profile by a reference from [ProfileId::reference].
    pub fn get_by_reference(&self, reference: &str) -> Option<PrinterProfile> {
        self.get_by_id(ProfileId::from_reference(reference)?)
    }

    fn find(&self, predicate: impl Fn(&PrinterProfile) -> bool) -> Option<PrinterProfile> {
        self.view().iter().find(|profile| predicate(profile)).cloned()
    }

    /// Accessory records owned by `owner`.
    pub fn accessories(&self, owner: ProfileId) -> Result<Accessories, StoreError> {
        let conn = self.inner.writer.lock().map_err(|_| StoreError::LockPoisoned)?;
        if !exists(&conn, owner)? {
            return Err(StoreError::UnknownProfile(owner));
        }
        Ok(accessory::load(&conn, owner)?)
    }

    /// Reload the read view from the database.
    pub fn refresh(&self) -> Result<(), StoreError> {
        self.write("refresh", |_| Ok(()))
    }

    // Writes.

    /// Add a printer. The first printer ever added becomes the default one.
    pub fn add(&self, new: NewPrinter) -> Result<ProfileId, StoreError> {
        self.write("add", |tx| {
            let has_default: bool = tx.query_row(
                "SELECT EXISTS (SELECT 1 FROM printers WHERE default_printer = 1)",
                [],
                |row| row.get(0),
            )?;
            let profile = PrinterProfile::from_new(ProfileId(0), !has_default, new);

            tx.execute(
                "INSERT INTO printers (connection_type, name, hostname, api_key, username, password,
                    default_printer, position, camera_orientation, invert_x, invert_y, invert_z, sd_support,
                    include_in_dashboard, hide_camera, stream_url, camera_aspect_ratio_16_9, record_name,
                    record_data, needs_sync, user_modified)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19,
                    ?20, ?21)",
                params![
                    profile.connection_type.code(),
                    profile.name,
                    profile.hostname,
                    profile.api_key,
                    profile.username,
                    profile.password,
                    profile.is_default,
                    profile.position,
                    profile.camera_orientation.code(),
                    profile.invert_x,
                    profile.invert_y,
                    profile.invert_z,
                    profile.sd_support,
                    profile.include_in_dashboard,
                    profile.hide_camera,
                    profile.stream_url,
                    profile.camera_aspect_ratio == AspectRatio::SixteenByNine,
                    profile.record_name,
                    profile.record_data,
                    profile.needs_sync,
                    profile.user_modified,
                ],
            )?;

            let id = ProfileId(tx.last_insert_rowid());
            tracing::info!(%id, name = %profile.name, default = profile.is_default, "added printer");
            Ok(id)
        })
    }

    /// Attach an accessory record to an existing profile. Adding a bed probe
    /// replaces the one already attached.
    pub fn add_accessory(&self, owner: ProfileId, accessory: Accessory) -> Result<(), StoreError> {
        self.write("add_accessory", |tx| {
            if !exists(tx, owner)? {
                return Err(StoreError::UnknownProfile(owner));
            }
            accessory::insert(tx, owner, &accessory)?;
            Ok(())
        })
    }

    /// Make `id` the default printer, clearing the flag on the previous one.
    pub fn set_default(&self, id: ProfileId) -> Result<(), StoreError> {
        self.write("set_default", |tx| {
            if !exists(tx, id)? {
                return Err(StoreError::UnknownProfile(id));
            }
            // Clear first: the unique index allows a single flagged row.
            tx.execute(
                "UPDATE printers SET default_printer = 0 WHERE default_printer = 1 AND id != ?1",
                params![id.0],
            )?;
            tx.execute("UPDATE printers SET default_printer = 1 WHERE id = ?1", params![id.0])?;
            tracing::debug!(%id, "changed default printer");
            Ok(())
        })
    }

    /// Persist the settings of `profile`. The default flag is left alone; use
    /// [PrinterStore::set_default] for that.
    pub fn update(&self, profile: &PrinterProfile) -> Result<(), StoreError> {
        self.write("update", |tx| {
            let changed = tx.execute(
                "UPDATE printers SET connection_type = ?1, name = ?2, hostname = ?3, api_key = ?4,
                    username = ?5, password = ?6, position = ?7, camera_orientation = ?8, invert_x = ?9,
                    invert_y = ?10, invert_z = ?11, sd_support = ?12, include_in_dashboard = ?13,
                    hide_camera = ?14, stream_url = ?15, camera_aspect_ratio_16_9 = ?16, record_name = ?17,
                    record_data = ?18, needs_sync = ?19, user_modified = ?20
                 WHERE id = ?21",
                params![
                    profile.connection_type.code(),
                    profile.name,
                    profile.hostname,
                    profile.api_key,
                    profile.username,
                    profile.password,
                    profile.position,
                    profile.camera_orientation.code(),
                    profile.invert_x,
                    profile.invert_y,
                    profile.invert_z,
                    profile.sd_support,
                    profile.include_in_dashboard,
                    profile.hide_camera,
                    profile.stream_url,
                    profile.camera_aspect_ratio == AspectRatio::SixteenByNine,
                    profile.record_name,
                    profile.record_data,
                    profile.needs_sync,
                    profile.user_modified,
                    profile.id.0,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::UnknownProfile(profile.id));
            }
            Ok(())
        })
    }

    /// Delete a profile and its accessories. If it was the default printer,
    /// the remaining profile that lists first becomes the default.
    pub fn delete(&self, id: ProfileId) -> Result<(), StoreError> {
        self.write("delete", |tx| {
            let was_default: bool = tx
                .query_row(
                    "SELECT default_printer FROM printers WHERE id = ?1",
                    params![id.0],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or(StoreError::UnknownProfile(id))?;

            accessory::delete_for(tx, Some(id))?;
            tx.execute("DELETE FROM printers WHERE id = ?1", params![id.0])?;
            tracing::info!(%id, "deleted printer");

            if was_default {
                elect_default(tx)?;
            }
            Ok(())
        })
    }

    /// Delete every profile and every accessory.
    pub fn delete_all(&self) -> Result<(), StoreError> {
        self.write("delete_all", |tx| {
            accessory::delete_for(tx, None)?;
            let deleted = tx.execute("DELETE FROM printers", [])?;
            tracing::info!(deleted, "deleted all printers");
            Ok(())
        })
    }

    /// Forget everything known about the sync backend and flag every profile
    /// to be pushed again.
    pub fn reset_sync_state(&self) -> Result<(), StoreError> {
        self.write("reset_sync_state", |tx| {
            tx.execute(
                "UPDATE printers SET record_name = NULL, record_data = NULL, needs_sync = 1",
                [],
            )?;
            Ok(())
        })
    }

    fn write<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let result = self.commit(f);
        if let Err(err) = &result {
            tracing::error!(operation, error = %err, "printer store write failed");
        }
        result
    }

    fn commit<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let mut conn = self.inner.writer.lock().map_err(|_| StoreError::LockPoisoned)?;

        // Dropping `tx` on any early return rolls back.
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        let profiles = schema::load_profiles(&tx)?;
        tx.commit()?;

        // Swap while still holding the writer so views land in commit order.
        *self.inner.view.write().unwrap_or_else(PoisonError::into_inner) = profiles;
        Ok(value)
    }
}

fn exists(conn: &Connection, id: ProfileId) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM printers WHERE id = ?1)",
        params![id.0],
        |row| row.get(0),
    )
}

fn elect_default(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    let next: Option<i64> = tx
        .query_row(
            &format!("SELECT id FROM printers {} LIMIT 1", schema::PROFILE_ORDER),
            [],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(next) = next {
        tx.execute("UPDATE printers SET default_printer = 1 WHERE id = ?1", params![next])?;
        tracing::info!(id = next, "elected new default printer");
    }
    Ok(())
}
