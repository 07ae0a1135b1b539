//! The printers dashboard: a grid with one tile per printer that opted in,
//! showing either live status or the printer's camera.
//!
//! While active, every status tile is backed by an observer task polling
//! its printer. Deactivating (or dropping) the dashboard stops all of them.
//! Selecting any tile makes its printer the default one and dismisses the
//! dashboard.

mod observer;
mod tile;

pub use observer::{OctoPrintSource, StatusSource};
pub use tile::{format_duration, CameraTile, StatusTile, StreamKind, TileStatus};

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::store::{PrinterProfile, PrinterStore, ProfileId};
use observer::Observer;

/// Capacity of the row refresh channel handed out by [Dashboard::activate].
const REFRESH_BUFFER: usize = 64;

/// What the grid is showing.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum RenderMode {
    /// One status tile per printer.
    #[default]
    StatusGrid,
    /// One camera tile per printer with a visible camera.
    CameraGrid,
}

/// Outcome of selecting a tile.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The printer is now the default one and the dashboard has been
    /// deactivated; the caller should close it.
    Dismiss(ProfileId),
    /// Nothing happened: the tile doesn't exist, its printer is gone, or the
    /// store refused the change.
    Ignored,
}

/// Dashboard controller. See the module documentation.
pub struct Dashboard {
    store: PrinterStore,
    source: Arc<dyn StatusSource>,
    poll_interval: Duration,

    active: bool,
    mode: RenderMode,
    observers: Vec<Observer>,
    statuses: Arc<DashMap<usize, TileStatus>>,
    cameras: Vec<CameraTile>,
}

impl Dashboard {
    /// Create an inactive dashboard over `store`. Observers ask `source` for
    /// a status every `poll_interval`.
    pub fn new(store: PrinterStore, source: Arc<dyn StatusSource>, poll_interval: Duration) -> Self {
        Self {
            store,
            source,
            poll_interval,
            active: false,
            mode: RenderMode::StatusGrid,
            observers: vec![],
            statuses: Arc::new(DashMap::new()),
            cameras: vec![],
        }
    }

    /// Open one observer per dashboard printer and build the camera tiles.
    /// The grid starts in [RenderMode::StatusGrid].
    ///
    /// The returned channel yields the row of every status tile that got a new
    /// status. It closes once the dashboard is deactivated. Must be called
    /// from within a tokio runtime.
    pub fn activate(&mut self) -> mpsc::Receiver<usize> {
        self.deactivate();
        self.active = true;
        self.mode = RenderMode::StatusGrid;

        let (refresh, refreshes) = mpsc::channel(REFRESH_BUFFER);
        let profiles = self.store.dashboard_profiles();

        self.observers = profiles
            .iter()
            .enumerate()
            .map(|(row, profile)| {
                Observer::spawn(
                    row,
                    profile.clone(),
                    self.source.clone(),
                    self.statuses.clone(),
                    refresh.clone(),
                    self.poll_interval,
                )
            })
            .collect();
        self.cameras = profiles
            .iter()
            .filter(|profile| !profile.hide_camera)
            .map(CameraTile::for_profile)
            .collect();

        tracing::debug!(
            observers = self.observers.len(),
            cameras = self.cameras.len(),
            "dashboard activated"
        );
        refreshes
    }

    /// Stop every observer and drop the camera tiles.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        for observer in self.observers.drain(..) {
            observer.stop();
        }
        // Aborted observers may still be mid-report; give the next activation
        // a map of its own.
        self.statuses = Arc::new(DashMap::new());
        self.cameras.clear();
        tracing::debug!("dashboard deactivated");
    }

    /// Whether the dashboard has been activated and not deactivated since.
    /// An active dashboard may have no tiles at all.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current render mode.
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Switch between the status grid and the camera grid.
    pub fn toggle_mode(&mut self) -> RenderMode {
        self.mode = match self.mode {
            RenderMode::StatusGrid => RenderMode::CameraGrid,
            RenderMode::CameraGrid => RenderMode::StatusGrid,
        };
        self.mode
    }

    /// Number of tiles in the current mode.
    pub fn tile_count(&self) -> usize {
        match self.mode {
            RenderMode::StatusGrid => self.observers.len(),
            RenderMode::CameraGrid => self.cameras.len(),
        }
    }

    /// Status tiles, in row order.
    pub fn status_tiles(&self) -> Vec<StatusTile> {
        (0..self.observers.len()).filter_map(|row| self.status_tile(row)).collect()
    }

    /// Status tile at `row`.
    pub fn status_tile(&self, row: usize) -> Option<StatusTile> {
        let observer = self.observers.get(row)?;
        Some(StatusTile {
            profile: observer.profile,
            name: observer.name.clone(),
            status: self
                .statuses
                .get(&row)
                .map(|status| status.value().clone())
                .unwrap_or_else(TileStatus::connecting),
        })
    }

    /// Camera tiles, in row order.
    pub fn camera_tiles(&self) -> &[CameraTile] {
        &self.cameras
    }

    /// Select the status tile at `row`.
    pub fn select_status_tile(&mut self, row: usize) -> Selection {
        let profile = self
            .observers
            .get(row)
            .and_then(|observer| self.store.get_by_id(observer.profile));
        self.select(profile)
    }

    /// Select the camera tile at `row`.
    pub fn select_camera_tile(&mut self, row: usize) -> Selection {
        let profile = self
            .cameras
            .get(row)
            .and_then(|tile| self.store.get_by_reference(&tile.reference));
        self.select(profile)
    }

    fn select(&mut self, profile: Option<PrinterProfile>) -> Selection {
        let Some(profile) = profile else {
            tracing::debug!("selected tile has no printer");
            return Selection::Ignored;
        };

        // The store logs the failure.
        if self.store.set_default(profile.id()).is_err() {
            return Selection::Ignored;
        }

        tracing::info!(printer = %profile.name, "selected default printer from dashboard");
        self.deactivate();
        Selection::Dismiss(profile.id())
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests;
