use std::{collections::HashSet, sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

use super::*;
use crate::store::NewPrinter;

const POLL: Duration = Duration::from_millis(10);
const WAIT: Duration = Duration::from_secs(5);

/// Reports `Printing <name>`, except for printers named in `failing`.
#[derive(Default)]
struct FakeSource {
    polls: DashMap<ProfileId, usize>,
    failing: Vec<String>,
}

#[async_trait]
impl StatusSource for FakeSource {
    async fn status(&self, profile: &PrinterProfile) -> Result<TileStatus> {
        *self.polls.entry(profile.id()).or_insert(0) += 1;
        if self.failing.contains(&profile.name) {
            anyhow::bail!("connection refused");
        }
        Ok(TileStatus {
            printer_status: format!("Printing {}", profile.name),
            ..Default::default()
        })
    }
}

/// Store with printers `(name, include_in_dashboard, hide_camera)`, in this
/// listing order.
fn store_with(printers: &[(&str, bool, bool)]) -> PrinterStore {
    let store = PrinterStore::open_in_memory().unwrap();
    for (position, (name, include, hide_camera)) in printers.iter().enumerate() {
        let id = store
            .add(NewPrinter {
                position: position as i32,
                ..NewPrinter::new(name, &format!("http://{}.local", name), "key")
            })
            .unwrap();
        let mut profile = store.get_by_id(id).unwrap();
        profile.include_in_dashboard = *include;
        profile.hide_camera = *hide_camera;
        store.update(&profile).unwrap();
    }
    store
}

fn dashboard(store: &PrinterStore, source: Arc<FakeSource>) -> Dashboard {
    Dashboard::new(store.clone(), source, POLL)
}

/// Wait until every row in `0..rows` has reported at least once.
async fn wait_for_rows(refreshes: &mut mpsc::Receiver<usize>, rows: usize) {
    let mut seen = HashSet::new();
    tokio::time::timeout(WAIT, async {
        while seen.len() < rows {
            let row = refreshes.recv().await.expect("observers stopped early");
            seen.insert(row);
        }
    })
    .await
    .expect("observers never reported");
}

/// Wait until every observer has been dropped.
async fn wait_for_close(refreshes: &mut mpsc::Receiver<usize>) {
    tokio::time::timeout(WAIT, async { while refreshes.recv().await.is_some() {} })
        .await
        .expect("observers outlived the dashboard");
}

#[tokio::test]
async fn test_activate_observes_included_printers() {
    let store = store_with(&[("A", true, false), ("B", false, false), ("C", true, true)]);
    let source = Arc::new(FakeSource::default());
    let mut dashboard = dashboard(&store, source.clone());

    let mut refreshes = dashboard.activate();
    assert!(dashboard.is_active());
    assert_eq!(dashboard.mode(), RenderMode::StatusGrid);
    assert_eq!(dashboard.tile_count(), 2);

    let names: Vec<_> = dashboard.status_tiles().into_iter().map(|tile| tile.name).collect();
    assert_eq!(names, vec!["A", "C"]);

    // C hides its camera, B isn't on the dashboard at all.
    let labels: Vec<_> = dashboard.camera_tiles().iter().map(|tile| tile.label.as_str()).collect();
    assert_eq!(labels, vec!["A"]);
    assert_eq!(dashboard.camera_tiles()[0].url, "http://A.local/webcam/?action=stream");
    assert_eq!(dashboard.camera_tiles()[0].kind, StreamKind::Mjpeg);

    wait_for_rows(&mut refreshes, 2).await;
    assert_eq!(
        dashboard.status_tile(0).unwrap().status.printer_status,
        "Printing A"
    );
    assert_eq!(
        dashboard.status_tile(1).unwrap().status.printer_status,
        "Printing C"
    );

    let b = store.get_by_name("B").unwrap().id();
    assert!(!source.polls.contains_key(&b));
}

#[tokio::test]
async fn test_tiles_start_connecting() {
    let store = store_with(&[("A", true, false)]);
    let mut dashboard = Dashboard::new(store, Arc::new(FakeSource::default()), Duration::from_secs(3600));

    // Nothing has run yet on this single threaded runtime.
    let _refreshes = dashboard.activate();

    assert_eq!(dashboard.status_tile(0).unwrap().status, TileStatus::connecting());
}

#[tokio::test]
async fn test_unreachable_printer_is_offline() {
    let store = store_with(&[("A", true, false), ("B", true, false)]);
    let source = Arc::new(FakeSource {
        failing: vec!["B".to_owned()],
        ..Default::default()
    });
    let mut dashboard = dashboard(&store, source);

    let mut refreshes = dashboard.activate();
    wait_for_rows(&mut refreshes, 2).await;

    assert_eq!(dashboard.status_tile(0).unwrap().status.printer_status, "Printing A");
    assert_eq!(dashboard.status_tile(1).unwrap().status, TileStatus::offline());
}

#[tokio::test]
async fn test_deactivate_stops_observers() {
    let store = store_with(&[("A", true, false), ("B", true, false)]);
    let mut dashboard = dashboard(&store, Arc::new(FakeSource::default()));

    let mut refreshes = dashboard.activate();
    wait_for_rows(&mut refreshes, 2).await;

    dashboard.deactivate();

    assert!(!dashboard.is_active());
    assert!(dashboard.status_tiles().is_empty());
    assert!(dashboard.camera_tiles().is_empty());
    wait_for_close(&mut refreshes).await;
}

#[tokio::test]
async fn test_drop_stops_observers() {
    let store = store_with(&[("A", true, false)]);
    let mut dashboard = dashboard(&store, Arc::new(FakeSource::default()));

    let mut refreshes = dashboard.activate();
    wait_for_rows(&mut refreshes, 1).await;

    drop(dashboard);

    wait_for_close(&mut refreshes).await;
}

#[tokio::test]
async fn test_reactivate_replaces_observers() {
    let store = store_with(&[("A", true, false)]);
    let mut dashboard = dashboard(&store, Arc::new(FakeSource::default()));

    let mut first = dashboard.activate();
    let mut second = dashboard.activate();

    wait_for_close(&mut first).await;
    wait_for_rows(&mut second, 1).await;
    assert_eq!(dashboard.tile_count(), 1);
}

#[tokio::test]
async fn test_mode_resets_on_activate() {
    let store = store_with(&[("A", true, false), ("B", true, true)]);
    let mut dashboard = dashboard(&store, Arc::new(FakeSource::default()));

    let _refreshes = dashboard.activate();
    assert_eq!(dashboard.toggle_mode(), RenderMode::CameraGrid);
    assert_eq!(dashboard.tile_count(), 1);
    assert_eq!(dashboard.toggle_mode(), RenderMode::StatusGrid);
    assert_eq!(dashboard.tile_count(), 2);
    dashboard.toggle_mode();
    dashboard.deactivate();

    let _refreshes = dashboard.activate();
    assert_eq!(dashboard.mode(), RenderMode::StatusGrid);
}

#[tokio::test]
async fn test_select_status_tile() {
    let store = store_with(&[("A", true, false), ("B", true, false)]);
    let mut dashboard = dashboard(&store, Arc::new(FakeSource::default()));
    let mut refreshes = dashboard.activate();
    let b = store.get_by_name("B").unwrap().id();

    assert_eq!(dashboard.select_status_tile(1), Selection::Dismiss(b));

    assert_eq!(store.get_default().unwrap().id(), b);
    assert!(!dashboard.is_active());
    wait_for_close(&mut refreshes).await;
}

#[tokio::test]
async fn test_select_camera_tile() {
    let store = store_with(&[("A", true, true), ("B", true, false), ("C", true, false)]);
    let mut dashboard = dashboard(&store, Arc::new(FakeSource::default()));
    let _refreshes = dashboard.activate();
    dashboard.toggle_mode();
    let c = store.get_by_name("C").unwrap().id();

    // A hides its camera, so C is the second camera tile.
    assert_eq!(dashboard.select_camera_tile(1), Selection::Dismiss(c));

    assert_eq!(store.get_default().unwrap().id(), c);
    assert!(!dashboard.is_active());
}

#[tokio::test]
async fn test_select_missing_tile_is_ignored() {
    let store = store_with(&[("A", true, false), ("B", true, false)]);
    let mut dashboard = dashboard(&store, Arc::new(FakeSource::default()));
    let _refreshes = dashboard.activate();
    let a = store.get_default().unwrap().id();

    assert_eq!(dashboard.select_status_tile(2), Selection::Ignored);
    assert_eq!(dashboard.select_camera_tile(7), Selection::Ignored);

    assert_eq!(store.get_default().unwrap().id(), a);
    assert!(dashboard.is_active());
}

#[tokio::test]
async fn test_select_deleted_printer_is_ignored() {
    let store = store_with(&[("A", true, false), ("B", true, false)]);
    let mut dashboard = dashboard(&store, Arc::new(FakeSource::default()));
    let _refreshes = dashboard.activate();
    let b = store.get_by_name("B").unwrap().id();

    store.delete(b).unwrap();

    assert_eq!(dashboard.select_status_tile(1), Selection::Ignored);
    assert_eq!(dashboard.select_camera_tile(1), Selection::Ignored);
    assert_eq!(store.get_default().unwrap().name, "A");
}

#[tokio::test]
async fn test_undrained_refreshes_keep_polling() {
    let store = store_with(&[("A", true, false)]);
    let source = Arc::new(FakeSource::default());
    let mut dashboard = Dashboard::new(store.clone(), source.clone(), Duration::from_millis(1));
    let a = store.get_by_name("A").unwrap().id();

    // Held, never read.
    let _refreshes = dashboard.activate();

    tokio::time::timeout(WAIT, async {
        while source.polls.get(&a).map_or(0, |polls| *polls) <= 2 * REFRESH_BUFFER {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("observer stopped polling once the refresh channel filled up");
    assert_eq!(dashboard.status_tile(0).unwrap().status.printer_status, "Printing A");
}

#[tokio::test]
async fn test_activate_without_dashboard_printers() {
    let store = store_with(&[("A", false, false)]);
    let mut dashboard = dashboard(&store, Arc::new(FakeSource::default()));
    assert!(!dashboard.is_active());

    let mut refreshes = dashboard.activate();

    assert!(dashboard.is_active());
    assert_eq!(dashboard.tile_count(), 0);
    assert!(dashboard.status_tiles().is_empty());
    assert!(dashboard.camera_tiles().is_empty());
    // No observer holds a sender.
    assert_eq!(refreshes.recv().await, None);

    dashboard.deactivate();
    assert!(!dashboard.is_active());
}
