use std::sync::Arc;

use anyhow::Result;
use printer_fleet::{
    dashboard::{CameraTile, StatusTile},
    Config, Dashboard, OctoPrintSource, PrinterStore, RenderMode,
};

fn status_line(row: usize, tile: &StatusTile) -> String {
    let status = &tile.status;
    let mut line = format!("[{}] {}: {}", row, tile.name, status.printer_status);

    for (label, value) in [
        ("", &status.progress),
        ("printing ", &status.print_time),
        ("left ", &status.print_time_left),
        ("done at ", &status.completion),
        ("layer ", &status.layer),
    ] {
        if let Some(value) = value {
            line.push_str(&format!(", {}{}", label, value));
        }
    }
    line
}

fn camera_line(row: usize, tile: &CameraTile) -> String {
    format!(
        "[{}] {}: {} ({:?}, {}, {})",
        row, tile.label, tile.url, tile.kind, tile.aspect_ratio, tile.orientation
    )
}

pub async fn main(store: PrinterStore, cfg: &Config, cameras: bool) -> Result<()> {
    let source = Arc::new(OctoPrintSource::new(cfg.dashboard.request_timeout()));
    let mut dashboard = Dashboard::new(store, source, cfg.dashboard.poll_interval());

    let mut refreshes = dashboard.activate();
    if cameras && dashboard.toggle_mode() == RenderMode::CameraGrid {
        for (row, tile) in dashboard.camera_tiles().iter().enumerate() {
            println!("{}", camera_line(row, tile));
        }
    }
    if dashboard.tile_count() == 0 {
        println!("no printers on the dashboard");
        dashboard.deactivate();
        return Ok(());
    }
    tracing::info!(tiles = dashboard.tile_count(), "watching printers, Ctrl-C to stop");

    let signals = crate::handle_signals();
    tokio::pin!(signals);

    loop {
        tokio::select! {
            row = refreshes.recv() => {
                let Some(row) = row else {
                    break;
                };
                if dashboard.mode() == RenderMode::StatusGrid {
                    if let Some(tile) = dashboard.status_tile(row) {
                        println!("{}", status_line(row, &tile));
                    }
                }
            }
            result = &mut signals => {
                result?;
                break;
            }
        }
    }

    dashboard.deactivate();
    Ok(())
}
