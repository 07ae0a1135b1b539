use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::{sync::mpsc, task::JoinHandle};

use super::tile::TileStatus;
use crate::store::{PrinterProfile, ProfileId};

/// Something that can tell what a printer is doing right now.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the current status of the printer described by `profile`.
    async fn status(&self, profile: &PrinterProfile) -> Result<TileStatus>;
}

/// [StatusSource] talking to the OctoPrint server of each profile.
#[derive(Debug, Clone, Copy)]
pub struct OctoPrintSource {
    timeout: Duration,
}

impl OctoPrintSource {
    /// Requests to a server give up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl StatusSource for OctoPrintSource {
    async fn status(&self, profile: &PrinterProfile) -> Result<TileStatus> {
        let client = octoprint::Client::new(
            &profile.hostname,
            &profile.api_key,
            profile.username.as_deref(),
            profile.password.as_deref(),
            self.timeout,
        )?;

        let job = client.job().await?;
        let layer = match client.layer_progress().await {
            Ok(layer) => layer,
            Err(err) => {
                tracing::debug!(printer = %profile.name, error = %err, "failed to read layer progress");
                None
            }
        };

        Ok(TileStatus::from_job(&job, layer.as_ref(), chrono::Local::now()))
    }
}

/// A live observer of one printer, bound to a row of the status grid.
pub(crate) struct Observer {
    pub(crate) profile: ProfileId,
    pub(crate) name: String,
    handle: JoinHandle<()>,
}

impl Observer {
    /// Start polling `profile` every `interval`. Each report lands in
    /// `statuses[row]`, followed by `row` on `refresh`.
    pub(crate) fn spawn(
        row: usize,
        profile: PrinterProfile,
        source: Arc<dyn StatusSource>,
        statuses: Arc<DashMap<usize, TileStatus>>,
        refresh: mpsc::Sender<usize>,
        interval: Duration,
    ) -> Self {
        let id = profile.id();
        let name = profile.name.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let status = match source.status(&profile).await {
                    Ok(status) => status,
                    Err(err) => {
                        tracing::warn!(printer = %profile.name, error = %err, "failed to poll printer");
                        TileStatus::offline()
                    }
                };
                statuses.insert(row, status);

                // The status is already in the map. A full or dropped channel
                // only means nobody is drawing right now; never wait on it.
                if let Err(mpsc::error::TrySendError::Full(_)) = refresh.try_send(row) {
                    tracing::trace!(row, "refresh channel full");
                }
            }
        });

        Self {
            profile: id,
            name,
            handle,
        }
    }

    pub(crate) fn stop(&self) {
        self.handle.abort();
    }
}
