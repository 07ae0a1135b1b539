use anyhow::Result;
use printer_fleet::{Config, PrinterProfile, PrinterStore};

use crate::cmd_printers::profile_named;

fn client(profile: &PrinterProfile, cfg: &Config) -> Result<octoprint::Client> {
    octoprint::Client::new(
        &profile.hostname,
        &profile.api_key,
        profile.username.as_deref(),
        profile.password.as_deref(),
        cfg.dashboard.request_timeout(),
    )
}

pub async fn list(store: &PrinterStore, cfg: &Config, name: &str) -> Result<()> {
    let profile = profile_named(store, name)?;
    let relays = client(&profile, cfg)?.relays().await?;

    if relays.is_empty() {
        println!("{} has no relays", profile.name);
        return Ok(());
    }
    for relay in relays {
        println!(
            "{:<8} {:<24} {}",
            relay.id(),
            relay.name(),
            if relay.active() { "on" } else { "off" }
        );
    }
    Ok(())
}

pub async fn switch(store: &PrinterStore, cfg: &Config, name: &str, relay: &str, on: bool) -> Result<()> {
    let profile = profile_named(store, name)?;
    client(&profile, cfg)?.switch_relay(relay, on).await?;

    println!("{} relay {} turned {}", profile.name, relay, if on { "on" } else { "off" });
    Ok(())
}
