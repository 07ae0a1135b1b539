//! Relays exposed by the OctoRelay plugin.
//!
//! Each relay is an on/off switch wired to a GPIO pin of the machine running
//! OctoPrint (lights, the printer's power supply, a fan, ...).

use anyhow::Result;
use serde_json::{json, Map, Value};

use super::Client;

/// A relay the server can switch on or off. Built only through
/// [Relay::parse], and read-only afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relay {
    id: String,
    name: String,
    active: bool,
}

impl Relay {
    /// Build a [Relay] from its plugin description. `id` and `name` must be
    /// strings and `active` a bool; anything else yields `None`.
    pub fn parse(fields: &Map<String, Value>) -> Option<Self> {
        let id = fields.get("id")?.as_str()?;
        let name = fields.get("name")?.as_str()?;
        let active = fields.get("active")?.as_bool()?;

        Some(Self {
            id: id.to_owned(),
            name: name.to_owned(),
            active,
        })
    }

    /// Same as [Relay::parse], for any json value. Non-objects yield `None`.
    pub fn parse_value(value: &Value) -> Option<Self> {
        Self::parse(value.as_object()?)
    }

    /// Identifier used by the plugin, like `r1`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Label configured for the relay.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the relay is currently switched on.
    pub fn active(&self) -> bool {
        self.active
    }
}

impl Client {
    /// List every relay configured in the OctoRelay plugin. Entries that don't
    /// describe a valid relay are skipped.
    pub async fn relays(&self) -> Result<Vec<Relay>> {
        let resp: Vec<Value> = self
            .post("/api/plugin/octorelay")
            .json(&json!({ "command": "listAllStatus" }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let relays: Vec<Relay> = resp.iter().filter_map(Relay::parse_value).collect();
        if relays.len() != resp.len() {
            tracing::warn!(
                base = %self.url_base,
                skipped = resp.len() - relays.len(),
                "ignoring malformed relay descriptions"
            );
        }

        Ok(relays)
    }

    /// Switch relay `id` on or off.
    pub async fn switch_relay(&self, id: &str, on: bool) -> Result<()> {
        tracing::debug!(base = %self.url_base, relay = id, on, "switching relay");

        self.post("/api/plugin/octorelay")
            .json(&json!({ "command": "update", "subject": id, "target": on }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
