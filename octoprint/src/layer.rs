use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::Client;

/// Layer information reported by the DisplayLayerProgress plugin. The plugin
/// reports `-` for values it does not know yet.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct LayerProgress {
    /// Layer currently being printed.
    pub current: String,

    /// Total number of layers in the file.
    pub total: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
struct LayerValuesWrapper {
    layer: LayerProgress,
}

impl LayerProgress {
    /// Render as `current / total`, or `None` while the plugin has no data.
    pub fn display(&self) -> Option<String> {
        if self.current == "-" || self.total == "-" {
            return None;
        }
        Some(format!("{} / {}", self.current, self.total))
    }
}

impl Client {
    /// Query the DisplayLayerProgress plugin. Servers without the plugin
    /// installed return `Ok(None)`.
    pub async fn layer_progress(&self) -> Result<Option<LayerProgress>> {
        let resp = self.get("/plugin/DisplayLayerProgress/values").send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::trace!(base = %self.url_base, "DisplayLayerProgress plugin not installed");
            return Ok(None);
        }

        let values: LayerValuesWrapper = resp.error_for_status()?.json().await?;
        Ok(Some(values.layer))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_layer_display() {
        let values: LayerValuesWrapper = serde_json::from_str(
            r#"{ "layer": { "current": "12", "total": "240", "averageLayerDuration": "0h:01m:02s" },
                 "height": { "current": "2.60", "total": "48.00" } }"#,
        )
        .unwrap();

        assert_eq!(values.layer.display().as_deref(), Some("12 / 240"));
    }

    #[test]
    fn test_layer_display_unknown() {
        let layer = LayerProgress {
            current: "-".to_owned(),
            total: "240".to_owned(),
        };

        assert_eq!(layer.display(), None);
    }
}
