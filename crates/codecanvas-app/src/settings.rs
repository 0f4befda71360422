use codecanvas_core::Vec2;
use codecanvas_graph::{LayoutConfig, ViewportConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub layout: LayoutConfig,
    pub viewport: ViewportConfig,
    /// Where the editor sits before the user drags it.
    pub editor_position: Vec2,
    /// Refit the camera after every derivation.
    pub auto_zoom: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            viewport: ViewportConfig::default(),
            editor_position: Vec2::new(20.0, 20.0),
            auto_zoom: false,
        }
    }
}

impl EngineSettings {
    /// Read settings from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("Settings file {:?} not found, using defaults", path);
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    tracing::info!("Settings loaded from {:?}", path);
                    return settings;
                }
                Err(e) => tracing::error!("Failed to parse settings: {}", e),
            },
            Err(e) => tracing::error!("Failed to read settings file: {}", e),
        }
        Self::default()
    }

    pub fn save(&self, path: &Path) -> Result<(), crate::EngineError> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
