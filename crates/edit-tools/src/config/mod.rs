//! Editor configuration
//!
//! Snap steps, transform space, undo depth and debug toggles consumed by
//! the manipulation tools.

mod manager;

pub use manager::{
    ConfigError, ConfigManager, SharedConfig, create_shared_config, load_shared_config,
};

use serde::{Deserialize, Serialize};

/// Space the manipulation handle is aligned to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TransformSpace {
    #[default]
    World,
    Local,
}

impl TransformSpace {
    pub fn name(&self) -> &'static str {
        match self {
            TransformSpace::World => "World",
            TransformSpace::Local => "Local",
        }
    }
}

/// Settings read by the tools every frame
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorSettings {
    /// Quantize transforms to the steps below
    pub snaps_enabled: bool,
    /// Grid spacing for translation
    pub move_delta: f32,
    /// Angular step in degrees
    pub rotate_delta: f32,
    /// Scale step
    pub scale_delta: f32,
    pub transform_space: TransformSpace,
    /// Maximum number of undo history entries
    pub max_undo_depth: usize,
    /// Trace every state transition and tool switch
    pub show_state_transitions: bool,
    /// Move the 3D cursor to pick hits and log box-pick frustums
    pub show_picking_debug: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            snaps_enabled: false,
            move_delta: 1.0,
            rotate_delta: 15.0,
            scale_delta: 0.1,
            transform_space: TransformSpace::World,
            max_undo_depth: 100,
            show_state_transitions: false,
            show_picking_debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let settings: EditorSettings = ron::from_str("(snaps_enabled: true, move_delta: 0.5)").unwrap();
        assert!(settings.snaps_enabled);
        assert_eq!(settings.move_delta, 0.5);
        assert_eq!(settings.max_undo_depth, EditorSettings::default().max_undo_depth);
        assert_eq!(settings.transform_space, TransformSpace::World);
    }
}
