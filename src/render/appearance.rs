// SPDX-License-Identifier: GPL-3.0-only

//! Render-affecting config, resolved from the config store rather than
//! hardcoded constants. Cheap enough to rebuild per frame, which keeps a
//! config reload visible immediately without a separate invalidation path.

use crate::config::ConfigStore;

#[derive(Debug, Clone, Copy)]
pub struct Appearance {
    pub border_width: i32,
    pub single_border: bool,
    pub scale: f64,

    pub bg_color: [f32; 4],
    pub root_color: [f32; 4],
    pub border_color: [f32; 4],
    pub focus_color: [f32; 4],
    pub urgent_color: [f32; 4],

    pub floating_radius: f32,
    pub tiled_radius: f32,

    pub shadow_softness: i32,
    pub shadow_spread: i32,
    pub shadow_offset: (i32, i32),
    pub shadow_color: [f32; 4],
}

impl Appearance {
    pub fn from_config(cfg: &ConfigStore) -> Self {
        let color = |key: &str, default: [f32; 4]| cfg.get_color(key).unwrap_or(default);
        Appearance {
            border_width: cfg.get_int("appearance.border_width", 2) as i32,
            single_border: cfg.get_bool("appearance.single_border", false),
            scale: cfg.get_float("appearance.scale", 1.0) as f64,

            bg_color: color("appearance.colors.background", [0.267, 0.267, 0.267, 1.0]),
            root_color: color("appearance.colors.root", [0.0, 0.0, 0.0, 1.0]),
            border_color: color("appearance.colors.border", [0.267, 0.267, 0.267, 1.0]),
            focus_color: color("appearance.colors.focus", [0.271, 0.522, 0.533, 1.0]),
            urgent_color: color("appearance.colors.urgent", [1.0, 0.0, 0.0, 1.0]),

            floating_radius: cfg.get_float("appearance.floating_radius", 12.0),
            tiled_radius: cfg.get_float("appearance.tiled_radius", 0.0),

            shadow_softness: cfg.get_int("appearance.shadow.softness", 25) as i32,
            shadow_spread: cfg.get_int("appearance.shadow.spread", 5) as i32,
            shadow_offset: (
                cfg.get_int("appearance.shadow.offset_x", 0) as i32,
                cfg.get_int("appearance.shadow.offset_y", 5) as i32,
            ),
            shadow_color: color("appearance.shadow.color", [0.0, 0.0, 0.0, 0.45]),
        }
    }
}

impl Default for Appearance {
    fn default() -> Self {
        Appearance::from_config(&ConfigStore::new())
    }
}
