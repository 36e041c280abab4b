// SPDX-License-Identifier: GPL-3.0-only

pub const BORDER_FRAG: &str = include_str!("border.frag");
pub const DECORATION_FRAG: &str = include_str!("decoration.frag");
pub const CLIPPED_SURFACE_FRAG: &str = include_str!("clipped_surface.frag");
