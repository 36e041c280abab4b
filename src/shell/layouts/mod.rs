// SPDX-License-Identifier: GPL-3.0-only

//! The four built-in layouts registered by [`super::layout::LayoutRegistry`].

pub mod floating;
pub mod monocle;
pub mod scroller;
pub mod tile;
