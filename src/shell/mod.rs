// SPDX-License-Identifier: GPL-3.0-only

//! The core window-management abstraction: client lifecycle (map, unmap,
//! focus), per-monitor layout arrangement, and the directional-focus/zoom
//! operations layered on top of the client and output managers.

pub mod client;
pub mod layout;
pub mod layouts;
pub mod monitor;

pub use client::{Client, ClientId, ClientManager, Direction, should_float_toplevel};
pub use layout::{Layout, LayoutRegistry};
pub use monitor::{Monitor, MonitorId, OutputManager};
