// SPDX-License-Identifier: GPL-3.0-only

//! Configuration store, default-keybinding tables, and the modifier/keysym
//! parsing that turns a TOML document into live `Key` bindings.

pub mod keys;
pub mod store;

pub use keys::{ButtonBinding, Keybinding, load_bindings};
pub use store::{ConfigStore, ConfigValue, WatchId};
