// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests driving a real Wayland client against a headless
//! compositor instance (see [`fixture::Fixture`]).

mod client;
mod fixture;
mod test_ipc;
mod test_multimon;
mod test_window_opening;

pub use fixture::Fixture;
