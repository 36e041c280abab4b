// SPDX-License-Identifier: GPL-3.0-only

//! Unix-socket request/response and event-streaming IPC. A one-shot
//! connection gets a single reply; sending `subscribe` promotes it to a
//! long-lived NDJSON event feed fed by the event bus.

pub mod commands;
pub mod socket;

pub use commands::{CommandContext, CommandTable, IpcResponse};
pub use socket::{SubscriberTable, bind as bind_socket, socket_path};
