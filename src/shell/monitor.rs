// SPDX-License-Identifier: GPL-3.0-only

//! The output manager: exclusive owner of every Monitor, maintainer of the
//! spatial output layout, and the single point that reconciles the data
//! model to on-screen geometry via arrange.

use slotmap::{SlotMap, new_key_type};
use smithay::{
    output::Output,
    utils::{Logical, Point, Rectangle},
};

use crate::config::ConfigStore;
use crate::error::{Result, SwlError};
use crate::shell::client::{Client, ClientId, ClientManager, Direction};
use crate::shell::layout::{Gaps, Layout, LayoutClient, LayoutRequest};

new_key_type! {
    pub struct MonitorId;
}

pub struct Monitor {
    pub id: MonitorId,
    pub output: Output,
    pub usable_area: Rectangle<i32, Logical>,
    pub layout_name: String,
    pub master_factor: f32,
    pub scroller_ratio: f32,
    pub nmaster: i32,
    pub gaps: Gaps,
    pub tags: u32,
    /// DPMS-style power state; `output-power` is the only thing that flips
    /// this post-creation.
    pub enabled: bool,
    /// Tiled arrangement order, distinct from the client manager's global
    /// focus stack; this is what `zoom`/`move_in_stack` splice.
    pub order: Vec<ClientId>,
}

impl Monitor {
    pub fn new(id: MonitorId, output: Output, cfg: &ConfigStore) -> Self {
        let geometry = output_geometry(&output);
        let name = output.name();
        Monitor {
            id,
            output,
            usable_area: geometry,
            layout_name: cfg.get_string("appearance.layout", "scroller"),
            master_factor: cfg.get_float("appearance.mfact", 0.5),
            scroller_ratio: cfg.get_float("appearance.scroller_ratio", 0.5),
            nmaster: cfg.get_int("appearance.nmaster", 1) as i32,
            gaps: Gaps {
                inner_h: cfg.get_int("appearance.gap_inner_h", 0) as i32,
                inner_v: cfg.get_int("appearance.gap_inner_v", 0) as i32,
                outer_h: cfg.get_int("appearance.gap_outer_h", 0) as i32,
                outer_v: cfg.get_int("appearance.gap_outer_v", 0) as i32,
            },
            tags: 1,
            enabled: cfg.get_bool(&format!("monitors.{name}.enabled"), true),
            order: Vec::new(),
        }
    }

    /// Sets the DPMS-style power state. Does not itself touch the
    /// rendering backend; callers that own the output toggle the real
    /// hardware state when this flips.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn name(&self) -> String {
        self.output.name()
    }

    pub fn set_usable_area(&mut self, area: Rectangle<i32, Logical>) {
        self.usable_area = area;
    }

    pub fn adjust_mfact(&mut self, delta: f32) {
        self.master_factor = (self.master_factor + delta).clamp(0.05, 0.95);
    }

    pub fn adjust_nmaster(&mut self, delta: i32) {
        self.nmaster = (self.nmaster + delta).max(0);
    }

    /// Swaps `id` with the current head of the tiled order (the "master"
    /// slot).
    pub fn zoom(&mut self, id: ClientId) {
        let Some(pos) = self.order.iter().position(|&cid| cid == id) else {
            return;
        };
        if pos == 0 {
            return;
        }
        self.order.swap(0, pos);
    }

    pub fn move_in_stack(&mut self, id: ClientId, delta: i32) {
        let Some(pos) = self.order.iter().position(|&cid| cid == id) else {
            return;
        };
        let len = self.order.len() as i32;
        if len == 0 {
            return;
        }
        let next = (pos as i32 + delta).rem_euclid(len) as usize;
        self.order.swap(pos, next);
    }

    fn sync_order(&mut self, live_tiled: &[ClientId]) {
        self.order.retain(|id| live_tiled.contains(id));
        for id in live_tiled {
            if !self.order.contains(id) {
                self.order.push(*id);
            }
        }
    }
}

fn output_geometry(output: &Output) -> Rectangle<i32, Logical> {
    let size = output
        .current_mode()
        .map(|m| m.size.to_logical(1))
        .unwrap_or_default();
    Rectangle::new(Point::from((0, 0)), size)
}

pub struct OutputManager {
    monitors: SlotMap<MonitorId, Monitor>,
    focused: Option<MonitorId>,
}

impl Default for OutputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputManager {
    pub fn new() -> Self {
        OutputManager {
            monitors: SlotMap::with_key(),
            focused: None,
        }
    }

    /// Allocates a Monitor for a newly enabled output, seeding layout
    /// parameters from config. Marks it focused if it's the first Monitor.
    pub fn add(&mut self, output: Output, cfg: &ConfigStore) -> MonitorId {
        let id = self.monitors.insert_with_key(|id| Monitor::new(id, output, cfg));
        if self.focused.is_none() {
            self.focused = Some(id);
        }
        id
    }

    /// Removes a Monitor. If it held focus, the next Monitor (by insertion
    /// order) takes over, or focus clears if none remain.
    pub fn remove(&mut self, id: MonitorId) {
        self.monitors.remove(id);
        if self.focused == Some(id) {
            self.focused = self.monitors.keys().next();
        }
    }

    pub fn get(&self, id: MonitorId) -> Option<&Monitor> {
        self.monitors.get(id)
    }

    pub fn get_mut(&mut self, id: MonitorId) -> Option<&mut Monitor> {
        self.monitors.get_mut(id)
    }

    pub fn count(&self) -> usize {
        self.monitors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Monitor> {
        self.monitors.values()
    }

    pub fn focused(&self) -> Option<MonitorId> {
        self.focused
    }

    pub fn set_focused(&mut self, id: MonitorId) -> Result<()> {
        if !self.monitors.contains_key(id) {
            return Err(SwlError::NotFound);
        }
        self.focused = Some(id);
        Ok(())
    }

    pub fn by_name(&self, name: &str) -> Option<MonitorId> {
        self.monitors.values().find(|m| m.name() == name).map(|m| m.id)
    }

    pub fn at(&self, pos: Point<f64, Logical>) -> Option<MonitorId> {
        self.monitors
            .values()
            .find(|m| m.usable_area.to_f64().contains(pos))
            .map(|m| m.id)
    }

    /// Steps to the next/previous Monitor in insertion order, wrapping.
    pub fn neighbor(&self, from: MonitorId, delta: i32) -> Option<MonitorId> {
        let ids: Vec<MonitorId> = self.monitors.keys().collect();
        let pos = ids.iter().position(|&id| id == from)?;
        let len = ids.len() as i32;
        if len == 0 {
            return None;
        }
        let next = (pos as i32 + delta).rem_euclid(len) as usize;
        Some(ids[next])
    }

    /// Arranges a single Monitor: collects its visible, mapped,
    /// non-floating, non-fullscreen clients (in the Monitor's tiled
    /// order), invokes the active layout, and writes the resulting
    /// rectangles back through the client manager.
    pub fn arrange(&mut self, id: MonitorId, clients: &mut ClientManager, registry: &crate::shell::layout::LayoutRegistry) {
        let Some(monitor) = self.monitors.get_mut(id) else {
            return;
        };

        let tiled: Vec<ClientId> = clients
            .iter()
            .filter(|c| {
                c.monitor == Some(id) && c.mapped && !c.floating && !c.fullscreen && c.visible_on(monitor.tags)
            })
            .map(|c| c.id)
            .collect();

        monitor.sync_order(&tiled);
        let ordered = monitor.order.clone();
        if ordered.is_empty() {
            return;
        }

        let Some(layout) = registry.get(&monitor.layout_name) else {
            return;
        };

        let mut layout_clients: Vec<LayoutClient> = ordered
            .iter()
            .map(|&id| {
                let ratio = clients.get(id).map(|c| c.column_ratio).unwrap_or(0.0);
                LayoutClient { rect: Rectangle::default(), column_ratio: ratio }
            })
            .collect();

        let focused_index = clients.focused().and_then(|f| ordered.iter().position(|&id| id == f));

        let master_factor = if monitor.layout_name == "scroller" {
            monitor.scroller_ratio
        } else {
            monitor.master_factor
        };

        let mut req = LayoutRequest {
            area: monitor.usable_area,
            gaps: monitor.gaps,
            master_factor,
            nmaster: monitor.nmaster,
            focused_index,
            clients: &mut layout_clients,
        };
        layout.arrange(&mut req);

        for (&id, lc) in ordered.iter().zip(layout_clients.iter()) {
            let _ = clients.resize(id, lc.rect);
        }

        if let Some(focused) = clients.focused() {
            let _ = clients.focus(focused);
        }
    }

    pub fn arrange_all(&mut self, clients: &mut ClientManager, registry: &crate::shell::layout::LayoutRegistry) {
        let ids: Vec<MonitorId> = self.monitors.keys().collect();
        for id in ids {
            self.arrange(id, clients, registry);
        }
    }

    pub fn directional_focus_monitor(&self, from: MonitorId, direction: Direction) -> Option<MonitorId> {
        let subject = self.monitors.get(from)?;
        let subject_center = center(subject.usable_area);

        let mut best: Option<(i64, MonitorId)> = None;
        for monitor in self.monitors.values() {
            if monitor.id == from {
                continue;
            }
            let c = center(monitor.usable_area);
            let dx = (c.x - subject_center.x) as i64;
            let dy = (c.y - subject_center.y) as i64;
            let (primary, secondary, sign_ok) = match direction {
                Direction::Left => (-dx, dy, dx < 0),
                Direction::Right => (dx, dy, dx > 0),
                Direction::Up => (-dy, dx, dy < 0),
                Direction::Down => (dy, dx, dy > 0),
            };
            if !sign_ok {
                continue;
            }
            let score = primary.abs() + secondary.abs() / 2;
            if best.is_none_or(|(best_score, _)| score < best_score) {
                best = Some((score, monitor.id));
            }
        }
        best.map(|(_, id)| id)
    }
}

fn center(rect: Rectangle<i32, Logical>) -> Point<i32, Logical> {
    (rect.loc.x + rect.size.w / 2, rect.loc.y + rect.size.h / 2).into()
}
