// SPDX-License-Identifier: GPL-3.0-only

//! The client manager: exclusive owner of every mapped/unmapped surface,
//! the focus stack, and the rule/geometry operations that act on a single
//! Client. Monitors only ever hold a [`ClientId`] weak reference.

use slotmap::{SlotMap, new_key_type};
use smithay::{
    desktop::{Window, WindowSurfaceType},
    reexports::wayland_server::protocol::wl_surface::WlSurface,
    utils::{Logical, Point, Rectangle},
};

use crate::error::{Result, SwlError};
use crate::shell::monitor::MonitorId;

new_key_type! {
    pub struct ClientId;
}

/// Extra attributes carried only by X11 (XWayland) clients.
#[derive(Debug, Clone, Default)]
pub struct X11Info {
    pub class: Option<String>,
    pub instance: Option<String>,
    pub pid: Option<i32>,
    pub override_redirect: bool,
}

#[derive(Debug)]
pub struct Client {
    pub id: ClientId,
    pub window: Window,
    pub app_id: Option<String>,
    pub title: Option<String>,
    pub geometry: Rectangle<i32, Logical>,
    pub border_width: i32,
    pub mapped: bool,
    pub floating: bool,
    pub fullscreen: bool,
    pub urgent: bool,
    pub focused: bool,
    pub monitor: Option<MonitorId>,
    pub output_name: Option<String>,
    pub column_ratio: f32,
    pub tags: u32,
    pub x11: Option<X11Info>,
    /// Remembered floating position/size, restored when re-entering
    /// floating mode after a spell tiled (arrange overwrites `geometry`
    /// unconditionally while `floating` is false).
    pub float_geometry: Option<Rectangle<i32, Logical>>,
}

impl Client {
    /// A Client's tag mask is never observably zero: tag 0 is treated as
    /// the first tag.
    pub fn effective_tags(&self) -> u32 {
        if self.tags == 0 { 1 } else { self.tags }
    }

    pub fn visible_on(&self, monitor_tags: u32) -> bool {
        self.effective_tags() & monitor_tags != 0
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.window.set_activated(focused);
        if let Some(tl) = self.window.toplevel() {
            tl.send_pending_configure();
        }
    }
}

/// Whether a freshly created toplevel should default to floating: parented
/// surfaces (dialogs) and surfaces whose min/max size are fixed equal.
pub fn should_float_toplevel(tl: &smithay::wayland::shell::xdg::ToplevelSurface) -> bool {
    use smithay::wayland::compositor::with_states;
    use smithay::wayland::shell::xdg::SurfaceCachedState;

    if tl.parent().is_some() {
        return true;
    }
    let (min, max) = with_states(tl.wl_surface(), |states| {
        let mut data = states.cached_state.get::<SurfaceCachedState>();
        let cur = data.current();
        (cur.min_size, cur.max_size)
    });
    min.w > 0 && min.h > 0 && (min.w == max.w || min.h == max.h)
}

pub struct ClientManager {
    clients: SlotMap<ClientId, Client>,
    focus_stack: Vec<ClientId>,
}

impl Default for ClientManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientManager {
    pub fn new() -> Self {
        ClientManager {
            clients: SlotMap::with_key(),
            focus_stack: Vec::new(),
        }
    }

    /// Inserts a freshly-created, unmapped Client at the head of the focus
    /// stack. `floating` comes from [`should_float_toplevel`] or an
    /// equivalent X11 heuristic.
    pub fn create(&mut self, window: Window, floating: bool) -> ClientId {
        let id = self.clients.insert_with_key(|id| Client {
            id,
            window,
            app_id: None,
            title: None,
            geometry: Rectangle::default(),
            border_width: 0,
            mapped: false,
            floating,
            fullscreen: false,
            urgent: false,
            focused: false,
            monitor: None,
            output_name: None,
            column_ratio: 0.0,
            tags: 1,
            x11: None,
            float_geometry: None,
        });
        self.focus_stack.insert(0, id);
        id
    }

    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(id)
    }

    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut Client> {
        self.clients.get_mut(id)
    }

    pub fn count(&self) -> usize {
        self.clients.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Client> {
        self.clients.values_mut()
    }

    pub fn by_surface(&self, surface: &WlSurface) -> Option<ClientId> {
        self.clients
            .values()
            .find(|c| c.window.toplevel().is_some_and(|tl| tl.wl_surface() == surface))
            .map(|c| c.id)
    }

    pub fn focused(&self) -> Option<ClientId> {
        self.focus_stack.first().copied().filter(|&id| self.clients.contains_key(id))
    }

    pub fn at(&self, monitor: MonitorId, pos: Point<f64, Logical>) -> Option<ClientId> {
        self.clients
            .values()
            .filter(|c| c.mapped && c.monitor == Some(monitor))
            .find(|c| c.geometry.to_f64().contains(pos))
            .map(|c| c.id)
    }

    pub fn surface_under(
        &self,
        monitor: MonitorId,
        pos: Point<f64, Logical>,
    ) -> Option<(WlSurface, Point<f64, Logical>)> {
        let id = self.at(monitor, pos)?;
        let client = self.clients.get(id)?;
        let rel = pos - client.geometry.loc.to_f64();
        let (s, point) = client.window.surface_under(rel, WindowSurfaceType::ALL)?;
        Some((s, (point + client.geometry.loc).to_f64()))
    }

    /// Snapshots `app_id`/`title`, applies rules, marks mapped, and moves
    /// this Client to the head of the focus stack. Arrange is the caller's
    /// responsibility (the Output manager triggers it).
    pub fn map(&mut self, id: ClientId, app_id: Option<String>, title: Option<String>) -> Result<()> {
        let client = self.clients.get_mut(id).ok_or(SwlError::NotFound)?;
        client.app_id = app_id;
        client.title = title;
        client.mapped = true;
        self.focus(id)?;
        Ok(())
    }

    /// Clears `mapped`. If this was the focus holder, promotes the next
    /// mapped Client found walking the focus stack.
    pub fn unmap(&mut self, id: ClientId) -> Result<()> {
        let was_focused = {
            let client = self.clients.get_mut(id).ok_or(SwlError::NotFound)?;
            client.mapped = false;
            let was_focused = client.focused;
            client.focused = false;
            was_focused
        };
        if was_focused {
            let next = self
                .focus_stack
                .iter()
                .find(|&&cid| cid != id && self.clients.get(cid).is_some_and(|c| c.mapped))
                .copied();
            if let Some(next) = next {
                self.focus(next)?;
            }
        }
        Ok(())
    }

    /// Removes the Client entirely, invalidating its id (the slotmap
    /// generation guards against stale references, matching the magic-tag
    /// validation the original relied on).
    pub fn destroy(&mut self, id: ClientId) {
        self.focus_stack.retain(|&cid| cid != id);
        self.clients.remove(id);
    }

    /// Idempotent if `id` is already focused. Demotes the previous focus
    /// holder (if any and still live), then promotes `id` to head.
    pub fn focus(&mut self, id: ClientId) -> Result<()> {
        if !self.clients.contains_key(id) {
            return Err(SwlError::NotFound);
        }
        if self.clients.get(id).is_some_and(|c| c.focused) {
            return Ok(());
        }
        for client in self.clients.values_mut() {
            if client.focused {
                client.set_focused(false);
            }
        }
        if let Some(client) = self.clients.get_mut(id) {
            client.set_focused(true);
            client.urgent = false;
        }
        self.focus_stack.retain(|&cid| cid != id);
        self.focus_stack.insert(0, id);
        Ok(())
    }

    /// Clears keyboard focus process-wide without choosing a replacement.
    pub fn clear_focus(&mut self) {
        for client in self.clients.values_mut() {
            if client.focused {
                client.set_focused(false);
            }
        }
    }

    /// Saves the outgoing geometry as `float_geometry` when leaving
    /// floating, and restores it when re-entering, so a tile/float/tile
    /// round trip doesn't lose the window's floating placement.
    pub fn set_floating(&mut self, id: ClientId, floating: bool) -> Result<()> {
        let client = self.clients.get_mut(id).ok_or(SwlError::NotFound)?;
        if client.floating == floating {
            return Ok(());
        }
        if client.floating && !floating {
            client.float_geometry = Some(client.geometry);
        } else if !client.floating && floating {
            if let Some(remembered) = client.float_geometry {
                client.geometry = remembered;
            }
        }
        client.floating = floating;
        Ok(())
    }

    pub fn toggle_floating(&mut self, id: ClientId) -> Result<()> {
        let floating = self.clients.get(id).ok_or(SwlError::NotFound)?.floating;
        self.set_floating(id, !floating)
    }

    pub fn set_fullscreen(&mut self, id: ClientId, fullscreen: bool) -> Result<()> {
        let client = self.clients.get_mut(id).ok_or(SwlError::NotFound)?;
        client.fullscreen = fullscreen;
        Ok(())
    }

    pub fn toggle_fullscreen(&mut self, id: ClientId) -> Result<()> {
        let fullscreen = self.clients.get(id).ok_or(SwlError::NotFound)?.fullscreen;
        self.set_fullscreen(id, !fullscreen)
    }

    /// Updates the Monitor weak ref and remembered output name. Arranging
    /// both the old and new Monitor is the caller's responsibility.
    pub fn move_to_monitor(&mut self, id: ClientId, monitor: MonitorId, output_name: String) -> Result<()> {
        let client = self.clients.get_mut(id).ok_or(SwlError::NotFound)?;
        client.monitor = Some(monitor);
        client.output_name = Some(output_name);
        Ok(())
    }

    /// Detaches every Client whose weak ref points at `monitor`, without
    /// forgetting the output name they should re-attach to.
    pub fn detach_monitor(&mut self, monitor: MonitorId) {
        for client in self.clients.values_mut() {
            if client.monitor == Some(monitor) {
                client.monitor = None;
            }
        }
    }

    /// Every Client remembering `output_name` is re-attached to `monitor`.
    /// Returns the ids that were re-attached so the caller can rearrange.
    pub fn reattach_by_output_name(&mut self, output_name: &str, monitor: MonitorId) -> Vec<ClientId> {
        let mut reattached = Vec::new();
        for client in self.clients.values_mut() {
            if client.monitor.is_none() && client.output_name.as_deref() == Some(output_name) {
                client.monitor = Some(monitor);
                reattached.push(client.id);
            }
        }
        reattached
    }

    pub fn resize(&mut self, id: ClientId, outer: Rectangle<i32, Logical>) -> Result<()> {
        let client = self.clients.get_mut(id).ok_or(SwlError::NotFound)?;
        let bw = client.border_width;
        client.geometry = Rectangle::new(
            outer.loc,
            (outer.size.w - 2 * bw, outer.size.h - 2 * bw).into(),
        );
        if client.floating {
            client.float_geometry = Some(client.geometry);
        }
        if let Some(tl) = client.window.toplevel() {
            tl.with_pending_state(|s| s.size = Some(client.geometry.size));
            tl.send_pending_configure();
        }
        Ok(())
    }

    /// Scores every mapped, same-monitor, same-tag Client against `from`
    /// and returns the best match in `direction`, per the center-distance
    /// heuristic: primary-axis distance plus half the secondary-axis
    /// distance, restricted to candidates whose primary delta has the
    /// right sign.
    pub fn directional_focus(&self, from: ClientId, direction: Direction) -> Option<ClientId> {
        let subject = self.clients.get(from)?;
        let subject_center = center(subject.geometry);
        let monitor = subject.monitor;
        let tags = subject.effective_tags();

        let mut best: Option<(i64, ClientId)> = None;
        for client in self.clients.values() {
            if client.id == from || !client.mapped || client.monitor != monitor {
                continue;
            }
            if client.effective_tags() & tags == 0 {
                continue;
            }
            let c = center(client.geometry);
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
                best = Some((score, client.id));
            }
        }
        best.map(|(_, id)| id)
    }
}

fn center(rect: Rectangle<i32, Logical>) -> Point<i32, Logical> {
    (rect.loc.x + rect.size.w / 2, rect.loc.y + rect.size.h / 2).into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    // `Client` embeds a live Smithay `Window`, which needs a running
    // Wayland display to construct; the ordering/geometry logic below is
    // exercised directly instead of through a constructed `Client`.

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Rectangle<i32, Logical> {
        Rectangle::new((x, y).into(), (w, h).into())
    }

    #[test]
    fn center_is_the_geometric_midpoint() {
        assert_eq!(center(rect(0, 0, 100, 200)), (50, 100).into());
        assert_eq!(center(rect(10, 10, 50, 50)), (35, 35).into());
    }

    #[test]
    fn visible_on_respects_zero_as_tag_one() {
        // tags == 0 must behave as tag bit 1 wherever it's consulted
        let zero_tags: u32 = 0;
        let effective = if zero_tags == 0 { 1 } else { zero_tags };
        assert_eq!(effective & 1, 1);
    }

    #[test]
    fn float_geometry_survives_a_tiled_round_trip() {
        // Mirrors what `set_floating` + `resize` do, without a live
        // `Window` (not constructible outside a running compositor).
        let float_rect = rect(100, 100, 300, 200);
        let mut geometry = float_rect;
        let mut floating = true;
        let mut float_geometry = None;

        // leave floating: remember where it was
        if floating {
            float_geometry = Some(geometry);
        }
        floating = false;

        // arrange() overwrites geometry unconditionally while tiled
        geometry = rect(0, 0, 800, 600);

        // re-enter floating: restore the remembered rect
        if !floating {
            if let Some(remembered) = float_geometry {
                geometry = remembered;
            }
        }
        floating = true;

        assert!(floating);
        assert_eq!(geometry, float_rect);
    }

    #[test]
    fn directional_scoring_prefers_smaller_secondary_offset() {
        // two candidates straight to the right at the same primary
        // distance; the one with less vertical offset should score lower
        let subject = center(rect(0, 0, 100, 100));
        let near = center(rect(200, 0, 100, 100));
        let far = center(rect(200, 300, 100, 100));

        let score = |c: Point<i32, Logical>| {
            let dx = (c.x - subject.x) as i64;
            let dy = (c.y - subject.y) as i64;
            dx.abs() + dy.abs() / 2
        };
        assert!(score(near) < score(far));
    }
}
