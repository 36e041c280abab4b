// SPDX-License-Identifier: GPL-3.0-only

use crate::{
    Monotile,
    backend::Backend,
    grabs::{MoveSurfaceGrab, ResizeSurfaceGrab},
    shell::client::Direction,
};
use smithay::{
    backend::input::{
        AbsolutePositionEvent, Axis, AxisSource, ButtonState, Event, InputBackend, InputEvent,
        KeyState, KeyboardKeyEvent, PointerAxisEvent, PointerButtonEvent,
    },
    input::{
        keyboard::{FilterResult, Keysym, ModifiersState},
        pointer::{AxisFrame, ButtonEvent, Focus, GrabStartData, MotionEvent},
    },
    utils::{Logical, Point, SERIAL_COUNTER},
};

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Mods {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub logo: bool,
}

impl Mods {
    pub fn matches(&self, other: &ModifiersState) -> bool {
        self.shift == other.shift
            && self.ctrl == other.ctrl
            && self.alt == other.alt
            && self.logo == other.logo
    }
}

/// A resolved keybinding/button match, carried out of the keyboard filter
/// closure since it can't borrow `self` while the seat already has.
#[derive(Debug, Clone)]
struct Action {
    name: String,
    arg: Option<String>,
}

impl Monotile {
    pub fn process_input_event<I: InputBackend>(&mut self, event: InputEvent<I>) {
        let pointer = self.state.seat.get_pointer().unwrap();
        let keyboard = self.state.seat.get_keyboard().unwrap();
        let serial = SERIAL_COUNTER.next_serial();

        match event {
            InputEvent::Keyboard { event, .. } => {
                let time = Event::time_msec(&event);
                let key_code = event.key_code();
                let key_state = event.state();

                // exclusive layer surfaces (lock screens, launchers) grab every key
                let exclusive = self
                    .state
                    .focused_monitor()
                    .is_some_and(|m| exclusive_layer_surface(m).is_some());
                if exclusive {
                    keyboard.input::<(), _>(self, key_code, key_state, serial, time, |_, _, _| {
                        FilterResult::Forward
                    });
                    return;
                }

                let action = keyboard.input(
                    self,
                    key_code,
                    key_state,
                    serial,
                    time,
                    |monotile, modifiers, handle| {
                        if key_state != KeyState::Pressed {
                            return FilterResult::Forward;
                        }
                        for binding in &monotile.state.keybindings {
                            if binding.mods.matches(modifiers)
                                && handle.raw_syms().contains(&Keysym::new(binding.keysym))
                            {
                                return FilterResult::Intercept(Some(Action {
                                    name: binding.action.clone(),
                                    arg: binding.arg.clone(),
                                }));
                            }
                        }
                        FilterResult::Forward
                    },
                );

                if let Some(Some(action)) = action {
                    self.handle_action(&action.name, action.arg.as_deref());
                }
            }
            // TODO: relative motion once a pointer-warping backend lands
            InputEvent::PointerMotion { .. } => {}
            InputEvent::PointerMotionAbsolute { event, .. } => {
                let Some(id) = self.state.focused_monitor_id() else {
                    return;
                };
                let output_geo = self
                    .state
                    .outputs
                    .get(id)
                    .map(|m| m.usable_area)
                    .unwrap_or_default();
                let pos = event.position_transformed(output_geo.size) + output_geo.loc.to_f64();

                let follows_cursor = self.state.config.get_bool("input.focus_follows_cursor", false);
                if follows_cursor && let Some(cid) = self.state.clients.at(id, pos) {
                    self.set_focus(Some(cid));
                }
                let target = self.state.clients.surface_under(id, pos);

                pointer.motion(
                    self,
                    target,
                    &MotionEvent {
                        location: pos,
                        serial,
                        time: event.time_msec(),
                    },
                );
                pointer.frame(self);
            }
            InputEvent::PointerButton { event, .. } => {
                let button = event.button_code();
                let button_state = event.state();

                if button_state == ButtonState::Pressed && !pointer.is_grabbed() {
                    let mods = keyboard.modifier_state();

                    let bound = self
                        .state
                        .buttons
                        .iter()
                        .find(|b| b.mods.matches(&mods) && b.button == button)
                        .cloned();
                    if let Some(binding) = bound {
                        self.handle_mouse_action(
                            &binding.action,
                            binding.arg.as_deref(),
                            button,
                            pointer.current_location(),
                            serial,
                        );
                        return;
                    }

                    if let Some(id) = self
                        .state
                        .focused_monitor_id()
                        .and_then(|mid| self.state.clients.at(mid, pointer.current_location()))
                    {
                        self.set_focus(Some(id));
                    }
                }

                pointer.button(
                    self,
                    &ButtonEvent {
                        button,
                        state: button_state,
                        serial,
                        time: event.time_msec(),
                    },
                );
                pointer.frame(self);
            }
            InputEvent::PointerAxis { event, .. } => {
                let source = event.source();

                let horizontal_amount = event.amount(Axis::Horizontal).unwrap_or_else(|| {
                    event.amount_v120(Axis::Horizontal).unwrap_or(0.0) * 15.0 / 120.
                });
                let vertical_amount = event.amount(Axis::Vertical).unwrap_or_else(|| {
                    event.amount_v120(Axis::Vertical).unwrap_or(0.0) * 15.0 / 120.
                });

                let horizontal_amount_discrete = event.amount_v120(Axis::Horizontal);
                let vertical_amount_discrete = event.amount_v120(Axis::Vertical);

                let mut frame = AxisFrame::new(event.time_msec()).source(source);
                if horizontal_amount != 0.0 {
                    frame = frame.value(Axis::Horizontal, horizontal_amount);
                    if let Some(discrete) = horizontal_amount_discrete {
                        frame = frame.v120(Axis::Horizontal, discrete as i32);
                    }
                }
                if vertical_amount != 0.0 {
                    frame = frame.value(Axis::Vertical, vertical_amount);
                    if let Some(discrete) = vertical_amount_discrete {
                        frame = frame.v120(Axis::Vertical, discrete as i32);
                    }
                }

                if source == AxisSource::Finger {
                    if event.amount(Axis::Horizontal) == Some(0.0) {
                        frame = frame.stop(Axis::Horizontal);
                    }
                    if event.amount(Axis::Vertical) == Some(0.0) {
                        frame = frame.stop(Axis::Vertical);
                    }
                }

                pointer.axis(self, frame);
                pointer.frame(self);
            }
            _ => {}
        }
    }

    /// Dispatches a keybinding action by name, matching the action strings
    /// the config loader and built-in default table produce.
    pub fn handle_action(&mut self, action: &str, arg: Option<&str>) {
        let arg_i32 = || arg.and_then(|a| a.parse::<i32>().ok()).unwrap_or(0);
        let mfact_step = self.state.config.get_float("appearance.resize_step", 0.01);

        match action {
            "quit" => self.state.loop_signal.stop(),
            "spawn" => {
                if let Some(cmd) = arg {
                    let mut parts = cmd.split_whitespace();
                    if let Some(program) = parts.next() {
                        std::process::Command::new(program).args(parts).spawn().ok();
                    }
                }
            }
            "close" => {
                if let Some(id) = self.state.clients.focused()
                    && let Some(tl) = self.state.clients.get(id).and_then(|c| c.window.toplevel())
                {
                    tl.send_close();
                }
            }
            "focus-next" => self.step_focus(1),
            "focus-prev" => self.step_focus(-1),
            "toggle-floating" => {
                if let Some(id) = self.state.clients.focused() {
                    let _ = self.state.clients.toggle_floating(id);
                    self.state.arrange_focused();
                }
            }
            "toggle-fullscreen" => {
                if let Some(id) = self.state.clients.focused() {
                    let _ = self.state.clients.toggle_fullscreen(id);
                    self.state.arrange_focused();
                }
            }
            "set-layout" => {
                if let (Some(name), Some(mid)) = (arg, self.state.focused_monitor_id())
                    && let Some(monitor) = self.state.outputs.get_mut(mid)
                {
                    monitor.layout_name = name.to_string();
                    self.state.arrange_focused();
                }
            }
            "zoom" => {
                if let (Some(id), Some(mid)) = (self.state.clients.focused(), self.state.focused_monitor_id())
                    && let Some(monitor) = self.state.outputs.get_mut(mid)
                {
                    monitor.zoom(id);
                    self.state.arrange_focused();
                }
            }
            "inc-mfact" => self.adjust_mfact(mfact_step),
            "dec-mfact" => self.adjust_mfact(-mfact_step),
            "inc-nmaster" => self.adjust_nmaster(1),
            "dec-nmaster" => self.adjust_nmaster(-1),
            "focus-monitor" => {
                if let Some(from) = self.state.focused_monitor_id()
                    && let Some(next) = self.state.outputs.neighbor(from, arg_i32())
                {
                    let _ = self.state.outputs.set_focused(next);
                }
            }
            "send-monitor" => {
                if let (Some(id), Some(from)) = (self.state.clients.focused(), self.state.focused_monitor_id())
                    && let Some(next) = self.state.outputs.neighbor(from, arg_i32())
                {
                    let name = self.state.outputs.get(next).map(|m| m.name()).unwrap_or_default();
                    let _ = self.state.clients.move_to_monitor(id, next, name);
                    self.state.outputs.arrange(from, &mut self.state.clients, &self.state.layouts);
                    self.state.outputs.arrange(next, &mut self.state.clients, &self.state.layouts);
                }
            }
            "focusdir" => {
                let direction = match arg {
                    Some("up") => Direction::Up,
                    Some("down") => Direction::Down,
                    Some("left") => Direction::Left,
                    Some("right") => Direction::Right,
                    _ => return,
                };
                if let Some(id) = self.state.clients.focused()
                    && let Some(next) = self.state.clients.directional_focus(id, direction)
                {
                    self.set_focus(Some(next));
                }
            }
            "chvt" => {
                // VT switching needs the DRM session; the winit backend has
                // no VT to switch away from.
                if let Backend::Drm(drm) = &mut self.backend {
                    drm.switch_vt(arg_i32());
                }
            }
            _ => tracing::warn!(%action, "unbound action"),
        }
        self.update_focus();
    }

    fn step_focus(&mut self, delta: i32) {
        let Some(mid) = self.state.focused_monitor_id() else {
            return;
        };
        let Some(monitor) = self.state.outputs.get(mid) else {
            return;
        };
        let Some(current) = self.state.clients.focused() else {
            return;
        };
        let Some(pos) = monitor.order.iter().position(|&id| id == current) else {
            return;
        };
        let Some(layout) = self.state.layouts.get(&monitor.layout_name) else {
            return;
        };
        if let Some(next_pos) = layout.focus_next(monitor.order.len(), pos, delta)
            && let Some(&next) = monitor.order.get(next_pos)
        {
            self.set_focus(Some(next));
        }
    }

    fn adjust_mfact(&mut self, delta: f32) {
        if let Some(mid) = self.state.focused_monitor_id()
            && let Some(monitor) = self.state.outputs.get_mut(mid)
        {
            monitor.adjust_mfact(delta);
            self.state.arrange_focused();
        }
    }

    fn adjust_nmaster(&mut self, delta: i32) {
        if let Some(mid) = self.state.focused_monitor_id()
            && let Some(monitor) = self.state.outputs.get_mut(mid)
        {
            monitor.adjust_nmaster(delta);
            self.state.arrange_focused();
        }
    }

    fn handle_mouse_action(
        &mut self,
        action: &str,
        arg: Option<&str>,
        btn: u32,
        pos: Point<f64, Logical>,
        serial: smithay::utils::Serial,
    ) {
        let Some(mid) = self.state.focused_monitor_id() else {
            return;
        };

        if action == "toggle-floating" {
            if let Some(id) = self.state.clients.at(mid, pos) {
                let _ = self.state.clients.toggle_floating(id);
                self.state.arrange_focused();
            }
            return;
        }

        let Some(id) = self.state.clients.at(mid, pos) else {
            return;
        };
        // grabs only ever act on floating windows; force it so move/resize
        // always has somewhere to write without fighting the active layout
        if self.state.clients.get(id).is_some_and(|c| !c.floating) {
            let _ = self.state.clients.set_floating(id, true);
            self.state.arrange_focused();
        }
        let Some(geo) = self.state.clients.get(id).map(|c| c.geometry) else {
            return;
        };

        let start = GrabStartData {
            focus: self.state.clients.surface_under(mid, pos),
            button: btn,
            location: pos,
        };

        let ptr = self.state.seat.get_pointer().unwrap();
        match action {
            "moveresize" if arg == Some("move") => {
                let grab = MoveSurfaceGrab {
                    start_data: start,
                    client_id: id,
                    initial_location: geo.loc,
                };
                ptr.set_grab(self, grab, serial, Focus::Clear);
            }
            "moveresize" if arg == Some("resize") => {
                let grab = ResizeSurfaceGrab::start(start, id, geo);
                ptr.set_grab(self, grab, serial, Focus::Clear);
            }
            _ => {}
        }
    }
}

/// A mapped, exclusive-keyboard-interactivity layer surface on `monitor`'s
/// output, if any (lock screens, launchers demanding every keypress).
fn exclusive_layer_surface(monitor: &crate::shell::Monitor) -> Option<()> {
    use smithay::desktop::layer_map_for_output;
    use smithay::wayland::shell::wlr_layer::{KeyboardInteractivity, Layer};

    let map = layer_map_for_output(&monitor.output);
    for layer in [Layer::Overlay, Layer::Top] {
        for surface in map.layers_on(layer) {
            if surface.cached_state().keyboard_interactivity == KeyboardInteractivity::Exclusive {
                return Some(());
            }
        }
    }
    None
}
