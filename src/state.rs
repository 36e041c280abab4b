// SPDX-License-Identifier: GPL-3.0-only

use crate::{
    backend::Backend,
    config::{ButtonBinding, ConfigStore, Keybinding, load_bindings},
    events::{EventBus, EventData, EventType},
    ipc::{self, CommandContext, CommandTable, IpcResponse, SubscriberTable},
    rules::RuleEngine,
    shell::{ClientManager, LayoutRegistry, Monitor, MonitorId, OutputManager},
};
use smithay::{
    desktop::{PopupManager, Window},
    input::{Seat, SeatState},
    reexports::{
        calloop::{
            EventLoop, Interest, LoopSignal, Mode as CalloopMode, PostAction, generic::Generic,
        },
        wayland_protocols_misc::server_decoration::server::org_kde_kwin_server_decoration_manager::Mode as KdeMode,
        wayland_server::{
            Display, DisplayHandle,
            backend::{ClientData, ClientId as WaylandClientId, DisconnectReason},
            protocol::wl_surface::WlSurface,
        },
    },
    utils::SERIAL_COUNTER,
    wayland::{
        compositor::{CompositorClientState, CompositorState},
        dmabuf::{DmabufGlobal, DmabufState},
        output::OutputManagerState,
        selection::data_device::DataDeviceState,
        shell::{
            kde::decoration::KdeDecorationState,
            wlr_layer::WlrLayerShellState,
            xdg::{ToplevelSurface, XdgShellState, decoration::XdgDecorationState},
        },
        shm::ShmState,
        socket::ListeningSocketSource,
    },
};
use std::{
    ffi::OsString,
    os::unix::net::{UnixListener, UnixStream},
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

pub struct Monotile {
    pub backend: Backend,
    pub state: State,
}

impl Monotile {
    pub fn new() -> (EventLoop<'static, Monotile>, Self) {
        let event_loop: EventLoop<Monotile> = EventLoop::try_new().expect("event loop");
        let loop_handle = event_loop.handle();

        // insert event source to dispatch protocol messages from clients
        let display: Display<Monotile> = Display::new().unwrap();
        let display_handle = display.handle();
        let display_source = Generic::new(display, Interest::READ, CalloopMode::Level);
        loop_handle
            .insert_source(display_source, |_, display, monotile| {
                unsafe {
                    display.get_mut().dispatch_clients(monotile).unwrap();
                }
                Ok(PostAction::Continue)
            })
            .unwrap();

        let mut state = State::new(display_handle, event_loop.get_signal());

        // insert event source to accept new Wayland client connections
        let socket = ListeningSocketSource::new_auto().unwrap();
        state.socket = socket.socket_name().to_os_string();
        loop_handle
            .insert_source(socket, |stream, _, mt| mt.state.insert_client(stream))
            .unwrap();

        // insert event source to accept new swlctl connections on the IPC socket
        let (ipc_listener, ipc_path) = ipc::bind_socket().expect("bind ipc socket");
        state.ipc_socket_path = ipc_path;
        ipc_listener.set_nonblocking(true).ok();
        let ipc_source = Generic::new(ipc_listener, Interest::READ, CalloopMode::Level);
        loop_handle
            .insert_source(ipc_source, |_, listener, mt| {
                loop {
                    match listener.get_ref().accept() {
                        Ok((stream, _addr)) => mt.state.handle_ipc_connection(stream),
                        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                        Err(_) => break,
                    }
                }
                Ok(PostAction::Continue)
            })
            .unwrap();

        (
            event_loop,
            Self {
                backend: Backend::Unset,
                state,
            },
        )
    }

    pub fn update_focus(&mut self) {
        let focused = self.state.clients.focused();
        self.set_focus(focused);
    }

    pub fn set_focus(&mut self, id: Option<crate::shell::ClientId>) {
        let target = id.and_then(|id| {
            self.state
                .clients
                .get(id)
                .and_then(|c| c.window.toplevel())
                .map(|tl| tl.wl_surface().clone())
        });
        if let Some(kb) = self.state.seat.get_keyboard() {
            kb.set_focus(self, target, SERIAL_COUNTER.next_serial());
        }
    }
}

/// Core compositor state (everything except backend)
pub struct State {
    pub start_time: std::time::Instant,
    pub socket: OsString,
    pub display_handle: DisplayHandle,
    pub loop_signal: LoopSignal,
    pub compositor_state: CompositorState,
    pub xdg_shell_state: XdgShellState,
    pub xdg_decoration_state: XdgDecorationState,
    pub kde_decoration_state: KdeDecorationState,
    pub layer_shell_state: WlrLayerShellState,
    pub shm_state: ShmState,
    pub output_manager_state: OutputManagerState,
    pub seat_state: SeatState<Monotile>,
    pub data_device_state: DataDeviceState,
    pub dmabuf_state: DmabufState,
    pub dmabuf_global: Option<DmabufGlobal>,
    pub popups: PopupManager,
    pub seat: Seat<Monotile>,

    pub clients: ClientManager,
    pub outputs: OutputManager,
    pub layouts: LayoutRegistry,
    pub config: ConfigStore,
    pub rules: RuleEngine,
    pub events: EventBus,
    pub keybindings: Vec<Keybinding>,
    pub buttons: Vec<ButtonBinding>,

    pub ipc_commands: CommandTable,
    pub ipc_subscribers: SubscriberTable,
    pub ipc_socket_path: PathBuf,
    pub quit: Arc<AtomicBool>,

    pub pending: Vec<Window>,
}

impl State {
    pub fn new(dh: DisplayHandle, signal: LoopSignal) -> Self {
        let compositor_state = CompositorState::new::<Monotile>(&dh);
        let xdg_shell_state = XdgShellState::new::<Monotile>(&dh);
        let xdg_decoration_state = XdgDecorationState::new::<Monotile>(&dh);
        let kde_decoration_state = KdeDecorationState::new::<Monotile>(&dh, KdeMode::Server);
        let layer_shell_state = WlrLayerShellState::new::<Monotile>(&dh);
        let shm_state = ShmState::new::<Monotile>(&dh, vec![]);
        let output_manager_state = OutputManagerState::new_with_xdg_output::<Monotile>(&dh);
        let data_device_state = DataDeviceState::new::<Monotile>(&dh);
        let dmabuf_state = DmabufState::new();

        let mut config = ConfigStore::new();
        let _ = config.load_default();

        let mut seat_state = SeatState::new();
        let mut seat = seat_state.new_wl_seat(&dh, "seat0");
        seat.add_keyboard(
            Default::default(),
            config.get_int("keyboard.repeat_delay", 300) as i32,
            config.get_int("keyboard.repeat_rate", 30) as i32,
        )
        .unwrap();
        seat.add_pointer();

        let (keybindings, buttons) = load_bindings(&config);

        Self {
            start_time: std::time::Instant::now(),
            socket: OsString::new(),
            display_handle: dh,
            loop_signal: signal,
            compositor_state,
            xdg_shell_state,
            xdg_decoration_state,
            kde_decoration_state,
            layer_shell_state,
            shm_state,
            output_manager_state,
            seat_state,
            data_device_state,
            dmabuf_state,
            dmabuf_global: None,
            popups: PopupManager::default(),
            seat,
            clients: ClientManager::new(),
            outputs: OutputManager::new(),
            layouts: LayoutRegistry::new(),
            rules: crate::rules::load_rules_from_config(&config),
            events: EventBus::new(),
            keybindings,
            buttons,
            config,
            ipc_commands: CommandTable::new(),
            ipc_subscribers: SubscriberTable::new(),
            ipc_socket_path: PathBuf::new(),
            quit: Arc::new(AtomicBool::new(false)),
            pending: Vec::new(),
        }
    }

    /// The Monitor holding input/keyboard focus, or `None` before the first
    /// output is connected.
    pub fn focused_monitor(&self) -> Option<&Monitor> {
        self.outputs.focused().and_then(|id| self.outputs.get(id))
    }

    pub fn focused_monitor_mut(&mut self) -> Option<&mut Monitor> {
        let id = self.outputs.focused()?;
        self.outputs.get_mut(id)
    }

    pub fn focused_monitor_id(&self) -> Option<MonitorId> {
        self.outputs.focused()
    }

    /// Arranges the currently focused Monitor. A no-op before any output is
    /// connected.
    pub fn arrange_focused(&mut self) {
        if let Some(id) = self.outputs.focused() {
            self.outputs.arrange(id, &mut self.clients, &self.layouts);
        }
    }

    /// Emits `CLIENT_UNFOCUS`/`CLIENT_FOCUS` for the transition between
    /// `previous` and `now`, or nothing if focus didn't actually move.
    fn notify_focus_transition(
        &mut self,
        previous: Option<crate::shell::ClientId>,
        now: Option<crate::shell::ClientId>,
    ) {
        if previous == now {
            return;
        }
        if let Some(prev) = previous {
            self.notify(EventType::ClientUnfocus, EventData::Client(prev));
        }
        if let Some(cur) = now {
            self.notify(EventType::ClientFocus, EventData::Client(cur));
        }
    }

    /// Maps a freshly created Client: snapshots `app_id`/`title`, focuses
    /// it, and emits `CLIENT_FOCUS`/`CLIENT_UNFOCUS` (if focus moved) and
    /// `CLIENT_CREATE`.
    pub fn map_client(
        &mut self,
        id: crate::shell::ClientId,
        app_id: Option<String>,
        title: Option<String>,
    ) -> crate::error::Result<()> {
        let previous = self.clients.focused();
        self.clients.map(id, app_id, title)?;
        self.notify_focus_transition(previous, self.clients.focused());
        self.notify(EventType::ClientCreate, EventData::Client(id));
        Ok(())
    }

    /// Unmaps a Client, emitting `CLIENT_FOCUS` if a replacement was
    /// promoted from the focus stack.
    pub fn unmap_client(&mut self, id: crate::shell::ClientId) -> crate::error::Result<()> {
        let previous = self.clients.focused();
        self.clients.unmap(id)?;
        self.notify_focus_transition(previous, self.clients.focused());
        Ok(())
    }

    /// Removes a Client entirely and emits `CLIENT_DESTROY`.
    pub fn destroy_client(&mut self, id: crate::shell::ClientId) {
        self.clients.destroy(id);
        self.notify(EventType::ClientDestroy, EventData::Client(id));
    }

    /// Allocates a Monitor for `output` and emits `MONITOR_ADD`.
    pub fn add_monitor(&mut self, output: smithay::output::Output) -> MonitorId {
        let id = self.outputs.add(output, &self.config);
        self.notify(EventType::MonitorAdd, EventData::Monitor(id));
        id
    }

    /// Removes a Monitor and emits `MONITOR_REMOVE`.
    pub fn remove_monitor(&mut self, id: MonitorId) {
        self.outputs.remove(id);
        self.notify(EventType::MonitorRemove, EventData::Monitor(id));
    }

    pub fn find_pending(&self, surface: &WlSurface) -> Option<(usize, ToplevelSurface)> {
        for (i, w) in self.pending.iter().enumerate() {
            if let Some(tl) = w.toplevel()
                && tl.wl_surface() == surface
            {
                return Some((i, tl.clone()));
            }
        }
        None
    }

    pub fn insert_client(&mut self, stream: UnixStream) {
        self.display_handle
            .insert_client(stream, Arc::new(ClientState::default()))
            .unwrap();
    }

    pub fn flush_clients(&mut self) {
        let _ = self.display_handle.flush_clients();
    }

    /// Services one swlctl connection end-to-end: read a single request,
    /// dispatch it, write the reply, and promote the stream to a streaming
    /// subscriber if the command asked to (`subscribe`).
    fn handle_ipc_connection(&mut self, mut stream: UnixStream) {
        stream.set_nonblocking(false).ok();
        let Ok(Some((command, args))) = ipc::socket::read_request(&mut stream) else {
            return;
        };
        let response = self.dispatch_ipc(&command, args.as_deref());
        let _ = ipc::socket::write_response(&mut stream, &response);
        if response.keep_open {
            self.ipc_subscribers.add(stream, response.event_mask);
        }
    }

    pub fn dispatch_ipc(&mut self, command: &str, args: Option<&str>) -> IpcResponse {
        let previous_focus = (command == "focus").then(|| self.clients.focused()).flatten();
        let mut ctx = CommandContext {
            clients: &mut self.clients,
            outputs: &mut self.outputs,
            layouts: &self.layouts,
            config: &mut self.config,
            quit: self.quit.as_ref(),
        };
        let response = self.ipc_commands.execute(&mut ctx, command, args);
        if command == "reload-config" && response.success {
            let (keybindings, buttons) = load_bindings(&self.config);
            self.keybindings = keybindings;
            self.buttons = buttons;
            self.rules = crate::rules::load_rules_from_config(&self.config);
        }
        if command == "focus" && response.success {
            self.notify_focus_transition(previous_focus, self.clients.focused());
        }
        response
    }

    /// Records an event on the in-process bus and streams it to every
    /// matching `subscribe`d swlctl connection.
    pub fn notify(&mut self, kind: EventType, data: EventData) {
        let json = format!("{{\"event\":\"{}\"}}\n", kind.name());
        self.ipc_subscribers.broadcast(kind, &json);
        self.events.emit_simple(kind, data);
    }

    pub fn should_quit(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }
}

/// Data associated with a wayland client.
#[derive(Default)]
pub struct ClientState {
    pub compositor_state: CompositorClientState,
}

impl ClientData for ClientState {
    fn initialized(&self, _client_id: WaylandClientId) {}
    fn disconnected(&self, _client_id: WaylandClientId, _reason: DisconnectReason) {}
}
