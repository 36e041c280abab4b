use super::Fixture;
use crate::ipc::commands::client_id_to_u64;

fn open_window(f: &mut Fixture, c: usize) -> usize {
    let w = f.client_mut(c).create_window();
    f.client_mut(c).commit(w);
    f.roundtrip(c);
    f.client_mut(c).ack_and_commit(w);
    f.roundtrip(c);
    w
}

#[test]
fn get_windows_reports_mapped_clients() {
    let mut f = Fixture::new();
    let c = f.add_client();
    open_window(&mut f, c);

    let response = f.mt.state.dispatch_ipc("get-windows", None);
    assert!(response.success);
    let json = response.json.unwrap();
    assert!(json.contains("\"floating\""));
    assert!(json.starts_with('['));
}

#[test]
fn get_monitors_reports_the_test_output() {
    let mut f = Fixture::new();
    let response = f.mt.state.dispatch_ipc("get-monitors", None);
    assert!(response.success);
    assert!(response.json.unwrap().contains("\"test\""));
}

#[test]
fn get_layouts_lists_the_four_builtins() {
    let mut f = Fixture::new();
    let response = f.mt.state.dispatch_ipc("get-layouts", None);
    assert!(response.success);
    let json = response.json.unwrap();
    for name in ["scroller", "tile", "monocle", "floating"] {
        assert!(json.contains(name), "missing {name} in {json}");
    }
}

#[test]
fn focus_by_id_switches_focus() {
    let mut f = Fixture::new();
    let c = f.add_client();
    open_window(&mut f, c);
    open_window(&mut f, c);

    let ids: Vec<_> = f.mt.state.clients.iter().map(|cl| cl.id).collect();
    let target = ids[0];
    let response = f
        .mt
        .state
        .dispatch_ipc("focus", Some(&client_id_to_u64(target).to_string()));
    assert!(response.success);
    assert_eq!(f.mt.state.clients.focused(), Some(target));
}

#[test]
fn focus_unknown_id_is_an_error() {
    let mut f = Fixture::new();
    let response = f.mt.state.dispatch_ipc("focus", Some("999999"));
    assert!(!response.success);
}

#[test]
fn layout_command_changes_the_focused_monitors_layout() {
    let mut f = Fixture::new();
    let response = f.mt.state.dispatch_ipc("layout", Some("monocle"));
    assert!(response.success);
    assert_eq!(
        f.mt.state.outputs.get(f.monitor).unwrap().layout_name,
        "monocle"
    );
}

#[test]
fn layout_command_rejects_unknown_layout() {
    let mut f = Fixture::new();
    let response = f.mt.state.dispatch_ipc("layout", Some("nonexistent"));
    assert!(!response.success);
}

#[test]
fn quit_sets_the_shutdown_flag() {
    let mut f = Fixture::new();
    assert!(!f.mt.state.should_quit());
    let response = f.mt.state.dispatch_ipc("quit", None);
    assert!(response.success);
    assert!(f.mt.state.should_quit());
}

#[test]
fn unknown_command_is_rejected() {
    let mut f = Fixture::new();
    let response = f.mt.state.dispatch_ipc("not-a-command", None);
    assert!(!response.success);
}

#[test]
fn subscribe_accepts_space_separated_event_names() {
    let mut f = Fixture::new();
    let response = f.mt.state.dispatch_ipc("subscribe", Some("CLIENT_CREATE CLIENT_DESTROY"));
    assert!(response.success);
    assert!(response.keep_open);

    use crate::events::EventType;
    let expected = (1u32 << EventType::ClientCreate as u32) | (1u32 << EventType::ClientDestroy as u32);
    assert_eq!(response.event_mask, expected);
}

#[test]
fn subscribe_rejects_unknown_event_name() {
    let mut f = Fixture::new();
    let response = f.mt.state.dispatch_ipc("subscribe", Some("NOT_AN_EVENT"));
    assert!(!response.success);
}

#[test]
fn mapping_and_destroying_a_client_emits_bus_events() {
    use crate::events::EventType;
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut f = Fixture::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let seen1 = seen.clone();
    f.mt.state.events.subscribe(EventType::ClientCreate, move |_| seen1.borrow_mut().push("CLIENT_CREATE"));
    let seen2 = seen.clone();
    f.mt.state.events.subscribe(EventType::ClientDestroy, move |_| seen2.borrow_mut().push("CLIENT_DESTROY"));

    let c = f.add_client();
    open_window(&mut f, c);
    assert_eq!(*seen.borrow(), vec!["CLIENT_CREATE"]);

    let active = f.mt.state.clients.focused().unwrap();
    let _ = f.mt.state.unmap_client(active);
    f.mt.state.destroy_client(active);
    assert_eq!(*seen.borrow(), vec!["CLIENT_CREATE", "CLIENT_DESTROY"]);
}

#[test]
fn output_power_toggles_monitor_enabled_state() {
    let mut f = Fixture::new();
    let name = f.mt.state.outputs.get(f.monitor).unwrap().name();

    let response = f.mt.state.dispatch_ipc("output-power", Some(&format!("{name} off")));
    assert!(response.success);
    assert!(!f.mt.state.outputs.get(f.monitor).unwrap().enabled);

    let response = f.mt.state.dispatch_ipc("output-power", Some(&format!("{name} on")));
    assert!(response.success);
    assert!(f.mt.state.outputs.get(f.monitor).unwrap().enabled);
}

#[test]
fn output_power_rejects_unknown_monitor() {
    let mut f = Fixture::new();
    let response = f.mt.state.dispatch_ipc("output-power", Some("nonexistent on"));
    assert!(!response.success);
}
