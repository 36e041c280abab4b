use super::Fixture;
use crate::shell::Direction;

fn open_window(f: &mut Fixture, c: usize) -> usize {
    let w = f.client_mut(c).create_window();
    f.client_mut(c).commit(w);
    f.roundtrip(c);
    f.client_mut(c).ack_and_commit(w);
    f.roundtrip(c);
    w
}

#[test]
fn second_output_becomes_its_own_monitor() {
    let mut f = Fixture::new();
    assert_eq!(f.mt.state.outputs.count(), 1);

    let second = f.add_monitor();
    assert_eq!(f.mt.state.outputs.count(), 2);
    assert_ne!(second, f.monitor);
    // adding an output never steals focus from the first
    assert_eq!(f.mt.state.outputs.focused(), Some(f.monitor));
}

#[test]
fn directional_focus_monitor_finds_the_neighbor() {
    let mut f = Fixture::new();
    let second = f.add_monitor();

    let found = f
        .mt
        .state
        .outputs
        .directional_focus_monitor(f.monitor, Direction::Right);
    assert_eq!(found, Some(second));

    let found_back = f
        .mt
        .state
        .outputs
        .directional_focus_monitor(second, Direction::Left);
    assert_eq!(found_back, Some(f.monitor));
}

#[test]
fn client_reattaches_to_a_monitor_with_the_same_output_name() {
    let mut f = Fixture::new();
    let c = f.add_client();
    open_window(&mut f, c);

    let id = f.mt.state.clients.focused().unwrap();
    let output_name = f.mt.state.outputs.get(f.monitor).unwrap().name();
    f.mt.state
        .clients
        .move_to_monitor(id, f.monitor, output_name.clone())
        .unwrap();

    // simulate the monitor disconnecting: the client detaches but keeps
    // its remembered output name
    f.mt.state.clients.detach_monitor(f.monitor);
    assert!(f.mt.state.clients.get(id).unwrap().monitor.is_none());

    // a monitor for the same output name comes back; clients remembering
    // it should reattach
    let reattached = f
        .mt
        .state
        .clients
        .reattach_by_output_name(&output_name, f.monitor);
    assert_eq!(reattached, vec![id]);
    assert_eq!(f.mt.state.clients.get(id).unwrap().monitor, Some(f.monitor));
}
