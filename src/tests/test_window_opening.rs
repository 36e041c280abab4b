use super::Fixture;
use wayland_protocols::xdg::shell::client::xdg_toplevel::State as ToplevelState;

fn open_window(f: &mut Fixture, c: usize) -> usize {
    let w = f.client_mut(c).create_window();
    f.client_mut(c).commit(w);
    f.roundtrip(c);
    f.client_mut(c).ack_and_commit(w);
    f.roundtrip(c);
    assert!(
        f.mt.state.clients.iter().any(|cl| cl.mapped),
        "window {w} should be mapped after open_window",
    );
    w
}

#[test]
fn two_windows() {
    let mut f = Fixture::new();
    let c = f.add_client();

    let w1 = open_window(&mut f, c);
    f.client_mut(c).take_configures(w1); // drain

    let w2 = open_window(&mut f, c);
    assert_eq!(
        f.mt.state.clients.iter().filter(|cl| cl.mapped).count(),
        2,
        "compositor should have 2 mapped windows",
    );

    // w1 should be reconfigured (full -> master)
    let cfgs1 = f.client_mut(c).take_configures(w1);
    // w2 got its initial configure during open_window
    let cfgs2 = f.client_mut(c).take_configures(w2);

    assert!(!cfgs1.is_empty(), "master should be reconfigured",);
    assert!(!cfgs2.is_empty(), "stack window should get a configure",);

    // master and stack should have different widths
    let last1 = cfgs1.last().unwrap();
    let last2 = cfgs2.last().unwrap();
    assert_ne!(
        last1.width, last2.width,
        "master and stack should differ: \
         {}x{} vs {}x{}",
        last1.width, last1.height, last2.width, last2.height,
    );
}

#[test]
fn close_window() {
    let mut f = Fixture::new();
    let c = f.add_client();

    let _w1 = open_window(&mut f, c);
    let w2 = open_window(&mut f, c);

    // close the focused window (w2) from the server side
    let focused = f.mt.state.clients.focused().unwrap();
    if let Some(client) = f.mt.state.clients.get(focused) {
        if let Some(tl) = client.window.toplevel() {
            tl.send_close();
        }
    }
    f.roundtrip(c);

    let ws = f.client(c).window(w2);
    assert!(ws.closed, "expected close event on second window",);
}

/// Check that the last configure for a window has the Activated state.
fn is_activated(f: &mut Fixture, c: usize, w: usize) -> bool {
    let cfgs = f.client_mut(c).take_configures(w);
    assert!(
        !cfgs.is_empty(),
        "expected at least one configure for window {w}"
    );
    cfgs.last()
        .unwrap()
        .states
        .contains(&ToplevelState::Activated)
}

#[test]
fn first_window_activated() {
    let mut f = Fixture::new();
    let c = f.add_client();

    let w = open_window(&mut f, c);
    f.client_mut(c).take_configures(w); // drain initial

    // trigger focus sync
    f.mt.update_focus();
    f.roundtrip(c);

    assert!(
        is_activated(&mut f, c, w),
        "sole window should be activated"
    );
}

#[test]
fn second_window_steals_focus() {
    let mut f = Fixture::new();
    let c = f.add_client();

    let w1 = open_window(&mut f, c);
    f.client_mut(c).take_configures(w1); // drain

    let w2 = open_window(&mut f, c);
    f.mt.update_focus();
    f.roundtrip(c);

    assert!(
        !is_activated(&mut f, c, w1),
        "first window should not be activated"
    );
    assert!(
        is_activated(&mut f, c, w2),
        "second window should be activated"
    );
}

#[test]
fn focus_after_remove() {
    let mut f = Fixture::new();
    let c = f.add_client();

    let w1 = open_window(&mut f, c);
    let _w2 = open_window(&mut f, c);
    f.client_mut(c).take_configures(w1);

    // remove the focused window and re-sync focus
    let active = f.mt.state.clients.focused().unwrap();
    let _ = f.mt.state.clients.unmap(active);
    f.mt.state.clients.destroy(active);
    f.mt.state.outputs.arrange(f.monitor, &mut f.mt.state.clients, &f.mt.state.layouts);
    f.mt.update_focus();
    f.roundtrip(c);

    assert_eq!(
        f.mt.state.clients.iter().filter(|cl| cl.mapped).count(),
        1,
        "should have 1 mapped window after remove",
    );
    assert!(
        is_activated(&mut f, c, w1),
        "remaining window should be activated"
    );
}

#[test]
fn float_geometry_preserved_across_toggle() {
    let mut f = Fixture::new();
    let c = f.add_client();

    let w = open_window(&mut f, c);
    f.client_mut(c).take_configures(w);

    let id = f.mt.state.clients.focused().unwrap();

    // toggle to floating
    f.mt.state.clients.toggle_floating(id).unwrap();
    let geo1 = f.mt.state.clients.get(id).unwrap().geometry;
    assert!(
        geo1.size.w > 0 && geo1.size.h > 0,
        "floating geometry should have nonzero size"
    );

    // simulate a move while floating
    let moved = smithay::utils::Rectangle::new((100, 200).into(), geo1.size);
    f.mt.state.clients.resize(id, moved).unwrap();

    // toggle to tiled and back to floating
    f.mt.state.clients.toggle_floating(id).unwrap();
    f.mt.state.clients.toggle_floating(id).unwrap();

    let geo2 = f.mt.state.clients.get(id).unwrap().geometry;
    assert_eq!(
        geo2, moved,
        "floating geometry should be preserved across a tiled round trip"
    );
}

#[test]
fn directional_focus_finds_neighbor_window() {
    let mut f = Fixture::new();
    let c = f.add_client();

    let w1 = open_window(&mut f, c);
    let _w2 = open_window(&mut f, c);
    f.client_mut(c).take_configures(w1);

    let focused = f.mt.state.clients.focused().unwrap();
    let other = f
        .mt
        .state
        .clients
        .iter()
        .map(|cl| cl.id)
        .find(|&id| id != focused)
        .unwrap();

    // the two windows are tiled side by side; one direction should find
    // the other from either starting point
    let found_left = f.mt.state.clients.directional_focus(focused, crate::shell::Direction::Left);
    let found_right = f.mt.state.clients.directional_focus(focused, crate::shell::Direction::Right);
    assert!(
        found_left == Some(other) || found_right == Some(other),
        "directional focus should reach the other tiled window"
    );
}
