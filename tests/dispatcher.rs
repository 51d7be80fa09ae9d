//! Dispatcher scenarios
//!
//! These drive `WindowManager` through the in-memory display and check the
//! focus invariants and the requests it sends.

use flowm::config::Config;
use flowm::shared::Geometry;
use flowm::testing::{Call, FakeDisplay, ROOT, SENTINEL};
use flowm::wm::display::{CirculateDirection, DisplayConnection};
use flowm::wm::errors::{ErrorPolicy, Phase};
use flowm::wm::events::WmEvent;
use flowm::wm::keyboard::mod_key;
use flowm::wm::WindowManager;
use x11_dl::keysym;
use x11rb::protocol::xproto::{ConfigureWindowAux, Mapping, ModMask, StackMode};
use x11rb::protocol::ErrorKind;
use x11rb::NONE;

const KEY_RIGHT: u8 = 114;
const KEY_TAB: u8 = 23;
const KEY_F: u8 = 41;
const KEY_E: u8 = 26;
const KEY_Q: u8 = 24;

fn display() -> FakeDisplay {
    FakeDisplay::new(1920, 1080)
        .with_key(KEY_RIGHT, keysym::XK_Right)
        .with_key(KEY_TAB, keysym::XK_Tab)
        .with_key(KEY_F, keysym::XK_f)
        .with_key(KEY_E, keysym::XK_e)
        .with_key(KEY_Q, keysym::XK_q)
}

fn manager(display: FakeDisplay) -> WindowManager<FakeDisplay> {
    let mut wm = WindowManager::new(display, &Config::default(), ErrorPolicy::startup()).unwrap();
    wm.start().unwrap();
    wm.display().clear_calls();
    wm
}

fn shift() -> u16 {
    u16::from(ModMask::SHIFT)
}

fn map(wm: &mut WindowManager<FakeDisplay>, window: u32, geometry: Geometry) {
    wm.display().add_window(window, geometry);
    wm.handle_event(WmEvent::MapRequest { window }).unwrap();
}

#[test]
fn startup_grabs_and_parks_focus_on_sentinel() {
    let mut wm = WindowManager::new(display(), &Config::default(), ErrorPolicy::startup()).unwrap();
    wm.start().unwrap();

    let calls = wm.display().calls();
    assert_eq!(calls.first(), Some(&Call::UngrabAll));
    assert!(calls.contains(&Call::Focus(SENTINEL)));
    assert_eq!(wm.focus.current(), SENTINEL);
}

#[test]
fn map_request_manages_places_and_focuses() {
    let mut wm = manager(display());
    map(&mut wm, 10, Geometry::new(0, 0, 400, 300));

    let calls = wm.display().calls();
    assert_eq!(
        calls,
        vec![
            Call::SelectInput(10),
            Call::Map(10),
            Call::Configure(10),
            Call::Focus(10),
            Call::Raise(10),
        ]
    );
    assert_eq!(wm.display().geometry_of(10), Some(Geometry::new(760, 390, 400, 300)));
    assert_eq!(wm.focus.current(), 10);
}

#[test]
fn zero_sized_windows_get_the_default_size() {
    let mut wm = manager(display());
    map(&mut wm, 10, Geometry::new(30, 30, 0, 200));
    assert_eq!(wm.display().geometry_of(10), Some(Geometry::new(560, 240, 800, 600)));
}

#[test]
fn requested_position_is_honored() {
    let mut wm = manager(display());
    map(&mut wm, 10, Geometry::new(30, 40, 400, 300));
    assert_eq!(wm.display().geometry_of(10), Some(Geometry::new(30, 40, 400, 300)));
}

#[test]
fn override_redirect_windows_are_never_managed() {
    let mut wm = manager(display());
    wm.display().add_override_redirect(10, Geometry::new(0, 0, 100, 20));
    wm.handle_event(WmEvent::MapRequest { window: 10 }).unwrap();

    assert!(wm.display().calls().is_empty());
    assert_eq!(wm.focus.current(), SENTINEL);
}

#[test]
fn map_request_for_vanished_window_is_ignored() {
    let mut wm = manager(display());
    wm.handle_event(WmEvent::MapRequest { window: 99 }).unwrap();
    assert!(wm.display().calls().is_empty());
}

#[test]
fn configure_request_is_passed_through() {
    let mut wm = manager(display());
    wm.display().add_window(10, Geometry::new(5, 5, 100, 100));

    let changes = ConfigureWindowAux::new().width(640).stack_mode(StackMode::ABOVE);
    wm.handle_event(WmEvent::ConfigureRequest { window: 10, changes }).unwrap();

    assert_eq!(wm.display().calls(), vec![Call::Configure(10)]);
    assert_eq!(wm.display().geometry_of(10), Some(Geometry::new(5, 5, 640, 100)));
    // Configure requests do not change focus
    assert_eq!(wm.focus.current(), SENTINEL);
}

#[test]
fn destroying_current_window_falls_back_to_sentinel() {
    let mut wm = manager(display());
    map(&mut wm, 10, Geometry::new(30, 40, 400, 300));
    wm.display().clear_calls();

    wm.display().destroy_window(10);
    wm.handle_event(WmEvent::DestroyNotify { window: 10 }).unwrap();

    assert_eq!(wm.focus.current(), SENTINEL);
    assert_eq!(wm.display().calls(), vec![Call::Focus(SENTINEL), Call::Raise(SENTINEL)]);

    // A later focus operation targets the sentinel, never the root
    wm.handle_event(WmEvent::ButtonPress { window: ROOT, subwindow: NONE }).unwrap();
    assert_eq!(wm.display().focused(), SENTINEL);
}

#[test]
fn unmapping_another_window_keeps_focus() {
    let mut wm = manager(display());
    map(&mut wm, 10, Geometry::new(30, 40, 400, 300));
    map(&mut wm, 11, Geometry::new(60, 40, 400, 300));
    wm.display().clear_calls();

    wm.handle_event(WmEvent::UnmapNotify { window: 10 }).unwrap();

    assert_eq!(wm.focus.current(), 11);
    assert!(wm.display().calls().is_empty());
}

#[test]
fn enter_focuses_and_raises() {
    let mut wm = manager(display());
    map(&mut wm, 10, Geometry::new(30, 40, 400, 300));
    map(&mut wm, 11, Geometry::new(60, 40, 400, 300));
    wm.display().clear_calls();

    wm.handle_event(WmEvent::EnterNotify { window: 10 }).unwrap();

    assert_eq!(wm.focus.current(), 10);
    assert_eq!(wm.display().calls(), vec![Call::Focus(10), Call::Raise(10)]);
}

#[test]
fn click_on_client_focuses_it_and_click_on_root_clears() {
    let mut wm = manager(display());
    map(&mut wm, 10, Geometry::new(30, 40, 400, 300));
    map(&mut wm, 11, Geometry::new(60, 40, 400, 300));

    wm.handle_event(WmEvent::ButtonPress { window: ROOT, subwindow: 10 }).unwrap();
    assert_eq!(wm.focus.current(), 10);
    assert_eq!(wm.display().focused(), 10);

    wm.handle_event(WmEvent::ButtonPress { window: ROOT, subwindow: NONE }).unwrap();
    assert_eq!(wm.focus.current(), SENTINEL);
    assert_eq!(wm.display().focused(), SENTINEL);
}

#[test]
fn focus_never_lands_on_root() {
    let mut wm = manager(display());
    let events = vec![
        WmEvent::EnterNotify { window: ROOT },
        WmEvent::ButtonPress { window: ROOT, subwindow: ROOT },
        WmEvent::MapRequest { window: 10 },
        WmEvent::EnterNotify { window: 10 },
        WmEvent::ButtonPress { window: ROOT, subwindow: NONE },
        WmEvent::DestroyNotify { window: 10 },
        WmEvent::UnmapNotify { window: ROOT },
        WmEvent::EnterNotify { window: NONE },
        WmEvent::DestroyNotify { window: SENTINEL },
    ];
    wm.display().add_window(10, Geometry::new(1, 1, 50, 50));

    for event in events {
        wm.handle_event(event).unwrap();
        assert_ne!(wm.focus.current(), ROOT);
        assert_ne!(wm.display().focused(), ROOT);
    }
    assert!(!wm.display().calls().contains(&Call::Focus(ROOT)));
}

#[test]
fn key_press_moves_current_window() {
    let mut wm = manager(display());
    map(&mut wm, 10, Geometry::new(30, 40, 400, 300));

    wm.handle_event(WmEvent::KeyPress { keycode: KEY_RIGHT, state: mod_key() }).unwrap();

    assert_eq!(wm.display().geometry_of(10), Some(Geometry::new(80, 40, 400, 300)));
}

#[test]
fn key_press_with_lock_modifier_does_nothing() {
    let mut wm = manager(display());
    map(&mut wm, 10, Geometry::new(30, 40, 400, 300));
    wm.display().clear_calls();

    let caps = u16::from(ModMask::LOCK);
    wm.handle_event(WmEvent::KeyPress { keycode: KEY_RIGHT, state: mod_key() | caps }).unwrap();

    assert!(wm.display().calls().is_empty());
    assert_eq!(wm.display().geometry_of(10), Some(Geometry::new(30, 40, 400, 300)));
}

#[test]
fn unknown_keycode_is_dropped() {
    let mut wm = manager(display());
    wm.handle_event(WmEvent::KeyPress { keycode: 250, state: mod_key() }).unwrap();
    assert!(wm.display().calls().is_empty());
}

#[test]
fn one_key_press_runs_one_action() {
    let mut wm = manager(display());
    map(&mut wm, 10, Geometry::new(30, 40, 400, 300));
    wm.display().clear_calls();

    wm.handle_event(WmEvent::KeyPress { keycode: KEY_TAB, state: mod_key() }).unwrap();
    wm.handle_event(WmEvent::KeyPress { keycode: KEY_TAB, state: mod_key() | shift() }).unwrap();

    assert_eq!(
        wm.display().calls(),
        vec![
            Call::Circulate(CirculateDirection::Next),
            Call::Circulate(CirculateDirection::Prev),
        ]
    );
}

#[test]
fn fullscreen_toggle_restores_geometry() {
    let mut wm = manager(display());
    let start = Geometry::new(30, 40, 400, 300);
    map(&mut wm, 10, start);

    wm.handle_event(WmEvent::KeyPress { keycode: KEY_F, state: mod_key() }).unwrap();
    assert_eq!(wm.display().geometry_of(10), Some(Geometry::new(0, 0, 1920, 1080)));

    wm.handle_event(WmEvent::KeyPress { keycode: KEY_F, state: mod_key() }).unwrap();
    assert_eq!(wm.display().geometry_of(10), Some(start));
}

#[test]
fn kill_binding_terminates_client_and_resets_focus() {
    let mut wm = manager(display());
    map(&mut wm, 10, Geometry::new(30, 40, 400, 300));
    wm.display().clear_calls();

    wm.handle_event(WmEvent::KeyPress { keycode: KEY_Q, state: mod_key() | shift() }).unwrap();

    assert_eq!(
        wm.display().calls(),
        vec![Call::Kill(10), Call::Focus(SENTINEL), Call::Raise(SENTINEL)]
    );
    assert_eq!(wm.focus.current(), SENTINEL);
}

#[test]
fn mapping_notify_refreshes_then_regrabs() {
    let mut wm = manager(display());
    wm.handle_event(WmEvent::MappingNotify { request: Mapping::KEYBOARD }).unwrap();

    let calls = wm.display().calls();
    assert_eq!(calls[0], Call::RefreshKeymap);
    assert_eq!(calls[1], Call::UngrabAll);
    let key_grabs = calls.iter().filter(|c| matches!(c, Call::GrabKey { .. })).count();
    assert_eq!(key_grabs, wm.keyboard.bindings().len());
}

#[test]
fn protocol_errors_are_discarded_at_runtime() {
    let mut wm = manager(display());
    wm.handle_event(WmEvent::ProtocolError { kind: ErrorKind::Window, major_opcode: 12 }).unwrap();
    wm.handle_event(WmEvent::ProtocolError { kind: ErrorKind::Access, major_opcode: 2 }).unwrap();
    assert!(wm.is_running());
}

#[test]
fn start_leaves_the_startup_phase() {
    let mut policy = ErrorPolicy::startup();
    assert_eq!(policy.phase(), Phase::Startup);
    policy.finish_startup();
    assert_eq!(policy.phase(), Phase::Running);
}

#[test]
fn run_stops_after_quit() {
    let mut display = display();
    display.push_event(WmEvent::EnterNotify { window: ROOT });
    display.push_event(WmEvent::KeyPress { keycode: KEY_E, state: mod_key() | shift() });
    display.push_event(WmEvent::EnterNotify { window: ROOT });

    let mut wm = manager(display);
    wm.run().unwrap();

    assert!(!wm.is_running());
    // The event after quit is still queued
    let rest = wm.display_mut().next_event().unwrap();
    assert!(matches!(rest, WmEvent::EnterNotify { window: ROOT }));
    assert!(wm.display_mut().next_event().is_err());
}
