//! End-to-end behaviour of the navigator against in-memory seams.

use snap_site::navigator::testing::{ManualClock, MemorySurface};
use snap_site::{Checkpoint, CheckpointList, Clock, DeltaMode, NavEvent, SnapConfig, SnapNavigator, WheelInput};

type Nav = SnapNavigator<MemorySurface, ManualClock>;

const FRAME_MS: f64 = 16.0;

fn page() -> Vec<Checkpoint> {
    vec![
        Checkpoint::new("home", 0.0),
        Checkpoint::new("2", 800.0),
        Checkpoint::new("4", 1600.0),
        Checkpoint::new("end", 2400.0),
    ]
}

fn navigator() -> (Nav, ManualClock) {
    let clock = ManualClock::starting_at(50_000.0);
    let nav = SnapNavigator::new(SnapConfig::default(), MemorySurface::at(0.0), clock.clone(), page());
    (nav, clock)
}

fn settle(nav: &mut Nav, clock: &ManualClock) {
    for _ in 0..60 {
        clock.advance(FRAME_MS);
        nav.tick(clock.now());
    }
}

fn mouse_down() -> WheelInput {
    WheelInput::vertical(100.0, DeltaMode::Pixel)
}

fn transitions_started(events: &[NavEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, NavEvent::TransitionStarted { .. }))
        .count()
}

#[test]
fn wheel_down_moves_to_the_next_section() {
    let (mut nav, clock) = navigator();
    assert_eq!(nav.current_index(), 0);

    assert!(nav.handle_wheel(mouse_down()));
    settle(&mut nav, &clock);

    assert_eq!(nav.current_index(), 1);
    assert_eq!(nav.surface().offset, 800.0);
}

#[test]
fn navigate_to_end_skips_intermediate_sections() {
    let (mut nav, clock) = navigator();
    nav.navigate_to("end").unwrap();
    settle(&mut nav, &clock);

    assert_eq!(nav.current_index(), 3);
    assert_eq!(nav.surface().offset, 2400.0);
    let events = nav.drain_events();
    assert!(events.contains(&NavEvent::CheckpointChanged {
        index: 3,
        id: "end".into()
    }));
}

#[test]
fn wheel_burst_within_cooldown_makes_one_transition() {
    let (mut nav, clock) = navigator();
    nav.handle_wheel(mouse_down());
    clock.advance(200.0);
    nav.handle_wheel(mouse_down());
    for _ in 0..30 {
        clock.advance(FRAME_MS);
        nav.tick(clock.now());
    }
    // transition finished but the cooldown has not elapsed
    assert!(!nav.is_animating());
    assert!(!nav.can_snap());
    nav.handle_wheel(mouse_down());
    settle(&mut nav, &clock);

    assert_eq!(transitions_started(&nav.drain_events()), 1);
    assert_eq!(nav.current_index(), 1);
}

#[test]
fn upward_flick_steps_to_next_section() {
    let (mut nav, clock) = navigator();
    let t0 = clock.now();
    nav.touch_start(1, 500.0);
    clock.set(t0 + 75.0);
    nav.touch_move(1, 475.0);
    clock.set(t0 + 150.0);
    nav.touch_move(1, 450.0);

    assert!(nav.touch_end());
    settle(&mut nav, &clock);
    assert_eq!(nav.current_index(), 1);
    assert_eq!(nav.surface().offset, 800.0);
}

#[test]
fn slow_drag_is_not_a_flick() {
    let (mut nav, clock) = navigator();
    let t0 = clock.now();
    nav.touch_start(1, 500.0);
    clock.set(t0 + 200.0);
    nav.touch_move(1, 490.0);
    clock.set(t0 + 400.0);
    nav.touch_move(1, 480.0);

    assert!(!nav.touch_end());
    assert!(!nav.is_animating());
    assert_eq!(nav.current_index(), 0);
}

#[test]
fn ordering_is_independent_of_markup_order() {
    let expected = vec!["home", "1", "2", "10", "about", "end"];
    let mut items: Vec<Checkpoint> = expected
        .iter()
        .enumerate()
        .map(|(i, id)| Checkpoint::new(*id, i as f64 * 100.0))
        .collect();
    for _ in 0..items.len() {
        items.rotate_left(1);
        let list = CheckpointList::new(items.clone());
        assert_eq!(list.ids(), expected);
    }
    items.reverse();
    assert_eq!(CheckpointList::new(items).ids(), expected);
}

#[test]
fn energy_decays_geometrically_until_negligible() {
    let (mut nav, clock) = navigator();
    nav.handle_wheel(WheelInput::vertical(30.0, DeltaMode::Pixel));
    assert!(nav.is_trackpad());
    let initial = nav.scroll_energy();
    assert_eq!(initial, 30.0);

    let rate = nav.config().decay_rate;
    for n in 1..=20 {
        clock.advance(FRAME_MS);
        nav.tick(clock.now());
        let expected = initial * rate.powi(n);
        assert!((nav.scroll_energy() - expected).abs() < 1e-9, "frame {}", n);
    }
    settle(&mut nav, &clock);
    assert_eq!(nav.scroll_energy(), 0.0);
}
