use super::*;

#[test]
fn clock_scales_by_speed_percent() {
    let mut clock = AnimationClock::new();
    assert_eq!(clock.advance(0.5, 100.0), 0.5);
    assert_eq!(clock.advance(0.5, 200.0), 1.5);
    assert_eq!(clock.advance(1.0, 50.0), 2.0);
}

#[test]
fn clock_ignores_negative_speed_and_bad_dt() {
    let mut clock = AnimationClock::new();
    clock.advance(1.0, -300.0);
    clock.advance(f64::NAN, 100.0);
    clock.advance(-1.0, 100.0);
    assert_eq!(clock.t(), 0.0);
}

#[test]
fn paused_clock_holds_time_and_reset_rewinds() {
    let mut clock = AnimationClock::new();
    clock.advance(1.0, 100.0);
    clock.set_running(false);
    clock.advance(1.0, 100.0);
    assert_eq!(clock.t(), 1.0);
    assert!(!clock.is_running());

    clock.reset();
    assert_eq!(clock.t(), 0.0);
}
