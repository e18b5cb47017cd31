use super::*;
use crate::config::AnimatorConfig;

fn session() -> RenderSession {
    let mut cfg = AnimatorConfig::default();
    cfg.grid.cols = Some(8);
    cfg.grid.rows = Some(8);
    cfg.font.px = 8.0;
    let mut s = RenderSession::new(cfg);
    s.generate_pattern(32, 32, 3, 0.5, 1).unwrap();
    s
}

#[test]
fn fast_renders_never_drop_frames() {
    let mut sched = PreviewScheduler::default();
    let mut s = session();
    for _ in 0..10 {
        assert_eq!(sched.on_tick(&mut s), TickDecision::Render);
        sched.record_render(Duration::from_millis(5));
    }
    assert_eq!(sched.stats().rendered, 10);
    assert_eq!(sched.stats().skipped, 0);
}

#[test]
fn slow_render_skips_every_other_tick_until_recovered() {
    let mut sched = PreviewScheduler::default();
    let mut s = session();

    assert_eq!(sched.on_tick(&mut s), TickDecision::Render);
    sched.record_render(Duration::from_millis(80));
    assert!(sched.is_dropping_frames());

    assert_eq!(sched.on_tick(&mut s), TickDecision::Skip);
    assert_eq!(sched.on_tick(&mut s), TickDecision::Render);
    // Between the thresholds: stay in frame-drop mode.
    sched.record_render(Duration::from_millis(40));
    assert!(sched.is_dropping_frames());
    assert_eq!(sched.on_tick(&mut s), TickDecision::Skip);
    assert_eq!(sched.on_tick(&mut s), TickDecision::Render);

    sched.record_render(Duration::from_millis(10));
    assert!(!sched.is_dropping_frames());
    assert_eq!(sched.on_tick(&mut s), TickDecision::Render);
    assert_eq!(sched.on_tick(&mut s), TickDecision::Render);

    let stats = sched.stats();
    assert_eq!(stats.ticks, 7);
    assert_eq!(stats.skipped, 2);
}

#[test]
fn clock_advances_on_skipped_ticks() {
    let mut sched = PreviewScheduler::new(10.0);
    let mut s = session();
    sched.on_tick(&mut s);
    sched.record_render(Duration::from_millis(100));
    assert_eq!(sched.on_tick(&mut s), TickDecision::Skip);
    assert!((s.clock().t() - 0.2).abs() < 1e-12);
}

#[test]
fn invalid_tick_rate_falls_back_to_default() {
    let sched = PreviewScheduler::new(0.0);
    assert!((sched.base_dt() - 1.0 / PREVIEW_TICK_HZ).abs() < 1e-12);
}

struct CountingDisplay {
    frames: usize,
    stop_after: usize,
    stop: CancelToken,
    last_t: f64,
}

impl PreviewDisplay for CountingDisplay {
    fn show(&mut self, frame: &RgbImage, t: f64) -> GlyphwaveResult<()> {
        assert!(frame.width() > 0 && frame.height() > 0);
        assert!(t >= self.last_t);
        self.last_t = t;
        self.frames += 1;
        if self.frames >= self.stop_after {
            self.stop.cancel();
        }
        Ok(())
    }
}

#[test]
fn preview_loop_runs_until_stopped() {
    let mut s = session();
    let stop = CancelToken::new();
    let mut display = CountingDisplay {
        frames: 0,
        stop_after: 3,
        stop: stop.clone(),
        last_t: 0.0,
    };
    let mut preview = PreviewLoop::new(PreviewScheduler::new(200.0));
    let stats = preview.run(&mut s, &mut display, &stop).unwrap();
    assert_eq!(display.frames, 3);
    assert!(stats.rendered >= 3);
    assert!(s.clock().t() > 0.0);
}

#[test]
fn preview_loop_survives_render_errors() {
    let mut s = RenderSession::new(AnimatorConfig::default());
    let stop = CancelToken::new();
    struct Never;
    impl PreviewDisplay for Never {
        fn show(&mut self, _: &RgbImage, _: f64) -> GlyphwaveResult<()> {
            panic!("nothing should render without a source image");
        }
    }
    let mut preview = PreviewLoop::new(PreviewScheduler::new(500.0));
    let handle_stop = stop.clone();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(30));
        handle_stop.cancel();
    });
    let stats = preview.run(&mut s, &mut Never, &stop).unwrap();
    stopper.join().unwrap();
    assert!(stats.ticks > 0);
}
