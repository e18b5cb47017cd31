use std::f64::consts::TAU;

use super::*;
use crate::edges::{EdgeBackend, compute_edge_data};
use crate::grid::{Field2, to_grayscale};

fn ramp_grid(rows: usize, cols: usize) -> LuminanceGrid {
    LuminanceGrid::from_fn(rows, cols, |r, c| ((r * 7 + c * 3) % 11) as f32 / 10.0)
}

fn assert_in_range(g: &LuminanceGrid) {
    assert!(g.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
}

fn max_abs_diff(a: &LuminanceGrid, b: &LuminanceGrid) -> f32 {
    a.as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}

fn checker_source(w: u32, h: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            image::Rgb([200, 180, 160])
        } else {
            image::Rgb([30, 40, 50])
        }
    })
}

#[test]
fn every_mode_stays_in_range_and_keeps_shape() {
    let base = ramp_grid(12, 16);
    let target = LuminanceGrid::filled(12, 16, 0.9);
    let src = checker_source(64, 48);
    let edges = compute_edge_data(&to_grayscale(&src), EdgeBackend::Exact);
    let params = ModeParams {
        waves: WaveParams {
            amplitude: 2.0,
            contrast: 3.0,
            ..WaveParams::default()
        },
        ..ModeParams::default()
    };
    let input = DeformInput {
        morph_target: Some(&target),
        audio: AudioSignal::Bands(BandVector::splat(1.0)),
        source: Some(&src),
        edges: Some(&edges),
    };
    for mode in AnimationMode::ALL {
        let d = Deformer::select(mode, &params);
        for t in [0.0, 0.37, 5.0, 123.4] {
            let out = d.deform(&base, t, &input);
            assert_eq!(out.shape(), base.shape(), "{mode:?}");
            assert_in_range(&out);
        }
    }
}

#[test]
fn modes_are_pure_functions_of_their_inputs() {
    let base = ramp_grid(10, 10);
    let src = checker_source(40, 40);
    let input = DeformInput {
        audio: AudioSignal::Bands(BandVector::new([0.9, 0.8, 0.7, 0.6, 0.5, 0.9])),
        source: Some(&src),
        ..DeformInput::default()
    };
    let params = ModeParams {
        overlay: OverlayParams {
            sparkles: true,
            background: true,
            ..OverlayParams::default()
        },
        ..ModeParams::default()
    };
    for mode in AnimationMode::ALL {
        let d = Deformer::select(mode, &params);
        assert_eq!(d.deform(&base, 2.5, &input), d.deform(&base, 2.5, &input), "{mode:?}");
    }
}

#[test]
fn zero_amplitude_leaves_midgray_untouched() {
    let base = LuminanceGrid::filled(10, 10, 0.5);
    let p = WaveParams {
        amplitude: 0.0,
        ..WaveParams::default()
    };
    for t in [0.0, 1.0, 10.0] {
        assert_eq!(render_waves(&base, t, &p), base);
    }
}

#[test]
fn zero_speed_waves_repeat_with_the_cross_term_period() {
    let base = ramp_grid(9, 13);
    let p = WaveParams {
        speed_x: 0.0,
        speed_y: 0.0,
        ..WaveParams::default()
    };
    let period = TAU / CROSS_TERM_RATE;
    let a = render_waves(&base, 1.3, &p);
    let b = render_waves(&base, 1.3 + period, &p);
    assert!(max_abs_diff(&a, &b) < 1e-4);
}

#[test]
fn empty_grid_passes_through() {
    let base = LuminanceGrid::filled(0, 0, 0.0);
    assert_eq!(render_waves(&base, 1.0, &WaveParams::default()).shape(), (0, 0));
}

#[test]
fn morph_without_matching_target_is_waves() {
    let base = ramp_grid(8, 8);
    let p = WaveParams::default();
    let waves = render_waves(&base, 3.0, &p);
    assert_eq!(render_morph(&base, None, 3.0, &p), waves);
    let wrong = LuminanceGrid::filled(8, 9, 1.0);
    assert_eq!(render_morph(&base, Some(&wrong), 3.0, &p), waves);
}

#[test]
fn morph_blends_toward_the_target() {
    let base = LuminanceGrid::filled(8, 8, 0.0);
    let target = LuminanceGrid::filled(8, 8, 1.0);
    let p = WaveParams::default();
    // sin(0) = 0: halfway.
    let mid = render_morph(&base, Some(&target), 0.0, &p);
    assert!((mid.get(3, 3) - 0.5).abs() < 1e-6);
    // 0.8·t = π/2: fully at the target.
    let t = std::f64::consts::FRAC_PI_2 / 0.8;
    assert!((morph_mix(t) - 1.0).abs() < 1e-6);
    let full = render_morph(&base, Some(&target), t, &p);
    assert!((full.get(3, 3) - 1.0).abs() < 1e-6);
}

#[test]
fn silent_audio_is_plain_waves() {
    let base = ramp_grid(8, 8);
    let p = WaveParams::default();
    let waves = render_waves(&base, 0.8, &p);
    let silent = render_audio(&base, 0.8, &p, &AudioSignal::Scalar(0.0), DEFAULT_AUDIO_GAIN);
    assert_eq!(silent, waves);
}

#[test]
fn audio_level_scales_speed_and_amplitude() {
    let p = WaveParams::default();
    let boosted = audio_wave_params(&p, 1.0, 2.5);
    assert!((boosted.speed_x - p.speed_x * 2.2).abs() < 1e-6);
    assert!((boosted.speed_y - p.speed_y * 2.2).abs() < 1e-6);
    assert!((boosted.amplitude - p.amplitude * 3.5).abs() < 1e-6);
    assert_eq!(boosted.freq_x, p.freq_x);
}

#[test]
fn audio_signal_views() {
    assert_eq!(AudioSignal::default().level(), 0.0);
    assert_eq!(AudioSignal::Scalar(0.4).bands(), BandVector::splat(0.4));
    let bands = BandVector::new([0.0, 0.0, 0.0, 0.6, 0.6, 0.6]);
    assert!((AudioSignal::Bands(bands).level() - 0.3).abs() < 1e-6);
}

#[test]
fn contour_threshold_follows_sensitivity() {
    let mut p = ContourParams::default();
    assert!((p.threshold() - 0.085).abs() < 1e-6);
    p.edge_sensitivity = 1.0;
    assert!((p.threshold() - 0.05).abs() < 1e-6);
    p.edge_sensitivity = 0.0;
    assert!((p.threshold() - 0.1).abs() < 1e-6);
}

#[test]
fn contourswim_only_touches_edge_cells() {
    // Flat field: no edges, output equals input.
    let flat = LuminanceGrid::filled(10, 10, 0.4);
    let p = ContourParams::default();
    assert_eq!(render_contourswim(&flat, 1.0, &p, BlurBackend::Gaussian), flat);

    // A vertical step lights up only along the step.
    let step = LuminanceGrid::from_fn(10, 10, |_, c| if c < 5 { 0.2 } else { 0.6 });
    let out = render_contourswim(&step, 1.0, &p, BlurBackend::Box);
    for r in 0..10 {
        for c in [0, 1, 2, 7, 8, 9] {
            assert_eq!(out.get(r, c), step.get(r, c));
        }
        for c in [4, 5] {
            assert!(out.get(r, c) >= step.get(r, c));
        }
    }
}

#[test]
fn edge_strength_is_normalised_and_zero_on_borders() {
    let step = Field2::from_fn(6, 6, |_, c| if c < 3 { 0.0 } else { 1.0 });
    let e = local_edge_strength(&step, 0.3);
    assert!((e.max() - 1.0).abs() < 1e-6);
    for i in 0..6 {
        assert_eq!(e.get(0, i), 0.0);
        assert_eq!(e.get(5, i), 0.0);
        assert_eq!(e.get(i, 0), 0.0);
        assert_eq!(e.get(i, 5), 0.0);
    }
}

#[test]
fn audio_alt_without_source_returns_base() {
    let base = ramp_grid(8, 8);
    let d = Deformer::select(AnimationMode::AudioAlt, &ModeParams::default());
    let input = DeformInput {
        audio: AudioSignal::Scalar(1.0),
        ..DeformInput::default()
    };
    assert_eq!(d.deform(&base, 1.0, &input), base);
}

#[test]
fn audio_alt_silence_resamples_the_source() {
    let base = LuminanceGrid::filled(8, 8, 0.0);
    let src = RgbImage::from_pixel(32, 32, image::Rgb([255, 255, 255]));
    let out = render_audio_overlays(
        &base,
        Some(&src),
        None,
        &BandVector::ZERO,
        0.0,
        &OverlayParams::default(),
    );
    assert_eq!(out.shape(), (8, 8));
    assert!(out.as_slice().iter().all(|v| (v - 1.0).abs() < 1e-3));
}

#[test]
fn overlay_gain_is_neutral_without_signal() {
    let gain = overlay_gain(16, 12, None, &BandVector::ZERO, 3.0, &OverlayParams::default());
    assert_eq!(gain.shape(), (12, 16));
    assert!(gain.as_slice().iter().all(|&g| g == 1.0));
}

#[test]
fn mismatched_edges_are_ignored() {
    let src = checker_source(32, 32);
    let small = compute_edge_data(&Field2::new(4, 4, 0.0), EdgeBackend::Exact);
    let bands = BandVector::splat(0.8);
    let p = OverlayParams {
        breathing: false,
        ..OverlayParams::default()
    };
    let with = apply_audio_overlays(&src, Some(&small), &bands, 1.0, &p);
    let without = apply_audio_overlays(&src, None, &bands, 1.0, &p);
    assert_eq!(with, without);
    assert_eq!(without, src);
}

#[test]
fn select_binds_parameters_to_modes() {
    let params = ModeParams::default();
    for mode in AnimationMode::ALL {
        assert_eq!(Deformer::select(mode, &params).mode(), mode);
    }
    match Deformer::select(AnimationMode::Audio, &params) {
        Deformer::Audio { gain, .. } => assert_eq!(gain, DEFAULT_AUDIO_GAIN),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn mode_names_round_trip() {
    for mode in AnimationMode::ALL {
        assert_eq!(mode.name().parse::<AnimationMode>().unwrap(), mode);
        let json = serde_json::to_string(&mode).unwrap();
        assert_eq!(json, format!("\"{}\"", mode.name()));
    }
    assert!("spiral".parse::<AnimationMode>().is_err());
    assert!(AnimationMode::AudioAlt.uses_audio());
    assert!(!AnimationMode::ContourSwim.uses_audio());
}
