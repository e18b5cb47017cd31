use super::*;

#[test]
fn clamp01_handles_nan_and_bounds() {
    assert_eq!(clamp01(f32::NAN), 0.0);
    assert_eq!(clamp01(-3.0), 0.0);
    assert_eq!(clamp01(7.0), 1.0);
    assert_eq!(clamp01(0.25), 0.25);
}

#[test]
fn blend_u8_endpoints() {
    assert_eq!(blend_u8(10, 200, 0), 10);
    assert_eq!(blend_u8(10, 200, 255), 200);
    let mid = blend_u8(0, 255, 128);
    assert!((127..=129).contains(&mid));
}

#[test]
fn to_u8_saturates() {
    assert_eq!(to_u8(-4.0), 0);
    assert_eq!(to_u8(300.0), 255);
    assert_eq!(to_u8(12.6), 13);
}

#[test]
fn lerp_midpoint() {
    assert_eq!(lerp(2.0, 4.0, 0.5), 3.0);
}
