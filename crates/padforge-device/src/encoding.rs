//! Conversions between normalized control values and the driver's wire format.

/// Lowest raw axis value.
pub const AXIS_MIN: i32 = 0;
/// Highest raw axis value.
pub const AXIS_MAX: i32 = 32767;
/// Raw value of a centered axis, `encode_axis(0.0)`.
pub const AXIS_CENTER: i32 = 16384;
/// Raw value of a centered POV hat, discrete or continuous.
pub const POV_NEUTRAL: i32 = -1;

/// Map a normalized axis value in `[-1.0, 1.0]` onto `[AXIS_MIN, AXIS_MAX]`.
///
/// `round((value + 1) * 0.5 * 32767)` clamped into range. NaN encodes as
/// [`AXIS_CENTER`].
#[inline]
pub fn encode_axis(value: f32) -> i32 {
    if value.is_nan() {
        return AXIS_CENTER;
    }
    let scaled = ((f64::from(value) + 1.0) * 0.5 * f64::from(AXIS_MAX)).round();
    scaled.clamp(f64::from(AXIS_MIN), f64::from(AXIS_MAX)) as i32
}

/// Inverse of [`encode_axis`], up to rounding.
#[inline]
pub fn decode_axis(raw: i32) -> f32 {
    let raw = raw.clamp(AXIS_MIN, AXIS_MAX);
    (f64::from(raw) / f64::from(AXIS_MAX) * 2.0 - 1.0) as f32
}

/// Encode a continuous POV angle in degrees as hundredths of a degree.
/// Negative angles (and NaN) mean neutral.
#[inline]
pub fn encode_continuous_pov(angle_degrees: f32) -> i32 {
    if angle_degrees.is_nan() || angle_degrees < 0.0 {
        return POV_NEUTRAL;
    }
    (f64::from(angle_degrees) * 100.0).round() as i32
}

/// Degrees for a raw continuous POV value, `None` when neutral.
#[inline]
pub fn decode_continuous_pov(raw: i32) -> Option<f32> {
    if raw < 0 {
        None
    } else {
        Some(raw as f32 / 100.0)
    }
}
