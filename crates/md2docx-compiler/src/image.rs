//! Image sizing.

/// EMU per intrinsic pixel. Each pixel is laid out as one point.
pub const EMU_PER_PIXEL: i64 = 12_700;

/// Scale `(width, height)` down uniformly so the width fits `available`.
///
/// Images that already fit keep their intrinsic size.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
#[must_use]
pub fn fit_image(width: i64, height: i64, available: i64) -> (i64, i64) {
    if width <= available || width <= 0 {
        return (width, height);
    }
    let scale = available as f64 / width as f64;
    (available, (height as f64 * scale).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wide_image_is_scaled() {
        assert_eq!(fit_image(2000, 1000, 1000), (1000, 500));
    }

    #[test]
    fn test_narrow_image_is_kept() {
        assert_eq!(fit_image(200, 100, 1000), (200, 100));
        assert_eq!(fit_image(1000, 300, 1000), (1000, 300));
    }
}
