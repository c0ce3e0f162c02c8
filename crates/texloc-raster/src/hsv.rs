//! RGB to HSV conversion and circular hue distance.

/// A color in HSV space, every component in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

/// Convert an 8-bit RGB pixel to HSV.
///
/// Gray pixels (including white and black) get hue 0 and saturation 0.
#[must_use]
pub fn rgb_to_hsv(rgb: [u8; 3]) -> Hsv {
    let [r, g, b] = rgb.map(|channel| f64::from(channel) / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max > 0.0 { delta / max } else { 0.0 };
    let hue = if delta <= 0.0 {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0) / 6.0
    } else if max == g {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };

    Hsv {
        hue: if hue >= 1.0 { 0.0 } else { hue },
        saturation,
        value: max,
    }
}

/// Distance between two hues on the unit hue wheel, at most 0.5.
#[inline]
#[must_use]
pub fn hue_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(1.0);
    d.min(1.0 - d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case([255, 0, 0], 0.0, 1.0, 1.0)]
    #[case([0, 255, 0], 1.0 / 3.0, 1.0, 1.0)]
    #[case([0, 0, 255], 2.0 / 3.0, 1.0, 1.0)]
    #[case([255, 0, 255], 5.0 / 6.0, 1.0, 1.0)]
    #[case([255, 255, 255], 0.0, 0.0, 1.0)]
    #[case([0, 0, 0], 0.0, 0.0, 0.0)]
    fn test_rgb_to_hsv(
        #[case] rgb: [u8; 3],
        #[case] hue: f64,
        #[case] saturation: f64,
        #[case] value: f64,
    ) {
        let hsv = rgb_to_hsv(rgb);
        assert!((hsv.hue - hue).abs() < 1e-9, "{hsv:?}");
        assert!((hsv.saturation - saturation).abs() < 1e-9);
        assert!((hsv.value - value).abs() < 1e-9);
    }

    #[test]
    fn test_hue_distance_wraps() {
        assert!((hue_distance(0.98, 0.01) - 0.03).abs() < 1e-12);
        assert!((hue_distance(0.01, 0.98) - 0.03).abs() < 1e-12);
        assert!((hue_distance(0.2, 0.7) - 0.5).abs() < 1e-12);
        assert_eq!(hue_distance(0.4, 0.4), 0.0);
    }
}
