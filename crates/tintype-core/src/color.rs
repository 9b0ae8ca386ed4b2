//! Small color-science helpers shared by the grading and texture stages.

/// Rec. 601 luma weights, the classic "video" luminance.
pub fn luminance(r: f64, g: f64, b: f64) -> f64 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Sepia target for a pixel of luminance `y`, in 0..=255 channel units.
///
/// These are the row sums of the standard sepia matrix applied to a gray
/// pixel: a warm tone that brightens red, keeps green near neutral and
/// pulls blue down.
pub fn sepia_target(y: f64) -> [f64; 3] {
    [
        (1.351 * y).min(255.0),
        (1.203 * y).min(255.0),
        (0.937 * y).min(255.0),
    ]
}

// ── Hue rotation ─────────────────────────────────────────────────────────
//
// RGB is taken to NTSC YIQ, the chroma plane (I, Q) is rotated by the
// requested angle, and the result is taken back to RGB:
//
//   ┌─────┐    ┌─────┐    ┌────────────┐    ┌─────┐    ┌─────┐
//   │ RGB │───>│ YIQ │───>│ rotate I,Q │───>│ YIQ │───>│ RGB │
//   └─────┘    └─────┘    └────────────┘    └─────┘    └─────┘
//
// The combined 3x3 is precomputed once per frame so per-pixel cost is a
// single matrix multiply.

const RGB_TO_YIQ: [f64; 9] = [
    0.299, 0.587, 0.114, //
    0.596, -0.274, -0.322, //
    0.211, -0.523, 0.312,
];

const YIQ_TO_RGB: [f64; 9] = [
    1.0, 0.956, 0.621, //
    1.0, -0.272, -0.647, //
    1.0, -1.106, 1.703,
];

fn mat_mul(a: &[f64; 9], b: &[f64; 9]) -> [f64; 9] {
    let mut out = [0.0; 9];
    for row in 0..3 {
        for col in 0..3 {
            out[row * 3 + col] = (0..3).map(|k| a[row * 3 + k] * b[k * 3 + col]).sum();
        }
    }
    out
}

/// Combined RGB -> RGB matrix rotating hue by `degrees` in YIQ space.
pub fn hue_rotate_matrix(degrees: f64) -> [f64; 9] {
    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    let rotate = [
        1.0, 0.0, 0.0, //
        0.0, cos, -sin, //
        0.0, sin, cos,
    ];
    mat_mul(&YIQ_TO_RGB, &mat_mul(&rotate, &RGB_TO_YIQ))
}

/// Apply a 3x3 color matrix to one RGB triple.
pub fn apply_matrix(m: &[f64; 9], r: f64, g: f64, b: f64) -> [f64; 3] {
    [
        m[0] * r + m[1] * g + m[2] * b,
        m[3] * r + m[4] * g + m[5] * b,
        m[6] * r + m[7] * g + m[8] * b,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luminance_weights_sum_to_one() {
        let y = luminance(1.0, 1.0, 1.0);
        assert!((y - 1.0).abs() < 1e-9, "weights should sum to 1, got {y}");
    }

    #[test]
    fn luminance_green_dominates() {
        assert!(luminance(0.0, 1.0, 0.0) > luminance(1.0, 0.0, 0.0));
        assert!(luminance(1.0, 0.0, 0.0) > luminance(0.0, 0.0, 1.0));
    }

    #[test]
    fn sepia_target_is_warm() {
        let [r, g, b] = sepia_target(128.0);
        assert!(r > g, "sepia should be warm: r={r} g={g}");
        assert!(g > b, "sepia should be warm: g={g} b={b}");
    }

    #[test]
    fn sepia_target_clamps_highlights() {
        let [r, g, b] = sepia_target(255.0);
        assert_eq!(r, 255.0);
        assert_eq!(g, 255.0);
        assert!(b < 255.0);
    }

    #[test]
    fn hue_matrix_zero_is_near_identity() {
        // The published YIQ constants are rounded, so the round trip is only
        // identity to ~3 decimal places.
        let m = hue_rotate_matrix(0.0);
        let identity = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        for (got, want) in m.iter().zip(identity.iter()) {
            assert!(
                (got - want).abs() < 5e-3,
                "expected near-identity, got {m:?}"
            );
        }
    }

    #[test]
    fn hue_rotation_preserves_gray() {
        // Gray has no chroma, so rotating I/Q must leave it alone.
        let m = hue_rotate_matrix(90.0);
        let [r, g, b] = apply_matrix(&m, 128.0, 128.0, 128.0);
        for v in [r, g, b] {
            assert!((v - 128.0).abs() < 1.0, "gray drifted to {v}");
        }
    }

    #[test]
    fn hue_rotation_preserves_luminance() {
        let m = hue_rotate_matrix(45.0);
        let [r, g, b] = apply_matrix(&m, 200.0, 80.0, 40.0);
        let before = luminance(200.0, 80.0, 40.0);
        let after = luminance(r, g, b);
        assert!(
            (before - after).abs() < 2.0,
            "luminance should survive hue rotation: {before} vs {after}"
        );
    }

    #[test]
    fn hue_rotation_moves_chroma() {
        let m = hue_rotate_matrix(120.0);
        let [r, _, _] = apply_matrix(&m, 255.0, 0.0, 0.0);
        assert!(r < 200.0, "pure red should shift away from red, got r={r}");
    }

    #[test]
    fn opposite_rotations_cancel() {
        let fwd = hue_rotate_matrix(30.0);
        let back = hue_rotate_matrix(-30.0);
        let [r, g, b] = apply_matrix(&fwd, 180.0, 90.0, 45.0);
        let [r2, g2, b2] = apply_matrix(&back, r, g, b);
        assert!((r2 - 180.0).abs() < 1.5, "r: {r2}");
        assert!((g2 - 90.0).abs() < 1.5, "g: {g2}");
        assert!((b2 - 45.0).abs() < 1.5, "b: {b2}");
    }
}
