//! Small 3D vector helpers and the rotation that aligns one direction onto
//! another. This is what orients the square sensor markers to the normal of
//! the tile they sit on.
//!
//! The rotation is the closed form of Rodrigues' formula for mapping a unit
//! vector `a` onto a unit vector `b`:
//!
//! ```text
//! R = I + K + K^2 / (1 + a.b)
//! ```
//!
//! where `K` is the skew-symmetric cross-product matrix of `a x b`.

/// A point or direction in room coordinates, in meters.
pub type Vec3 = [f64; 3];

/// A row-major 3x3 matrix.
pub type Mat3 = [[f64; 3]; 3];

/// The 3x3 identity matrix.
pub const IDENTITY: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Dot product of two vectors.
pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Cross product `a x b`.
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Euclidean length of a vector.
pub fn norm(v: Vec3) -> f64 {
    dot(v, v).sqrt()
}

/// Euclidean distance between two points.
pub fn distance(a: Vec3, b: Vec3) -> f64 {
    norm([a[0] - b[0], a[1] - b[1], a[2] - b[2]])
}

/// Scales `v` to unit length. A zero-length vector is returned as-is rather
/// than producing NaNs.
pub fn normalize(v: Vec3) -> Vec3 {
    let n = norm(v);
    if n == 0.0 {
        return v;
    }
    [v[0] / n, v[1] / n, v[2] / n]
}

/// The skew-symmetric matrix `K` such that `K * x == v x x`.
pub fn skew(v: Vec3) -> Mat3 {
    [[0.0, -v[2], v[1]], [v[2], 0.0, -v[0]], [-v[1], v[0], 0.0]]
}

/// Matrix-vector product.
pub fn mat_vec(m: &Mat3, v: Vec3) -> Vec3 {
    [dot(m[0], v), dot(m[1], v), dot(m[2], v)]
}

fn mat_mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Returns the rotation matrix that takes the direction of `default` onto the
/// direction of `target`. Inputs need not be unit length.
///
/// Exactly antiparallel inputs (`default . target == -1`) yield the
/// identity, not a half turn. Callers that place markers on tiles facing
/// away from the reference normal get an unrotated marker.
pub fn rotation_aligning(default: Vec3, target: Vec3) -> Mat3 {
    let a = normalize(default);
    let b = normalize(target);
    let d = dot(a, b);

    if d == -1.0 {
        return IDENTITY;
    }

    let k = skew(cross(a, b));
    let k2 = mat_mul(&k, &k);
    let c = 1.0 / (1.0 + d);

    let mut r = IDENTITY;
    for i in 0..3 {
        for j in 0..3 {
            r[i][j] += k[i][j] + k2[i][j] * c;
        }
    }
    r
}

/// Applies `m` to every point, keeping their order.
pub fn apply(m: &Mat3, points: &[Vec3]) -> Vec<Vec3> {
    points.iter().map(|&p| mat_vec(m, p)).collect()
}

/// Adds `offset` to every point.
pub fn translate(points: &[Vec3], offset: Vec3) -> Vec<Vec3> {
    points
        .iter()
        .map(|p| [p[0] + offset[0], p[1] + offset[1], p[2] + offset[2]])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::distributions::{Distribution, Uniform};

    const EPS: f64 = 1e-9;

    fn close(a: Vec3, b: Vec3) -> bool {
        distance(a, b) < EPS
    }

    fn mat_close(a: &Mat3, b: &Mat3) -> bool {
        a.iter()
            .flatten()
            .zip(b.iter().flatten())
            .all(|(x, y)| (x - y).abs() < EPS)
    }

    fn random_unit(rng: &mut impl rand::Rng) -> Vec3 {
        let dist = Uniform::new(-1.0, 1.0);
        loop {
            let v = [dist.sample(rng), dist.sample(rng), dist.sample(rng)];
            if norm(v) > 0.1 {
                return normalize(v);
            }
        }
    }

    #[test]
    fn normalize_gives_unit_length() {
        let mut rng = rand::thread_rng();
        let dist = Uniform::new(-50.0, 50.0);
        for _ in 0..100 {
            let v = [dist.sample(&mut rng), dist.sample(&mut rng), dist.sample(&mut rng)];
            assert!((norm(normalize(v)) - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn normalize_zero_vector() {
        assert_eq!(normalize([0.0, 0.0, 0.0]), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn aligning_with_itself_is_identity() {
        let v = [0.3, -1.2, 2.0];
        assert!(mat_close(&rotation_aligning(v, v), &IDENTITY));
    }

    #[test]
    fn antiparallel_is_identity() {
        let r = rotation_aligning([0.0, 1.0, 0.0], [0.0, -1.0, 0.0]);
        assert_eq!(r, IDENTITY);
    }

    #[test]
    fn rotates_default_onto_target() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let a = random_unit(&mut rng);
            let b = random_unit(&mut rng);
            if dot(a, b).abs() > 0.999 {
                continue;
            }
            let r = rotation_aligning(a, b);
            assert!(distance(mat_vec(&r, a), b) < 1e-6);
        }
    }

    #[test]
    fn apply_identity_is_noop() {
        let pts = vec![[1.0, 2.0, 3.0], [-4.0, 0.5, 0.0]];
        assert_eq!(apply(&IDENTITY, &pts), pts);
    }

    #[test]
    fn rotation_preserves_outline_distances() {
        let s = 0.1;
        let outline = [
            [0.0, 0.0, 0.0],
            [0.0, 0.0, s],
            [s, 0.0, s],
            [s, 0.0, 0.0],
            [0.0, 0.0, 0.0],
        ];
        let r = rotation_aligning([0.0, 1.0, 0.0], [0.4, 0.1, -0.9]);
        let rotated = apply(&r, &outline);
        assert_eq!(rotated.len(), outline.len());
        for i in 0..outline.len() {
            for j in 0..outline.len() {
                let before = distance(outline[i], outline[j]);
                let after = distance(rotated[i], rotated[j]);
                assert!((before - after).abs() < EPS);
            }
        }
    }

    #[test]
    fn y_to_z_keeps_x_axis_fixed() {
        let r = rotation_aligning([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]);
        assert!(close(mat_vec(&r, [0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]));
        assert!(close(mat_vec(&r, [1.0, 0.0, 0.0]), [1.0, 0.0, 0.0]));
    }

    #[test]
    fn unnormalized_inputs() {
        let r = rotation_aligning([0.0, 5.0, 0.0], [3.0, 0.0, 0.0]);
        assert!(close(mat_vec(&r, [0.0, 1.0, 0.0]), [1.0, 0.0, 0.0]));
    }

    #[test]
    fn translate_offsets_points() {
        let moved = translate(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]], [1.0, 2.0, 3.0]);
        assert_eq!(moved, vec![[1.0, 2.0, 3.0], [2.0, 3.0, 4.0]]);
    }
}
