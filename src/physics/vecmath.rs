use nalgebra::Vector3;

/// Angle between two vectors in degrees. Returns 0 for zero-length input.
pub fn angle_between_deg(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let ma = a.norm();
    let mb = b.norm();
    if ma < 1e-12 || mb < 1e-12 {
        return 0.0;
    }
    let c = (a.dot(b) / (ma * mb)).clamp(-1.0, 1.0);
    c.acos().to_degrees()
}

/// Unit vector of `v`, or `fallback` when `v` is shorter than 1e-12.
pub fn unit_or(v: &Vector3<f64>, fallback: Vector3<f64>) -> Vector3<f64> {
    let n = v.norm();
    if n < 1e-12 {
        fallback
    } else {
        v / n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn right_angle() {
        let a = Vector3::new(1.0, 0.0, 0.0);
        let b = Vector3::new(0.0, 3.0, 0.0);
        assert_relative_eq!(angle_between_deg(&a, &b), 90.0, epsilon = 1e-10);
    }

    #[test]
    fn antiparallel() {
        let a = Vector3::new(2.0, 0.0, 0.0);
        let b = Vector3::new(-5.0, 0.0, 0.0);
        assert_relative_eq!(angle_between_deg(&a, &b), 180.0, epsilon = 1e-10);
    }

    #[test]
    fn unit_or_falls_back_on_zero() {
        let z = Vector3::zeros();
        let fb = Vector3::new(0.0, 0.0, 1.0);
        assert_eq!(unit_or(&z, fb), fb);
        let v = Vector3::new(0.0, 4.0, 0.0);
        assert_relative_eq!(unit_or(&v, fb).y, 1.0, epsilon = 1e-12);
    }
}
