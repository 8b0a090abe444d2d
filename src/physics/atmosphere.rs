/// Exponential atmosphere density, kg/m^3.
///
/// Scale height 8.5 km, sea-level density 1.225 kg/m^3, vacuum above 100 km.
/// `altitude_m` is geometric altitude in meters; negative values clamp to 0.
pub fn air_density(altitude_m: f64) -> f64 {
    let h = altitude_m.max(0.0);
    if h > 100_000.0 {
        return 0.0;
    }
    1.225 * (-h / 8_500.0).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sea_level_density() {
        assert_relative_eq!(air_density(0.0), 1.225, epsilon = 1e-12);
        assert_relative_eq!(air_density(-100.0), 1.225, epsilon = 1e-12);
    }

    #[test]
    fn one_scale_height() {
        assert_relative_eq!(air_density(8_500.0), 1.225 / std::f64::consts::E, epsilon = 1e-9);
    }

    #[test]
    fn vacuum_above_karman() {
        assert_eq!(air_density(150_000.0), 0.0);
    }
}
