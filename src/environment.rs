use std::collections::HashMap;

use nalgebra::Vector3;

use crate::physics::body::{Body, R_EARTH_EQ};

// ---------------------------------------------------------------------------
// Named reference bodies: planet catalog, ground sites, geodesy helpers
// ---------------------------------------------------------------------------

/// Catalog of named reference bodies, passed by reference to whatever needs
/// it. Ground sites carry zero mass; celestial bodies carry their mass, which
/// is how reporting tells the two apart.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    entities: HashMap<String, Body>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Planet catalog plus the ground-site table.
    pub fn standard() -> Self {
        let mut env = Self::new();
        env.load_solar_system();
        env.load_global_cities();
        env
    }

    pub fn add(&mut self, name: &str, body: Body) {
        self.entities.insert(name.to_string(), body);
    }

    pub fn get(&self, name: &str) -> Option<&Body> {
        self.entities.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Body)> {
        self.entities.iter()
    }

    /// Closest zero-mass entity (ground site) to `pos`, with its distance.
    pub fn closest_site(&self, pos: &Vector3<f64>) -> Option<(&str, f64)> {
        self.entities
            .iter()
            .filter(|(_, b)| b.mass == 0.0)
            .map(|(n, b)| (n.as_str(), (pos - b.pos).norm()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn load_solar_system(&mut self) {
        let mut planet = |name: &str, x_km: f64, mass: f64| {
            self.entities.insert(
                name.to_string(),
                Body::new(Vector3::new(x_km, 0.0, 0.0), Vector3::zeros(), mass),
            );
        };
        // Static ECI snapshot along +X at a reference epoch
        planet("Earth", 0.0, 5.972e24);
        planet("Sun", -149_597_870.0, 1.9885e30);
        planet("Moon", 384_400.0, 7.342e22);
        planet("Mars", 227_939_200.0, 6.39e23);
        planet("Jupiter", 778_340_821.0, 1.898e27);
        planet("Io", 778_340_821.0 + 421_700.0, 8.93e22);
        planet("Europa", 778_340_821.0 + 671_034.0, 4.8e22);
        planet("Ganymede", 778_340_821.0 + 1_070_412.0, 1.48e23);
        planet("Callisto", 778_340_821.0 + 1_882_709.0, 1.08e23);
        planet("Saturn", 1_426_666_422.0, 5.683e26);
        planet("Uranus", 2_870_658_186.0, 8.681e25);
        planet("Neptune", 4_498_396_441.0, 1.024e26);
        planet("Pluto", 5_906_380_000.0, 1.309e22);
    }

    fn load_global_cities(&mut self) {
        for (name, lat, lon) in CITIES {
            let pos = lla_to_ecef(*lat, *lon, 0.0);
            self.entities.insert(name.to_string(), Body::fixed(pos));
        }
    }
}

/// Major cities, (name, latitude deg, longitude deg).
const CITIES: &[(&str, f64, f64)] = &[
    ("WashingtonDC", 38.9072, -77.0369),
    ("LosAngeles", 34.0522, -118.2437),
    ("NewYork", 40.7128, -74.0060),
    ("London", 51.5074, -0.1278),
    ("Tokyo", 35.6895, 139.6917),
    ("MexicoCity", 19.4326, -99.1332),
    ("Delhi", 28.7041, 77.1025),
    ("Dhaka", 23.8103, 90.4125),
    ("Cairo", 30.0444, 31.2357),
    ("Karachi", 24.8607, 67.0011),
    ("BuenosAires", -34.6037, -58.3816),
    ("Istanbul", 41.0082, 28.9784),
    ("Kolkata", 22.5726, 88.3639),
    ("Lagos", 6.5244, 3.3792),
    ("Manila", 14.5995, 120.9842),
    ("RioDeJaneiro", -22.9068, -43.1729),
    ("Tianjin", 39.3434, 117.3616),
    ("Kinshasa", -4.4419, 15.2663),
    ("Guangzhou", 23.1291, 113.2644),
    ("Moscow", 55.7558, 37.6173),
    ("Shenzhen", 22.5431, 114.0579),
    ("Lahore", 31.5204, 74.3587),
    ("Bangalore", 12.9716, 77.5946),
    ("Paris", 48.8566, 2.3522),
    ("Bogota", 4.7110, -74.0721),
    ("Jakarta", -6.2088, 106.8456),
    ("Chennai", 13.0827, 80.2707),
    ("Lima", -12.0464, -77.0428),
    ("Bangkok", 13.7563, 100.5018),
    ("Seoul", 37.5665, 126.9780),
    ("Nagoya", 35.1815, 136.9066),
    ("Hyderabad", 17.3850, 78.4867),
    ("Tehran", 35.6892, 51.3890),
    ("Chicago", 41.8781, -87.6298),
    ("Chengdu", 30.5728, 104.0668),
    ("Nanjing", 32.0603, 118.7969),
    ("Wuhan", 30.5928, 114.3055),
    ("HoChiMinhCity", 10.8231, 106.6297),
    ("Luanda", -8.8390, 13.2894),
    ("Ahmedabad", 23.0225, 72.5714),
    ("KualaLumpur", 3.1390, 101.6869),
    ("XiAn", 34.3416, 108.9398),
    ("HongKong", 22.3193, 114.1694),
    ("Dongguan", 23.0207, 113.7518),
    ("Hangzhou", 30.2741, 120.1551),
    ("Foshan", 23.0215, 113.1214),
    ("Shenyang", 41.8057, 123.4315),
    ("Riyadh", 24.7136, 46.6753),
    ("Baghdad", 33.3152, 44.3661),
];

/// Spherical-Earth geodetic to ECEF, km in and out.
pub fn lla_to_ecef(lat_deg: f64, lon_deg: f64, alt_km: f64) -> Vector3<f64> {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let r = R_EARTH_EQ + alt_km;
    Vector3::new(
        r * lat.cos() * lon.cos(),
        r * lat.cos() * lon.sin(),
        r * lat.sin(),
    )
}

pub fn ecef_lon_deg(pos: &Vector3<f64>) -> f64 {
    pos.y.atan2(pos.x).to_degrees()
}

/// Local solar time at a longitude, hours in [0, 24), from a GMST fit
/// anchored at J2000.
pub fn local_solar_time_hours(lon_deg: f64, jd: f64) -> f64 {
    let t = jd - 2_451_545.0;
    let gst = (18.697_374_558 + 24.065_709_824_419_08 * t) % 24.0;
    let lst = (gst + lon_deg / 15.0) % 24.0;
    if lst < 0.0 {
        lst + 24.0
    } else {
        lst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ecef_roundtrips_longitude() {
        let p = lla_to_ecef(0.0, 45.0, 0.0);
        assert_relative_eq!(ecef_lon_deg(&p), 45.0, epsilon = 1e-9);
        assert_relative_eq!(p.norm(), R_EARTH_EQ, epsilon = 1e-9);
    }

    #[test]
    fn poles_sit_on_the_spin_axis() {
        let p = lla_to_ecef(90.0, 0.0, 0.0);
        assert!(p.x.abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
        assert_relative_eq!(p.z, R_EARTH_EQ, epsilon = 1e-9);
    }

    #[test]
    fn solar_time_stays_in_range() {
        for lon in [-180.0, -77.0, 0.0, 139.7, 179.9] {
            for jd in [2_451_545.0, 2_451_545.25, 2_460_000.5] {
                let lst = local_solar_time_hours(lon, jd);
                assert!((0.0..24.0).contains(&lst), "lst {lst} out of range");
            }
        }
    }

    #[test]
    fn closest_site_ignores_massive_bodies() {
        let env = Environment::standard();
        // Directly above Washington DC
        let above_dc = lla_to_ecef(38.9072, -77.0369, 400.0);
        let (name, dist) = env.closest_site(&above_dc).unwrap();
        assert_eq!(name, "WashingtonDC");
        assert_relative_eq!(dist, 400.0, epsilon = 1e-6);
    }

    #[test]
    fn catalog_has_planets_and_cities() {
        let env = Environment::standard();
        assert!(env.get("Earth").is_some());
        assert!(env.get("Sun").is_some());
        assert!(env.get("Tokyo").is_some());
        assert!(env.get("Atlantis").is_none());
    }
}
