use serde::{Deserialize, Serialize};

/// WGS84 semi major axis (m)
pub const WGS84_SEMI_MAJOR_AXIS_M: f64 = 6_378_137.0;

/// WGS84 flattening
pub const WGS84_FLATTENING: f64 = 1.0 / 298.257_223_563;

/// WGS84 first eccentricity squared
const WGS84_E2: f64 = WGS84_FLATTENING * (2.0 - WGS84_FLATTENING);

/// ECEF (WGS84) [Position] in meters.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,
}

/// ECEF (WGS84) [Velocity] in meters per second.
/// Same layout as [Position], but a rate: both types never mix.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub x_m_s: f64,
    pub y_m_s: f64,
    pub z_m_s: f64,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "x={:.3}m y={:.3}m z={:.3}m",
            self.x_m, self.y_m, self.z_m
        )
    }
}

impl std::fmt::Display for Velocity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "vx={:.3}m/s vy={:.3}m/s vz={:.3}m/s",
            self.x_m_s, self.y_m_s, self.z_m_s
        )
    }
}

impl Position {
    /// Builds a new ECEF [Position]
    pub fn new(x_m: f64, y_m: f64, z_m: f64) -> Self {
        Self { x_m, y_m, z_m }
    }

    /// Builds a [Position] from geodetic coordinates:
    /// latitude and longitude in decimal degrees, height above the ellipsoid in meters.
    pub fn from_geodetic(lat_deg: f64, lon_deg: f64, height_m: f64) -> Self {
        let (lat, lon) = (lat_deg.to_radians(), lon_deg.to_radians());
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();

        let n = WGS84_SEMI_MAJOR_AXIS_M / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

        Self {
            x_m: (n + height_m) * cos_lat * cos_lon,
            y_m: (n + height_m) * cos_lat * sin_lon,
            z_m: (n * (1.0 - WGS84_E2) + height_m) * sin_lat,
        }
    }

    /// Converts to geodetic (latitude °, longitude °, ellipsoidal height m).
    pub fn to_geodetic(&self) -> (f64, f64, f64) {
        let p = self.x_m.hypot(self.y_m);
        let lon = self.y_m.atan2(self.x_m);

        if p < 1.0E-9 {
            // polar axis
            let b = WGS84_SEMI_MAJOR_AXIS_M * (1.0 - WGS84_FLATTENING);
            let lat = if self.z_m < 0.0 { -90.0 } else { 90.0 };
            return (lat, lon.to_degrees(), self.z_m.abs() - b);
        }

        let mut lat = self.z_m.atan2(p * (1.0 - WGS84_E2));
        let mut height = 0.0;

        for _ in 0..8 {
            let sin_lat = lat.sin();
            let n = WGS84_SEMI_MAJOR_AXIS_M / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
            height = p / lat.cos() - n;
            lat = self.z_m.atan2(p * (1.0 - WGS84_E2 * n / (n + height)));
        }

        (lat.to_degrees(), lon.to_degrees(), height)
    }

    /// Euclidean distance to other [Position], in meters.
    pub fn distance(&self, rhs: &Self) -> f64 {
        let (dx, dy, dz) = (
            self.x_m - rhs.x_m,
            self.y_m - rhs.y_m,
            self.z_m - rhs.z_m,
        );
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl Velocity {
    /// Builds a new ECEF [Velocity]
    pub fn new(x_m_s: f64, y_m_s: f64, z_m_s: f64) -> Self {
        Self {
            x_m_s,
            y_m_s,
            z_m_s,
        }
    }

    /// Rotates local North/East/Down rates (m/s) observed at given
    /// geodetic location (decimal degrees) to ECEF.
    pub fn from_ned(lat_deg: f64, lon_deg: f64, north: f64, east: f64, down: f64) -> Self {
        let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();

        Self {
            x_m_s: -sin_lat * cos_lon * north - sin_lon * east - cos_lat * cos_lon * down,
            y_m_s: -sin_lat * sin_lon * north + cos_lon * east - cos_lat * sin_lon * down,
            z_m_s: cos_lat * north - sin_lat * down,
        }
    }

    /// Rotates this [Velocity] to local (North, East, Down) rates at given location.
    pub fn to_ned(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64, f64) {
        let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();
        let (vx, vy, vz) = (self.x_m_s, self.y_m_s, self.z_m_s);

        (
            -sin_lat * cos_lon * vx - sin_lat * sin_lon * vy + cos_lat * vz,
            -sin_lon * vx + cos_lon * vy,
            -cos_lat * cos_lon * vx - cos_lat * sin_lon * vy - sin_lat * vz,
        )
    }

    /// Norm of this [Velocity] (m/s)
    pub fn speed(&self) -> f64 {
        (self.x_m_s * self.x_m_s + self.y_m_s * self.y_m_s + self.z_m_s * self.z_m_s).sqrt()
    }
}
