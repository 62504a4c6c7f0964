use crate::{
    nmea_sentences::{Gga, Rmc},
    ubx_packets::NavHpPosLlh,
    unicore_packets::BestNav,
};

/// Knots to m/s
const KNOTS: f64 = 1852.0 / 3600.0;

/// Represents a world position, can be constructed from GGA, NAV-HPPOSLLH and BESTNAV records.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Longitude in degrees
    pub lon: f64,

    /// Latitude in degrees
    pub lat: f64,

    /// Altitude above mean sea level in meters
    pub alt: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Velocity {
    /// m/s over the ground
    pub speed: f64,

    /// Heading in degrees
    pub heading: f64,
}

impl From<&Gga> for Position {
    fn from(gga: &Gga) -> Self {
        Position {
            lon: gga.longitude(),
            lat: gga.latitude(),
            alt: f64::from(gga.alt),
        }
    }
}

impl From<&NavHpPosLlh> for Position {
    fn from(packet: &NavHpPosLlh) -> Self {
        Position {
            lon: packet.lon_degrees(),
            lat: packet.lat_degrees(),
            alt: packet.height_msl_meters(),
        }
    }
}

impl From<&BestNav> for Position {
    fn from(nav: &BestNav) -> Self {
        Position {
            lon: nav.lon,
            lat: nav.lat,
            alt: nav.height,
        }
    }
}

impl From<&Rmc> for Velocity {
    fn from(rmc: &Rmc) -> Self {
        Velocity {
            speed: f64::from(rmc.speed_knots) * KNOTS,
            heading: f64::from(rmc.course),
        }
    }
}

impl From<&BestNav> for Velocity {
    fn from(nav: &BestNav) -> Self {
        Velocity {
            speed: nav.hor_speed,
            heading: nav.trk_gnd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_from_gga_is_signed() {
        let gga = Gga {
            lat: 33.5,
            ns: Some('S'),
            lon: 70.25,
            ew: Some('W'),
            alt: 520.0,
            ..Gga::default()
        };
        assert_eq!(
            Position::from(&gga),
            Position {
                lon: -70.25,
                lat: -33.5,
                alt: 520.0
            }
        );
    }

    #[test]
    fn velocity_from_rmc_in_meters_per_second() {
        let rmc = Rmc {
            speed_knots: 10.0,
            course: 90.0,
            ..Rmc::default()
        };
        let v = Velocity::from(&rmc);
        assert!((v.speed - 5.144_444).abs() < 1e-6);
        assert_eq!(v.heading, 90.0);
    }
}
