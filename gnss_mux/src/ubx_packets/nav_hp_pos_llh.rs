use super::{UbxPacketMeta, UBX_CLASS_NAV};
use crate::bytes::{i32_le, i8_at, u32_le};

/// High Precision Geodetic Position Solution
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavHpPosLlh {
    /// Message version (0 for protocol version 27)
    pub version: u8,
    pub flags: NavHpPosLlhFlags,
    /// GPS Millisecond Time of Week
    pub itow: u32,
    /// Longitude [deg * 1e-7]
    pub lon: i32,
    /// Latitude [deg * 1e-7]
    pub lat: i32,
    /// Height above Ellipsoid [mm]
    pub height: i32,
    /// Height above mean sea level [mm]
    pub height_msl: i32,
    /// High precision component of longitude
    /// Must be in the range -99..+99
    /// Precise longitude in deg * 1e-7 = lon + (lonHp * 1e-2)
    pub lon_hp: i8,
    /// High precision component of latitude
    /// Must be in the range -99..+99
    /// Precise latitude in deg * 1e-7 = lat + (latHp * 1e-2)
    pub lat_hp: i8,
    /// High precision component of height above ellipsoid
    /// Must be in the range -9..+9
    /// Precise height in mm = height + (heightHp * 0.1)
    pub height_hp: i8,
    /// High precision component of height above mean sea level
    /// Must be in range -9..+9
    /// Precise height in mm = hMSL + (hMSLHp * 0.1)
    pub height_msl_hp: i8,
    /// Horizontal accuracy estimate [0.1 mm]
    pub horizontal_accuracy: u32,
    /// Vertical accuracy estimate [0.1 mm]
    pub vertical_accuracy: u32,
}

impl UbxPacketMeta for NavHpPosLlh {
    const CLASS: u8 = UBX_CLASS_NAV;
    const ID: u8 = 0x14;
    const FIXED_PAYLOAD_LEN: Option<u16> = Some(36);
}

impl NavHpPosLlh {
    pub fn from_payload(p: &[u8]) -> Option<Self> {
        if p.len() != 36 {
            return None;
        }
        Some(Self {
            version: p[0],
            flags: NavHpPosLlhFlags(p[3]),
            itow: u32_le(p, 4),
            lon: i32_le(p, 8),
            lat: i32_le(p, 12),
            height: i32_le(p, 16),
            height_msl: i32_le(p, 20),
            lon_hp: i8_at(p, 24),
            lat_hp: i8_at(p, 25),
            height_hp: i8_at(p, 26),
            height_msl_hp: i8_at(p, 27),
            horizontal_accuracy: u32_le(p, 28),
            vertical_accuracy: u32_le(p, 32),
        })
    }

    /// Longitude combining the standard and high precision parts [deg]
    pub fn lon_degrees(&self) -> f64 {
        f64::from(self.lon) * 1e-7 + f64::from(self.lon_hp) * 1e-9
    }

    /// Latitude combining the standard and high precision parts [deg]
    pub fn lat_degrees(&self) -> f64 {
        f64::from(self.lat) * 1e-7 + f64::from(self.lat_hp) * 1e-9
    }

    /// Height above ellipsoid [m]
    pub fn height_meters(&self) -> f64 {
        (f64::from(self.height) + f64::from(self.height_hp) * 0.1) * 1e-3
    }

    /// Height above mean sea level [m]
    pub fn height_msl_meters(&self) -> f64 {
        (f64::from(self.height_msl) + f64::from(self.height_msl_hp) * 0.1) * 1e-3
    }

    /// Horizontal accuracy estimate [m]
    pub fn horizontal_accuracy_meters(&self) -> f64 {
        f64::from(self.horizontal_accuracy) * 1e-4
    }

    /// Vertical accuracy estimate [m]
    pub fn vertical_accuracy_meters(&self) -> f64 {
        f64::from(self.vertical_accuracy) * 1e-4
    }
}

#[repr(transparent)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavHpPosLlhFlags(u8);

impl NavHpPosLlhFlags {
    /// 1 = Invalid lon, lat, height, hMSL, lonHp, latHp, heightHp and hMSLHp
    pub fn invalid_llh(&self) -> bool {
        self.0 & 0x01 == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> [u8; 36] {
        let mut p = [0u8; 36];
        p[3] = 0x01;
        p[4..8].copy_from_slice(&1000u32.to_le_bytes());
        p[8..12].copy_from_slice(&85652650i32.to_le_bytes());
        p[12..16].copy_from_slice(&472852331i32.to_le_bytes());
        p[16..20].copy_from_slice(&548100i32.to_le_bytes());
        p[20..24].copy_from_slice(&499600i32.to_le_bytes());
        p[24] = (-5i8) as u8;
        p[25] = 66;
        p[26] = 3;
        p[27] = (-2i8) as u8;
        p[28..32].copy_from_slice(&140u32.to_le_bytes());
        p[32..36].copy_from_slice(&210u32.to_le_bytes());
        p
    }

    #[test]
    fn decode_fields() {
        let pos = NavHpPosLlh::from_payload(&payload()).unwrap();
        assert!(pos.flags.invalid_llh());
        assert_eq!(pos.itow, 1000);
        assert_eq!(pos.lon_hp, -5);
        assert_eq!(pos.height_msl_hp, -2);
        assert!((pos.lat_degrees() - 47.285_233_166).abs() < 1e-9);
        assert!((pos.lon_degrees() - 8.565_264_995).abs() < 1e-9);
        assert!((pos.height_meters() - 548.1003).abs() < 1e-9);
        assert!((pos.horizontal_accuracy_meters() - 0.014).abs() < 1e-12);
    }

    #[test]
    fn wrong_length() {
        assert!(NavHpPosLlh::from_payload(&[0u8; 35]).is_none());
    }
}
