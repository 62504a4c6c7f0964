use super::{UbxPacketMeta, UBX_CLASS_NAV};
use crate::bytes::{i32_le, i8_at, u16_le, u32_le};

/// Relative Positioning Information in NED frame (protocol 27+ layout)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavRelPosNed {
    pub version: u8,
    pub ref_station_id: u16,
    /// GPS time of week [ms]
    pub itow: u32,
    /// North component of relative position vector [cm]
    pub rel_pos_n: i32,
    /// East component of relative position vector [cm]
    pub rel_pos_e: i32,
    /// Down component of relative position vector [cm]
    pub rel_pos_d: i32,
    /// Length of the relative position vector [cm]
    pub rel_pos_length: i32,
    /// Heading of the relative position vector [deg * 1e-5]
    pub rel_pos_heading: i32,
    /// High-precision components [0.1 mm]
    pub rel_pos_hp_n: i8,
    pub rel_pos_hp_e: i8,
    pub rel_pos_hp_d: i8,
    pub rel_pos_hp_length: i8,
    /// Accuracy of relative position components [0.1 mm]
    pub acc_n: u32,
    pub acc_e: u32,
    pub acc_d: u32,
    pub acc_length: u32,
    /// Accuracy of heading [deg * 1e-5]
    pub acc_heading: u32,
    pub flags: NavRelPosNedFlags,
}

impl UbxPacketMeta for NavRelPosNed {
    const CLASS: u8 = UBX_CLASS_NAV;
    const ID: u8 = 0x3c;
    const FIXED_PAYLOAD_LEN: Option<u16> = Some(64);
}

impl NavRelPosNed {
    pub fn from_payload(p: &[u8]) -> Option<Self> {
        if p.len() != 64 {
            return None;
        }
        Some(Self {
            version: p[0],
            ref_station_id: u16_le(p, 2),
            itow: u32_le(p, 4),
            rel_pos_n: i32_le(p, 8),
            rel_pos_e: i32_le(p, 12),
            rel_pos_d: i32_le(p, 16),
            rel_pos_length: i32_le(p, 20),
            rel_pos_heading: i32_le(p, 24),
            rel_pos_hp_n: i8_at(p, 32),
            rel_pos_hp_e: i8_at(p, 33),
            rel_pos_hp_d: i8_at(p, 34),
            rel_pos_hp_length: i8_at(p, 35),
            acc_n: u32_le(p, 36),
            acc_e: u32_le(p, 40),
            acc_d: u32_le(p, 44),
            acc_length: u32_le(p, 48),
            acc_heading: u32_le(p, 52),
            flags: NavRelPosNedFlags::from(u32_le(p, 60)),
        })
    }

    /// Heading [deg]
    pub fn heading_degrees(&self) -> f64 {
        f64::from(self.rel_pos_heading) * 1e-5
    }

    /// Precise north component [m]
    pub fn north_meters(&self) -> f64 {
        precise_meters(self.rel_pos_n, self.rel_pos_hp_n)
    }

    /// Precise east component [m]
    pub fn east_meters(&self) -> f64 {
        precise_meters(self.rel_pos_e, self.rel_pos_hp_e)
    }

    /// Precise down component [m]
    pub fn down_meters(&self) -> f64 {
        precise_meters(self.rel_pos_d, self.rel_pos_hp_d)
    }

    /// Precise baseline length [m]
    pub fn length_meters(&self) -> f64 {
        precise_meters(self.rel_pos_length, self.rel_pos_hp_length)
    }
}

fn precise_meters(cm: i32, hp_0_1_mm: i8) -> f64 {
    f64::from(cm) * 1e-2 + f64::from(hp_0_1_mm) * 1e-4
}

#[repr(transparent)]
#[derive(Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavRelPosNedFlags(u32);

impl NavRelPosNedFlags {
    pub fn gnss_fix_ok(&self) -> bool {
        self.0 & 0x1 != 0
    }

    pub fn diff_soln(&self) -> bool {
        (self.0 >> 1) & 0x1 != 0
    }

    pub fn rel_pos_valid(&self) -> bool {
        (self.0 >> 2) & 0x1 != 0
    }

    pub fn carr_soln(&self) -> CarrierPhaseRangeSolutionStatus {
        match (self.0 >> 3) & 0x3 {
            0 => CarrierPhaseRangeSolutionStatus::NoSolution,
            1 => CarrierPhaseRangeSolutionStatus::SolutionWithFloatingAmbiguities,
            2 => CarrierPhaseRangeSolutionStatus::SolutionWithFixedAmbiguities,
            _ => CarrierPhaseRangeSolutionStatus::Reserved,
        }
    }

    pub fn is_moving(&self) -> bool {
        (self.0 >> 5) & 0x1 != 0
    }

    pub fn ref_pos_miss(&self) -> bool {
        (self.0 >> 6) & 0x1 != 0
    }

    pub fn ref_obs_miss(&self) -> bool {
        (self.0 >> 7) & 0x1 != 0
    }

    pub fn rel_pos_heading_valid(&self) -> bool {
        (self.0 >> 8) & 0x1 != 0
    }

    pub fn rel_pos_normalized(&self) -> bool {
        (self.0 >> 9) & 0x1 != 0
    }

    pub const fn from(x: u32) -> Self {
        Self(x)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }
}

impl core::fmt::Debug for NavRelPosNedFlags {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut dbg_struct = f.debug_struct("NavRelPosNedFlags");
        dbg_struct
            .field("gnss_fix_ok", &self.gnss_fix_ok())
            .field("diff_soln", &self.diff_soln())
            .field("rel_pos_valid", &self.rel_pos_valid())
            .field("carr_soln", &self.carr_soln())
            .field("is_moving", &self.is_moving())
            .field("ref_pos_miss", &self.ref_pos_miss())
            .field("ref_obs_miss", &self.ref_obs_miss())
            .field("rel_pos_heading_valid", &self.rel_pos_heading_valid())
            .field("rel_pos_normalized", &self.rel_pos_normalized());

        dbg_struct.finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CarrierPhaseRangeSolutionStatus {
    /// No carrier phase range solution
    NoSolution,
    /// Carrier phase range solution with floating ambiguities
    SolutionWithFloatingAmbiguities,
    /// Carrier phase range solution with fixed ambiguities
    SolutionWithFixedAmbiguities,
    /// Bit pattern `0b11`, not defined by the receiver interface description
    Reserved,
}
