//! Unicore ASCII command responses and binary navigation messages.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::{
    bytes::{f32_le, f64_le, u16_le, u32_le},
    constants::UNICORE_BIN_HEADER_LEN,
};

/// Outcome of a `$command,...` echo
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnicoreResponse {
    /// No response term was found in the echo.
    #[default]
    None,
    Ok,
    Error,
    Unknown,
}

impl UnicoreResponse {
    /// Classifies a response term. Only the value after a `:` is looked at
    /// when one is present (`response: OK`).
    pub fn classify(term: &[u8]) -> Self {
        let value = match term.iter().position(|b| *b == b':') {
            Some(colon) => &term[colon + 1..],
            None => term,
        };
        let value = value.trim_ascii();
        if value.is_empty() {
            Self::None
        } else if value.eq_ignore_ascii_case(b"OK") {
            Self::Ok
        } else if value.len() >= 5 && value[..5].eq_ignore_ascii_case(b"ERROR") {
            Self::Error
        } else {
            Self::Unknown
        }
    }
}

pub const UNICORE_MSG_BESTNAV: u16 = 2118;

/// Unicore binary message header, fixed 24 bytes, little-endian
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnicoreBinHeader {
    pub sync: [u8; 3],
    /// CPU idle, 0-100
    pub cpu_idle: u8,
    pub message_id: u16,
    /// Payload length, header and CRC excluded
    pub message_len: u16,
    /// Reference time system (GPST or BDST)
    pub time_ref: u8,
    pub time_status: u8,
    /// Week number
    pub week: u16,
    /// Time of week [ms]
    pub tow_ms: u32,
    pub version: u32,
    pub leap_sec: u8,
    /// Output delay [ms]
    pub delay_ms: u16,
}

impl UnicoreBinHeader {
    pub fn from_bytes(h: &[u8]) -> Option<Self> {
        if h.len() < UNICORE_BIN_HEADER_LEN {
            return None;
        }
        Some(Self {
            sync: [h[0], h[1], h[2]],
            cpu_idle: h[3],
            message_id: u16_le(h, 4),
            message_len: u16_le(h, 6),
            time_ref: h[8],
            time_status: h[9],
            week: u16_le(h, 10),
            tow_ms: u32_le(h, 12),
            version: u32_le(h, 16),
            leap_sec: h[21],
            delay_ms: u16_le(h, 22),
        })
    }

    /// Week and time of week counted from the GPS epoch (1980-01-06), no leap second correction.
    pub fn gps_time(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(1980, 1, 6)?
            .and_hms_opt(0, 0, 0)?
            .checked_add_signed(Duration::days(i64::from(self.week) * 7))?
            .checked_add_signed(Duration::milliseconds(i64::from(self.tow_ms)))
    }
}

/// Best position and velocity (BESTNAVB), 120 byte payload
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BestNav {
    pub psol_status: u32,
    pub pos_type: u32,
    /// Latitude [deg]
    pub lat: f64,
    /// Longitude [deg]
    pub lon: f64,
    /// Height above mean sea level [m]
    pub height: f64,
    /// Geoid undulation [m]
    pub geoid: f32,
    pub datum_id: u32,
    /// Latitude standard deviation [m]
    pub lat_dev: f32,
    pub lon_dev: f32,
    pub height_dev: f32,
    pub base_station_id: [u8; 4],
    /// Differential age [s]
    pub diff_age: f32,
    /// Solution age [s]
    pub sol_age: f32,
    /// Satellites tracked
    pub sv: u8,
    /// Satellites used in the solution
    pub used_sv: u8,
    pub ext_sol_stat: u8,
    pub galileo_bds3_sig_mask: u8,
    pub gps_glonass_bds2_sig_mask: u8,
    pub v_sol_status: u32,
    pub vel_type: u32,
    pub latency: f32,
    pub age: f32,
    /// Horizontal speed over ground [m/s]
    pub hor_speed: f64,
    /// Track over ground [deg]
    pub trk_gnd: f64,
    /// Vertical speed [m/s]
    pub vert_speed: f64,
    pub verspd_std: f32,
    pub horspd_std: f32,
}

impl BestNav {
    pub const PAYLOAD_LEN: usize = 120;

    pub fn from_payload(p: &[u8]) -> Option<Self> {
        if p.len() < Self::PAYLOAD_LEN {
            return None;
        }
        Some(Self {
            psol_status: u32_le(p, 0),
            pos_type: u32_le(p, 4),
            lat: f64_le(p, 8),
            lon: f64_le(p, 16),
            height: f64_le(p, 24),
            geoid: f32_le(p, 32),
            datum_id: u32_le(p, 36),
            lat_dev: f32_le(p, 40),
            lon_dev: f32_le(p, 44),
            height_dev: f32_le(p, 48),
            base_station_id: [p[52], p[53], p[54], p[55]],
            diff_age: f32_le(p, 56),
            sol_age: f32_le(p, 60),
            sv: p[64],
            used_sv: p[65],
            ext_sol_stat: p[69],
            galileo_bds3_sig_mask: p[70],
            gps_glonass_bds2_sig_mask: p[71],
            v_sol_status: u32_le(p, 72),
            vel_type: u32_le(p, 76),
            latency: f32_le(p, 80),
            age: f32_le(p, 84),
            hor_speed: f64_le(p, 88),
            trk_gnd: f64_le(p, 96),
            vert_speed: f64_le(p, 104),
            verspd_std: f32_le(p, 112),
            horspd_std: f32_le(p, 116),
        })
    }
}
