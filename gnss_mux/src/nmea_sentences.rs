//! Typed records decoded from NMEA-0183 sentences.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Sentence type carried by an NMEA event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NmeaSentence {
    Gga,
    Rmc,
    Ths,
    /// Checksum-valid sentence of a type this crate does not decode.
    Other,
}

impl NmeaSentence {
    /// Classifies an address field such as `GPGGA` or `GNRMC`: two talker
    /// characters followed by the sentence formatter.
    pub fn from_address(address: &[u8]) -> Self {
        match address.get(2..5) {
            Some(b"GGA") => Self::Gga,
            Some(b"RMC") => Self::Rmc,
            Some(b"THS") => Self::Ths,
            _ => Self::Other,
        }
    }
}

/// GGA fix quality indicator
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GpsFix {
    #[default]
    Invalid,
    Gps,
    Dgps,
    Pps,
    RtkFix,
    RtkFloat,
    DeadReckoning,
    ManualPosition,
    Simulator,
    /// Quality value outside of 0..=8
    Unknown(i32),
}

impl From<i32> for GpsFix {
    fn from(v: i32) -> Self {
        match v {
            0 => Self::Invalid,
            1 => Self::Gps,
            2 => Self::Dgps,
            3 => Self::Pps,
            4 => Self::RtkFix,
            5 => Self::RtkFloat,
            6 => Self::DeadReckoning,
            7 => Self::ManualPosition,
            8 => Self::Simulator,
            other => Self::Unknown(other),
        }
    }
}

/// Global positioning system fix data
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gga {
    pub hour: u8,
    pub min: u8,
    pub sec: u8,
    /// Latitude in degrees, unsigned, see `ns`
    pub lat: f64,
    pub ns: Option<char>,
    /// Longitude in degrees, unsigned, see `ew`
    pub lon: f64,
    pub ew: Option<char>,
    pub fix: GpsFix,
    pub sat_num: u8,
    pub hdop: f32,
    /// Altitude above mean sea level [m]
    pub alt: f32,
    /// Geoid separation [m]
    pub geo_sep: f32,
}

impl Gga {
    /// UTC time of the fix
    pub fn time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour.into(), self.min.into(), self.sec.into())
    }

    /// Latitude in degrees, negative in the southern hemisphere
    pub fn latitude(&self) -> f64 {
        signed(self.lat, self.ns, 'S')
    }

    /// Longitude in degrees, negative in the western hemisphere
    pub fn longitude(&self) -> f64 {
        signed(self.lon, self.ew, 'W')
    }
}

/// Recommended minimum specific GNSS data
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rmc {
    pub hour: u8,
    pub min: u8,
    pub sec: u8,
    /// `true` when the status field is `A`
    pub valid: bool,
    pub lat: f64,
    pub ns: Option<char>,
    pub lon: f64,
    pub ew: Option<char>,
    /// Speed over ground [knots]
    pub speed_knots: f32,
    /// Course over ground [deg]
    pub course: f32,
    pub day: u8,
    pub month: u8,
    /// Two-digit year
    pub year: u8,
    pub mode: Option<char>,
}

impl Rmc {
    pub fn time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour.into(), self.min.into(), self.sec.into())
    }

    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            2000 + i32::from(self.year),
            self.month.into(),
            self.day.into(),
        )
    }

    pub fn datetime(&self) -> Option<NaiveDateTime> {
        Some(self.date()?.and_time(self.time()?))
    }

    pub fn latitude(&self) -> f64 {
        signed(self.lat, self.ns, 'S')
    }

    pub fn longitude(&self) -> f64 {
        signed(self.lon, self.ew, 'W')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ThsMode {
    Autonomous,
    Estimated,
    Manual,
    Simulator,
    NotValid,
}

impl ThsMode {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(Self::Autonomous),
            'E' => Some(Self::Estimated),
            'M' => Some(Self::Manual),
            'S' => Some(Self::Simulator),
            'V' => Some(Self::NotValid),
            _ => None,
        }
    }
}

/// True heading and status
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ths {
    /// Heading [deg]
    pub heading: f64,
    pub mode: Option<ThsMode>,
}

fn signed(value: f64, hemisphere: Option<char>, negative: char) -> f64 {
    if hemisphere == Some(negative) {
        -value
    } else {
        value
    }
}

/// Converts `ddmm.mmmm` / `dddmm.mmmm` into decimal degrees.
pub(crate) fn nmea_degrees(raw: f64) -> f64 {
    let deg = f64::from((raw as i32) / 100);
    let min = raw - deg * 100.0;
    deg + min / 60.0
}
