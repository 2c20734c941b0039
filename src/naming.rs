use std::sync::OnceLock;

use crate::error::CollocError;
use chrono::{naive::NaiveDateTime, NaiveDate};
use regex::{Captures, Regex};

/// The filename conventions used by the supported archives.
///
/// Each archive embeds the nominal start time of a granule in its filename, but every one of them
/// does it differently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Naming {
    /// `MYD03.A2016160.0130.061.2018059005540.hdf`
    Modis,
    /// `CAL_LID_L2_01kmCLay-Standard-V4-10.2016-06-08T01-30-25ZD.hdf`
    Caliop,
    /// `DARDAR-CLOUD_v2.1.1_2016160013025_51534.hdf`
    Dardar,
    /// `2016160013025_51534_CS_2B-CLDCLASS_GRANULE_P1_R05_E06_F00.hdf`
    Cloudsat,
    /// `2A.GPM.DPR.V8-20180723.20160608-S013025-E030258.012838.V06A.HDF5`
    Gpm,
    /// `OPERA_RAINFALL_RATE_2016_160_01_30.hdf`
    Opera,
}

impl Naming {
    /// Parse the nominal start time out of a filename.
    pub fn start_time(&self, filename: &str) -> Result<NaiveDateTime, CollocError> {
        let parsed = match self {
            Naming::Modis => modis_pattern()
                .captures(filename)
                .and_then(|c| ordinal(&c, [1, 2, 3, 4], None)),
            Naming::Caliop => caliop_pattern()
                .captures(filename)
                .and_then(|c| calendar(&c, [1, 2, 3, 4, 5], None)),
            Naming::Dardar => filename
                .split('_')
                .nth(2)
                .and_then(|field| packed_pattern().captures(field))
                .and_then(|c| ordinal(&c, [1, 2, 3, 4], Some(5))),
            Naming::Cloudsat => basename(filename)
                .split('_')
                .next()
                .and_then(|field| packed_pattern().captures(field))
                .and_then(|c| ordinal(&c, [1, 2, 3, 4], Some(5))),
            Naming::Gpm => filename
                .split('.')
                .nth(4)
                .and_then(|field| gpm_pattern().captures(field))
                .and_then(|c| calendar(&c, [1, 2, 3, 4, 5], Some(6))),
            Naming::Opera => opera_pattern()
                .captures(filename)
                .and_then(|c| ordinal(&c, [1, 2, 3, 4], None)),
        };

        parsed.ok_or_else(|| {
            CollocError::Format(format!(
                "cannot parse a {:?} start time from {:?}",
                self, filename
            ))
        })
    }
}

fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[(i + 1)..],
        None => path,
    }
}

fn field<T: std::str::FromStr>(caps: &Captures, i: usize) -> Option<T> {
    caps.get(i).and_then(|m| m.as_str().parse().ok())
}

/// Build a time from captures holding year, day of year, hour and minute (plus optional seconds).
fn ordinal(caps: &Captures, ymdh: [usize; 4], sec: Option<usize>) -> Option<NaiveDateTime> {
    let [y, d, h, m] = ymdh;
    let s = match sec {
        Some(i) => field(caps, i)?,
        None => 0,
    };

    NaiveDate::from_yo_opt(field(caps, y)?, field(caps, d)?)?.and_hms_opt(
        field(caps, h)?,
        field(caps, m)?,
        s,
    )
}

/// Build a time from captures holding year, month, day, hour and minute (plus optional seconds).
fn calendar(caps: &Captures, ymdhm: [usize; 5], sec: Option<usize>) -> Option<NaiveDateTime> {
    let [y, mo, d, h, mi] = ymdhm;
    let s = match sec {
        Some(i) => field(caps, i)?,
        None => 0,
    };

    NaiveDate::from_ymd_opt(field(caps, y)?, field(caps, mo)?, field(caps, d)?)?.and_hms_opt(
        field(caps, h)?,
        field(caps, mi)?,
        s,
    )
}

fn modis_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^.]+\.A(\d{4})(\d{3})\.(\d{2})(\d{2})").expect("valid MODIS pattern")
    })
}

fn caliop_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^.]+\.(\d{4})-(\d{2})-(\d{2})T(\d{2})-(\d{2})")
            .expect("valid CALIOP pattern")
    })
}

fn packed_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4})(\d{3})(\d{2})(\d{2})(\d{2})$").expect("valid packed pattern")
    })
}

fn gpm_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4})(\d{2})(\d{2})-S(\d{2})(\d{2})(\d{2})").expect("valid GPM pattern")
    })
}

fn opera_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"_(\d{4})_(\d{3})_(\d{2})_(\d{2})\.hdf$").expect("valid OPERA pattern")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, doy: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_yo_opt(y, doy)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_modis_name() {
        let t = Naming::Modis
            .start_time("MYD03.A2016160.0130.061.2018059005540.hdf")
            .unwrap();
        assert_eq!(t, at(2016, 160, 1, 30, 0));
    }

    #[test]
    fn test_caliop_name_drops_seconds() {
        let t = Naming::Caliop
            .start_time("CAL_LID_L2_01kmCLay-Standard-V4-10.2016-06-08T01-30-25ZD.hdf")
            .unwrap();
        assert_eq!(t, at(2016, 160, 1, 30, 0));
    }

    #[test]
    fn test_dardar_name() {
        let t = Naming::Dardar
            .start_time("DARDAR-CLOUD_v2.1.1_2016160013025_51534.hdf")
            .unwrap();
        assert_eq!(t, at(2016, 160, 1, 30, 25));
    }

    #[test]
    fn test_cloudsat_name_with_directory() {
        let t = Naming::Cloudsat
            .start_time("2016/2016_06_08/2016160013025_51534_CS_2B-CLDCLASS_GRANULE_P1_R05_E06_F00.hdf")
            .unwrap();
        assert_eq!(t, at(2016, 160, 1, 30, 25));
    }

    #[test]
    fn test_gpm_name() {
        let t = Naming::Gpm
            .start_time("2A.GPM.DPR.V8-20180723.20160608-S013025-E030258.012838.V06A.HDF5")
            .unwrap();
        assert_eq!(t, at(2016, 160, 1, 30, 25));
    }

    #[test]
    fn test_opera_name() {
        let t = Naming::Opera
            .start_time("OPERA_RAINFALL_RATE_2016_160_01_30.hdf")
            .unwrap();
        assert_eq!(t, at(2016, 160, 1, 30, 0));
    }

    #[test]
    fn test_malformed_names_are_format_errors() {
        assert!(matches!(
            Naming::Modis.start_time("MYD03.hdf"),
            Err(CollocError::Format(_))
        ));
        assert!(matches!(
            Naming::Gpm.start_time("2A.GPM.DPR.V8.garbage.HDF5"),
            Err(CollocError::Format(_))
        ));
        // Day 367 does not exist.
        assert!(matches!(
            Naming::Opera.start_time("OPERA_RAINFALL_RATE_2016_367_01_30.hdf"),
            Err(CollocError::Format(_))
        ));
    }
}
