/*!
 Contains date conversions between [`DateTime`] instants and the plist reference epoch.

 Binary plists store dates as a big-endian IEEE-754 double holding the number of
 seconds (fractional allowed) elapsed since 2001-01-01T00:00:00Z.
*/

use chrono::{DateTime, Utc};

/// Unix timestamp of the plist reference epoch, 2001-01-01T00:00:00Z
const EPOCH_UNIX_SECONDS: i64 = 978_307_200;

/// Convert a UTC instant to seconds elapsed since the reference epoch
pub fn to_reference_seconds(date: &DateTime<Utc>) -> f64 {
    let unix = date.timestamp() as f64 + f64::from(date.timestamp_subsec_nanos()) * 1e-9;
    unix - EPOCH_UNIX_SECONDS as f64
}

/// Convert seconds elapsed since the reference epoch back to a UTC instant
///
/// Returns [`None`] for non-finite offsets and offsets outside the range
/// [`DateTime`] can represent.
pub fn from_reference_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let unix = seconds + EPOCH_UNIX_SECONDS as f64;
    let micros = unix * 1e6;
    if micros < i64::MIN as f64 || micros > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_micros(micros.round() as i64)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::util::dates::{from_reference_seconds, to_reference_seconds};

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_epoch_is_zero() {
        assert_eq!(to_reference_seconds(&epoch()), 0.0);
        assert_eq!(from_reference_seconds(0.0).unwrap(), epoch());
    }

    #[test]
    fn test_round_trip() {
        let date = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 45).unwrap();
        let seconds = to_reference_seconds(&date);
        assert_eq!(from_reference_seconds(seconds).unwrap(), date);
    }

    #[test]
    fn test_fractional_seconds() {
        let seconds = 86_400.5;
        let date = from_reference_seconds(seconds).unwrap();
        assert_eq!(to_reference_seconds(&date), seconds);
    }

    #[test]
    fn test_dates_before_the_epoch() {
        let date = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        let seconds = to_reference_seconds(&date);
        assert_eq!(seconds, -978_307_200.0);
        assert_eq!(from_reference_seconds(seconds).unwrap(), date);
    }

    #[test]
    fn test_rejects_unrepresentable_offsets() {
        assert!(from_reference_seconds(f64::NAN).is_none());
        assert!(from_reference_seconds(f64::INFINITY).is_none());
        assert!(from_reference_seconds(1e30).is_none());
    }
}
