//! Timezone name vs `Date#getTimezoneOffset`.
//!
//! Offsets here follow the JS convention: minutes *west* of UTC, so
//! `America/New_York` is `300` in winter and `240` in summer.

use super::{LieDetectionResult, Severity};

pub const CHECK: &str = "timezone_mismatch";
pub const SEVERITY: Severity = Severity::Medium;

const MS_PER_MINUTE: i64 = 60_000;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Largest real-world distance from UTC, in minutes (UTC+14).
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Daylight-saving schedule of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DstRule {
    None,
    /// Second Sunday of March to first Sunday of November, 02:00 local.
    NorthAmerica,
    /// Last Sunday of March to last Sunday of October, 01:00 UTC.
    Europe,
    /// First Sunday of October to first Sunday of April, 02:00 standard.
    AustraliaSouth,
    /// Last Sunday of September to first Sunday of April, 02:00 standard.
    NewZealand,
}

/// A zone's standard offset (minutes *east* of UTC) and DST rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneRule {
    pub standard_east: i32,
    pub dst: DstRule,
}

impl ZoneRule {
    const fn new(standard_east: i32, dst: DstRule) -> Self {
        Self { standard_east, dst }
    }

    /// Every `getTimezoneOffset` value the zone can produce.
    pub fn valid_offsets(&self) -> Vec<i32> {
        let mut offsets = vec![-self.standard_east];
        if self.dst != DstRule::None {
            offsets.push(-(self.standard_east + 60));
        }
        offsets
    }

    /// `getTimezoneOffset` at a UTC instant.
    pub fn offset_at(&self, utc_ms: i64) -> i32 {
        if in_dst(self.dst, self.standard_east, utc_ms) {
            -(self.standard_east + 60)
        } else {
            -self.standard_east
        }
    }
}

const ZONES: &[(&str, ZoneRule)] = &[
    ("UTC", ZoneRule::new(0, DstRule::None)),
    ("Etc/UTC", ZoneRule::new(0, DstRule::None)),
    ("GMT", ZoneRule::new(0, DstRule::None)),
    ("Europe/London", ZoneRule::new(0, DstRule::Europe)),
    ("Europe/Dublin", ZoneRule::new(0, DstRule::Europe)),
    ("Europe/Lisbon", ZoneRule::new(0, DstRule::Europe)),
    ("Europe/Paris", ZoneRule::new(60, DstRule::Europe)),
    ("Europe/Berlin", ZoneRule::new(60, DstRule::Europe)),
    ("Europe/Madrid", ZoneRule::new(60, DstRule::Europe)),
    ("Europe/Rome", ZoneRule::new(60, DstRule::Europe)),
    ("Europe/Amsterdam", ZoneRule::new(60, DstRule::Europe)),
    ("Europe/Brussels", ZoneRule::new(60, DstRule::Europe)),
    ("Europe/Vienna", ZoneRule::new(60, DstRule::Europe)),
    ("Europe/Zurich", ZoneRule::new(60, DstRule::Europe)),
    ("Europe/Stockholm", ZoneRule::new(60, DstRule::Europe)),
    ("Europe/Oslo", ZoneRule::new(60, DstRule::Europe)),
    ("Europe/Copenhagen", ZoneRule::new(60, DstRule::Europe)),
    ("Europe/Warsaw", ZoneRule::new(60, DstRule::Europe)),
    ("Europe/Prague", ZoneRule::new(60, DstRule::Europe)),
    ("Europe/Budapest", ZoneRule::new(60, DstRule::Europe)),
    ("Europe/Athens", ZoneRule::new(120, DstRule::Europe)),
    ("Europe/Helsinki", ZoneRule::new(120, DstRule::Europe)),
    ("Europe/Kiev", ZoneRule::new(120, DstRule::Europe)),
    ("Europe/Kyiv", ZoneRule::new(120, DstRule::Europe)),
    ("Europe/Bucharest", ZoneRule::new(120, DstRule::Europe)),
    ("Europe/Istanbul", ZoneRule::new(180, DstRule::None)),
    ("Europe/Moscow", ZoneRule::new(180, DstRule::None)),
    ("America/St_Johns", ZoneRule::new(-210, DstRule::NorthAmerica)),
    ("America/Halifax", ZoneRule::new(-240, DstRule::NorthAmerica)),
    ("America/New_York", ZoneRule::new(-300, DstRule::NorthAmerica)),
    ("America/Toronto", ZoneRule::new(-300, DstRule::NorthAmerica)),
    ("America/Detroit", ZoneRule::new(-300, DstRule::NorthAmerica)),
    ("America/Chicago", ZoneRule::new(-360, DstRule::NorthAmerica)),
    ("America/Winnipeg", ZoneRule::new(-360, DstRule::NorthAmerica)),
    ("America/Denver", ZoneRule::new(-420, DstRule::NorthAmerica)),
    ("America/Edmonton", ZoneRule::new(-420, DstRule::NorthAmerica)),
    ("America/Los_Angeles", ZoneRule::new(-480, DstRule::NorthAmerica)),
    ("America/Vancouver", ZoneRule::new(-480, DstRule::NorthAmerica)),
    ("America/Anchorage", ZoneRule::new(-540, DstRule::NorthAmerica)),
    ("America/Phoenix", ZoneRule::new(-420, DstRule::None)),
    ("America/Mexico_City", ZoneRule::new(-360, DstRule::None)),
    ("America/Bogota", ZoneRule::new(-300, DstRule::None)),
    ("America/Lima", ZoneRule::new(-300, DstRule::None)),
    ("America/Sao_Paulo", ZoneRule::new(-180, DstRule::None)),
    ("America/Argentina/Buenos_Aires", ZoneRule::new(-180, DstRule::None)),
    ("Pacific/Honolulu", ZoneRule::new(-600, DstRule::None)),
    ("Africa/Lagos", ZoneRule::new(60, DstRule::None)),
    ("Africa/Johannesburg", ZoneRule::new(120, DstRule::None)),
    ("Africa/Nairobi", ZoneRule::new(180, DstRule::None)),
    ("Asia/Dubai", ZoneRule::new(240, DstRule::None)),
    ("Asia/Tehran", ZoneRule::new(210, DstRule::None)),
    ("Asia/Karachi", ZoneRule::new(300, DstRule::None)),
    ("Asia/Kolkata", ZoneRule::new(330, DstRule::None)),
    ("Asia/Calcutta", ZoneRule::new(330, DstRule::None)),
    ("Asia/Kathmandu", ZoneRule::new(345, DstRule::None)),
    ("Asia/Dhaka", ZoneRule::new(360, DstRule::None)),
    ("Asia/Bangkok", ZoneRule::new(420, DstRule::None)),
    ("Asia/Jakarta", ZoneRule::new(420, DstRule::None)),
    ("Asia/Ho_Chi_Minh", ZoneRule::new(420, DstRule::None)),
    ("Asia/Shanghai", ZoneRule::new(480, DstRule::None)),
    ("Asia/Hong_Kong", ZoneRule::new(480, DstRule::None)),
    ("Asia/Taipei", ZoneRule::new(480, DstRule::None)),
    ("Asia/Singapore", ZoneRule::new(480, DstRule::None)),
    ("Asia/Manila", ZoneRule::new(480, DstRule::None)),
    ("Asia/Seoul", ZoneRule::new(540, DstRule::None)),
    ("Asia/Tokyo", ZoneRule::new(540, DstRule::None)),
    ("Australia/Perth", ZoneRule::new(480, DstRule::None)),
    ("Australia/Darwin", ZoneRule::new(570, DstRule::None)),
    ("Australia/Adelaide", ZoneRule::new(570, DstRule::AustraliaSouth)),
    ("Australia/Brisbane", ZoneRule::new(600, DstRule::None)),
    ("Australia/Sydney", ZoneRule::new(600, DstRule::AustraliaSouth)),
    ("Australia/Melbourne", ZoneRule::new(600, DstRule::AustraliaSouth)),
    ("Australia/Hobart", ZoneRule::new(600, DstRule::AustraliaSouth)),
    ("Pacific/Auckland", ZoneRule::new(720, DstRule::NewZealand)),
];

/// Rule for an IANA zone name, including `Etc/GMT±N`.
pub fn zone_rule(zone: &str) -> Option<ZoneRule> {
    if let Some(rule) = ZONES.iter().find(|(name, _)| *name == zone).map(|(_, r)| *r) {
        return Some(rule);
    }
    // POSIX sign: Etc/GMT+5 is five hours *behind* UTC.
    let rest = zone.strip_prefix("Etc/GMT")?;
    let hours: i32 = rest.parse().ok()?;
    if !(-14..=12).contains(&hours) {
        return None;
    }
    Some(ZoneRule::new(-hours * 60, DstRule::None))
}

/// Offset must be one the zone can ever produce.
pub fn detect_timezone_mismatch(zone: &str, offset_minutes: i32) -> LieDetectionResult {
    check(zone, offset_minutes, None)
}

/// Offset must be the one the zone produces at `observed_at_ms`, give or take
/// a day around DST transitions.
pub fn detect_timezone_mismatch_at(
    zone: &str,
    offset_minutes: i32,
    observed_at_ms: f64,
) -> LieDetectionResult {
    let at = if observed_at_ms.is_finite() {
        Some(observed_at_ms as i64)
    } else {
        None
    };
    check(zone, offset_minutes, at)
}

fn check(zone: &str, offset: i32, observed_at_ms: Option<i64>) -> LieDetectionResult {
    if zone.is_empty() {
        return LieDetectionResult::insufficient(CHECK, SEVERITY, "timezone name unavailable");
    }
    if offset.abs() > MAX_OFFSET_MINUTES {
        return LieDetectionResult::mismatch(
            CHECK,
            SEVERITY,
            format!("offset {} is outside every real timezone", offset),
        );
    }
    let Some(rule) = zone_rule(zone) else {
        return LieDetectionResult::consistent(
            CHECK,
            SEVERITY,
            format!("{} not in reference table", zone),
        );
    };

    let expected: Vec<i32> = match observed_at_ms {
        Some(t) => {
            let mut around = vec![
                rule.offset_at(t),
                rule.offset_at(t - MS_PER_DAY),
                rule.offset_at(t + MS_PER_DAY),
            ];
            around.sort_unstable();
            around.dedup();
            around
        }
        None => rule.valid_offsets(),
    };

    if expected.contains(&offset) {
        LieDetectionResult::consistent(
            CHECK,
            SEVERITY,
            format!("{} offset {} is valid", zone, offset),
        )
    } else {
        LieDetectionResult::mismatch(
            CHECK,
            SEVERITY,
            format!("{} reports offset {}, expected one of {:?}", zone, offset, expected),
        )
    }
}

fn in_dst(rule: DstRule, standard_east: i32, utc_ms: i64) -> bool {
    let year = civil_from_days(utc_ms.div_euclid(MS_PER_DAY)).0;
    // Instant of `local_hour` standard time on `day`, in UTC ms.
    let local = |day: i64, local_hour: i64| {
        day * MS_PER_DAY + local_hour * MS_PER_HOUR - standard_east as i64 * MS_PER_MINUTE
    };
    match rule {
        DstRule::None => false,
        DstRule::NorthAmerica => {
            let start = local(nth_sunday(year, 3, 2), 2);
            // 02:00 daylight is 01:00 standard.
            let end = local(nth_sunday(year, 11, 1), 1);
            (start..end).contains(&utc_ms)
        }
        DstRule::Europe => {
            let start = last_sunday(year, 3) * MS_PER_DAY + MS_PER_HOUR;
            let end = last_sunday(year, 10) * MS_PER_DAY + MS_PER_HOUR;
            (start..end).contains(&utc_ms)
        }
        DstRule::AustraliaSouth => {
            let end = local(nth_sunday(year, 4, 1), 2);
            let start = local(nth_sunday(year, 10, 1), 2);
            utc_ms < end || utc_ms >= start
        }
        DstRule::NewZealand => {
            let end = local(nth_sunday(year, 4, 1), 2);
            let start = local(last_sunday(year, 9), 2);
            utc_ms < end || utc_ms >= start
        }
    }
}

/// Days since 1970-01-01 of a proleptic Gregorian date.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// (year, month, day) of a day count since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

/// 0 = Sunday.
fn weekday(days: i64) -> i64 {
    (days + 4).rem_euclid(7)
}

fn nth_sunday(year: i64, month: i64, n: i64) -> i64 {
    let first = days_from_civil(year, month, 1);
    let first_sunday = first + (7 - weekday(first)) % 7;
    first_sunday + 7 * (n - 1)
}

fn last_sunday(year: i64, month: i64) -> i64 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let last = days_from_civil(next_year, next_month, 1) - 1;
    last - weekday(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(year: i64, month: i64, day: i64, hour: i64) -> i64 {
        days_from_civil(year, month, day) * MS_PER_DAY + hour * MS_PER_HOUR
    }

    #[test]
    fn test_civil_round_trip() {
        assert_eq!(days_from_civil(1970, 1, 1), 0);
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(days_from_civil(2024, 2, 29)), (2024, 2, 29));
        // 2024-03-10 was a Sunday.
        assert_eq!(weekday(days_from_civil(2024, 3, 10)), 0);
    }

    #[test]
    fn test_transition_dates() {
        assert_eq!(nth_sunday(2024, 3, 2), days_from_civil(2024, 3, 10));
        assert_eq!(nth_sunday(2024, 11, 1), days_from_civil(2024, 11, 3));
        assert_eq!(last_sunday(2024, 3), days_from_civil(2024, 3, 31));
        assert_eq!(last_sunday(2024, 10), days_from_civil(2024, 10, 27));
        assert_eq!(last_sunday(2024, 9), days_from_civil(2024, 9, 29));
    }

    #[test]
    fn test_new_york() {
        assert!(detect_timezone_mismatch("America/New_York", 0).detected);
        assert!(!detect_timezone_mismatch("America/New_York", 300).detected);
        assert!(!detect_timezone_mismatch("America/New_York", 240).detected);
    }

    #[test]
    fn test_dst_aware() {
        let winter = utc(2024, 1, 15, 12) as f64;
        let summer = utc(2024, 7, 15, 12) as f64;
        assert!(!detect_timezone_mismatch_at("America/New_York", 300, winter).detected);
        assert!(detect_timezone_mismatch_at("America/New_York", 240, winter).detected);
        assert!(!detect_timezone_mismatch_at("America/New_York", 240, summer).detected);
        assert!(detect_timezone_mismatch_at("America/New_York", 300, summer).detected);

        assert!(!detect_timezone_mismatch_at("Europe/Berlin", -120, summer).detected);
        assert!(detect_timezone_mismatch_at("Europe/Berlin", -60, summer).detected);

        // Southern hemisphere: January is summer.
        assert!(!detect_timezone_mismatch_at("Australia/Sydney", -660, winter).detected);
        assert!(detect_timezone_mismatch_at("Australia/Sydney", -600, winter).detected);
        assert!(!detect_timezone_mismatch_at("Pacific/Auckland", -720, summer).detected);
    }

    #[test]
    fn test_transition_tolerance() {
        // A few hours after the 2024-03-10 spring-forward, either offset passes.
        let just_after = utc(2024, 3, 10, 10) as f64;
        assert!(!detect_timezone_mismatch_at("America/New_York", 240, just_after).detected);
        assert!(!detect_timezone_mismatch_at("America/New_York", 300, just_after).detected);
    }

    #[test]
    fn test_etc_gmt_sign() {
        assert!(!detect_timezone_mismatch("Etc/GMT+5", 300).detected);
        assert!(!detect_timezone_mismatch("Etc/GMT-3", -180).detected);
        assert!(detect_timezone_mismatch("Etc/GMT+5", -300).detected);
    }

    #[test]
    fn test_unknown_and_impossible() {
        assert!(!detect_timezone_mismatch("Mars/Olympus_Mons", 42).detected);
        assert!(detect_timezone_mismatch("Mars/Olympus_Mons", 2000).detected);
        assert!(detect_timezone_mismatch("", 0).is_insufficient());
    }
}
