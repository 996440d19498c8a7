use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

pub fn format_bytes(n: u64) -> String {
    if n == 0 {
        return "0 B".to_string();
    }
    let mut value = n as f64;
    let mut unit = 0usize;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if value >= 10.0 || unit == 0 {
        format!("{:.0} {}", value, BYTE_UNITS[unit])
    } else {
        format!("{:.1} {}", value, BYTE_UNITS[unit])
    }
}

/// 秒数 → "X小时Y分钟"；出现更粗的单位后不再显示秒
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "0秒".to_string();
    }
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;

    let mut out = String::new();
    if h > 0 {
        out.push_str(&format!("{}小时", h));
    }
    if m > 0 {
        out.push_str(&format!("{}分钟", m));
    }
    if h == 0 && m == 0 {
        out.push_str(&format!("{}秒", s));
    }
    out
}

/// 解析后端日期字符串（"2024-01-02 03:04:05" 形式，首个空格视为日期/时间分隔符）
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    let s = raw.trim().replacen(' ', "T", 1);
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Some(dt.with_timezone(&Local));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&s, fmt) {
            return Local.from_local_datetime(&naive).earliest();
        }
    }
    // 只有日期时按 UTC 零点，带时间但无时区时按本地时间
    if let Ok(date) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        let naive = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&naive).with_timezone(&Local));
    }
    None
}

/// 排序用的毫秒时间戳；缺失或无法解析时为 0
pub fn timestamp_millis(raw: Option<&str>) -> i64 {
    raw.and_then(parse_timestamp)
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

pub fn format_timestamp(raw: Option<&str>) -> String {
    let s = match raw {
        Some(s) if !s.trim().is_empty() => s,
        _ => return "-".to_string(),
    };
    match parse_timestamp(s) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1), "1 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(10 * 1024), "10 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024 + 512 * 1024), "5.5 MB");
        assert_eq!(format_bytes(3 * 1024u64.pow(4)), "3.0 TB");
        // TB 是最大单位
        assert_eq!(format_bytes(2048 * 1024u64.pow(4)), "2048 TB");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(0), "0秒");
        assert_eq!(format_duration(59), "59秒");
        assert_eq!(format_duration(60), "1分钟");
        assert_eq!(format_duration(61), "1分钟");
        assert_eq!(format_duration(3600), "1小时");
        assert_eq!(format_duration(3661), "1小时1分钟");
        assert_eq!(format_duration(7205), "2小时");
    }

    #[test]
    fn timestamps_render_minutes_zero_padded() {
        assert_eq!(
            format_timestamp(Some("2024-03-05 08:07:09")),
            "2024-03-05 08:07"
        );
        assert_eq!(
            format_timestamp(Some("2024-03-05T08:07:09.123")),
            "2024-03-05 08:07"
        );
        assert_eq!(format_timestamp(Some("2024-12-31 23:59")), "2024-12-31 23:59");
    }

    #[test]
    fn unparsable_timestamp_is_returned_unchanged() {
        assert_eq!(format_timestamp(Some("昨天")), "昨天");
        assert_eq!(format_timestamp(Some("2024-13-40 99:00:00")), "2024-13-40 99:00:00");
        assert_eq!(format_timestamp(None), "-");
        assert_eq!(format_timestamp(Some("")), "-");
    }

    #[test]
    fn sort_key_falls_back_to_epoch() {
        assert_eq!(timestamp_millis(None), 0);
        assert_eq!(timestamp_millis(Some("not a date")), 0);
        assert_eq!(
            timestamp_millis(Some("2024-01-01T00:00:00Z")),
            1_704_067_200_000
        );
        assert!(
            timestamp_millis(Some("2024-01-02 00:00:00"))
                > timestamp_millis(Some("2024-01-01 23:59:59"))
        );
    }

    #[test]
    fn date_only_is_utc_midnight_but_naive_time_is_local() {
        assert_eq!(timestamp_millis(Some("2024-05-01")), 1_714_521_600_000);

        let local_midnight = Local
            .with_ymd_and_hms(2024, 5, 1, 0, 0, 0)
            .earliest()
            .unwrap()
            .timestamp_millis();
        assert_eq!(timestamp_millis(Some("2024-05-01 00:00")), local_midnight);
    }
}
