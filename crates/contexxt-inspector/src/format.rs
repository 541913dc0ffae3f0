//! Human-readable formatting for popover values.

const UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Format a byte count with 1024-based units, at most two decimals and
/// en-US digit grouping: `1536` becomes `1.5 KB`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{} {}", group_decimal(value), UNITS[unit])
}

/// Round to two decimals, drop trailing zeros and group the integer part.
fn group_decimal(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let frac = frac_part.trim_end_matches('0');
    if frac.is_empty() {
        grouped
    } else {
        format!("{}.{}", grouped, frac)
    }
}

/// Format a media duration as `m:ss`. Zero or non-finite durations are `Unknown`.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "Unknown".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Convert a computed colour such as `rgb(255, 0, 128)` to `#FF0080`.
///
/// Input without at least three numeric components is returned unchanged.
pub fn rgb_to_hex(rgb: &str) -> String {
    let channels: Vec<u8> = rgb
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .take(3)
        .map(|part| part.parse::<u32>().map_or(u8::MAX, |v| v.min(255) as u8))
        .collect();

    match channels.as_slice() {
        [r, g, b] => format!("#{:02X}{:02X}{:02X}", r, g, b),
        _ => rgb.to_string(),
    }
}
