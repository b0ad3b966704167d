//! Human-readable byte sizes for transfer log lines.

const UNIT: u64 = 1024;
const PREFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

/// Formats a byte count using binary units.
///
/// Examples:
/// - `512` -> "512 B"
/// - `1536` -> "1.50 KB"
/// - `3 * 1024 * 1024` -> "3.00 MB"
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    reason = "Two decimal places of a human-readable size"
)]
pub fn format_bytes(bytes: u64) -> String {
    if bytes < UNIT {
        return format!("{bytes} B");
    }

    let mut div = UNIT;
    let mut exp = 0usize;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp + 1 < PREFIXES.len() {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!("{:.2} {}B", bytes as f64 / div as f64, PREFIXES[exp])
}
