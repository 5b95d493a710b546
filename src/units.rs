//! Unit conversion helpers.

/// `used / total * 100`, or 0 when `total` is 0.
pub fn pct(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    used as f64 / total as f64 * 100.0
}

/// procfs reports memory sizes in kibibytes.
pub fn kib_to_bytes(kib: u64) -> u64 {
    kib.saturating_mul(1024)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn bytes_to_kib(bytes: u64) -> f64 {
    round2(bytes as f64 / 1024.0)
}

pub fn bytes_to_mib(bytes: u64) -> f64 {
    round2(bytes as f64 / 1024.0 / 1024.0)
}

pub fn bytes_to_gib(bytes: u64) -> f64 {
    round2(bytes as f64 / 1024.0 / 1024.0 / 1024.0)
}

pub fn bytes_to_tib(bytes: u64) -> f64 {
    round2(bytes as f64 / 1024.0 / 1024.0 / 1024.0 / 1024.0)
}

/// Renders a byte count with the largest binary unit that keeps the value >= 1.
pub fn human_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;
    const TIB: u64 = GIB * 1024;

    match bytes {
        b if b >= TIB => format!("{:.2} TiB", bytes_to_tib(b)),
        b if b >= GIB => format!("{:.2} GiB", bytes_to_gib(b)),
        b if b >= MIB => format!("{:.2} MiB", bytes_to_mib(b)),
        b if b >= KIB => format!("{:.2} KiB", bytes_to_kib(b)),
        b => format!("{} B", b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_zero_total() {
        assert_eq!(pct(0, 0), 0.0);
        assert_eq!(pct(10, 0), 0.0);
    }

    #[test]
    fn test_pct() {
        assert!((pct(25, 200) - 12.5).abs() < 1e-9);
        assert_eq!(pct(200, 200), 100.0);
    }

    #[test]
    fn test_conversions_round_to_two_decimals() {
        assert_eq!(kib_to_bytes(4), 4096);
        assert_eq!(bytes_to_kib(1536), 1.5);
        assert_eq!(bytes_to_mib(1024 * 1024 * 3 / 2), 1.5);
        assert_eq!(bytes_to_gib(1_000_000_000), 0.93);
        assert_eq!(bytes_to_tib(1 << 40), 1.0);
    }

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(2048), "2.00 KiB");
        assert_eq!(human_bytes(5 * 1024 * 1024 * 1024), "5.00 GiB");
    }
}
