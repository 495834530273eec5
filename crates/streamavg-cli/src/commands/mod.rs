//! CLI command implementations.

pub mod init;
pub mod probe;
pub mod run;

use colored::Colorize;

/// Print a `label: value` line with the label dimmed.
pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", format!("{}:", label).dimmed(), value);
}

/// Format a byte count using binary units.
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if bytes >= GIB {
        format!("{:.2} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.2} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(48 * 1024), "48.00 KiB");
        assert_eq!(format_bytes(16 * 1024 * 1024), "16.00 MiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024 / 2), "1.50 GiB");
    }
}
