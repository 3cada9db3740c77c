//! Host memory observation used by pressure-based cache eviction.

use std::fs;

/// Source of system RAM usage. GPU memory comes from the inference
/// runtime's own report, not from this probe.
pub trait MemoryProbe: Send + Sync {
    /// Percentage of system RAM in use, or `None` where unobservable.
    fn system_ram_percent(&self) -> Option<f64>;
}

/// Probe backed by `/proc/meminfo`. Returns `None` on platforms without
/// procfs; pressure eviction then only considers GPU memory.
#[derive(Default)]
pub struct ProcMeminfoProbe;

impl MemoryProbe for ProcMeminfoProbe {
    fn system_ram_percent(&self) -> Option<f64> {
        let contents = fs::read_to_string("/proc/meminfo").ok()?;
        parse_meminfo_percent(&contents)
    }
}

/// Probe returning a fixed value, for tests and for disabling RAM checks.
pub struct StaticMemoryProbe {
    pub ram_percent: Option<f64>,
}

impl MemoryProbe for StaticMemoryProbe {
    fn system_ram_percent(&self) -> Option<f64> {
        self.ram_percent
    }
}

fn parse_meminfo_percent(contents: &str) -> Option<f64> {
    let mut total_kb: Option<f64> = None;
    let mut available_kb: Option<f64> = None;
    for line in contents.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            total_kb = rest.trim().split_whitespace().next()?.parse().ok();
        } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
            available_kb = rest.trim().split_whitespace().next()?.parse().ok();
        }
        if total_kb.is_some() && available_kb.is_some() {
            break;
        }
    }
    let total = total_kb?;
    let available = available_kb?;
    if total <= 0.0 {
        return None;
    }
    Some(((total - available) / total) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_meminfo() {
        let sample = "MemTotal:       16000000 kB\nMemFree:         2000000 kB\nMemAvailable:    4000000 kB\n";
        let percent = parse_meminfo_percent(sample).unwrap();
        assert!((percent - 75.0).abs() < 1e-9);
    }

    #[test]
    fn missing_fields_yield_none() {
        assert_eq!(parse_meminfo_percent("MemTotal: 1 kB\n"), None);
        assert_eq!(parse_meminfo_percent(""), None);
    }
}
