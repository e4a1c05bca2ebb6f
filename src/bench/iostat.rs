use serde::Serialize;
use tracing::warn;

/// Point-in-time capture of per-process OS resource counters. Platforms
/// that do not expose a counter leave it zero; the first miss is logged
/// once so derived deltas are not misread as "no IO happened".
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct IoSnapshot {
    pub major_faults: u64,
    pub minor_faults: u64,
    pub voluntary_ctx_switches: u64,
    pub involuntary_ctx_switches: u64,
    /// Bytes fetched from the storage layer, per `/proc/self/io`.
    pub disk_bytes_read: u64,
    /// Peak resident set, kilobytes.
    pub max_rss_kb: u64,
}

impl IoSnapshot {
    pub fn capture() -> Self {
        #[cfg(unix)]
        {
            capture_unix()
        }
        #[cfg(not(unix))]
        {
            warn_unavailable("process resource counters");
            Self::default()
        }
    }
}

/// Counter movement across a measurement window, plus the window-end
/// peak RSS.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct IoDeltas {
    pub major_faults: u64,
    pub minor_faults: u64,
    pub voluntary_ctx_switches: u64,
    pub involuntary_ctx_switches: u64,
    pub disk_bytes_read: u64,
    pub peak_rss_gb: f64,
}

impl IoDeltas {
    pub fn between(start: &IoSnapshot, end: &IoSnapshot) -> Self {
        Self {
            major_faults: end.major_faults.saturating_sub(start.major_faults),
            minor_faults: end.minor_faults.saturating_sub(start.minor_faults),
            voluntary_ctx_switches: end
                .voluntary_ctx_switches
                .saturating_sub(start.voluntary_ctx_switches),
            involuntary_ctx_switches: end
                .involuntary_ctx_switches
                .saturating_sub(start.involuntary_ctx_switches),
            disk_bytes_read: end.disk_bytes_read.saturating_sub(start.disk_bytes_read),
            peak_rss_gb: end.max_rss_kb as f64 / (1024.0 * 1024.0),
        }
    }
}

fn warn_unavailable(what: &str) {
    use std::sync::atomic::{AtomicBool, Ordering};
    static WARNED: AtomicBool = AtomicBool::new(false);
    if !WARNED.swap(true, Ordering::Relaxed) {
        warn!("{what} unavailable on this platform; affected IO stats will read zero");
    }
}

#[cfg(unix)]
fn capture_unix() -> IoSnapshot {
    use std::mem::MaybeUninit;

    let mut snap = IoSnapshot::default();

    let mut ru = MaybeUninit::<libc::rusage>::zeroed();
    // Safety: getrusage fills the whole struct when it returns 0.
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, ru.as_mut_ptr()) };
    if rc == 0 {
        let ru = unsafe { ru.assume_init() };
        snap.major_faults = ru.ru_majflt.max(0) as u64;
        snap.minor_faults = ru.ru_minflt.max(0) as u64;
        snap.voluntary_ctx_switches = ru.ru_nvcsw.max(0) as u64;
        snap.involuntary_ctx_switches = ru.ru_nivcsw.max(0) as u64;
        snap.max_rss_kb = ru.ru_maxrss.max(0) as u64;
    } else {
        warn_unavailable("getrusage");
    }

    match proc_io_read_bytes() {
        Some(bytes) => snap.disk_bytes_read = bytes,
        None => warn_unavailable("/proc/self/io"),
    }
    snap
}

#[cfg(target_os = "linux")]
fn proc_io_read_bytes() -> Option<u64> {
    let raw = std::fs::read_to_string("/proc/self/io").ok()?;
    raw.lines()
        .find_map(|line| line.strip_prefix("read_bytes:"))
        .and_then(|rest| rest.trim().parse().ok())
}

#[cfg(all(unix, not(target_os = "linux")))]
fn proc_io_read_bytes() -> Option<u64> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_never_underflow() {
        let start = IoSnapshot {
            minor_faults: 100,
            ..Default::default()
        };
        let end = IoSnapshot {
            minor_faults: 40,
            max_rss_kb: 2 * 1024 * 1024,
            ..Default::default()
        };
        let deltas = IoDeltas::between(&start, &end);
        assert_eq!(deltas.minor_faults, 0);
        assert!((deltas.peak_rss_gb - 2.0).abs() < 1e-9);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_capture_sees_a_resident_set() {
        let snap = IoSnapshot::capture();
        assert!(snap.max_rss_kb > 0);
    }
}
