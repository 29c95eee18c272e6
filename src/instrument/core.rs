use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// CPU time summed across worker threads.
///
/// Owned by whoever drives the run and lent to each worker by reference;
/// there is no process-wide counter.
#[derive(Debug, Default)]
pub struct CpuTimeAccumulator {
    total_nanos: AtomicU64,
}

impl CpuTimeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    pub fn total(&self) -> Duration {
        Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed))
    }
}

/// Measures CPU time (user + system) consumed by the calling thread.
/// Create and read it on the same thread.
#[derive(Debug, Clone, Copy)]
pub struct ThreadCpuTimer {
    start: Duration,
}

impl ThreadCpuTimer {
    pub fn start() -> Self {
        Self {
            start: thread_cpu_time(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        thread_cpu_time().saturating_sub(self.start)
    }

    /// Add the elapsed time to `acc` and return it.
    pub fn record(self, acc: &CpuTimeAccumulator) -> Duration {
        let elapsed = self.elapsed();
        acc.add(elapsed);
        elapsed
    }
}

/// CPU time of the current thread; zero if the platform cannot tell.
#[cfg(unix)]
fn thread_cpu_time() -> Duration {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: `ts` is a valid, writable timespec.
    if unsafe { libc::clock_gettime(libc::CLOCK_THREAD_CPUTIME_ID, &mut ts) } != 0 {
        return Duration::ZERO;
    }
    Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32)
}

#[cfg(not(unix))]
fn thread_cpu_time() -> Duration {
    Duration::ZERO
}

/// Resident set size of the whole process, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemRss {
    pub current: u64,
    pub peak: u64,
}

impl fmt::Display for MemRss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rss {} KiB (peak {} KiB)",
            self.current / 1024,
            self.peak / 1024
        )
    }
}

/// Current and peak RSS. Fields the platform cannot report are zero.
pub fn resident_memory() -> MemRss {
    MemRss {
        current: current_rss(),
        peak: peak_rss(),
    }
}

#[cfg(target_os = "linux")]
fn current_rss() -> u64 {
    let Ok(statm) = std::fs::read_to_string("/proc/self/statm") else {
        return 0;
    };
    let pages: u64 = statm
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    // SAFETY: sysconf has no preconditions.
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    pages * page_size.max(0) as u64
}

#[cfg(not(target_os = "linux"))]
fn current_rss() -> u64 {
    0
}

#[cfg(unix)]
fn peak_rss() -> u64 {
    // SAFETY: zeroed rusage is a valid out-parameter for getrusage.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    if unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) } != 0 {
        return 0;
    }
    let max = usage.ru_maxrss.max(0) as u64;
    // ru_maxrss is KiB on Linux, bytes on macOS
    if cfg!(target_os = "macos") { max } else { max * 1024 }
}

#[cfg(not(unix))]
fn peak_rss() -> u64 {
    0
}
