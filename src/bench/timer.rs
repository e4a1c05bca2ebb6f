use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use tracing::{error, info};

/// Measures the lifetime of a scope in microseconds and hands the result
/// to a callback on drop. A panicking callback is caught and logged; it
/// never propagates out of the destructor.
pub struct ScopedTimer<'a> {
    callback: Option<Box<dyn FnOnce(u64) + 'a>>,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    pub fn with(callback: impl FnOnce(u64) + 'a) -> Self {
        Self {
            callback: Some(Box::new(callback)),
            start: Instant::now(),
        }
    }

    /// Logs "`<op>: <elapsed> ms`" when the scope ends.
    pub fn named(op: impl Into<String>) -> ScopedTimer<'static> {
        let op = op.into();
        ScopedTimer::with(move |us| info!("{op}: {:.3} ms", us as f64 / 1000.0))
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        let elapsed_us = self.start.elapsed().as_micros() as u64;
        if let Some(callback) = self.callback.take() {
            if catch_unwind(AssertUnwindSafe(|| callback(elapsed_us))).is_err() {
                error!("scoped timer callback panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn callback_receives_elapsed_micros() {
        let mut recorded = None;
        {
            let _timer = ScopedTimer::with(|us| recorded = Some(us));
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(recorded.expect("callback ran") >= 5_000);
    }

    #[test]
    fn panicking_callback_is_contained() {
        {
            let _timer = ScopedTimer::with(|_| panic!("boom"));
        }
        // Reaching this line means the panic stayed inside the drop.
    }

    #[test]
    fn named_timer_logs_without_panicking() {
        let _timer = ScopedTimer::named("test operation");
    }
}
