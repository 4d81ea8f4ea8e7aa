use std::time::{Duration, Instant};

/// Logs how long a pipeline step took when dropped
pub struct ProfileScope {
    label: String,
    start: Instant,
}

impl ProfileScope {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        log::debug!(
            "[PROFILE] {} - {:.3}ms",
            self.label,
            self.elapsed().as_secs_f64() * 1000.0
        );
    }
}

/// Time the rest of the enclosing scope
#[macro_export]
macro_rules! profile_scope {
    ($label:expr) => {
        let _profile_scope = $crate::profiling::ProfileScope::new($label);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_grows() {
        let scope = ProfileScope::new("sleep");
        std::thread::sleep(Duration::from_millis(5));
        assert!(scope.elapsed() >= Duration::from_millis(5));
    }
}
