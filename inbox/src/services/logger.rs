use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set. Debug builds default to debug output for this
/// crate and info for everything else; release builds default to info.
/// Calling it twice is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("inbox=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn fmt_ms(d: Duration) -> String {
    let ms = d.as_millis();
    if ms == 0 { "<1ms".into() } else { format!("{}ms", ms) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_ms() {
        assert_eq!(fmt_ms(Duration::from_micros(300)), "<1ms");
        assert_eq!(fmt_ms(Duration::from_millis(2000)), "2000ms");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init();
        init();
    }
}
