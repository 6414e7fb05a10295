//! JSON-lines trace file for hosts that load the library, behind the
//! `trace` feature. Without the feature `init_tracing` is a no-op.

use std::path::Path;

/// Trace file written under the caller's log directory.
#[cfg_attr(not(feature = "trace"), allow(dead_code))]
pub(crate) const TRACE_FILE: &str = "prefix-boost-trace.jsonl";

/// Used when `PB_TRACE` is unset or blank. The FFI layer is traced in
/// detail; the compiler crate only reports batch and per-language spans.
pub(crate) const DEFAULT_FILTER: &str = "prefix_boost=debug,boost_core=info";

/// `PB_TRACE` overrides the default directives, e.g. `boost_core=trace`.
#[cfg_attr(not(feature = "trace"), allow(dead_code))]
pub(crate) const FILTER_ENV: &str = "PB_TRACE";

#[cfg_attr(not(feature = "trace"), allow(dead_code))]
pub(crate) fn filter_directives(env: Option<&str>) -> &str {
    match env.map(str::trim) {
        Some(d) if !d.is_empty() => d,
        _ => DEFAULT_FILTER,
    }
}

#[cfg(feature = "trace")]
static INIT: std::sync::Once = std::sync::Once::new();

#[cfg(feature = "trace")]
pub fn init_tracing(log_dir: &Path) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    INIT.call_once(|| {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!("prefix-boost: cannot create {}: {e}", log_dir.display());
            return;
        }
        let file_appender = tracing_appender::rolling::never(log_dir, TRACE_FILE);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let env = std::env::var(FILTER_ENV).ok();
        let directives = filter_directives(env.as_deref());
        let filter = EnvFilter::try_new(directives).unwrap_or_else(|e| {
            eprintln!("prefix-boost: bad {FILTER_ENV} ({e}), using {DEFAULT_FILTER}");
            EnvFilter::new(DEFAULT_FILTER)
        });

        // the host may already own the global subscriber
        let installed = tracing_subscriber::fmt()
            .json()
            .with_writer(non_blocking)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_env_filter(filter)
            .try_init()
            .is_ok();
        if installed {
            std::mem::forget(guard); // flushes for the life of the host
            tracing::info!(path = %log_dir.join(TRACE_FILE).display(), "tracing enabled");
        }
    });
}

#[cfg(not(feature = "trace"))]
pub fn init_tracing(_log_dir: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        assert_eq!(filter_directives(None), DEFAULT_FILTER);
        assert_eq!(filter_directives(Some("  ")), DEFAULT_FILTER);
        assert_eq!(filter_directives(Some(" boost_core=trace ")), "boost_core=trace");
        assert!(DEFAULT_FILTER.contains("boost_core=info"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        init_tracing(&logs);
        init_tracing(&logs);
        #[cfg(feature = "trace")]
        assert!(logs.is_dir());
    }
}
