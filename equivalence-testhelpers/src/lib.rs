#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub use equivalence_testhelpers_macros::test;

use std::sync::LazyLock;
use std::time::Instant;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the targets filter.
pub const LOG_ENV: &str = "EQUIVALENCE_LOG";

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

struct Uptime;

impl FormatTime for Uptime {
    fn format_time(&self, w: &mut Writer<'_>) -> core::fmt::Result {
        let elapsed = START_TIME.elapsed();
        write!(w, "{:4}.{:03}s", elapsed.as_secs(), elapsed.subsec_millis())
    }
}

/// Frames that only ever show the test harness or panic machinery.
fn is_harness_frame(name: &str) -> bool {
    const PREFIXES: &[&str] = &[
        "test::run_test",
        "test::__rust_begin_short_backtrace",
        "std::panicking::",
        "std::panic::",
        "core::panicking::",
        "core::ops::function::FnOnce::call_once",
        "std::sys::backtrace::",
    ];
    PREFIXES.iter().any(|p| name.starts_with(p))
}

static SUBSCRIBER_INIT: LazyLock<()> = LazyLock::new(|| {
    let _ = *START_TIME;

    color_backtrace::BacktracePrinter::new()
        .verbosity(color_backtrace::Verbosity::Full)
        .add_frame_filter(Box::new(|frames| {
            frames.retain(|frame| match &frame.name {
                Some(name) => !is_harness_frame(name),
                None => true,
            })
        }))
        .install(Box::new(termcolor::StandardStream::stderr(
            termcolor::ColorChoice::AlwaysAnsi,
        )));

    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|s| s.parse::<Targets>().ok())
        .unwrap_or_else(|| Targets::new().with_default(tracing::Level::DEBUG));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_timer(Uptime)
                .with_target(true)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .try_init()
        .ok();
});

/// Installs the test subscriber and panic printer, once per process.
///
/// Called automatically by [`test`]; call it by hand from helpers that run
/// outside an annotated test.
pub fn setup() {
    #[allow(clippy::let_unit_value)]
    let _ = *SUBSCRIBER_INIT;
}
