use time::macros::format_description;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[doc(hidden)]
pub mod __private {
    pub use tracing;
}

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let time_format =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:2]");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_timer(fmt::time::LocalTime::new(time_format))
                .with_target(false)
                .with_level(true)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .with_span_events(fmt::format::FmtSpan::NONE)
                .compact(),
        )
        .with(filter)
        .init();
}

/// Run a block and log how long it took at `info`.
///
/// The block is inlined, so `?` and `return` inside it act on the caller.
///
/// ```ignore
/// let rows = timeit!("Loaded staging tables", {
///     loader.load(&mut adapter, &mut report).await?
/// });
/// ```
#[macro_export]
macro_rules! timeit {
    ($label:expr, $body:block) => {{
        let __timeit_start = ::std::time::Instant::now();
        let __timeit_result = $body;
        $crate::__private::tracing::info!(
            "{} in {:.2?}",
            $label,
            __timeit_start.elapsed()
        );
        __timeit_result
    }};
}
