pub mod error;
pub mod fleet;
pub mod heading;
pub mod logging;
pub mod marker;

mod runtime;

uniffi::setup_scaffolding!();

/// Route panics through tracing so they land in logcat with a backtrace.
/// Call this once at startup from Kotlin/Swift.
#[uniffi::export]
pub fn init_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        tracing::error!("{panic_info}\nBacktrace:\n{backtrace}");
    }));
}
