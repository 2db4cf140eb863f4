use std::sync::Once;

use tracing::Metadata;
use tracing_subscriber::{filter::FilterFn, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the tracing subscriber. Safe to call more than once.
#[uniffi::export]
pub fn init_logging() {
    static LOGGING_SETUP: Once = Once::new();

    LOGGING_SETUP.call_once(install);
}

fn shuttle_only() -> FilterFn<impl Fn(&Metadata<'_>) -> bool> {
    FilterFn::new(|metadata: &Metadata<'_>| {
        metadata
            .module_path()
            .unwrap_or_default()
            .starts_with("shuttle")
    })
}

#[cfg(target_os = "android")]
fn install() {
    use tracing_logcat::{LogcatMakeWriter, LogcatTag};
    use tracing_subscriber::fmt::format::Format;

    let tag = LogcatTag::Fixed("Shuttle-Rust".to_owned());
    let Ok(writer) = LogcatMakeWriter::new(tag) else {
        return;
    };
    let layer = tracing_subscriber::fmt::layer()
        .event_format(Format::default().with_level(false).without_time())
        .with_writer(writer)
        .with_ansi(false);

    let _ = tracing_subscriber::registry()
        .with(layer)
        .with(shuttle_only())
        .try_init();
}

#[cfg(not(target_os = "android"))]
fn install() {
    let layer = tracing_subscriber::fmt::layer().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(layer)
        .with(shuttle_only())
        .try_init();
}
