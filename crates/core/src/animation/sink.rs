use tokio::sync::watch;

use crate::position::GeoPosition;

/// Receives every rendered marker position.
///
/// Only ever called from the draining task, i.e. on the UI runtime.
pub trait PositionSink: Send + Sync + 'static {
    fn on_position(&self, position: GeoPosition);
}

impl<F> PositionSink for F
where
    F: Fn(GeoPosition) + Send + Sync + 'static,
{
    fn on_position(&self, position: GeoPosition) {
        self(position)
    }
}

/// A sink that publishes into a `watch` channel, for consumers that only care
/// about the latest rendered position.
pub fn watch_sink(start: GeoPosition) -> (impl PositionSink, watch::Receiver<GeoPosition>) {
    let (sender, receiver) = watch::channel(start);
    let sink = move |position: GeoPosition| {
        sender.send_replace(position);
    };

    (sink, receiver)
}
