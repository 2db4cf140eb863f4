use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shuttle_core::GeoPosition;
use shuttle_core::animation::PositionSink;
use shuttle_core::fleet::{BusId, FleetConfig, FleetTracker, FleetUpdate};

use crate::error::MarkerError;
use crate::marker::{LatLng, MarkerOptions};
use crate::runtime::ui_handle;

#[uniffi::export(with_foreign)]
pub trait FleetListener: Send + Sync {
    fn on_bus_position(&self, bus_id: String, position: LatLng);
}

type SinkFactory = Box<dyn Fn(&BusId) -> Box<dyn PositionSink> + Send>;

/// Every bus on the live map, fed straight from the location subscription.
#[derive(uniffi::Object)]
pub struct FleetAnimator {
    tracker: Mutex<FleetTracker<SinkFactory>>,
}

impl FleetAnimator {
    fn tracker(&self) -> MutexGuard<'_, FleetTracker<SinkFactory>> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[uniffi::export]
impl FleetAnimator {
    #[uniffi::constructor]
    pub fn new(
        options: MarkerOptions,
        listener: Arc<dyn FleetListener>,
    ) -> Result<Arc<Self>, MarkerError> {
        let config = FleetConfig {
            animation: options.animation_config(),
            significance_threshold_meters: options.threshold_meters,
        };

        let factory: SinkFactory = Box::new(move |bus: &BusId| -> Box<dyn PositionSink> {
            let listener = Arc::clone(&listener);
            let bus_id = bus.as_str().to_owned();
            Box::new(move |position: GeoPosition| {
                listener.on_bus_position(bus_id.clone(), position.into())
            })
        });

        let tracker = FleetTracker::new(config, factory, ui_handle()?)?;

        Ok(Arc::new(Self {
            tracker: Mutex::new(tracker),
        }))
    }

    /// Returns true if the bus was newly added or its fix was significant.
    pub fn update(&self, bus_id: String, position: LatLng) -> Result<bool, MarkerError> {
        let update = self
            .tracker()
            .update(&BusId::new(bus_id), position.try_into()?)?;

        Ok(match update {
            FleetUpdate::Added => true,
            FleetUpdate::Moved(outcome) => outcome.is_accepted(),
        })
    }

    pub fn remove(&self, bus_id: String) -> bool {
        self.tracker().remove(&BusId::new(bus_id))
    }

    /// Drop every bus not in `active`, e.g. after the feed stops reporting it.
    pub fn retain_only(&self, active: Vec<String>) {
        self.tracker()
            .retain(|bus| active.iter().any(|id| id == bus.as_str()));
    }

    pub fn position_of(&self, bus_id: String) -> Option<LatLng> {
        self.tracker()
            .position_of(&BusId::new(bus_id))
            .map(LatLng::from)
    }

    pub fn bus_ids(&self) -> Vec<String> {
        self.tracker()
            .buses()
            .map(|bus| bus.as_str().to_owned())
            .collect()
    }
}
