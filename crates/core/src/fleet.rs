//! One animation queue per bus currently shown on the map.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tracing::info;

use crate::animation::{AnimationConfig, Enqueued, PositionAnimationQueue, PositionSink};
use crate::error::{CoreError, Result};
use crate::position::GeoPosition;

pub const DEFAULT_SIGNIFICANCE_THRESHOLD_METERS: f64 = 5.0;

/// Bus (or driver) identifier as it appears in the live-location feed.
#[derive(Clone, Debug)]
pub struct BusId(Arc<str>);

impl BusId {
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for BusId {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for BusId {}

impl Hash for BusId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BusId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BusId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    #[serde(flatten)]
    pub animation: AnimationConfig,
    pub significance_threshold_meters: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            animation: AnimationConfig::default(),
            significance_threshold_meters: DEFAULT_SIGNIFICANCE_THRESHOLD_METERS,
        }
    }
}

impl FleetConfig {
    pub fn validate(&self) -> Result<()> {
        let threshold = self.significance_threshold_meters;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(CoreError::InvalidThreshold(threshold));
        }

        self.animation.validate()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FleetUpdate {
    /// First fix for this bus; its marker starts here without animating.
    Added,
    Moved(Enqueued),
}

pub struct FleetTracker<F> {
    config: FleetConfig,
    ui: Handle,
    sink_factory: F,
    markers: HashMap<BusId, PositionAnimationQueue>,
}

impl<F> FleetTracker<F>
where
    F: Fn(&BusId) -> Box<dyn PositionSink>,
{
    pub fn new(config: FleetConfig, sink_factory: F, ui: Handle) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            ui,
            sink_factory,
            markers: HashMap::new(),
        })
    }

    pub fn update(&mut self, bus: &BusId, position: GeoPosition) -> Result<FleetUpdate> {
        if let Some(queue) = self.markers.get(bus) {
            let outcome = queue.enqueue(position, self.config.significance_threshold_meters)?;
            return Ok(FleetUpdate::Moved(outcome));
        }

        let queue = PositionAnimationQueue::with_sink(
            position,
            (self.sink_factory)(bus),
            self.config.animation.clone(),
            self.ui.clone(),
        )?;
        self.markers.insert(bus.clone(), queue);
        info!(%bus, %position, "tracking bus");

        Ok(FleetUpdate::Added)
    }

    /// Stop tracking a bus, abandoning its animation. Returns whether it was
    /// tracked.
    pub fn remove(&mut self, bus: &BusId) -> bool {
        let removed = self.markers.remove(bus).is_some();
        if removed {
            info!(%bus, "stopped tracking bus");
        }
        removed
    }

    /// Keep only the buses for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&BusId) -> bool) {
        self.markers.retain(|bus, _| keep(bus));
    }

    pub fn position_of(&self, bus: &BusId) -> Option<GeoPosition> {
        self.markers.get(bus).map(|queue| queue.current_position())
    }

    pub fn is_animating(&self, bus: &BusId) -> bool {
        self.markers
            .get(bus)
            .is_some_and(|queue| queue.is_animating())
    }

    pub fn buses(&self) -> impl Iterator<Item = &BusId> {
        self.markers.keys()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }
}
