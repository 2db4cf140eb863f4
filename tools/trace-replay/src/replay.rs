use anyhow::{anyhow, bail, Context, Result};
use shuttle_core::animation::{AnimationConfig, PositionAnimationQueue};
use shuttle_core::GeoPosition;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{self, Instant};

pub struct ReplaySettings {
    pub threshold_meters: f64,
    /// Gap between consecutive recorded fixes
    pub interval: Duration,
    pub animation: AnimationConfig,
}

#[derive(Debug, Default)]
pub struct ReplayStats {
    pub accepted: usize,
    pub dropped: usize,
    pub frames: usize,
    /// Longest the pending queue got while replaying
    pub max_backlog: usize,
    /// Time from the last fix until the marker reached it
    pub settle_time: Duration,
}

impl ReplayStats {
    pub fn log_summary(&self) {
        log::info!("=== Summary ===");
        log::info!("  Accepted fixes: {}", self.accepted);
        log::info!("  Dropped fixes:  {}", self.dropped);
        log::info!("  Rendered frames: {}", self.frames);
        log::info!("  Max backlog: {}", self.max_backlog);
        log::info!("  Settle time after last fix: {:?}", self.settle_time);
    }
}

pub struct ReplayReport {
    pub stats: ReplayStats,
    /// Marker positions as drawn, starting with the first fix
    pub rendered: Vec<GeoPosition>,
}

/// Feed `trace` through an animation queue on the current runtime's clock.
pub async fn replay(trace: &[GeoPosition], settings: &ReplaySettings) -> Result<ReplayReport> {
    let Some((first, rest)) = trace.split_first() else {
        bail!("Trace is empty");
    };

    let rendered = Arc::new(Mutex::new(vec![*first]));
    let sink = {
        let rendered = Arc::clone(&rendered);
        move |position: GeoPosition| {
            if let Ok(mut rendered) = rendered.lock() {
                rendered.push(position);
            }
        }
    };

    let queue = PositionAnimationQueue::new(
        *first,
        sink,
        settings.animation.clone(),
        Handle::current(),
    )
    .context("Invalid animation settings")?;

    let mut stats = ReplayStats::default();

    for (index, position) in rest.iter().enumerate() {
        time::sleep(settings.interval).await;

        let outcome = queue
            .enqueue(*position, settings.threshold_meters)
            .with_context(|| format!("Failed to enqueue fix {}", index + 1))?;

        if outcome.is_accepted() {
            stats.accepted += 1;
        } else {
            stats.dropped += 1;
            log::debug!(
                "  Dropped fix {} ({:.1} m from reference)",
                index + 1,
                outcome.distance_meters()
            );
        }
        stats.max_backlog = stats.max_backlog.max(queue.pending_len());
    }

    let last_fix = Instant::now();
    while queue.is_animating() {
        time::sleep(settings.animation.frame_interval).await;
    }
    stats.settle_time = last_fix.elapsed();
    drop(queue);

    let rendered = std::mem::take(
        &mut *rendered
            .lock()
            .map_err(|_| anyhow!("Rendered path lock poisoned"))?,
    );
    stats.frames = rendered.len().saturating_sub(1);

    Ok(ReplayReport { stats, rendered })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(latitude: f64, longitude: f64) -> GeoPosition {
        GeoPosition::new(latitude, longitude).unwrap()
    }

    fn settings(interval_ms: u64) -> ReplaySettings {
        ReplaySettings {
            threshold_meters: 5.0,
            interval: Duration::from_millis(interval_ms),
            animation: AnimationConfig::default(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_counts_and_ends_on_last_fix() {
        let trace = vec![
            position(23.8103, 90.4125),
            position(23.81031, 90.4125), // jitter
            position(23.8200, 90.4125),
            position(23.8200, 90.4300),
        ];

        let report = replay(&trace, &settings(1000)).await.unwrap();

        assert_eq!(report.stats.accepted, 2);
        assert_eq!(report.stats.dropped, 1);
        assert_eq!(report.rendered.first(), Some(&trace[0]));
        assert_eq!(report.rendered.last(), Some(&trace[3]));
        assert!(report.rendered.contains(&trace[2]));
        assert!(!report.rendered.contains(&trace[1]));
        assert_eq!(report.stats.frames, report.rendered.len() - 1);
        assert_eq!(report.stats.max_backlog, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_fixes_build_backlog() {
        let trace: Vec<GeoPosition> = (0..6)
            .map(|i| position(23.81 + i as f64 * 0.001, 90.4125))
            .collect();

        let report = replay(&trace, &settings(100)).await.unwrap();

        assert_eq!(report.stats.accepted, 5);
        assert!(report.stats.max_backlog >= 3);
        assert!(report.stats.settle_time >= Duration::from_secs(2));
        assert_eq!(report.rendered.last(), trace.last());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_trace_fails() {
        assert!(replay(&[], &settings(1000)).await.is_err());
    }
}
