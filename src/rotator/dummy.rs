//! Simulated rotator for running the hub without hardware.
//!
//! [`DummyRotator`] accepts commands like a real positioner and slews
//! towards its presets at a fixed rate, publishing a
//! [`RotatorEvent`] for every change.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::MissedTickBehavior;

use crate::domain::{Axis, EventBus, Info, Rotator, RotatorEvent, Status};
use crate::error::RotatorError;

/// Settings of a [`DummyRotator`].
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Rotator name.
    pub name: String,
    /// Whether the azimuth axis exists.
    pub has_azimuth: bool,
    /// Whether the elevation axis exists.
    pub has_elevation: bool,
    /// Lowest azimuth.
    pub azimuth_min: i32,
    /// Highest azimuth. Values above 360 enable overlap.
    pub azimuth_max: i32,
    /// Azimuth mechanical stop.
    pub azimuth_stop: i32,
    /// Lowest elevation.
    pub elevation_min: i32,
    /// Highest elevation.
    pub elevation_max: i32,
    /// Elevation mechanical stop.
    pub elevation_stop: i32,
    /// Starting azimuth.
    pub initial_azimuth: i32,
    /// Starting elevation.
    pub initial_elevation: i32,
    /// Degrees travelled per tick.
    pub step: i32,
    /// Interval between movement ticks.
    pub tick: Duration,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            name: "dummyRotator".to_string(),
            has_azimuth: true,
            has_elevation: true,
            azimuth_min: 0,
            azimuth_max: 450,
            azimuth_stop: 0,
            elevation_min: 0,
            elevation_max: 180,
            elevation_stop: 0,
            initial_azimuth: 0,
            initial_elevation: 0,
            step: 5,
            tick: Duration::from_millis(100),
        }
    }
}

/// In-process rotator that moves towards its presets over time.
#[derive(Debug)]
pub struct DummyRotator {
    state: Arc<RwLock<Info>>,
    events: Option<EventBus>,
}

impl DummyRotator {
    /// Creates the rotator and starts its movement ticker.
    ///
    /// The ticker stops once the rotator is dropped. Must be called from
    /// within a Tokio runtime.
    #[must_use]
    pub fn spawn(config: DummyConfig, events: Option<EventBus>) -> Self {
        let azimuth = config
            .initial_azimuth
            .clamp(config.azimuth_min, config.azimuth_max.max(config.azimuth_min));
        let elevation = config
            .initial_elevation
            .clamp(config.elevation_min, config.elevation_max.max(config.elevation_min));
        let info = Info {
            name: config.name,
            has_azimuth: config.has_azimuth,
            has_elevation: config.has_elevation,
            azimuth_min: config.azimuth_min,
            azimuth_max: config.azimuth_max,
            azimuth_stop: config.azimuth_stop,
            azimuth_overlap: config.azimuth_max > 360,
            elevation_min: config.elevation_min,
            elevation_max: config.elevation_max,
            elevation_stop: config.elevation_stop,
            azimuth,
            az_preset: azimuth,
            elevation,
            el_preset: elevation,
        };
        tracing::info!(name = %info.name, "dummy rotator started");
        let state = Arc::new(RwLock::new(info));
        tokio::spawn(slew(
            Arc::downgrade(&state),
            events.clone(),
            config.step.max(1),
            config.tick,
        ));
        Self { state, events }
    }

    fn read(&self) -> RwLockReadGuard<'_, Info> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Info> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, axis: Axis, status: Status) {
        if let Some(bus) = &self.events {
            bus.publish(RotatorEvent { axis, status });
        }
    }

    /// Applies `update` to the preset of `axis` and publishes the change.
    fn command(
        &self,
        axis: Axis,
        update: impl FnOnce(&mut Info) -> Result<bool, RotatorError>,
    ) -> Result<(), RotatorError> {
        // Publishing under the lock keeps notifications in state order.
        let mut guard = self.write();
        let info = &mut *guard;
        let available = match axis {
            Axis::Azimuth => info.has_azimuth,
            Axis::Elevation => info.has_elevation,
        };
        if !available {
            return Err(RotatorError::AxisUnavailable(axis));
        }
        if update(&mut *info)? {
            self.publish(axis, info.status());
        }
        Ok(())
    }
}

fn check_range(axis: Axis, value: i32, min: i32, max: i32) -> Result<(), RotatorError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(RotatorError::OutOfRange {
            axis,
            value,
            min,
            max,
        })
    }
}

/// Moves `current` at most `step` degrees towards `target`.
fn approach(current: &mut i32, target: i32, step: i32) -> bool {
    let delta = target.saturating_sub(*current).clamp(-step, step);
    *current = current.saturating_add(delta);
    delta != 0
}

async fn slew(state: Weak<RwLock<Info>>, events: Option<EventBus>, step: i32, tick: Duration) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let Some(shared) = state.upgrade() else {
            break;
        };
        {
            let mut guard = shared.write().unwrap_or_else(PoisonError::into_inner);
            let info = &mut *guard;
            let mut moved = Vec::with_capacity(2);
            if approach(&mut info.azimuth, info.az_preset, step) {
                moved.push(Axis::Azimuth);
            }
            if approach(&mut info.elevation, info.el_preset, step) {
                moved.push(Axis::Elevation);
            }
            if let Some(bus) = &events {
                for axis in moved {
                    bus.publish(RotatorEvent {
                        axis,
                        status: info.status(),
                    });
                }
            }
        }
    }
    tracing::debug!("dummy rotator ticker stopped");
}

#[async_trait]
impl Rotator for DummyRotator {
    fn name(&self) -> String {
        self.read().name.clone()
    }

    fn has_azimuth(&self) -> bool {
        self.read().has_azimuth
    }

    fn has_elevation(&self) -> bool {
        self.read().has_elevation
    }

    fn azimuth(&self) -> i32 {
        self.read().azimuth
    }

    fn az_preset(&self) -> i32 {
        self.read().az_preset
    }

    fn elevation(&self) -> i32 {
        self.read().elevation
    }

    fn el_preset(&self) -> i32 {
        self.read().el_preset
    }

    fn status(&self) -> Status {
        self.read().status()
    }

    fn info(&self) -> Info {
        self.read().clone()
    }

    async fn set_azimuth(&self, azimuth: i32) -> Result<(), RotatorError> {
        self.command(Axis::Azimuth, |info| {
            check_range(Axis::Azimuth, azimuth, info.azimuth_min, info.azimuth_max)?;
            let changed = info.az_preset != azimuth;
            info.az_preset = azimuth;
            Ok(changed)
        })
    }

    async fn set_elevation(&self, elevation: i32) -> Result<(), RotatorError> {
        self.command(Axis::Elevation, |info| {
            check_range(
                Axis::Elevation,
                elevation,
                info.elevation_min,
                info.elevation_max,
            )?;
            let changed = info.el_preset != elevation;
            info.el_preset = elevation;
            Ok(changed)
        })
    }

    async fn stop_azimuth(&self) -> Result<(), RotatorError> {
        self.command(Axis::Azimuth, |info| {
            let changed = info.az_preset != info.azimuth;
            info.az_preset = info.azimuth;
            Ok(changed)
        })
    }

    async fn stop_elevation(&self) -> Result<(), RotatorError> {
        self.command(Axis::Elevation, |info| {
            let changed = info.el_preset != info.elevation;
            info.el_preset = info.elevation;
            Ok(changed)
        })
    }

    async fn stop(&self) -> Result<(), RotatorError> {
        if self.has_azimuth() {
            self.stop_azimuth().await?;
        }
        if self.has_elevation() {
            self.stop_elevation().await?;
        }
        Ok(())
    }
}
