//! Frame driver: decides when an exploration needs drawing and at what time.
//!
//! The driver is `Idle` while nothing in the config moves. It renders once
//! per change or resize at `t = 0`. Once a motion parameter becomes active it
//! switches to `Animating` and asks its scheduler for a frame after every
//! frame until motion stops, at which point it cancels the loop and draws one
//! last static frame.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::assets::{load_image, Assets};
use crate::config::{Config, ConfigChange};
use crate::error::AssetError;
use crate::explorations::Exploration;
use crate::persistence::StateStore;
use crate::snapshots::Snapshot;
use crate::surface::Surface;

/// Host-side frame callback (an event loop, a repaint request, a test).
pub trait FrameScheduler {
    /// Ask for `frame` to be called once more.
    fn request_frame(&mut self);
    /// Drop any outstanding request.
    fn cancel_frame(&mut self);
}

/// Scheduler that just records requests; the caller pumps frames itself.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    pending: bool,
    pub requests: usize,
    pub cancels: usize,
}

impl ManualScheduler {
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consumes the outstanding request, if any.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) {
        self.pending = true;
        self.requests += 1;
    }

    fn cancel_frame(&mut self) {
        self.pending = false;
        self.cancels += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Animating,
}

/// What a config change did to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Idle -> animating; the frame loop is running.
    Started,
    /// Animating -> idle; one static frame is queued.
    Stopped,
    /// Still idle; one static frame is queued.
    Rerender,
    /// Still animating; the next frame picks the change up.
    Continue,
}

pub struct RenderDriver<S: FrameScheduler> {
    exploration: Exploration,
    config: Config,
    scheduler: S,
    state: DriverState,
    epoch: Instant,
    static_pending: bool,
    frames: u64,
}

impl<S: FrameScheduler> RenderDriver<S> {
    /// Starts in whichever state `config` implies, with the first frame requested.
    pub fn new(exploration: Exploration, config: Config, mut scheduler: S) -> Self {
        let animating = exploration.is_motion_active(&config);
        scheduler.request_frame();
        log::info!(
            "{exploration}: driver starts {}",
            if animating { "animating" } else { "idle" }
        );
        Self {
            exploration,
            config,
            scheduler,
            state: if animating {
                DriverState::Animating
            } else {
                DriverState::Idle
            },
            epoch: Instant::now(),
            static_pending: !animating,
            frames: 0,
        }
    }

    pub fn exploration(&self) -> Exploration {
        self.exploration
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Frames drawn so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Seconds since the driver was created, or 0 while idle.
    pub fn frame_time(&self, now: Instant) -> f32 {
        match self.state {
            DriverState::Animating => now.saturating_duration_since(self.epoch).as_secs_f32(),
            DriverState::Idle => 0.0,
        }
    }

    pub fn apply(&mut self, change: &ConfigChange) -> Transition {
        let mut next = self.config.clone();
        next.apply(change);
        self.set_config(next)
    }

    /// Replaces the live config and moves between idle and animating.
    pub fn set_config(&mut self, config: Config) -> Transition {
        self.config = config;
        let active = self.exploration.is_motion_active(&self.config);
        let transition = match (self.state, active) {
            (DriverState::Idle, true) => {
                self.state = DriverState::Animating;
                self.static_pending = false;
                self.scheduler.request_frame();
                Transition::Started
            }
            (DriverState::Animating, false) => {
                self.state = DriverState::Idle;
                self.scheduler.cancel_frame();
                self.queue_static();
                Transition::Stopped
            }
            (DriverState::Idle, false) => {
                self.queue_static();
                Transition::Rerender
            }
            (DriverState::Animating, true) => Transition::Continue,
        };
        log::debug!("{}: {transition:?}", self.exploration);
        transition
    }

    /// Surface or asset changed; an idle driver draws once more.
    pub fn invalidate(&mut self) {
        if self.state == DriverState::Idle {
            self.queue_static();
        }
    }

    fn queue_static(&mut self) {
        if !self.static_pending {
            self.static_pending = true;
            self.scheduler.request_frame();
        }
    }

    /// Scheduler callback. Returns whether anything was drawn.
    ///
    /// Render failures are logged and the loop carries on.
    pub fn frame<T: Surface + ?Sized>(&mut self, assets: &Assets, surface: &mut T, now: Instant) -> bool {
        match self.state {
            DriverState::Animating => self.scheduler.request_frame(),
            DriverState::Idle if self.static_pending => self.static_pending = false,
            DriverState::Idle => return false,
        }
        let time = self.frame_time(now);
        match self.exploration.render(&self.config, assets, time, surface) {
            Ok(()) => {
                self.frames += 1;
                true
            }
            Err(e) => {
                log::error!("{}: frame at t={time:.3} failed: {e}", self.exploration);
                false
            }
        }
    }
}

/// A driver plus everything around it: persisted state and loaded assets.
pub struct Session<S: FrameScheduler> {
    driver: RenderDriver<S>,
    store: Option<StateStore>,
    asset_dir: PathBuf,
    assets: Assets,
}

impl<S: FrameScheduler> Session<S> {
    /// Defaults shallow-merged with the stored state; the source image, if
    /// the exploration needs one, is loaded before the first frame.
    pub fn open(
        exploration: Exploration,
        store: Option<StateStore>,
        asset_dir: impl Into<PathBuf>,
        scheduler: S,
    ) -> Result<Self, AssetError> {
        let mut config = exploration.defaults();
        if let Some(saved) = store.as_ref().and_then(|s| s.load(exploration.id())) {
            config.merge(&saved);
        }
        let asset_dir = asset_dir.into();
        let mut assets = Assets::default();
        if let Some(name) = exploration.image_name(&config) {
            assets.image = Some(load_image(&asset_dir, &name)?);
        }
        Ok(Self {
            driver: RenderDriver::new(exploration, config, scheduler),
            store,
            asset_dir,
            assets,
        })
    }

    pub fn exploration(&self) -> Exploration {
        self.driver.exploration()
    }

    pub fn config(&self) -> &Config {
        self.driver.config()
    }

    pub fn driver(&self) -> &RenderDriver<S> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut RenderDriver<S> {
        &mut self.driver
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    /// Merge, persist, then transition. A failed image swap leaves the
    /// session untouched.
    pub fn apply(&mut self, change: &ConfigChange) -> Result<Transition, AssetError> {
        let mut next = self.config().clone();
        next.apply(change);
        self.replace(next)
    }

    /// Shallow-merges a snapshot's state into the live config.
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) -> Result<Transition, AssetError> {
        log::info!("{}: loading {}", self.exploration(), snapshot.name);
        let next = self.config().clone().merged(&snapshot.state);
        self.replace(next)
    }

    fn replace(&mut self, next: Config) -> Result<Transition, AssetError> {
        let exploration = self.exploration();
        let wanted = exploration.image_name(&next);
        if wanted != exploration.image_name(self.config()) {
            if let Some(name) = wanted {
                self.assets.image = Some(load_image(&self.asset_dir, &name)?);
                self.driver.invalidate();
            }
        }
        if let Some(store) = &self.store {
            store.save(exploration.id(), &next);
        }
        Ok(self.driver.set_config(next))
    }

    /// Output size for a requested box.
    pub fn frame_size(&self, width: u32, height: u32) -> (u32, u32) {
        self.exploration().frame_size(&self.assets, width, height)
    }

    pub fn resize(&mut self) {
        self.driver.invalidate();
    }

    pub fn frame<T: Surface + ?Sized>(&mut self, surface: &mut T, now: Instant) -> bool {
        self.driver.frame(&self.assets, surface, now)
    }
}
