//! Explorations AH - generative-art gallery core.
//! - Simplex noise, fbm octave stacks and layered domain warping
//! - OKLCH -> linear / sRGB conversion
//! - Ordered stylization passes (grain, Bayer dither, halftone, pixelate, posterize, color adjust)
//! - Seven explorations rendered as pure functions of (config, time) onto any `Surface`
//! - Render driver (idle / animating), persisted state and named snapshots

pub mod ascii;
pub mod assets;
pub mod color;
pub mod config;
pub mod driver;
pub mod error;
pub mod explorations;
pub mod export;
pub mod fbm;
pub mod noise;
pub mod passes;
pub mod persistence;
pub mod snapshots;
pub mod surface;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use color::Oklch;
pub use config::{ChangeValue, Config, ConfigChange, Value};
pub use driver::{DriverState, FrameScheduler, RenderDriver, Session, Transition};
pub use error::{AssetError, PipelineError, RenderError};
pub use explorations::Exploration;
pub use passes::{Pass, Pipeline};
pub use surface::{ImageSurface, Surface};
