//! The seven gallery pieces. Each one is a pure function of
//! (config, assets, time) drawn through `surface::rasterize`.

use std::fmt;
use std::str::FromStr;

use crate::assets::{fit_within, Assets};
use crate::config::Config;
use crate::error::RenderError;
use crate::surface::{rasterize, Surface};

pub mod aurora;
pub mod domain_warp;
pub mod grainy_gradient;
pub mod image_treatment;
pub mod loader_grid;
pub mod logo_pulse;
pub mod polar_grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exploration {
    PolarGrid,
    GrainyGradient,
    ImageTreatment,
    LoaderGrid,
    Aurora,
    LogoPulse,
    DomainWarp,
}

impl Exploration {
    pub const ALL: [Exploration; 7] = [
        Exploration::PolarGrid,
        Exploration::GrainyGradient,
        Exploration::ImageTreatment,
        Exploration::LoaderGrid,
        Exploration::Aurora,
        Exploration::LogoPulse,
        Exploration::DomainWarp,
    ];

    /// Stable identifier; also the persistence key prefix.
    pub fn id(self) -> &'static str {
        match self {
            Exploration::PolarGrid => "exploration-01",
            Exploration::GrainyGradient => "exploration-02",
            Exploration::ImageTreatment => "exploration-03",
            Exploration::LoaderGrid => "exploration-04",
            Exploration::Aurora => "exploration-05",
            Exploration::LogoPulse => "exploration-06",
            Exploration::DomainWarp => "exploration-07",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Exploration::PolarGrid => "polar-grid",
            Exploration::GrainyGradient => "grainy-gradient",
            Exploration::ImageTreatment => "image-treatment",
            Exploration::LoaderGrid => "loader-grid",
            Exploration::Aurora => "aurora",
            Exploration::LogoPulse => "logo-pulse",
            Exploration::DomainWarp => "domain-warp",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Exploration::PolarGrid => "Polar Grid",
            Exploration::GrainyGradient => "Grainy Gradient",
            Exploration::ImageTreatment => "Image Treatment",
            Exploration::LoaderGrid => "Loader Grid",
            Exploration::Aurora => "Aurora",
            Exploration::LogoPulse => "Logo Pulse",
            Exploration::DomainWarp => "Domain Warp",
        }
    }

    pub fn defaults(self) -> Config {
        let template = match self {
            Exploration::PolarGrid => polar_grid::DEFAULTS,
            Exploration::GrainyGradient => grainy_gradient::DEFAULTS,
            Exploration::ImageTreatment => image_treatment::DEFAULTS,
            Exploration::LoaderGrid => loader_grid::DEFAULTS,
            Exploration::Aurora => aurora::DEFAULTS,
            Exploration::LogoPulse => logo_pulse::DEFAULTS,
            Exploration::DomainWarp => domain_warp::DEFAULTS,
        };
        Config::from_template(template)
    }

    /// Whether `cfg` has any parameter that makes successive frames differ.
    pub fn is_motion_active(self, cfg: &Config) -> bool {
        let cfg = self.defaults().merged(cfg);
        match self {
            Exploration::PolarGrid => polar_grid::is_motion_active(&cfg),
            Exploration::GrainyGradient => grainy_gradient::is_motion_active(&cfg),
            Exploration::ImageTreatment => image_treatment::is_motion_active(&cfg),
            Exploration::LoaderGrid => loader_grid::is_motion_active(&cfg),
            Exploration::Aurora => aurora::is_motion_active(&cfg),
            Exploration::LogoPulse => logo_pulse::is_motion_active(&cfg),
            Exploration::DomainWarp => domain_warp::is_motion_active(&cfg),
        }
    }

    /// Name of the source image this exploration needs, if any.
    pub fn image_name(self, cfg: &Config) -> Option<String> {
        match self {
            Exploration::ImageTreatment => Some(
                cfg.text("image")
                    .unwrap_or(image_treatment::DEFAULT_IMAGE)
                    .to_string(),
            ),
            _ => None,
        }
    }

    /// Output size for a requested box; image-backed pieces keep the image aspect.
    pub fn frame_size(self, assets: &Assets, width: u32, height: u32) -> (u32, u32) {
        match (self, &assets.image) {
            (Exploration::ImageTreatment, Some(img)) => fit_within(img.dimensions(), width, height),
            _ => (width, height),
        }
    }

    pub fn render<S: Surface + ?Sized>(
        self,
        cfg: &Config,
        assets: &Assets,
        time: f32,
        surface: &mut S,
    ) -> Result<(), RenderError> {
        let (width, height) = surface.dimensions();
        if width == 0 || height == 0 {
            return Err(RenderError::EmptySurface { width, height });
        }
        let cfg = self.defaults().merged(cfg);
        let size = (width, height);
        match self {
            Exploration::PolarGrid => rasterize(&polar_grid::Scene::new(&cfg, size, time), surface),
            Exploration::GrainyGradient => {
                rasterize(&grainy_gradient::Scene::new(&cfg, size, time)?, surface)
            }
            Exploration::ImageTreatment => {
                let image = assets.image.as_ref().ok_or(RenderError::MissingAsset {
                    exploration: self.id(),
                })?;
                rasterize(&image_treatment::Scene::new(&cfg, image, size, time)?, surface)
            }
            Exploration::LoaderGrid => rasterize(&loader_grid::Scene::new(&cfg, size, time), surface),
            Exploration::Aurora => rasterize(&aurora::Scene::new(&cfg, size, time), surface),
            Exploration::LogoPulse => rasterize(&logo_pulse::Scene::new(&cfg, size, time), surface),
            Exploration::DomainWarp => {
                rasterize(&domain_warp::Scene::new(&cfg, size, time)?, surface)
            }
        }
    }
}

impl fmt::Display for Exploration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Exploration {
    type Err = String;

    /// Accepts `exploration-05`, `05`, `5` or `aurora`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        let number = key.strip_prefix("exploration-").unwrap_or(&key);
        if let Ok(n) = number.parse::<usize>() {
            if (1..=Self::ALL.len()).contains(&n) {
                return Ok(Self::ALL[n - 1]);
            }
        }
        Self::ALL
            .into_iter()
            .find(|e| e.slug() == key)
            .ok_or_else(|| format!("unknown exploration `{s}` (try `list`)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_numbers_and_slugs() {
        assert_eq!("exploration-05".parse::<Exploration>(), Ok(Exploration::Aurora));
        assert_eq!("7".parse::<Exploration>(), Ok(Exploration::DomainWarp));
        assert_eq!("01".parse::<Exploration>(), Ok(Exploration::PolarGrid));
        assert_eq!("Logo-Pulse".parse::<Exploration>(), Ok(Exploration::LogoPulse));
        assert!("8".parse::<Exploration>().is_err());
        assert!("nebula".parse::<Exploration>().is_err());
    }

    #[test]
    fn ids_are_unique_and_ordered() {
        for (i, e) in Exploration::ALL.iter().enumerate() {
            assert_eq!(e.id(), format!("exploration-{:02}", i + 1));
        }
    }

    #[test]
    fn only_image_treatment_needs_an_image() {
        for e in Exploration::ALL {
            let needs = e.image_name(&e.defaults()).is_some();
            assert_eq!(needs, e == Exploration::ImageTreatment);
        }
    }
}
