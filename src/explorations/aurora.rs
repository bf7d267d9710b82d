//! Northern lights: layered noise curtains with rays over a starry sky.

use glam::{Vec2, Vec3};

use crate::color::{mix3, smoothstep};
use crate::config::{Config, Param, Template};
use crate::fbm::Fbm;
use crate::noise::{fract, simplex2, sine_hash};
use crate::surface::Shader;

pub const DEFAULTS: &Template = &[
    ("primaryL", Param::Num(0.75)),
    ("primaryC", Param::Num(0.22)),
    ("primaryH", Param::Num(155.0)),
    ("secondaryL", Param::Num(0.5)),
    ("secondaryC", Param::Num(0.15)),
    ("secondaryH", Param::Num(280.0)),
    ("skyL", Param::Num(0.15)),
    ("skyC", Param::Num(0.05)),
    ("skyH", Param::Num(220.0)),
    ("intensity", Param::Num(1.0)),
    ("curtainCount", Param::Num(4.0)),
    ("waveSpeed", Param::Num(0.5)),
    ("verticalStretch", Param::Num(0.8)),
    ("starDensity", Param::Num(0.5)),
    ("starBrightness", Param::Num(0.6)),
];

const MAX_CURTAINS: u32 = 8;
const RAYS: u32 = 8;
const STAR_KEY: Vec2 = Vec2::new(127.1, 311.7);

/// Star twinkle runs on wall time, so stars alone keep the piece moving.
pub fn is_motion_active(cfg: &Config) -> bool {
    cfg.num("waveSpeed") != 0.0 || (cfg.num("starDensity") > 0.0 && cfg.num("starBrightness") > 0.0)
}

pub struct Scene {
    aspect: f32,
    size: Vec2,
    clock: f32,
    time: f32,
    primary: Vec3,
    secondary: Vec3,
    sky: Vec3,
    intensity: f32,
    curtains: u32,
    stretch: f32,
    star_density: f32,
    star_brightness: f32,
    detail: Fbm,
}

struct Curtain {
    glow: f32,
    rays: f32,
}

impl Scene {
    pub fn new(cfg: &Config, (width, height): (u32, u32), time: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            size: Vec2::new(width as f32, height as f32),
            clock: time,
            time: time * cfg.num("waveSpeed"),
            primary: cfg.color("primary").to_linear_rgb(),
            secondary: cfg.color("secondary").to_linear_rgb(),
            sky: cfg.color("sky").to_linear_rgb(),
            intensity: cfg.num("intensity"),
            curtains: cfg.num("curtainCount").max(0.0).min(MAX_CURTAINS as f32) as u32,
            stretch: cfg.num("verticalStretch"),
            star_density: cfg.num("starDensity"),
            star_brightness: cfg.num("starBrightness"),
            detail: Fbm::new(2.0),
        }
    }

    fn stars(&self, uv: Vec2) -> f32 {
        let grid = uv * 100.0;
        let local = Vec2::new(fract(grid.x), fract(grid.y)) - Vec2::splat(0.5);
        let id = grid.floor();
        let rnd = sine_hash(id, STAR_KEY);
        if rnd >= self.star_density * 0.3 {
            return 0.0;
        }
        let size = 0.03 + rnd * 0.05;
        let brightness = sine_hash(id + Vec2::splat(100.0), STAR_KEY);
        let twinkle = (self.clock * (1.0 + rnd * 3.0) + rnd * 6.28).sin() * 0.3 + 0.7;
        smoothstep(size, 0.0, local.length()) * brightness * twinkle
    }

    fn curtain(&self, uv: Vec2, offset: f32, time: f32) -> Curtain {
        let wave1 = (uv.x * 2.5 + time * 0.4 + offset).sin() * 0.08;
        let wave2 = (uv.x * 5.0 - time * 0.25 + offset * 2.0).sin() * 0.04;
        let wave3 = simplex2(Vec2::new(uv.x * 1.5 + time * 0.15, offset)) * 0.06;
        let y = uv.y + wave1 + wave2 + wave3;

        let base = 0.45 + offset * 0.08;
        let height = 0.25 * self.stretch;
        let vertical = smoothstep(base - 0.05, base + height * 0.3, y) * smoothstep(base + height, base, y);

        // Bright and dim stretches along the band.
        let n1 = simplex2(Vec2::new(uv.x * 1.2 + offset * 0.7, time * 0.1)) * 0.5 + 0.5;
        let n2 = simplex2(Vec2::new(uv.x * 3.0 - offset, time * 0.15 + 10.0)) * 0.5 + 0.5;
        let along = 0.15 + smoothstep(0.2, 0.8, n1 * 0.6 + n2 * 0.4) * 0.85;

        let density = along * along;
        let mut rays = 0.0;
        for i in 0..RAYS {
            let i = i as f32;
            let ray_x = uv.x + offset * 0.5 + i * 0.15;
            let ray_noise = simplex2(Vec2::new(ray_x * 8.0, time * 0.2 + i));
            let threshold = 0.3 + (1.0 - density) * 0.5;
            let presence = smoothstep(
                threshold,
                threshold + 0.3,
                simplex2(Vec2::new(ray_x * 4.0 + offset, i * 2.0 + time * 0.05)) * 0.5 + 0.5 + density * 0.3,
            );
            let width = 0.015 + density * 0.025 + ray_noise * 0.01;
            let ray_height = height * (0.4 + density * 0.5);
            let ray = smoothstep(width, 0.0, (fract(ray_x * 4.0 + ray_noise * 0.15) - 0.5).abs())
                * smoothstep(base - 0.02, base + ray_height, y)
                * smoothstep(base + ray_height + 0.1, base, y)
                * presence;
            rays += ray * 0.25 * along;
        }

        let variation = self.detail.sample(Vec2::new(uv.x * 4.0 + offset, y * 2.0 + time * 0.08));
        Curtain {
            glow: vertical * along * (0.8 + variation * 0.3),
            rays,
        }
    }
}

impl Shader for Scene {
    fn shade(&self, pixel: Vec2) -> Vec3 {
        let uv = Vec2::new(pixel.x / self.size.x, 1.0 - pixel.y / self.size.y);
        let adjusted = Vec2::new(uv.x * self.aspect, uv.y);

        let mut sky = self.sky * (0.6 + uv.y * 0.4);
        sky += Vec3::splat(self.detail.sample(adjusted * 3.0 + Vec2::splat(self.time * 0.02)) * 0.05);

        let mut aurora = Vec3::ZERO;
        let mut total = 0.0;
        let ray_color = self.primary * 1.3;
        for i in 0..self.curtains {
            let fi = i as f32;
            let offset = fi * 1.8 + fi * 0.4;
            let curtain = self.curtain(adjusted, offset, self.time + fi * 0.6);
            let blend = (fi * 0.8 + uv.x * 2.0 + self.time * 0.15).sin() * 0.5 + 0.5;
            let tint = mix3(self.primary, self.secondary, blend * 0.35);
            let fade = 1.0 - fi * 0.12;
            aurora += tint * curtain.glow * fade + ray_color * curtain.rays * fade;
            total += (curtain.glow + curtain.rays) * fade;
        }
        aurora *= self.intensity;
        total *= self.intensity;

        let stars = self.stars(adjusted) * (1.0 - smoothstep(0.0, 0.5, total));
        let glow = mix3(self.primary, self.secondary, 0.3) * total * 0.3;

        let color = sky + Vec3::splat(stars * self.star_brightness) + aurora + glow * 0.5;
        color.max(Vec3::ZERO).powf(0.95)
    }
}
