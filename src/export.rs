use std::path::{Path, PathBuf};

use image::ImageError;
use serde::{Deserialize, Serialize};

use crate::assets::Assets;
use crate::config::Config;
use crate::error::RenderError;
use crate::explorations::Exploration;
use crate::surface::ImageSurface;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum VideoCodec {
    #[default]
    H264,
    ProRes,
    Vp9,
    Av1,
}

impl VideoCodec {
    pub fn label(&self) -> &'static str {
        match self {
            VideoCodec::H264 => "H.264",
            VideoCodec::ProRes => "ProRes 422",
            VideoCodec::Vp9 => "VP9",
            VideoCodec::Av1 => "AV1",
        }
    }

    pub fn ffmpeg_args(&self, crf: u8) -> Vec<String> {
        let crf = crf.to_string();
        let args = match self {
            VideoCodec::H264 => ["-c:v", "libx264", "-pix_fmt", "yuv420p", "-crf", crf.as_str()],
            VideoCodec::ProRes => ["-c:v", "prores_ks", "-profile:v", "3", "-pix_fmt", "yuv422p10le"],
            VideoCodec::Vp9 => ["-c:v", "libvpx-vp9", "-b:v", "0", "-crf", crf.as_str()],
            VideoCodec::Av1 => ["-c:v", "libaom-av1", "-b:v", "0", "-crf", crf.as_str()],
        };
        args.iter().map(|s| s.to_string()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration: f32,
    pub crf: u8,
    pub codec: VideoCodec,
    pub out_path: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 30,
            duration: 5.0,
            crf: 20,
            codec: VideoCodec::default(),
            out_path: PathBuf::from("output.mp4"),
        }
    }
}

impl ExportSettings {
    pub fn frame_count(&self) -> u32 {
        (self.duration.max(0.0) * self.fps as f32).round() as u32
    }

    /// Time of frame `index`, in seconds.
    pub fn frame_time(&self, index: u32) -> f32 {
        index as f32 / self.fps.max(1) as f32
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image: {0}")]
    Image(#[from] ImageError),
    #[error("Render: {0}")]
    Render(#[from] RenderError),
    #[error("no frames to export ({duration}s at {fps} fps)")]
    Empty { duration: f32, fps: u32 },
    #[error("FFmpeg failed")]
    Ffmpeg,
}

/// Renders frames `0..frame_count` into `dir` as `frame_NNNNNN.png`.
pub fn render_frames(
    exploration: Exploration,
    cfg: &Config,
    assets: &Assets,
    settings: &ExportSettings,
    dir: &Path,
) -> Result<u32, ExportError> {
    let total = settings.frame_count();
    if total == 0 {
        return Err(ExportError::Empty {
            duration: settings.duration,
            fps: settings.fps,
        });
    }
    let (width, height) = exploration.frame_size(assets, settings.width, settings.height);
    let mut surface = ImageSurface::new(width, height);
    for frame in 0..total {
        exploration.render(cfg, assets, settings.frame_time(frame), &mut surface)?;
        surface.save(&dir.join(format!("frame_{frame:06}.png")))?;
        if frame % settings.fps.max(1) == 0 {
            log::debug!("{exploration}: frame {frame}/{total}");
        }
    }
    Ok(total)
}

pub fn export_video_blocking(
    exploration: Exploration,
    cfg: &Config,
    assets: &Assets,
    settings: &ExportSettings,
) -> Result<(), ExportError> {
    let tmp = tempfile::tempdir()?;
    let dir = tmp.path();
    let total = render_frames(exploration, cfg, assets, settings, dir)?;
    log::info!(
        "encoding {total} frames as {} to {:?}",
        settings.codec.label(),
        settings.out_path
    );

    let mut args = vec![
        "-y".into(),
        "-framerate".into(),
        settings.fps.to_string(),
        "-i".into(),
        format!("{}/frame_%06d.png", dir.display()),
    ];
    args.extend(settings.codec.ffmpeg_args(settings.crf));
    args.push(settings.out_path.display().to_string());

    let status = std::process::Command::new("ffmpeg").args(args).status();
    if matches!(status, Ok(st) if st.success()) {
        Ok(())
    } else {
        Err(ExportError::Ffmpeg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_count_and_times() {
        let settings = ExportSettings {
            fps: 24,
            duration: 0.5,
            ..Default::default()
        };
        assert_eq!(settings.frame_count(), 12);
        assert_eq!(settings.frame_time(12), 0.5);
    }

    #[test]
    fn prores_ignores_crf() {
        assert!(!VideoCodec::ProRes.ffmpeg_args(18).contains(&"18".to_string()));
        assert!(VideoCodec::H264.ffmpeg_args(18).contains(&"18".to_string()));
    }

    #[test]
    fn renders_numbered_pngs() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ExportSettings {
            width: 16,
            height: 12,
            fps: 4,
            duration: 0.5,
            ..Default::default()
        };
        let cfg = Exploration::LoaderGrid.defaults();
        let n = render_frames(Exploration::LoaderGrid, &cfg, &Assets::default(), &settings, dir.path()).unwrap();
        assert_eq!(n, 2);
        let img = image::open(dir.path().join("frame_000001.png")).unwrap();
        assert_eq!((img.width(), img.height()), (16, 12));
    }

    #[test]
    fn zero_duration_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ExportSettings {
            duration: 0.0,
            ..Default::default()
        };
        let cfg = Exploration::Aurora.defaults();
        assert!(matches!(
            render_frames(Exploration::Aurora, &cfg, &Assets::default(), &settings, dir.path()),
            Err(ExportError::Empty { .. })
        ));
    }
}
