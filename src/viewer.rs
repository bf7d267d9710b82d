//! Live window: an `egui` texture fed by the render driver.
//!
//! Change events arrive one per line on stdin (`key=value` or JSON) and are
//! applied between frames.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

use eframe::{egui, App};
use egui::{Color32, ColorImage, TextureHandle, TextureOptions, Vec2};
use glam::Vec3;

use crate::config::ConfigChange;
use crate::driver::{FrameScheduler, Session};
use crate::snapshots::SnapshotBook;
use crate::surface::{to_byte, Surface};

/// Turns frame requests into egui repaints.
#[derive(Default)]
pub struct EguiScheduler {
    ctx: Option<egui::Context>,
    pending: bool,
}

impl EguiScheduler {
    pub fn attach(&mut self, ctx: egui::Context) {
        if self.pending {
            ctx.request_repaint();
        }
        self.ctx = Some(ctx);
    }

    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

impl FrameScheduler for EguiScheduler {
    fn request_frame(&mut self) {
        self.pending = true;
        if let Some(ctx) = &self.ctx {
            ctx.request_repaint();
        }
    }

    fn cancel_frame(&mut self) {
        self.pending = false;
    }
}

impl Surface for ColorImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.size[0] as u32, self.size[1] as u32)
    }

    fn put(&mut self, x: u32, y: u32, rgb: Vec3) {
        let idx = y as usize * self.size[0] + x as usize;
        if let Some(px) = self.pixels.get_mut(idx) {
            *px = Color32::from_rgb(to_byte(rgb.x), to_byte(rgb.y), to_byte(rgb.z));
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewerOptions {
    /// Render resolution relative to the window's logical size.
    pub scale: f32,
    /// Where the snapshot button writes; `None` hides it.
    pub snapshot_root: Option<PathBuf>,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            scale: 0.5,
            snapshot_root: None,
        }
    }
}

struct ViewerApp {
    session: Session<EguiScheduler>,
    options: ViewerOptions,
    changes: Receiver<ConfigChange>,
    canvas: ColorImage,
    tex: Option<TextureHandle>,
    status: String,
}

fn spawn_stdin_reader(ctx: egui::Context) -> Receiver<ConfigChange> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match ConfigChange::parse(&line) {
                Ok(change) => {
                    if tx.send(change).is_err() {
                        break;
                    }
                    ctx.request_repaint();
                }
                Err(e) => log::warn!("ignoring change `{line}`: {e}"),
            }
        }
    });
    rx
}

impl ViewerApp {
    fn drain_changes(&mut self) {
        while let Ok(change) = self.changes.try_recv() {
            match self.session.apply(&change) {
                Ok(transition) => log::debug!("{} -> {transition:?}", change.key),
                Err(e) => {
                    log::warn!("{}: {e}", change.key);
                    self.status = e.to_string();
                }
            }
        }
    }

    fn save_snapshot(&mut self) {
        let Some(root) = &self.options.snapshot_root else {
            return;
        };
        let saved = SnapshotBook::open(root, self.session.exploration().id())
            .and_then(|mut book| book.save(self.session.config()));
        self.status = match saved {
            Ok(name) => format!("saved {name}"),
            Err(e) => {
                log::warn!("snapshot failed: {e}");
                e.to_string()
            }
        };
    }
}

impl App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_changes();

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.heading(self.session.exploration().title());
                ui.separator();
                ui.label(format!("{:?}", self.session.driver().state()));
                ui.label(format!("frames {}", self.session.driver().frames()));
                if self.options.snapshot_root.is_some() && ui.button("Save snapshot").clicked() {
                    self.save_snapshot();
                }
                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(self.status.as_str());
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size() * self.options.scale;
            let (w, h) = self
                .session
                .frame_size(avail.x.max(16.0) as u32, avail.y.max(16.0) as u32);
            if self.canvas.size != [w as usize, h as usize] {
                self.canvas = ColorImage::new([w as usize, h as usize], Color32::BLACK);
                self.session.resize();
            }

            let due = self.session.driver_mut().scheduler_mut().take();
            if due && self.session.frame(&mut self.canvas, Instant::now()) {
                let tex = self.tex.get_or_insert_with(|| {
                    ui.ctx()
                        .load_texture("frame", self.canvas.clone(), TextureOptions::LINEAR)
                });
                tex.set(self.canvas.clone(), TextureOptions::LINEAR);
            }
            if let Some(tex) = &self.tex {
                let shown = Vec2::new(w as f32, h as f32) / self.options.scale;
                ui.image((tex.id(), shown));
            }
        });
    }
}

pub fn run(session: Session<EguiScheduler>, options: ViewerOptions) -> eframe::Result<()> {
    let title = format!("{} - {}", session.exploration().id(), session.exploration().title());
    let native = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 720.0])
            .with_min_inner_size([320.0, 240.0]),
        ..Default::default()
    };
    let mut session = session;
    let options = ViewerOptions {
        scale: options.scale.clamp(0.1, 2.0),
        ..options
    };
    eframe::run_native(
        &title,
        native,
        Box::new(move |cc| {
            session
                .driver_mut()
                .scheduler_mut()
                .attach(cc.egui_ctx.clone());
            Box::new(ViewerApp {
                changes: spawn_stdin_reader(cc.egui_ctx.clone()),
                session,
                options,
                canvas: ColorImage::new([0, 0], Color32::BLACK),
                tex: None,
                status: String::new(),
            })
        }),
    )
}
