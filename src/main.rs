// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod config;
mod drivers;
mod engine;
mod gui;
mod recorder;
mod types;
mod visualizer;
use anyhow::{anyhow, Context, Result};
use config::SpecanConfig;
use drivers::{FrameSource, SimulatedSource, Ubertooth};
use eframe::egui;
use log::info;
use types::ConnectionMode;
// Top and bottom panels around the plot.
const CHROME_HEIGHT: f32 = 72.0;
fn open_source(config: &SpecanConfig) -> Result<Box<dyn FrameSource + Send>> {
    match config.mode {
        ConnectionMode::Hardware => {
            let device = Ubertooth::open(config.usb_vid, config.usb_pid, config.range)
                .context("Device not found (set SPECAN_SIMULATE=1 to run without a dongle)")?;
            Ok(Box::new(device))
        }
        ConnectionMode::Simulation => {
            info!("running on simulated sweeps");
            Ok(Box::new(SimulatedSource::new(
                config.range,
                config.simulation_interval(),
            )))
        }
    }
}
// Device must be open before the window exists.
fn main() -> Result<()> {
    env_logger::init();
    let config = SpecanConfig::from_env()?;
    let source = open_source(&config)?;
    let (min_w, min_h) = config.range.min_size_hint();
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([min_w.max(480.0), min_h.max(160.0) + CHROME_HEIGHT])
        .with_min_inner_size([min_w, min_h + CHROME_HEIGHT])
        .with_title("Ubertooth Spectrum Analyzer");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "ubertooth-specan",
        options,
        Box::new(move |cc| Box::new(gui::SpecanApp::new(&cc.egui_ctx, config, source))),
    )
    .map_err(|e| anyhow!("gui failed: {e}"))
}
