//! Application entry point for the AVL tree viewer.
//!
//! This binary loads the configuration, sets up eframe/egui and delegates
//! all interactive logic and rendering to [`Viewer`] from the `viewer`
//! module.

mod viewer;

use std::path::Path;

use avl_core::config::Config;
use viewer::Viewer;

/// Reads the config file named by the first argument, if any.
///
/// A missing argument or unreadable file falls back to the defaults.
fn load_config() -> Config {
    let Some(path) = std::env::args().nth(1) else {
        return Config::default();
    };
    match Config::load(Path::new(&path)) {
        Ok(cfg) => {
            log::info!("loaded config from {path}");
            cfg
        }
        Err(e) => {
            log::warn!("could not load {path}: {e}; using defaults");
            Config::default()
        }
    }
}

/// Starts the native eframe application.
///
/// Logging goes through `env_logger` (set `RUST_LOG=debug` to see
/// rotations). The main window is titled `"AVL Tree"`.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    env_logger::init();

    let cfg = load_config();
    let viewer = match Viewer::new(cfg) {
        Ok(v) => v,
        Err(e) => {
            log::error!("cannot start: {e}");
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions::default();
    eframe::run_native("AVL Tree", options, Box::new(|_cc| Ok(Box::new(viewer))))
}
