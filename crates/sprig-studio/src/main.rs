mod scene;

use sprig_engine::device::GpuInit;
use sprig_engine::logging::{init_logging, LoggingConfig};
use sprig_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;

use crate::scene::Studio;

fn main() {
    init_logging(LoggingConfig::default());

    // Optional PNG to use instead of the generated checkerboard.
    let texture_path = std::env::args_os().nth(1).map(std::path::PathBuf::from);

    let config = RuntimeConfig {
        title: "sprig studio".to_string(),
        initial_size: LogicalSize::new(960.0, 640.0),
        resizable: true,
    };

    if let Err(e) = Runtime::run(config, GpuInit::default(), Studio::new(texture_path)) {
        log::error!("sprig runtime error: {e:#}");
        std::process::exit(1);
    }
}
