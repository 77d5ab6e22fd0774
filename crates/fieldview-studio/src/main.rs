mod demo;
mod viewer;

use fieldview_engine::logging::{LoggingConfig, init_logging};

fn main() {
    init_logging(LoggingConfig::default());

    log::info!("keys: D toggles field-data/direct, Space pauses, C captures a PNG, Esc quits");

    if let Err(err) = viewer::run(viewer::ViewerConfig::default()) {
        log::error!("fieldview exited with error: {err:#}");
        std::process::exit(1);
    }
}
