use std::path::PathBuf;
use std::{env, process};

use clap::Parser;
use genie_lamp::{config, evdev};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Command line arguments.
#[derive(Parser, Debug)]
#[clap(author, about, version, max_term_width = 80)]
struct Options {
    /// Gesture configuration file.
    ///
    /// Defaults to `$XDG_CONFIG_HOME/genie_lamp/gestures.conf`.
    config: Option<PathBuf>,

    /// Touchscreen input device.
    #[clap(long, default_value = evdev::TOUCH_DEVICE)]
    device: PathBuf,
}

pub fn main() {
    // Setup logging.
    let directives = env::var("RUST_LOG").unwrap_or("warn,genie_lamp=info".into());
    let env_filter = EnvFilter::builder().parse_lossy(directives);
    FmtSubscriber::builder().with_env_filter(env_filter).with_line_number(true).init();

    let options = Options::parse();

    // Load gesture configuration.
    let config_path = options.config.unwrap_or_else(config::default_path);
    let gestures = match config::load(&config_path) {
        Ok(gestures) => gestures,
        Err(err) => {
            warn!("Unable to read {config_path:?}: {err}");
            Vec::new()
        },
    };

    info!("Loaded {} gesture(s) from {config_path:?}", gestures.len());
    if gestures.is_empty() {
        error!("No gestures configured, exiting");
        process::exit(1);
    }
    for gesture in &gestures {
        info!("  {gesture}");
    }

    if let Err(err) = evdev::run(&options.device, gestures) {
        error!("{err}");
        process::exit(1);
    }
}
