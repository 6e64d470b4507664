//! Tracing setup for the GUI
//!
//! `RUST_LOG` controls the filter; without it the playpen crates log at
//! `info` and the renderer stack at `warn`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,wgpu=warn,wgpu_core=warn,wgpu_hal=warn,naga=warn,cosmic_text=warn";

pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A second subscriber (e.g. under a test harness) is not an error
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init();
}
