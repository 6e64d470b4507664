//! Host integration: configuration source and the address bar.
//!
//! Native builds take the starting path from the first command-line argument
//! and the config file from `PLAYPEN_CONFIG`. WASM builds read and update the
//! browser location and always use the default config.

use playpen_core::config::PlaypenConfig;

#[cfg(not(target_arch = "wasm32"))]
pub fn load_config() -> PlaypenConfig {
    match PlaypenConfig::load_or_default(None) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(%err, "falling back to default configuration");
            PlaypenConfig::default()
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub fn load_config() -> PlaypenConfig {
    PlaypenConfig::default()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn initial_path() -> String {
    std::env::args().nth(1).unwrap_or_else(|| "/".to_string())
}

#[cfg(target_arch = "wasm32")]
pub fn initial_path() -> String {
    web_sys::window()
        .and_then(|window| window.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn push_path(path: &str) {
    tracing::debug!(path, "location changed");
}

/// Add a history entry so the address bar follows navigation.
#[cfg(target_arch = "wasm32")]
pub fn push_path(path: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };

    let pushed = window
        .history()
        .and_then(|history| history.push_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(path)));
    if let Err(err) = pushed {
        tracing::warn!(?err, path, "could not update browser history");
    }
}
