use texmd_core::{DeferredEmbed, MathBackend, Pipeline, Settings, SettingsOverrides};
use wasm_bindgen::prelude::*;
use wasm_bindgen::{JsCast, JsValue};

// ============================================================================
// Configuration
// ============================================================================

fn parse_config(config: JsValue) -> SettingsOverrides {
    if config.is_undefined() || config.is_null() {
        return SettingsOverrides::default();
    }
    serde_wasm_bindgen::from_value(config).unwrap_or_default()
}

fn build_settings(config: JsValue) -> Result<Settings, JsError> {
    Settings::merge(parse_config(config))
        .map_err(|e| JsError::new(&format!("Settings error: {}", e)))
}

/// The host typesets the emitted containers itself, so the stages run with
/// the deferred embed backend: math keeps its delimiters for the client-side
/// engine to re-discover.
fn host_backend() -> MathBackend {
    MathBackend::Deferred(Box::new(DeferredEmbed))
}

fn run_before_init(config: &JsValue) {
    if config.is_undefined() || config.is_null() {
        return;
    }
    let Ok(hook) = js_sys::Reflect::get(config, &JsValue::from_str("beforeInit")) else {
        return;
    };
    if let Some(function) = hook.dyn_ref::<js_sys::Function>() {
        let _ = function.call0(&JsValue::NULL);
    }
}

// ============================================================================
// Staged Rendering API
// ============================================================================

/// Runs the host's `beforeInit` hook (if the config carries one) and
/// validates the configuration.
///
/// Call once before the first page renders.
#[wasm_bindgen(js_name = initLatex)]
pub fn init_latex(config: JsValue) -> Result<(), JsError> {
    run_before_init(&config);
    build_settings(config).map(|_| ())
}

/// Protects math and code in a Markdown page before the host's Markdown
/// renderer runs.
///
/// # Arguments
///
/// * `content` - The raw Markdown page
/// * `config` - Optional configuration object (JsValue)
///
/// # Returns
///
/// The page with protected regions replaced by placeholder comments.
#[wasm_bindgen]
pub fn render_stage1(content: &str, config: JsValue) -> Result<String, JsError> {
    let settings = build_settings(config)?;
    let backend = host_backend();
    let pipeline = Pipeline::new(&settings, &backend);
    pipeline
        .stage1(content)
        .map_err(|e| JsError::new(&format!("Protection error: {}", e)))
}

/// Restores protected content inside the rendered HTML, turning math
/// placeholders into container elements ready for client-side typesetting.
#[wasm_bindgen]
pub fn render_stage2(html: &str, config: JsValue) -> Result<String, JsError> {
    let settings = build_settings(config)?;
    let backend = host_backend();
    let pipeline = Pipeline::new(&settings, &backend);
    Ok(pipeline.stage2(html))
}

/// The engine version.
#[wasm_bindgen]
pub fn version() -> String {
    texmd_core::VERSION.to_string()
}
