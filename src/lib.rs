#![cfg(target_arch = "wasm32")]
use std::cell::RefCell;
use std::rc::Rc;

use hypercube_core::render::{ColorSchemeUpdate, VisualUpdate};
use hypercube_core::{
    ErrorQueue, ParamValue, RenderEngine, SynthEngine, VisualizerConfig, VisualizerError,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

mod audio;
mod constants;
mod dom;
mod events;
mod frame;
mod gl;

use audio::WebAudioBackend;
use gl::WebGlBackend;

pub(crate) struct App {
    pub render: RenderEngine<WebGlBackend>,
    pub synth: SynthEngine<WebAudioBackend>,
}

pub(crate) type SharedApp = Rc<RefCell<App>>;

/// Run `f` against the app unless it is already borrowed (re-entrant callback).
pub(crate) fn with_app<R>(app: &SharedApp, f: impl FnOnce(&mut App) -> R) -> Option<R> {
    match app.try_borrow_mut() {
        Ok(mut a) => Some(f(&mut a)),
        Err(_) => {
            log::warn!("[app] re-entrant call ignored");
            None
        }
    }
}

/// The single `onError` callback registered from JavaScript.
///
/// Errors raised while the app is borrowed are queued and delivered by `flush`
/// once the borrow ends, so the callback may call back into the visualizer.
#[derive(Clone, Default)]
pub(crate) struct ErrorSink {
    callback: Rc<RefCell<Option<js_sys::Function>>>,
    queue: ErrorQueue,
}

impl ErrorSink {
    pub fn defer(&self, error: &VisualizerError) {
        log::error!("[app] {}", error);
        self.queue.push(error.clone());
    }

    pub fn report(&self, error: &VisualizerError) {
        self.defer(error);
        self.flush();
    }

    /// Deliver queued errors. Kept queued until a callback is registered.
    pub fn flush(&self) {
        let Some(cb) = self.callback.borrow().clone() else {
            return;
        };
        while !self.queue.is_empty() {
            for error in self.queue.drain() {
                _ = cb.call1(&JsValue::NULL, &JsValue::from_str(&error.to_string()));
            }
        }
    }

    fn set_callback(&self, callback: js_sys::Function) {
        *self.callback.borrow_mut() = Some(callback);
        self.flush();
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("hypercube-web starting");
    Ok(())
}

#[wasm_bindgen]
pub struct Visualizer {
    app: SharedApp,
    errors: ErrorSink,
    frame: frame::LoopHandle,
}

#[wasm_bindgen]
impl Visualizer {
    /// Attach to `canvas_id` (default `hypercube-canvas`) and start rendering.
    /// Audio starts on the first user gesture.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: Option<String>) -> Result<Visualizer, JsValue> {
        init(canvas_id.as_deref().unwrap_or(constants::CANVAS_ID))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = onError)]
    pub fn on_error(&self, callback: js_sys::Function) {
        self.errors.set_callback(callback);
    }

    /// Resume a stopped or halted renderer. False once disposed or after context loss.
    pub fn start(&self) -> bool {
        let started = with_app(&self.app, |a| a.render.start()).unwrap_or(false);
        self.errors.flush();
        started
    }

    /// Pause drawing; audio keeps running.
    pub fn stop(&self) {
        with_app(&self.app, |a| a.render.stop());
    }

    #[wasm_bindgen(js_name = startNote)]
    pub fn start_note(&self, name: &str) {
        with_app(&self.app, |a| a.synth.start_note(name));
    }

    #[wasm_bindgen(js_name = stopNote)]
    pub fn stop_note(&self, use_release: bool) {
        with_app(&self.app, |a| a.synth.stop_note(use_release));
    }

    /// `group.name = value`; numbers, booleans, strings and integer arrays.
    #[wasm_bindgen(js_name = setParameter)]
    pub fn set_parameter(&self, group: &str, name: &str, value: JsValue) -> bool {
        let Some(value) = param_value(&value) else {
            log::warn!("[app] unsupported value for {}.{}", group, name);
            return false;
        };
        with_app(&self.app, |a| a.synth.set_parameter(group, name, value).is_ok()).unwrap_or(false)
    }

    #[wasm_bindgen(js_name = toggleEffect)]
    pub fn toggle_effect(&self, name: &str, active: bool) {
        with_app(&self.app, |a| a.synth.toggle_effect(name, active));
    }

    #[wasm_bindgen(js_name = applyPreset)]
    pub fn apply_preset(&self, name: &str) -> bool {
        with_app(&self.app, |a| a.synth.apply_preset(name)).unwrap_or(false)
    }

    #[wasm_bindgen(js_name = presetNames)]
    pub fn preset_names(&self) -> js_sys::Array {
        let names = with_app(&self.app, |a| a.synth.preset_names()).unwrap_or_default();
        names.into_iter().map(JsValue::from).collect()
    }

    #[wasm_bindgen(js_name = geometryNames)]
    pub fn geometry_names(&self) -> js_sys::Array {
        let names = with_app(&self.app, |a| a.render.composer().geometries().list_names())
            .unwrap_or_default();
        names.into_iter().map(JsValue::from).collect()
    }

    #[wasm_bindgen(js_name = setMasterVolume)]
    pub fn set_master_volume(&self, volume: f32) {
        with_app(&self.app, |a| a.synth.set_master_volume(volume));
    }

    /// `[bass, mid, high, lastNoteHz]`.
    pub fn levels(&self) -> Vec<f32> {
        let l = with_app(&self.app, |a| a.synth.get_levels()).unwrap_or_default();
        vec![l.bass, l.mid, l.high, l.frequency]
    }

    /// Set one visual parameter by its camelCase name.
    #[wasm_bindgen(js_name = updateVisuals)]
    pub fn update_visuals(&self, key: &str, value: JsValue) -> bool {
        let Some(update) = visual_update(key, &value) else {
            log::warn!("[app] unknown visual parameter '{}'", key);
            return false;
        };
        with_app(&self.app, |a| a.render.update_parameters(&update)).is_some()
    }

    /// Stop the loop, then release GPU and audio resources. Idempotent.
    pub fn dispose(&self) {
        self.frame.cancel();
        with_app(&self.app, |a| {
            a.render.dispose();
            a.synth.dispose();
        });
    }
}

fn init(canvas_id: &str) -> anyhow::Result<Visualizer> {
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let canvas = dom::find_canvas(&document, canvas_id)?;
    let config = VisualizerConfig::default();

    let gl = WebGlBackend::new(&canvas)?;
    let errors = ErrorSink::default();
    let mut render = RenderEngine::new(gl, config.clone())
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    {
        let errors = errors.clone();
        render.set_error_callback(move |e| errors.defer(e));
    }
    let synth = SynthEngine::new(&config);
    let app: SharedApp = Rc::new(RefCell::new(App { render, synth }));

    events::wire_first_interaction(&app, &errors);
    events::wire_keyboard(&app);
    events::wire_pointer(&canvas, &app);
    events::wire_context_loss(&canvas, &app, &errors);

    if !app.borrow_mut().render.start() {
        anyhow::bail!("renderer failed to start");
    }
    let frame = frame::start_loop(Rc::new(RefCell::new(frame::FrameContext {
        app: app.clone(),
        errors: errors.clone(),
    })));
    log::info!("[app] visualizer attached to #{}", canvas_id);
    Ok(Visualizer { app, errors, frame })
}

fn param_value(value: &JsValue) -> Option<ParamValue> {
    if let Some(v) = value.as_f64() {
        return Some(ParamValue::Number(v as f32));
    }
    if let Some(v) = value.as_bool() {
        return Some(ParamValue::Flag(v));
    }
    if let Some(v) = value.as_string() {
        return Some(ParamValue::Text(v));
    }
    let array = value.dyn_ref::<js_sys::Array>()?;
    array
        .iter()
        .map(|v| v.as_f64().map(|n| n as i32))
        .collect::<Option<Vec<i32>>>()
        .map(ParamValue::Pattern)
}

fn color(value: &JsValue) -> Option<[f32; 3]> {
    let array = value.dyn_ref::<js_sys::Array>()?;
    if array.length() != 3 {
        return None;
    }
    let mut out = [0.0; 3];
    for (slot, v) in out.iter_mut().zip(array.iter()) {
        *slot = v.as_f64()? as f32;
    }
    Some(out)
}

fn visual_update(key: &str, value: &JsValue) -> Option<VisualUpdate> {
    let mut u = VisualUpdate::default();
    let number = || value.as_f64().map(|v| v as f32);
    match key {
        "geometry" | "geometryType" => u.geometry = Some(value.as_string()?),
        "projection" | "projectionMethod" => u.projection = Some(value.as_string()?),
        "dimension" => u.dimension = Some(number()?),
        "morphFactor" => u.morph_factor = Some(number()?),
        "rotationSpeed" => u.rotation_speed = Some(number()?),
        "universeModifier" => u.universe_modifier = Some(number()?),
        "gridDensity" => u.grid_density = Some(number()?),
        "glitchIntensity" => u.glitch_intensity = Some(number()?),
        "plasmaSpeed" => u.plasma_speed = Some(number()?),
        "plasmaScale" => u.plasma_scale = Some(number()?),
        "moireIntensity" => u.moire_intensity = Some(number()?),
        "moireScale" => u.moire_scale = Some(number()?),
        "primaryColor" | "secondaryColor" | "backgroundColor" => {
            let c = Some(color(value)?);
            let mut colors = ColorSchemeUpdate::default();
            match key {
                "primaryColor" => colors.primary = c,
                "secondaryColor" => colors.secondary = c,
                _ => colors.background = c,
            }
            u.colors = Some(colors);
        }
        _ => return None,
    }
    Some(u)
}
