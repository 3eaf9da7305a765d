use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hypercube_core::render::VisualUpdate;
use hypercube_core::VisualizerError;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

use crate::audio::WebAudioBackend;
use crate::constants::{note_for_key, FIRST_INTERACTION_EVENTS, KEY_RELEASE_USES_ENVELOPE};
use crate::{dom, with_app, ErrorSink, SharedApp};

/// Build the audio backend on the first click/keydown/touch. The gate resolves
/// exactly once, as ready or failed.
pub fn wire_first_interaction(app: &SharedApp, errors: &ErrorSink) {
    let Some(window) = web::window() else {
        return;
    };
    let target: &web::EventTarget = window.as_ref();
    let fired = Rc::new(Cell::new(false));
    for event in FIRST_INTERACTION_EVENTS {
        let app = app.clone();
        let errors = errors.clone();
        let fired = fired.clone();
        dom::listen(target, event, move |_: web::Event| {
            if fired.replace(true) {
                return;
            }
            let app = app.clone();
            let errors = errors.clone();
            spawn_local(async move {
                match open_audio().await {
                    Ok(backend) => {
                        let attached = with_app(&app, |a| a.synth.attach(backend));
                        if let Some(Err(e)) = attached {
                            errors.report(&VisualizerError::Audio(e));
                        }
                    }
                    Err(e) => {
                        with_app(&app, |a| a.synth.fail_initialization(&e));
                        errors.report(&VisualizerError::InitializationFailure(e.to_string()));
                    }
                }
            });
        });
    }
}

async fn open_audio() -> Result<WebAudioBackend, hypercube_core::AudioError> {
    let backend = WebAudioBackend::new()?;
    backend.resume().await?;
    Ok(backend)
}

/// Computer keyboard as a piano. Only the most recently pressed key releases.
pub fn wire_keyboard(app: &SharedApp) {
    let Some(window) = web::window() else {
        return;
    };
    let target: &web::EventTarget = window.as_ref();
    let held: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));

    {
        let app = app.clone();
        let held = held.clone();
        dom::listen(target, "keydown", move |ev: web::KeyboardEvent| {
            if ev.repeat() || ev.ctrl_key() || ev.meta_key() || ev.alt_key() {
                return;
            }
            let key = ev.key().to_ascii_lowercase();
            if let Some(note) = note_for_key(&key) {
                *held.borrow_mut() = Some(key);
                with_app(&app, |a| a.synth.start_note(note));
            }
        });
    }

    let app = app.clone();
    dom::listen(target, "keyup", move |ev: web::KeyboardEvent| {
        let key = ev.key().to_ascii_lowercase();
        if held.borrow().as_deref() == Some(key.as_str()) {
            *held.borrow_mut() = None;
            with_app(&app, |a| a.synth.stop_note(KEY_RELEASE_USES_ENVELOPE));
        }
    });
}

/// Feed the normalised pointer position to `u_mouse`.
pub fn wire_pointer(canvas: &web::HtmlCanvasElement, app: &SharedApp) {
    let app = app.clone();
    let canvas_move = canvas.clone();
    dom::listen(canvas.as_ref(), "pointermove", move |ev: web::PointerEvent| {
        let uv = dom::pointer_uv(&canvas_move, &ev);
        let update = VisualUpdate {
            mouse: Some(uv),
            ..Default::default()
        };
        with_app(&app, |a| a.render.update_parameters(&update));
    });
}

/// Halt rendering on `webglcontextlost`; the engine reports it once.
pub fn wire_context_loss(canvas: &web::HtmlCanvasElement, app: &SharedApp, errors: &ErrorSink) {
    let app = app.clone();
    let errors = errors.clone();
    dom::listen(canvas.as_ref(), "webglcontextlost", move |ev: web::Event| {
        ev.prevent_default();
        with_app(&app, |a| a.render.notify_context_lost());
        errors.flush();
    });
}
