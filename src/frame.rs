use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hypercube_core::map_audio_to_visuals;
use hypercube_core::render::FrameStatus;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

use crate::{with_app, ErrorSink, SharedApp};

pub struct FrameContext {
    pub app: SharedApp,
    pub errors: ErrorSink,
}

impl FrameContext {
    /// One display refresh: audio clock work, analysis, mapping, draw. Audio keeps
    /// being pumped after the renderer halts so sequencing is unaffected.
    pub fn frame(&mut self) {
        with_app(&self.app, |app| {
            app.synth.pump();
            let levels = app.synth.get_levels();
            let update = map_audio_to_visuals(app.synth.params(), &levels);
            app.render.update_parameters(&update);
            if app.render.render_frame() == FrameStatus::Halted {
                log::warn!("[frame] rendering halted; audio continues");
            }
        });
        self.errors.flush();
    }
}

/// Owner of the requestAnimationFrame chain. `cancel` is safe from inside a frame.
#[derive(Clone, Default)]
pub struct LoopHandle {
    alive: Rc<Cell<bool>>,
    request_id: Rc<Cell<Option<i32>>>,
}

impl LoopHandle {
    pub fn cancel(&self) {
        self.alive.set(false);
        if let (Some(id), Some(w)) = (self.request_id.take(), web::window()) {
            _ = w.cancel_animation_frame(id);
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }
}

pub fn start_loop(frame_ctx: Rc<RefCell<FrameContext>>) -> LoopHandle {
    let handle = LoopHandle::default();
    handle.alive.set(true);

    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    let handle_tick = handle.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        handle_tick.request_id.set(None);
        if !handle_tick.is_alive() {
            return;
        }
        frame_ctx.borrow_mut().frame();
        // The error callback may have disposed the visualizer.
        if handle_tick.is_alive() {
            request(&tick_clone, &handle_tick);
        }
    }) as Box<dyn FnMut()>));
    request(&tick, &handle);
    handle
}

fn request(tick: &Rc<RefCell<Option<Closure<dyn FnMut()>>>>, handle: &LoopHandle) {
    let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref().map(|c| c.as_ref().clone()))
    else {
        return;
    };
    if let Ok(id) = w.request_animation_frame(cb.unchecked_ref()) {
        handle.request_id.set(Some(id));
    }
}
