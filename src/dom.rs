use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

pub fn find_canvas(document: &web::Document, id: &str) -> anyhow::Result<web::HtmlCanvasElement> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| anyhow::anyhow!("missing #{}", id))?
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|e| anyhow::anyhow!("#{} is not a canvas: {:?}", id, e))
}

/// CSS size times devicePixelRatio, the backing size the canvas should have.
pub fn display_size(canvas: &web::HtmlCanvasElement) -> (u32, u32) {
    let dpr = web::window().map_or(1.0, |w| w.device_pixel_ratio());
    let rect = canvas.get_bounding_client_rect();
    (
        (rect.width() * dpr).round().max(1.0) as u32,
        (rect.height() * dpr).round().max(1.0) as u32,
    )
}

/// Pointer position in 0..1 canvas coordinates, origin bottom-left like `v_uv`.
pub fn pointer_uv(canvas: &web::HtmlCanvasElement, ev: &web::MouseEvent) -> [f32; 2] {
    let rect = canvas.get_bounding_client_rect();
    let w = rect.width().max(1.0);
    let h = rect.height().max(1.0);
    let x = ((ev.client_x() as f64 - rect.left()) / w).clamp(0.0, 1.0);
    let y = 1.0 - ((ev.client_y() as f64 - rect.top()) / h).clamp(0.0, 1.0);
    [x as f32, y as f32]
}

/// Attach `handler` for `event` on `target` for the lifetime of the page.
pub fn listen<E: JsCast + 'static>(
    target: &web::EventTarget,
    event: &str,
    mut handler: impl FnMut(E) + 'static,
) {
    let closure = Closure::wrap(Box::new(move |ev: web::Event| {
        if let Ok(ev) = ev.dyn_into::<E>() {
            handler(ev);
        }
    }) as Box<dyn FnMut(web::Event)>);
    _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
    closure.forget();
}
