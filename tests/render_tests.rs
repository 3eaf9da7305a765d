// Host-side tests for the render-state engine: dirty tracking, rebuilds,
// error reporting and context loss.

mod support;

use std::cell::RefCell;
use std::rc::Rc;

use hypercube_core::render::FrameStatus;
use hypercube_core::{
    ErrorQueue, LatticeSource, RenderEngine, UniformId, VisualUpdate, VisualizerConfig,
    VisualizerError,
};
use support::MockGl;

type Reported = Rc<RefCell<Vec<String>>>;

fn engine_with(gl: MockGl, config: VisualizerConfig) -> (RenderEngine<MockGl>, Reported) {
    let mut engine = RenderEngine::new(gl, config).unwrap();
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = errors.clone();
    engine.set_error_callback(move |e: &VisualizerError| sink.borrow_mut().push(e.to_string()));
    (engine, errors)
}

fn engine() -> (RenderEngine<MockGl>, Reported) {
    engine_with(MockGl::new(), VisualizerConfig::default())
}

fn break_projection(e: &mut RenderEngine<MockGl>, projection: &str, needle: &str) {
    e.gl_mut().fail_fragment_containing =
        Some((needle.to_string(), "ERROR: 0:2: bad".to_string()));
    e.update_parameters(&VisualUpdate {
        projection: Some(projection.to_string()),
        ..Default::default()
    });
}

#[test]
fn start_marks_every_uniform_dirty_and_first_frame_uploads_them_all() {
    let (mut e, _) = engine();
    assert!(e.start());
    assert_eq!(e.state().dirty.len(), UniformId::ALL.len());

    assert_eq!(e.render_frame(), FrameStatus::Drawn);
    assert!(e.state().dirty.is_empty());
    for id in UniformId::ALL {
        assert_eq!(e.gl().uploads_named(id.name()), 1, "{}", id.name());
    }
    assert_eq!(e.gl().draws, 1);
    assert_eq!(e.gl().links, 1);
}

#[test]
fn steady_frames_upload_only_time() {
    let (mut e, _) = engine();
    e.start();
    e.render_frame();
    let before = e.gl().uploads.len();

    e.render_frame();
    let new: Vec<&str> = e.gl().uploads[before..].iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(new, vec!["u_time"]);
}

#[test]
fn effective_changes_mark_dirty_and_repeats_do_not() {
    let (mut e, _) = engine();
    e.start();
    e.render_frame();

    let update = VisualUpdate {
        grid_density: Some(12.0),
        ..Default::default()
    };
    e.update_parameters(&update);
    assert!(e.state().dirty.contains(UniformId::GridDensity));
    e.render_frame();
    assert!(e.state().dirty.is_empty());

    e.update_parameters(&update);
    assert!(e.state().dirty.is_empty());
}

#[test]
fn geometry_change_relinks_exactly_once() {
    let (mut e, _) = engine();
    e.start();
    e.render_frame();
    assert_eq!(e.gl().links, 1);

    e.update_parameters(&VisualUpdate {
        geometry: Some("hypersphere".to_string()),
        ..Default::default()
    });
    assert!(e.state().needs_rebuild);

    e.render_frame();
    assert_eq!(e.gl().links, 2);
    assert!(!e.state().needs_rebuild);
    e.render_frame();
    assert_eq!(e.gl().links, 2);
}

#[test]
fn geometry_strategy_source_follows_selected_geometry() {
    let config = VisualizerConfig {
        lattice_source: LatticeSource::GeometryStrategy,
        ..Default::default()
    };
    let (mut e, _) = engine_with(MockGl::new(), config);
    e.start();
    e.update_parameters(&VisualUpdate {
        geometry: Some("Crystal".to_string()),
        ..Default::default()
    });
    e.render_frame();
    let handle = e.composer().program("hypercube").unwrap();
    assert_eq!(handle.geometry(), Some("crystal"));
}

#[test]
fn compile_failure_halts_and_reports_once() {
    let (mut e, errors) = engine();
    e.start();
    e.render_frame();
    let draws = e.gl().draws;

    e.gl_mut().fail_fragment_containing =
        Some(("float pole =".to_string(), "ERROR: 0:2: bad".to_string()));
    e.update_parameters(&VisualUpdate {
        projection: Some("stereographic".to_string()),
        ..Default::default()
    });
    assert_eq!(e.render_frame(), FrameStatus::Halted);
    assert!(!e.is_running());
    assert_eq!(e.render_frame(), FrameStatus::Stopped);
    assert_eq!(errors.borrow().len(), 1);
    assert!(errors.borrow()[0].contains("compile"));
    assert_eq!(e.gl().draws, draws, "no partial frame drawn");
}

#[test]
fn context_loss_reports_once_and_stops_gl_traffic() {
    let (mut e, errors) = engine();
    e.start();
    e.render_frame();

    e.gl_mut().context_lost = true;
    assert_eq!(e.render_frame(), FrameStatus::Halted);
    e.notify_context_lost();
    assert_eq!(e.render_frame(), FrameStatus::Stopped);
    assert!(!e.start());
    e.dispose();

    assert_eq!(errors.borrow().len(), 1);
    assert_eq!(e.gl().calls_while_lost, 0);
}

#[test]
fn unresolved_uniforms_stay_dirty_until_a_rebuild_resolves_them() {
    let mut gl = MockGl::new();
    gl.missing_uniforms.insert("u_mouse".to_string());
    let (mut e, _) = engine_with(gl, VisualizerConfig::default());
    e.start();

    e.render_frame();
    e.render_frame();
    assert!(e.state().dirty.contains(UniformId::Mouse));
    assert_eq!(e.state().dirty.len(), 1);
    assert_eq!(e.gl().uploads_named("u_mouse"), 0);

    e.gl_mut().missing_uniforms.clear();
    e.update_parameters(&VisualUpdate {
        projection: Some("orthographic".to_string()),
        ..Default::default()
    });
    e.render_frame();
    assert!(e.state().dirty.is_empty());
    assert_eq!(e.gl().uploads_named("u_mouse"), 1);
}

#[test]
fn canvas_mismatch_resizes_and_updates_resolution() {
    let (mut e, _) = engine();
    e.start();
    e.render_frame();
    assert_eq!(e.gl().drawing_size, (800, 600));
    assert_eq!(e.state().resolution, [800.0, 600.0]);

    e.gl_mut().display = (1024, 768);
    e.render_frame();
    assert_eq!(e.state().resolution, [1024.0, 768.0]);
    assert_eq!(e.gl().uploads_named("u_resolution"), 2);
}

#[test]
fn restart_reuploads_the_full_set() {
    let (mut e, _) = engine();
    e.start();
    e.render_frame();
    e.stop();
    assert_eq!(e.render_frame(), FrameStatus::Stopped);

    e.start();
    assert_eq!(e.state().dirty.len(), UniformId::ALL.len());
    e.render_frame();
    assert_eq!(e.gl().uploads_named("u_gridDensity"), 2);
    assert_eq!(e.gl().links, 1, "restart reuses the linked program");
}

#[test]
fn dispose_releases_quad_and_programs() {
    let (mut e, _) = engine();
    e.start();
    e.render_frame();
    e.dispose();
    e.dispose();
    assert!(e.is_disposed());
    assert!(e.gl().buffers.is_empty());
    assert!(e.gl().live_programs.is_empty());
    assert!(!e.start());
}

#[test]
fn halted_renderer_restarts_once_the_fault_clears() {
    let (mut e, errors) = engine();
    e.start();
    e.render_frame();
    break_projection(&mut e, "stereographic", "float pole =");
    assert_eq!(e.render_frame(), FrameStatus::Halted);

    e.gl_mut().fail_fragment_containing = None;
    assert!(e.start());
    assert_eq!(e.render_frame(), FrameStatus::Drawn);
    assert_eq!(errors.borrow().len(), 1);

    break_projection(&mut e, "orthographic", "orthoBlendTarget");
    assert_eq!(e.render_frame(), FrameStatus::Halted);
    assert_eq!(errors.borrow().len(), 2, "each run reports its own failure");
}

#[test]
fn queued_errors_are_handled_after_the_frame_releases_the_engine() {
    let queue = ErrorQueue::default();
    let engine = Rc::new(RefCell::new(
        RenderEngine::new(MockGl::new(), VisualizerConfig::default()).unwrap(),
    ));
    engine.borrow_mut().set_error_callback(queue.sink());
    engine.borrow_mut().start();
    engine.borrow_mut().render_frame();
    break_projection(&mut engine.borrow_mut(), "stereographic", "float pole =");

    let status = engine.borrow_mut().render_frame();
    assert_eq!(status, FrameStatus::Halted);
    assert!(!queue.is_empty());

    for error in queue.drain() {
        // The handler tears the engine down and raises a follow-up error.
        let mut e = engine.try_borrow_mut().expect("engine is free while handling errors");
        e.dispose();
        queue.push(error);
    }
    assert!(engine.borrow().is_disposed());
    assert!(engine.borrow().gl().live_programs.is_empty());
    assert_eq!(queue.drain().len(), 1);
    assert!(queue.is_empty());
}

#[test]
fn dispose_after_reported_context_loss_skips_gpu_deletes() {
    let (mut e, errors) = engine();
    e.start();
    e.render_frame();
    let deleted_programs = e.gl().deleted_programs.len();
    let deleted_shaders = e.gl().deleted_shaders.len();

    // The loss event arrives before the driver reports it.
    e.notify_context_lost();
    assert!(!e.gl().context_lost);
    e.dispose();

    assert_eq!(e.gl().deleted_programs.len(), deleted_programs);
    assert_eq!(e.gl().deleted_shaders.len(), deleted_shaders);
    assert!(e.composer().program("hypercube").is_none());
    assert_eq!(errors.borrow().len(), 1);
}
