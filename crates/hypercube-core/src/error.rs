use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::gl::ShaderStage;

/// Failures raised while compiling or linking a composed program.
#[derive(Debug, Clone, Error)]
pub enum ShaderError {
    #[error("{stage} shader failed to compile: {log}")]
    Compile {
        stage: ShaderStage,
        log: String,
        /// Source excerpt around the first reported error line, if one could be parsed.
        annotated: Option<String>,
    },
    #[error("program failed to link: {log}")]
    Link { log: String },
    #[error("no {kind} strategy registered for '{name}' or the default")]
    MissingStrategy { kind: &'static str, name: String },
    #[error("graphics context is unavailable")]
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    #[error("audio output is not supported: {0}")]
    Unsupported(String),
    #[error("failed to create {0} node")]
    NodeCreation(String),
    #[error("audio engine is not initialized")]
    NotReady,
    #[error("audio graph error: {0}")]
    Graph(String),
}

/// Unrecoverable conditions surfaced through the single `on_error` callback.
#[derive(Debug, Clone, Error)]
pub enum VisualizerError {
    #[error("initialization failed: {0}")]
    InitializationFailure(String),
    #[error("shader program could not be built: {0}")]
    CompileLinkFailure(#[from] ShaderError),
    #[error("graphics context was lost")]
    ContextLoss,
    #[error("audio failure: {0}")]
    Audio(#[from] AudioError),
}

/// Rejections from nested parameter writes; the synth logs these and leaves state untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("unknown parameter group '{0}'")]
    UnknownGroup(String),
    #[error("unknown parameter '{group}.{name}'")]
    UnknownName { group: String, name: String },
    #[error("parameter '{group}.{name}' expects {expected}")]
    WrongType {
        group: String,
        name: String,
        expected: &'static str,
    },
}

/// Errors raised while the app is borrowed, held until the borrow is released.
///
/// Handlers run from [`ErrorQueue::drain`]'s caller with no engine borrowed, so
/// a handler may dispose or restart the engines that raised the error.
#[derive(Debug, Clone, Default)]
pub struct ErrorQueue(Rc<RefCell<Vec<VisualizerError>>>);

impl ErrorQueue {
    pub fn push(&self, error: VisualizerError) {
        self.0.borrow_mut().push(error);
    }

    /// A callback for [`crate::RenderEngine::set_error_callback`] that only queues.
    pub fn sink(&self) -> impl FnMut(&VisualizerError) + 'static {
        let queue = self.clone();
        move |error| queue.push(error.clone())
    }

    /// Take everything queued so far. The queue is free again before this returns.
    pub fn drain(&self) -> Vec<VisualizerError> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}
