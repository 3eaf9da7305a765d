// In-memory recording backends for host-side tests.
// The web crate is wasm-only; these stand in for WebGL2 and WebAudio.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use hypercube_core::audio::{AudioBackend, FilterKind, NodeId, ParamKind, RampCurve, Waveform};
use hypercube_core::gl::{GlBackend, ShaderStage, UniformValue};
use hypercube_core::AudioError;

// ---------------- graphics ----------------

#[derive(Default)]
pub struct MockGl {
    next_id: u32,
    pub context_lost: bool,
    pub shaders: HashMap<u32, (ShaderStage, String)>,
    pub compiles: Vec<ShaderStage>,
    pub deleted_shaders: Vec<u32>,
    pub links: u32,
    pub live_programs: BTreeSet<u32>,
    pub deleted_programs: Vec<u32>,
    pub used_programs: Vec<u32>,
    pub uniform_queries: Vec<String>,
    pub uploads: Vec<(String, UniformValue)>,
    pub buffers: BTreeSet<u32>,
    pub draws: u32,
    pub clears: u32,
    /// GL calls issued while the context was lost.
    pub calls_while_lost: u32,
    /// Driver log returned for any fragment compile whose source contains the key.
    pub fail_fragment_containing: Option<(String, String)>,
    pub fail_link: Option<String>,
    pub missing_uniforms: HashSet<String>,
    pub drawing_size: (u32, u32),
    pub display: (u32, u32),
}

impl MockGl {
    pub fn new() -> Self {
        Self {
            drawing_size: (300, 150),
            display: (800, 600),
            ..Default::default()
        }
    }

    fn id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn touch(&mut self) {
        if self.context_lost {
            self.calls_while_lost += 1;
        }
    }

    pub fn uploads_named(&self, name: &str) -> usize {
        self.uploads.iter().filter(|(n, _)| n == name).count()
    }

    pub fn fragment_sources(&self) -> Vec<&str> {
        self.shaders
            .values()
            .filter(|(stage, _)| *stage == ShaderStage::Fragment)
            .map(|(_, src)| src.as_str())
            .collect()
    }
}

impl GlBackend for MockGl {
    type Shader = u32;
    type Program = u32;
    type UniformLocation = (u32, String);
    type Buffer = u32;

    fn is_context_lost(&self) -> bool {
        self.context_lost
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<u32, String> {
        self.touch();
        self.compiles.push(stage);
        if stage == ShaderStage::Fragment {
            if let Some((needle, log)) = &self.fail_fragment_containing {
                if source.contains(needle.as_str()) {
                    return Err(log.clone());
                }
            }
        }
        let id = self.id();
        self.shaders.insert(id, (stage, source.to_string()));
        Ok(id)
    }

    fn delete_shader(&mut self, shader: &u32) {
        self.touch();
        self.deleted_shaders.push(*shader);
    }

    fn link_program(&mut self, _vertex: &u32, _fragment: &u32) -> Result<u32, String> {
        self.touch();
        if let Some(log) = &self.fail_link {
            return Err(log.clone());
        }
        self.links += 1;
        let id = self.id();
        self.live_programs.insert(id);
        Ok(id)
    }

    fn delete_program(&mut self, program: &u32) {
        self.touch();
        self.live_programs.remove(program);
        self.deleted_programs.push(*program);
    }

    fn use_program(&mut self, program: &u32) {
        self.touch();
        self.used_programs.push(*program);
    }

    fn uniform_location(&mut self, program: &u32, name: &str) -> Option<(u32, String)> {
        self.touch();
        self.uniform_queries.push(name.to_string());
        if self.missing_uniforms.contains(name) {
            None
        } else {
            Some((*program, name.to_string()))
        }
    }

    fn attribute_location(&mut self, _program: &u32, name: &str) -> Option<u32> {
        self.touch();
        (name == "a_position").then_some(0)
    }

    fn set_uniform(&mut self, location: &(u32, String), value: UniformValue) {
        self.touch();
        self.uploads.push((location.1.clone(), value));
    }

    fn create_vertex_buffer(&mut self, _data: &[u8]) -> Option<u32> {
        self.touch();
        let id = self.id();
        self.buffers.insert(id);
        Some(id)
    }

    fn bind_vertex_buffer(&mut self, _buffer: &u32, _attribute: u32, _components: i32) {
        self.touch();
    }

    fn delete_buffer(&mut self, buffer: &u32) {
        self.touch();
        self.buffers.remove(buffer);
    }

    fn drawing_buffer_size(&self) -> (u32, u32) {
        self.drawing_size
    }

    fn display_size(&self) -> (u32, u32) {
        self.display
    }

    fn resize_drawing_buffer(&mut self, width: u32, height: u32) {
        self.touch();
        self.drawing_size = (width, height);
    }

    fn viewport(&mut self, _width: u32, _height: u32) {
        self.touch();
    }

    fn clear(&mut self, _color: [f32; 4]) {
        self.touch();
        self.clears += 1;
    }

    fn draw_quad(&mut self) {
        self.touch();
        self.draws += 1;
    }
}

// ---------------- audio ----------------

#[derive(Clone, Debug, PartialEq)]
pub enum MockKind {
    Destination,
    Oscillator(Waveform),
    Filter(FilterKind),
    Gain,
    Delay,
    Convolver,
    Analyser,
}

#[derive(Clone, Debug)]
pub struct MockNode {
    pub kind: MockKind,
    pub params: HashMap<ParamKind, f32>,
    pub started: Option<f64>,
    pub stopped: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AudioEvent {
    Set { node: NodeId, param: ParamKind, value: f32, at: f64 },
    Ramp { node: NodeId, param: ParamKind, value: f32, end: f64, curve: RampCurve },
    Cancel { node: NodeId, param: ParamKind, from: f64 },
}

pub struct MockAudio {
    next_id: u32,
    pub now: f64,
    pub sample_rate: f32,
    pub nodes: BTreeMap<NodeId, MockNode>,
    pub edges: BTreeSet<(NodeId, NodeId)>,
    pub duplicate_connects: u32,
    pub events: Vec<AudioEvent>,
    /// (node, frequency) for every oscillator ever created.
    pub oscillators: Vec<(NodeId, f32)>,
    pub impulses: Vec<(NodeId, usize, usize)>,
    pub spectrum: Vec<u8>,
    pub fail_creation: bool,
    pub closed: bool,
}

impl MockAudio {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(NodeId(0), MockNode::new(MockKind::Destination));
        Self {
            next_id: 1,
            now: 0.0,
            sample_rate: 48_000.0,
            nodes,
            edges: BTreeSet::new(),
            duplicate_connects: 0,
            events: Vec::new(),
            oscillators: Vec::new(),
            impulses: Vec::new(),
            spectrum: vec![0; 1024],
            fail_creation: false,
            closed: false,
        }
    }

    fn add(&mut self, node: MockNode) -> Result<NodeId, AudioError> {
        if self.fail_creation {
            return Err(AudioError::NodeCreation("mock".to_string()));
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        Ok(id)
    }

    pub fn advance(&mut self, seconds: f64) {
        self.now += seconds;
    }

    pub fn live_oscillators(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| matches!(n.kind, MockKind::Oscillator(_)))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Nodes reachable from `from` following graph edges.
    pub fn reachable(&self, from: NodeId) -> BTreeSet<NodeId> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([from]);
        while let Some(n) = queue.pop_front() {
            for &(a, b) in &self.edges {
                if a == n && seen.insert(b) {
                    queue.push_back(b);
                }
            }
        }
        seen
    }

    /// Live oscillators with a path to `target`.
    pub fn oscillators_reaching(&self, target: NodeId) -> Vec<NodeId> {
        self.live_oscillators()
            .into_iter()
            .filter(|o| self.reachable(*o).contains(&target))
            .collect()
    }

    pub fn nodes_of(&self, kind: &MockKind) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| &n.kind == kind)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn param(&self, node: NodeId, param: ParamKind) -> Option<f32> {
        self.nodes.get(&node).and_then(|n| n.params.get(&param).copied())
    }

    pub fn last_oscillator_frequency(&self) -> Option<f32> {
        self.oscillators.last().map(|(_, f)| *f)
    }
}

impl MockNode {
    fn new(kind: MockKind) -> Self {
        Self {
            kind,
            params: HashMap::new(),
            started: None,
            stopped: None,
        }
    }

    fn with(mut self, param: ParamKind, value: f32) -> Self {
        self.params.insert(param, value);
        self
    }
}

impl AudioBackend for MockAudio {
    fn current_time(&self) -> f64 {
        self.now
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn destination(&self) -> NodeId {
        NodeId(0)
    }

    fn create_oscillator(
        &mut self,
        waveform: Waveform,
        frequency: f32,
    ) -> Result<NodeId, AudioError> {
        let id = self.add(
            MockNode::new(MockKind::Oscillator(waveform)).with(ParamKind::Frequency, frequency),
        )?;
        self.oscillators.push((id, frequency));
        Ok(id)
    }

    fn create_filter(
        &mut self,
        kind: FilterKind,
        frequency: f32,
        q: f32,
    ) -> Result<NodeId, AudioError> {
        self.add(
            MockNode::new(MockKind::Filter(kind))
                .with(ParamKind::Frequency, frequency)
                .with(ParamKind::Q, q),
        )
    }

    fn create_gain(&mut self, value: f32) -> Result<NodeId, AudioError> {
        self.add(MockNode::new(MockKind::Gain).with(ParamKind::Gain, value))
    }

    fn create_delay(&mut self, _max_seconds: f64, time: f32) -> Result<NodeId, AudioError> {
        self.add(MockNode::new(MockKind::Delay).with(ParamKind::DelayTime, time))
    }

    fn create_convolver(&mut self) -> Result<NodeId, AudioError> {
        self.add(MockNode::new(MockKind::Convolver))
    }

    fn create_analyser(&mut self, _fft_size: u32) -> Result<NodeId, AudioError> {
        self.add(MockNode::new(MockKind::Analyser))
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), AudioError> {
        if !self.nodes.contains_key(&from) || !self.nodes.contains_key(&to) {
            return Err(AudioError::Graph("unknown node".to_string()));
        }
        if !self.edges.insert((from, to)) {
            self.duplicate_connects += 1;
        }
        Ok(())
    }

    fn disconnect(&mut self, from: NodeId, to: NodeId) -> Result<(), AudioError> {
        if self.edges.remove(&(from, to)) {
            Ok(())
        } else {
            Err(AudioError::Graph("not connected".to_string()))
        }
    }

    fn release(&mut self, node: NodeId) {
        self.edges.retain(|(a, _)| *a != node);
        self.nodes.remove(&node);
    }

    fn set_oscillator_type(&mut self, node: NodeId, waveform: Waveform) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.kind = MockKind::Oscillator(waveform);
        }
    }

    fn set_filter_type(&mut self, node: NodeId, kind: FilterKind) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.kind = MockKind::Filter(kind);
        }
    }

    fn param_value(&self, node: NodeId, param: ParamKind) -> Option<f32> {
        self.param(node, param)
    }

    fn set_param_at(&mut self, node: NodeId, param: ParamKind, value: f32, at: f64) {
        self.events.push(AudioEvent::Set { node, param, value, at });
        if let Some(n) = self.nodes.get_mut(&node) {
            n.params.insert(param, value);
        }
    }

    fn cancel_scheduled(&mut self, node: NodeId, param: ParamKind, from: f64) {
        self.events.push(AudioEvent::Cancel { node, param, from });
    }

    fn ramp_param(
        &mut self,
        node: NodeId,
        param: ParamKind,
        value: f32,
        end: f64,
        curve: RampCurve,
    ) {
        self.events.push(AudioEvent::Ramp {
            node,
            param,
            value,
            end,
            curve,
        });
        if let Some(n) = self.nodes.get_mut(&node) {
            n.params.insert(param, value);
        }
    }

    fn start(&mut self, node: NodeId, when: f64) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.started = Some(when);
        }
    }

    fn stop(&mut self, node: NodeId, when: f64) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.stopped = Some(when);
        }
    }

    fn set_impulse_response(
        &mut self,
        node: NodeId,
        channels: &[Vec<f32>],
    ) -> Result<(), AudioError> {
        let len = channels.first().map_or(0, Vec::len);
        self.impulses.push((node, channels.len(), len));
        Ok(())
    }

    fn frequency_bin_count(&self, _analyser: NodeId) -> usize {
        self.spectrum.len()
    }

    fn byte_frequency_data(&mut self, _analyser: NodeId, out: &mut [u8]) {
        let n = out.len().min(self.spectrum.len());
        out[..n].copy_from_slice(&self.spectrum[..n]);
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
