use fnv::FnvHashMap;
use hypercube_core::audio::{AudioBackend, FilterKind, NodeId, ParamKind, RampCurve, Waveform};
use hypercube_core::constants::ANALYSER_SMOOTHING;
use hypercube_core::AudioError;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

enum WebNode {
    Oscillator(web::OscillatorNode),
    Filter(web::BiquadFilterNode),
    Gain(web::GainNode),
    Delay(web::DelayNode),
    Convolver(web::ConvolverNode),
    Analyser(web::AnalyserNode),
}

impl WebNode {
    fn audio_node(&self) -> &web::AudioNode {
        match self {
            WebNode::Oscillator(n) => n.as_ref(),
            WebNode::Filter(n) => n.as_ref(),
            WebNode::Gain(n) => n.as_ref(),
            WebNode::Delay(n) => n.as_ref(),
            WebNode::Convolver(n) => n.as_ref(),
            WebNode::Analyser(n) => n.as_ref(),
        }
    }

    fn param(&self, kind: ParamKind) -> Option<web::AudioParam> {
        match (self, kind) {
            (WebNode::Gain(n), ParamKind::Gain) => Some(n.gain()),
            (WebNode::Oscillator(n), ParamKind::Frequency) => Some(n.frequency()),
            (WebNode::Filter(n), ParamKind::Frequency) => Some(n.frequency()),
            (WebNode::Filter(n), ParamKind::Q) => Some(n.q()),
            (WebNode::Delay(n), ParamKind::DelayTime) => Some(n.delay_time()),
            _ => None,
        }
    }
}

fn oscillator_type(waveform: Waveform) -> web::OscillatorType {
    match waveform {
        Waveform::Sine => web::OscillatorType::Sine,
        Waveform::Square => web::OscillatorType::Square,
        Waveform::Saw => web::OscillatorType::Sawtooth,
        Waveform::Triangle => web::OscillatorType::Triangle,
    }
}

fn filter_type(kind: FilterKind) -> web::BiquadFilterType {
    match kind {
        FilterKind::Lowpass => web::BiquadFilterType::Lowpass,
        FilterKind::Highpass => web::BiquadFilterType::Highpass,
        FilterKind::Bandpass => web::BiquadFilterType::Bandpass,
        FilterKind::Notch => web::BiquadFilterType::Notch,
    }
}

fn created<T>(result: Result<T, JsValue>, label: &str) -> Result<T, AudioError> {
    result.map_err(|e| {
        log::error!("[audio] {} error: {:?}", label, e);
        AudioError::NodeCreation(label.to_string())
    })
}

/// WebAudio graph addressed through [`NodeId`]s.
pub struct WebAudioBackend {
    ctx: web::AudioContext,
    nodes: FnvHashMap<NodeId, WebNode>,
    next_id: u32,
}

// Reserved id for the context's destination node.
const DESTINATION: NodeId = NodeId(0);

impl WebAudioBackend {
    pub fn new() -> Result<Self, AudioError> {
        let ctx = web::AudioContext::new()
            .map_err(|e| AudioError::Unsupported(format!("{:?}", e)))?;
        Ok(Self {
            ctx,
            nodes: FnvHashMap::default(),
            next_id: 1,
        })
    }

    /// Wait for the context to leave the suspended state (needs a user gesture).
    pub async fn resume(&self) -> Result<(), AudioError> {
        let promise = self
            .ctx
            .resume()
            .map_err(|e| AudioError::Unsupported(format!("{:?}", e)))?;
        JsFuture::from(promise)
            .await
            .map_err(|e| AudioError::Unsupported(format!("{:?}", e)))?;
        Ok(())
    }

    fn insert(&mut self, node: WebNode) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    fn param(&self, node: NodeId, kind: ParamKind) -> Option<web::AudioParam> {
        self.nodes.get(&node).and_then(|n| n.param(kind))
    }

    fn endpoints(
        &self,
        from: NodeId,
        to: NodeId,
    ) -> Result<(&web::AudioNode, web::AudioNode), AudioError> {
        let src = self
            .nodes
            .get(&from)
            .map(WebNode::audio_node)
            .ok_or_else(|| AudioError::Graph(format!("unknown source node {:?}", from)))?;
        let dst = if to == DESTINATION {
            self.ctx.destination().into()
        } else {
            self.nodes
                .get(&to)
                .map(|n| n.audio_node().clone())
                .ok_or_else(|| AudioError::Graph(format!("unknown target node {:?}", to)))?
        };
        Ok((src, dst))
    }
}

impl AudioBackend for WebAudioBackend {
    fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    fn sample_rate(&self) -> f32 {
        self.ctx.sample_rate()
    }

    fn destination(&self) -> NodeId {
        DESTINATION
    }

    fn create_oscillator(
        &mut self,
        waveform: Waveform,
        frequency: f32,
    ) -> Result<NodeId, AudioError> {
        let osc = created(web::OscillatorNode::new(&self.ctx), "OscillatorNode")?;
        osc.set_type(oscillator_type(waveform));
        osc.frequency().set_value(frequency);
        Ok(self.insert(WebNode::Oscillator(osc)))
    }

    fn create_filter(
        &mut self,
        kind: FilterKind,
        frequency: f32,
        q: f32,
    ) -> Result<NodeId, AudioError> {
        let filter = created(web::BiquadFilterNode::new(&self.ctx), "BiquadFilterNode")?;
        filter.set_type(filter_type(kind));
        filter.frequency().set_value(frequency);
        filter.q().set_value(q);
        Ok(self.insert(WebNode::Filter(filter)))
    }

    fn create_gain(&mut self, value: f32) -> Result<NodeId, AudioError> {
        let gain = created(web::GainNode::new(&self.ctx), "GainNode")?;
        gain.gain().set_value(value);
        Ok(self.insert(WebNode::Gain(gain)))
    }

    fn create_delay(&mut self, max_seconds: f64, time: f32) -> Result<NodeId, AudioError> {
        let delay = created(
            self.ctx.create_delay_with_max_delay_time(max_seconds),
            "DelayNode",
        )?;
        delay.delay_time().set_value(time);
        Ok(self.insert(WebNode::Delay(delay)))
    }

    fn create_convolver(&mut self) -> Result<NodeId, AudioError> {
        let convolver = created(web::ConvolverNode::new(&self.ctx), "ConvolverNode")?;
        convolver.set_normalize(true);
        Ok(self.insert(WebNode::Convolver(convolver)))
    }

    fn create_analyser(&mut self, fft_size: u32) -> Result<NodeId, AudioError> {
        let analyser = created(web::AnalyserNode::new(&self.ctx), "AnalyserNode")?;
        analyser.set_fft_size(fft_size);
        analyser.set_smoothing_time_constant(ANALYSER_SMOOTHING);
        Ok(self.insert(WebNode::Analyser(analyser)))
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), AudioError> {
        let (src, dst) = self.endpoints(from, to)?;
        src.connect_with_audio_node(&dst)
            .map(|_| ())
            .map_err(|e| AudioError::Graph(format!("connect failed: {:?}", e)))
    }

    fn disconnect(&mut self, from: NodeId, to: NodeId) -> Result<(), AudioError> {
        let (src, dst) = self.endpoints(from, to)?;
        src.disconnect_with_audio_node(&dst)
            .map_err(|e| AudioError::Graph(format!("disconnect failed: {:?}", e)))
    }

    fn release(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.remove(&node) {
            _ = n.audio_node().disconnect();
        }
    }

    fn set_oscillator_type(&mut self, node: NodeId, waveform: Waveform) {
        if let Some(WebNode::Oscillator(osc)) = self.nodes.get(&node) {
            osc.set_type(oscillator_type(waveform));
        }
    }

    fn set_filter_type(&mut self, node: NodeId, kind: FilterKind) {
        if let Some(WebNode::Filter(filter)) = self.nodes.get(&node) {
            filter.set_type(filter_type(kind));
        }
    }

    fn param_value(&self, node: NodeId, param: ParamKind) -> Option<f32> {
        self.param(node, param).map(|p| p.value())
    }

    fn set_param_at(&mut self, node: NodeId, param: ParamKind, value: f32, when: f64) {
        if let Some(p) = self.param(node, param) {
            _ = p.set_value_at_time(value, when);
        }
    }

    fn cancel_scheduled(&mut self, node: NodeId, param: ParamKind, from: f64) {
        if let Some(p) = self.param(node, param) {
            _ = p.cancel_scheduled_values(from);
        }
    }

    fn ramp_param(
        &mut self,
        node: NodeId,
        param: ParamKind,
        value: f32,
        end_time: f64,
        curve: RampCurve,
    ) {
        let Some(p) = self.param(node, param) else {
            return;
        };
        _ = match curve {
            RampCurve::Linear => p.linear_ramp_to_value_at_time(value, end_time),
            RampCurve::Exponential => p.exponential_ramp_to_value_at_time(value, end_time),
        };
    }

    fn start(&mut self, node: NodeId, when: f64) {
        if let Some(WebNode::Oscillator(osc)) = self.nodes.get(&node) {
            let source: &web::AudioScheduledSourceNode = osc.as_ref();
            _ = source.start_with_when(when);
        }
    }

    fn stop(&mut self, node: NodeId, when: f64) {
        if let Some(WebNode::Oscillator(osc)) = self.nodes.get(&node) {
            let source: &web::AudioScheduledSourceNode = osc.as_ref();
            _ = source.stop_with_when(when);
        }
    }

    fn set_impulse_response(
        &mut self,
        node: NodeId,
        channels: &[Vec<f32>],
    ) -> Result<(), AudioError> {
        let Some(WebNode::Convolver(convolver)) = self.nodes.get(&node) else {
            return Err(AudioError::Graph(format!("{:?} is not a convolver", node)));
        };
        let len = channels.first().map_or(0, Vec::len).max(1);
        let buffer = self
            .ctx
            .create_buffer(channels.len().max(1) as u32, len as u32, self.ctx.sample_rate())
            .map_err(|e| AudioError::NodeCreation(format!("AudioBuffer: {:?}", e)))?;
        for (ch, samples) in channels.iter().enumerate() {
            let mut data = samples.clone();
            _ = buffer.copy_to_channel(&mut data, ch as i32);
        }
        convolver.set_buffer(Some(&buffer));
        Ok(())
    }

    fn frequency_bin_count(&self, analyser: NodeId) -> usize {
        match self.nodes.get(&analyser) {
            Some(WebNode::Analyser(a)) => a.frequency_bin_count() as usize,
            _ => 0,
        }
    }

    fn byte_frequency_data(&mut self, analyser: NodeId, out: &mut [u8]) {
        if let Some(WebNode::Analyser(a)) = self.nodes.get(&analyser) {
            a.get_byte_frequency_data(out);
        }
    }

    fn close(&mut self) {
        for (_, node) in self.nodes.drain() {
            _ = node.audio_node().disconnect();
        }
        _ = self.ctx.close();
        log::info!("[audio] context closed");
    }
}
