//! Offline signal graph.
//!
//! A render builds a small directed graph of typed stages (source, gain,
//! filter, delay, compressor, merge), pours its buffers in, evaluates the
//! whole thing once and throws the graph away. There is no live device:
//! nodes produce complete buffers, edges carry them downstream.
//!
//! Connections are explicit. One node can feed several consumers (dry
//! path plus an effect send) and one input can sum several producers.
//! Edges always point from an earlier node to a later one, so evaluation
//! is a single pass in creation order; the only feedback in the system
//! lives inside [`Stage::DelayFeedback`], where it is contained in the
//! node's own delay line.
//!
//! Any stage whose parameters produce a non-finite sample writes 0.0
//! instead. NaN stops at the stage that made it.

use crate::automation::ParamTimeline;
use crate::error::{AudioError, AudioResult};
use crate::filter::{BiquadCoeffs, BiquadFilter};
use crate::mixer::{MixerOutput, StereoOutput};
use crate::oscillator::TWO_PI;

/// Handle to a node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

/// Filter stage shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Lowpass,
    Highpass,
    LowShelf,
    HighShelf,
    Peaking,
}

/// Sine modulation of a filter cutoff, in Hz around the base frequency.
#[derive(Debug, Clone, Copy)]
pub struct CutoffLfo {
    /// Modulation rate in Hz.
    pub rate_hz: f64,
    /// Peak deviation in Hz.
    pub depth_hz: f64,
}

/// Parameters of a filter stage.
#[derive(Debug, Clone, Copy)]
pub struct FilterParams {
    pub kind: FilterKind,
    /// Cutoff or center frequency in Hz.
    pub freq_hz: f64,
    /// Resonance; ignored by shelves.
    pub q: f64,
    /// Gain in dB; used by shelves and peaking only.
    pub gain_db: f64,
    /// Optional cutoff sweep.
    pub cutoff_lfo: Option<CutoffLfo>,
}

impl FilterParams {
    /// A lowpass with no gain term.
    pub fn lowpass(freq_hz: f64, q: f64) -> Self {
        Self {
            kind: FilterKind::Lowpass,
            freq_hz,
            q,
            gain_db: 0.0,
            cutoff_lfo: None,
        }
    }

    /// A highpass with no gain term.
    pub fn highpass(freq_hz: f64, q: f64) -> Self {
        Self {
            kind: FilterKind::Highpass,
            freq_hz,
            q,
            gain_db: 0.0,
            cutoff_lfo: None,
        }
    }

    /// A low shelf.
    pub fn low_shelf(freq_hz: f64, gain_db: f64) -> Self {
        Self {
            kind: FilterKind::LowShelf,
            freq_hz,
            q: 0.707,
            gain_db,
            cutoff_lfo: None,
        }
    }

    /// A high shelf.
    pub fn high_shelf(freq_hz: f64, gain_db: f64) -> Self {
        Self {
            kind: FilterKind::HighShelf,
            freq_hz,
            q: 0.707,
            gain_db,
            cutoff_lfo: None,
        }
    }

    /// A peaking EQ band.
    pub fn peaking(freq_hz: f64, q: f64, gain_db: f64) -> Self {
        Self {
            kind: FilterKind::Peaking,
            freq_hz,
            q,
            gain_db,
            cutoff_lfo: None,
        }
    }

    /// Attaches a sine sweep to the cutoff.
    pub fn with_cutoff_lfo(mut self, rate_hz: f64, depth_hz: f64) -> Self {
        self.cutoff_lfo = Some(CutoffLfo { rate_hz, depth_hz });
        self
    }

    fn coeffs(&self, freq_hz: f64, sample_rate: f64) -> BiquadCoeffs {
        match self.kind {
            FilterKind::Lowpass => BiquadCoeffs::lowpass(freq_hz, self.q, sample_rate),
            FilterKind::Highpass => BiquadCoeffs::highpass(freq_hz, self.q, sample_rate),
            FilterKind::LowShelf => BiquadCoeffs::low_shelf(freq_hz, self.gain_db, sample_rate),
            FilterKind::HighShelf => BiquadCoeffs::high_shelf(freq_hz, self.gain_db, sample_rate),
            FilterKind::Peaking => {
                BiquadCoeffs::peaking(freq_hz, self.q, self.gain_db, sample_rate)
            }
        }
    }
}

/// Compressor stage parameters.
#[derive(Debug, Clone, Copy)]
pub struct CompressorParams {
    /// Level above which gain reduction starts, in dBFS.
    pub threshold_db: f64,
    /// Width of the soft knee in dB.
    pub knee_db: f64,
    /// Compression ratio, >= 1.
    pub ratio: f64,
    /// Envelope attack in seconds.
    pub attack_s: f64,
    /// Envelope release in seconds.
    pub release_s: f64,
}

/// Gain stage modulation.
#[derive(Debug, Clone)]
enum GainMode {
    /// Fixed gain.
    Constant(f64),
    /// Scheduled gain.
    Timeline(ParamTimeline),
    /// Fixed gain plus a sine offset: `base + depth * sin(2 pi rate t)`.
    SineOffset { base: f64, rate_hz: f64, depth: f64 },
}

#[derive(Debug, Clone)]
enum Stage {
    Source { channels: Vec<Vec<f64>> },
    Gain(GainMode),
    Filter(FilterParams),
    DelayFeedback { time_s: f64, feedback: f64, tone_hz: f64 },
    Compressor(CompressorParams),
    Merge,
}

#[derive(Debug, Clone)]
struct Node {
    stage: Stage,
    inputs: Vec<NodeId>,
}

/// An offline, build-once, render-once signal graph.
#[derive(Debug)]
pub struct SignalGraph {
    sample_rate: f64,
    length: usize,
    nodes: Vec<Node>,
}

impl SignalGraph {
    /// Creates an empty graph for buffers of `length` samples.
    pub fn new(sample_rate: f64, length: usize) -> AudioResult<Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(AudioError::InvalidSampleRate { rate: sample_rate });
        }
        if length == 0 {
            return Err(AudioError::EmptyBuffer);
        }
        Ok(Self {
            sample_rate,
            length,
            nodes: Vec::new(),
        })
    }

    fn push(&mut self, stage: Stage) -> NodeId {
        self.nodes.push(Node {
            stage,
            inputs: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Adds a mono source; shorter buffers are zero-padded to length.
    pub fn add_source_mono(&mut self, samples: Vec<f64>) -> NodeId {
        self.push(Stage::Source {
            channels: vec![samples],
        })
    }

    /// Adds a stereo source.
    pub fn add_source_stereo(&mut self, stereo: StereoOutput) -> NodeId {
        self.push(Stage::Source {
            channels: vec![stereo.left, stereo.right],
        })
    }

    /// Adds a fixed gain.
    pub fn add_gain(&mut self, gain: f64) -> NodeId {
        self.push(Stage::Gain(GainMode::Constant(gain)))
    }

    /// Adds a gain driven by a scheduled timeline.
    pub fn add_gain_timeline(&mut self, timeline: ParamTimeline) -> NodeId {
        self.push(Stage::Gain(GainMode::Timeline(timeline)))
    }

    /// Adds a gain with a sine offset around a base value.
    pub fn add_gain_lfo(&mut self, base: f64, rate_hz: f64, depth: f64) -> NodeId {
        self.push(Stage::Gain(GainMode::SineOffset {
            base,
            rate_hz,
            depth,
        }))
    }

    /// Adds a biquad filter stage.
    pub fn add_filter(&mut self, params: FilterParams) -> NodeId {
        self.push(Stage::Filter(params))
    }

    /// Adds a feedback delay: input + regenerated echoes, with a lowpass
    /// tone filter inside the loop. Output is the delayed signal only
    /// (a wet tap; mix it back against the dry path with gains).
    pub fn add_delay_feedback(&mut self, time_s: f64, feedback: f64, tone_hz: f64) -> NodeId {
        self.push(Stage::DelayFeedback {
            time_s: time_s.clamp(0.001, 2.0),
            feedback: feedback.clamp(0.0, 0.95),
            tone_hz,
        })
    }

    /// Adds a stereo-linked compressor.
    pub fn add_compressor(&mut self, params: CompressorParams) -> NodeId {
        self.push(Stage::Compressor(params))
    }

    /// Adds a merge of two mono inputs into stereo. The first connected
    /// input becomes the left channel, the second the right.
    pub fn add_merge(&mut self) -> NodeId {
        self.push(Stage::Merge)
    }

    /// Connects `from`'s output into `to`'s input.
    ///
    /// # Errors
    /// Edges must run forward (source created before consumer); anything
    /// else would be a cycle.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> AudioResult<()> {
        if from.0 >= to.0 || to.0 >= self.nodes.len() {
            return Err(AudioError::graph(format!(
                "connection must run forward, got {} -> {}",
                from.0, to.0
            )));
        }
        self.nodes[to.0].inputs.push(from);
        Ok(())
    }

    /// Evaluates the graph and returns the buffer at `out`.
    pub fn render(&self, out: NodeId) -> AudioResult<MixerOutput> {
        if out.0 >= self.nodes.len() {
            return Err(AudioError::graph("output node does not exist"));
        }

        let mut outputs: Vec<Vec<Vec<f64>>> = Vec::with_capacity(self.nodes.len());
        for (idx, node) in self.nodes.iter().enumerate() {
            let rendered = self.render_node(idx, node, &outputs)?;
            outputs.push(rendered);
        }

        let channels = &outputs[out.0];
        Ok(match channels.len() {
            1 => MixerOutput::Mono(channels[0].clone()),
            _ => MixerOutput::Stereo(StereoOutput {
                left: channels[0].clone(),
                right: channels[1].clone(),
            }),
        })
    }

    /// Sums a node's inputs channel-wise. Mono inputs broadcast up when
    /// mixed with stereo ones.
    fn sum_inputs(&self, node: &Node, outputs: &[Vec<Vec<f64>>]) -> Vec<Vec<f64>> {
        let width = node
            .inputs
            .iter()
            .map(|id| outputs[id.0].len())
            .max()
            .unwrap_or(1);
        let mut sum = vec![vec![0.0; self.length]; width];
        for id in &node.inputs {
            let input = &outputs[id.0];
            for (ch, bus) in sum.iter_mut().enumerate() {
                let src = if input.len() == 1 { &input[0] } else { &input[ch] };
                for (i, s) in src.iter().enumerate().take(self.length) {
                    bus[i] += s;
                }
            }
        }
        sum
    }

    fn render_node(
        &self,
        idx: usize,
        node: &Node,
        outputs: &[Vec<Vec<f64>>],
    ) -> AudioResult<Vec<Vec<f64>>> {
        let mut channels = match &node.stage {
            Stage::Source { channels } => channels
                .iter()
                .map(|ch| {
                    let mut padded = ch.clone();
                    padded.resize(self.length, 0.0);
                    padded
                })
                .collect(),

            Stage::Gain(mode) => {
                let mut channels = self.sum_inputs(node, outputs);
                match mode {
                    GainMode::Constant(g) => {
                        for ch in channels.iter_mut() {
                            for s in ch.iter_mut() {
                                *s *= g;
                            }
                        }
                    }
                    GainMode::Timeline(timeline) => {
                        let curve = timeline.render(self.sample_rate, self.length);
                        for ch in channels.iter_mut() {
                            for (s, g) in ch.iter_mut().zip(curve.iter()) {
                                *s *= g;
                            }
                        }
                    }
                    GainMode::SineOffset {
                        base,
                        rate_hz,
                        depth,
                    } => {
                        for ch in channels.iter_mut() {
                            for (i, s) in ch.iter_mut().enumerate() {
                                let t = i as f64 / self.sample_rate;
                                *s *= base + depth * (TWO_PI * rate_hz * t).sin();
                            }
                        }
                    }
                }
                channels
            }

            Stage::Filter(params) => {
                let mut channels = self.sum_inputs(node, outputs);
                match params.cutoff_lfo {
                    None => {
                        let coeffs = params.coeffs(params.freq_hz, self.sample_rate);
                        for ch in channels.iter_mut() {
                            let mut filter = BiquadFilter::new(coeffs);
                            filter.process_buffer(ch);
                        }
                    }
                    Some(lfo) => {
                        // Swept cutoff: recompute coefficients per sample,
                        // keeping the delay state across swaps.
                        for ch in channels.iter_mut() {
                            let mut filter =
                                BiquadFilter::new(params.coeffs(params.freq_hz, self.sample_rate));
                            for (i, s) in ch.iter_mut().enumerate() {
                                let t = i as f64 / self.sample_rate;
                                let cutoff = params.freq_hz
                                    + lfo.depth_hz * (TWO_PI * lfo.rate_hz * t).sin();
                                filter.set_coeffs(params.coeffs(cutoff, self.sample_rate));
                                *s = filter.process(*s);
                            }
                        }
                    }
                }
                channels
            }

            Stage::DelayFeedback {
                time_s,
                feedback,
                tone_hz,
            } => {
                let inputs = self.sum_inputs(node, outputs);
                let delay_samples =
                    ((time_s * self.sample_rate).round() as usize).max(1);
                inputs
                    .iter()
                    .map(|ch| {
                        let mut line = vec![0.0; delay_samples];
                        let mut write = 0usize;
                        let mut tone = BiquadFilter::new(BiquadCoeffs::lowpass(
                            *tone_hz,
                            0.707,
                            self.sample_rate,
                        ));
                        let mut out = Vec::with_capacity(self.length);
                        for &x in ch {
                            let delayed = line[write];
                            let regen = tone.process(delayed * feedback);
                            line[write] = x + regen;
                            write = (write + 1) % delay_samples;
                            out.push(delayed);
                        }
                        out
                    })
                    .collect()
            }

            Stage::Compressor(params) => {
                let channels = self.sum_inputs(node, outputs);
                compress(channels, params, self.sample_rate)
            }

            Stage::Merge => {
                if node.inputs.len() != 2 {
                    return Err(AudioError::graph(format!(
                        "merge node {idx} needs exactly 2 inputs, has {}",
                        node.inputs.len()
                    )));
                }
                let left = &outputs[node.inputs[0].0];
                let right = &outputs[node.inputs[1].0];
                if left.len() != 1 || right.len() != 1 {
                    return Err(AudioError::graph("merge inputs must be mono"));
                }
                vec![left[0].clone(), right[0].clone()]
            }
        };

        // NaN firewall: a bad parameter silences its own stage instead of
        // poisoning everything downstream.
        for ch in channels.iter_mut() {
            for s in ch.iter_mut() {
                if !s.is_finite() {
                    *s = 0.0;
                }
            }
        }
        Ok(channels)
    }
}

/// Soft-knee downward compression with a stereo-linked envelope.
fn compress(
    channels: Vec<Vec<f64>>,
    params: &CompressorParams,
    sample_rate: f64,
) -> Vec<Vec<f64>> {
    let attack_coeff = (-1.0 / (params.attack_s.max(1e-4) * sample_rate)).exp();
    let release_coeff = (-1.0 / (params.release_s.max(1e-3) * sample_rate)).exp();
    let ratio = params.ratio.max(1.0);
    let knee = params.knee_db.max(0.0);

    let num_samples = channels.first().map(|c| c.len()).unwrap_or(0);
    let mut out: Vec<Vec<f64>> = channels.clone();
    let mut envelope = 0.0_f64;

    for i in 0..num_samples {
        // Linked level across channels
        let level = (channels
            .iter()
            .map(|ch| ch[i] * ch[i])
            .sum::<f64>()
            / channels.len() as f64)
            .sqrt();

        if level > envelope {
            envelope = attack_coeff * envelope + (1.0 - attack_coeff) * level;
        } else {
            envelope = release_coeff * envelope + (1.0 - release_coeff) * level;
        }

        let env_db = 20.0 * envelope.abs().max(1e-10).log10();
        let over = env_db - params.threshold_db;
        let slope = 1.0 / ratio - 1.0;
        let gain_db = if over <= -knee / 2.0 {
            0.0
        } else if knee > 0.0 && over < knee / 2.0 {
            slope * (over + knee / 2.0).powi(2) / (2.0 * knee)
        } else {
            slope * over
        };
        let gain = 10.0_f64.powf(gain_db / 20.0);

        for (ch, o) in channels.iter().zip(out.iter_mut()) {
            o[i] = ch[i] * gain;
        }
    }
    out
}
