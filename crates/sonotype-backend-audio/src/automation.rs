//! Scheduled parameter automation.
//!
//! [`ParamTimeline`] models time-stamped parameter changes the way an
//! offline render needs them: steps, linear ramps and exponential ramps,
//! each anchored to the value of the previous event. Voice envelopes and
//! the colorization gate are both expressed as timelines.

/// How a scheduled event reaches its value.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RampKind {
    /// Jump to the value at the event time.
    Step,
    /// Interpolate linearly from the previous event.
    Linear,
    /// Interpolate exponentially from the previous event.
    ///
    /// Requires same-sign, non-zero endpoints; degenerate pairs fall
    /// back to linear so a bad schedule distorts instead of exploding.
    Exponential,
}

#[derive(Debug, Clone, Copy)]
struct Event {
    time: f64,
    value: f64,
    kind: RampKind,
}

/// Magnitude floor for exponential targets. An exponential ramp cannot
/// reach zero, so "off" is scheduled as this value instead.
pub const EXP_FLOOR: f64 = 1e-4;

/// A scheduled parameter value over time.
///
/// Events must be appended in non-decreasing time order; out-of-order
/// times are clamped forward. Before the first event the parameter holds
/// its initial value, after the last it holds the final value.
#[derive(Debug, Clone)]
pub struct ParamTimeline {
    initial: f64,
    events: Vec<Event>,
}

impl ParamTimeline {
    /// Creates a timeline holding `initial` until the first event.
    pub fn new(initial: f64) -> Self {
        Self {
            initial,
            events: Vec::new(),
        }
    }

    /// Schedules a step to `value` at `time`.
    pub fn set_value_at(&mut self, time: f64, value: f64) {
        self.push(time, value, RampKind::Step);
    }

    /// Schedules a linear ramp ending at `time` with `value`.
    pub fn linear_ramp_to(&mut self, time: f64, value: f64) {
        self.push(time, value, RampKind::Linear);
    }

    /// Schedules an exponential ramp ending at `time` with `value`.
    ///
    /// The target magnitude is floored at [`EXP_FLOOR`].
    pub fn exponential_ramp_to(&mut self, time: f64, value: f64) {
        let v = if value.abs() < EXP_FLOOR {
            EXP_FLOOR.copysign(if value == 0.0 { 1.0 } else { value })
        } else {
            value
        };
        self.push(time, v, RampKind::Exponential);
    }

    fn push(&mut self, time: f64, value: f64, kind: RampKind) {
        let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
        let value = if value.is_finite() { value } else { 0.0 };
        let time = match self.events.last() {
            Some(last) if time < last.time => last.time,
            _ => time,
        };
        self.events.push(Event { time, value, kind });
    }

    /// Evaluates the parameter at time `t` seconds.
    pub fn value_at(&self, t: f64) -> f64 {
        let mut prev_time = 0.0;
        let mut prev_value = self.initial;

        for event in &self.events {
            if t < event.time {
                return match event.kind {
                    RampKind::Step => prev_value,
                    RampKind::Linear => {
                        interp_linear(prev_time, prev_value, event.time, event.value, t)
                    }
                    RampKind::Exponential => {
                        interp_exponential(prev_time, prev_value, event.time, event.value, t)
                    }
                };
            }
            prev_time = event.time;
            prev_value = event.value;
        }
        prev_value
    }

    /// Evaluates the whole timeline at a fixed sample rate.
    ///
    /// Walks the event list once instead of searching per sample.
    pub fn render(&self, sample_rate: f64, num_samples: usize) -> Vec<f64> {
        let mut out = Vec::with_capacity(num_samples);
        let mut next_event = 0;
        let mut prev_time = 0.0;
        let mut prev_value = self.initial;

        for i in 0..num_samples {
            let t = i as f64 / sample_rate;
            while next_event < self.events.len() && self.events[next_event].time <= t {
                prev_time = self.events[next_event].time;
                prev_value = self.events[next_event].value;
                next_event += 1;
            }
            let v = if next_event >= self.events.len() {
                prev_value
            } else {
                let e = &self.events[next_event];
                match e.kind {
                    RampKind::Step => prev_value,
                    RampKind::Linear => interp_linear(prev_time, prev_value, e.time, e.value, t),
                    RampKind::Exponential => {
                        interp_exponential(prev_time, prev_value, e.time, e.value, t)
                    }
                }
            };
            out.push(v);
        }
        out
    }
}

fn interp_linear(t0: f64, v0: f64, t1: f64, v1: f64, t: f64) -> f64 {
    if t1 <= t0 {
        return v1;
    }
    v0 + (v1 - v0) * (t - t0) / (t1 - t0)
}

fn interp_exponential(t0: f64, v0: f64, t1: f64, v1: f64, t: f64) -> f64 {
    if t1 <= t0 {
        return v1;
    }
    // Exponential interpolation is only defined for same-sign, non-zero
    // endpoints; anything else degrades to linear.
    if v0 == 0.0 || v0.signum() != v1.signum() {
        return interp_linear(t0, v0, t1, v1, t);
    }
    let u = (t - t0) / (t1 - t0);
    v0 * (v1 / v0).powf(u)
}
