//! Scheduled parameter automation.
//!
//! An [`Automation`] is a continuous control value (a gain, a frequency)
//! described by a time-sorted list of events rather than by a value that is
//! written every sample. The control thread schedules events; the render path
//! evaluates [`Automation::value_at`] once per sample.
//!
//! Timeline rules
//! - `SetValue`        : jump to `value` at `time`, hold afterwards
//! - `LinearRamp`      : straight line from the previous event's (time, value)
//! - `ExponentialRamp` : geometric curve from the previous event; an undefined
//!   segment (zero or sign change) holds the previous value until `time`
//! - Before the first event the parameter sits at its default value.
//!
//! [`ramp_param`] is the only sanctioned way to move a parameter while the
//! engine runs: it always cancels what is pending before installing a ramp.

use crate::dsp::{exp_interp, lerp};

/// One scheduled change.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AutomationEvent {
    SetValue { value: f32, time: f64 },
    LinearRamp { value: f32, time: f64 },
    ExponentialRamp { value: f32, time: f64 },
}

impl AutomationEvent {
    #[inline]
    pub fn time(&self) -> f64 {
        match *self {
            Self::SetValue { time, .. } | Self::LinearRamp { time, .. } | Self::ExponentialRamp { time, .. } => time,
        }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        match *self {
            Self::SetValue { value, .. } | Self::LinearRamp { value, .. } | Self::ExponentialRamp { value, .. } => value,
        }
    }

    #[inline]
    fn is_ramp(&self) -> bool {
        !matches!(self, Self::SetValue { .. })
    }
}

/// A timeline mutation, in the form it travels from the control side to the
/// render side.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AutomationOp {
    Cancel { from: f64 },
    Schedule(AutomationEvent),
}

/// Anything that exposes the audio-parameter scheduling surface.
///
/// Implemented by [`Automation`] itself and by wrappers that mirror every call
/// somewhere else (to a render thread, or into a recording test double).
pub trait Automatable {
    /// Computed value at `time` (seconds).
    fn value_at(&self, time: f64) -> f32;

    /// Drop every event scheduled at or after `from`.
    fn cancel_scheduled_values(&mut self, from: f64);

    fn set_value_at_time(&mut self, value: f32, time: f64);

    fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64);

    fn exponential_ramp_to_value_at_time(&mut self, value: f32, time: f64);
}

/// Cancel whatever is pending on `param`, anchor it at its current value and
/// ramp linearly to `target` over `seconds`.
///
/// The anchor is read before cancelling so an interrupted ramp continues from
/// where it actually was instead of jumping back to its starting point.
pub fn ramp_param<P: Automatable + ?Sized>(param: &mut P, now: f64, target: f32, seconds: f64) {
    let anchor = param.value_at(now);
    param.cancel_scheduled_values(now);
    param.set_value_at_time(anchor, now);
    param.linear_ramp_to_value_at_time(target, now + seconds.max(0.0));
}

/// Value at `time` of a time-sorted event list that starts from `default`.
///
/// Works on any slice, so fixed-size schedules can be evaluated without
/// building an [`Automation`].
pub fn evaluate(default: f32, events: &[AutomationEvent], time: f64) -> f32 {
    let next = events.partition_point(|e| e.time() <= time);
    let (t0, v0) = match next.checked_sub(1) {
        Some(i) => (events[i].time(), events[i].value()),
        None => (0.0, default),
    };

    match events.get(next) {
        Some(ev) if ev.is_ramp() => {
            let span = ev.time() - t0;
            if span <= 0.0 {
                return ev.value();
            }
            let frac = ((time - t0) / span).clamp(0.0, 1.0) as f32;
            match ev {
                AutomationEvent::ExponentialRamp { value, .. } => exp_interp(v0, *value, frac),
                _ => lerp(v0, ev.value(), frac),
            }
        }
        _ => v0,
    }
}

/// Time-sorted automation timeline with a default value.
#[derive(Clone, Debug, PartialEq)]
pub struct Automation {
    default: f32,
    events: Vec<AutomationEvent>,
}

impl Automation {
    pub fn new(default: f32) -> Self {
        Self { default, events: Vec::with_capacity(8) }
    }

    #[inline] pub fn default_value(&self) -> f32 { self.default }
    #[inline] pub fn events(&self) -> &[AutomationEvent] { &self.events }

    /// Apply an op received from the control side.
    pub fn apply(&mut self, op: AutomationOp) {
        match op {
            AutomationOp::Cancel { from } => self.cancel_scheduled_values(from),
            AutomationOp::Schedule(ev) => self.insert(ev),
        }
    }

    /// Events with equal times keep insertion order.
    fn insert(&mut self, ev: AutomationEvent) {
        let at = self.events.partition_point(|e| e.time() <= ev.time());
        self.events.insert(at, ev);
    }

    /// Final scheduled `(value, time)` if it still lies ahead of `now`.
    pub fn pending_target(&self, now: f64) -> Option<(f32, f64)> {
        self.events
            .last()
            .filter(|e| e.time() > now)
            .map(|e| (e.value(), e.time()))
    }

    /// Drop history that can no longer influence values at or after `now`.
    ///
    /// The last event at or before `now` is kept because it is the start point
    /// of whatever ramp follows it.
    pub fn prune_before(&mut self, now: f64) {
        let past = self.events.partition_point(|e| e.time() <= now);
        if past > 1 {
            self.events.drain(..past - 1);
        }
    }
}

impl Automatable for Automation {
    fn value_at(&self, time: f64) -> f32 {
        evaluate(self.default, &self.events, time)
    }

    fn cancel_scheduled_values(&mut self, from: f64) {
        self.events.retain(|e| e.time() < from);
    }

    fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(AutomationEvent::SetValue { value, time });
    }

    fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(AutomationEvent::LinearRamp { value, time });
    }

    fn exponential_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(AutomationEvent::ExponentialRamp { value, time });
    }
}

// ------------------------------------ Tests --------------------------------------
