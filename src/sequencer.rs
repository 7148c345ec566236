//! Sequencer — timed playback of note and chord sequences.
//!
//! A sequence is played as a cooperative task: render a step, hand it to
//! playback, then suspend until the next step is due. Step deadlines sit on
//! a fixed grid measured from the moment playback started, so time spent
//! rendering is taken out of the following wait instead of pushing every
//! later step back. Time itself comes from a [`Clock`], which is either the
//! wall clock ([`TokioClock`], feature `realtime`) or a [`VirtualClock`]
//! that never really sleeps.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::dsp::effects::EffectChain;
use crate::dsp::mixer::Mixer;
use crate::dsp::renderer::{RenderedBuffer, SampleRenderer};
use crate::dsp::voice::{Instrument, Note};
use crate::error::{Result, SynthError};
use crate::timing::{Interval, TempoClock};

/// Source of time and suspension for a sequencer.
pub trait Clock {
    /// Time elapsed since a fixed, clock-specific origin.
    fn now(&self) -> Duration;

    /// Suspend the caller for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Default)]
struct VirtualTime {
    now: Duration,
    sleeps: Vec<Duration>,
}

/// A clock that only moves when told to.
///
/// Sleeping advances the clock by the requested amount and returns at once.
/// Clones share the same timeline, so a test can hand one clone to the
/// sequencer and use another to simulate slow rendering.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    time: Arc<Mutex<VirtualTime>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VirtualTime> {
        self.time.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Move time forward without sleeping.
    pub fn advance(&self, duration: Duration) {
        self.lock().now += duration;
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.lock().now
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        let mut time = self.lock();
        time.sleeps.push(duration);
        time.now += duration;
        std::future::ready(())
    }
}

/// Wall clock backed by the tokio timer.
#[cfg(feature = "realtime")]
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

#[cfg(feature = "realtime")]
impl TokioClock {
    pub fn new() -> Self {
        TokioClock {
            origin: tokio::time::Instant::now(),
        }
    }
}

#[cfg(feature = "realtime")]
impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "realtime")]
impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Receives finished buffers for playback.
pub trait PlaybackSink {
    fn submit(&mut self, buffer: RenderedBuffer);
}

impl PlaybackSink for Vec<RenderedBuffer> {
    fn submit(&mut self, buffer: RenderedBuffer) {
        self.push(buffer);
    }
}

/// What to play: an ordered list of steps, each sounding zero or more
/// frequencies at once, and how to voice them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    /// Frequencies per step. An empty step is a rest.
    pub steps: Vec<Vec<f64>>,
    pub amplitude: f64,
    /// Spacing between step onsets.
    pub interval: Interval,
    /// Fraction of each step the notes are held, in (0, 1].
    pub gate: f64,
    /// How many times the whole list of steps is played.
    pub repetitions: u32,
    pub instrument: Instrument,
    #[serde(default)]
    pub effects: EffectChain,
    #[serde(default)]
    pub pan: f64,
}

impl Sequence {
    /// One frequency per step.
    pub fn arpeggio(frequencies: &[f64], instrument: Instrument) -> Self {
        Self::chords(frequencies.iter().map(|&f| vec![f]).collect(), instrument)
    }

    /// Several simultaneous frequencies per step.
    pub fn chords(steps: Vec<Vec<f64>>, instrument: Instrument) -> Self {
        Sequence {
            steps,
            amplitude: 0.5,
            interval: Interval::SIXTEENTH,
            gate: 0.5,
            repetitions: 1,
            instrument,
            effects: EffectChain::default(),
            pan: 0.0,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_gate(mut self, gate: f64) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_repetitions(mut self, repetitions: u32) -> Self {
        self.repetitions = repetitions;
        self
    }

    pub fn with_effects(mut self, effects: EffectChain) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_pan(mut self, pan: f64) -> Self {
        self.pan = pan;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let sequence: Sequence = serde_json::from_str(json)?;
        sequence.validate()?;
        Ok(sequence)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.gate > 0.0 && self.gate <= 1.0) {
            return Err(SynthError::invalid("gate", format!("{} must lie in (0, 1]", self.gate)));
        }
        if !(self.interval.whole_notes().is_finite() && self.interval.whole_notes() > 0.0) {
            return Err(SynthError::invalid(
                "interval",
                format!("{} whole notes must be positive", self.interval.whole_notes()),
            ));
        }
        if !(-1.0..=1.0).contains(&self.pan) {
            return Err(SynthError::invalid("pan", format!("{} must lie in [-1, 1]", self.pan)));
        }
        self.instrument.envelope.validate()?;
        self.effects.validate()?;
        for &frequency in self.steps.iter().flatten() {
            if !(frequency.is_finite() && frequency > 0.0) {
                return Err(SynthError::invalid(
                    "sequence",
                    format!("frequency {frequency} Hz must be positive"),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Playing,
}

/// Timing summary of a finished sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceReport {
    /// Steps played, across all repetitions.
    pub steps: usize,
    /// Suspension after each step.
    pub waits: Vec<Duration>,
    /// Steps whose rendering ran past the next step's deadline.
    pub overruns: usize,
}

/// Plays sequences for one voice.
///
/// `play` borrows the sequencer mutably, so a voice can never run two
/// sequences at once. Independent voices use independent sequencers and may
/// share a [`TempoClock`].
pub struct Sequencer<C: Clock> {
    clock: C,
    tempo: TempoClock,
    renderer: SampleRenderer,
    playing: AtomicBool,
}

/// Marks a sequencer as playing until dropped, including when the `play`
/// future itself is dropped part way through.
struct PlayingGuard<'a>(&'a AtomicBool);

impl<'a> PlayingGuard<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        PlayingGuard(flag)
    }
}

impl Drop for PlayingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<C: Clock> Sequencer<C> {
    pub fn new(clock: C, tempo: TempoClock, renderer: SampleRenderer) -> Self {
        Sequencer {
            clock,
            tempo,
            renderer,
            playing: AtomicBool::new(false),
        }
    }

    /// A sequencer at the configured sample rate and starting tempo.
    pub fn from_config(clock: C, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            clock,
            TempoClock::with_bpm(config.bpm)?,
            SampleRenderer::from_config(config)?,
        ))
    }

    pub fn state(&self) -> SequencerState {
        if self.playing.load(Ordering::Acquire) {
            SequencerState::Playing
        } else {
            SequencerState::Idle
        }
    }

    pub fn tempo(&self) -> &TempoClock {
        &self.tempo
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Render one step held for `held` seconds, effects included.
    /// Returns `None` for a rest.
    pub fn render_step(
        &self,
        frequencies: &[f64],
        sequence: &Sequence,
        held: f64,
    ) -> Result<Option<RenderedBuffer>> {
        let mut mixer = Mixer::new();
        for &frequency in frequencies {
            let note = Note::new(frequency, sequence.amplitude, held)?;
            let buffer = self.renderer.render(&note, &sequence.instrument, sequence.pan)?;
            mixer.add(&buffer)?;
        }
        Ok(mixer.finish().map(|mut buffer| {
            sequence.effects.apply(&mut buffer);
            buffer
        }))
    }

    /// Play `sequence` to the end, submitting one buffer per sounding step.
    pub async fn play<S: PlaybackSink>(
        &mut self,
        sequence: &Sequence,
        sink: &mut S,
    ) -> Result<SequenceReport> {
        sequence.validate()?;
        let _playing = PlayingGuard::start(&self.playing);
        self.run(sequence, sink).await
    }

    async fn run<S: PlaybackSink>(&self, sequence: &Sequence, sink: &mut S) -> Result<SequenceReport> {
        info!(
            steps = sequence.steps.len(),
            repetitions = sequence.repetitions,
            bpm = self.tempo.bpm(),
            "sequence started"
        );

        let mut report = SequenceReport::default();
        let mut deadline = self.clock.now();

        for repetition in 0..sequence.repetitions {
            for (index, frequencies) in sequence.steps.iter().enumerate() {
                // Tempo is sampled per step: later steps follow tempo changes,
                // steps already rendered keep theirs.
                let tempo = self.tempo.tempo();
                let step = sequence.interval.to_duration(tempo)?;
                let held = sequence.interval.scale(sequence.gate)?.to_seconds(tempo);

                if let Some(buffer) = self.render_step(frequencies, sequence, held)? {
                    sink.submit(buffer);
                }

                deadline = deadline.checked_add(step).ok_or_else(|| {
                    SynthError::invalid("sequence", "total length does not fit in a duration")
                })?;
                let now = self.clock.now();
                let wait = deadline.saturating_sub(now);
                if now > deadline {
                    report.overruns += 1;
                    warn!(
                        repetition,
                        index,
                        overrun_ms = (now - deadline).as_secs_f64() * 1000.0,
                        "step overran its interval"
                    );
                }
                debug!(repetition, index, wait_ms = wait.as_secs_f64() * 1000.0, "step played");

                report.steps += 1;
                report.waits.push(wait);
                self.clock.sleep(wait).await;
            }
        }

        info!(steps = report.steps, overruns = report.overruns, "sequence finished");
        Ok(report)
    }
}
