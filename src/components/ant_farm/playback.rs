//! Step scheduler and the session aggregate that owns all playback state.
//!
//! Two logical timers drive a session: the step ticker pulls the next step of
//! the trace, and the sub-frame ticker advances the live cohort. Both are fed
//! by [`PlaybackSession::advance`], so cadence is independent of the host's
//! frame rate and fully reproducible in tests.

use std::rc::Rc;

use log::{debug, info, trace};

use super::clock::{Epoch, Ticker};
use super::config::PlaybackConfig;
use super::motion::{FrameOutcome, MotionInterpolator, TokenState, Tokens};
use super::types::Trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	Idle,
	/// Step ticker armed, no cohort moving.
	Running,
	/// Step ticker armed (or the trace is drained) and a cohort is moving.
	AnimatingStep,
	Paused,
	Finished,
}

/// What changed during a call, for the host to react to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Changes {
	pub redraw: bool,
	pub step_advanced: bool,
}

impl Changes {
	fn merge(&mut self, other: Changes) {
		self.redraw |= other.redraw;
		self.step_advanced |= other.step_advanced;
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimerKind {
	Frame,
	Step,
}

pub struct PlaybackSession {
	trace: Option<Rc<Trace>>,
	start_room: String,
	config: PlaybackConfig,
	tokens: Tokens,
	motion: MotionInterpolator,
	phase: Phase,
	step_index: usize,
	epoch: Epoch,
	step_timer: Option<Ticker>,
	frame_timer: Option<Ticker>,
}

impl PlaybackSession {
	pub fn new(trace: Rc<Trace>, start_room: impl Into<String>, config: PlaybackConfig) -> Self {
		let config = config.sanitized();
		Self {
			trace: Some(trace),
			start_room: start_room.into(),
			motion: MotionInterpolator::new(config.frames_per_step),
			config,
			tokens: Tokens::new(),
			phase: Phase::Idle,
			step_index: 0,
			epoch: Epoch::default(),
			step_timer: None,
			frame_timer: None,
		}
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	/// Steps pulled from the trace so far.
	pub fn step_index(&self) -> usize {
		self.step_index
	}

	pub fn tokens(&self) -> &Tokens {
		&self.tokens
	}

	pub fn is_disposed(&self) -> bool {
		self.trace.is_none()
	}

	/// Starts or resumes playback. Returns `false` when rejected.
	pub fn start(&mut self) -> bool {
		let Some(trace) = self.trace.clone() else {
			return false;
		};

		match self.phase {
			Phase::Running | Phase::AnimatingStep | Phase::Finished => false,
			Phase::Idle => {
				for id in &trace.arrivals {
					self.tokens
						.insert(id.clone(), TokenState::resting(id, &self.start_room));
				}
				info!("playback started ({} steps)", trace.len());
				self.arm();
				true
			}
			Phase::Paused => {
				debug!("playback resumed at step {}", self.step_index);
				self.arm();
				true
			}
		}
	}

	/// Freezes playback. The live cohort keeps its progress until resumed.
	pub fn pause(&mut self) -> bool {
		if !matches!(self.phase, Phase::Running | Phase::AnimatingStep) {
			return false;
		}
		self.cancel_timers();
		self.phase = Phase::Paused;
		match self.motion.frame() {
			Some(frame) => debug!("playback paused at step {} frame {frame}", self.step_index),
			None => debug!("playback paused at step {}", self.step_index),
		}
		true
	}

	pub fn reset(&mut self) {
		self.cancel_timers();
		self.motion.cancel();
		self.tokens.clear();
		self.step_index = 0;
		self.phase = Phase::Idle;
		info!("playback reset");
	}

	/// Ends the session for good. Every later control is a no-op.
	pub fn dispose(&mut self) {
		self.reset();
		self.trace = None;
	}

	/// Feeds `dt_ms` of logical time through both timers, firing them in
	/// order. On a tie the sub-frame fires first.
	pub fn advance(&mut self, dt_ms: f64) -> Changes {
		let mut changes = Changes::default();
		let mut budget = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };

		loop {
			let next = [
				(TimerKind::Frame, self.frame_timer.as_ref()),
				(TimerKind::Step, self.step_timer.as_ref()),
			]
			.into_iter()
			.filter_map(|(kind, t)| t.map(|t| (kind, t.remaining_ms(), t.epoch())))
			.filter(|&(_, wait, _)| wait <= budget)
			.min_by(|a, b| a.1.total_cmp(&b.1));

			let Some((kind, wait, epoch)) = next else {
				self.elapse(budget);
				break;
			};

			self.elapse(wait);
			budget -= wait;
			changes.merge(match kind {
				TimerKind::Frame => self.on_frame_tick(epoch),
				TimerKind::Step => self.on_step_tick(epoch),
			});
		}

		changes
	}

	/// Step ticker callback. Ticks from a cancelled generation are ignored.
	pub fn on_step_tick(&mut self, epoch: Epoch) -> Changes {
		let Some(timer) = self.step_timer.as_mut() else {
			return Changes::default();
		};
		if timer.epoch() != epoch || epoch != self.epoch {
			trace!("ignoring stale step tick");
			return Changes::default();
		}
		timer.rearm();

		let Some(trace) = self.trace.clone() else {
			return Changes::default();
		};

		if self.motion.is_animating() {
			debug!("step {} deferred: cohort still moving", self.step_index);
			return Changes::default();
		}

		let Some(step) = trace.step(self.step_index) else {
			self.step_timer = None;
			self.finish();
			return Changes {
				redraw: true,
				step_advanced: false,
			};
		};

		self.step_index += 1;
		match self
			.motion
			.begin_step(step, &mut self.tokens, &self.start_room)
		{
			Ok(size) => debug!("step {} begins with {size} moving", self.step_index),
			Err(err) => debug!("step {} not started: {err}", self.step_index),
		}
		self.frame_timer = Some(Ticker::armed(self.config.frame_period_ms, self.epoch));
		self.phase = Phase::AnimatingStep;

		if self.step_index >= trace.len() {
			self.step_timer = None;
		}

		Changes {
			redraw: true,
			step_advanced: true,
		}
	}

	/// Sub-frame ticker callback. Ticks from a cancelled generation are ignored.
	pub fn on_frame_tick(&mut self, epoch: Epoch) -> Changes {
		let Some(timer) = self.frame_timer.as_mut() else {
			return Changes::default();
		};
		if timer.epoch() != epoch || epoch != self.epoch {
			trace!("ignoring stale frame tick");
			return Changes::default();
		}
		timer.rearm();

		match self.motion.advance_frame(&mut self.tokens) {
			FrameOutcome::Idle => {
				self.frame_timer = None;
				Changes::default()
			}
			FrameOutcome::Moved => Changes {
				redraw: true,
				step_advanced: false,
			},
			FrameOutcome::Completed => {
				self.frame_timer = None;
				let drained = self
					.trace
					.as_ref()
					.is_none_or(|t| self.step_index >= t.len());
				if drained {
					self.step_timer = None;
					self.finish();
				} else {
					self.phase = Phase::Running;
				}
				Changes {
					redraw: true,
					step_advanced: false,
				}
			}
		}
	}

	fn arm(&mut self) {
		self.step_timer = Some(Ticker::armed(self.config.step_period_ms, self.epoch));
		if self.motion.is_animating() {
			self.frame_timer = Some(Ticker::armed(self.config.frame_period_ms, self.epoch));
			self.phase = Phase::AnimatingStep;
		} else {
			self.phase = Phase::Running;
		}
	}

	fn cancel_timers(&mut self) {
		self.epoch = self.epoch.next();
		self.step_timer = None;
		self.frame_timer = None;
	}

	fn finish(&mut self) {
		if self.phase != Phase::Finished {
			info!("playback finished after {} steps", self.step_index);
		}
		self.phase = Phase::Finished;
	}

	fn elapse(&mut self, dt_ms: f64) {
		for timer in [self.frame_timer.as_mut(), self.step_timer.as_mut()]
			.into_iter()
			.flatten()
		{
			timer.elapse(dt_ms);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::ant_farm::layout::Layout;
	use crate::components::ant_farm::types::{Replay, Room, TraceData};

	const FRAME: f64 = 40.0;
	const STEP: f64 = 1000.0;

	fn room(name: &str, x: f64, is_start: bool) -> Room {
		Room {
			name: name.into(),
			x,
			y: 0.0,
			is_start,
			is_end: !is_start,
			links: vec![],
		}
	}

	fn token<'a>(s: &'a PlaybackSession, id: &str) -> Option<&'a TokenState> {
		s.tokens.get(id)
	}

	fn step_epoch(s: &PlaybackSession) -> Option<Epoch> {
		s.step_timer.as_ref().map(Ticker::epoch)
	}

	fn frame_epoch(s: &PlaybackSession) -> Option<Epoch> {
		s.frame_timer.as_ref().map(Ticker::epoch)
	}

	fn session(moves: &[&str]) -> PlaybackSession {
		let replay = Replay::from_data(TraceData {
			rooms: vec![
				room("start", 0.0, true),
				room("mid", 5.0, false),
				room("end", 10.0, false),
			],
			moves: moves.iter().map(|m| m.to_string()).collect(),
		});
		let start = replay.graph.start_room().to_string();
		PlaybackSession::new(Rc::new(replay.trace), start, PlaybackConfig::default())
	}

	#[test]
	fn scenario_single_move_reaches_end() {
		let mut s = session(&["L1-end"]);
		assert!(s.start());

		let l1 = token(&s, "L1").unwrap();
		assert_eq!((l1.from.as_str(), l1.to.as_str(), l1.progress), ("start", "start", 1.0));

		let changes = s.advance(STEP);
		assert!(changes.step_advanced);
		assert_eq!(s.step_index(), 1);
		let l1 = token(&s, "L1").unwrap();
		assert_eq!((l1.from.as_str(), l1.to.as_str(), l1.progress), ("start", "end", 0.0));
		assert_eq!(s.phase(), Phase::AnimatingStep);

		for _ in 0..19 {
			s.advance(FRAME);
			assert!(token(&s, "L1").unwrap().progress < 1.0);
		}
		s.advance(FRAME);
		let l1 = token(&s, "L1").unwrap();
		assert_eq!(l1.progress, 1.0);
		assert_eq!(l1.to, "end");
		assert_eq!(s.phase(), Phase::Finished);
	}

	#[test]
	fn one_large_advance_matches_many_small_ones() {
		let mut coarse = session(&["L1-mid L2-mid", "L1-end L2-end"]);
		let mut fine = session(&["L1-mid L2-mid", "L1-end L2-end"]);
		coarse.start();
		fine.start();

		coarse.advance(2500.0);
		for _ in 0..250 {
			fine.advance(10.0);
		}
		assert_eq!(coarse.tokens(), fine.tokens());
		assert_eq!(coarse.step_index(), fine.step_index());
		assert_eq!(coarse.phase(), fine.phase());
	}

	#[test]
	fn start_is_rejected_while_running() {
		let mut s = session(&["L1-mid", "L1-end"]);
		assert!(s.start());
		let epoch = step_epoch(&s);
		assert!(!s.start());
		assert_eq!(step_epoch(&s), epoch);
		assert_eq!(s.phase(), Phase::Running);
	}

	#[test]
	fn redundant_controls_are_no_ops() {
		let mut s = session(&["L1-mid"]);
		assert!(!s.pause());
		assert_eq!(s.phase(), Phase::Idle);
		s.reset();
		assert_eq!(s.phase(), Phase::Idle);
	}

	#[test]
	fn scenario_pause_freezes_mid_cohort() {
		let mut s = session(&["L1-end"]);
		s.start();
		s.advance(STEP + 9.0 * FRAME);
		assert_eq!(token(&s, "L1").unwrap().progress, 0.45);

		assert!(s.pause());
		assert_eq!(s.phase(), Phase::Paused);
		let changes = s.advance(60_000.0);
		assert_eq!(changes, Changes::default());

		let l1 = token(&s, "L1").unwrap();
		assert_eq!(l1.progress, 0.45);

		let rooms = [room("start", 0.0, true), room("end", 10.0, false)];
		let layout = Layout::compute(&rooms, 1200.0, 400.0, 200.0);
		let (a, b) = (layout.position("start").unwrap(), layout.position("end").unwrap());
		let p = l1.position(&layout).unwrap();
		assert!((p.x - (a.x + (b.x - a.x) * 0.45)).abs() < 1e-9);
	}

	#[test]
	fn resume_continues_the_frozen_cohort() {
		let mut s = session(&["L1-mid", "L1-end"]);
		s.start();
		s.advance(STEP + 5.0 * FRAME);
		s.pause();
		assert!(s.start());
		assert_eq!(s.phase(), Phase::AnimatingStep);
		assert_eq!(token(&s, "L1").unwrap().progress, 0.25);

		s.advance(15.0 * FRAME);
		assert_eq!(token(&s, "L1").unwrap().progress, 1.0);
		assert_eq!(s.phase(), Phase::Running);
		assert_eq!(token(&s, "L1").unwrap().from, "start");
	}

	#[test]
	fn resumed_last_cohort_finishes_on_landing() {
		let mut s = session(&["L1-end"]);
		s.start();
		s.advance(STEP + 10.0 * FRAME);
		s.pause();
		s.start();
		s.advance(10.0 * FRAME);
		assert_eq!(s.phase(), Phase::Finished);
		assert_eq!(token(&s, "L1").unwrap().progress, 1.0);
		assert!(step_epoch(&s).is_none());
	}

	#[test]
	fn resume_does_not_replace_tokens() {
		let mut s = session(&["L1-mid", "L1-end"]);
		s.start();
		s.advance(STEP + 20.0 * FRAME);
		s.pause();
		s.start();
		assert_eq!(token(&s, "L1").unwrap().to, "mid");
	}

	#[test]
	fn stale_ticks_are_ignored_after_pause() {
		let mut s = session(&["L1-end"]);
		s.start();
		s.advance(STEP + FRAME);
		let stale = frame_epoch(&s).unwrap();
		let before = s.tokens().clone();

		s.pause();
		assert_eq!(s.on_frame_tick(stale), Changes::default());
		assert_eq!(s.tokens(), &before);

		s.start();
		assert_ne!(frame_epoch(&s), Some(stale));
		assert_eq!(s.on_frame_tick(stale), Changes::default());
		assert_eq!(s.tokens(), &before);
	}

	#[test]
	fn stale_step_tick_after_reset_is_ignored() {
		let mut s = session(&["L1-mid", "L1-end"]);
		s.start();
		let epoch = step_epoch(&s).unwrap();
		s.reset();
		assert_eq!(s.on_step_tick(epoch), Changes::default());
		assert_eq!(s.step_index(), 0);
		assert!(s.tokens().is_empty());
	}

	#[test]
	fn overrun_defers_instead_of_dropping() {
		let config = PlaybackConfig {
			step_period_ms: 500.0,
			..PlaybackConfig::default()
		};
		let trace = Replay::from_data(TraceData {
			rooms: vec![room("start", 0.0, true), room("end", 1.0, false)],
			moves: vec!["L1-end".into(), "L2-end".into()],
		})
		.trace;
		let mut s = PlaybackSession::new(Rc::new(trace), "start", config);
		s.start();

		s.advance(500.0);
		assert_eq!(s.step_index(), 1);
		// cohort needs 800ms; the 1000ms tick finds it still moving
		s.advance(500.0);
		assert_eq!(s.step_index(), 1);
		assert!(token(&s, "L2").is_none());
		assert_eq!(s.phase(), Phase::AnimatingStep);
		s.advance(500.0);
		assert_eq!(s.step_index(), 2);
		assert_eq!(token(&s, "L2").unwrap().to, "end");
	}

	#[test]
	fn reset_always_returns_to_idle() {
		for elapsed in [0.0, STEP + 3.0 * FRAME, STEP * 5.0] {
			for pause in [false, true] {
				let mut s = session(&["L1-mid", "L1-end L2-mid", "L2-end"]);
				s.start();
				s.advance(elapsed);
				if pause {
					s.pause();
				}
				s.reset();
				assert_eq!(s.phase(), Phase::Idle);
				assert_eq!(s.step_index(), 0);
				assert!(s.tokens().is_empty());
				assert!(step_epoch(&s).is_none());
				assert!(frame_epoch(&s).is_none());
				assert_eq!(s.advance(10_000.0), Changes::default());
			}
		}
	}

	#[test]
	fn restart_after_reset_replays_from_the_top() {
		let mut s = session(&["L1-mid", "L1-end"]);
		s.start();
		s.advance(STEP * 3.0);
		assert_eq!(s.phase(), Phase::Finished);
		assert!(!s.start());

		s.reset();
		assert!(s.start());
		assert_eq!(token(&s, "L1").unwrap().to, "start");
		s.advance(STEP);
		assert_eq!(s.step_index(), 1);
	}

	#[test]
	fn every_first_line_token_arrives_even_if_its_move_was_dropped() {
		let mut s = session(&["L1-end L2-ghost", "L2-end"]);
		assert!(s.start());
		let ids: Vec<&str> = s.tokens().keys().map(String::as_str).collect();
		assert_eq!(ids, vec!["L1", "L2"]);
		assert_eq!(token(&s, "L2").unwrap().to, "start");

		s.advance(STEP * 2.0 + FRAME * 20.0);
		assert_eq!(s.phase(), Phase::Finished);
		let l2 = token(&s, "L2").unwrap();
		assert_eq!((l2.from.as_str(), l2.to.as_str()), ("start", "end"));
	}

	#[test]
	fn late_newcomer_leaves_from_start() {
		let mut s = session(&["L1-mid", "L1-end L2-mid"]);
		s.start();
		assert!(token(&s, "L2").is_none());
		s.advance(STEP * 2.0);
		let l2 = token(&s, "L2").unwrap();
		assert_eq!((l2.from.as_str(), l2.to.as_str()), ("start", "mid"));
	}

	#[test]
	fn empty_trace_finishes_on_first_tick() {
		let mut s = session(&[]);
		assert!(s.start());
		assert!(s.tokens().is_empty());
		s.advance(STEP);
		assert_eq!(s.phase(), Phase::Finished);
	}

	#[test]
	fn disposed_session_ignores_controls() {
		let mut s = session(&["L1-mid"]);
		s.dispose();
		assert!(s.is_disposed());
		assert!(!s.start());
		assert_eq!(s.advance(STEP), Changes::default());
	}
}
