use std::collections::BTreeMap;

use super::color::token_color;
use super::error::PlaybackError;
use super::layout::{Layout, Point};
use super::types::Step;

#[derive(Clone, Debug, PartialEq)]
pub struct TokenState {
	pub id: String,
	pub from: String,
	pub to: String,
	/// `1.0` means resting at `to`.
	pub progress: f64,
	pub color: String,
}

impl TokenState {
	pub fn resting(id: &str, room: &str) -> Self {
		Self {
			id: id.to_string(),
			from: room.to_string(),
			to: room.to_string(),
			progress: 1.0,
			color: token_color(id),
		}
	}

	/// Interpolated screen position, if both rooms are laid out.
	pub fn position(&self, layout: &Layout) -> Option<Point> {
		let (from, to) = (layout.position(&self.from)?, layout.position(&self.to)?);
		Some(from.lerp(to, self.progress))
	}
}

/// Every token introduced so far, keyed by id.
pub type Tokens = BTreeMap<String, TokenState>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
	/// No cohort is live.
	Idle,
	Moved,
	/// Last sub-frame applied; every member rests at its destination.
	Completed,
}

#[derive(Clone, Debug)]
struct Cohort {
	members: Vec<String>,
	frame: u32,
}

/// Moves one step's tokens in lockstep over a fixed number of sub-frames.
#[derive(Clone, Debug)]
pub struct MotionInterpolator {
	frames: u32,
	cohort: Option<Cohort>,
}

impl MotionInterpolator {
	pub fn new(frames: u32) -> Self {
		Self {
			frames: frames.max(1),
			cohort: None,
		}
	}

	pub fn is_animating(&self) -> bool {
		self.cohort.is_some()
	}

	/// Sub-frames applied to the live cohort so far.
	pub fn frame(&self) -> Option<u32> {
		self.cohort.as_ref().map(|c| c.frame)
	}

	/// Points every token named in `step` from its resting room toward its
	/// destination. Tokens seen for the first time leave from `start_room`.
	pub fn begin_step(
		&mut self,
		step: &Step,
		tokens: &mut Tokens,
		start_room: &str,
	) -> Result<usize, PlaybackError> {
		if self.cohort.is_some() {
			return Err(PlaybackError::CohortInFlight);
		}

		let mut members: Vec<String> = Vec::with_capacity(step.len());
		for cmd in step {
			let state = tokens
				.entry(cmd.token.clone())
				.or_insert_with(|| TokenState::resting(&cmd.token, start_room));
			if members.contains(&cmd.token) {
				// a repeat only retargets; `from` stays the pre-step resting room
				state.to = cmd.destination.clone();
				continue;
			}
			state.from = std::mem::replace(&mut state.to, cmd.destination.clone());
			state.progress = 0.0;
			members.push(cmd.token.clone());
		}

		let size = members.len();
		self.cohort = Some(Cohort { members, frame: 0 });
		Ok(size)
	}

	pub fn advance_frame(&mut self, tokens: &mut Tokens) -> FrameOutcome {
		let Some(cohort) = self.cohort.as_mut() else {
			return FrameOutcome::Idle;
		};

		cohort.frame = (cohort.frame + 1).min(self.frames);
		let progress = f64::from(cohort.frame) / f64::from(self.frames);
		for id in &cohort.members {
			if let Some(state) = tokens.get_mut(id) {
				state.progress = progress;
			}
		}

		if cohort.frame >= self.frames {
			self.cohort = None;
			FrameOutcome::Completed
		} else {
			FrameOutcome::Moved
		}
	}

	/// Drops the live cohort without touching token states.
	pub fn cancel(&mut self) {
		self.cohort = None;
	}
}
