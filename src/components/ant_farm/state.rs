use std::rc::Rc;

use log::{debug, info, warn};

use super::assets::AssetHandle;
use super::config::PlaybackConfig;
use super::layout::Layout;
use super::playback::{Changes, PlaybackSession};
use super::render::Scene;
use super::types::{Graph, Replay};

/// Loaded replay plus everything derived from it for one canvas.
pub struct AntFarmState {
	pub graph: Graph,
	pub layout: Layout,
	pub session: PlaybackSession,
	pub width: f64,
	pub height: f64,
	margin: f64,
	dirty: bool,
}

impl AntFarmState {
	pub fn new(replay: Replay, width: f64, height: f64, config: PlaybackConfig) -> Self {
		let Replay { graph, trace } = replay;
		info!(
			"trace loaded: {} rooms, {} steps",
			graph.rooms.len(),
			trace.len()
		);
		if trace.is_empty() {
			warn!("trace has no moves");
		}
		let start_room = graph.start_room().to_string();
		let config = config.sanitized();

		Self {
			layout: Layout::compute(&graph.rooms, width, height, config.margin),
			session: PlaybackSession::new(Rc::new(trace), start_room, config),
			graph,
			width,
			height,
			margin: config.margin,
			dirty: true,
		}
	}

	/// Recomputes the layout for a new viewport. Token states are untouched.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.layout = Layout::compute(&self.graph.rooms, width, height, self.margin);
		debug!(
			"layout rebuilt for {width}x{height}, scale {:.3}",
			self.layout.scale()
		);
		self.dirty = true;
	}

	pub fn tick(&mut self, dt_ms: f64) -> Changes {
		let changes = self.session.advance(dt_ms);
		self.dirty |= changes.redraw;
		changes
	}

	pub fn start(&mut self) -> bool {
		let started = self.session.start();
		self.dirty |= started;
		started
	}

	pub fn pause(&mut self) -> bool {
		self.session.pause()
	}

	pub fn reset(&mut self) {
		self.session.reset();
		self.dirty = true;
	}

	pub fn is_dirty(&self) -> bool {
		self.dirty
	}

	/// Returns whether a redraw is owed and clears the flag.
	pub fn take_dirty(&mut self) -> bool {
		std::mem::take(&mut self.dirty)
	}

	pub fn scene<'a, I>(&'a self, glyph: &'a AssetHandle<I>) -> Scene<'a, I> {
		Scene {
			graph: &self.graph,
			layout: &self.layout,
			tokens: self.session.tokens(),
			glyph,
			width: self.width,
			height: self.height,
		}
	}
}
