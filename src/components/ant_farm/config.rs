/// Default glyph shipped next to the viewer.
pub const DEFAULT_GLYPH: &str = "/static/image/ANTS.svg";

/// Directory bare glyph filenames are looked up in.
pub const GLYPH_DIR: &str = "static/image";

/// Room name used when the trace marks no room as the start.
pub const FALLBACK_START_ROOM: &str = "0";

const DATA_ENDPOINT: &str = "/data";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackConfig {
	pub step_period_ms: f64,
	pub frame_period_ms: f64,
	pub frames_per_step: u32,
	pub margin: f64,
}

impl Default for PlaybackConfig {
	fn default() -> Self {
		Self {
			step_period_ms: 1000.0,
			frame_period_ms: 40.0,
			frames_per_step: 20,
			margin: 200.0,
		}
	}
}

impl PlaybackConfig {
	/// Clamps values that would stall or divide by zero.
	pub fn sanitized(self) -> Self {
		Self {
			step_period_ms: self.step_period_ms.max(1.0),
			frame_period_ms: self.frame_period_ms.max(1.0),
			frames_per_step: self.frames_per_step.max(1),
			margin: self.margin.max(0.0),
		}
	}
}

/// Options taken from the page query string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewerParams {
	/// Dataset forwarded to the data endpoint as `?file=`.
	pub file: Option<String>,
	/// Preferred glyph, tried ahead of the built-in candidates.
	pub glyph: Option<String>,
}

impl ViewerParams {
	pub fn new(file: Option<String>, glyph: Option<String>) -> Self {
		let keep = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
		Self {
			file: keep(file),
			glyph: keep(glyph),
		}
	}

	/// Data endpoint URL; `encode` percent-encodes the dataset name.
	pub fn data_url(&self, encode: impl Fn(&str) -> String) -> String {
		match &self.file {
			Some(file) => format!("{DATA_ENDPOINT}?file={}", encode(file)),
			None => DATA_ENDPOINT.to_string(),
		}
	}
}
