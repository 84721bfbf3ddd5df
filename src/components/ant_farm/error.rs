/// Failure to obtain or decode the trace. Terminal for the page.
#[derive(thiserror::Error, Debug)]
pub enum TraceError {
	#[error("no browser window available")]
	NoWindow,

	#[error("fetch failed: {0}")]
	Fetch(String),

	#[error("data endpoint returned status {0}")]
	Status(u16),

	#[error("could not read response body: {0}")]
	Body(String),

	#[error("malformed trace data: {0}")]
	Parse(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
	#[error("failed to load glyph from {url}")]
	LoadFailed { url: String },

	#[error("no browser window available")]
	NoWindow,
}

impl AssetError {
	pub fn load_failed(url: impl Into<String>) -> Self {
		Self::LoadFailed { url: url.into() }
	}
}

/// A move token that does not read as `<token>-<room>`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveParseError {
	#[error("move `{0}` has no `-` separator")]
	MissingSeparator(String),

	#[error("move `{0}` has an empty token id")]
	EmptyToken(String),

	#[error("move `{0}` has an empty destination")]
	EmptyDestination(String),
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackError {
	#[error("a cohort is still animating")]
	CohortInFlight,
}
