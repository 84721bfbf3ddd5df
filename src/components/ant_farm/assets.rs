use log::{debug, info, warn};

use super::config::{DEFAULT_GLYPH, GLYPH_DIR};
use super::error::AssetError;

/// Glyph availability as seen by the renderer.
///
/// Only [`AssetLoader`] produces a loaded handle; everything else reads it.
#[derive(Clone, Debug)]
pub struct AssetHandle<I> {
	image: Option<I>,
}

impl<I> Default for AssetHandle<I> {
	fn default() -> Self {
		Self { image: None }
	}
}

impl<I> AssetHandle<I> {
	pub fn is_loaded(&self) -> bool {
		self.image.is_some()
	}

	pub fn image(&self) -> Option<&I> {
		self.image.as_ref()
	}
}

/// Something that can fetch a glyph by URL.
// Loading runs on the single wasm thread, so the futures need no `Send` bound.
#[allow(async_fn_in_trait)]
pub trait GlyphSource {
	type Image;

	async fn load(&self, url: &str) -> Result<Self::Image, AssetError>;
}

/// Ordered candidate list: the user override (with path variants when it is
/// a bare filename) ahead of the built-in default.
pub fn glyph_candidates(user: Option<&str>) -> Vec<String> {
	let mut out: Vec<String> = Vec::new();
	let mut push = |url: String| {
		if !out.contains(&url) {
			out.push(url);
		}
	};

	if let Some(user) = user.map(str::trim).filter(|u| !u.is_empty()) {
		if is_bare_filename(user) {
			push(format!("/{GLYPH_DIR}/{user}"));
			push(format!("{GLYPH_DIR}/{user}"));
			push(format!("/{user}"));
		}
		push(user.to_string());
	}
	push(DEFAULT_GLYPH.to_string());
	out
}

fn is_bare_filename(s: &str) -> bool {
	!s.contains('/') && !s.contains(':')
}

pub struct AssetLoader<S> {
	source: S,
}

impl<S: GlyphSource> AssetLoader<S> {
	pub fn new(source: S) -> Self {
		Self { source }
	}

	/// Tries each candidate in order; the first success wins. Exhaustion
	/// yields an unloaded handle, which the renderer treats as "draw circles".
	pub async fn resolve(&self, candidates: &[String]) -> AssetHandle<S::Image> {
		for url in candidates {
			match self.source.load(url).await {
				Ok(image) => {
					info!("glyph loaded from {url}");
					return AssetHandle { image: Some(image) };
				}
				Err(err) => debug!("{err}"),
			}
		}
		warn!(
			"no glyph candidate loaded ({} tried), drawing fallback shapes",
			candidates.len()
		);
		AssetHandle::default()
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use futures::executor::block_on;

	use super::*;

	struct Scripted {
		available: Vec<&'static str>,
		attempts: RefCell<Vec<String>>,
	}

	impl Scripted {
		fn new(available: Vec<&'static str>) -> Self {
			Self {
				available,
				attempts: RefCell::new(Vec::new()),
			}
		}
	}

	impl GlyphSource for &Scripted {
		type Image = String;

		async fn load(&self, url: &str) -> Result<String, AssetError> {
			self.attempts.borrow_mut().push(url.to_string());
			if self.available.iter().any(|a| *a == url) {
				Ok(format!("image:{url}"))
			} else {
				Err(AssetError::load_failed(url))
			}
		}
	}

	#[test]
	fn defaults_only_without_override() {
		assert_eq!(glyph_candidates(None), vec![DEFAULT_GLYPH.to_string()]);
		assert_eq!(glyph_candidates(Some("  ")), vec![DEFAULT_GLYPH.to_string()]);
	}

	#[test]
	fn bare_override_gets_path_variants_first() {
		assert_eq!(
			glyph_candidates(Some("ant.png")),
			vec![
				"/static/image/ant.png",
				"static/image/ant.png",
				"/ant.png",
				"ant.png",
				DEFAULT_GLYPH,
			]
		);
	}

	#[test]
	fn paths_and_urls_are_kept_verbatim() {
		assert_eq!(
			glyph_candidates(Some("https://cdn.example/ant.svg")),
			vec!["https://cdn.example/ant.svg", DEFAULT_GLYPH]
		);
		assert_eq!(glyph_candidates(Some(DEFAULT_GLYPH)), vec![DEFAULT_GLYPH]);
	}

	#[test]
	fn first_success_wins_and_stops() {
		let source = Scripted::new(vec!["b.svg", "c.svg"]);
		let loader = AssetLoader::new(&source);
		let candidates: Vec<String> = ["a.svg", "b.svg", "c.svg"].map(String::from).into();

		let handle = block_on(loader.resolve(&candidates));
		assert!(handle.is_loaded());
		assert_eq!(handle.image().map(String::as_str), Some("image:b.svg"));
		assert_eq!(*source.attempts.borrow(), vec!["a.svg", "b.svg"]);
	}

	#[test]
	fn scenario_exhaustion_leaves_handle_unloaded() {
		let source = Scripted::new(vec![]);
		let loader = AssetLoader::new(&source);
		let candidates = glyph_candidates(Some("missing.svg"));

		let handle = block_on(loader.resolve(&candidates));
		assert!(!handle.is_loaded());
		assert!(handle.image().is_none());
		assert_eq!(*source.attempts.borrow(), candidates);
	}
}
