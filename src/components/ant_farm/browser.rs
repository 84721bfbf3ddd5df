use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlImageElement, Response};

use super::assets::GlyphSource;
use super::config::ViewerParams;
use super::error::{AssetError, TraceError};
use super::types::{TraceData, parse_trace};

fn describe(value: &JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Fetches and decodes the trace from the data endpoint.
pub async fn fetch_trace(params: &ViewerParams) -> Result<TraceData, TraceError> {
	let window = web_sys::window().ok_or(TraceError::NoWindow)?;
	let url = params.data_url(|s| String::from(js_sys::encode_uri_component(s)));

	let value = JsFuture::from(window.fetch_with_str(&url))
		.await
		.map_err(|e| TraceError::Fetch(describe(&e)))?;
	let response: Response = value
		.dyn_into()
		.map_err(|_| TraceError::Fetch("fetch returned unexpected type".to_string()))?;
	if !response.ok() {
		return Err(TraceError::Status(response.status()));
	}

	let body = response.text().map_err(|e| TraceError::Body(describe(&e)))?;
	let text = JsFuture::from(body)
		.await
		.map_err(|e| TraceError::Body(describe(&e)))?
		.as_string()
		.ok_or_else(|| TraceError::Body("body is not text".to_string()))?;

	parse_trace(&text)
}

/// Loads glyphs through `<img>` elements.
pub struct BrowserImages;

impl GlyphSource for BrowserImages {
	type Image = HtmlImageElement;

	async fn load(&self, url: &str) -> Result<HtmlImageElement, AssetError> {
		let img = HtmlImageElement::new().map_err(|_| AssetError::NoWindow)?;
		let promise = Promise::new(&mut |resolve, reject| {
			let onload = Closure::once_into_js(move || {
				let _ = resolve.call0(&JsValue::UNDEFINED);
			});
			let onerror = Closure::once_into_js(move || {
				let _ = reject.call0(&JsValue::UNDEFINED);
			});
			img.set_onload(Some(onload.unchecked_ref()));
			img.set_onerror(Some(onerror.unchecked_ref()));
		});
		img.set_src(url);

		let loaded = JsFuture::from(promise).await;
		img.set_onload(None);
		img.set_onerror(None);
		loaded.map_err(|_| AssetError::load_failed(url))?;
		Ok(img)
	}
}
