use leptos::prelude::*;

/// 404 page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<h1>"Not found"</h1>
		<p>"Nothing lives at this address. The viewer is at " <a href="/">"/"</a> "."</p>
	}
}
