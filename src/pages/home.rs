use leptos::prelude::*;
use leptos_router::hooks::use_query_map;

use crate::components::ant_farm::{AntFarmCanvas, ViewerParams};

/// Viewer page. `?file=` picks the dataset, `?glyph=` the token image.
#[component]
pub fn Home() -> impl IntoView {
	let query = use_query_map();
	let params = query.with_untracked(|q| ViewerParams::new(q.get("file"), q.get("glyph")));

	view! {
		<div class="fullscreen-graph">
			<AntFarmCanvas params=params />
			<div class="graph-overlay">
				<h1>"Ant Farm"</h1>
				<p class="subtitle">"Start replays the moves, Pause freezes them, Reset clears the board."</p>
			</div>
		</div>
	}
}
