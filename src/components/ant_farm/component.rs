use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, error};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, MouseEvent, Window,
};

use super::assets::{AssetHandle, AssetLoader, glyph_candidates};
use super::browser::{BrowserImages, fetch_trace};
use super::config::{PlaybackConfig, ViewerParams};
use super::render;
use super::state::AntFarmState;
use super::types::Replay;

#[derive(Clone, Debug, PartialEq, Eq)]
enum LoadState {
	Loading,
	Ready,
	Failed(String),
}

type SharedState = Rc<RefCell<Option<AntFarmState>>>;
type SharedGlyph = Rc<RefCell<AssetHandle<HtmlImageElement>>>;
type SharedCtx = Rc<RefCell<Option<CanvasRenderingContext2d>>>;

/// Set once the component unmounts. Async work that lands later is dropped.
#[derive(Clone, Default)]
struct Teardown(Rc<Cell<bool>>);

impl Teardown {
	fn is_done(&self) -> bool {
		self.0.get()
	}

	/// Marks the component gone and stops any session already installed.
	fn run(&self, state: &SharedState) {
		self.0.set(true);
		if let Some(s) = state.borrow_mut().as_mut() {
			s.session.dispose();
		}
	}
}

/// Installs a freshly loaded state unless the component is already gone.
fn install(state: &SharedState, teardown: &Teardown, next: AntFarmState) -> bool {
	if teardown.is_done() {
		return false;
	}
	*state.borrow_mut() = Some(next);
	true
}

fn viewport(window: &Window) -> (f64, f64) {
	let size = |v: Result<JsValue, JsValue>, fallback: f64| {
		v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
	};
	(
		size(window.inner_width(), 800.0),
		size(window.inner_height(), 600.0),
	)
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas
		.get_context("2d")
		.ok()
		.flatten()
		.and_then(|ctx| ctx.dyn_into().ok())
}

fn redraw(state: &SharedState, glyph: &SharedGlyph, ctx: &SharedCtx) {
	let (mut state, ctx) = (state.borrow_mut(), ctx.borrow());
	if let (Some(s), Some(ctx)) = (state.as_mut(), ctx.as_ref()) {
		s.take_dirty();
		let glyph = glyph.borrow();
		render::render(&s.scene(&*glyph), ctx);
	}
}

#[component]
pub fn AntFarmCanvas(params: ViewerParams) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let glyph: SharedGlyph = Rc::new(RefCell::new(AssetHandle::default()));
	let ctx: SharedCtx = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let frame_id: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
	let torn_down = Teardown::default();
	let (load_state, set_load_state) = signal(LoadState::Loading);
	let (step, set_step) = signal(0usize);

	let (state_init, glyph_init, ctx_init) = (state.clone(), glyph.clone(), ctx.clone());
	let (animate_init, resize_cb_init) = (animate.clone(), resize_cb.clone());
	let (frame_id_init, torn_down_init) = (frame_id.clone(), torn_down.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if ctx_init.borrow().is_some() || torn_down_init.is_done() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			set_load_state.set(LoadState::Failed("no browser window".into()));
			return;
		};

		let (w, h) = viewport(&window);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		let Some(context) = context_2d(&canvas) else {
			error!("canvas has no 2d context");
			set_load_state.set(LoadState::Failed("canvas 2d context unavailable".into()));
			return;
		};
		*ctx_init.borrow_mut() = Some(context);

		let candidates = glyph_candidates(params.glyph.as_deref());
		let (state_glyph, glyph_load, ctx_glyph) =
			(state_init.clone(), glyph_init.clone(), ctx_init.clone());
		let torn_down_glyph = torn_down_init.clone();
		spawn_local(async move {
			let handle = AssetLoader::new(BrowserImages).resolve(&candidates).await;
			if torn_down_glyph.is_done() {
				return;
			}
			if handle.is_loaded() {
				*glyph_load.borrow_mut() = handle;
				redraw(&state_glyph, &glyph_load, &ctx_glyph);
			}
		});

		let params = params.clone();
		let (state_load, glyph_load, ctx_load) =
			(state_init.clone(), glyph_init.clone(), ctx_init.clone());
		let torn_down_load = torn_down_init.clone();
		spawn_local(async move {
			let fetched = fetch_trace(&params).await;
			if torn_down_load.is_done() {
				debug!("trace arrived after unmount, dropped");
				return;
			}
			match fetched {
				Ok(data) => {
					let (w, h) = web_sys::window().map(|w| viewport(&w)).unwrap_or((w, h));
					let replay = Replay::from_data(data);
					let next = AntFarmState::new(replay, w, h, PlaybackConfig::default());
					if !install(&state_load, &torn_down_load, next) {
						return;
					}
					redraw(&state_load, &glyph_load, &ctx_load);
					set_load_state.set(LoadState::Ready);
				}
				Err(err) => {
					error!("failed to load trace: {err}");
					set_load_state.set(LoadState::Failed(err.to_string()));
				}
			}
		});

		let (state_resize, glyph_resize, ctx_resize) =
			(state_init.clone(), glyph_init.clone(), ctx_init.clone());
		let canvas_resize = canvas.clone();
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let Some(win) = web_sys::window() else {
				return;
			};
			let (nw, nh) = viewport(&win);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.resize(nw, nh);
			}
			redraw(&state_resize, &glyph_resize, &ctx_resize);
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (state_anim, glyph_anim, ctx_anim) =
			(state_init.clone(), glyph_init.clone(), ctx_init.clone());
		let (animate_inner, frame_id_anim, torn_down_anim) = (
			animate_init.clone(),
			frame_id_init.clone(),
			torn_down_init.clone(),
		);
		let mut last: Option<f64> = None;
		*animate_init.borrow_mut() = Some(Closure::new(move |now: f64| {
			frame_id_anim.set(None);
			if torn_down_anim.is_done() {
				return;
			}
			let dt = last.map_or(0.0, |prev| now - prev);
			last = Some(now);

			let mut owed = false;
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				if s.session.is_disposed() {
					return;
				}
				let changes = s.tick(dt);
				if changes.step_advanced {
					set_step.set(s.session.step_index());
				}
				owed = s.is_dirty();
			}
			if owed {
				redraw(&state_anim, &glyph_anim, &ctx_anim);
			}

			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				frame_id_anim.set(win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			frame_id_init.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	});

	let state_start = state.clone();
	let on_start = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_start.borrow_mut() {
			if !s.start() {
				debug!("start ignored in phase {:?}", s.session.phase());
			}
		}
	};

	let state_pause = state.clone();
	let on_pause = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_pause.borrow_mut() {
			s.pause();
		}
	};

	let (state_reset, glyph_reset, ctx_reset) = (state.clone(), glyph.clone(), ctx.clone());
	let on_reset = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_reset.borrow_mut() {
			s.reset();
		}
		set_step.set(0);
		redraw(&state_reset, &glyph_reset, &ctx_reset);
	};

	let teardown = StoredValue::new_local((state, resize_cb, animate, frame_id, torn_down));
	on_cleanup(move || {
		let _ = teardown.try_with_value(|(state, resize_cb, animate, frame_id, torn_down)| {
			torn_down.run(state);
			let window = web_sys::window();
			if let (Some(win), Some(id)) = (window.as_ref(), frame_id.take()) {
				let _ = win.cancel_animation_frame(id);
			}
			if let (Some(win), Some(cb)) = (window.as_ref(), resize_cb.borrow().as_ref()) {
				let _ = win
					.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
			// the frame closure holds a handle to itself; dropping it here ends the cycle
			animate.borrow_mut().take();
			resize_cb.borrow_mut().take();
		});
	});

	view! {
		<canvas node_ref=canvas_ref class="ant-farm-canvas" style="display: block;" />
		<div class="ant-farm-controls">
			<button on:click=on_start disabled=move || load_state.get() != LoadState::Ready>
				"Start"
			</button>
			<button on:click=on_pause>"Pause"</button>
			<button on:click=on_reset>"Reset"</button>
			<span class="step-counter">{move || format!("Step: {}", step.get())}</span>
			{move || match load_state.get() {
				LoadState::Failed(msg) => {
					Some(view! { <span class="load-error">{format!("Failed to load trace: {msg}")}</span> })
				}
				_ => None,
			}}
		</div>
	}
}
