use std::f64::consts::PI;

use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::assets::AssetHandle;
use super::layout::{Layout, Point};
use super::motion::Tokens;
use super::types::{Graph, Room};

pub const ROOM_RADIUS: f64 = 20.0;
pub const GLYPH_SIZE: f64 = 24.0;
pub const TOKEN_RADIUS: f64 = 10.0;

const LINK_COLOR: &str = "#ccc";
const START_FILL: &str = "#4caf50";
const END_FILL: &str = "#f44336";
const ROOM_FILL: &str = "#fff";
const OUTLINE: &str = "#000";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Baseline {
	Middle,
	Top,
}

impl Baseline {
	fn as_css(self) -> &'static str {
		match self {
			Self::Middle => "middle",
			Self::Top => "top",
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCmd {
	Clear {
		width: f64,
		height: f64,
	},
	Line {
		from: Point,
		to: Point,
		color: &'static str,
		width: f64,
	},
	Circle {
		center: Point,
		radius: f64,
		fill: String,
		outline: bool,
	},
	Glyph {
		center: Point,
		size: f64,
	},
	Label {
		at: Point,
		text: String,
		size_px: f64,
		baseline: Baseline,
	},
}

/// Everything one frame is drawn from.
pub struct Scene<'a, I> {
	pub graph: &'a Graph,
	pub layout: &'a Layout,
	pub tokens: &'a Tokens,
	pub glyph: &'a AssetHandle<I>,
	pub width: f64,
	pub height: f64,
}

/// Builds the draw list for one frame: links, then rooms, then tokens.
pub fn frame<I>(scene: &Scene<'_, I>) -> Vec<DrawCmd> {
	let mut cmds = vec![DrawCmd::Clear {
		width: scene.width,
		height: scene.height,
	}];
	if scene.layout.is_empty() {
		return cmds;
	}
	draw_links(scene, &mut cmds);
	draw_rooms(scene, &mut cmds);
	draw_tokens(scene, &mut cmds);
	cmds
}

fn draw_links<I>(scene: &Scene<'_, I>, cmds: &mut Vec<DrawCmd>) {
	for room in &scene.graph.rooms {
		let Some(from) = scene.layout.position(&room.name) else {
			continue;
		};
		for link in &room.links {
			// links to rooms the trace never declared are skipped
			if let Some(to) = scene.layout.position(link) {
				cmds.push(DrawCmd::Line {
					from,
					to,
					color: LINK_COLOR,
					width: 2.0,
				});
			}
		}
	}
}

fn room_fill(room: &Room) -> &'static str {
	if room.is_start {
		START_FILL
	} else if room.is_end {
		END_FILL
	} else {
		ROOM_FILL
	}
}

fn draw_rooms<I>(scene: &Scene<'_, I>, cmds: &mut Vec<DrawCmd>) {
	for room in &scene.graph.rooms {
		let Some(center) = scene.layout.position(&room.name) else {
			continue;
		};
		cmds.push(DrawCmd::Circle {
			center,
			radius: ROOM_RADIUS,
			fill: room_fill(room).to_string(),
			outline: true,
		});
		cmds.push(DrawCmd::Label {
			at: center,
			text: room.name.clone(),
			size_px: 14.0,
			baseline: Baseline::Middle,
		});
	}
}

fn draw_tokens<I>(scene: &Scene<'_, I>, cmds: &mut Vec<DrawCmd>) {
	let loaded = scene.glyph.is_loaded();
	for token in scene.tokens.values() {
		let Some(center) = token.position(scene.layout) else {
			continue;
		};
		if loaded {
			cmds.push(DrawCmd::Glyph {
				center,
				size: GLYPH_SIZE,
			});
		} else {
			cmds.push(DrawCmd::Circle {
				center,
				radius: TOKEN_RADIUS,
				fill: token.color.clone(),
				outline: false,
			});
		}
		cmds.push(DrawCmd::Label {
			at: Point {
				x: center.x,
				y: center.y + GLYPH_SIZE / 2.0 + 5.0,
			},
			text: token.id.clone(),
			size_px: 10.0,
			baseline: Baseline::Top,
		});
	}
}

/// Paints a draw list. Glyph commands are skipped if no image is given.
pub fn paint(cmds: &[DrawCmd], ctx: &CanvasRenderingContext2d, glyph: Option<&HtmlImageElement>) {
	for cmd in cmds {
		match cmd {
			DrawCmd::Clear { width, height } => ctx.clear_rect(0.0, 0.0, *width, *height),
			DrawCmd::Line {
				from,
				to,
				color,
				width,
			} => {
				ctx.begin_path();
				ctx.move_to(from.x, from.y);
				ctx.line_to(to.x, to.y);
				ctx.set_stroke_style_str(color);
				ctx.set_line_width(*width);
				ctx.stroke();
			}
			DrawCmd::Circle {
				center,
				radius,
				fill,
				outline,
			} => {
				ctx.begin_path();
				let _ = ctx.arc(center.x, center.y, *radius, 0.0, 2.0 * PI);
				ctx.set_fill_style_str(fill);
				ctx.fill();
				if *outline {
					ctx.set_stroke_style_str(OUTLINE);
					ctx.set_line_width(2.0);
					ctx.stroke();
				}
			}
			DrawCmd::Glyph { center, size } => {
				if let Some(img) = glyph {
					let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
						img,
						center.x - size / 2.0,
						center.y - size / 2.0,
						*size,
						*size,
					);
				}
			}
			DrawCmd::Label {
				at,
				text,
				size_px,
				baseline,
			} => {
				ctx.set_fill_style_str(OUTLINE);
				ctx.set_font(&format!("{size_px}px sans-serif"));
				ctx.set_text_align("center");
				ctx.set_text_baseline(baseline.as_css());
				let _ = ctx.fill_text(text, at.x, at.y);
			}
		}
	}
}

/// Draws one frame straight onto the canvas.
pub fn render(scene: &Scene<'_, HtmlImageElement>, ctx: &CanvasRenderingContext2d) {
	paint(&frame(scene), ctx, scene.glyph.image());
}
