use std::collections::HashMap;

use super::types::Room;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub fn lerp(self, to: Point, t: f64) -> Point {
		Point {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
		}
	}
}

/// Screen positions keyed by room name. Rebuilt wholesale, never patched.
#[derive(Clone, Debug, Default)]
pub struct Layout {
	positions: HashMap<String, Point>,
	scale: f64,
}

impl Layout {
	/// Fits the raw room coordinates into the viewport with one uniform scale.
	pub fn compute(rooms: &[Room], width: f64, height: f64, margin: f64) -> Self {
		if rooms.is_empty() {
			return Self::default();
		}

		let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
		let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
		for room in rooms {
			min_x = min_x.min(room.x);
			max_x = max_x.max(room.x);
			min_y = min_y.min(room.y);
			max_y = max_y.max(room.y);
		}

		let (bw, bh) = ((max_x - min_x).max(1.0), (max_y - min_y).max(1.0));
		let scale = ((width - margin) / bw)
			.min((height - margin) / bh)
			.max(0.0);
		let half = margin / 2.0;

		let positions = rooms
			.iter()
			.map(|room| {
				let p = Point {
					x: (room.x - min_x) * scale + half,
					y: (room.y - min_y) * scale + half,
				};
				(room.name.clone(), p)
			})
			.collect();

		Self { positions, scale }
	}

	pub fn position(&self, room: &str) -> Option<Point> {
		self.positions.get(room).copied()
	}

	pub fn scale(&self) -> f64 {
		self.scale
	}

	pub fn is_empty(&self) -> bool {
		self.positions.is_empty()
	}
}
