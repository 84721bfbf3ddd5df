const PALETTE: &[&str] = &[
	"#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4", "#46f0f0", "#f032e6",
	"#bcf60c", "#fabebe", "#008080", "#e6beff", "#9a6324", "#fffac8", "#800000",
];

/// Stable color for a token id.
///
/// Ids whose digits read as `1..=PALETTE.len()` index the palette (1-based);
/// anything else gets a hashed hue.
pub fn token_color(id: &str) -> String {
	let digits: String = id.chars().filter(char::is_ascii_digit).collect();
	if let Ok(n) = digits.parse::<usize>() {
		if (1..=PALETTE.len()).contains(&n) {
			return PALETTE[n - 1].to_string();
		}
	}
	format!("hsl({}, 80%, 50%)", hue(id))
}

// FNV-1a
fn hue(id: &str) -> u64 {
	let hash = id.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
		(h ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
	});
	hash % 360
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn small_suffixes_use_palette() {
		assert_eq!(token_color("L1"), "#e6194b");
		assert_eq!(token_color("L15"), "#800000");
		assert_eq!(token_color("ant7"), PALETTE[6]);
	}

	#[test]
	fn out_of_palette_ids_hash_to_hsl() {
		for id in ["L0", "L16", "L240", "queen"] {
			let c = token_color(id);
			assert!(c.starts_with("hsl(") && c.ends_with(", 80%, 50%)"), "{id}: {c}");
		}
	}

	#[test]
	fn hashed_colors_are_repeatable() {
		assert_eq!(token_color("L16"), token_color("L16"));
		assert_eq!(token_color("X99"), token_color("X99"));
	}

	#[test]
	fn shared_suffix_beyond_palette_still_differs() {
		assert_ne!(token_color("L16"), token_color("M16"));
		assert_ne!(token_color("L16"), token_color("L61"));
	}
}
