use std::fmt;

use serde::{Serialize, Serializer};

/// An sRGB colour with alpha, printed the way canvas styles expect it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red.
	pub r: u8,
	/// Green.
	pub g: u8,
	/// Blue.
	pub b: u8,
	/// Alpha, 0 to 1.
	pub a: f64,
}

impl Color {
	/// Colour from channels.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Colour of the selected person's node.
	pub fn selected_person(opacity: f64) -> Self {
		Self::rgba(255, 0, 166, opacity)
	}

	fn lerp(from: (u8, u8, u8), to: (u8, u8, u8), t: f64, a: f64) -> Self {
		let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
		Self::rgba(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2), a)
	}
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
	}
}

impl Serialize for Color {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

/// Maps a scalar inside `[min, max]` to a colour.
pub trait ColorScale {
	/// Must not divide by zero when `max == min`.
	fn color_for(&self, value: f64, max: f64, min: f64, opacity: f64, selected: bool) -> Color;
}

/// Cool-to-warm ramp for other persons, dark-to-magenta for the selected one.
#[derive(Clone, Copy, Debug, Default)]
pub struct AuraPalette;

impl AuraPalette {
	const NEUTRAL: (u8, u8, u8) = (127, 127, 127);
	const COLD: (u8, u8, u8) = (100, 180, 255);
	const WARM: (u8, u8, u8) = (255, 197, 0);
	const SELECTED_COLD: (u8, u8, u8) = (90, 20, 70);
	const SELECTED_WARM: (u8, u8, u8) = (255, 0, 166);
}

impl ColorScale for AuraPalette {
	fn color_for(&self, value: f64, max: f64, min: f64, opacity: f64, selected: bool) -> Color {
		let range = max - min;
		if range.abs() < f64::EPSILON || !range.is_finite() || !value.is_finite() {
			let (r, g, b) = Self::NEUTRAL;
			return Color::rgba(r, g, b, opacity);
		}
		let t = ((value - min) / range).clamp(0.0, 1.0);
		if selected {
			Color::lerp(Self::SELECTED_COLD, Self::SELECTED_WARM, t, opacity)
		} else {
			Color::lerp(Self::COLD, Self::WARM, t, opacity)
		}
	}
}
