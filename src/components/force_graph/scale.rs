//! Display density derived from the viewport width.

/// Proportion applied to every size and distance for a viewport `width`.
pub fn proportion_for_width(width: f64) -> f64 {
	if width < 600.0 {
		0.5
	} else if width < 1024.0 {
		0.75
	} else {
		1.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn breakpoints() {
		assert_eq!(proportion_for_width(320.0), 0.5);
		assert_eq!(proportion_for_width(600.0), 0.75);
		assert_eq!(proportion_for_width(1023.0), 0.75);
		assert_eq!(proportion_for_width(1920.0), 1.0);
	}
}
