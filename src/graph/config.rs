use log::warn;
use serde::{Deserialize, Serialize};

use super::error::{GraphError, Result};
use super::profile::PersonId;

/// Attribute links get `maxAuraRadius / AURA_REDUCTION` added to their length.
pub const AURA_REDUCTION: f64 = 8.0;
/// Rest length of every person to selected-person link.
pub const PERSON_LINK_DISTANCE: f64 = 200.0;
/// Rest length of every person to own attribute satellite link.
pub const SATELLITE_LINK_DISTANCE: f64 = 20.0;

/// Layout tunables. Replacing the value triggers a full rebuild.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphConfiguration {
	/// Person the graph is seen through.
	pub id_person_selected: PersonId,
	/// 0 to 4. Validated but does not change link geometry.
	pub persons_distance_proportion: f64,
	/// 0 to 1
	pub attributes_distance_proportion: f64,
	/// 0 to 1
	pub opacity_aura: f64,
	/// 10 to 100
	pub percent_defined_attributes: f64,
	/// 5 to 100, repulsion magnitude
	pub strength_graph: f64,
	/// 5 to 250
	pub max_aura_radius: f64,
	/// 4 to 10
	pub value_attribute_node: f64,
	/// Draw attribute nodes as solid discs.
	pub full_color_attribute_nodes: bool,
	/// Draw labels.
	pub show_names: bool,
}

impl Default for GraphConfiguration {
	fn default() -> Self {
		Self {
			id_person_selected: 0,
			persons_distance_proportion: 2.5,
			attributes_distance_proportion: 0.7,
			opacity_aura: 1.0,
			percent_defined_attributes: 70.0,
			strength_graph: 10.0,
			max_aura_radius: 200.0,
			value_attribute_node: 4.0,
			full_color_attribute_nodes: true,
			show_names: true,
		}
	}
}

impl GraphConfiguration {
	/// Decode from the camelCase JSON shape and validate.
	pub fn from_json(json: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Reject any field outside its documented range.
	pub fn validate(&self) -> Result<()> {
		let checks: [(&'static str, f64, f64, f64); 7] = [
			("personsDistanceProportion", self.persons_distance_proportion, 0.0, 4.0),
			("attributesDistanceProportion", self.attributes_distance_proportion, 0.0, 1.0),
			("opacityAura", self.opacity_aura, 0.0, 1.0),
			("percentDefinedAttributes", self.percent_defined_attributes, 10.0, 100.0),
			("strengthGraph", self.strength_graph, 5.0, 100.0),
			("maxAuraRadius", self.max_aura_radius, 5.0, 250.0),
			("valueAttributeNode", self.value_attribute_node, 4.0, 10.0),
		];
		for (field, value, min, max) in checks {
			// NaN fails the range check too
			if !(min..=max).contains(&value) {
				warn!("Rejected configuration: {} = {}", field, value);
				return Err(GraphError::ConfigOutOfRange {
					field,
					value,
					min,
					max,
				});
			}
		}
		Ok(())
	}

	/// Length added to every attribute link.
	pub fn aura_offset(&self) -> f64 {
		self.max_aura_radius / AURA_REDUCTION
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_is_valid() {
		assert!(GraphConfiguration::default().validate().is_ok());
	}

	#[test]
	fn out_of_range_is_rejected_not_clamped() {
		let config = GraphConfiguration {
			strength_graph: 101.0,
			..Default::default()
		};
		match config.validate() {
			Err(GraphError::ConfigOutOfRange { field, value, .. }) => {
				assert_eq!(field, "strengthGraph");
				assert_eq!(value, 101.0);
			}
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn range_bounds_are_inclusive() {
		let config = GraphConfiguration {
			max_aura_radius: 250.0,
			value_attribute_node: 4.0,
			opacity_aura: 0.0,
			..Default::default()
		};
		assert!(config.validate().is_ok());
	}

	#[test]
	fn nan_is_rejected() {
		let config = GraphConfiguration {
			opacity_aura: f64::NAN,
			..Default::default()
		};
		assert!(config.validate().is_err());
	}

	#[test]
	fn json_uses_camel_case_and_defaults_missing_fields() {
		let config =
			GraphConfiguration::from_json(r#"{"idPersonSelected": 3, "strengthGraph": 50}"#)
				.unwrap();
		assert_eq!(config.id_person_selected, 3);
		assert_eq!(config.strength_graph, 50.0);
		assert_eq!(config.max_aura_radius, 200.0);
	}

	#[test]
	fn json_out_of_range_fails() {
		let err = GraphConfiguration::from_json(r#"{"percentDefinedAttributes": 5}"#);
		assert!(matches!(err, Err(GraphError::ConfigOutOfRange { .. })));
	}

	#[test]
	fn malformed_json_is_a_json_error() {
		let err = GraphConfiguration::from_json("{");
		assert!(matches!(err, Err(GraphError::Json(_))));
	}
}
