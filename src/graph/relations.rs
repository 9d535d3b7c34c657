//! Pairwise attraction between the selected person and everyone else.

use indexmap::IndexMap;
use log::debug;

use super::error::{GraphError, Result};
use super::profile::{Person, PersonId, Preference, Sign};

/// Attraction scores keyed by person, then by attribute.
///
/// Insertion order follows the `others` slice and the tracked attribute
/// catalog, so a build over the table is deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelationTable {
	/// Every tracked attribute per other person, zero when undefined.
	pub per_person: IndexMap<PersonId, IndexMap<String, f64>>,
	/// Sum of each attribute's attraction over persons that define it.
	pub selected_aggregate: IndexMap<String, f64>,
}

impl RelationTable {
	/// Score of one person and attribute.
	pub fn get(&self, person: PersonId, attribute: &str) -> Option<f64> {
		self.per_person.get(&person)?.get(attribute).copied()
	}

	/// Whether no other person was scored.
	pub fn is_empty(&self) -> bool {
		self.per_person.is_empty()
	}
}

/// Score one attribute value against a preference.
///
/// `Closer` decays the weight linearly with distance and truncates to two
/// decimals. The result can go negative when `|diff| > range - 1`.
pub fn attraction(preference: &Preference, value: f64, range_attributes: f64) -> f64 {
	let Preference {
		value: wanted,
		sign,
		weight,
	} = *preference;
	match sign {
		Sign::Greater if wanted < value => weight,
		Sign::Lesser if wanted > value => weight,
		Sign::Exact if wanted == value => weight,
		Sign::Closer => {
			let unit = weight / (range_attributes - 1.0);
			let decayed = weight - (wanted - value).abs() * unit;
			(decayed * 100.0).floor() / 100.0
		}
		_ => 0.0,
	}
}

/// Build the relation table for `selected` against `others`.
///
/// `others` must not contain `selected`. Undefined attributes score zero and
/// are left out of the aggregate.
pub fn compute(
	selected: &Person,
	others: &[Person],
	tracked_attributes: &[String],
	range_attributes: f64,
) -> Result<RelationTable> {
	if !range_attributes.is_finite() || range_attributes < 2.0 {
		return Err(GraphError::InvalidAttributeRange(range_attributes));
	}

	let mut table = RelationTable::default();
	for other in others {
		let mut scores = IndexMap::with_capacity(tracked_attributes.len());
		for attribute in tracked_attributes {
			let aggregate = table
				.selected_aggregate
				.entry(attribute.clone())
				.or_insert(0.0);

			let score = match (other.attribute(attribute), selected.preference(attribute)) {
				(Some(value), Some(preference)) => {
					let score = attraction(preference, value, range_attributes);
					*aggregate += score;
					score
				}
				(Some(_), None) => {
					debug!(
						"Person {} has no preference for `{}`",
						selected.id, attribute
					);
					0.0
				}
				(None, _) => 0.0,
			};
			scores.insert(attribute.clone(), score);
		}
		table.per_person.insert(other.id, scores);
	}
	Ok(table)
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn pref(value: f64, sign: Sign, weight: f64) -> Preference {
		Preference {
			value,
			sign,
			weight,
		}
	}

	fn person(
		id: PersonId,
		attributes: &[(&str, f64)],
		preferences: &[(&str, Preference)],
	) -> Person {
		Person {
			id,
			name: format!("P{id}"),
			attributes: attributes.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
			preferences: preferences.iter().map(|(k, p)| (k.to_string(), *p)).collect(),
			personal_aura_radius: 100.0,
		}
	}

	fn tracked(names: &[&str]) -> Vec<String> {
		names.iter().map(|n| n.to_string()).collect()
	}

	#[test]
	fn greater_scores_weight_only_above_preference() {
		let selected = person(0, &[], &[("strength", pref(5.0, Sign::Greater, 3.0))]);
		let others = vec![
			person(1, &[("strength", 7.0)], &[]),
			person(2, &[("strength", 3.0)], &[]),
		];
		let table = compute(&selected, &others, &tracked(&["strength"]), 10.0).unwrap();
		assert_eq!(table.get(1, "strength"), Some(3.0));
		assert_eq!(table.get(2, "strength"), Some(0.0));
		assert_eq!(table.selected_aggregate["strength"], 3.0);
	}

	#[test]
	fn lesser_scores_weight_only_below_preference() {
		let p = pref(5.0, Sign::Lesser, 2.0);
		assert_eq!(attraction(&p, 4.0, 10.0), 2.0);
		assert_eq!(attraction(&p, 5.0, 10.0), 0.0);
		assert_eq!(attraction(&p, 6.0, 10.0), 0.0);
	}

	#[test]
	fn exact_boundary() {
		let p = pref(5.0, Sign::Exact, 4.0);
		assert_eq!(attraction(&p, 5.0, 10.0), 4.0);
		assert_eq!(attraction(&p, 4.0, 10.0), 0.0);
		assert_eq!(attraction(&p, 6.0, 10.0), 0.0);
	}

	#[test]
	fn closer_decays_with_distance() {
		let p = pref(5.0, Sign::Closer, 4.0);
		assert_eq!(attraction(&p, 5.0, 10.0), 4.0);
		// 4 - 4 * 4/9 = 2.222.. truncated to two decimals
		assert_eq!(attraction(&p, 9.0, 10.0), 2.22);
		assert_eq!(attraction(&p, 1.0, 10.0), 2.22);
	}

	#[test]
	fn closer_is_monotonic_in_distance() {
		let p = pref(5.0, Sign::Closer, 5.0);
		let mut last = f64::INFINITY;
		for diff in 0..=9 {
			let score = attraction(&p, 5.0 + diff as f64, 10.0);
			assert!(score <= last, "diff {diff}: {score} > {last}");
			last = score;
		}
	}

	#[test]
	fn closer_can_go_negative_past_the_range() {
		let p = pref(1.0, Sign::Closer, 3.0);
		assert!(attraction(&p, 20.0, 10.0) < 0.0);
	}

	#[test]
	fn undefined_attribute_scores_zero_and_skips_aggregate() {
		let selected = person(
			0,
			&[],
			&[
				("strength", pref(5.0, Sign::Exact, 3.0)),
				("humor", pref(2.0, Sign::Greater, 2.0)),
			],
		);
		let others = vec![
			person(1, &[("humor", 4.0)], &[]),
			person(2, &[("strength", 5.0)], &[]),
		];
		let table = compute(&selected, &others, &tracked(&["strength", "humor"]), 10.0).unwrap();
		assert_eq!(table.get(1, "strength"), Some(0.0));
		assert_eq!(table.get(2, "humor"), Some(0.0));
		assert_eq!(table.selected_aggregate["strength"], 3.0);
		assert_eq!(table.selected_aggregate["humor"], 2.0);
	}

	#[test]
	fn aggregate_has_every_tracked_attribute() {
		let selected = person(0, &[], &[("strength", pref(5.0, Sign::Exact, 3.0))]);
		let others = vec![person(1, &[], &[])];
		let table =
			compute(&selected, &others, &tracked(&["strength", "humor"]), 10.0).unwrap();
		assert_eq!(table.selected_aggregate.len(), 2);
		assert!(table.selected_aggregate.values().all(|v| *v == 0.0));
	}

	#[test]
	fn no_others_means_empty_table() {
		let selected = person(0, &[], &[]);
		let table = compute(&selected, &[], &tracked(&["strength"]), 10.0).unwrap();
		assert!(table.is_empty());
		assert!(table.selected_aggregate.is_empty());
	}

	#[test]
	fn aggregate_does_not_depend_on_attribute_order() {
		let prefs = [
			("a", pref(3.0, Sign::Closer, 4.0)),
			("b", pref(6.0, Sign::Lesser, 2.0)),
		];
		let selected = person(0, &[], &prefs);
		let others = vec![
			person(1, &[("a", 1.0), ("b", 2.0)], &[]),
			person(2, &[("a", 9.0)], &[]),
		];
		let forward = compute(&selected, &others, &tracked(&["a", "b"]), 10.0).unwrap();
		let backward = compute(&selected, &others, &tracked(&["b", "a"]), 10.0).unwrap();
		let as_map = |t: &RelationTable| -> HashMap<String, f64> {
			t.selected_aggregate
				.iter()
				.map(|(k, v)| (k.clone(), *v))
				.collect()
		};
		assert_eq!(as_map(&forward), as_map(&backward));
	}

	#[test]
	fn degenerate_range_is_rejected() {
		let selected = person(0, &[], &[]);
		assert!(matches!(
			compute(&selected, &[], &[], 1.0),
			Err(GraphError::InvalidAttributeRange(_))
		));
	}
}
