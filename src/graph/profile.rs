use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

/// Stable identifier of a person.
pub type PersonId = u32;

/// Attribute values are drawn from `1..=RANGE_ATTRIBUTES`.
pub const RANGE_ATTRIBUTES: u32 = 10;
/// Preference weights are drawn from `1..=RANGE_WEIGHT`.
pub const RANGE_WEIGHT: u32 = 5;

/// Default catalog of tracked attributes.
pub const PERSON_QUALITIES: &[&str] = &[
	"strength",
	"intelligence",
	"humor",
	"kindness",
	"ambition",
	"creativity",
	"patience",
	"honesty",
];

const PERSON_NAMES: &[&str] = &[
	"Ada", "Bruno", "Carla", "Diego", "Elena", "Fabio", "Greta", "Hugo", "Irene", "Jonas", "Karla",
	"Luca", "Marta", "Nico", "Olga", "Pablo", "Rosa", "Saul", "Tania", "Victor",
];

/// How a preference value is compared with another person's attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sign {
	/// Attracted when the attribute exceeds the preference.
	Greater,
	/// Attracted when the attribute is below the preference.
	Lesser,
	/// Attracted only on equality.
	Exact,
	/// Attraction decays linearly with distance.
	Closer,
}

impl Sign {
	const ALL: [Sign; 4] = [Sign::Greater, Sign::Lesser, Sign::Exact, Sign::Closer];
}

/// What a person looks for in one attribute.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preference {
	/// Wanted value, `1..=RANGE_ATTRIBUTES`.
	pub value: f64,
	/// How `value` is compared.
	pub sign: Sign,
	/// Attraction when satisfied, `1..=RANGE_WEIGHT`.
	pub weight: f64,
}

/// A synthetic profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
	/// Stable id, also the node id.
	pub id: PersonId,
	/// Display name with age.
	pub name: String,
	/// Only defined attributes are present.
	pub attributes: HashMap<String, f64>,
	/// One preference per tracked attribute.
	pub preferences: HashMap<String, Preference>,
	/// Scales with the share of defined attributes.
	pub personal_aura_radius: f64,
}

impl Person {
	/// Value of a defined attribute.
	pub fn attribute(&self, name: &str) -> Option<f64> {
		self.attributes.get(name).copied()
	}

	/// Preference for an attribute.
	pub fn preference(&self, name: &str) -> Option<&Preference> {
		self.preferences.get(name)
	}
}

/// Small deterministic generator, same recurrence as the sample data page.
#[derive(Clone, Debug)]
struct Lcg {
	state: u64,
}

impl Lcg {
	const MODULUS: u64 = 233_280;

	fn new(seed: u64) -> Self {
		Self {
			state: seed % Self::MODULUS,
		}
	}

	fn next_f64(&mut self) -> f64 {
		self.state = (self.state * 9301 + 49297) % Self::MODULUS;
		self.state as f64 / Self::MODULUS as f64
	}

	/// `0..range`, or `1..=range` when `one_based`.
	fn number(&mut self, range: u32, one_based: bool) -> u32 {
		let n = ((self.next_f64() * range as f64) as u32).min(range.saturating_sub(1));
		if one_based { n + 1 } else { n }
	}

	fn chance(&mut self, percent: f64) -> bool {
		self.next_f64() * 100.0 < percent
	}

	fn sign(&mut self) -> Sign {
		Sign::ALL[self.number(Sign::ALL.len() as u32, false) as usize]
	}
}

/// Holds created profiles and the currently shown prefix of them.
#[derive(Clone, Debug)]
pub struct ProfileStore {
	created: Vec<Person>,
	shown: usize,
	attributes: Vec<String>,
	percent_defined: f64,
	max_aura_radius: f64,
	rng: Lcg,
}

impl ProfileStore {
	/// Empty store generating persons over `attributes`.
	pub fn new(
		seed: u64,
		attributes: Vec<String>,
		percent_defined: f64,
		max_aura_radius: f64,
	) -> Self {
		Self {
			created: Vec::new(),
			shown: 0,
			attributes,
			percent_defined,
			max_aura_radius,
			rng: Lcg::new(seed),
		}
	}

	/// Store tracking [`PERSON_QUALITIES`].
	pub fn with_default_qualities(seed: u64, percent_defined: f64, max_aura_radius: f64) -> Self {
		let attributes = PERSON_QUALITIES.iter().map(|q| q.to_string()).collect();
		Self::new(seed, attributes, percent_defined, max_aura_radius)
	}

	/// Currently shown persons.
	pub fn persons(&self) -> &[Person] {
		&self.created[..self.shown]
	}

	/// Tracked attribute catalog.
	pub fn attributes(&self) -> &[String] {
		&self.attributes
	}

	/// Adjust the shown population.
	///
	/// A changed catalog or defined-attribute percentage regenerates
	/// everyone; otherwise persons are appended or a prefix is shown.
	/// Counts below two are ignored.
	pub fn resize(
		&mut self,
		count: usize,
		percent_defined: f64,
		attributes: &[String],
	) -> &[Person] {
		if count < 2 {
			return self.persons();
		}

		if attributes != self.attributes.as_slice() || percent_defined != self.percent_defined {
			debug!("Regenerating {} persons", count);
			self.attributes = attributes.to_vec();
			self.percent_defined = percent_defined;
			self.created = self.generate(count, 0);
		} else if count > self.created.len() {
			let first_id = self.created.len() as PersonId;
			let extra = self.generate(count - self.created.len(), first_id);
			debug!("Appending {} persons", extra.len());
			self.created.extend(extra);
		}
		self.shown = count;
		self.persons()
	}

	fn generate(&mut self, count: usize, first_id: PersonId) -> Vec<Person> {
		(0..count as PersonId)
			.map(|offset| self.generate_person(first_id + offset))
			.collect()
	}

	fn generate_person(&mut self, id: PersonId) -> Person {
		let name_idx = self.rng.number(PERSON_NAMES.len() as u32, false) as usize;
		let age = self.rng.number(10, true) + 18;
		let name = format!("{} ({})", PERSON_NAMES[name_idx], age);

		let mut attributes = HashMap::new();
		let mut preferences = HashMap::new();
		for attribute in &self.attributes {
			if self.rng.chance(self.percent_defined) {
				attributes.insert(
					attribute.clone(),
					self.rng.number(RANGE_ATTRIBUTES, true) as f64,
				);
			}
			let preference = Preference {
				value: self.rng.number(RANGE_ATTRIBUTES, true) as f64,
				sign: self.rng.sign(),
				weight: self.rng.number(RANGE_WEIGHT, true) as f64,
			};
			preferences.insert(attribute.clone(), preference);
		}

		let personal_aura_radius = if self.attributes.is_empty() {
			0.0
		} else {
			self.max_aura_radius * attributes.len() as f64 / self.attributes.len() as f64
		};

		Person {
			id,
			name,
			attributes,
			preferences,
			personal_aura_radius,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn qualities() -> Vec<String> {
		PERSON_QUALITIES.iter().map(|q| q.to_string()).collect()
	}

	#[test]
	fn generation_is_deterministic_per_seed() {
		let mut a = ProfileStore::with_default_qualities(7, 70.0, 200.0);
		let mut b = ProfileStore::with_default_qualities(7, 70.0, 200.0);
		assert_eq!(a.resize(12, 70.0, &qualities()), b.resize(12, 70.0, &qualities()));
	}

	#[test]
	fn generated_values_stay_in_range() {
		let mut store = ProfileStore::with_default_qualities(3, 70.0, 200.0);
		for person in store.resize(30, 70.0, &qualities()) {
			for value in person.attributes.values() {
				assert!((1.0..=RANGE_ATTRIBUTES as f64).contains(value));
			}
			assert_eq!(person.preferences.len(), PERSON_QUALITIES.len());
			for pref in person.preferences.values() {
				assert!((1.0..=RANGE_ATTRIBUTES as f64).contains(&pref.value));
				assert!((1.0..=RANGE_WEIGHT as f64).contains(&pref.weight));
			}
			let expected =
				200.0 * person.attributes.len() as f64 / PERSON_QUALITIES.len() as f64;
			assert_eq!(person.personal_aura_radius, expected);
		}
	}

	#[test]
	fn names_carry_an_age_suffix() {
		let mut store = ProfileStore::with_default_qualities(3, 70.0, 200.0);
		for person in store.resize(20, 70.0, &qualities()) {
			let age = person
				.name
				.rsplit_once(" (")
				.and_then(|(_, rest)| rest.strip_suffix(')'))
				.and_then(|age| age.parse::<u32>().ok())
				.unwrap();
			assert!((19..=28).contains(&age), "{}", person.name);
		}
	}

	#[test]
	fn full_percentage_defines_every_attribute() {
		let mut store = ProfileStore::with_default_qualities(1, 100.0, 200.0);
		for person in store.resize(5, 100.0, &qualities()) {
			assert_eq!(person.attributes.len(), PERSON_QUALITIES.len());
			assert_eq!(person.personal_aura_radius, 200.0);
		}
	}

	#[test]
	fn growing_appends_and_keeps_existing_ids() {
		let mut store = ProfileStore::with_default_qualities(1, 70.0, 200.0);
		let before = store.resize(3, 70.0, &qualities()).to_vec();
		let after = store.resize(5, 70.0, &qualities()).to_vec();
		assert_eq!(&after[..3], before.as_slice());
		let ids: Vec<_> = after.iter().map(|p| p.id).collect();
		assert_eq!(ids, vec![0, 1, 2, 3, 4]);
	}

	#[test]
	fn shrinking_shows_a_prefix() {
		let mut store = ProfileStore::with_default_qualities(1, 70.0, 200.0);
		let all = store.resize(6, 70.0, &qualities()).to_vec();
		assert_eq!(store.resize(2, 70.0, &qualities()), &all[..2]);
		// regrowing reuses already created persons
		assert_eq!(store.resize(6, 70.0, &qualities()), all.as_slice());
	}

	#[test]
	fn changed_catalog_regenerates_from_zero() {
		let mut store = ProfileStore::with_default_qualities(1, 70.0, 200.0);
		store.resize(4, 70.0, &qualities());
		let fewer = vec!["strength".to_string()];
		let persons = store.resize(3, 70.0, &fewer);
		assert_eq!(persons.len(), 3);
		assert_eq!(persons[0].id, 0);
		assert!(persons.iter().all(|p| p.preferences.len() == 1));
	}

	#[test]
	fn counts_below_two_are_ignored() {
		let mut store = ProfileStore::with_default_qualities(1, 70.0, 200.0);
		store.resize(4, 70.0, &qualities());
		assert_eq!(store.resize(1, 70.0, &qualities()).len(), 4);
	}

	#[test]
	fn sign_deserializes_from_upper_case() {
		let pref: Preference =
			serde_json::from_str(r#"{"value":5,"sign":"CLOSER","weight":4}"#).unwrap();
		assert_eq!(pref.sign, Sign::Closer);
	}
}
