//! Turns a relation table into nodes and links.
//!
//! Node ids: persons use their numeric id, per-person attribute satellites
//! use `{personId}_{attribute}`, and the selected person's aggregate
//! attribute nodes use the bare attribute name.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::color::{AuraPalette, Color, ColorScale};
use super::config::{GraphConfiguration, PERSON_LINK_DISTANCE, SATELLITE_LINK_DISTANCE};
use super::error::{GraphError, Result};
use super::profile::{Person, PersonId, RANGE_ATTRIBUTES};
use super::relations::{self, RelationTable};
use crate::components::force_graph::{GraphData, GraphLink, GraphNode, NodeKind};

fn satellite_id(person: PersonId, attribute: &str) -> String {
	format!("{person}_{attribute}")
}

/// Attractions below zero are treated as no attraction.
fn attribute_distance(attraction: f64, aura_offset: f64) -> f64 {
	attraction.max(0.0) * 10.0 + aura_offset
}

/// Scale factor applied to attribute link lengths. Zero when the tracked
/// maximum is zero so that no NaN reaches the simulation.
fn rescale_factor(max_distance: f64, config: &GraphConfiguration, proportion: f64) -> f64 {
	if max_distance <= 0.0 {
		debug!("Zero normalisation range, attribute links collapse to zero length");
		return 0.0;
	}
	config.max_aura_radius * config.attributes_distance_proportion / max_distance * proportion
}

fn rescale(
	links: &mut [GraphLink],
	max_distance: f64,
	config: &GraphConfiguration,
	proportion: f64,
) {
	let factor = rescale_factor(max_distance, config, proportion);
	for link in links {
		link.distance *= factor;
	}
}

fn min_max(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
	values.into_iter().fold(None, |acc, v| match acc {
		None => Some((v, v)),
		Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
	})
}

/// Builds graph data with a pluggable colour mapping.
#[derive(Clone, Debug, Default)]
pub struct GraphBuilder<C = AuraPalette> {
	palette: C,
}

impl<C: ColorScale> GraphBuilder<C> {
	/// Builder colouring nodes with `palette`.
	pub fn new(palette: C) -> Self {
		Self { palette }
	}

	/// Locate the selected person, score everyone else and build.
	pub fn build_from_persons(
		&self,
		persons: &[Person],
		config: &GraphConfiguration,
		tracked_attributes: &[String],
		proportion: f64,
	) -> Result<GraphData> {
		let selected_id = config.id_person_selected;
		let Some(selected) = persons.iter().find(|p| p.id == selected_id) else {
			return Err(GraphError::PersonNotFound { id: selected_id });
		};
		let others: Vec<Person> = persons
			.iter()
			.filter(|p| p.id != selected_id)
			.cloned()
			.collect();
		let relations =
			relations::compute(selected, &others, tracked_attributes, RANGE_ATTRIBUTES as f64)?;
		self.build(&relations, selected, &others, config, proportion)
	}

	/// Emit every node and link family. Either the whole graph is returned
	/// or an error, never a partial set.
	pub fn build(
		&self,
		relations: &RelationTable,
		selected: &Person,
		others: &[Person],
		config: &GraphConfiguration,
		proportion: f64,
	) -> Result<GraphData> {
		config.validate()?;
		if !proportion.is_finite() || proportion <= 0.0 {
			return Err(GraphError::InvalidProportion(proportion));
		}

		let by_id: HashMap<PersonId, &Person> = others.iter().map(|p| (p.id, p)).collect();
		let selected_id = selected.id.to_string();
		let aura_offset = config.aura_offset();
		let attribute_value = config.value_attribute_node * proportion;

		let mut bus_links = Vec::new();
		let mut person_links = Vec::new();
		let mut satellites = Vec::new();
		let mut max_distance_relations = 0.0_f64;

		for (&person_id, scores) in &relations.per_person {
			for (attribute, &score) in scores {
				let satellite = satellite_id(person_id, attribute);
				let distance = attribute_distance(score, aura_offset);

				bus_links.push(GraphLink::new(
					person_id.to_string(),
					satellite.clone(),
					SATELLITE_LINK_DISTANCE,
				));
				bus_links.push(GraphLink::new(attribute.clone(), satellite.clone(), distance));
				for (&other_id, other_scores) in &relations.per_person {
					if other_id == person_id {
						continue;
					}
					let other_score = other_scores.get(attribute).copied().unwrap_or(0.0);
					bus_links.push(GraphLink::new(
						satellite.clone(),
						satellite_id(other_id, attribute),
						attribute_distance(other_score, aura_offset),
					));
				}
				max_distance_relations = max_distance_relations.max(distance);
			}

			let (min, max) = min_max(scores.values().map(|s| s.max(0.0))).unwrap_or((0.0, 0.0));
			for (attribute, &score) in scores {
				let color = self.palette.color_for(score.max(0.0), max, min, 1.0, false);
				satellites.push(GraphNode {
					id: satellite_id(person_id, attribute),
					name: attribute.clone(),
					kind: NodeKind::Attribute,
					value: attribute_value,
					color,
					color_aura: color,
					full_color: config.full_color_attribute_nodes,
					person_id: Some(person_id),
				});
			}

			person_links.push(GraphLink::new(
				person_id.to_string(),
				selected_id.clone(),
				PERSON_LINK_DISTANCE,
			));
		}

		// Person link lengths only drive aura colour; the links keep the
		// unscaled default length.
		let (min_person, max_person) =
			min_max(person_links.iter().map(|l| l.distance)).unwrap_or((0.0, 0.0));
		let mut nodes = Vec::with_capacity(relations.per_person.len() * 2 + 1);
		for (link, &person_id) in person_links.iter().zip(relations.per_person.keys()) {
			let person = by_id
				.get(&person_id)
				.ok_or(GraphError::PersonNotFound { id: person_id })?;
			let color = self.palette.color_for(
				link.distance,
				max_person,
				min_person,
				config.opacity_aura,
				false,
			);
			nodes.push(GraphNode {
				id: person_id.to_string(),
				name: person.name.clone(),
				kind: NodeKind::Person,
				value: person.personal_aura_radius * proportion,
				color,
				color_aura: color,
				full_color: false,
				person_id: None,
			});
		}

		rescale(&mut bus_links, max_distance_relations, config, proportion);

		let selected_color = Color::selected_person(config.opacity_aura);
		nodes.push(GraphNode {
			id: selected_id.clone(),
			name: selected.name.clone(),
			kind: NodeKind::Person,
			value: config.max_aura_radius * proportion,
			color: selected_color,
			color_aura: selected_color,
			full_color: false,
			person_id: None,
		});

		let mut selected_links: Vec<GraphLink> = relations
			.selected_aggregate
			.iter()
			.map(|(attribute, &sum)| {
				GraphLink::new(
					attribute.clone(),
					selected_id.clone(),
					attribute_distance(sum, aura_offset),
				)
			})
			.collect();
		let (min_selected, max_selected) =
			min_max(selected_links.iter().map(|l| l.distance)).unwrap_or((0.0, 0.0));
		for link in &selected_links {
			let color = self
				.palette
				.color_for(link.distance, max_selected, min_selected, 1.0, true);
			nodes.push(GraphNode {
				id: link.source.clone(),
				name: link.source.clone(),
				kind: NodeKind::Attribute,
				value: attribute_value,
				color,
				color_aura: color,
				full_color: config.full_color_attribute_nodes,
				person_id: Some(selected.id),
			});
		}
		rescale(&mut selected_links, max_selected, config, proportion);

		nodes.extend(satellites);

		let mut seen = HashSet::with_capacity(nodes.len());
		if let Some(duplicate) = nodes.iter().find(|n| !seen.insert(n.id.as_str())) {
			return Err(GraphError::DuplicateNodeId(duplicate.id.clone()));
		}

		let mut links = bus_links;
		links.extend(person_links);
		links.extend(selected_links);

		debug!(
			"Built graph for person {}: {} nodes, {} links",
			selected.id,
			nodes.len(),
			links.len()
		);
		Ok(GraphData { nodes, links })
	}
}
