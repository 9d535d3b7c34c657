//! Relation scoring and graph construction, independent of the DOM.

mod builder;
mod color;
mod config;
mod controller;
mod error;
mod profile;
mod relations;

pub use builder::GraphBuilder;
pub use color::{AuraPalette, Color, ColorScale};
pub use config::{
	AURA_REDUCTION, GraphConfiguration, PERSON_LINK_DISTANCE, SATELLITE_LINK_DISTANCE,
};
pub use controller::{BuiltGraph, GraphController, RebuildTrigger, TriggerOutcome};
pub use error::{GraphError, Result};
pub use profile::{
	PERSON_QUALITIES, Person, PersonId, Preference, ProfileStore, RANGE_ATTRIBUTES, RANGE_WEIGHT,
	Sign,
};
pub use relations::{RelationTable, attraction, compute as compute_relations};
