use serde::Serialize;

use crate::graph::{Color, PersonId};

/// What a node stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
	/// A person, selected or not.
	Person,
	/// An attribute satellite or an aggregate attribute of the selected person.
	Attribute,
}

/// A node as emitted by a build. Positions live in the simulation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
	/// Unique within one build.
	pub id: String,
	/// Label drawn next to the node.
	pub name: String,
	/// Person or attribute.
	pub kind: NodeKind,
	/// Visual radius.
	pub value: f64,
	/// Fill for full-colour nodes.
	pub color: Color,
	/// Inner stop of the aura gradient.
	pub color_aura: Color,
	/// Drawn as a solid disc instead of an aura.
	pub full_color: bool,
	/// Owning person of an attribute node.
	pub person_id: Option<PersonId>,
}

/// A spring between two node ids.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphLink {
	/// Source node id.
	pub source: String,
	/// Target node id.
	pub target: String,
	/// Desired spring length.
	pub distance: f64,
	/// Drawn dimmed.
	pub light: bool,
}

impl GraphLink {
	/// A regular link with the given rest length.
	pub fn new(source: impl Into<String>, target: impl Into<String>, distance: f64) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			distance,
			light: false,
		}
	}
}

/// Nodes and links of one build, in emission order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GraphData {
	/// All nodes.
	pub nodes: Vec<GraphNode>,
	/// All links.
	pub links: Vec<GraphLink>,
}

impl GraphData {
	/// Find a node by id.
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}
}
