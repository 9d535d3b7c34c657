use super::profile::PersonId;

/// Result alias for graph construction and layout operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors surfaced by the graph core.
///
/// Zero-range normalisation and undefined attributes are not errors: the
/// builder substitutes a scale factor of zero and the relation engine a zero
/// attraction.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
	/// `idPersonSelected` matches nobody. The build is abandoned.
	#[error("selected person {id} is not part of the working set")]
	PersonNotFound {
		/// The missing id.
		id: PersonId,
	},

	/// A configuration value outside its inclusive range.
	#[error("configuration field `{field}` = {value} is outside [{min}, {max}]")]
	ConfigOutOfRange {
		/// Field name as serialized.
		field: &'static str,
		/// Rejected value.
		value: f64,
		/// Lower bound.
		min: f64,
		/// Upper bound.
		max: f64,
	},

	/// Display density that is zero, negative or not finite.
	#[error("proportion must be finite and positive, got {0}")]
	InvalidProportion(f64),

	/// Attribute range too small to score `Closer` preferences.
	#[error("attribute range must be at least 2, got {0}")]
	InvalidAttributeRange(f64),

	/// Two nodes of one build share an id.
	#[error("node id `{0}` is emitted twice in one build")]
	DuplicateNodeId(String),

	/// A drag or force referenced a node the simulation does not have.
	#[error("node `{0}` is not part of the simulation")]
	UnknownNode(String),

	/// Layout bounds that are zero, negative or not finite.
	#[error("viewport must be finite and positive, got {width}x{height}")]
	InvalidViewport {
		/// Rejected width.
		width: f64,
		/// Rejected height.
		height: f64,
	},

	/// Configuration JSON that does not parse.
	#[error("invalid configuration JSON: {0}")]
	Json(#[from] serde_json::Error),
}
