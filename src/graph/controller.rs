use log::{info, warn};

use super::builder::GraphBuilder;
use super::color::{AuraPalette, ColorScale};
use super::config::GraphConfiguration;
use super::error::{GraphError, Result};
use super::profile::Person;
use crate::components::force_graph::{GraphData, Simulation, SimulationSlot, Viewport};

/// Any external change that affects the graph.
#[derive(Clone, Debug, PartialEq)]
pub enum RebuildTrigger {
	/// A new population.
	Profiles(Vec<Person>),
	/// New layout tunables.
	Configuration(GraphConfiguration),
	/// Display density scale factor.
	Proportion(f64),
	/// New canvas bounds.
	Viewport(Viewport),
}

/// What a trigger did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
	/// A new graph and simulation replaced the previous ones.
	Rebuilt,
	/// The live simulation was re-centred and reheated.
	Resized,
	/// Nothing to lay out yet.
	Deferred,
}

/// Output of a build: the graph and its freshly installed simulation.
pub struct BuiltGraph<'a> {
	/// Nodes and links of the build.
	pub data: &'a GraphData,
	/// The live simulation laying them out.
	pub simulation: &'a mut Simulation,
}

/// Owns the current inputs, the built graph and the one live simulation.
pub struct GraphController<C = AuraPalette> {
	builder: GraphBuilder<C>,
	tracked: Vec<String>,
	persons: Vec<Person>,
	config: GraphConfiguration,
	proportion: f64,
	viewport: Viewport,
	data: GraphData,
	slot: SimulationSlot,
}

impl GraphController<AuraPalette> {
	/// Controller with the default palette and nothing built yet.
	pub fn new(
		tracked: Vec<String>,
		config: GraphConfiguration,
		proportion: f64,
		viewport: Viewport,
	) -> Result<Self> {
		Self::with_palette(AuraPalette, tracked, config, proportion, viewport)
	}
}

impl<C: ColorScale> GraphController<C> {
	/// Controller with a custom colour mapping.
	pub fn with_palette(
		palette: C,
		tracked: Vec<String>,
		config: GraphConfiguration,
		proportion: f64,
		viewport: Viewport,
	) -> Result<Self> {
		config.validate()?;
		if !proportion.is_finite() || proportion <= 0.0 {
			return Err(GraphError::InvalidProportion(proportion));
		}
		Ok(Self {
			builder: GraphBuilder::new(palette),
			tracked,
			persons: Vec::new(),
			config,
			proportion,
			viewport,
			data: GraphData::default(),
			slot: SimulationSlot::default(),
		})
	}

	/// Population of the last committed build.
	pub fn persons(&self) -> &[Person] {
		&self.persons
	}

	/// Committed configuration.
	pub fn config(&self) -> &GraphConfiguration {
		&self.config
	}

	/// Committed display density.
	pub fn proportion(&self) -> f64 {
		self.proportion
	}

	/// Committed bounds.
	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	/// Current graph, empty until the first build.
	pub fn data(&self) -> &GraphData {
		&self.data
	}

	/// The live simulation, if a graph is built.
	pub fn simulation(&self) -> Option<&Simulation> {
		self.slot.get()
	}

	/// Mutable access to the live simulation.
	pub fn simulation_mut(&mut self) -> Option<&mut Simulation> {
		self.slot.get_mut()
	}

	/// Number of graphs built so far.
	pub fn generation(&self) -> u64 {
		self.slot.generation()
	}

	/// Single entry point for profile, configuration, density and viewport
	/// changes. Inputs are only committed when the rebuild succeeds.
	pub fn on_trigger_change(&mut self, trigger: RebuildTrigger) -> Result<TriggerOutcome> {
		match trigger {
			RebuildTrigger::Profiles(persons) => {
				let (config, proportion) = (self.config.clone(), self.proportion);
				self.rebuild(persons, config, proportion, self.viewport)
			}
			RebuildTrigger::Configuration(config) => {
				let persons = self.persons.clone();
				self.rebuild(persons, config, self.proportion, self.viewport)
			}
			RebuildTrigger::Proportion(proportion) => {
				let (persons, config) = (self.persons.clone(), self.config.clone());
				self.rebuild(persons, config, proportion, self.viewport)
			}
			RebuildTrigger::Viewport(viewport) => {
				self.viewport = viewport;
				match self.slot.get_mut() {
					Some(simulation) => {
						simulation.resize(viewport);
						Ok(TriggerOutcome::Resized)
					}
					None => Ok(TriggerOutcome::Deferred),
				}
			}
		}
	}

	/// Build for the given bounds from the committed inputs. `None` means
	/// there are no persons to lay out yet.
	pub fn build(&mut self, viewport: Viewport) -> Result<Option<BuiltGraph<'_>>> {
		let (persons, config) = (self.persons.clone(), self.config.clone());
		self.rebuild(persons, config, self.proportion, viewport)?;
		Ok(self.slot.get_mut().map(|simulation| BuiltGraph {
			data: &self.data,
			simulation,
		}))
	}

	fn rebuild(
		&mut self,
		persons: Vec<Person>,
		config: GraphConfiguration,
		proportion: f64,
		viewport: Viewport,
	) -> Result<TriggerOutcome> {
		if !proportion.is_finite() || proportion <= 0.0 {
			return Err(GraphError::InvalidProportion(proportion));
		}
		if persons.is_empty() {
			config.validate()?;
			self.persons = persons;
			self.config = config;
			self.proportion = proportion;
			self.viewport = viewport;
			self.data = GraphData::default();
			self.slot.clear();
			return Ok(TriggerOutcome::Deferred);
		}

		let data = self
			.builder
			.build_from_persons(&persons, &config, &self.tracked, proportion)
			.inspect_err(|err| warn!("Graph rebuild rejected: {}", err))?;

		let mut simulation = Simulation::new(&data, viewport, config.strength_graph);
		simulation.restart(1.0);
		info!(
			"Rebuilt graph around person {}: {} nodes, {} links",
			config.id_person_selected,
			data.nodes.len(),
			data.links.len()
		);

		self.persons = persons;
		self.config = config;
		self.proportion = proportion;
		self.viewport = viewport;
		self.data = data;
		self.slot.install(simulation);
		Ok(TriggerOutcome::Rebuilt)
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::rc::Rc;

	use super::*;
	use crate::graph::profile::{PERSON_QUALITIES, ProfileStore};

	fn tracked() -> Vec<String> {
		PERSON_QUALITIES.iter().map(|q| q.to_string()).collect()
	}

	fn persons(count: usize) -> Vec<Person> {
		let mut store = ProfileStore::with_default_qualities(11, 70.0, 200.0);
		store.resize(count, 70.0, &tracked()).to_vec()
	}

	fn controller() -> GraphController {
		GraphController::new(
			tracked(),
			GraphConfiguration::default(),
			1.0,
			Viewport::new(800.0, 600.0).unwrap(),
		)
		.unwrap()
	}

	#[test]
	fn empty_profiles_defer() {
		let mut ctl = controller();
		assert_eq!(
			ctl.on_trigger_change(RebuildTrigger::Profiles(Vec::new())).unwrap(),
			TriggerOutcome::Deferred
		);
		assert!(ctl.simulation().is_none());
	}

	#[test]
	fn profiles_trigger_a_full_rebuild() {
		let mut ctl = controller();
		let outcome = ctl.on_trigger_change(RebuildTrigger::Profiles(persons(4))).unwrap();
		assert_eq!(outcome, TriggerOutcome::Rebuilt);
		assert_eq!(ctl.generation(), 1);
		assert!(ctl.data().node("0").is_some());
		assert!(ctl.simulation().is_some_and(|s| s.is_running()));
	}

	#[test]
	fn configuration_change_rebuilds_and_retires_old_listeners() {
		let mut ctl = controller();
		ctl.on_trigger_change(RebuildTrigger::Profiles(persons(4))).unwrap();

		let calls = Rc::new(Cell::new(0));
		let counter = calls.clone();
		if let Some(sim) = ctl.simulation_mut() {
			sim.on_tick(move |_| counter.set(counter.get() + 1));
		}

		let config = GraphConfiguration {
			id_person_selected: 2,
			..Default::default()
		};
		ctl.on_trigger_change(RebuildTrigger::Configuration(config)).unwrap();
		if let Some(sim) = ctl.simulation_mut() {
			sim.run(10);
		}
		assert_eq!(calls.get(), 0);
		assert_eq!(ctl.generation(), 2);
		assert_eq!(ctl.config().id_person_selected, 2);
	}

	#[test]
	fn failed_rebuild_keeps_previous_graph() {
		let mut ctl = controller();
		ctl.on_trigger_change(RebuildTrigger::Profiles(persons(4))).unwrap();
		let before = ctl.data().clone();

		let config = GraphConfiguration {
			id_person_selected: 99,
			..Default::default()
		};
		let result = ctl.on_trigger_change(RebuildTrigger::Configuration(config));
		assert!(matches!(result, Err(GraphError::PersonNotFound { id: 99 })));
		assert_eq!(ctl.data(), &before);
		assert_eq!(ctl.config().id_person_selected, 0);
		assert_eq!(ctl.generation(), 1);
	}

	#[test]
	fn invalid_proportion_is_rejected() {
		let mut ctl = controller();
		ctl.on_trigger_change(RebuildTrigger::Profiles(persons(3))).unwrap();
		assert!(ctl.on_trigger_change(RebuildTrigger::Proportion(-1.0)).is_err());
		assert_eq!(ctl.proportion(), 1.0);
	}

	#[test]
	fn proportion_scales_node_sizes() {
		let mut ctl = controller();
		ctl.on_trigger_change(RebuildTrigger::Profiles(persons(3))).unwrap();
		ctl.on_trigger_change(RebuildTrigger::Proportion(0.5)).unwrap();
		assert_eq!(ctl.data().node("0").map(|n| n.value), Some(100.0));
	}

	#[test]
	fn viewport_resizes_the_live_simulation() {
		let mut ctl = controller();
		ctl.on_trigger_change(RebuildTrigger::Profiles(persons(3))).unwrap();
		let viewport = Viewport::new(400.0, 300.0).unwrap();
		let outcome = ctl.on_trigger_change(RebuildTrigger::Viewport(viewport)).unwrap();
		assert_eq!(outcome, TriggerOutcome::Resized);
		assert_eq!(ctl.generation(), 1);
		let sim = ctl.simulation().unwrap();
		assert_eq!(sim.viewport(), viewport);
		assert_eq!(sim.alpha(), 1.0);
	}

	#[test]
	fn build_returns_graph_and_handle() {
		let mut ctl = controller();
		ctl.on_trigger_change(RebuildTrigger::Profiles(persons(3))).unwrap();
		let built = ctl.build(Viewport::new(200.0, 200.0).unwrap()).unwrap().unwrap();
		assert_eq!(built.simulation.nodes().len(), built.data.nodes.len());
		assert_eq!(built.simulation.viewport().width, 200.0);
		assert_eq!(ctl.viewport().width, 200.0);
	}

	#[test]
	fn build_without_persons_is_deferred() {
		let mut ctl = controller();
		let built = ctl.build(Viewport::new(300.0, 300.0).unwrap()).unwrap();
		assert!(built.is_none());
		assert_eq!(ctl.viewport().width, 300.0);
	}

	#[test]
	fn failed_build_keeps_the_committed_viewport() {
		let mut ctl = controller();
		ctl.on_trigger_change(RebuildTrigger::Profiles(persons(3))).unwrap();
		let before = ctl.viewport();
		ctl.config.id_person_selected = 42;

		let result = ctl.build(Viewport::new(120.0, 90.0).unwrap());
		assert!(matches!(result, Err(GraphError::PersonNotFound { id: 42 })));
		assert_eq!(ctl.viewport(), before);
		assert_eq!(ctl.simulation().unwrap().viewport(), before);
	}

	#[test]
	fn invalid_proportion_is_rejected_without_persons() {
		let mut ctl = controller();
		let result = ctl.on_trigger_change(RebuildTrigger::Proportion(-1.0));
		assert!(matches!(result, Err(GraphError::InvalidProportion(p)) if p == -1.0));
		assert_eq!(ctl.proportion(), 1.0);
		let outcome = ctl.on_trigger_change(RebuildTrigger::Profiles(persons(4))).unwrap();
		assert_eq!(outcome, TriggerOutcome::Rebuilt);
	}
}
