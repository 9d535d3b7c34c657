use leptos::prelude::*;
use log::warn;

use crate::components::force_graph::ForceGraphCanvas;
use crate::graph::{GraphConfiguration, PersonId, ProfileStore};

const SEED: u64 = 42;
const DEFAULT_PERSONS: usize = 12;

/// Apply `edit` to a copy of the configuration and publish it only if valid.
fn update_config(config: RwSignal<GraphConfiguration>, edit: impl FnOnce(&mut GraphConfiguration)) {
	let mut next = config.get_untracked();
	edit(&mut next);
	match next.validate() {
		Ok(()) => config.set(next),
		Err(err) => warn!("Ignoring configuration change: {}", err),
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let defaults = GraphConfiguration::default();
	let mut fresh = ProfileStore::with_default_qualities(
		SEED,
		defaults.percent_defined_attributes,
		defaults.max_aura_radius,
	);
	let attributes = fresh.attributes().to_vec();
	let initial = fresh
		.resize(DEFAULT_PERSONS, defaults.percent_defined_attributes, &attributes)
		.to_vec();
	// the store stays on the UI thread, only the handle moves into views
	let store = StoredValue::new_local(fresh);

	let config = RwSignal::new(defaults);
	let count = RwSignal::new(DEFAULT_PERSONS);
	let persons = RwSignal::new(initial);

	let resize_population = {
		let attributes = attributes.clone();
		move |next: usize| {
			let percent = config.get_untracked().percent_defined_attributes;
			let shown = store
				.try_update_value(|s| s.resize(next, percent, &attributes).to_vec())
				.unwrap_or_default();
			if shown.len() != next {
				return;
			}
			if config.get_untracked().id_person_selected as usize >= next {
				update_config(config, |c| c.id_person_selected = 0);
			}
			count.set(next);
			persons.set(shown);
		}
	};
	let grow = resize_population.clone();
	let shrink = resize_population;

	let next_person = move |_| {
		let total = count.get_untracked() as PersonId;
		update_config(config, |c| c.id_person_selected = (c.id_person_selected + 1) % total);
	};
	let stronger = move |_| update_config(config, |c| c.strength_graph += 5.0);
	let weaker = move |_| update_config(config, |c| c.strength_graph -= 5.0);
	let toggle_names = move |_| update_config(config, |c| c.show_names = !c.show_names);
	let toggle_fill = move |_| {
		update_config(config, |c| {
			c.full_color_attribute_nodes = !c.full_color_attribute_nodes
		})
	};

	let selected_name = move || {
		let id = config.get().id_person_selected;
		persons
			.get()
			.iter()
			.find(|p| p.id == id)
			.map(|p| p.name.clone())
			.unwrap_or_default()
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<ForceGraphCanvas
					persons=persons
					config=config
					attributes=attributes
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>"Attraction Graph"</h1>
					<p class="subtitle">
						{move || format!("Seen through the eyes of {}", selected_name())}
					</p>
					<p class="subtitle">
						{move || {
							format!(
								"{} persons, repulsion {}",
								count.get(),
								config.get().strength_graph,
							)
						}}
					</p>
					<div class="graph-controls">
						<button on:click=next_person>"Next person"</button>
						<button on:click=move |_| {
							grow(count.get_untracked() + 1)
						}>"More persons"</button>
						<button on:click=move |_| {
							shrink(count.get_untracked().saturating_sub(1))
						}>"Fewer persons"</button>
						<button on:click=stronger>"Stronger repulsion"</button>
						<button on:click=weaker>"Weaker repulsion"</button>
						<button on:click=toggle_names>"Toggle names"</button>
						<button on:click=toggle_fill>"Toggle attribute fill"</button>
					</div>
				</div>
			</div>
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn assert_send<T: Send>() {}

	#[test]
	fn profile_store_handle_can_cross_into_views() {
		assert_send::<StoredValue<ProfileStore, LocalStorage>>();
	}
}
