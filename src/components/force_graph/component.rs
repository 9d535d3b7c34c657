use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::ForceGraphState;
use crate::graph::{GraphConfiguration, Person, RebuildTrigger};

type CanvasRef = NodeRef<leptos::html::Canvas>;

fn window_size(window: &Window) -> (f64, f64) {
	let read = |v: std::result::Result<JsValue, JsValue>, fallback: f64| {
		v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
	};
	(read(window.inner_width(), 800.0), read(window.inner_height(), 600.0))
}

fn parent_size(canvas: &HtmlCanvasElement, width: Option<f64>, height: Option<f64>) -> (f64, f64) {
	let parent = canvas.parent_element();
	(
		width.unwrap_or_else(|| parent.as_ref().map_or(800.0, |p| p.client_width() as f64)),
		height.unwrap_or_else(|| parent.as_ref().map_or(600.0, |p| p.client_height() as f64)),
	)
}

/// Pointer position relative to the canvas' top-left corner.
fn pointer_position(canvas_ref: CanvasRef, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Canvas that lays out and draws the attraction graph.
///
/// Profile and configuration changes rebuild the graph. With `fullscreen`
/// the canvas follows the window size, otherwise the parent's or the
/// given `width` and `height`.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] persons: Signal<Vec<Person>>,
	#[prop(into)] config: Signal<GraphConfiguration>,
	attributes: Vec<String>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = CanvasRef::new();
	let state: Rc<RefCell<Option<ForceGraphState>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			parent_size(&canvas, width, height)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("Canvas has no 2d context");
			return;
		};

		let built = ForceGraphState::new(
			persons.get_untracked(),
			config.get_untracked(),
			attributes.clone(),
			w,
			h,
		);
		match built {
			Ok(s) => *state_init.borrow_mut() = Some(s),
			Err(err) => {
				error!("Could not build graph: {}", err);
				return;
			}
		}

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					if let Err(err) = s.resize(nw, nh) {
						warn!("Resize rejected: {}", err);
					}
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick();
				if s.take_dirty() {
					render::render(s, &ctx);
				}
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	// Profile and configuration changes funnel into one rebuild trigger. The
	// first run only subscribes; the canvas effect performs the initial build.
	let state_profiles = state.clone();
	Effect::new(move |prev: Option<()>| {
		let persons = persons.get();
		if prev.is_none() {
			return;
		}
		if let Some(ref mut s) = *state_profiles.borrow_mut() {
			if let Err(err) = s.apply(RebuildTrigger::Profiles(persons)) {
				warn!("Profiles rejected: {}", err);
			}
		}
	});

	let state_config = state.clone();
	Effect::new(move |prev: Option<()>| {
		let config = config.get();
		if prev.is_none() {
			return;
		}
		if let Some(ref mut s) = *state_config.borrow_mut() {
			if let Err(err) = s.apply(RebuildTrigger::Configuration(config)) {
				warn!("Configuration rejected: {}", err);
			}
		}
	});

	let state_down = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		let mut guard = state_down.borrow_mut();
		let Some(s) = guard.as_mut() else {
			return;
		};
		match s.node_at_position(x, y).map(|n| n.id.clone()) {
			Some(id) => s.begin_drag(&id),
			None => s.begin_pan(x, y),
		}
	};

	let state_move = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		let mut guard = state_move.borrow_mut();
		let Some(s) = guard.as_mut() else {
			return;
		};
		if s.is_dragging() {
			s.drag_to(x, y);
		} else {
			s.pan_to(x, y);
		}
	};

	// mouseup and mouseleave both end the gesture
	let release = {
		let state = state.clone();
		move |_: MouseEvent| {
			if let Some(s) = state.borrow_mut().as_mut() {
				s.release();
			}
		}
	};

	let state_wheel = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		let mut guard = state_wheel.borrow_mut();
		let Some(s) = guard.as_mut() else {
			return;
		};
		s.zoom_at(x, y, ev.delta_y() <= 0.0);
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=release.clone()
			on:mouseleave=release
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
