// src/components/compare_view.rs
use crate::compare::{ComparePair, RevealSplit};
use crate::geometry::{client_point, Bounds, ClientPoint};
use crate::utils::resource_url;
use gloo::utils::document;
use gloo_events::EventListener;
use wasm_bindgen::JsCast;
use web_sys::KeyboardEvent;
use yew::prelude::*;

const KEY_STEP: f64 = 0.02;

#[derive(Properties, PartialEq)]
pub struct CompareViewProps {
    pub pair: ComparePair,
}

#[function_component(CompareView)]
pub fn compare_view(props: &CompareViewProps) -> Html {
    let split = use_state(RevealSplit::default);
    let dragging = use_state(|| false);
    let frame_ref = use_node_ref();

    // ------ KEYBOARD NUDGE ------
    {
        let split = split.clone();
        use_effect_with(split.clone(), move |_| {
            let split = split.clone();
            let listener = EventListener::new(&document(), "keydown", move |event| {
                let Some(keyboard_event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                let next = match keyboard_event.key().as_str() {
                    "ArrowLeft" => split.nudge(-KEY_STEP),
                    "ArrowRight" => split.nudge(KEY_STEP),
                    "Home" => RevealSplit::new(0.0),
                    "End" => RevealSplit::new(1.0),
                    _ => return,
                };
                split.set(next);
                keyboard_event.prevent_default();
            });

            || drop(listener)
        });
    }

    // ------ DRAG END ------
    // Released anywhere on the page, not only over the frame.
    {
        let dragging = dragging.clone();
        use_effect_with((), move |_| {
            let listener = EventListener::new(&document(), "mouseup", move |_| dragging.set(false));
            || drop(listener)
        });
    }

    let move_to = {
        let split = split.clone();
        let frame_ref = frame_ref.clone();
        move |point: ClientPoint| {
            let Some(frame) = frame_ref.cast::<web_sys::Element>() else {
                return;
            };
            let bounds = Bounds::from_dom_rect(&frame.get_bounding_client_rect());
            match RevealSplit::from_pointer(point, bounds) {
                Ok(next) => split.set(next),
                Err(e) => log::debug!("Split not moved: {}", e),
            }
        }
    };

    // ------ DRAG START ------
    let onmousedown = {
        let dragging = dragging.clone();
        let move_to = move_to.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            dragging.set(true);
            if let Some(point) = client_point(&e) {
                move_to(point);
            }
        })
    };

    // ------ DRAG MOVE ------
    let onmousemove = {
        let dragging = dragging.clone();
        let move_to = move_to.clone();
        Callback::from(move |e: MouseEvent| {
            if *dragging {
                if let Some(point) = client_point(&e) {
                    move_to(point);
                }
            }
        })
    };

    let ontouchmove = Callback::from(move |e: TouchEvent| {
        e.prevent_default();
        if let Some(point) = client_point(&e) {
            move_to(point);
        }
    });

    let reset = {
        let split = split.clone();
        Callback::from(move |_| split.set(RevealSplit::default()))
    };

    let pair = &props.pair;
    let width = pair.intrinsic_width();
    let frame_style = if width > 0 {
        format!("position: relative; width: {}px; max-width: 100%; touch-action: none;", width)
    } else {
        "position: relative; width: 100%; touch-action: none;".to_string()
    };
    let percent = split.fraction() * 100.0;

    html! {
        <div class="compare-view" style="user-select:none;">
            <div class="compare-controls" style="margin-bottom:10px; display:flex; gap:8px; align-items:center;">
                <span>{ pair.base.display_label() }</span>
                <span>{"↔"}</span>
                <span>{ pair.revised.display_label() }</span>
                <span class="reveal-width">
                    { format!("{:.0}px of {}px", split.reveal_width_px(width), width) }
                </span>
                <button onclick={reset} title="Center the split (← → to nudge)">{"⟲ Center"}</button>
            </div>
            <div
                ref={frame_ref}
                class="compare-frame"
                style={frame_style}
                {onmousedown}
                {onmousemove}
                ontouchstart={ontouchmove.clone()}
                {ontouchmove}
            >
                <img
                    src={resource_url(&pair.base.image_url)}
                    draggable="false"
                    style="display:block; width: 100%;"
                />
                <img
                    src={resource_url(&pair.revised.image_url)}
                    draggable="false"
                    style={format!(
                        "position: absolute; top: 0; left: 0; width: 100%; clip-path: inset(0 {:.3}% 0 0);",
                        split.clip_inset_percent()
                    )}
                />
                <div
                    class="compare-handle"
                    style={format!(
                        "position: absolute; top: 0; bottom: 0; left: {:.3}%; width: 2px; margin-left: -1px; background: #111; cursor: ew-resize;",
                        percent
                    )}
                />
            </div>
        </div>
    }
}
