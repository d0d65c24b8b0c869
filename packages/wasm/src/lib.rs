//! WebAssembly bindings for the Redline document engine.
//!
//! Exposes the pure tree transitions to the editing surface via
//! `wasm-bindgen`. Compile with `wasm-pack build` to produce an npm-ready
//! package that works in browsers, Node.js, and any other WASM host.
//!
//! Trees cross the boundary as JSON strings. Every tree argument is passed
//! through the sanitizer first, so the surface may hand over whatever its
//! editor produced.
//!
//! ## Tree API
//!
//! ```js
//! import init, { sanitize, delete_entity, project } from './redline_wasm.js';
//! await init();
//!
//! let tree = sanitize(editorJson);
//! tree = delete_entity(tree, 'e1');
//! console.log(project(tree));
//! ```
//!
//! ## Echo suppression: [`EchoGuard`]
//!
//! ```js
//! const guard = new EchoGuard();
//! guard.arm();                 // before pushing a server tree into the editor
//! editor.setContent(tree);
//! // in the editor's change handler:
//! if (guard.onSurfaceChange()) relayToServer(editor.getJSON());
//! ```

use redline::{Document, TextPosition};
use serde_json::Value;
use wasm_bindgen::prelude::*;

/// One-time initialisation called at the start of every exported function.
///
/// Installs the `console_error_panic_hook` when the feature is enabled so
/// that Rust panics are forwarded to the browser console as readable errors
/// rather than appearing as generic "unreachable" WASM traps.
fn setup() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

// ── Repair and projection ─────────────────────────────────────────────────────

/// Repair a tree and return its canonical JSON.
///
/// Never throws: input that is not JSON, or not a tree, yields the default
/// empty document.
#[wasm_bindgen]
pub fn sanitize(json: &str) -> String {
    setup();
    to_json(&parse_doc(json))
}

/// The plain text a tree stands for. Deleted entities are left out.
#[wasm_bindgen]
pub fn project(json: &str) -> String {
    setup();
    redline::project(&parse_doc(json))
}

/// Build a tree from plain text.
#[wasm_bindgen]
pub fn lift(text: &str) -> String {
    setup();
    to_json(&redline::lift(text))
}

/// Make every annotated node's literal text agree with its annotation.
#[wasm_bindgen]
pub fn reconcile(json: &str) -> String {
    setup();
    to_json(&redline::reconcile(&parse_doc(json)))
}

/// `regular`, `technical` or `heading_only`.
#[wasm_bindgen]
pub fn classify(text: &str, title: &str) -> String {
    setup();
    redline::classify(text, title).to_string()
}

/// Human-readable rendering with entity markers, for debugging panels.
#[wasm_bindgen]
pub fn render(json: &str) -> String {
    setup();
    redline::render::render_document(&parse_doc(json))
}

// ── Entity and candidate transitions ──────────────────────────────────────────
//
// Each returns the new tree as JSON and throws a string when the entity or
// candidate is not in the tree.

#[wasm_bindgen]
pub fn delete_entity(json: &str, entity_id: &str) -> Result<String, JsValue> {
    setup();
    let doc = redline::delete_entity(&parse_doc(json), entity_id).map_err(js_err)?;
    Ok(to_json(&doc))
}

#[wasm_bindgen]
pub fn restore_entity(json: &str, entity_id: &str) -> Result<String, JsValue> {
    setup();
    let doc = redline::restore_entity(&parse_doc(json), entity_id).map_err(js_err)?;
    Ok(to_json(&doc))
}

/// Replace the entity's text with one of its offered alternatives.
#[wasm_bindgen]
pub fn replace_entity(json: &str, entity_id: &str, new_text: &str) -> Result<String, JsValue> {
    setup();
    let doc = redline::replace_entity(&parse_doc(json), entity_id, new_text).map_err(js_err)?;
    Ok(to_json(&doc))
}

/// Replace the entity's text with a value the user typed. `prior_text` is
/// kept among the replacements so the user can go back to it.
#[wasm_bindgen(js_name = replaceEntityWithCustom)]
pub fn replace_entity_with_custom(
    json: &str,
    entity_id: &str,
    custom_text: &str,
    prior_text: &str,
) -> Result<String, JsValue> {
    setup();
    let doc =
        redline::replace_entity_with_custom(&parse_doc(json), entity_id, custom_text, prior_text)
            .map_err(js_err)?;
    Ok(to_json(&doc))
}

/// Set a selection-list candidate's decision flags.
#[wasm_bindgen]
pub fn update_candidate(
    json: &str,
    entity_id: &str,
    deleted: bool,
    confirmed: bool,
) -> Result<String, JsValue> {
    setup();
    let doc = redline::update_candidate_in(&parse_doc(json), entity_id, deleted, confirmed)
        .map_err(js_err)?;
    Ok(to_json(&doc))
}

/// Replace `length` characters at `offset` of paragraph `block` with `text`.
///
/// Throws when the position is not inside a paragraph.
#[wasm_bindgen]
pub fn replace_text(
    json: &str,
    block: usize,
    offset: usize,
    length: usize,
    text: &str,
) -> Result<String, JsValue> {
    setup();
    let doc = redline::replace_text(
        &parse_doc(json),
        TextPosition::new(block, offset),
        length,
        redline::Inline::text(text),
    )
    .map_err(js_err)?;
    Ok(to_json(&redline::sanitize::normalize(doc)))
}

// ── Correction mode ───────────────────────────────────────────────────────────

#[wasm_bindgen]
pub fn correction_mode(json: &str) -> bool {
    setup();
    redline::correction_mode(&parse_doc(json))
}

/// Which chapter actions are enabled, as a JSON object:
///
/// ```json
/// { "start_auto_creation": false, "confirm_changes": true, "discard_changes": true }
/// ```
#[wasm_bindgen]
pub fn affordances(json: &str) -> String {
    setup();
    let a = redline::Affordances::for_document(&parse_doc(json));
    serde_json::to_string(&a).unwrap_or_else(|_| "{}".to_string())
}

#[wasm_bindgen]
pub fn confirm_changes(json: &str) -> String {
    setup();
    to_json(&redline::confirm_changes(&parse_doc(json)))
}

#[wasm_bindgen]
pub fn discard_changes(json: &str) -> String {
    setup();
    to_json(&redline::discard_changes(&parse_doc(json)))
}

// ── EchoGuard ─────────────────────────────────────────────────────────────────

/// Session-owned echo-suppression flag for the editing surface.
///
/// Arm it right before pushing a server tree into the editor. The editor's
/// next change notification is then recognised as the echo of that push
/// and not relayed.
#[wasm_bindgen]
pub struct EchoGuard {
    inner: redline::EchoGuard,
}

#[wasm_bindgen]
impl EchoGuard {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        setup();
        Self {
            inner: redline::EchoGuard::new(),
        }
    }

    /// Throws if already armed: coalesce nested pushes into one.
    pub fn arm(&mut self) -> Result<(), JsValue> {
        self.inner.arm().map_err(js_err)
    }

    pub fn disarm(&mut self) {
        self.inner.disarm();
    }

    #[wasm_bindgen(getter, js_name = isSuppressing)]
    pub fn is_suppressing(&self) -> bool {
        self.inner.is_suppressing()
    }

    /// Call from the editor's change handler. Returns `true` when the change
    /// is a user edit that must be relayed to the server.
    #[wasm_bindgen(js_name = onSurfaceChange)]
    pub fn on_surface_change(&mut self) -> bool {
        self.inner.on_surface_change() == redline::ChangeOrigin::User
    }
}

impl Default for EchoGuard {
    fn default() -> Self {
        Self::new()
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn parse_doc(json: &str) -> Document {
    let raw: Value = serde_json::from_str(json).unwrap_or(Value::Null);
    redline::sanitize(&raw)
}

fn to_json(doc: &Document) -> String {
    serde_json::to_string(doc).unwrap_or_else(|_| r#"{"type":"doc","content":[]}"#.to_string())
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}
