/*!
 * # Reconciliation Controller
 *
 * [`Surface`] owns the single source of truth (the plain-text document),
 * decides when to re-render the visual tree, and restores the caret and
 * scroll position across re-renders.
 *
 * The host reports raw text changes on every keystroke; the external change
 * callback fires immediately for each one, but the visual re-render is
 * coalesced behind a restartable debounce so typing never disturbs the caret
 * mid-word. Structural interactions (Enter, checkbox clicks, formatting
 * accelerators, paste) bypass the debounce and reconcile synchronously.
 *
 * The surface owns no timers. Deadlines are plain `Instant`s and the host
 * drives them by calling [`Surface::poll`] with the current time, which keeps
 * every timing path deterministic under test.
 *
 * Re-entrancy is gated by a three-state machine (`Idle`, `Reconciling`,
 * `Composing`): at most one reconcile pass is ever in flight, raw input
 * arriving mid-pass or mid-IME is ignored and naturally retried (the next raw
 * input event carries the full live text, so nothing is lost), and the state
 * only returns to `Idle` after caret and scroll restoration completed.
 */

use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::editing::commands::{Cmd, InlineMarker, todo_count};
use crate::editing::document::Document;
use crate::error::EngineError;
use crate::position::{checkbox_index_at, offset_of, point_at};
use crate::render::{render, to_markup, VisualTree};

/// Default pause before a visual re-render, in milliseconds.
pub const DEFAULT_RENDER_DEBOUNCE_MS: u64 = 300;

/// Default delay after an IME composition ends before reconciling.
pub const DEFAULT_COMPOSITION_DELAY_MS: u64 = 50;

/// Construction-time configuration for a [`Surface`].
#[derive(Debug, Clone)]
pub struct SurfaceOptions {
    /// Shown (in the markup) while the document is empty.
    pub placeholder: String,
    /// Pause after the last raw input before the visual tree is regenerated.
    pub render_debounce: Duration,
    /// Delay between composition end and the follow-up reconcile.
    pub composition_delay: Duration,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            placeholder: String::new(),
            render_debounce: Duration::from_millis(DEFAULT_RENDER_DEBOUNCE_MS),
            composition_delay: Duration::from_millis(DEFAULT_COMPOSITION_DELAY_MS),
        }
    }
}

/// Cooperative lock states for the single-threaded edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    Idle,
    /// A reconcile pass is regenerating the tree and restoring the caret.
    Reconciling,
    /// An IME composition is in progress; intermediate states must not be
    /// reconciled or reported.
    Composing,
}

type ChangeCallback = Box<dyn FnMut(&str)>;
type LifecycleCallback = Box<dyn FnMut()>;

/// The editing surface: authoritative text plus its disposable projection.
pub struct Surface {
    doc: Document,
    tree: VisualTree,
    markup: String,
    state: SurfaceState,
    render_deadline: Option<Instant>,
    composition_deadline: Option<Instant>,
    options: SurfaceOptions,
    on_change: Option<ChangeCallback>,
    on_focus: Option<LifecycleCallback>,
    on_blur: Option<LifecycleCallback>,
    scroll: f64,
    wants_end_scroll: bool,
    torn_down: bool,
    renders: u64,
}

impl Surface {
    pub fn new(initial_text: &str, options: SurfaceOptions) -> Self {
        let doc = Document::new(initial_text);
        let tree = render(initial_text);
        let markup = compose_markup(initial_text.is_empty(), &tree, &options.placeholder);
        Self {
            doc,
            tree,
            markup,
            state: SurfaceState::Idle,
            render_deadline: None,
            composition_deadline: None,
            options,
            on_change: None,
            on_focus: None,
            on_blur: None,
            scroll: 0.0,
            wants_end_scroll: false,
            torn_down: false,
            renders: 0,
        }
    }

    /// Invoked with the new plain text exactly once per user-visible mutation,
    /// regardless of render debouncing.
    pub fn on_change(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    pub fn on_focus(&mut self, callback: impl FnMut() + 'static) {
        self.on_focus = Some(Box::new(callback));
    }

    pub fn on_blur(&mut self, callback: impl FnMut() + 'static) {
        self.on_blur = Some(Box::new(callback));
    }

    // --- read API ---

    pub fn text(&self) -> String {
        self.doc.text()
    }

    /// Markup of the current visual tree (placeholder markup when empty).
    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn tree(&self) -> &VisualTree {
        &self.tree
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn selection(&self) -> std::ops::Range<usize> {
        self.doc.selection()
    }

    /// Host-reported caret/selection move (clamped to the document).
    pub fn set_selection(&mut self, selection: std::ops::Range<usize>) {
        self.doc.set_selection(selection);
    }

    pub fn cursor_at_end(&self) -> bool {
        self.doc.selection().start >= self.doc.len()
    }

    pub fn scroll(&self) -> f64 {
        self.scroll
    }

    pub fn set_scroll(&mut self, scroll: f64) {
        self.scroll = scroll;
    }

    /// True when the last reconcile found the caret at the very end, so the
    /// host should keep the view pinned to the bottom.
    pub fn wants_end_scroll(&self) -> bool {
        self.wants_end_scroll
    }

    /// Number of reconcile passes that have run. Ten keystrokes inside the
    /// debounce window contribute one.
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    // --- input events ---

    /// Raw text-change notification from the editable region.
    ///
    /// Ignored while reconciling or composing (the next raw event re-reads
    /// the live text, so nothing is lost). Otherwise the change callback
    /// fires immediately and the visual re-render debounce restarts.
    pub fn handle_raw_input(&mut self, live_text: &str, caret: usize, now: Instant) {
        if self.torn_down || self.state != SurfaceState::Idle {
            return;
        }
        if live_text == self.doc.text() {
            return;
        }
        self.doc.apply(Cmd::ReplaceAll {
            text: live_text.to_string(),
        });
        self.doc.set_selection(caret..caret);
        self.emit_change();
        self.render_deadline = Some(now + self.options.render_debounce);
        trace!("raw input accepted, render debounce restarted");
    }

    /// Fire any due deadline. Returns whether a reconcile pass ran.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.torn_down {
            return false;
        }
        if let Some(deadline) = self.composition_deadline {
            if now >= deadline {
                self.composition_deadline = None;
                return self.reconcile(false);
            }
        }
        if let Some(deadline) = self.render_deadline {
            if now >= deadline {
                self.render_deadline = None;
                return self.reconcile(false);
            }
        }
        false
    }

    /// Enter key, intercepted: list/todo continuation as a text mutation,
    /// followed by a synchronous reconcile.
    pub fn handle_enter(&mut self) {
        let at = self.doc.selection().start;
        self.apply_structural(Cmd::SplitLine { at });
    }

    /// Toggle the n-th todo checkbox (0-indexed, document order).
    pub fn toggle_todo(&mut self, occurrence: usize) -> Result<(), EngineError> {
        let count = todo_count(&self.doc.text());
        if occurrence >= count {
            return Err(EngineError::TodoOutOfRange { occurrence, count });
        }
        self.apply_structural(Cmd::ToggleTodo { occurrence });
        Ok(())
    }

    /// Checkbox click, identified by the clicked leaf's tree path.
    pub fn handle_checkbox_click(&mut self, path: &[usize]) -> Result<(), EngineError> {
        let occurrence = checkbox_index_at(&self.tree, path).ok_or(EngineError::NotACheckbox)?;
        self.toggle_todo(occurrence)
    }

    /// Formatting accelerator: wrap the current selection in a marker pair.
    pub fn wrap_selection(&mut self, marker: InlineMarker) {
        let range = self.doc.selection();
        self.apply_structural(Cmd::WrapSelection { range, marker });
    }

    /// Clipboard paste. The host hands over plain text only; whatever rich
    /// formatting the clipboard carried is already gone.
    pub fn paste(&mut self, text: &str) {
        let range = self.doc.selection();
        self.apply_structural(Cmd::Paste {
            range,
            text: text.to_string(),
        });
    }

    /// IME composition started; intermediate states are neither reconciled
    /// nor reported until it ends.
    pub fn composition_start(&mut self) {
        if self.torn_down {
            return;
        }
        if self.state == SurfaceState::Idle {
            self.state = SurfaceState::Composing;
        }
    }

    /// IME composition finished. The final composed text is only known now,
    /// so report it and schedule a short-delay reconcile.
    pub fn composition_end(&mut self, live_text: &str, caret: usize, now: Instant) {
        if self.torn_down {
            return;
        }
        if self.state == SurfaceState::Composing {
            self.state = SurfaceState::Idle;
        }
        if live_text != self.doc.text() {
            self.doc.apply(Cmd::ReplaceAll {
                text: live_text.to_string(),
            });
            self.doc.set_selection(caret..caret);
            self.emit_change();
        }
        self.composition_deadline = Some(now + self.options.composition_delay);
    }

    pub fn focus(&mut self) {
        if self.torn_down {
            return;
        }
        if let Some(callback) = self.on_focus.as_mut() {
            callback();
        }
    }

    /// Blur reconciles immediately; a pending debounce would be pointless
    /// once the surface loses focus.
    pub fn blur(&mut self) {
        if self.torn_down {
            return;
        }
        self.render_deadline = None;
        self.reconcile(true);
        if let Some(callback) = self.on_blur.as_mut() {
            callback();
        }
    }

    /// External overwrite (e.g. the host switched documents).
    ///
    /// Always forces a full re-render, even when the new text is
    /// byte-identical to the current one, and cancels any pending deadline so
    /// a stale re-render can never clobber the new content.
    pub fn set_text(&mut self, text: &str, _now: Instant) {
        if self.torn_down {
            return;
        }
        self.render_deadline = None;
        self.composition_deadline = None;
        // A composition cannot survive a document swap.
        self.state = SurfaceState::Idle;
        self.doc.apply(Cmd::ReplaceAll {
            text: text.to_string(),
        });
        self.reconcile(true);
    }

    /// Teardown: after this the surface is inert. No deadline fires, no
    /// render runs, no callback is invoked.
    pub fn shutdown(&mut self) {
        self.torn_down = true;
        self.render_deadline = None;
        self.composition_deadline = None;
    }

    // --- internals ---

    fn apply_structural(&mut self, cmd: Cmd) {
        if self.torn_down || self.state != SurfaceState::Idle {
            return;
        }
        self.doc.apply(cmd);
        self.emit_change();
        // Structural edits reconcile now; drop any pending debounce.
        self.render_deadline = None;
        self.reconcile(true);
    }

    fn emit_change(&mut self) {
        let text = self.doc.text();
        if let Some(callback) = self.on_change.as_mut() {
            callback(&text);
        }
    }

    /// One reconcile pass: regenerate the tree, swap the markup when it
    /// differs (always when `forced`), then restore caret and scroll.
    fn reconcile(&mut self, forced: bool) -> bool {
        if self.torn_down || self.state != SurfaceState::Idle {
            return false;
        }
        self.state = SurfaceState::Reconciling;

        let caret = self.doc.selection().start;
        let at_end = caret >= self.doc.len();
        let scroll = self.scroll;

        let text = self.doc.text();
        // The tree always tracks the text: markup is not injective (a checkbox
        // leaf's raw prefix does not appear in it), so markup equality must
        // never keep an older tree alive.
        self.tree = render(&text);
        let markup = compose_markup(text.is_empty(), &self.tree, &self.options.placeholder);
        if forced || markup != self.markup {
            trace!("installing new markup ({} bytes)", markup.len());
            self.markup = markup;
        }

        // Restore the caret through the mapper; any failure inside it
        // degrades to end-of-tree rather than propagating.
        let point = point_at(&self.tree, caret);
        let restored = offset_of(&self.tree, &point);
        self.doc.set_selection(restored..restored);
        self.scroll = scroll;
        self.wants_end_scroll = at_end;

        self.renders += 1;
        debug!(
            "reconciled v{} (forced: {forced}, caret {caret} -> {restored})",
            self.doc.version()
        );

        // Only cleared once caret and scroll restoration completed.
        self.state = SurfaceState::Idle;
        true
    }
}

fn compose_markup(text_is_empty: bool, tree: &VisualTree, placeholder: &str) -> String {
    if text_is_empty && !placeholder.is_empty() {
        format!(
            "<span class=\"md-placeholder\">{}</span>",
            html_escape::encode_text(placeholder)
        )
    } else {
        to_markup(tree)
    }
}
