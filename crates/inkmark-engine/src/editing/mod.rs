/*!
 * # Editing Core Module
 *
 * Command-based editing over a single plain-text source of truth.
 *
 * ## Architecture
 *
 * ### 1. Single Source of Truth: xi-rope Buffer
 * - The whole document lives in one `xi_rope::Rope` buffer
 * - The styled visual tree is a disposable projection of it; flattening the
 *   tree always reproduces the buffer contents byte for byte
 * - Saving or reporting the document never regenerates Markdown from a model
 *
 * ### 2. Command-Based Editing
 * - Every structural interaction (Enter continuation, checkbox toggle,
 *   formatting accelerators, paste) is a [`Cmd`] compiled to a **Delta**
 * - Commands are applied atomically; the resulting caret position is computed
 *   analytically per command, never re-derived by searching the new text
 * - Each application returns a [`Patch`] with the changed ranges, the new
 *   selection, and the bumped document version
 *
 * ### 3. Degradation over Failure
 * - Out-of-range offsets are clamped, never rejected
 * - A toggle aimed at a todo occurrence that no longer exists compiles to an
 *   identity delta
 *
 * ## Module Structure
 *
 * - **`document`**: the [`Document`] type owning the rope buffer, selection
 *   and version counter
 * - **`commands`**: the [`Cmd`] enum, delta compilation, and the structural
 *   edit planning (list/todo continuation, toggle targeting)
 * - **`patch`**: edit result metadata
 */

pub mod commands;
pub mod document;
pub mod patch;

pub use commands::{Cmd, InlineMarker};
pub use document::Document;
pub use patch::Patch;
