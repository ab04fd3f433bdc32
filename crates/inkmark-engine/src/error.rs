use thiserror::Error;

/// Host-visible misuse of the editing surface.
///
/// The engine degrades rather than throws for anything that can happen during
/// normal typing; these variants only cover calls the host could not have
/// meant (e.g. clicking a checkbox that no longer exists).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("no todo marker at occurrence {occurrence} (document has {count})")]
    TodoOutOfRange { occurrence: usize, count: usize },
    #[error("path does not name a checkbox leaf")]
    NotACheckbox,
}
