//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::StoryError;

/// Map command errors to a string for CLI output. Pipeline errors carry the
/// HTTP status a hosting endpoint would return for them.
pub fn map_error(e: &anyhow::Error) -> String {
    match e.downcast_ref::<StoryError>() {
        Some(story_error) => format!("error[{}]: {:#}", story_error.http_status(), e),
        None => format!("error: {:#}", e),
    }
}
