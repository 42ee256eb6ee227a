//! CLI presentation: text and json formatters per command.

mod policy;
mod score;
mod story;

pub use policy::{format_policy_json, format_policy_text};
pub use score::{format_score_json, format_score_text};
pub use story::{format_story_json, format_story_text};
