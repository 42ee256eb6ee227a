//! CLI domain: parse, route, output, and presentation only.
//! No pipeline logic; the route table dispatches to `StoryService` and friends.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_policy_json, format_policy_text, format_score_json, format_score_text,
    format_story_json, format_story_text,
};
pub use route::RunContext;
