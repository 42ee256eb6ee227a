//! Storyloom: Personalized Children's Story Generation
//!
//! Turns a validated story request into a finished story by composing a
//! policy-driven prompt, calling a text model, scoring the draft and retrying
//! with escalated length instructions until the draft is good enough.

pub mod cli;
pub mod config;
pub mod error;
pub mod illustration;
pub mod invoker;
pub mod logging;
pub mod pipeline;
pub mod policy;
pub mod prompt;
pub mod provider;
pub mod request;
pub mod retry;
pub mod scoring;
pub mod shaping;
