//! Resume ATS analysis: upload extraction plus a pluggable scorer.

pub mod extract;
pub mod handlers;
pub mod quantification;
pub mod scoring;
