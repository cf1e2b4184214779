// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pipeline orchestrator: sequences the generation stages, persists
//! artifacts at each boundary, emits progress events, and threads
//! cancellation through the whole call graph (C6, §4.6, §5).

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cancel;
mod collaborators;
mod events;
mod pipeline;

pub use cancel::CancellationToken;
pub use collaborators::{
    ArchiveAssembler, ArchiveHandle, MockArchiveAssembler, MockProjectStorage, MockTemplating,
    ProjectStorage, Templating,
};
pub use events::{EventBus, PipelineEvent, Stage};
pub use pipeline::{run_generation, Collaborators, GenerationContext};
