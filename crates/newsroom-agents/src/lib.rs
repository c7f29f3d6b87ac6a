#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Research and writer agents plus the pipeline that sequences them.

mod openai;
pub mod pipeline;
mod research;
mod writer;

pub use openai::OpenAiChat;
pub use pipeline::{Mode, Pipeline, PipelineError, PipelineRun, PipelineState, RunRequest, Stage};
pub use research::ResearchAgent;
pub use writer::WriterAgent;
