pub mod render;
pub mod wikipedia;

pub use wikipedia::WikipediaSource;
