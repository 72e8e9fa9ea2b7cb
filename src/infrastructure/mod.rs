// Infrastructure layer: process-wide engine

pub mod engine;

pub use engine::Engine;
