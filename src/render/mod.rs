//! Renderer seam. Painting is left to the host; this module defines the
//! callback contract and a JSON-lines implementation.

mod core;

pub use core::{JsonLinesRenderer, LayoutRenderer, RendererSettings};
