//! Host drivers that pump real environment events into a `LayoutRuntime`.

pub mod cli;
