use std::io::Write;

use serde::Serialize;

use crate::error::{LayoutError, Result};
use crate::layout::{ResolvedGeometry, ResolvedLayout};

/// Receives every published layout. Implementations apply positions and
/// visibility however the host paints.
pub trait LayoutRenderer {
    fn on_layout(&mut self, layout: &ResolvedLayout) -> Result<()>;
}

impl<F> LayoutRenderer for F
where
    F: FnMut(&ResolvedLayout) -> Result<()>,
{
    fn on_layout(&mut self, layout: &ResolvedLayout) -> Result<()> {
        self(layout)
    }
}

#[derive(Debug, Clone)]
pub struct RendererSettings {
    /// Skip frames whose fingerprint matches the last written frame.
    pub skip_unchanged: bool,
    /// Omit hidden regions from the written frame.
    pub visible_only: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            skip_unchanged: true,
            visible_only: false,
        }
    }
}

#[derive(Serialize)]
struct Frame<'a> {
    tier: &'a str,
    width: u32,
    height: u32,
    reserved_top: u32,
    reserved_bottom: u32,
    regions: Vec<&'a ResolvedGeometry>,
}

/// Writes each layout as one JSON object per line.
pub struct JsonLinesRenderer<W: Write> {
    writer: W,
    settings: RendererSettings,
    last_fingerprint: Option<blake3::Hash>,
    frames_written: u64,
}

impl<W: Write> JsonLinesRenderer<W> {
    pub fn new(writer: W, settings: RendererSettings) -> Self {
        Self {
            writer,
            settings,
            last_fingerprint: None,
            frames_written: 0,
        }
    }

    pub fn with_default(writer: W) -> Self {
        Self::new(writer, RendererSettings::default())
    }

    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> LayoutRenderer for JsonLinesRenderer<W> {
    fn on_layout(&mut self, layout: &ResolvedLayout) -> Result<()> {
        let fingerprint = layout.fingerprint();
        if self.settings.skip_unchanged && self.last_fingerprint == Some(fingerprint) {
            return Ok(());
        }

        let frame = Frame {
            tier: layout.tier.as_str(),
            width: layout.metrics.width,
            height: layout.metrics.height,
            reserved_top: layout.reserved_top(),
            reserved_bottom: layout.reserved_bottom(),
            regions: layout
                .geometries
                .iter()
                .filter(|g| g.visible || !self.settings.visible_only)
                .collect(),
        };

        serde_json::to_writer(&mut self.writer, &frame)
            .map_err(|err| LayoutError::Render(err.to_string()))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        self.last_fingerprint = Some(fingerprint);
        self.frames_written += 1;
        Ok(())
    }
}
