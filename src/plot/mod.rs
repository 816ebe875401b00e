// Plotting collaborator: pending figures and how they reach disk
use crate::model::PlotError;
use std::fs;
use std::path::Path;

pub type FigureId = u32;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Encoding of a figure, as sniffed from its bytes or named by a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureFormat {
    Svg,
    Png,
}

impl FigureFormat {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PNG_MAGIC) {
            return Some(FigureFormat::Png);
        }
        let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
        let head = &bytes[start..];
        if head.starts_with(b"<svg") || head.starts_with(b"<?xml") {
            Some(FigureFormat::Svg)
        } else {
            None
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "svg" => Some(FigureFormat::Svg),
            "png" => Some(FigureFormat::Png),
            _ => None,
        }
    }
}

/// Capability to inspect, persist and release open figures.
pub trait PlotBackend {
    /// Identifiers of figures currently open; empty means nothing to save.
    fn open_figures(&self) -> Vec<FigureId>;
    /// Writes the current figure to `path`, in the format its extension names.
    fn save(&mut self, path: &Path) -> Result<(), PlotError>;
    /// Releases the current figure.
    fn close(&mut self);
}

struct Figure {
    id: FigureId,
    bytes: Vec<u8>,
}

/// In-memory registry of rendered figures. The most recently pushed figure
/// is the current one.
#[derive(Default)]
pub struct FigureStore {
    figures: Vec<Figure>,
    next_id: FigureId,
}

impl FigureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: Vec<u8>) -> FigureId {
        self.next_id += 1;
        self.figures.push(Figure { id: self.next_id, bytes });
        self.next_id
    }
}

impl PlotBackend for FigureStore {
    fn open_figures(&self) -> Vec<FigureId> {
        self.figures.iter().map(|f| f.id).collect()
    }

    fn save(&mut self, path: &Path) -> Result<(), PlotError> {
        let figure = self.figures.last().ok_or(PlotError::NoFigure)?;
        // Figures are stored already rendered; no conversion between formats.
        let stored = FigureFormat::sniff(&figure.bytes);
        let wanted = FigureFormat::from_path(path);
        if stored.is_none() || stored != wanted {
            return Err(PlotError::UnsupportedFormat {
                path: path.to_path_buf(),
                stored,
            });
        }
        fs::write(path, &figure.bytes)?;
        Ok(())
    }

    fn close(&mut self) {
        self.figures.pop();
    }
}
