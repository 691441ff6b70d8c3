//! Immutable project document: workflow stage, pattern charts, assembly.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Dimensions of the zero-filled assembly created when none is given.
pub const DEFAULT_ASSEMBLY_WIDTH: usize = 100;
pub const DEFAULT_ASSEMBLY_HEIGHT: usize = 100;

/// Errors raised by structural deserialization and pattern construction.
///
/// No partial document is ever produced: any malformed field aborts the
/// whole load.
#[derive(Debug, Error)]
pub enum InvalidDocument {
    #[error("invalid project document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid base64 pixel data: {0}")]
    PixelData(#[from] base64::DecodeError),
    #[error("pattern width must be positive")]
    ZeroWidth,
    #[error("pattern buffer length {len} is not a multiple of width {width}")]
    RaggedBuffer { len: usize, width: usize },
    #[error("unknown project stage {0}")]
    UnknownStage(u8),
}

/// A width-tagged raw pixel buffer: one knitting chart, or the assembled
/// garment layout.
///
/// The buffer is shared, so clones are cheap and replacing a pattern is
/// always a whole-object swap. Holders can diff by buffer identity via
/// [`Knitpaint::same_buffer`] instead of comparing pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "KnitpaintRecord", try_from = "KnitpaintRecord")]
pub struct Knitpaint {
    data: Arc<[u8]>,
    width: usize,
}

impl Knitpaint {
    /// Create a pattern from raw pixel bytes.
    pub fn new(data: impl Into<Arc<[u8]>>, width: usize) -> Result<Self, InvalidDocument> {
        let data = data.into();
        if width == 0 {
            return Err(InvalidDocument::ZeroWidth);
        }
        if data.len() % width != 0 {
            return Err(InvalidDocument::RaggedBuffer {
                len: data.len(),
                width,
            });
        }
        Ok(Self { data, width })
    }

    /// Create a zero-filled pattern of the given dimensions.
    pub fn zeroed(width: usize, height: usize) -> Self {
        Self {
            data: vec![0u8; width * height].into(),
            width: width.max(1),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Height is derived from the buffer length.
    pub fn height(&self) -> usize {
        self.data.len() / self.width
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether two patterns share the same underlying buffer.
    pub fn same_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

/// Wire form of a pattern: `{ "width": n, "data": "<base64>" }`.
#[derive(Serialize, Deserialize)]
struct KnitpaintRecord {
    width: usize,
    data: String,
}

impl From<Knitpaint> for KnitpaintRecord {
    fn from(k: Knitpaint) -> Self {
        Self {
            width: k.width,
            data: STANDARD.encode(&k.data),
        }
    }
}

impl TryFrom<KnitpaintRecord> for Knitpaint {
    type Error = InvalidDocument;

    fn try_from(record: KnitpaintRecord) -> Result<Self, Self::Error> {
        let bytes = STANDARD.decode(&record.data)?;
        Knitpaint::new(bytes, record.width)
    }
}

/// Editor workflow stage. Ordered; the normal workflow only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ProjectStage {
    #[default]
    Setup = 0,
    Patterns = 1,
    Assembly = 2,
}

impl From<ProjectStage> for u8 {
    fn from(stage: ProjectStage) -> Self {
        stage as u8
    }
}

impl TryFrom<u8> for ProjectStage {
    type Error = InvalidDocument;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Setup),
            1 => Ok(Self::Patterns),
            2 => Ok(Self::Assembly),
            other => Err(InvalidDocument::UnknownStage(other)),
        }
    }
}

/// The full editable document.
///
/// Immutable: every mutator returns a new `Project` that shares the
/// untouched fields with the old one. Patterns may therefore be shared
/// across many project versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ProjectRecord", try_from = "ProjectRecord")]
pub struct Project {
    stage: ProjectStage,
    patterns: Arc<[Knitpaint]>,
    assembly: Knitpaint,
}

impl Default for Project {
    fn default() -> Self {
        Self::new(ProjectStage::default(), Vec::new(), None)
    }
}

impl Project {
    /// Create a project. A missing assembly defaults to a zero-filled
    /// 100×100 layout.
    pub fn new(
        stage: ProjectStage,
        patterns: impl Into<Arc<[Knitpaint]>>,
        assembly: Option<Knitpaint>,
    ) -> Self {
        Self {
            stage,
            patterns: patterns.into(),
            assembly: assembly
                .unwrap_or_else(|| Knitpaint::zeroed(DEFAULT_ASSEMBLY_WIDTH, DEFAULT_ASSEMBLY_HEIGHT)),
        }
    }

    pub fn stage(&self) -> ProjectStage {
        self.stage
    }

    pub fn patterns(&self) -> &[Knitpaint] {
        &self.patterns
    }

    pub fn assembly(&self) -> &Knitpaint {
        &self.assembly
    }

    /// Return a new project with the given stage.
    pub fn set_stage(&self, stage: ProjectStage) -> Self {
        Self {
            stage,
            patterns: Arc::clone(&self.patterns),
            assembly: self.assembly.clone(),
        }
    }

    /// Return a new project with the given pattern list.
    pub fn set_patterns(&self, patterns: impl Into<Arc<[Knitpaint]>>) -> Self {
        Self {
            stage: self.stage,
            patterns: patterns.into(),
            assembly: self.assembly.clone(),
        }
    }

    /// Return a new project with the given assembly layout.
    pub fn set_assembly(&self, assembly: Knitpaint) -> Self {
        Self {
            stage: self.stage,
            patterns: Arc::clone(&self.patterns),
            assembly,
        }
    }

    /// Whether two projects share the same pattern list allocation.
    pub fn same_patterns(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.patterns, &other.patterns)
    }

    /// Serialize to the structural interchange form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from the structural interchange form.
    ///
    /// All nested patterns are reconstructed before the project itself;
    /// unlike direct construction there is no assembly default here, a
    /// missing field is an error.
    pub fn from_json(json: &str) -> Result<Self, InvalidDocument> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Wire form of a project:
/// `{ "stage": n, "patterns": [...], "assembly": {...} }`.
#[derive(Serialize, Deserialize)]
struct ProjectRecord {
    stage: ProjectStage,
    patterns: Vec<Knitpaint>,
    assembly: Knitpaint,
}

impl From<Project> for ProjectRecord {
    fn from(p: Project) -> Self {
        Self {
            stage: p.stage,
            patterns: p.patterns.to_vec(),
            assembly: p.assembly,
        }
    }
}

impl TryFrom<ProjectRecord> for Project {
    type Error = InvalidDocument;

    fn try_from(record: ProjectRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            stage: record.stage,
            patterns: record.patterns.into(),
            assembly: record.assembly,
        })
    }
}
