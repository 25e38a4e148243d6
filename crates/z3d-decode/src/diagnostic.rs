//! Recoverable decode anomalies.

use std::fmt;

use crate::chunk::tag;

/// Why a face record did not produce a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceRejection {
    /// Two or more corners share a vertex.
    Degenerate,
    /// A corner refers past the end of the vertex table.
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// A non-fatal problem found while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A chunk type that is not part of the format was skipped.
    UnknownChunk { tag: u32, size: u32 },
    /// An object sub-chunk that ends the object early.
    UnknownObjectChunk { tag: u32 },
    /// A data table arrived before the descriptor it depends on.
    MissingDescriptor { data_tag: u32 },
    /// A face record was decoded but could not be built.
    RejectedFace {
        object: String,
        record: usize,
        reason: FaceRejection,
    },
    /// A `NAME` sub-chunk was expected; the enclosing chunk was dropped.
    MalformedChunk { expected: u32, found: u32 },
    /// A handler read past its chunk's declared end.
    ChunkOverrun { tag: u32, end: usize, position: usize },
    /// A hierarchy edge would make an object its own ancestor.
    HierarchyCycle { parent: String, child: String },
    /// A spline chunk declares more vertices than it holds.
    TruncatedSplines { vertex_count: u32 },
}

impl fmt::Display for FaceRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degenerate => write!(f, "degenerate triangle"),
            Self::IndexOutOfRange {
                index,
                vertex_count,
            } => write!(f, "vertex index {index} out of range ({vertex_count} vertices)"),
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownChunk { tag, size } => {
                write!(f, "skipped unknown chunk {tag:#x} ({size} bytes)")
            }
            Self::UnknownObjectChunk { tag } => {
                write!(f, "object ended at unexpected sub-chunk {tag:#x}")
            }
            Self::MissingDescriptor { data_tag } => {
                let table = if *data_tag == tag::FACETABLE_DATA {
                    "face"
                } else {
                    "vertex"
                };
                write!(f, "{table} table data without a descriptor, skipped")
            }
            Self::RejectedFace {
                object,
                record,
                reason,
            } => write!(f, "object {object:?}: face {record} skipped: {reason}"),
            Self::MalformedChunk { expected, found } => {
                write!(f, "expected sub-chunk {expected:#x}, found {found:#x}; chunk dropped")
            }
            Self::ChunkOverrun {
                tag,
                end,
                position,
            } => write!(
                f,
                "chunk {tag:#x} read to offset {position}, past its end at {end}"
            ),
            Self::HierarchyCycle { parent, child } => {
                write!(f, "ignored hierarchy edge {parent:?} -> {child:?}: cycle")
            }
            Self::TruncatedSplines { vertex_count } => {
                write!(f, "spline chunk too short for {vertex_count} vertices")
            }
        }
    }
}

/// A diagnostic and the stream offset it was found at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub offset: usize,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at offset {}: {}", self.offset, self.kind)
    }
}

/// Collects diagnostics for one decode pass, logging each as it arrives.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn push(&mut self, offset: usize, kind: DiagnosticKind) {
        let diagnostic = Diagnostic { offset, kind };
        tracing::warn!("{diagnostic}");
        self.0.push(diagnostic);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}
