//! `SPLINES` chunks.
//!
//! Spline data is parsed so a damaged chunk can be reported, then dropped.

use glam::Vec3;

use crate::cursor::Cursor;
use crate::diagnostic::{DiagnosticKind, Diagnostics};
use crate::error::DecodeResult;

/// Read the spline control points in scene space.
///
/// Returns `None`, after recording a diagnostic, when the declared vertex
/// count does not fit before `end`.
pub(crate) fn read_splines(
    cursor: &mut Cursor<'_>,
    end: usize,
    diagnostics: &mut Diagnostics,
) -> DecodeResult<Option<Vec<Vec3>>> {
    let offset = cursor.position();
    let spline_count = cursor.read_u32()?;
    let vertex_count = cursor.read_u32()?;

    let available = end.saturating_sub(cursor.position()).min(cursor.remaining());
    if vertex_count as usize > available / 12 {
        diagnostics.push(offset, DiagnosticKind::TruncatedSplines { vertex_count });
        return Ok(None);
    }

    let mut points = Vec::with_capacity(vertex_count as usize);
    for _ in 0..vertex_count {
        let [x, z, y] = cursor.read_f32_array::<3>()?;
        points.push(Vec3::new(-x, y, z));
    }
    tracing::debug!("Skipped {spline_count} splines with {vertex_count} control points");
    Ok(Some(points))
}
