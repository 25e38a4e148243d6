//! `HIERARCHY` chunks: parent/child links by object name.

use std::collections::HashMap;

use crate::cursor::{Cursor, StringLength};
use crate::diagnostic::{DiagnosticKind, Diagnostics};
use crate::error::DecodeResult;
use crate::scene::SceneObject;

/// Read name pairs up to `end` and set parent links on `objects`.
///
/// The list ends at a pair of empty names. Pairs naming an unknown object
/// are ignored, and so are pairs that would create a cycle. A later pair
/// for the same child replaces its earlier parent.
pub(crate) fn link_hierarchy(
    cursor: &mut Cursor<'_>,
    end: usize,
    objects: &mut [SceneObject],
    names: &HashMap<String, usize>,
    diagnostics: &mut Diagnostics,
) -> DecodeResult<usize> {
    let mut linked = 0;
    while cursor.position() < end {
        let offset = cursor.position();
        let parent = cursor.read_string(StringLength::Prefixed)?;
        let child = cursor.read_string(StringLength::Prefixed)?;
        if parent.is_empty() && child.is_empty() {
            break;
        }
        if parent.is_empty() || child.is_empty() {
            continue;
        }

        let (Some(&parent_index), Some(&child_index)) = (names.get(&parent), names.get(&child))
        else {
            tracing::debug!("Ignoring hierarchy edge {parent:?} -> {child:?}: unknown object");
            continue;
        };

        if is_ancestor_or_self(objects, child_index, parent_index) {
            diagnostics.push(offset, DiagnosticKind::HierarchyCycle { parent, child });
            continue;
        }
        objects[child_index].parent = Some(parent_index);
        linked += 1;
    }
    Ok(linked)
}

/// Whether `candidate` is `object` or one of its ancestors.
fn is_ancestor_or_self(objects: &[SceneObject], candidate: usize, object: usize) -> bool {
    let mut current = Some(object);
    // Links are kept acyclic, so the walk is bounded by the object count.
    for _ in 0..=objects.len() {
        match current {
            Some(index) if index == candidate => return true,
            Some(index) => current = objects.get(index).and_then(|o| o.parent),
            None => return false,
        }
    }
    false
}
