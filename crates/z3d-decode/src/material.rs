//! `MATERIAL` chunks.

use std::collections::HashMap;

use crate::chunk::{MaterialFlags, read_name_chunk};
use crate::cursor::Cursor;
use crate::descriptor::{MaterialParams, MaterialRecord, MaterialsDescriptor};
use crate::error::DecodeResult;
use crate::scene::{AlphaMode, Material, TextureBinding, TextureSlot};

/// Decode one material.
///
/// The record and params are read from the stream only when the current
/// materials descriptor says so; otherwise the descriptor's copies are
/// used. Each texture slot in use is followed by a `NAME` chunk, bound to
/// whatever handle `resolved` holds for that name.
pub(crate) fn decode_material<T: Clone>(
    cursor: &mut Cursor<'_>,
    desc: &MaterialsDescriptor,
    resolved: &HashMap<String, T>,
) -> DecodeResult<Material<T>> {
    let name = read_name_chunk(cursor)?;
    let record = cursor.read_if(
        desc.flags.contains(MaterialFlags::HAS_MATERIAL_RECORD),
        desc.material,
        MaterialRecord::read,
    )?;
    let params = cursor.read_if(
        desc.flags.contains(MaterialFlags::HAS_PARAMS),
        desc.params,
        MaterialParams::read,
    )?;

    let mut textures = Vec::new();
    for slot in TextureSlot::STREAM_ORDER {
        if slot.index_in(&params) == -1 {
            continue;
        }
        let texture_name = read_name_chunk(cursor)?;
        let texture = resolved.get(&texture_name).cloned();
        if texture.is_none() {
            tracing::debug!("Material {name:?}: {slot:?} texture {texture_name:?} is unresolved");
        }
        textures.push(TextureBinding {
            slot,
            name: texture_name,
            texture,
        });
    }

    Ok(Material {
        name,
        record,
        alpha_mode: AlphaMode::from_params(&params),
        params,
        textures,
    })
}
