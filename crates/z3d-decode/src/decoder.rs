//! The top-level chunk loop and the per-pass decode state.

use std::collections::HashMap;

use crate::chunk::{ChunkHeader, TopLevelChunk};
use crate::container::unwrap_body;
use crate::cursor::{Cursor, StringLength};
use crate::descriptor::{GenericDescriptor, MaterialsDescriptor};
use crate::diagnostic::{DiagnosticKind, Diagnostics};
use crate::error::{DecodeError, DecodeResult};
use crate::hierarchy::link_hierarchy;
use crate::material::decode_material;
use crate::object::{ObjectScope, decode_object};
use crate::scene::{Material, Scene, SceneObject};
use crate::spline::read_splines;
use crate::texture::{NoTextures, TextureResolver};

/// Settings for one decode pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Directory of the file being decoded, searched for textures after
    /// the file's own texture paths.
    pub local_directory: String,
}

impl DecodeOptions {
    #[must_use]
    pub fn with_local_directory(local_directory: impl Into<String>) -> Self {
        Self {
            local_directory: local_directory.into(),
        }
    }
}

/// Decode a Z3D file without resolving textures.
pub fn decode(data: &[u8]) -> DecodeResult<Scene> {
    decode_with(data, &DecodeOptions::default(), NoTextures)
}

/// Decode a Z3D file, resolving texture names with `resolver`.
///
/// A file whose header declares an empty body decodes to an empty scene.
pub fn decode_with<R: TextureResolver>(
    data: &[u8],
    options: &DecodeOptions,
    resolver: R,
) -> DecodeResult<Scene<R::Handle>> {
    let body = match unwrap_body(data) {
        Ok(body) => body,
        Err(DecodeError::EmptyFile) => {
            tracing::info!("Z3D file declares an empty body");
            return Ok(Scene::default());
        }
        Err(e) => return Err(e),
    };

    let mut context = DecodeContext::new(options, resolver);
    context.run(&body)?;
    Ok(context.finish())
}

/// All mutable state of one decode pass.
struct DecodeContext<'o, R: TextureResolver> {
    options: &'o DecodeOptions,
    resolver: R,
    texture_paths: Vec<String>,
    texture_names: Vec<String>,
    resolved: HashMap<String, R::Handle>,
    meshes_desc: GenericDescriptor,
    materials_desc: MaterialsDescriptor,
    materials: Vec<Material<R::Handle>>,
    objects: Vec<SceneObject>,
    /// Latest object index for each name.
    names: HashMap<String, usize>,
    diagnostics: Diagnostics,
}

impl<'o, R: TextureResolver> DecodeContext<'o, R> {
    fn new(options: &'o DecodeOptions, resolver: R) -> Self {
        Self {
            options,
            resolver,
            texture_paths: Vec::new(),
            texture_names: Vec::new(),
            resolved: HashMap::new(),
            meshes_desc: GenericDescriptor::default(),
            materials_desc: MaterialsDescriptor::default(),
            materials: Vec::new(),
            objects: Vec::new(),
            names: HashMap::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Dispatch every chunk until a terminator or the end of the body.
    ///
    /// The cursor is moved to each chunk's declared end afterwards, however
    /// much its handler read.
    fn run(&mut self, body: &[u8]) -> DecodeResult<()> {
        let mut cursor = Cursor::new(body);
        while cursor.position() < cursor.len() {
            let offset = cursor.position();
            let tag = cursor.read_u32()?;
            if TopLevelChunk::is_terminator(tag) {
                tracing::debug!("End of chunk stream at {offset}");
                break;
            }
            let header = ChunkHeader {
                tag,
                size: cursor.read_u32()?,
                offset,
            };
            let chunk = TopLevelChunk::classify(&header);
            tracing::debug!("{chunk:?} ({} bytes) at {offset}", header.size);

            match self.dispatch(&mut cursor, &header, chunk) {
                Ok(()) => {}
                Err(DecodeError::MalformedChunk {
                    offset: at,
                    expected,
                    found,
                }) => self
                    .diagnostics
                    .push(at, DiagnosticKind::MalformedChunk { expected, found }),
                Err(e) => return Err(e),
            }

            let end = header.end();
            if cursor.position() > end {
                self.diagnostics.push(
                    offset,
                    DiagnosticKind::ChunkOverrun {
                        tag,
                        end,
                        position: cursor.position(),
                    },
                );
            }
            cursor.seek_absolute(end);
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        cursor: &mut Cursor<'_>,
        header: &ChunkHeader,
        chunk: TopLevelChunk,
    ) -> DecodeResult<()> {
        match chunk {
            TopLevelChunk::TexturePath => {
                let path = cursor.read_zstring(StringLength::Explicit(header.size))?;
                self.texture_paths.push(path);
            }
            TopLevelChunk::TextureName => {
                let name = cursor.read_zstring(StringLength::Explicit(header.size))?;
                self.resolve_texture(&name);
                self.texture_names.push(name);
            }
            TopLevelChunk::MeshesDesc => self.meshes_desc = GenericDescriptor::read(cursor)?,
            TopLevelChunk::MaterialsDesc => {
                self.materials_desc = MaterialsDescriptor::read(cursor)?;
            }
            TopLevelChunk::Material => {
                let material = decode_material(cursor, &self.materials_desc, &self.resolved)?;
                tracing::debug!(
                    "Material {} {:?}: {} textures",
                    self.materials.len(),
                    material.name,
                    material.textures.len()
                );
                self.materials.push(material);
            }
            TopLevelChunk::Object => {
                let mut scope = ObjectScope {
                    meshes: &self.meshes_desc,
                    material_count: self.materials.len(),
                    diagnostics: &mut self.diagnostics,
                };
                if let Some(object) = decode_object(cursor, header, &mut scope)? {
                    self.names.insert(object.name.clone(), self.objects.len());
                    self.objects.push(object);
                }
            }
            TopLevelChunk::Splines => {
                read_splines(cursor, header.end(), &mut self.diagnostics)?;
            }
            TopLevelChunk::Hierarchy => {
                let linked = link_hierarchy(
                    cursor,
                    header.end(),
                    &mut self.objects,
                    &self.names,
                    &mut self.diagnostics,
                )?;
                tracing::debug!("Linked {linked} hierarchy edges");
            }
            TopLevelChunk::UnrecognizedData => {}
            TopLevelChunk::Unknown { tag, size } => {
                self.diagnostics
                    .push(header.offset, DiagnosticKind::UnknownChunk { tag, size });
            }
        }
        Ok(())
    }

    fn resolve_texture(&mut self, name: &str) {
        let handle =
            self.resolver
                .resolve(name, &self.texture_paths, &self.options.local_directory);
        match handle {
            Some(handle) => {
                self.resolved.insert(name.to_owned(), handle);
            }
            None => tracing::debug!("Texture {name:?} not found"),
        }
    }

    fn finish(self) -> Scene<R::Handle> {
        let scene = Scene {
            texture_paths: self.texture_paths,
            texture_names: self.texture_names,
            materials: self.materials,
            objects: self.objects,
            diagnostics: self.diagnostics.into_vec(),
        };
        let (vertices, faces) = scene.totals();
        tracing::info!(
            "Decoded {} objects ({vertices} vertices, {faces} faces), {} materials, {} textures, {} diagnostics",
            scene.objects.len(),
            scene.materials.len(),
            scene.texture_names.len(),
            scene.diagnostics.len()
        );
        scene
    }
}
