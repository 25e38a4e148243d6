//! Texture resolution hook.

/// Turns texture names into host asset handles.
///
/// The decoder calls [`resolve`](Self::resolve) once for every
/// `TEXTURENAME` chunk, in stream order. Materials later bind the handle
/// returned for the name they reference. Implementations decide how to
/// search and whether to cache.
pub trait TextureResolver {
    type Handle: Clone;

    /// Resolve `name` using the `TEXTUREPATH` entries seen so far and the
    /// directory the file was loaded from.
    fn resolve(
        &mut self,
        name: &str,
        search_paths: &[String],
        local_directory: &str,
    ) -> Option<Self::Handle>;
}

/// A resolver that never finds anything.
///
/// Materials still record their texture names.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTextures;

impl TextureResolver for NoTextures {
    type Handle = ();

    fn resolve(&mut self, _name: &str, _search_paths: &[String], _local_directory: &str) -> Option<()> {
        None
    }
}

impl<R: TextureResolver + ?Sized> TextureResolver for &mut R {
    type Handle = R::Handle;

    fn resolve(
        &mut self,
        name: &str,
        search_paths: &[String],
        local_directory: &str,
    ) -> Option<Self::Handle> {
        (**self).resolve(name, search_paths, local_directory)
    }
}
