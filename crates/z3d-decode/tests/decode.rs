//! End-to-end decoding of synthetic Z3D files.

mod common;

use glam::{Mat4, Vec2, Vec3, Vec4};
use proptest::prelude::*;
use z3d_decode::chunk::{MaterialFlags, RecordFlags, StateFlags, tag};
use z3d_decode::container::MAGIC;
use z3d_decode::{
    AlphaMode, DecodeError, DecodeOptions, DiagnosticKind, FaceRejection, Scene, TextureResolver,
    TextureSlot, decode, decode_with,
};

use common::{
    FaceDefaults, Payload, Z3dFile, face_desc, generic_desc, indices, materials_desc,
    material_record, object, params, plain_vertex, vertex_table,
};

fn face_record(width: usize, decoded: [u32; 3], present: RecordFlags, fields: &Payload) -> Payload {
    indices(width, decoded).u32(present.bits()).bytes(&fields.0)
}

fn face_table(width: usize, faces: &[([u32; 3], RecordFlags, Payload)], defaults: FaceDefaults) -> [(u32, Payload); 2] {
    let count = u32::try_from(faces.len()).unwrap();
    let data = faces
        .iter()
        .fold(Payload::new(), |p, (decoded, present, fields)| {
            p.bytes(&face_record(width, *decoded, *present, fields).0)
        });
    [
        (tag::FACETABLE_DESC, face_desc(count, defaults)),
        (tag::FACETABLE_DATA, data),
    ]
}

fn triangle_object(name: &str) -> Payload {
    let [vd, vt] = vertex_table(3);
    let [fd, ft] = face_table(1, &[([0, 1, 2], RecordFlags::empty(), Payload::new())], FaceDefaults::default());
    object(name, &[], &[vd, vt, fd, ft])
}

fn decode_stored(file: &Z3dFile) -> Scene {
    decode(&file.stored()).unwrap()
}

#[test]
fn minimal_file_with_degenerate_face() {
    let [vd, vt] = vertex_table(1);
    let [fd, ft] = face_table(1, &[([0, 0, 0], RecordFlags::empty(), Payload::new())], FaceDefaults::default());
    let file = Z3dFile::new()
        .chunk(tag::OBJECT, &object("box", &[], &[vd, vt, fd, ft]))
        .terminate();

    let scene = decode(&file.stored_with_length(8)).unwrap();
    assert_eq!(scene.objects.len(), 1);
    let object = &scene.objects[0];
    assert_eq!(object.name, "box");
    assert_eq!(object.vertices.len(), 1);
    assert!(object.faces.is_empty());
    assert!(matches!(
        scene.diagnostics[0].kind,
        DiagnosticKind::RejectedFace {
            record: 0,
            reason: FaceRejection::Degenerate,
            ..
        }
    ));
}

#[test]
fn every_chunk_ends_at_its_declared_size() {
    // The meshes descriptor carries padding its handler never reads.
    let padded_meshes = generic_desc(0, 0, [StateFlags::HIDDEN.bits(), 0, 0, 0, 0]).bytes(&[0xEE; 12]);
    let padded_path = Payload::new().bytes(b"maps\\\0").bytes(&[0xEE; 3]);
    let file = Z3dFile::new()
        .chunk(tag::MESHES_DESC, &padded_meshes)
        .chunk(tag::UNRECOGNIZEDDATA, &Payload::new().bytes(&[0xFF; 17]))
        .chunk(0x1234_5678, &Payload::new().bytes(&[0xFF; 5]))
        .chunk(tag::TEXTUREPATH, &padded_path)
        .chunk(tag::OBJECT, &triangle_object("after"))
        .terminate();

    let scene = decode_stored(&file);
    assert_eq!(scene.objects.len(), 1);
    assert!(scene.objects[0].is_hidden());
    assert_eq!(scene.objects[0].faces.len(), 1);
    // String chunks take their length from the chunk size, padding included.
    assert!(scene.texture_paths[0].starts_with("maps\\"));
    assert_eq!(
        scene
            .diagnostics
            .iter()
            .map(|d| &d.kind)
            .collect::<Vec<_>>(),
        [&DiagnosticKind::UnknownChunk {
            tag: 0x1234_5678,
            size: 5
        }]
    );
}

#[test]
fn handler_overrun_is_reported_and_corrected() {
    // A vertex table that claims more bytes than its object chunk holds.
    let [vd, vt] = vertex_table(2);
    let inner = object("short", &[], &[vd, vt]);
    let mut truncated = inner.0.clone();
    truncated.truncate(inner.len() - 24);
    let file = Z3dFile::new()
        .raw(&tag::OBJECT.to_le_bytes())
        .raw(&u32::try_from(truncated.len()).unwrap().to_le_bytes())
        .raw(&truncated)
        .chunk(tag::OBJECT, &triangle_object("next"))
        .terminate();

    // The second vertex spills into the next chunk's bytes, which are then
    // decoded again from the right offset.
    let scene = decode_stored(&file);
    assert_eq!(scene.objects.len(), 2);
    assert_eq!(scene.objects[1].name, "next");
    assert!(
        scene
            .diagnostics
            .iter()
            .any(|d| matches!(d.kind, DiagnosticKind::ChunkOverrun { tag: tag::OBJECT, .. }))
    );
}

#[test]
fn stream_positions_are_converted_to_z_up() {
    let vertices = plain_vertex([1.0, 2.0, 3.0]);
    let obj = object(
        "point",
        &[],
        &[
            (tag::VERTTABLE_DESC, generic_desc(1, 0, [0; 5])),
            (tag::VERTTABLE_DATA, vertices),
        ],
    );
    let scene = decode_stored(&Z3dFile::new().chunk(tag::OBJECT, &obj).terminate());
    let vertex = scene.objects[0].vertices[0];
    assert_eq!(vertex.position, Vec3::new(1.0, -3.0, 2.0));
    // A lone vertex's normal points away from the origin.
    assert!(vertex.normal.abs_diff_eq(vertex.position.normalize(), 1e-6));
}

#[test]
fn vertex_state_comes_from_descriptor_when_absent() {
    let hidden = StateFlags::HIDDEN.bits();
    let data = (0..3).fold(Payload::new(), |p, _| p.bytes(&plain_vertex([0.0; 3]).0));
    let obj = object(
        "v",
        &[],
        &[
            (tag::VERTTABLE_DESC, generic_desc(3, 0, [hidden, 1, 2, 3, 4])),
            (tag::VERTTABLE_DATA, data),
        ],
    );
    let scene = decode_stored(&Z3dFile::new().chunk(tag::OBJECT, &obj).terminate());
    for vertex in &scene.objects[0].vertices {
        assert!(vertex.is_hidden());
        assert_eq!(vertex.misc, [1, 2, 3, 4]);
    }
}

#[test]
fn face_state_never_inherits_from_previous_record() {
    let defaults = FaceDefaults {
        state: [StateFlags::SELECTED.bits(), 10, 20, 30, 40],
        ..FaceDefaults::default()
    };
    let faces = [
        (
            [0, 1, 2],
            RecordFlags::HAS_FLAGS | RecordFlags::HAS_MISC_V0,
            Payload::new().words(&[StateFlags::HIDDEN.bits(), 99]),
        ),
        ([0, 1, 2], RecordFlags::empty(), Payload::new()),
    ];
    let [vd, vt] = vertex_table(3);
    let [fd, ft] = face_table(1, &faces, defaults);
    let file = Z3dFile::new()
        .chunk(tag::OBJECT, &object("f", &[], &[vd, vt, fd, ft]))
        .terminate();

    let scene = decode_stored(&file);
    let [first, second] = scene.objects[0].faces[..] else {
        panic!("expected two faces");
    };
    assert_eq!(first.flags, StateFlags::HIDDEN);
    assert!(first.hidden);
    assert_eq!(first.misc, [99, 20, 30, 40]);
    assert_eq!(second.flags, StateFlags::SELECTED);
    assert!(!second.hidden);
    assert!(second.is_selected());
    assert_eq!(second.misc, [10, 20, 30, 40]);
}

fn last_vertex_face(vertex_counts: &[u32], width: usize) -> Scene {
    let mut subchunks = Vec::new();
    for &count in vertex_counts {
        subchunks.extend(vertex_table(count));
    }
    let last = vertex_counts.iter().sum::<u32>() - 1;
    subchunks.extend(face_table(
        width,
        &[([last, 1, 0], RecordFlags::empty(), Payload::new())],
        FaceDefaults::default(),
    ));
    let file = Z3dFile::new()
        .chunk(tag::OBJECT, &object("wide", &[], &subchunks))
        .terminate();
    decode_stored(&file)
}

#[test]
fn index_width_follows_accumulated_vertex_count() {
    for (counts, width) in [
        (&[255][..], 1),
        (&[256][..], 1),
        (&[257][..], 2),
        (&[200, 100][..], 2),
        (&[65_536][..], 2),
        (&[65_537][..], 4),
    ] {
        let scene = last_vertex_face(counts, width);
        let object = &scene.objects[0];
        assert_eq!(object.faces.len(), 1, "counts {counts:?}");
        let last = counts.iter().sum::<u32>() - 1;
        assert_eq!(object.faces[0].indices, [last, 1, 0], "counts {counts:?}");
        assert!(scene.diagnostics.is_empty(), "counts {counts:?}");
    }
}

#[test]
fn uvs_are_reversed_and_flipped() {
    let uv = Payload::new().floats(&[0.1, 0.2, 0.3, 0.25, 0.5, 0.75]);
    let [vd, vt] = vertex_table(3);
    let [fd, ft] = face_table(1, &[([0, 1, 2], RecordFlags::HAS_UV, uv)], FaceDefaults::default());
    let file = Z3dFile::new()
        .chunk(tag::OBJECT, &object("uv", &[], &[vd, vt, fd, ft]))
        .terminate();

    let face = decode_stored(&file).objects[0].faces[0];
    assert_eq!(face.uvs[0], Vec2::new(0.3, 0.25));
    assert_eq!(face.uvs[1], Vec2::new(0.2, 0.5));
    // The first stored pair, v = 0.25, lands on the last corner.
    assert_eq!(face.uvs[2], Vec2::new(0.1, 0.75));
}

#[test]
fn face_defaults_supply_uv_material_and_render_flags() {
    let defaults = FaceDefaults {
        material: 0,
        uv: [0.0, 1.0, 0.5, 0.0, 0.0, 1.0],
        render: [7, 8, 9],
        ..FaceDefaults::default()
    };
    let [vd, vt] = vertex_table(3);
    let [fd, ft] = face_table(1, &[([0, 1, 2], RecordFlags::empty(), Payload::new())], defaults);
    let file = Z3dFile::new()
        .chunk(
            tag::MATERIALS_DESC,
            &materials_desc(0, material_record([1.0; 4], 0.0), params([-1; 4], 0, 0)),
        )
        .chunk(tag::MATERIAL, &Payload::new().name("only"))
        .chunk(tag::OBJECT, &object("d", &[], &[vd, vt, fd, ft]))
        .terminate();

    let scene = decode_stored(&file);
    let face = scene.objects[0].faces[0];
    assert_eq!(face.uvs, [Vec2::new(0.5, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)]);
    assert_eq!(face.render_flags.render, 7);
    assert_eq!(face.render_flags.wrap, 9);
    assert_eq!(face.material_slot, Some(0));
}

#[test]
fn material_slots_are_assigned_on_first_use() {
    let mut file = Z3dFile::new().chunk(
        tag::MATERIALS_DESC,
        &materials_desc(0, material_record([1.0; 4], 0.0), params([-1; 4], 0, 0)),
    );
    for name in ["a", "b", "c"] {
        file = file.chunk(tag::MATERIAL, &Payload::new().name(name));
    }
    let faces: Vec<_> = [2, 2, 0, 7, 2]
        .into_iter()
        .map(|raw| {
            (
                [0, 1, 2],
                RecordFlags::HAS_MATERIAL,
                Payload::new().u32(raw),
            )
        })
        .collect();
    let [vd, vt] = vertex_table(3);
    let [fd, ft] = face_table(1, &faces, FaceDefaults::default());
    let file = file
        .chunk(tag::OBJECT, &object("m", &[], &[vd, vt, fd, ft]))
        .terminate();

    let scene = decode_stored(&file);
    let object = &scene.objects[0];
    let slots: Vec<_> = object.faces.iter().map(|f| f.material_slot).collect();
    assert_eq!(slots, [Some(0), Some(0), Some(1), None, Some(0)]);
    assert_eq!(object.material_slots, [2, 0]);
    assert_eq!(scene.materials[object.material_slots[0]].name, "c");
    assert_eq!(object.faces_in_slot(Some(0)).count(), 3);
}

#[test]
fn compressed_and_stored_files_decode_alike() {
    let file = Z3dFile::new()
        .chunk(tag::TEXTURENAME, &Payload::new().bytes(b"skin.bmp\0"))
        .chunk(tag::OBJECT, &triangle_object("tri"))
        .terminate();

    let stored = decode(&file.stored()).unwrap();
    let compressed = decode(&file.compressed()).unwrap();
    assert_eq!(stored.objects, compressed.objects);
    assert_eq!(compressed.texture_names, ["skin.bmp"]);
}

#[test]
fn local_matrix_places_object_and_unplaces_earlier_vertices() {
    let matrix = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    let [vd, vt] = vertex_table(1);
    let obj = object(
        "placed",
        &[],
        &[
            vd,
            vt,
            (
                tag::OBJECT_LOCALMATRIX,
                Payload::new().floats(&matrix.to_cols_array()),
            ),
        ],
    );
    let scene = decode_stored(&Z3dFile::new().chunk(tag::OBJECT, &obj).terminate());
    let object = &scene.objects[0];
    assert!(
        object
            .placement
            .abs_diff_eq(Mat4::from_translation(Vec3::new(1.0, -3.0, 2.0)), 1e-6)
    );
    // Vertex 0 sat at the origin in scene space before the matrix arrived.
    assert!(
        object.vertices[0]
            .position
            .abs_diff_eq(Vec3::new(-1.0, 3.0, -2.0), 1e-6)
    );
}

#[test]
fn fully_mirrored_local_matrix_becomes_identity() {
    let matrix = Mat4::from_scale(Vec3::splat(-1.0));
    let obj = object(
        "mirrored",
        &[],
        &[(
            tag::OBJECT_LOCALMATRIX,
            Payload::new().floats(&matrix.to_cols_array()),
        )],
    );
    let scene = decode_stored(&Z3dFile::new().chunk(tag::OBJECT, &obj).terminate());
    assert_eq!(scene.objects[0].placement, Mat4::IDENTITY);
}

#[test]
fn hierarchy_links_objects_by_name() {
    let edges = Payload::new()
        .prefixed("body")
        .prefixed("wheel")
        .prefixed("body")
        .prefixed("missing")
        .prefixed("")
        .prefixed("");
    let file = Z3dFile::new()
        .chunk(tag::OBJECT, &triangle_object("body"))
        .chunk(tag::OBJECT, &triangle_object("wheel"))
        .chunk(tag::HIERARCHY, &edges)
        .terminate();

    let scene = decode_stored(&file);
    assert_eq!(scene.objects[1].parent, Some(0));
    assert_eq!(scene.roots().collect::<Vec<_>>(), [0]);
    assert_eq!(scene.children_of(0).collect::<Vec<_>>(), [1]);
    assert!(scene.diagnostics.is_empty());
}

#[test]
fn data_table_without_descriptor_is_skipped() {
    let [vd, vt] = vertex_table(3);
    let [fd, ft] = face_table(1, &[([0, 1, 2], RecordFlags::empty(), Payload::new())], FaceDefaults::default());
    // Face data first, without any face descriptor yet.
    let obj = object("orphan", &[], &[ft.clone(), vd, vt, fd, ft]);
    let scene = decode_stored(&Z3dFile::new().chunk(tag::OBJECT, &obj).terminate());

    assert_eq!(scene.objects[0].faces.len(), 1);
    assert_eq!(
        scene.diagnostics[0].kind,
        DiagnosticKind::MissingDescriptor {
            data_tag: tag::FACETABLE_DATA
        }
    );
}

#[test]
fn unknown_object_sub_chunk_ends_the_object() {
    let [vd, vt] = vertex_table(3);
    let obj = object("early", &[], &[vd, (0x0999, Payload::new().u32(1)), vt]);
    let file = Z3dFile::new()
        .chunk(tag::OBJECT, &obj)
        .chunk(tag::OBJECT, &triangle_object("later"))
        .terminate();
    let scene = decode_stored(&file);
    assert!(scene.objects[0].vertices.is_empty());
    assert_eq!(scene.objects[1].faces.len(), 1);
    assert_eq!(
        scene.diagnostics[0].kind,
        DiagnosticKind::UnknownObjectChunk { tag: 0x0999 }
    );
}

#[test]
fn uv_mapper_objects_are_skipped() {
    let file = Z3dFile::new()
        .chunk(tag::OBJECT, &triangle_object("UVMapperDATA"))
        .chunk(tag::OBJECT, &triangle_object("real"))
        .terminate();
    let scene = decode_stored(&file);
    assert_eq!(scene.objects.len(), 1);
    assert_eq!(scene.objects[0].name, "real");
}

#[test]
fn malformed_object_name_drops_only_that_object() {
    let bad = Payload::new().chunk(0x0777, &Payload::new().u32(0));
    let file = Z3dFile::new()
        .chunk(tag::OBJECT, &bad)
        .chunk(tag::OBJECT, &triangle_object("good"))
        .terminate();
    let scene = decode_stored(&file);
    assert_eq!(scene.objects.len(), 1);
    assert_eq!(
        scene.diagnostics[0].kind,
        DiagnosticKind::MalformedChunk {
            expected: tag::NAME,
            found: 0x0777
        }
    );
}

#[test]
fn object_state_is_read_when_meshes_descriptor_says_so() {
    let meshes = generic_desc(
        0,
        (RecordFlags::HAS_FLAGS | RecordFlags::HAS_MISC_V3).bits(),
        [0, 1, 2, 3, 4],
    );
    let obj = object("state", &[StateFlags::SELECTED.bits(), 44], &[]);
    let file = Z3dFile::new()
        .chunk(tag::MESHES_DESC, &meshes)
        .chunk(tag::OBJECT, &obj)
        .terminate();
    let scene = decode_stored(&file);
    let object = &scene.objects[0];
    assert!(object.is_selected());
    assert!(!object.is_hidden());
    assert_eq!(object.misc, [1, 2, 3, 44]);
}

#[test]
fn splines_are_skipped() {
    let splines = Payload::new().words(&[1, 2]).floats(&[0.0; 6]);
    let file = Z3dFile::new()
        .chunk(tag::SPLINES, &splines)
        .chunk(tag::OBJECT, &triangle_object("after"))
        .terminate();
    let scene = decode_stored(&file);
    assert_eq!(scene.objects.len(), 1);
    assert!(scene.diagnostics.is_empty());
}

#[test]
fn stream_ends_at_either_terminator() {
    let file = Z3dFile::new()
        .chunk(tag::OBJECT, &triangle_object("kept"))
        .raw(&0xF0E0_0F0Eu32.to_le_bytes())
        .raw(&[0xAB; 7]);
    let scene = decode_stored(&file);
    assert_eq!(scene.objects.len(), 1);

    // No terminator at all is fine too.
    let file = Z3dFile::new().chunk(tag::OBJECT, &triangle_object("kept"));
    assert_eq!(decode_stored(&file).objects.len(), 1);
}

#[test]
fn header_errors() {
    let file = Z3dFile::new().chunk(tag::OBJECT, &triangle_object("x"));

    let mut bad_magic = file.stored();
    bad_magic[3] = 0;
    assert!(matches!(
        decode(&bad_magic),
        Err(DecodeError::InvalidMagic { .. })
    ));

    let empty = decode(&file.stored_with_length(0)).unwrap();
    assert!(empty.objects.is_empty());

    assert!(matches!(
        decode(&MAGIC.to_le_bytes()),
        Err(DecodeError::TruncatedInput { .. })
    ));

    let mut truncated = file.stored();
    truncated.truncate(truncated.len() - 10);
    let err = decode(&truncated).unwrap_err();
    assert!(matches!(err, DecodeError::TruncatedInput { .. }));
    assert!(err.is_fatal());
}

/// Records every call and hands out sequential ids for known names.
#[derive(Default)]
struct RecordingResolver {
    calls: Vec<(String, Vec<String>, String)>,
}

impl TextureResolver for RecordingResolver {
    type Handle = usize;

    fn resolve(&mut self, name: &str, search_paths: &[String], local_directory: &str) -> Option<usize> {
        self.calls.push((
            name.to_owned(),
            search_paths.to_vec(),
            local_directory.to_owned(),
        ));
        name.ends_with(".tga").then_some(self.calls.len())
    }
}

#[test]
fn textures_are_resolved_and_bound() {
    let desc = materials_desc(
        (MaterialFlags::HAS_MATERIAL_RECORD | MaterialFlags::HAS_PARAMS).bits(),
        material_record([0.0; 4], 0.0),
        params([-1; 4], 0, 0),
    );
    let material = Payload::new()
        .name("glass")
        .bytes(&material_record([0.5, 0.5, 0.5, 0.25], 30.0).0)
        .bytes(&params([0, -1, 1, -1], 2, 128).0)
        .name("glass.tga")
        .name("env.bmp");
    let file = Z3dFile::new()
        .chunk(tag::TEXTUREPATH, &Payload::new().bytes(b"C:\\maps\\\0"))
        .chunk(tag::TEXTURENAME, &Payload::new().bytes(b"glass.tga\0"))
        .chunk(tag::TEXTURENAME, &Payload::new().bytes(b"env.bmp\0"))
        .chunk(tag::MATERIALS_DESC, &desc)
        .chunk(tag::MATERIAL, &material)
        .terminate();

    let mut resolver = RecordingResolver::default();
    let options = DecodeOptions::with_local_directory("/models");
    let scene = decode_with(&file.stored(), &options, &mut resolver).unwrap();

    assert_eq!(resolver.calls.len(), 2);
    assert_eq!(
        resolver.calls[0],
        (
            "glass.tga".to_owned(),
            vec!["C:\\maps\\".to_owned()],
            "/models".to_owned()
        )
    );

    let material = &scene.materials[0];
    assert_eq!(material.record.diffuse, Vec4::new(0.5, 0.5, 0.5, 0.25));
    assert_eq!(material.alpha_mode, AlphaMode::Clip { threshold: 128.0 / 255.0 });
    let primary = material.texture(TextureSlot::Primary).unwrap();
    assert_eq!((primary.name.as_str(), primary.texture), ("glass.tga", Some(1)));
    let reflection = material.texture(TextureSlot::Reflection).unwrap();
    assert_eq!((reflection.name.as_str(), reflection.texture), ("env.bmp", None));
    assert!(material.texture(TextureSlot::Bump).is_none());
}

proptest! {
    #[test]
    fn absent_misc_always_takes_descriptor_default(
        default in any::<u32>(),
        overrides in proptest::collection::vec(proptest::option::of(any::<u32>()), 1..20),
    ) {
        let faces: Vec<_> = overrides
            .iter()
            .map(|value| match value {
                Some(v) => ([0, 1, 2], RecordFlags::HAS_MISC_V1, Payload::new().u32(*v)),
                None => ([0, 1, 2], RecordFlags::empty(), Payload::new()),
            })
            .collect();
        let defaults = FaceDefaults {
            state: [0, 0, default, 0, 0],
            ..FaceDefaults::default()
        };
        let [vd, vt] = vertex_table(3);
        let [fd, ft] = face_table(1, &faces, defaults);
        let file = Z3dFile::new()
            .chunk(tag::OBJECT, &object("p", &[], &[vd, vt, fd, ft]))
            .terminate();

        let scene = decode(&file.stored()).unwrap();
        let decoded: Vec<_> = scene.objects[0].faces.iter().map(|f| f.misc[1]).collect();
        let expected: Vec<_> = overrides.iter().map(|o| o.unwrap_or(default)).collect();
        prop_assert_eq!(decoded, expected);
    }

    #[test]
    fn arbitrary_bytes_never_panic(body in proptest::collection::vec(any::<u8>(), 0..256)) {
        let file = Z3dFile::new().raw(&body);
        let _ = decode(&file.stored());
    }
}
