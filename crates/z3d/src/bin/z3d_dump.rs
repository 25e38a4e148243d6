//! Dump a JSON summary of a Z3D scene, optionally checking it against a
//! previously recorded summary.
//!
//! Run: `cargo run -p z3d --features test-tools --bin z3d_dump -- <file.z3d> [expected.json]`
//!
//! Without `expected.json` the summary is printed to stdout. With it, the
//! object, material and diagnostic counts and every object's vertex and
//! face counts are compared, and the process exits with status 1 on the
//! first mismatch.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::{Value, json};
use z3d::{LoadOptions, LoadedScene, TextureSlot};

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let Some(scene_path) = args.get(1) else {
        eprintln!("usage: z3d_dump <file.z3d> [expected.json]");
        std::process::exit(2);
    };

    let options = LoadOptions {
        decode_images: false,
        ..LoadOptions::default()
    };
    let loaded = match z3d::load_with_options(scene_path, &options) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load {scene_path}: {e}");
            std::process::exit(1);
        }
    };
    let summary = summarize(&loaded);

    let Some(expected_path) = args.get(2) else {
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Failed to serialize summary: {e}");
                std::process::exit(1);
            }
        }
        return;
    };

    println!("=== Comparing against {expected_path} ===\n");
    let result =
        read_json(Path::new(expected_path)).and_then(|expected| compare(&summary, &expected));
    match result {
        Ok(()) => println!("\nAll comparisons PASSED!"),
        Err(e) => {
            println!("FAILED: {e}");
            std::process::exit(1);
        }
    }
}

fn summarize(loaded: &LoadedScene) -> Value {
    let scene = &loaded.scene;
    let (vertex_count, face_count) = scene.totals();

    let materials: Vec<Value> = scene
        .materials
        .iter()
        .map(|material| {
            let primary = material.texture(TextureSlot::Primary);
            json!({
                "name": material.name,
                "diffuse": material.base_color().to_array(),
                "alpha_mode": format!("{:?}", material.alpha_mode),
                "primary_texture": primary.map(|binding| binding.name.as_str()),
                "primary_found": primary.is_some_and(|binding| binding.texture.is_some()),
            })
        })
        .collect();

    let objects: Vec<Value> = scene
        .objects
        .iter()
        .map(|object| {
            json!({
                "name": object.name,
                "vertex_count": object.vertices.len(),
                "face_count": object.faces.len(),
                "material_slots": object.material_slots,
                "parent": object
                    .parent
                    .and_then(|parent| scene.objects.get(parent))
                    .map(|parent| parent.name.as_str()),
                "hidden": object.is_hidden(),
                "placement": object.placement.to_cols_array(),
            })
        })
        .collect();

    let bounds = loaded
        .bounds()
        .map(|(min, max)| json!({ "min": min.to_array(), "max": max.to_array() }));

    json!({
        "path": loaded.path.display().to_string(),
        "texture_paths": scene.texture_paths,
        "texture_names": scene.texture_names,
        "material_count": scene.materials.len(),
        "object_count": scene.objects.len(),
        "vertex_count": vertex_count,
        "face_count": face_count,
        "bounds": bounds,
        "materials": materials,
        "objects": objects,
        "diagnostic_count": scene.diagnostics.len(),
        "diagnostics": scene.diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}

fn compare(actual: &Value, expected: &Value) -> Result<(), String> {
    for field in [
        "object_count",
        "material_count",
        "vertex_count",
        "face_count",
        "diagnostic_count",
    ] {
        compare_i64(field, &actual[field], &expected[field])?;
    }

    let actual_objects = actual["objects"]
        .as_array()
        .ok_or("missing actual objects")?;
    let expected_objects = expected["objects"]
        .as_array()
        .ok_or("missing expected objects")?;

    for (i, (actual_object, expected_object)) in
        actual_objects.iter().zip(expected_objects).enumerate()
    {
        if actual_object["name"] != expected_object["name"] {
            return Err(format!(
                "objects[{i}].name: mismatch: actual={}, expected={}",
                actual_object["name"], expected_object["name"]
            ));
        }
        for field in ["vertex_count", "face_count"] {
            compare_i64(
                &format!("objects[{i}].{field}"),
                &actual_object[field],
                &expected_object[field],
            )?;
        }
    }

    Ok(())
}

fn compare_i64(name: &str, actual: &Value, expected: &Value) -> Result<(), String> {
    let actual = actual
        .as_i64()
        .ok_or(format!("{name}: missing actual value"))?;
    let expected = expected
        .as_i64()
        .ok_or(format!("{name}: missing expected value"))?;
    if actual != expected {
        return Err(format!("{name}: mismatch: actual={actual}, expected={expected}"));
    }
    println!("  {name}: {actual}");
    Ok(())
}

fn read_json(path: &Path) -> Result<Value, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&content).map_err(|e| format!("failed to parse {}: {e}", path.display()))
}
