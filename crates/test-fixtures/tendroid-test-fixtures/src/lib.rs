use std::collections::HashMap;
use std::f32::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    parameters: HashMap<String, String>,
    scenes: HashMap<String, String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a>(map: &'a HashMap<String, String>, kind: &str, name: &str) -> Result<&'a str> {
    map.get(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Animation parameter presets. Deserialize into the engine's parameter type.
pub mod parameters {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.parameters.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        read_to_string(lookup(&MANIFEST.parameters, "parameters", name)?)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        super::load_json(lookup(&MANIFEST.parameters, "parameters", name)?)
    }
}

/// Batches of identical tubes under a common root path.
pub mod scenes {
    use super::*;

    #[derive(Debug, Clone, Deserialize)]
    pub struct Scene {
        pub root: String,
        pub shapes: usize,
        pub tube: super::tube::TubeSpec,
    }

    impl Scene {
        /// Shape identifiers in batch order: `{root}/Tube_00`, `{root}/Tube_01`, ...
        pub fn identifiers(&self) -> Vec<String> {
            (0..self.shapes)
                .map(|i| format!("{}/Tube_{i:02}", self.root))
                .collect()
        }

        pub fn vertices_per_shape(&self) -> usize {
            self.tube.vertex_count()
        }

        /// Flat base buffer for the whole batch.
        pub fn base_vertices(&self) -> Vec<f32> {
            super::tube::batch(&self.tube, self.shapes)
        }
    }

    pub fn keys() -> Vec<String> {
        MANIFEST.scenes.keys().cloned().collect()
    }

    pub fn load(name: &str) -> Result<Scene> {
        super::load_json(lookup(&MANIFEST.scenes, "scene", name)?)
    }
}

/// Procedural tube geometry in local space (long axis = +y).
pub mod tube {
    use super::*;

    #[derive(Debug, Clone, Copy, Deserialize)]
    pub struct TubeSpec {
        pub height: f32,
        pub radius: f32,
        pub height_segments: usize,
        pub radial_segments: usize,
    }

    impl TubeSpec {
        pub fn new(height: f32, radius: f32, height_segments: usize, radial_segments: usize) -> Self {
            Self {
                height,
                radius,
                height_segments,
                radial_segments,
            }
        }

        /// Rings (`height_segments + 1`) times vertices per ring.
        pub fn vertex_count(&self) -> usize {
            (self.height_segments + 1) * self.radial_segments
        }

        /// Interleaved `x, y, z` positions, ring by ring from the base.
        pub fn vertices(&self) -> Vec<f32> {
            let mut out = Vec::with_capacity(self.vertex_count() * 3);
            for h in 0..=self.height_segments {
                let y = h as f32 / self.height_segments.max(1) as f32 * self.height;
                for r in 0..self.radial_segments {
                    let theta = r as f32 / self.radial_segments as f32 * TAU;
                    out.extend_from_slice(&[self.radius * theta.cos(), y, self.radius * theta.sin()]);
                }
            }
            out
        }
    }

    /// `shapes` copies of the same tube laid out back to back.
    pub fn batch(spec: &TubeSpec, shapes: usize) -> Vec<f32> {
        spec.vertices().repeat(shapes)
    }
}
