use js_sys::{Float32Array, Function};
use log::warn;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use tendroid_deform::{
    AnimationParameters, AttributeHandle, ComputationEngine, Config, DeformError, Document,
    DocumentError, IntegrationMode, ShapeBatchDescriptor,
};

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn js_err(err: DeformError) -> JsError {
    JsError::new(&err.to_string())
}

/// Host document backed by two JS callbacks:
///   `resolve(path: string) -> number | null | undefined`
///   `commit(handle: number, points: Float32Array) -> boolean | undefined`
/// A thrown exception or a `false` return from `commit` counts as a failed write.
#[derive(Debug)]
pub struct JsDocument {
    resolve: Option<Function>,
    commit: Option<Function>,
}

impl JsDocument {
    pub fn new(resolve: JsValue, commit: JsValue) -> Self {
        Self {
            resolve: resolve.dyn_into::<Function>().ok(),
            commit: commit.dyn_into::<Function>().ok(),
        }
    }
}

impl Document for JsDocument {
    fn is_valid(&self) -> bool {
        self.resolve.is_some() && self.commit.is_some()
    }

    fn resolve(&mut self, identifier: &str) -> Result<AttributeHandle, DocumentError> {
        let f = self.resolve.as_ref().ok_or(DocumentError::Closed)?;
        let val = f
            .call1(&JsValue::UNDEFINED, &JsValue::from_str(identifier))
            .map_err(|e| DocumentError::Rejected {
                reason: format!("resolve threw: {e:?}"),
            })?;
        if jsvalue_is_undefined_or_null(&val) {
            return Err(DocumentError::NotFound {
                identifier: identifier.to_string(),
            });
        }
        match val.as_f64() {
            Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => {
                Ok(AttributeHandle(n as u64))
            }
            _ => Err(DocumentError::MissingAttribute {
                identifier: identifier.to_string(),
            }),
        }
    }

    fn commit(
        &mut self,
        attribute: AttributeHandle,
        points: &[[f32; 3]],
    ) -> Result<(), DocumentError> {
        let f = self.commit.as_ref().ok_or(DocumentError::Closed)?;
        let array = Float32Array::from(bytemuck::cast_slice::<[f32; 3], f32>(points));
        let val = f
            .call2(
                &JsValue::UNDEFINED,
                &JsValue::from_f64(attribute.0 as f64),
                &array,
            )
            .map_err(|e| DocumentError::Rejected {
                reason: format!("commit threw: {e:?}"),
            })?;
        if val.as_bool() == Some(false) {
            return Err(DocumentError::Rejected {
                reason: "commit returned false".into(),
            });
        }
        Ok(())
    }
}

#[wasm_bindgen]
pub struct TendroidEngine {
    core: ComputationEngine<JsDocument>,
}

#[wasm_bindgen]
impl TendroidEngine {
    /// Create an engine. Pass a config object or undefined/null for defaults.
    /// Example:
    ///   new TendroidEngine({ slow_call_warn_ms: 4 })
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<TendroidEngine, JsError> {
        console_error_panic_hook::set_once();

        let cfg: Config = if jsvalue_is_undefined_or_null(&config) {
            Config::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };

        Ok(TendroidEngine {
            core: ComputationEngine::new(cfg),
        })
    }

    #[wasm_bindgen]
    pub fn version(&self) -> String {
        self.core.version().to_string()
    }

    /// "compute-only" or "document".
    #[wasm_bindgen]
    pub fn mode(&self) -> String {
        match self.core.mode() {
            IntegrationMode::ComputeOnly => "compute-only".into(),
            IntegrationMode::Document => "document".into(),
        }
    }

    /// Attach the host document as a pair of callbacks. Returns false when either
    /// argument is not a function.
    #[wasm_bindgen]
    pub fn attach(&mut self, resolve: JsValue, commit: JsValue) -> bool {
        let doc = JsDocument::new(resolve, commit);
        if !doc.is_valid() {
            warn!("attach: resolve and commit must both be functions");
        }
        self.core.attach(doc)
    }

    #[wasm_bindgen]
    pub fn detach(&mut self) -> bool {
        self.core.detach().is_some()
    }

    #[wasm_bindgen(js_name = is_attached)]
    pub fn is_attached(&self) -> bool {
        self.core.is_attached()
    }

    #[wasm_bindgen]
    pub fn register(&mut self, identifier: &str) -> bool {
        self.core.register(identifier)
    }

    /// Register a list of identifiers; returns how many succeeded.
    #[wasm_bindgen(js_name = register_all)]
    pub fn register_all(&mut self, identifiers: Vec<String>) -> u32 {
        self.core.register_all(identifiers) as u32
    }

    #[wasm_bindgen(js_name = mesh_count)]
    pub fn mesh_count(&self) -> u32 {
        self.core.mesh_count() as u32
    }

    #[wasm_bindgen]
    pub fn clear(&mut self) {
        self.core.clear();
    }

    /// Deform `num_shapes` contiguous shapes from `base` into `output`.
    /// Returns the number of vertices processed.
    #[allow(clippy::too_many_arguments)]
    #[wasm_bindgen(js_name = compute_batch)]
    pub fn compute_batch(
        &mut self,
        base: &[f32],
        output: &mut [f32],
        num_shapes: u32,
        vertices_per_shape: u32,
        time: f32,
        wave_speed: f32,
        amplitude: f32,
        frequency: f32,
    ) -> Result<u32, JsError> {
        let descriptor = ShapeBatchDescriptor::new(num_shapes as usize, vertices_per_shape as usize);
        let params = AnimationParameters::new(time, wave_speed, amplitude, frequency);
        self.core
            .compute_batch(base, output, &descriptor, &params)
            .map(|n| n as u32)
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = compute_single)]
    pub fn compute_single(
        &mut self,
        base: &[f32],
        output: &mut [f32],
        time: f32,
        wave_speed: f32,
        amplitude: f32,
        frequency: f32,
    ) -> Result<u32, JsError> {
        let params = AnimationParameters::new(time, wave_speed, amplitude, frequency);
        self.core
            .compute_single(base, output, &params)
            .map(|n| n as u32)
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = bridge_write)]
    pub fn bridge_write(&mut self, identifier: &str, vertices: &[f32], vertex_count: u32) -> bool {
        self.core
            .bridge_write(identifier, vertices, vertex_count as usize)
    }

    #[wasm_bindgen(js_name = bridge_write_batch)]
    pub fn bridge_write_batch(
        &mut self,
        vertices: &[f32],
        total_vertex_count: u32,
        vertices_per_shape: u32,
    ) -> u32 {
        self.core.bridge_write_batch(
            vertices,
            total_vertex_count as usize,
            vertices_per_shape as usize,
        ) as u32
    }

    /// Compute and write one frame. `params` is an AnimationParameters object
    /// (missing fields default) or undefined/null for the configured defaults.
    /// Returns `{ vertices_processed, shapes_updated }`.
    #[wasm_bindgen(js_name = update_frame)]
    pub fn update_frame(
        &mut self,
        base: &[f32],
        output: &mut [f32],
        num_shapes: u32,
        vertices_per_shape: u32,
        params: JsValue,
    ) -> Result<JsValue, JsError> {
        let params: AnimationParameters = if jsvalue_is_undefined_or_null(&params) {
            self.core.config().default_params
        } else {
            swb::from_value(params).map_err(|e| JsError::new(&format!("params error: {e}")))?
        };
        let descriptor = ShapeBatchDescriptor::new(num_shapes as usize, vertices_per_shape as usize);
        let report = self
            .core
            .update_frame(base, output, &descriptor, &params)
            .map_err(js_err)?;
        swb::to_value(&report).map_err(|e| JsError::new(&format!("report error: {e}")))
    }

    /// `{ total_calls, total_vertices, total_time_ms, average_time_ms }`.
    #[wasm_bindgen]
    pub fn stats(&self) -> Result<JsValue, JsError> {
        swb::to_value(&self.core.stats_snapshot())
            .map_err(|e| JsError::new(&format!("stats error: {e}")))
    }

    #[wasm_bindgen(js_name = reset_stats)]
    pub fn reset_stats(&mut self) {
        self.core.stats_reset();
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
