//! JSON scene descriptions.
//!
//! ```json
//! {
//!   "camera": { "image_width": 400, "vfov": 20.0, "look_from": [13, 2, 3], "look_at": [0, 0, 0] },
//!   "materials": {
//!     "ground": { "type": "lambertian", "albedo": [0.5, 0.5, 0.5] },
//!     "glass":  { "type": "dielectric", "refraction_index": 1.5 }
//!   },
//!   "spheres": [
//!     { "center": [0, -1000, 0], "radius": 1000, "material": "ground" },
//!     { "center": [0, 1, 0], "radius": 1, "material": "glass" }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ConfigError, SceneError, SceneResult};
use crate::{CameraConfig, Dielectric, Lambertian, Material, Metal, Scene, Sphere};
use ember_math::{Color, Point3};
use log::debug;
use serde::{Deserialize, Serialize};

/// A material entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialEntry {
    Lambertian {
        albedo: Color,
    },
    Metal {
        albedo: Color,
        #[serde(default)]
        fuzz: f64,
    },
    Dielectric {
        refraction_index: f64,
    },
}

impl MaterialEntry {
    /// Validate and build the material.
    pub fn build(&self) -> Result<Arc<dyn Material>, ConfigError> {
        let material: Arc<dyn Material> = match *self {
            MaterialEntry::Lambertian { albedo } => Arc::new(Lambertian::new(albedo)),
            MaterialEntry::Metal { albedo, fuzz } => Arc::new(Metal::new(albedo, fuzz)?),
            MaterialEntry::Dielectric { refraction_index } => Arc::new(Dielectric::new(refraction_index)?),
        };
        Ok(material)
    }
}

/// A sphere entry referencing a material by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphereEntry {
    pub center: Point3,
    pub radius: f64,
    pub material: String,
}

/// A whole scene: optional camera, named materials, spheres.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub camera: Option<CameraConfig>,
    #[serde(default)]
    pub materials: BTreeMap<String, MaterialEntry>,
    #[serde(default)]
    pub spheres: Vec<SphereEntry>,
}

impl SceneDescription {
    /// Parse a description from JSON text.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        let description: SceneDescription = serde_json::from_str(json)?;
        if let Some(camera) = &description.camera {
            camera.validate().map_err(SceneError::InvalidCamera)?;
        }
        Ok(description)
    }

    /// Load a description from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        debug!("Loading scene description from {}", path.display());
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Build the scene. Spheres naming the same material share one instance.
    pub fn build(&self) -> SceneResult<Scene> {
        let mut materials = BTreeMap::new();
        for (name, entry) in &self.materials {
            let material = entry.build().map_err(|source| SceneError::InvalidMaterial {
                name: name.clone(),
                source,
            })?;
            materials.insert(name.as_str(), material);
        }

        let mut scene = Scene::new();
        for (index, sphere) in self.spheres.iter().enumerate() {
            let material = materials
                .get(sphere.material.as_str())
                .ok_or_else(|| SceneError::UnknownMaterial {
                    index,
                    name: sphere.material.clone(),
                })?;
            let object = Sphere::new(sphere.center, sphere.radius, Arc::clone(material))
                .map_err(|source| SceneError::InvalidSphere { index, source })?;
            scene.add(Box::new(object));
        }

        debug!("Built scene with {} materials and {} spheres", materials.len(), scene.len());
        Ok(scene)
    }
}
