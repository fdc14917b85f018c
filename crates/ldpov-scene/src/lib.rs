#![warn(missing_docs)]

//! POV-Ray scene generation for LDraw brick models.
//!
//! This crate flattens a part tree into triangles and object instantiations,
//! synthesizing partial-revolution primitives (cylinders, discs, rings,
//! cones and tori) from their file names on first use.
//!
//! # Example
//!
//! ```ignore
//! use ldpov_ir::Document;
//! use ldpov_scene::{PovRenderer, RenderConfig};
//!
//! let doc = Document::from_json(&json)?;
//! let mut renderer = PovRenderer::new(File::create("model.pov")?, RenderConfig::default())?;
//! renderer.start_render()?;
//! let report = renderer.add_model(&doc.model, &doc, &doc)?;
//! renderer.finish()?;
//!
//! println!("Triangles: {}", report.triangles);
//! ```

pub mod config;
pub mod error;
pub mod flatten;
pub mod materials;
pub mod procedural;
pub mod registry;
pub mod renderer;
pub mod resources;
pub mod writer;

pub use config::RenderConfig;
pub use error::{Result, SceneError};
pub use flatten::{primitive_file_name, FlattenOptions, Flattener, RenderReport};
pub use materials::{material_declaration, material_name, write_materials};
pub use procedural::{classify, declaration_name, synthesize, ProceduralShape, Synthesis};
pub use registry::PrimitiveRegistry;
pub use renderer::PovRenderer;
pub use resources::{stage_resources, StagedResources};
pub use writer::SceneWriter;
