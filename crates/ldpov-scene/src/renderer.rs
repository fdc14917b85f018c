//! Render session: one scene file from start to finish.

use std::io::Write;

use ldpov_ir::{ColorTable, PartInstance, PartLibrary};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::RenderConfig;
use crate::error::Result;
use crate::flatten::{Flattener, RenderReport};
use crate::registry::PrimitiveRegistry;
use crate::writer::{fmt_num, SceneWriter};

/// Scene-language version written in the preamble.
pub const POV_VERSION: &str = "3.7";

/// Camera distance at zoom 1.
const CAMERA_DISTANCE: f64 = 800.0;

/// Writes a complete scene: preamble, camera and flattened model.
///
/// The session owns its primitive registry, so a primitive synthesized for
/// one instance is reused by every later instance of the same scene.
pub struct PovRenderer<W: Write> {
    writer: SceneWriter<W>,
    registry: PrimitiveRegistry,
    config: RenderConfig,
    rng: StdRng,
    singular_warnings: usize,
}

impl<W: Write> PovRenderer<W> {
    /// Start a session writing to `out`.
    pub fn new(out: W, config: RenderConfig) -> Result<Self> {
        config.validate()?;
        let mut registry = match &config.primitives_manifest {
            Some(path) => PrimitiveRegistry::for_manifest(path),
            None => PrimitiveRegistry::new(),
        };
        registry.reset();
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            writer: SceneWriter::new(out),
            registry,
            config,
            rng,
            singular_warnings: 0,
        })
    }

    /// Primitive names known and generated so far.
    pub fn registry(&self) -> &PrimitiveRegistry {
        &self.registry
    }

    /// Session configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Singular-matrix warnings logged so far, at most one per instance.
    pub fn singular_warnings(&self) -> usize {
        self.singular_warnings
    }

    /// Write the version line, includes and camera.
    pub fn start_render(&mut self) -> Result<()> {
        let w = &mut self.writer;
        w.raw(&format!("#version {};\n", POV_VERSION))?;
        w.raw(&format!("#include \"{}\"\n", self.config.header_file))?;
        w.raw(&format!("#include \"{}\"\n", self.config.materials_file))?;
        if self.registry.known_count() > 0 {
            w.raw(&format!("#include \"{}\"\n", self.config.primitives_file))?;
        }
        w.raw("\n")?;

        let projection = if self.config.perspective {
            "perspective"
        } else {
            "orthographic"
        };
        w.raw(&format!(
            "camera {{\n  {}\n  location <0,0,{}>\n  look_at <0,0,0>\n  up <0,1,0>\n}}\n\n",
            projection,
            fmt_num(CAMERA_DISTANCE * self.config.zoom)
        ))?;
        Ok(())
    }

    /// Flatten one top-level instance into the scene.
    pub fn render_instance(
        &mut self,
        instance: &PartInstance,
        library: &dyn PartLibrary,
        colors: &dyn ColorTable,
    ) -> Result<RenderReport> {
        self.writer.comment(&format!("Part: {}", instance.part))?;
        let root = self.config.root_transform();
        let mut flattener = Flattener::new(
            library,
            colors,
            &mut self.registry,
            &mut self.writer,
            self.config.flatten_options(),
        );
        flattener.render_instance(instance, &root)?;
        let report = flattener.finish();
        if report.singular() {
            warn!("Singular matrix in part {}", instance.part);
            self.singular_warnings += 1;
        }
        Ok(report)
    }

    /// Flatten every top-level instance, each moved by a small random
    /// offset so coplanar faces of touching bricks do not z-fight.
    pub fn add_model(
        &mut self,
        instances: &[PartInstance],
        library: &dyn PartLibrary,
        colors: &dyn ColorTable,
    ) -> Result<RenderReport> {
        let mut total = RenderReport::default();
        for instance in instances {
            let moved = self.jittered(instance);
            let report = self.render_instance(&moved, library, colors)?;
            total.merge(&report);
        }
        self.writer.flush()?;
        info!(
            "Rendered {} instances: {} triangles, {} objects, {} declarations, {} warnings",
            instances.len(),
            total.triangles,
            total.objects,
            total.declarations,
            total.warnings()
        );
        Ok(total)
    }

    fn jittered(&mut self, instance: &PartInstance) -> PartInstance {
        let jitter = self.config.jitter;
        let mut moved = instance.clone();
        if jitter > 0.0 {
            for offset in moved.transform.iter_mut().take(3) {
                *offset += self.rng.gen_range(-jitter..jitter);
            }
        }
        moved
    }

    /// Flush and return the output.
    pub fn finish(self) -> Result<W> {
        Ok(self.writer.into_inner()?)
    }
}
