//! Part-tree flattening.
//!
//! Walks a part depth-first, composing placements into the root frame and
//! resolving inherited colors and winding, and writes every filled face as a
//! triangle and every library primitive as an object instantiation.

use std::collections::BTreeSet;
use std::io::Write;

use ldpov_ir::{
    normalize_part_name, ColorId, ColorSelector, ColorTable, Part, PartInstance, PartLibrary,
    Primitive,
};
use ldpov_math::{Point3, Transform};
use log::{debug, warn};

use crate::error::Result;
use crate::materials::material_name;
use crate::procedural::{declaration_name, synthesize, Synthesis};
use crate::registry::PrimitiveRegistry;
use crate::writer::SceneWriter;

/// Family folders whose primitives share the plain primitive namespace.
const FAMILY_PREFIXES: [&str; 4] = ["8\\", "48\\", "8/", "48/"];

/// Default recursion limit.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default color code used when nothing concrete is available.
pub const DEFAULT_COLOR: ColorId = 7;

/// What a render produced and what it had to work around.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Triangles written.
    pub triangles: usize,
    /// Object instantiations written.
    pub objects: usize,
    /// Procedural declarations written.
    pub declarations: usize,
    /// Singular placements that were corrected.
    pub singular_transforms: usize,
    /// Edge-color references below the top level.
    pub edge_color_misuse: usize,
    /// Color codes missing from the color table.
    pub unknown_colors: usize,
    /// References to parts the library does not have.
    pub missing_parts: usize,
    /// Procedural names with unusable parameters.
    pub rejected_primitives: usize,
    /// Sub-trees skipped at the recursion limit.
    pub depth_exceeded: usize,
    /// Parts that reference themselves, directly or through other parts.
    /// Each such part is counted once per pass.
    pub cycles: usize,
}

impl RenderReport {
    /// True if any placement had to be corrected.
    pub fn singular(&self) -> bool {
        self.singular_transforms > 0
    }

    /// Number of recoverable problems.
    pub fn warnings(&self) -> usize {
        self.singular_transforms
            + self.edge_color_misuse
            + self.unknown_colors
            + self.missing_parts
            + self.rejected_primitives
            + self.depth_exceeded
            + self.cycles
    }

    /// Add another report's counts to this one.
    pub fn merge(&mut self, other: &RenderReport) {
        self.triangles += other.triangles;
        self.objects += other.objects;
        self.declarations += other.declarations;
        self.singular_transforms += other.singular_transforms;
        self.edge_color_misuse += other.edge_color_misuse;
        self.unknown_colors += other.unknown_colors;
        self.missing_parts += other.missing_parts;
        self.rejected_primitives += other.rejected_primitives;
        self.depth_exceeded += other.depth_exceeded;
        self.cycles += other.cycles;
    }
}

/// Traversal limits and fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Deepest reference level that is still expanded.
    pub max_depth: usize,
    /// Color for inheriting selectors at the root and for unknown codes.
    pub fallback_color: ColorId,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            fallback_color: DEFAULT_COLOR,
        }
    }
}

/// Primitive file name of a reference: case-folded, family folder removed.
pub fn primitive_file_name(part: &str) -> String {
    let lower = part.trim().to_lowercase();
    for prefix in FAMILY_PREFIXES {
        if let Some(rest) = lower.strip_prefix(prefix) {
            return rest.to_string();
        }
    }
    lower
}

fn place(transform: &Transform, p: ldpov_ir::Vec3) -> Point3 {
    transform.apply_point(&Point3::new(p.x, p.y, p.z))
}

/// One flattening pass over part trees, writing into a scene.
pub struct Flattener<'a, W: Write> {
    library: &'a dyn PartLibrary,
    colors: &'a dyn ColorTable,
    registry: &'a mut PrimitiveRegistry,
    writer: &'a mut SceneWriter<W>,
    options: FlattenOptions,
    report: RenderReport,
    path: Vec<String>,
    cyclic: BTreeSet<String>,
}

impl<'a, W: Write> Flattener<'a, W> {
    /// Create a flattener over the given collaborators.
    pub fn new(
        library: &'a dyn PartLibrary,
        colors: &'a dyn ColorTable,
        registry: &'a mut PrimitiveRegistry,
        writer: &'a mut SceneWriter<W>,
        options: FlattenOptions,
    ) -> Self {
        Self {
            library,
            colors,
            registry,
            writer,
            options,
            report: RenderReport::default(),
            path: Vec::new(),
            cyclic: BTreeSet::new(),
        }
    }

    /// Counts so far.
    pub fn report(&self) -> &RenderReport {
        &self.report
    }

    /// Finish the pass and return its report.
    pub fn finish(self) -> RenderReport {
        self.report
    }

    /// Flatten `part` drawn in `color`, already placed by `transform`.
    pub fn render(
        &mut self,
        part: &Part,
        color: ColorId,
        transform: &Transform,
        invert: bool,
    ) -> Result<()> {
        self.render_part(part, color, transform, invert, 0)
    }

    /// Flatten a top-level instance placed in the frame `root`.
    ///
    /// Inheriting selectors at the top level resolve to the fallback color.
    pub fn render_instance(&mut self, instance: &PartInstance, root: &Transform) -> Result<()> {
        let color = match instance.color {
            ColorSelector::Concrete(id) => id,
            ColorSelector::Current | ColorSelector::Edge => self.options.fallback_color,
        };
        self.reference(instance, color, root, false, 0)
    }

    fn render_part(
        &mut self,
        part: &Part,
        color: ColorId,
        transform: &Transform,
        invert: bool,
        depth: usize,
    ) -> Result<()> {
        for primitive in &part.primitives {
            match primitive {
                Primitive::Triangle { color: selector, points } => {
                    let material = self.face_material(*selector, color);
                    let corners = points.map(|p| place(transform, p));
                    self.triangle(corners, &material, invert)?;
                }
                Primitive::Quad { color: selector, points } => {
                    let material = self.face_material(*selector, color);
                    let [a, b, c, d] = points.map(|p| place(transform, p));
                    self.triangle([a, b, c], &material, invert)?;
                    self.triangle([a, c, d], &material, invert)?;
                }
                Primitive::Reference(instance) => {
                    let local_color = match instance.color {
                        ColorSelector::Concrete(id) => id,
                        ColorSelector::Current => color,
                        ColorSelector::Edge => {
                            warn!(
                                "Edge color used for reference to {} inside {}",
                                instance.part, part.name
                            );
                            self.report.edge_color_misuse += 1;
                            color
                        }
                    };
                    self.reference(instance, local_color, transform, invert, depth + 1)?;
                }
                Primitive::Line { .. } | Primitive::AuxLine { .. } => {}
            }
        }
        Ok(())
    }

    fn reference(
        &mut self,
        instance: &PartInstance,
        color: ColorId,
        parent: &Transform,
        invert: bool,
        depth: usize,
    ) -> Result<()> {
        let mut local = Transform::from_ldraw(&instance.transform);
        if local.is_singular() {
            debug!("Singular placement of {}, correcting", instance.part);
            local = local.corrected();
            self.report.singular_transforms += 1;
        }
        let placed = local.compose(parent);

        let file_name = primitive_file_name(&instance.part);
        let available = match synthesize(&file_name, self.registry, self.writer)? {
            Synthesis::AlreadyAvailable => true,
            Synthesis::Generated => {
                self.report.declarations += 1;
                true
            }
            Synthesis::Rejected => {
                self.report.rejected_primitives += 1;
                false
            }
            Synthesis::NotProcedural => false,
        };
        if available {
            let material = self.material(color);
            self.writer
                .object(&declaration_name(&file_name), &placed, &material)?;
            self.report.objects += 1;
            return Ok(());
        }

        if depth > self.options.max_depth {
            warn!(
                "Reference to {} exceeds depth limit {}, skipped",
                instance.part, self.options.max_depth
            );
            self.report.depth_exceeded += 1;
            return Ok(());
        }
        let library = self.library;
        let Some(part) = library.part(&instance.part) else {
            warn!("Unknown part {}, skipped", instance.part);
            self.report.missing_parts += 1;
            return Ok(());
        };

        let key = normalize_part_name(&instance.part);
        if self.path.contains(&key) {
            if self.cyclic.insert(key) {
                warn!("Part {} references itself, skipped", instance.part);
                self.report.cycles += 1;
            }
            return Ok(());
        }

        let child_invert = instance.invert ^ invert ^ local.is_mirroring();
        self.path.push(key);
        let rendered = self.render_part(part, color, &placed, child_invert, depth);
        self.path.pop();
        rendered
    }

    fn face_material(&mut self, selector: ColorSelector, inherited: ColorId) -> String {
        match selector {
            ColorSelector::Concrete(id) => self.material(id),
            ColorSelector::Current | ColorSelector::Edge => self.material(inherited),
        }
    }

    fn material(&mut self, id: ColorId) -> String {
        if let Some(color) = self.colors.color(id) {
            return material_name(color);
        }
        warn!("Unknown color {}", id);
        self.report.unknown_colors += 1;
        match self.colors.color(self.options.fallback_color) {
            Some(fallback) => material_name(fallback),
            None => format!("Color_{}", id),
        }
    }

    fn triangle(&mut self, [a, b, c]: [Point3; 3], material: &str, invert: bool) -> Result<()> {
        let points = if invert { [a, c, b] } else { [a, b, c] };
        self.writer.triangle(&points, material)?;
        self.report.triangles += 1;
        Ok(())
    }
}
