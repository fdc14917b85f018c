//! Model description for the ldpov scene converter.
//!
//! This crate defines the part/color data that the flattener consumes: part
//! definitions made of geometric primitives, part instances placed with a
//! local transform, and the color table. It is purely declarative; reading
//! LDraw files is left to whatever part library fills these structures.
//!
//! The [`PartLibrary`] and [`ColorTable`] traits are the seams the flattener
//! looks parts and colors up through. [`Document`] is the JSON interchange
//! form and implements both.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Numeric LDraw color code.
pub type ColorId = u32;

/// LDraw code meaning "inherit the invoking context's color".
pub const CURRENT_COLOR_CODE: ColorId = 16;

/// LDraw code meaning "use the invoking context's edge color".
pub const EDGE_COLOR_CODE: ColorId = 24;

/// 3D vector with f64 components (LDraw units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// Create a new Vec3.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Which color a primitive or instance is drawn with.
///
/// Serialized as the plain LDraw code: 16 and 24 are the two inheriting
/// selectors, every other code is a concrete color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum ColorSelector {
    /// A concrete color from the color table.
    Concrete(ColorId),
    /// Inherit the color of the invoking context.
    Current,
    /// Inherit the edge color of the invoking context.
    Edge,
}

impl From<u32> for ColorSelector {
    fn from(code: u32) -> Self {
        match code {
            CURRENT_COLOR_CODE => ColorSelector::Current,
            EDGE_COLOR_CODE => ColorSelector::Edge,
            id => ColorSelector::Concrete(id),
        }
    }
}

impl From<ColorSelector> for u32 {
    fn from(selector: ColorSelector) -> Self {
        match selector {
            ColorSelector::Concrete(id) => id,
            ColorSelector::Current => CURRENT_COLOR_CODE,
            ColorSelector::Edge => EDGE_COLOR_CODE,
        }
    }
}

/// Surface family of a color, selecting the material template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MaterialKind {
    /// Opaque ABS plastic.
    #[default]
    Solid,
    /// Transparent polycarbonate.
    Transparent,
    /// Chrome plating.
    Chrome,
    /// Metallic paint.
    Metal,
    /// Pearlescent paint.
    Pearl,
    /// Rubber (tyres, bands).
    Rubber,
    /// Glitter-filled transparent plastic.
    Glitter,
    /// Milky / glow-in-the-dark plastic.
    Milky,
    /// Internal-use colors.
    Internal,
    /// Colors added by the user.
    UserDefined,
}

impl MaterialKind {
    /// Human-readable kind name used in generated comments.
    pub fn label(&self) -> &'static str {
        match self {
            MaterialKind::Solid => "Solid",
            MaterialKind::Transparent => "Transparent",
            MaterialKind::Chrome => "Chrome",
            MaterialKind::Metal => "Metal",
            MaterialKind::Pearl => "Pearl",
            MaterialKind::Rubber => "Rubber",
            MaterialKind::Glitter => "Glitter",
            MaterialKind::Milky => "Milky",
            MaterialKind::Internal => "Internal",
            MaterialKind::UserDefined => "UserDefined",
        }
    }
}

/// A color table entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// LDraw color code.
    pub id: ColorId,
    /// Name, also used as the scene material identifier (e.g. "Black").
    pub name: String,
    /// Base color as `[r, g, b, a]`.
    pub rgba: [u8; 4],
    /// Material family.
    #[serde(default)]
    pub kind: MaterialKind,
}

impl Color {
    /// True when alpha is fully opaque.
    pub fn is_opaque(&self) -> bool {
        self.rgba[3] == u8::MAX
    }
}

/// A placement of one part inside another (or at the top of a model).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartInstance {
    /// Referenced part file name, e.g. `"3001.dat"` or `"48\\4-4cyli.dat"`.
    pub part: String,
    /// Local placement as the twelve LDraw numbers `x y z a b c d e f g h i`.
    pub transform: [f64; 12],
    /// Color of the instance.
    pub color: ColorSelector,
    /// Whether the instance's winding is flipped (LDraw `INVERTNEXT`).
    #[serde(default)]
    pub invert: bool,
}

impl PartInstance {
    /// Identity placement of `part` with the given color.
    pub fn new(part: impl Into<String>, color: ColorSelector) -> Self {
        Self {
            part: part.into(),
            transform: IDENTITY_PLACEMENT,
            color,
            invert: false,
        }
    }

    /// Same instance with another placement.
    pub fn with_transform(mut self, transform: [f64; 12]) -> Self {
        self.transform = transform;
        self
    }

    /// Same instance with the winding flag set.
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }
}

/// LDraw numbers of the identity placement.
pub const IDENTITY_PLACEMENT: [f64; 12] = [
    0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0,
];

/// One geometric primitive of a part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Primitive {
    /// Edge line (not rendered as solid geometry).
    Line {
        /// Color.
        color: ColorSelector,
        /// End points.
        points: [Vec3; 2],
    },
    /// Filled triangle.
    Triangle {
        /// Color.
        color: ColorSelector,
        /// Corners in winding order.
        points: [Vec3; 3],
    },
    /// Filled planar quadrilateral.
    Quad {
        /// Color.
        color: ColorSelector,
        /// Corners in winding order.
        points: [Vec3; 4],
    },
    /// Conditional (optional) line: two end points and two control points.
    AuxLine {
        /// Color.
        color: ColorSelector,
        /// End points followed by control points.
        points: [Vec3; 4],
    },
    /// Sub-part reference.
    Reference(PartInstance),
}

/// A reusable part definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Part {
    /// Part file name.
    pub name: String,
    /// Primitives in file order.
    pub primitives: Vec<Primitive>,
}

impl Part {
    /// Create an empty part.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primitives: Vec::new(),
        }
    }

    /// Append a primitive (builder style).
    pub fn with(mut self, primitive: Primitive) -> Self {
        self.primitives.push(primitive);
        self
    }
}

/// Source of part definitions.
pub trait PartLibrary {
    /// Look up a part by file name.
    fn part(&self, name: &str) -> Option<&Part>;
}

/// Source of color definitions.
pub trait ColorTable {
    /// Look up a color by code.
    fn color(&self, id: ColorId) -> Option<&Color>;

    /// All colors, in no particular order.
    fn all_colors(&self) -> Vec<&Color>;
}

/// Normalize a part file name for lookup: lowercase, `/` as `\`.
pub fn normalize_part_name(name: &str) -> String {
    name.trim().to_lowercase().replace('/', "\\")
}

/// An ldpov document: colors, part definitions and the top-level model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Format version string.
    pub version: String,
    /// Color table.
    #[serde(default)]
    pub colors: Vec<Color>,
    /// Part definitions keyed by file name.
    #[serde(default)]
    pub parts: HashMap<String, Part>,
    /// Top-level instances of the model.
    #[serde(default)]
    pub model: Vec<PartInstance>,
    /// Normalized part name to key in `parts`.
    #[serde(skip)]
    part_index: HashMap<String, String>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            colors: Vec::new(),
            parts: HashMap::new(),
            model: Vec::new(),
            part_index: HashMap::new(),
        }
    }
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a part definition under its own name.
    pub fn insert_part(&mut self, part: Part) {
        self.part_index
            .insert(normalize_part_name(&part.name), part.name.clone());
        self.parts.insert(part.name.clone(), part);
    }

    /// Rebuild the case- and separator-tolerant name index.
    ///
    /// Needed only after editing `parts` directly; [`Document::insert_part`]
    /// and [`Document::from_json`] keep the index current.
    pub fn reindex(&mut self) {
        self.part_index = self
            .parts
            .keys()
            .map(|k| (normalize_part_name(k), k.clone()))
            .collect();
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut doc: Document = serde_json::from_str(json)?;
        doc.reindex();
        Ok(doc)
    }
}

impl PartLibrary for Document {
    fn part(&self, name: &str) -> Option<&Part> {
        if let Some(part) = self.parts.get(name) {
            return Some(part);
        }
        let key = self.part_index.get(&normalize_part_name(name))?;
        self.parts.get(key)
    }
}

impl ColorTable for Document {
    fn color(&self, id: ColorId) -> Option<&Color> {
        self.colors.iter().find(|c| c.id == id)
    }

    fn all_colors(&self) -> Vec<&Color> {
        self.colors.iter().collect()
    }
}
