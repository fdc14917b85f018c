//! Procedural primitives synthesized from their file names.
//!
//! LDraw encodes partial-revolution primitives in structured names:
//!
//! - `1-4cyli.dat` / `3-8cylo.dat`: a fraction of an open unit cylinder
//! - `1-4disc.dat`: a fraction of a unit disc
//! - `1-4ring3.dat`: a fraction of a ring between radius 3 and 4
//! - `1-4con2.dat`: a fraction of a cone from radius 3 down to 2
//! - `t04o0625.dat`: a quarter torus, outer half, minor radius 0.0625
//!
//! When such a primitive is neither in the pre-declared manifest nor already
//! generated, it is declared once as a clipped POV-Ray solid and afterwards
//! instantiated like any other library object.

use std::f64::consts::PI;
use std::io::Write;

use ldpov_math::Vec3;
use log::{debug, warn};

use crate::error::Result;
use crate::registry::PrimitiveRegistry;
use crate::writer::SceneWriter;

/// Namespace prefix of every declared primitive object.
pub const DECLARE_PREFIX: &str = "LD";

const RING_KINDS: [&str; 4] = ["ring", "rin", "ri", "r"];
const CONE_KINDS: [&str; 2] = ["con", "co"];

/// What a primitive file name encodes.
#[derive(Debug, Clone, PartialEq)]
pub enum ProceduralShape {
    /// `<fraction>-<total><ring kind><radius>.dat`
    Ring {
        /// Segments present.
        fraction: u32,
        /// Segments of a full revolution.
        total: u32,
        /// Inner radius.
        radius: u32,
    },
    /// `<fraction>-<total><cone kind><radius>.dat`
    Cone {
        /// Segments present.
        fraction: u32,
        /// Segments of a full revolution.
        total: u32,
        /// Top radius.
        radius: u32,
    },
    /// `<fraction>-<total>cyli.dat` or `cylo`, optionally followed by `2`.
    Cylinder {
        /// Segments present.
        fraction: u32,
        /// Segments of a full revolution.
        total: u32,
    },
    /// `<fraction>-<total>disc.dat`
    Disc {
        /// Segments present.
        fraction: u32,
        /// Segments of a full revolution.
        total: u32,
    },
    /// `t<nn><variant><mmmm>.dat`: a `1/nn` torus with minor radius `mmmm/10000`.
    Torus {
        /// Denominator of the revolution fraction.
        fraction: u32,
        /// Variant letter (`i`, `o` and `q` are supported).
        variant: char,
        /// Minor radius (major radius is 1).
        minor_radius: f64,
    },
    /// Not a procedural primitive name.
    Unrecognized,
}

/// Base solid of a procedural primitive, in unit primitive space.
#[derive(Debug, Clone, PartialEq)]
pub enum Solid {
    /// Open cylinder of radius 1 from y=0 to y=1.
    Cylinder,
    /// Disc of radius 1 in the y=0 plane.
    Disc,
    /// Annulus between `inner` and `inner + 1`.
    Ring {
        /// Inner radius.
        inner: u32,
    },
    /// Open cone from radius `top + 1` at y=0 to `top` at y=1.
    Cone {
        /// Top radius.
        top: u32,
    },
    /// Hollow torus with major radius 1.
    Torus {
        /// Minor radius.
        minor: f64,
    },
}

/// Orientation of a clipping half-plane through the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaneNormal {
    /// `-y`
    NegY,
    /// `+z`
    Z,
    /// `-z`
    NegZ,
    /// `<cos θ, 0, sin θ>`, closing a sector that ends at angle `θ - π/2`.
    Sector(f64),
}

impl PlaneNormal {
    /// Normal direction as a vector.
    pub fn direction(&self) -> Vec3 {
        match self {
            PlaneNormal::NegY => -Vec3::y(),
            PlaneNormal::Z => Vec3::z(),
            PlaneNormal::NegZ => -Vec3::z(),
            PlaneNormal::Sector(angle) => Vec3::new(angle.cos(), 0.0, angle.sin()),
        }
    }
}

/// A clipping object in a `clipped_by` block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clip {
    /// Half-space below a plane through the origin.
    Plane(PlaneNormal),
    /// The unit cylinder around Y (or its complement when `inverse`).
    UnitCylinder {
        /// Keep the outside instead of the inside.
        inverse: bool,
    },
}

/// A solid with its clipping objects.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippedSolid {
    /// Base solid.
    pub solid: Solid,
    /// Clipping objects, in output order.
    pub clips: Vec<Clip>,
}

/// Geometry of one `#declare`: a single object, or a union of several.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// One entry per object; more than one is written as a union.
    pub parts: Vec<ClippedSolid>,
}

impl Declaration {
    /// A declaration made of one clipped solid.
    pub fn single(solid: Solid, clips: Vec<Clip>) -> Self {
        Self {
            parts: vec![ClippedSolid { solid, clips }],
        }
    }

    /// True when the declaration is a union of several objects.
    pub fn is_union(&self) -> bool {
        self.parts.len() > 1
    }
}

/// Outcome of a synthesis attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synthesis {
    /// A new declaration was written and the name registered.
    Generated,
    /// The name was already known or generated; nothing written.
    AlreadyAvailable,
    /// Not a procedural primitive name.
    NotProcedural,
    /// A procedural name whose parameters cannot be generated (logged).
    Rejected,
}

impl Synthesis {
    /// True when the primitive can now be instantiated by name.
    pub fn is_available(&self) -> bool {
        matches!(self, Synthesis::Generated | Synthesis::AlreadyAvailable)
    }
}

/// Scene object name of a primitive file: extension stripped, uppercased,
/// `-` replaced by `_`, prefixed with [`DECLARE_PREFIX`].
pub fn declaration_name(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(dot) => &file_name[..dot],
        None => file_name,
    };
    format!("{}{}", DECLARE_PREFIX, stem.to_uppercase().replace('-', "_"))
}

/// Small cursor over an ASCII name.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| !pred(*c))
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        head
    }

    fn number(&mut self) -> Option<u32> {
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            return None;
        }
        digits.parse().ok()
    }

    fn fixed_digits(&mut self, count: usize) -> Option<u32> {
        let digits = self.rest.get(..count)?;
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        self.rest = &self.rest[count..];
        digits.parse().ok()
    }

    fn eat(&mut self, prefix: &str) -> bool {
        match self.rest.strip_prefix(prefix) {
            Some(tail) => {
                self.rest = tail;
                true
            }
            None => false,
        }
    }

    fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }
}

fn parse_sector(stem: &str) -> Option<ProceduralShape> {
    let mut cur = Cursor::new(stem);
    let fraction = cur.number()?;
    if !cur.eat("-") {
        return None;
    }
    let total = cur.number()?;

    match cur.rest {
        "cyli" | "cylo" | "cyli2" | "cylo2" => {
            return Some(ProceduralShape::Cylinder { fraction, total });
        }
        "disc" => return Some(ProceduralShape::Disc { fraction, total }),
        _ => {}
    }

    let kind = cur.take_while(|c| c.is_ascii_lowercase());
    let radius = cur.number()?;
    if kind.is_empty() || !cur.is_empty() {
        return None;
    }
    if RING_KINDS.contains(&kind) {
        Some(ProceduralShape::Ring {
            fraction,
            total,
            radius,
        })
    } else if CONE_KINDS.contains(&kind) {
        Some(ProceduralShape::Cone {
            fraction,
            total,
            radius,
        })
    } else {
        None
    }
}

fn parse_torus(stem: &str) -> Option<ProceduralShape> {
    let mut cur = Cursor::new(stem);
    if !cur.eat("t") {
        return None;
    }
    let fraction = cur.fixed_digits(2)?;
    let variant = cur.rest.chars().next().filter(|c| c.is_ascii_lowercase())?;
    cur.rest = &cur.rest[variant.len_utf8()..];
    let minor = cur.fixed_digits(4)?;
    if !cur.is_empty() {
        return None;
    }
    Some(ProceduralShape::Torus {
        fraction,
        variant,
        minor_radius: f64::from(minor) / 10000.0,
    })
}

/// Classify a primitive file name (case-insensitive, `.dat` required).
pub fn classify(file_name: &str) -> ProceduralShape {
    let lower = file_name.to_ascii_lowercase();
    let Some(stem) = lower.strip_suffix(".dat") else {
        return ProceduralShape::Unrecognized;
    };
    parse_sector(stem)
        .or_else(|| parse_torus(stem))
        .unwrap_or(ProceduralShape::Unrecognized)
}

/// Angle of the closing clip plane for `fraction/total` of a revolution.
pub fn sector_angle(fraction: u32, total: u32) -> f64 {
    PI * 2.0 * f64::from(fraction) / f64::from(total) + PI / 2.0
}

/// Declaration of `fraction/total` of a revolution of `solid`.
///
/// The split uses the truncating ratio `total / fraction`: a ratio of two or
/// more is one sector of at most half a turn, cut by two planes; a full
/// revolution is the bare solid; anything in between is more than half a
/// turn, which two planes cannot cut out, so it becomes a union of two
/// halves.
pub fn sector_declaration(solid: Solid, fraction: u32, total: u32) -> Option<Declaration> {
    if fraction == 0 || total == 0 || fraction > total {
        return None;
    }
    let angle = sector_angle(fraction, total);
    if total / fraction >= 2 {
        Some(Declaration::single(
            solid,
            vec![
                Clip::Plane(PlaneNormal::NegZ),
                Clip::Plane(PlaneNormal::Sector(angle)),
            ],
        ))
    } else if total == fraction {
        Some(Declaration::single(solid, vec![]))
    } else {
        Some(Declaration {
            parts: vec![
                ClippedSolid {
                    solid: solid.clone(),
                    clips: vec![Clip::Plane(PlaneNormal::NegZ)],
                },
                ClippedSolid {
                    solid,
                    clips: vec![
                        Clip::Plane(PlaneNormal::Z),
                        Clip::Plane(PlaneNormal::Sector(angle)),
                    ],
                },
            ],
        })
    }
}

/// Declaration of a `1/fraction` torus segment.
pub fn torus_declaration(fraction: u32, variant: char, minor: f64) -> Option<Declaration> {
    let solid = Solid::Torus { minor };
    let tube = |inverse| Clip::UnitCylinder { inverse };
    let clips = if fraction >= 2 {
        let sector = Clip::Plane(PlaneNormal::Sector(PI * 2.0 / f64::from(fraction) + PI / 2.0));
        let neg_y = Clip::Plane(PlaneNormal::NegY);
        let neg_z = Clip::Plane(PlaneNormal::NegZ);
        match variant {
            'i' => vec![neg_y, sector, neg_z, tube(false)],
            'o' => vec![neg_y, sector, neg_z, tube(true)],
            'q' => vec![sector, neg_z],
            _ => return None,
        }
    } else if fraction == 1 {
        match variant {
            'i' => vec![Clip::Plane(PlaneNormal::NegY), tube(false)],
            'o' => vec![Clip::Plane(PlaneNormal::NegY), tube(true)],
            'q' => vec![],
            _ => return None,
        }
    } else {
        return None;
    };
    Some(Declaration::single(solid, clips))
}

/// Geometry for a classified name, or `None` when the parameters are
/// unusable (zero segments, unsupported torus variant, ...).
pub fn build_declaration(shape: &ProceduralShape) -> Option<Declaration> {
    match *shape {
        ProceduralShape::Ring {
            fraction,
            total,
            radius,
        } => sector_declaration(Solid::Ring { inner: radius }, fraction, total),
        ProceduralShape::Cone {
            fraction,
            total,
            radius,
        } => sector_declaration(Solid::Cone { top: radius }, fraction, total),
        ProceduralShape::Cylinder { fraction, total } => {
            sector_declaration(Solid::Cylinder, fraction, total)
        }
        ProceduralShape::Disc { fraction, total } => {
            sector_declaration(Solid::Disc, fraction, total)
        }
        ProceduralShape::Torus {
            fraction,
            variant,
            minor_radius,
        } => torus_declaration(fraction, variant, minor_radius),
        ProceduralShape::Unrecognized => None,
    }
}

/// Make the primitive `file_name` available in the scene.
///
/// `file_name` must already be case-folded with any family folder stripped
/// (see [`crate::flatten::primitive_file_name`]). Writes at most one
/// declaration and registers the name when it does.
pub fn synthesize<W: Write>(
    file_name: &str,
    registry: &mut PrimitiveRegistry,
    writer: &mut SceneWriter<W>,
) -> Result<Synthesis> {
    if registry.is_available(file_name) {
        return Ok(Synthesis::AlreadyAvailable);
    }

    let shape = classify(file_name);
    if shape == ProceduralShape::Unrecognized {
        return Ok(Synthesis::NotProcedural);
    }

    let Some(decl) = build_declaration(&shape) else {
        warn!("Undefined primitive {} ({:?})", file_name, shape);
        return Ok(Synthesis::Rejected);
    };

    let name = declaration_name(file_name);
    writer.declaration(&name, &decl)?;
    registry.mark_generated(file_name);
    debug!("Generated primitive {} as {}", file_name, name);
    Ok(Synthesis::Generated)
}
