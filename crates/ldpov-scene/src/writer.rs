//! POV-Ray scene text output.
//!
//! Pure formatting: numbers, vectors, placements and declarations are turned
//! into scene-language text without any decision logic. Output does not
//! depend on the process locale.

use std::io::{self, Write};

use ldpov_math::{Point3, Transform};

use crate::procedural::{Clip, ClippedSolid, Declaration, PlaneNormal, Solid};

/// Format a number with at most five decimals.
///
/// Trailing zeros (and a trailing decimal point) are dropped, and anything
/// that rounds to negative zero is written as `0`.
pub fn fmt_num(n: f64) -> String {
    let s = format!("{:.5}", n);
    if s == "-0.00000" {
        return "0".to_string();
    }
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Format a point as `<x,y,z>`.
pub fn fmt_point(p: &Point3) -> String {
    format!("<{},{},{}>", fmt_num(p.x), fmt_num(p.y), fmt_num(p.z))
}

/// Format the twelve numbers of a `matrix` modifier, grouped per axis.
pub fn fmt_matrix(t: &Transform) -> String {
    let m = t.pov_matrix();
    let n: Vec<String> = m.iter().map(|v| fmt_num(*v)).collect();
    format!(
        "<{},{},{}, {},{},{}, {},{},{}, {},{},{}>",
        n[0], n[1], n[2], n[3], n[4], n[5], n[6], n[7], n[8], n[9], n[10], n[11]
    )
}

fn fmt_solid(solid: &Solid) -> String {
    match solid {
        Solid::Cylinder => "cylinder { <0,0,0>, <0,1,0>, 1 open }".to_string(),
        Solid::Disc => "disc { <0,0,0>, <0,1,0>, 1 }".to_string(),
        Solid::Ring { inner } => {
            format!("disc {{ <0,0,0>, <0,1,0>, {}, {} }}", inner + 1, inner)
        }
        Solid::Cone { top } => {
            format!("cone {{ <0,0,0>, {}, <0,1,0>, {} open }}", top + 1, top)
        }
        Solid::Torus { minor } => format!("torus {{ 1, {} hollow }}", fmt_num(*minor)),
    }
}

fn fmt_normal(normal: &PlaneNormal) -> String {
    match normal {
        PlaneNormal::NegY => "-y".to_string(),
        PlaneNormal::Z => "z".to_string(),
        PlaneNormal::NegZ => "-z".to_string(),
        PlaneNormal::Sector(_) => {
            let d = normal.direction();
            format!("<{},0,{}>", fmt_num(d.x), fmt_num(d.z))
        }
    }
}

fn fmt_clip(clip: &Clip) -> String {
    match clip {
        Clip::Plane(normal) => format!("plane {{ {}, 0 }}", fmt_normal(normal)),
        Clip::UnitCylinder { inverse: false } => "cylinder { <0,-1,0>, <0,1,0>, 1 }".to_string(),
        Clip::UnitCylinder { inverse: true } => {
            "cylinder { <0,-1,0>, <0,1,0>, 1 inverse }".to_string()
        }
    }
}

/// Streams scene statements to an output.
pub struct SceneWriter<W: Write> {
    out: W,
}

impl<W: Write> SceneWriter<W> {
    /// Wrap an output stream.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Flush and return the underlying stream.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Write text verbatim.
    pub fn raw(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())
    }

    /// Write a single-line `//` comment.
    pub fn comment(&mut self, text: &str) -> io::Result<()> {
        let single_line = text.replace(['\n', '\r'], " ");
        writeln!(self.out, "// {}", single_line)
    }

    /// Write a triangle in the given material.
    pub fn triangle(&mut self, points: &[Point3; 3], material: &str) -> io::Result<()> {
        writeln!(self.out, "triangle {{")?;
        writeln!(
            self.out,
            "  {}, {}, {}",
            fmt_point(&points[0]),
            fmt_point(&points[1]),
            fmt_point(&points[2])
        )?;
        writeln!(self.out, "  material {{ {} }}", material)?;
        writeln!(self.out, "}}")?;
        writeln!(self.out)
    }

    /// Write an instantiation of a declared object.
    pub fn object(&mut self, name: &str, transform: &Transform, material: &str) -> io::Result<()> {
        writeln!(self.out, "object {{ {}", name)?;
        writeln!(self.out, "  matrix {}", fmt_matrix(transform))?;
        writeln!(self.out, "  material {{ {} }}", material)?;
        writeln!(self.out, "}}")?;
        writeln!(self.out)
    }

    /// Write a `#declare` block for a procedural primitive.
    pub fn declaration(&mut self, name: &str, decl: &Declaration) -> io::Result<()> {
        match decl.parts.as_slice() {
            [single] => {
                writeln!(self.out, "#declare {}=object {{", name)?;
                self.clipped_solid(single, "  ")?;
            }
            parts => {
                writeln!(self.out, "#declare {}=union {{", name)?;
                for part in parts {
                    writeln!(self.out, "  object {{")?;
                    self.clipped_solid(part, "    ")?;
                    writeln!(self.out, "  }}")?;
                }
            }
        }
        writeln!(self.out, "}}")?;
        writeln!(self.out)
    }

    fn clipped_solid(&mut self, part: &ClippedSolid, indent: &str) -> io::Result<()> {
        writeln!(self.out, "{}{}", indent, fmt_solid(&part.solid))?;
        if part.clips.is_empty() {
            return Ok(());
        }
        writeln!(self.out, "{}clipped_by {{", indent)?;
        for clip in &part.clips {
            writeln!(self.out, "{}  {}", indent, fmt_clip(clip))?;
        }
        writeln!(self.out, "{}}}", indent)
    }
}
