//! Material include generated from the color table.

use std::io::Write;

use ldpov_ir::{Color, ColorTable, MaterialKind};

use crate::error::Result;
use crate::writer::fmt_num;

/// First line of the generated include.
pub const MATERIALS_BANNER: &str = "// LDraw to POV-Ray colors and materials (generated)";

/// Scene identifier of a color's material.
///
/// Characters that cannot appear in a scene identifier become `_`.
pub fn material_name(color: &Color) -> String {
    let name: String = color
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.starts_with(|c: char| c.is_ascii_digit()) || name.is_empty() {
        format!("Color_{}", name)
    } else {
        name
    }
}

fn channel(value: u8, boost: f64) -> String {
    fmt_num(f64::from(value) / 255.0 * boost)
}

fn rgb(color: &Color) -> String {
    let [r, g, b, _] = color.rgba;
    format!("rgb <{},{},{}>", channel(r, 1.0), channel(g, 1.0), channel(b, 1.0))
}

fn rgbf(color: &Color, boost: f64, filter: f64) -> String {
    let [r, g, b, _] = color.rgba;
    format!(
        "rgbf <{},{},{},{}>",
        channel(r, boost),
        channel(g, boost),
        channel(b, boost),
        fmt_num(filter)
    )
}

fn alpha_filter(color: &Color) -> f64 {
    1.0 - f64::from(color.rgba[3]) / 255.0
}

/// Filter and brightness boost for a transparent color, by luminance.
pub fn transparent_tuning(color: &Color) -> (f64, f64) {
    let [r, g, b, _] = color.rgba.map(f64::from);
    let luminance = (r * 0.21 + g * 0.71 + b * 0.07) / 255.0;
    if luminance < 0.2 {
        (1.0, 1.4)
    } else if luminance < 0.4 {
        (1.0, 1.2)
    } else if luminance > 0.8 {
        (0.8, 1.0)
    } else {
        (0.9, 1.0)
    }
}

/// The `#declare` line of one color's material.
pub fn material_declaration(color: &Color) -> String {
    let (pigment, finish, interior) = match color.kind {
        MaterialKind::Rubber if color.is_opaque() => (rgb(color), "RUBBER", false),
        MaterialKind::Rubber => (rgbf(color, 1.0, alpha_filter(color)), "RUBBER", false),
        MaterialKind::Chrome => (rgb(color), "CHROME", false),
        MaterialKind::Metal => (rgb(color), "METAL", false),
        MaterialKind::Pearl => (rgb(color), "PEARL", false),
        MaterialKind::Solid => (rgb(color), "SOLID", false),
        MaterialKind::Transparent => {
            let (filter, boost) = transparent_tuning(color);
            (rgbf(color, boost, filter), "TRANSPARENT", true)
        }
        MaterialKind::Internal
        | MaterialKind::UserDefined
        | MaterialKind::Glitter
        | MaterialKind::Milky => {
            if color.is_opaque() {
                (rgb(color), "SOLID", false)
            } else {
                (rgbf(color, 1.0, alpha_filter(color)), "TRANSPARENT", true)
            }
        }
    };
    let interior = if interior {
        " interior { INTERIOR_TRANS }"
    } else {
        ""
    };
    format!(
        "#declare {}=material {{ texture {{ pigment {{ {} }} finish {{ {} }} }}{} }}",
        material_name(color),
        pigment,
        finish,
        interior
    )
}

/// Write the material include for every color, sorted by code.
pub fn write_materials<W: Write>(colors: &dyn ColorTable, mut out: W) -> Result<()> {
    let mut all = colors.all_colors();
    all.sort_by_key(|c| c.id);
    writeln!(out, "{}", MATERIALS_BANNER)?;
    writeln!(out)?;
    for color in all {
        writeln!(out, "// LDraw {} color ID {}", color.kind.label(), color.id)?;
        writeln!(out, "{}", material_declaration(color))?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldpov_ir::Document;

    fn color(id: u32, name: &str, rgba: [u8; 4], kind: MaterialKind) -> Color {
        Color {
            id,
            name: name.into(),
            rgba,
            kind,
        }
    }

    #[test]
    fn test_material_name_sanitized() {
        let c = color(1, "Trans-Clear", [0; 4], MaterialKind::Transparent);
        assert_eq!(material_name(&c), "Trans_Clear");
        let c = color(2, "3D_Gray", [0; 4], MaterialKind::Solid);
        assert_eq!(material_name(&c), "Color_3D_Gray");
    }

    #[test]
    fn test_solid_declaration() {
        let c = color(15, "White", [255, 255, 255, 255], MaterialKind::Solid);
        assert_eq!(
            material_declaration(&c),
            "#declare White=material { texture { pigment { rgb <1,1,1> } finish { SOLID } } }"
        );
    }

    #[test]
    fn test_rubber_translucent_uses_filter() {
        let c = color(256, "Rubber_Clear", [255, 0, 0, 51], MaterialKind::Rubber);
        let decl = material_declaration(&c);
        assert!(decl.contains("rgbf <1,0,0,0.8>"));
        assert!(decl.contains("finish { RUBBER }"));
        assert!(!decl.contains("interior"));
    }

    #[test]
    fn test_transparent_luminance_bands() {
        let dark = color(40, "Trans_Black", [10, 10, 10, 128], MaterialKind::Transparent);
        assert_eq!(transparent_tuning(&dark), (1.0, 1.4));
        let mid = color(41, "Trans_Mid", [80, 80, 80, 128], MaterialKind::Transparent);
        assert_eq!(transparent_tuning(&mid), (1.0, 1.2));
        let light = color(47, "Trans_Clear", [252, 252, 252, 128], MaterialKind::Transparent);
        assert_eq!(transparent_tuning(&light), (0.8, 1.0));
        let other = color(46, "Trans_Yellow", [160, 160, 160, 128], MaterialKind::Transparent);
        assert_eq!(transparent_tuning(&other), (0.9, 1.0));

        let decl = material_declaration(&dark);
        assert!(decl.contains("rgbf <0.0549,0.0549,0.0549,1>"));
        assert!(decl.ends_with("interior { INTERIOR_TRANS } }"));
    }

    #[test]
    fn test_write_materials_sorted() {
        let mut d = Document::new();
        d.colors = vec![
            color(4, "Red", [201, 26, 9, 255], MaterialKind::Solid),
            color(0, "Black", [5, 19, 29, 255], MaterialKind::Solid),
            color(383, "Chrome_Silver", [224, 224, 224, 255], MaterialKind::Chrome),
        ];
        let mut out = Vec::new();
        write_materials(&d, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(MATERIALS_BANNER));
        let black = text.find("#declare Black=").unwrap();
        let red = text.find("#declare Red=").unwrap();
        let chrome = text.find("#declare Chrome_Silver=").unwrap();
        assert!(black < red && red < chrome);
        assert!(text.contains("// LDraw Chrome color ID 383\n"));
        assert!(text.contains("finish { CHROME }"));
    }
}
