use ldpov_ir::{
    Color, ColorSelector, Document, MaterialKind, Part, PartInstance, Primitive, Vec3,
};
use ldpov_math::Transform;
use ldpov_scene::{
    synthesize, FlattenOptions, Flattener, PovRenderer, PrimitiveRegistry, RenderConfig,
    RenderReport, SceneWriter, Synthesis,
};

const MIRROR_X: [f64; 12] = [0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
const FLAT_Y: [f64; 12] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0];

fn colors() -> Vec<Color> {
    vec![
        Color {
            id: 0,
            name: "Black".into(),
            rgba: [5, 19, 29, 255],
            kind: MaterialKind::Solid,
        },
        Color {
            id: 4,
            name: "Red".into(),
            rgba: [201, 26, 9, 255],
            kind: MaterialKind::Solid,
        },
        Color {
            id: 7,
            name: "Light_Gray".into(),
            rgba: [155, 161, 157, 255],
            kind: MaterialKind::Solid,
        },
    ]
}

fn document() -> Document {
    let mut doc = Document::new();
    doc.colors = colors();
    doc
}

fn triangle() -> Primitive {
    Primitive::Triangle {
        color: ColorSelector::Current,
        points: [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
    }
}

fn reference(part: &str) -> Primitive {
    Primitive::Reference(PartInstance::new(part, ColorSelector::Current))
}

fn flatten(doc: &Document, root: &Part, color: u32) -> (String, RenderReport) {
    let mut registry = PrimitiveRegistry::new();
    let mut writer = SceneWriter::new(Vec::new());
    let mut flattener =
        Flattener::new(doc, doc, &mut registry, &mut writer, FlattenOptions::default());
    flattener
        .render(root, color, &Transform::identity(), false)
        .unwrap();
    let report = flattener.finish();
    let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    (text, report)
}

#[test]
fn current_color_three_levels_deep_resolves_to_root() {
    let mut doc = document();
    doc.insert_part(Part::new("c.dat").with(triangle()));
    doc.insert_part(Part::new("b.dat").with(reference("c.dat")));
    doc.insert_part(Part::new("a.dat").with(reference("b.dat")));
    let root = Part::new("root.dat").with(reference("a.dat"));

    let (text, report) = flatten(&doc, &root, 4);
    assert_eq!(report.triangles, 1);
    assert_eq!(report.warnings(), 0);
    assert!(text.contains("material { Red }"));
}

#[test]
fn concrete_color_overrides_inherited_below_it() {
    let mut doc = document();
    doc.insert_part(Part::new("leaf.dat").with(triangle()));
    doc.insert_part(Part::new("mid.dat").with(Primitive::Reference(PartInstance::new(
        "leaf.dat",
        ColorSelector::Concrete(0),
    ))));
    let root = Part::new("root.dat").with(reference("mid.dat"));

    let (text, _) = flatten(&doc, &root, 4);
    assert!(text.contains("material { Black }"));
    assert!(!text.contains("Red"));
}

#[test]
fn odd_mirror_count_flips_winding() {
    let mut doc = document();
    doc.insert_part(Part::new("leaf.dat").with(triangle()));
    let root = Part::new("root.dat").with(Primitive::Reference(
        PartInstance::new("leaf.dat", ColorSelector::Current).with_transform(MIRROR_X),
    ));

    let (text, _) = flatten(&doc, &root, 4);
    assert!(text.contains("<0,0,0>, <0,1,0>, <-1,0,0>"));
}

#[test]
fn even_mirror_count_restores_winding() {
    let mut doc = document();
    doc.insert_part(Part::new("leaf.dat").with(triangle()));
    doc.insert_part(Part::new("mid.dat").with(Primitive::Reference(
        PartInstance::new("leaf.dat", ColorSelector::Current).with_transform(MIRROR_X),
    )));
    let root = Part::new("root.dat").with(Primitive::Reference(
        PartInstance::new("mid.dat", ColorSelector::Current).with_transform(MIRROR_X),
    ));

    let (text, _) = flatten(&doc, &root, 4);
    assert!(text.contains("<0,0,0>, <1,0,0>, <0,1,0>"));
}

#[test]
fn invert_flag_cancels_a_mirror() {
    let mut doc = document();
    doc.insert_part(Part::new("leaf.dat").with(triangle()));
    let root = Part::new("root.dat").with(Primitive::Reference(
        PartInstance::new("leaf.dat", ColorSelector::Current)
            .with_transform(MIRROR_X)
            .inverted(),
    ));

    let (text, _) = flatten(&doc, &root, 4);
    assert!(text.contains("<0,0,0>, <-1,0,0>, <0,1,0>"));
}

#[test]
fn singular_reference_still_emits_geometry() {
    let mut doc = document();
    doc.insert_part(Part::new("leaf.dat").with(triangle()));
    let flat = Primitive::Reference(
        PartInstance::new("leaf.dat", ColorSelector::Current).with_transform(FLAT_Y),
    );
    let root = Part::new("root.dat").with(flat.clone()).with(flat);

    let (text, report) = flatten(&doc, &root, 4);
    assert_eq!(report.triangles, 2);
    assert_eq!(report.singular_transforms, 2);
    assert!(report.singular());
    assert!(!text.contains("NaN"));
    assert!(!text.contains("inf"));
}

#[test]
fn tiny_uniform_scale_is_not_singular() {
    let mut doc = document();
    doc.insert_part(Part::new("far.dat").with(Primitive::Triangle {
        color: ColorSelector::Current,
        points: [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1000.0, 0.0, 0.0),
            Vec3::new(0.0, 1000.0, 0.0),
        ],
    }));
    let tiny = [0.0, 0.0, 0.0, 5e-5, 0.0, 0.0, 0.0, 5e-5, 0.0, 0.0, 0.0, 5e-5];
    let root = Part::new("root.dat").with(Primitive::Reference(
        PartInstance::new("far.dat", ColorSelector::Current).with_transform(tiny),
    ));

    let (text, report) = flatten(&doc, &root, 4);
    assert_eq!(report.singular_transforms, 0);
    assert!(text.contains("<0,0,0>, <0.05,0,0>, <0,0.05,0>"));
}

#[test]
fn self_referencing_part_terminates() {
    let mut doc = document();
    doc.insert_part(
        Part::new("loop.dat")
            .with(reference("loop.dat"))
            .with(triangle())
            .with(reference("loop.dat")),
    );
    let root = Part::new("root.dat").with(reference("loop.dat"));

    let (_, report) = flatten(&doc, &root, 4);
    assert_eq!(report.cycles, 1);
    assert_eq!(report.depth_exceeded, 0);
    assert_eq!(report.triangles, 1);
}

#[test]
fn half_cylinder_end_to_end() {
    let doc = document();
    let root = Part::new("root.dat").with(Primitive::Reference(PartInstance::new(
        "4-8cylo.dat",
        ColorSelector::Concrete(0),
    )));

    let (text, report) = flatten(&doc, &root, 4);
    assert_eq!(report.declarations, 1);
    assert_eq!(report.objects, 1);
    assert_eq!(
        text,
        "#declare LD4_8CYLO=object {\n\
         \x20 cylinder { <0,0,0>, <0,1,0>, 1 open }\n\
         \x20 clipped_by {\n\
         \x20   plane { -z, 0 }\n\
         \x20   plane { <0,0,-1>, 0 }\n\
         \x20 }\n\
         }\n\
         \n\
         object { LD4_8CYLO\n\
         \x20 matrix <1,0,0, 0,1,0, 0,0,1, 0,0,0>\n\
         \x20 material { Black }\n\
         }\n\
         \n"
    );
}

#[test]
fn family_folder_primitive_shares_declaration() {
    let doc = document();
    let root = Part::new("root.dat")
        .with(reference("48\\4-4CYLI.DAT"))
        .with(reference("4-4cyli.dat"));

    let (text, report) = flatten(&doc, &root, 4);
    assert_eq!(report.declarations, 1);
    assert_eq!(report.objects, 2);
    assert_eq!(text.matches("#declare LD4_4CYLI=").count(), 1);
}

#[test]
fn reset_then_synthesizing_twice_declares_once() {
    let mut registry = PrimitiveRegistry::new();
    let mut writer = SceneWriter::new(Vec::new());
    registry.mark_generated("1-4disc.dat");
    registry.reset();

    assert_eq!(
        synthesize("1-4disc.dat", &mut registry, &mut writer).unwrap(),
        Synthesis::Generated
    );
    assert_eq!(
        synthesize("1-4disc.dat", &mut registry, &mut writer).unwrap(),
        Synthesis::AlreadyAvailable
    );
    let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    assert_eq!(text.matches("#declare").count(), 1);
}

#[test]
fn renderer_reuses_primitives_across_instances() {
    let doc = document();
    let model = vec![
        PartInstance::new("1-4disc.dat", ColorSelector::Concrete(4)),
        PartInstance::new("1-4disc.dat", ColorSelector::Concrete(0)),
    ];
    let config = RenderConfig {
        jitter: 0.0,
        ..RenderConfig::default()
    };
    let mut renderer = PovRenderer::new(Vec::new(), config).unwrap();
    renderer.start_render().unwrap();
    let report = renderer.add_model(&model, &doc, &doc).unwrap();
    assert!(renderer.registry().is_generated("1-4disc.dat"));
    let text = String::from_utf8(renderer.finish().unwrap()).unwrap();

    assert_eq!(report.declarations, 1);
    assert_eq!(report.objects, 2);
    assert_eq!(text.matches("#declare LD1_4DISC=").count(), 1);
    assert_eq!(text.matches("// Part: 1-4disc.dat\n").count(), 2);
    // root frame flips all three axes
    assert!(text.contains("matrix <-1,0,0, 0,-1,0, 0,0,-1, 0,0,0>"));
}

#[test]
fn renderer_uses_manifest_names() {
    let manifest = std::env::temp_dir().join(format!("ldpov-it-manifest-{}.inc", std::process::id()));
    std::fs::write(&manifest, "// #JBB stud.dat\n// #JBB 4-4cyli.dat\n").unwrap();

    let doc = document();
    let config = RenderConfig {
        jitter: 0.0,
        primitives_manifest: Some(manifest.clone()),
        ..RenderConfig::default()
    };
    let mut renderer = PovRenderer::new(Vec::new(), config).unwrap();
    renderer.start_render().unwrap();
    let report = renderer
        .add_model(
            &[
                PartInstance::new("stud.dat", ColorSelector::Current),
                PartInstance::new("4-4cyli.dat", ColorSelector::Concrete(4)),
            ],
            &doc,
            &doc,
        )
        .unwrap();
    let text = String::from_utf8(renderer.finish().unwrap()).unwrap();
    std::fs::remove_file(&manifest).unwrap();

    assert_eq!(report.declarations, 0);
    assert_eq!(report.objects, 2);
    assert!(text.contains("#include \"ldpov-primitives.inc\"\n"));
    assert!(text.contains("object { LDSTUD\n"));
    assert!(text.contains("material { Light_Gray }"));
    assert!(!text.contains("#declare"));
}

#[test]
fn renders_json_document() {
    let json = r#"{
        "version": "0.1",
        "colors": [
            { "id": 4, "name": "Red", "rgba": [201, 26, 9, 255], "kind": "Solid" }
        ],
        "parts": {
            "plate.dat": {
                "name": "plate.dat",
                "primitives": [
                    { "type": "Quad", "color": 16, "points": [
                        { "x": 0, "y": 0, "z": 0 }, { "x": 1, "y": 0, "z": 0 },
                        { "x": 1, "y": 0, "z": 1 }, { "x": 0, "y": 0, "z": 1 } ] },
                    { "type": "Line", "color": 24, "points": [
                        { "x": 0, "y": 0, "z": 0 }, { "x": 1, "y": 0, "z": 0 } ] }
                ]
            }
        },
        "model": [
            { "part": "PLATE.DAT", "transform": [0,0,0, 1,0,0, 0,1,0, 0,0,1], "color": 4 }
        ]
    }"#;
    let doc = Document::from_json(json).unwrap();
    let config = RenderConfig {
        jitter: 0.0,
        ..RenderConfig::default()
    };
    let mut renderer = PovRenderer::new(Vec::new(), config).unwrap();
    let report = renderer.add_model(&doc.model, &doc, &doc).unwrap();
    let text = String::from_utf8(renderer.finish().unwrap()).unwrap();

    assert_eq!(report.triangles, 2);
    assert_eq!(report.warnings(), 0);
    assert!(text.contains("<0,0,0>, <-1,0,0>, <-1,0,-1>"));
    assert_eq!(text.matches("material { Red }").count(), 2);
}
