use flowlabel::annotation::io_voc_xml::read_annotation_record;
use flowlabel::annotation::{annotate_diagram, IssueCode, ARROW_CATEGORY, TEXT_CATEGORY};
use flowlabel::export::{annotate_into, OutputLayout};
use flowlabel::geometry::BBoxXYXY;
use flowlabel::raster::{load_raster, NODE_COLOR};
use flowlabel::svg::scan_svg;

const FLOWCHART_SVG: &str = include_str!("fixtures/flowchart.svg");

mod common;

fn raster() -> image::DynamicImage {
    image::DynamicImage::new_rgb8(common::DIAGRAM_WIDTH, common::DIAGRAM_HEIGHT)
}

#[test]
fn fixture_boxes_land_on_the_raster() {
    let annotation =
        annotate_diagram(common::DIAGRAM_SVG, &raster(), "d.png", None).expect("annotate");
    let objects = &annotation.record.objects;

    assert_eq!(objects.len(), 6);
    assert_eq!(objects[0].bbox, BBoxXYXY::from_xyxy(60.0, 80.0, 140.0, 120.0));
    assert_eq!(objects[1].bbox, BBoxXYXY::from_xyxy(268.0, 68.0, 332.0, 132.0));
    assert_eq!(objects[2].name, ARROW_CATEGORY);
    let label = objects[3].bbox;
    let expected = [176.0, 84.0, 224.0, 116.0];
    let actual = [label.xmin(), label.ymin(), label.xmax(), label.ymax()];
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "edge label {label:?}");
    }
    assert!(objects[3..].iter().all(|o| o.name == TEXT_CATEGORY));
    assert!(annotation.report.is_clean());
}

#[test]
fn edge_box_covers_the_curve() {
    let annotation =
        annotate_diagram(common::DIAGRAM_SVG, &raster(), "d.png", None).expect("annotate");
    let edge = &annotation.record.objects[2].bbox;

    assert_eq!((edge.xmin(), edge.xmax()), (140.0, 268.0));
    assert!(edge.height() > 0.0);
}

#[test]
fn padded_rendering_is_cropped_before_remapping() {
    let svg = common::DIAGRAM_SVG.replace("viewBox=\"0 0 100 50\"", "viewBox=\"-10 -10 100 50\"");
    let annotation = annotate_diagram(&svg, &raster(), "d.png", None).expect("annotate");

    assert_eq!((annotation.record.width, annotation.record.height), (360, 180));
    assert_eq!(annotation.cropped.width(), 360);
    assert_eq!(annotation.overlay.dimensions(), (360, 180));
    for object in &annotation.record.objects {
        assert!(object.bbox.is_ordered());
        assert!(object.bbox.xmax() <= 360.0 && object.bbox.ymax() <= 180.0);
    }
}

#[test]
fn stored_files_agree_with_the_record() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let layout = OutputLayout::new(temp.path());
    let annotation =
        annotate_into(&layout, "Q64", common::DIAGRAM_SVG, &raster(), None).expect("annotate");

    let stored = load_raster(&layout.images().join("Q64.png")).expect("load cropped");
    assert_eq!((stored.width(), stored.height()), (400, 200));

    let overlay = load_raster(&layout.images_with_bboxes().join("Q64.png"))
        .expect("load overlay")
        .to_rgb8();
    assert_eq!(*overlay.get_pixel(60, 80), NODE_COLOR);
    assert_eq!(*overlay.get_pixel(0, 0), image::Rgb([0, 0, 0]));

    let record = read_annotation_record(&layout.annotations().join("Q64.xml")).expect("read");
    assert_eq!(record.filename, "Q64.png");
    assert_eq!(record.objects.len(), annotation.record.objects.len());
    assert_eq!(record.objects[0].bbox, annotation.record.objects[0].bbox);
}

#[test]
fn renderer_output_scans_every_element() {
    let scanned = scan_svg(FLOWCHART_SVG).expect("scan");

    assert_eq!(scanned.view_window.min_x(), -8.0);
    assert_eq!(scanned.nodes.len(), 4);
    assert_eq!(scanned.edges.len(), 3);
    assert_eq!(scanned.edge_labels.len(), 2);
    assert_eq!(scanned.node_labels.len(), 4);
    assert_eq!(scanned.report.count(IssueCode::EmptyEdgeLabel), 1);

    let keys: Vec<Option<&str>> = scanned.nodes.iter().map(|n| n.key.as_deref()).collect();
    assert_eq!(
        keys,
        [Some("Berlin"), Some("Germany"), Some("Europe"), Some("Earth")]
    );
    assert_eq!(
        scanned.nodes[1].bbox,
        BBoxXYXY::from_xyxy(86.0, 88.5, 166.0, 168.5)
    );
    assert_eq!(
        scanned.nodes[3].bbox,
        BBoxXYXY::from_xyxy(196.0, 272.5, 256.0, 332.5)
    );
}

#[test]
fn renderer_output_annotates_with_padding_removed() {
    let raster = image::DynamicImage::new_rgb8(268 * 4, 390 * 4);
    let annotation = annotate_diagram(FLOWCHART_SVG, &raster, "Q64.png", None).expect("annotate");

    assert_eq!(annotation.record.width, 268 * 4 - 32);
    assert_eq!(annotation.record.height, 390 * 4 - 16);
    assert_eq!(annotation.record.objects.len(), 4 + 3 + 2 + 4);
}
