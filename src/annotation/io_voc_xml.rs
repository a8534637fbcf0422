//! Pascal VOC XML reader and writer for annotation records.
//!
//! One XML file per diagram. Boxes are written as whole pixels that still
//! enclose the element: mins floored, maxes ceiled.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Node;

use super::{AnnotationRecord, RecordObject, RASTER_DEPTH};
use crate::error::FlowlabelError;
use crate::geometry::BBoxXYXY;

pub const VOC_XML_EXTENSION: &str = "xml";

/// Serializes a record as a VOC `<annotation>` document.
pub fn to_voc_xml_string(record: &AnnotationRecord) -> String {
    let mut xml = String::new();

    writeln!(xml, "<annotation>").expect("write to string");
    writeln!(
        xml,
        "  <filename>{}</filename>",
        xml_escape(&record.filename)
    )
    .expect("write to string");
    writeln!(xml, "  <size>").expect("write to string");
    writeln!(xml, "    <width>{}</width>", record.width).expect("write to string");
    writeln!(xml, "    <height>{}</height>", record.height).expect("write to string");
    writeln!(xml, "    <depth>{}</depth>", record.depth).expect("write to string");
    writeln!(xml, "  </size>").expect("write to string");
    writeln!(xml, "  <segmented>0</segmented>").expect("write to string");

    for object in &record.objects {
        let (xmin, ymin, xmax, ymax) = object.bbox.to_enclosing_pixels();

        writeln!(xml, "  <object>").expect("write to string");
        writeln!(xml, "    <name>{}</name>", xml_escape(&object.name)).expect("write to string");
        writeln!(xml, "    <pose>Unspecified</pose>").expect("write to string");
        writeln!(xml, "    <truncated>0</truncated>").expect("write to string");
        writeln!(xml, "    <difficult>0</difficult>").expect("write to string");
        writeln!(xml, "    <bndbox>").expect("write to string");
        writeln!(xml, "      <xmin>{xmin}</xmin>").expect("write to string");
        writeln!(xml, "      <ymin>{ymin}</ymin>").expect("write to string");
        writeln!(xml, "      <xmax>{xmax}</xmax>").expect("write to string");
        writeln!(xml, "      <ymax>{ymax}</ymax>").expect("write to string");
        writeln!(xml, "    </bndbox>").expect("write to string");
        writeln!(xml, "  </object>").expect("write to string");
    }

    writeln!(xml, "</annotation>").expect("write to string");
    xml
}

/// Writes a record to `path`, replacing any existing file.
pub fn write_annotation_record(path: &Path, record: &AnnotationRecord) -> Result<(), FlowlabelError> {
    if record.filename.trim().is_empty() {
        return Err(FlowlabelError::VocWriteError {
            path: path.to_path_buf(),
            message: "record has an empty filename".to_string(),
        });
    }
    fs::write(path, to_voc_xml_string(record)).map_err(FlowlabelError::Io)
}

/// Reads one VOC XML file.
pub fn read_annotation_record(path: &Path) -> Result<AnnotationRecord, FlowlabelError> {
    let xml = fs::read_to_string(path).map_err(FlowlabelError::Io)?;
    parse_voc_xml_str(&xml, path)
}

/// Parse VOC XML from a UTF-8 string.
///
/// Useful for testing and fuzzing the parser in memory.
pub fn from_voc_xml_str(xml: &str) -> Result<AnnotationRecord, FlowlabelError> {
    parse_voc_xml_str(xml, Path::new("<memory>"))
}

/// Parse VOC XML from bytes.
///
/// The input must be valid UTF-8.
pub fn from_voc_xml_slice(bytes: &[u8]) -> Result<AnnotationRecord, FlowlabelError> {
    let xml = std::str::from_utf8(bytes).map_err(|source| FlowlabelError::VocXmlParse {
        path: PathBuf::from("<memory>"),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    from_voc_xml_str(xml)
}

/// True for paths ending in `.xml`, any case.
pub fn has_xml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(VOC_XML_EXTENSION))
        .unwrap_or(false)
}

fn parse_voc_xml_str(xml: &str, path: &Path) -> Result<AnnotationRecord, FlowlabelError> {
    let document =
        roxmltree::Document::parse(xml).map_err(|source| FlowlabelError::VocXmlParse {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

    let annotation = document.root_element();
    if annotation.tag_name().name() != "annotation" {
        return Err(FlowlabelError::VocXmlParse {
            path: path.to_path_buf(),
            message: "missing <annotation> root element".to_string(),
        });
    }

    let filename = required_child_text(annotation, "filename", path, "<annotation>")?;

    let size = required_child_element(annotation, "size", path, "<annotation>")?;
    let width = parse_required_u32(size, "width", path, "<size>")?;
    let height = parse_required_u32(size, "height", path, "<size>")?;
    let depth = match optional_child_text(size, "depth") {
        Some(raw) => raw.parse::<u32>().map_err(|_| FlowlabelError::VocXmlParse {
            path: path.to_path_buf(),
            message: format!("invalid <depth> value '{raw}' in <size>; expected u32"),
        })?,
        None => RASTER_DEPTH,
    };

    let mut objects = Vec::new();
    for object in annotation
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "object")
    {
        let name = required_child_text(object, "name", path, "<object>")?;
        let bndbox = required_child_element(object, "bndbox", path, "<object>")?;

        let xmin = parse_required_f64(bndbox, "xmin", path, "<bndbox>")?;
        let ymin = parse_required_f64(bndbox, "ymin", path, "<bndbox>")?;
        let xmax = parse_required_f64(bndbox, "xmax", path, "<bndbox>")?;
        let ymax = parse_required_f64(bndbox, "ymax", path, "<bndbox>")?;

        objects.push(RecordObject {
            name,
            bbox: BBoxXYXY::from_xyxy(xmin, ymin, xmax, ymax),
        });
    }

    Ok(AnnotationRecord {
        filename,
        width,
        height,
        depth,
        objects,
    })
}

fn required_child_element<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<Node<'a, 'input>, FlowlabelError> {
    child_element(node, tag).ok_or_else(|| FlowlabelError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })
}

fn required_child_text(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<String, FlowlabelError> {
    optional_child_text(node, tag).ok_or_else(|| FlowlabelError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })
}

fn parse_required_u32(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<u32, FlowlabelError> {
    let raw = required_child_text(node, tag, path, context)?;
    raw.parse::<u32>().map_err(|_| FlowlabelError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("invalid <{tag}> value '{raw}' in {context}; expected u32"),
    })
}

fn parse_required_f64(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<f64, FlowlabelError> {
    let raw = required_child_text(node, tag, path, context)?;
    raw.parse::<f64>().map_err(|_| FlowlabelError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("invalid <{tag}> value '{raw}' in {context}; expected a number"),
    })
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

fn optional_child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    child_element(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
