//! Bookkeeping over a generated dataset directory.
//!
//! - [`sync_images_and_labels`] moves rasters without a record, and records
//!   without a raster, into `isolated/`.
//! - [`load_samples`] reads every record with its raster, ready for a
//!   training loader.
//! - [`inspect_annotations`] counts objects per category.

mod report;

pub use report::{CategoryCount, DatasetReport};

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::annotation::io_voc_xml::{has_xml_extension, read_annotation_record};
use crate::annotation::AnnotationRecord;
use crate::error::FlowlabelError;
use crate::geometry::{BBoxXYXY, Pixel};

pub const IMAGES_DIR: &str = "images";
pub const ANNOTATIONS_DIR: &str = "annotations";
pub const ISOLATED_DIR: &str = "isolated";

/// Suffix the renderer appends to per-chart outputs.
pub const RENDERER_SUFFIX: &str = "-1";

/// Category name to training label id.
pub type LabelMap = BTreeMap<String, u32>;

/// Files moved aside by [`sync_images_and_labels`].
#[derive(Clone, Debug, Default)]
pub struct SyncOutcome {
    pub matched: usize,
    pub isolated_images: Vec<PathBuf>,
    pub isolated_annotations: Vec<PathBuf>,
}

/// Pairs `base/images/*.png` with `base/annotations/*.xml` by stem and
/// moves everything unpaired into `base/isolated/`.
///
/// An image stem ending in the renderer's `-1` suffix pairs with the record
/// named without it.
pub fn sync_images_and_labels(base: &Path) -> Result<SyncOutcome, FlowlabelError> {
    let images = files_by_stem(&base.join(IMAGES_DIR), "png", true)?;
    let annotations = files_by_stem(&base.join(ANNOTATIONS_DIR), "xml", false)?;

    let isolated = base.join(ISOLATED_DIR);
    fs::create_dir_all(&isolated)?;

    let mut outcome = SyncOutcome::default();
    for (stem, path) in &images {
        if annotations.contains_key(stem) {
            outcome.matched += 1;
        } else {
            outcome.isolated_images.push(move_into(path, &isolated)?);
        }
    }
    for (stem, path) in &annotations {
        if !images.contains_key(stem) {
            outcome.isolated_annotations.push(move_into(path, &isolated)?);
        }
    }

    info!(
        matched = outcome.matched,
        images = outcome.isolated_images.len(),
        annotations = outcome.isolated_annotations.len(),
        "dataset synced"
    );
    Ok(outcome)
}

/// One record with its raster, ready for training.
#[derive(Clone, Debug)]
pub struct Sample {
    pub image_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub boxes: Vec<BBoxXYXY<Pixel>>,
    /// Label ids, parallel to `boxes`.
    pub labels: Vec<u32>,
    /// Category names, parallel to `boxes`.
    pub names: Vec<String>,
    pub areas: Vec<f64>,
}

/// Reads every VOC record directly under `annotations_dir`, sorted by file
/// name.
pub fn load_records(
    annotations_dir: &Path,
) -> Result<Vec<(PathBuf, AnnotationRecord)>, FlowlabelError> {
    list_files(annotations_dir)?
        .into_iter()
        .filter(|path| has_xml_extension(path))
        .map(|path| {
            let record = read_annotation_record(&path)?;
            Ok((path, record))
        })
        .collect()
}

/// Ids `1..` for the sorted category names of `records`; 0 stays free for
/// background.
pub fn label_map_from_records<'a>(
    records: impl IntoIterator<Item = &'a AnnotationRecord>,
) -> LabelMap {
    let names: BTreeSet<&str> = records
        .into_iter()
        .flat_map(|record| record.objects.iter().map(|object| object.name.as_str()))
        .collect();
    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| (name.to_string(), index as u32 + 1))
        .collect()
}

/// Loads every record under `annotations_dir` with its image from
/// `images_dir`.
///
/// Without `label_map`, ids come from [`label_map_from_records`]. With one,
/// a category missing from it is an error.
pub fn load_samples(
    images_dir: &Path,
    annotations_dir: &Path,
    label_map: Option<&LabelMap>,
) -> Result<Vec<Sample>, FlowlabelError> {
    let records = load_records(annotations_dir)?;
    let derived;
    let label_map = match label_map {
        Some(map) => map,
        None => {
            derived = label_map_from_records(records.iter().map(|(_, record)| record));
            &derived
        }
    };

    let mut samples = Vec::with_capacity(records.len());
    for (xml_path, record) in records {
        let image_path = images_dir.join(&record.filename);
        if !image_path.is_file() {
            return Err(FlowlabelError::VocXmlParse {
                path: xml_path,
                message: format!(
                    "image '{}' not found in {}; run `flowlabel sync` first",
                    record.filename,
                    images_dir.display()
                ),
            });
        }

        let size = imagesize::size(&image_path).map_err(|source| FlowlabelError::ImageHeader {
            path: image_path.clone(),
            source,
        })?;
        if size.width != record.width as usize || size.height != record.height as usize {
            warn!(
                image = %image_path.display(),
                "record size {}x{} differs from image size {}x{}",
                record.width,
                record.height,
                size.width,
                size.height
            );
        }

        let mut sample = Sample {
            image_path,
            width: record.width,
            height: record.height,
            boxes: Vec::with_capacity(record.objects.len()),
            labels: Vec::with_capacity(record.objects.len()),
            names: Vec::with_capacity(record.objects.len()),
            areas: Vec::with_capacity(record.objects.len()),
        };
        for object in record.objects {
            let label = *label_map.get(&object.name).ok_or_else(|| {
                FlowlabelError::VocXmlParse {
                    path: xml_path.clone(),
                    message: format!("category '{}' is not in the label map", object.name),
                }
            })?;
            sample.areas.push(object.bbox.area());
            sample.boxes.push(object.bbox);
            sample.labels.push(label);
            sample.names.push(object.name);
        }
        samples.push(sample);
    }
    Ok(samples)
}

/// Counts records, objects and objects per category under `annotations_dir`.
pub fn inspect_annotations(annotations_dir: &Path) -> Result<DatasetReport, FlowlabelError> {
    let records = load_records(annotations_dir)?;
    Ok(DatasetReport::from_records(
        records.iter().map(|(_, record)| record),
    ))
}

/// Regular files directly inside `dir`, by file name. A missing directory
/// has no files.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>, FlowlabelError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| {
            FlowlabelError::Io(std::io::Error::other(format!(
                "failed while listing {}: {source}",
                dir.display()
            )))
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn files_by_stem(
    dir: &Path,
    extension: &str,
    strip_renderer_suffix: bool,
) -> Result<BTreeMap<String, PathBuf>, FlowlabelError> {
    let mut by_stem = BTreeMap::new();
    for path in list_files(dir)? {
        let matches_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if !matches_extension {
            continue;
        }

        let key = if strip_renderer_suffix {
            stem.strip_suffix(RENDERER_SUFFIX).unwrap_or(stem)
        } else {
            stem
        };
        by_stem.insert(key.to_string(), path.clone());
    }
    Ok(by_stem)
}

fn move_into(path: &Path, dir: &Path) -> Result<PathBuf, FlowlabelError> {
    let file_name = path.file_name().ok_or_else(|| {
        FlowlabelError::Io(std::io::Error::other(format!(
            "{} has no file name",
            path.display()
        )))
    })?;
    let target = dir.join(file_name);
    fs::rename(path, &target)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::io_voc_xml::write_annotation_record;
    use crate::annotation::RecordObject;

    fn record(filename: &str, names: &[&str]) -> AnnotationRecord {
        AnnotationRecord {
            filename: filename.to_string(),
            width: 4,
            height: 2,
            depth: 3,
            objects: names
                .iter()
                .map(|name| RecordObject {
                    name: name.to_string(),
                    bbox: BBoxXYXY::from_xyxy(0.0, 0.0, 2.0, 1.0),
                })
                .collect(),
        }
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        image::DynamicImage::new_rgb8(width, height)
            .save_with_format(path, image::ImageFormat::Png)
            .expect("write png");
    }

    #[test]
    fn sync_isolates_unpaired_files() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let images = temp.path().join(IMAGES_DIR);
        let annotations = temp.path().join(ANNOTATIONS_DIR);
        fs::create_dir_all(&images).unwrap();
        fs::create_dir_all(&annotations).unwrap();

        fs::write(images.join("Q1.png"), b"").unwrap();
        fs::write(images.join("Q2-1.png"), b"").unwrap();
        fs::write(images.join("Q3.png"), b"").unwrap();
        fs::write(annotations.join("Q1.xml"), b"").unwrap();
        fs::write(annotations.join("Q2.xml"), b"").unwrap();
        fs::write(annotations.join("Q4.xml"), b"").unwrap();

        let outcome = sync_images_and_labels(temp.path()).unwrap();
        assert_eq!(outcome.matched, 2);

        let isolated = temp.path().join(ISOLATED_DIR);
        assert_eq!(outcome.isolated_images, vec![isolated.join("Q3.png")]);
        assert_eq!(outcome.isolated_annotations, vec![isolated.join("Q4.xml")]);
        assert!(isolated.join("Q3.png").is_file());
        assert!(!images.join("Q3.png").exists());
        assert!(images.join("Q2-1.png").is_file());
    }

    #[test]
    fn sync_tolerates_missing_directories() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let outcome = sync_images_and_labels(temp.path()).unwrap();
        assert_eq!(outcome.matched, 0);
        assert!(temp.path().join(ISOLATED_DIR).is_dir());
    }

    #[test]
    fn samples_carry_derived_label_ids() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let images = temp.path().join(IMAGES_DIR);
        let annotations = temp.path().join(ANNOTATIONS_DIR);
        fs::create_dir_all(&images).unwrap();
        fs::create_dir_all(&annotations).unwrap();

        write_png(&images.join("a.png"), 4, 2);
        write_annotation_record(
            &annotations.join("a.xml"),
            &record("a.png", &["text", "arrow", "text"]),
        )
        .unwrap();

        let samples = load_samples(&images, &annotations, None).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].labels, vec![2, 1, 2]);
        assert_eq!(samples[0].names, vec!["text", "arrow", "text"]);
        assert_eq!(samples[0].areas, vec![2.0, 2.0, 2.0]);
        assert_eq!((samples[0].width, samples[0].height), (4, 2));
    }

    #[test]
    fn explicit_label_map_rejects_unknown_categories() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let images = temp.path().join(IMAGES_DIR);
        let annotations = temp.path().join(ANNOTATIONS_DIR);
        fs::create_dir_all(&images).unwrap();
        fs::create_dir_all(&annotations).unwrap();

        write_png(&images.join("a.png"), 4, 2);
        write_annotation_record(&annotations.join("a.xml"), &record("a.png", &["decision"]))
            .unwrap();

        let map = LabelMap::from([("arrow".to_string(), 1)]);
        let err = load_samples(&images, &annotations, Some(&map)).unwrap_err();
        assert!(err.to_string().contains("decision"));
    }

    #[test]
    fn missing_image_points_at_sync() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let annotations = temp.path().join(ANNOTATIONS_DIR);
        fs::create_dir_all(&annotations).unwrap();
        write_annotation_record(&annotations.join("a.xml"), &record("a.png", &[])).unwrap();

        let err = load_samples(&temp.path().join(IMAGES_DIR), &annotations, None).unwrap_err();
        assert!(err.to_string().contains("flowlabel sync"));
    }
}
