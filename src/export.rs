//! Writing diagrams into the dataset layout.
//!
//! ```text
//! <root>/markdown/<stem>.mmd            renderer input
//! <root>/svgs/<stem>.svg                vector rendering
//! <root>/images/<stem>.png              cropped raster
//! <root>/images_with_bboxes/<stem>.png  debug overlay
//! <root>/annotations/<stem>.xml         VOC record
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use rand::{rngs::StdRng, Rng, RngExt, SeedableRng};
use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::annotation::io_voc_xml::write_annotation_record;
use crate::annotation::{annotate_diagram, AnnotationReport, DiagramAnnotation, NodeClassifier};
use crate::error::FlowlabelError;
use crate::graph::{
    resolve_entity, to_mermaid, BlockStyle, ClassifiedGraph, GraphBuilder, KnowledgeGraph,
    NodeStyle, PlainStyle, DEFAULT_MAX_CHILDREN, DEFAULT_MAX_DEPTH,
};
use crate::raster::{decode_raster, save_png};
use crate::render::Renderer;

pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Directory layout of a generated dataset.
#[derive(Clone, Debug)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images(&self) -> PathBuf {
        self.root.join("images")
    }

    pub fn images_with_bboxes(&self) -> PathBuf {
        self.root.join("images_with_bboxes")
    }

    pub fn svgs(&self) -> PathBuf {
        self.root.join("svgs")
    }

    pub fn markdown(&self) -> PathBuf {
        self.root.join("markdown")
    }

    pub fn annotations(&self) -> PathBuf {
        self.root.join("annotations")
    }

    /// Creates every directory; safe to call concurrently.
    pub fn ensure(&self) -> Result<(), FlowlabelError> {
        for dir in [
            self.images(),
            self.images_with_bboxes(),
            self.svgs(),
            self.markdown(),
            self.annotations(),
        ] {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

/// Paths written for one diagram.
#[derive(Clone, Debug)]
pub struct ExportedDiagram {
    pub stem: String,
    pub image: PathBuf,
    pub overlay: PathBuf,
    pub svg: PathBuf,
    pub markup: PathBuf,
    pub annotation: PathBuf,
    pub objects: usize,
    pub report: AnnotationReport,
}

/// Renders, annotates and stores one diagram under `stem`.
pub fn export_diagram<R>(
    layout: &OutputLayout,
    stem: &str,
    markup: &str,
    renderer: &R,
    classifier: Option<&dyn NodeClassifier>,
) -> Result<ExportedDiagram, FlowlabelError>
where
    R: Renderer + ?Sized,
{
    layout.ensure()?;

    let markup_path = layout.markdown().join(format!("{stem}.mmd"));
    fs::write(&markup_path, markup)?;

    let rendered = renderer.render(markup)?;

    let svg_path = layout.svgs().join(format!("{stem}.svg"));
    fs::write(&svg_path, &rendered.svg)?;

    let image_path = layout.images().join(format!("{stem}.png"));
    fs::write(&image_path, &rendered.png)?;

    let annotation = decode_raster(&rendered.png, &image_path)
        .and_then(|raster| annotate_into(layout, stem, &rendered.svg, &raster, classifier));
    let annotation = match annotation {
        Ok(annotation) => annotation,
        Err(err) => {
            remove_orphans(&[image_path]);
            return Err(err);
        }
    };

    Ok(ExportedDiagram {
        stem: stem.to_string(),
        image: image_path,
        overlay: layout.images_with_bboxes().join(format!("{stem}.png")),
        svg: svg_path,
        markup: markup_path,
        annotation: layout.annotations().join(format!("{stem}.xml")),
        objects: annotation.record.objects.len(),
        report: annotation.report,
    })
}

/// Annotates an already rendered diagram and writes the cropped raster, the
/// overlay and the record under `stem`.
///
/// On failure, the raster and overlay written so far are removed so the
/// images directory never holds an unannotated file.
pub fn annotate_into(
    layout: &OutputLayout,
    stem: &str,
    svg: &str,
    raster: &DynamicImage,
    classifier: Option<&dyn NodeClassifier>,
) -> Result<DiagramAnnotation, FlowlabelError> {
    layout.ensure()?;

    let filename = format!("{stem}.png");
    let image_path = layout.images().join(&filename);
    let overlay_path = layout.images_with_bboxes().join(&filename);
    let annotation_path = layout.annotations().join(format!("{stem}.xml"));

    let annotation = annotate_diagram(svg, raster, &filename, classifier)?;
    let written = save_png(&annotation.cropped, &image_path)
        .and_then(|()| {
            annotation
                .overlay
                .save_with_format(&overlay_path, image::ImageFormat::Png)
                .map_err(|source| FlowlabelError::Image {
                    path: overlay_path.clone(),
                    source,
                })
        })
        .and_then(|()| write_annotation_record(&annotation_path, &annotation.record));

    match written {
        Ok(()) => Ok(annotation),
        Err(err) => {
            remove_orphans(&[image_path, overlay_path]);
            Err(err)
        }
    }
}

fn remove_orphans(paths: &[PathBuf]) {
    for orphan in paths {
        if orphan.exists() {
            if let Err(remove_err) = fs::remove_file(orphan) {
                warn!(path = %orphan.display(), "failed to remove orphan: {remove_err}");
            }
        }
    }
}

/// Knobs for [`generate_batch`].
#[derive(Clone, Debug)]
pub struct GenerateOptions {
    pub max_depth: usize,
    pub max_children: usize,
    pub accept_images: bool,
    /// Draw flowchart block shapes and classify nodes by them.
    pub blocks: bool,
    /// Batch seed; entity `i` uses `seed + i`. Random when absent.
    pub seed: Option<u64>,
    pub workers: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_children: DEFAULT_MAX_CHILDREN,
            accept_images: false,
            blocks: false,
            seed: None,
            workers: 1,
        }
    }
}

/// Outcome per entity of one batch.
#[derive(Clone, Debug, Default)]
pub struct BatchSummary {
    pub succeeded: Vec<ExportedDiagram>,
    /// Entities without enough data to draw, with the reason.
    pub skipped: Vec<(String, String)>,
    pub failed: Vec<(String, String)>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.skipped.len() + self.failed.len()
    }
}

/// Generates one diagram per entity on a pool of `options.workers` threads.
///
/// Per-entity failures are collected, not propagated; only pool setup can
/// fail the batch as a whole.
pub fn generate_batch<K, R>(
    knowledge: &K,
    renderer: &R,
    layout: &OutputLayout,
    entities: &[String],
    options: &GenerateOptions,
) -> Result<BatchSummary, FlowlabelError>
where
    K: KnowledgeGraph + Sync + ?Sized,
    R: Renderer + Sync + ?Sized,
{
    if options.workers == 0 {
        return Err(FlowlabelError::InvalidOption {
            message: "workers must be at least 1".to_string(),
        });
    }
    layout.ensure()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .build()
        .map_err(|source| FlowlabelError::InvalidOption {
            message: format!("failed to build worker pool: {source}"),
        })?;

    let base_seed = options.seed.unwrap_or_else(|| rand::rng().random::<u64>());
    info!(
        entities = entities.len(),
        workers = options.workers,
        seed = base_seed,
        "generating batch"
    );

    let results: Vec<(String, Result<ExportedDiagram, FlowlabelError>)> = pool.install(|| {
        entities
            .par_iter()
            .enumerate()
            .map(|(index, entity)| {
                let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(index as u64));
                let result = generate_one(knowledge, renderer, layout, entity, options, &mut rng);
                (entity.clone(), result)
            })
            .collect()
    });

    let mut summary = BatchSummary::default();
    for (entity, result) in results {
        match result {
            Ok(exported) => {
                info!(entity = %entity, objects = exported.objects, "diagram exported");
                summary.succeeded.push(exported);
            }
            Err(FlowlabelError::IncompleteQueryResult { message, .. }) => {
                warn!(entity = %entity, "skipped: {message}");
                summary.skipped.push((entity, message));
            }
            Err(err) => {
                error!(entity = %entity, "failed: {err}");
                summary.failed.push((entity, err.to_string()));
            }
        }
    }
    Ok(summary)
}

fn generate_one<K, R, G>(
    knowledge: &K,
    renderer: &R,
    layout: &OutputLayout,
    entity: &str,
    options: &GenerateOptions,
    rng: &mut G,
) -> Result<ExportedDiagram, FlowlabelError>
where
    K: KnowledgeGraph + ?Sized,
    R: Renderer + ?Sized,
    G: Rng + ?Sized,
{
    let resolved = resolve_entity(knowledge, entity)?;
    let graph = GraphBuilder::new(knowledge, resolved.code.as_str())
        .max_children(options.max_children)
        .accept_images(options.accept_images)
        .randomize(options.max_depth, rng)?;

    let (classified, markup) = if options.blocks {
        styled(&BlockStyle, graph, rng)
    } else {
        styled(&PlainStyle, graph, rng)
    };
    let classifier = classified
        .is_classified()
        .then_some(&classified as &dyn NodeClassifier);

    export_diagram(layout, &resolved.code, &markup, renderer, classifier)
}

fn styled<S, G>(style: &S, graph: crate::graph::Graph, rng: &mut G) -> (ClassifiedGraph, String)
where
    S: NodeStyle,
    G: Rng + ?Sized,
{
    let classified = style.assign(graph, rng);
    let markup = to_mermaid(&classified, style);
    (classified, markup)
}
