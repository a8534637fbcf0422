use std::path::PathBuf;
use thiserror::Error;

/// The main error type for flowlabel operations.
#[derive(Debug, Error)]
pub enum FlowlabelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error for {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to read image header of {path}: {source}")]
    ImageHeader {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Failed to parse SVG: {message}")]
    SvgParse { message: String },

    #[error("Malformed transform '{transform}': expected translate(<x>, <y>)")]
    MalformedTransform { transform: String },

    #[error("Invalid viewBox '{view_box}': {message}")]
    InvalidViewWindow { view_box: String, message: String },

    #[error("Invalid path data '{path_data}': {message}")]
    InvalidPathData { path_data: String, message: String },

    #[error("Missing attribute '{attribute}' on <{element}>")]
    MissingAttribute { element: String, attribute: String },

    #[error("Invalid attribute {attribute}='{value}' on <{element}>")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
    },

    #[error("Unsupported node shape <{tag}>")]
    UnsupportedShape { tag: String },

    #[error("Renderer failed: {message}")]
    RenderFailure { message: String },

    #[error("Renderer timed out after {seconds}s")]
    RenderTimeout { seconds: u64 },

    #[error("Knowledge graph query failed: {message}")]
    KnowledgeQuery { message: String },

    #[error("Incomplete query result for '{entity}': {message}")]
    IncompleteQueryResult { entity: String, message: String },

    #[error("Failed to parse VOC XML from {path}: {message}")]
    VocXmlParse { path: PathBuf, message: String },

    #[error("Failed to write VOC XML to {path}: {message}")]
    VocWriteError { path: PathBuf, message: String },

    #[error("Failed to serialize report: {source}")]
    ReportSerialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("Batch finished with {failed} failed diagram(s)")]
    BatchFailed { failed: usize },

    #[error("Invalid option: {message}")]
    InvalidOption { message: String },
}
