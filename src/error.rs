use std::path::PathBuf;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("{pass}: `{field}` must be {requirement} (got {value})")]
    InvalidParameter {
        pass: &'static str,
        field: &'static str,
        requirement: &'static str,
        value: f32,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("surface is {width}x{height}, nothing to draw")]
    EmptySurface { width: u32, height: u32 },
    #[error("invalid pass configuration: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("{exploration} needs a source image and none is loaded")]
    MissingAsset { exploration: &'static str },
}

#[derive(thiserror::Error, Debug)]
pub enum AssetError {
    #[error("image `{name}` not found (tried {tried:?})")]
    NotFound { name: String, tried: Vec<PathBuf> },
    #[error("failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
