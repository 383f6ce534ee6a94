use std::fmt::Display;

use shrinkwraprs::Shrinkwrap;

/// Error threshold used when none is given, in pixels.
pub const DEFAULT_ERROR_THRESHOLD: f64 = 0.125;

/// Crs definition, anything the engine understands (`EPSG:3857`, WKT, proj string).
#[derive(Shrinkwrap, Debug, Clone, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct Crs(String);

impl Crs {
    pub fn new(definition: impl Into<String>) -> Self {
        Self(definition.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Crs {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Crs {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleMethod {
    #[default]
    NearestNeighbour,
    Bilinear,
    Cubic,
    CubicSpline,
    Lanczos,
    Average,
    Mode,
    Max,
    Min,
    Median,
    Q1,
    Q3,
}

/// Target of the warp.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct WarpOptions {
    pub crs: Crs,
    #[serde(default)]
    pub resample: ResampleMethod,
    #[serde(default = "default_error_threshold")]
    pub error_threshold: f64,
}

fn default_error_threshold() -> f64 {
    DEFAULT_ERROR_THRESHOLD
}

impl WarpOptions {
    pub fn new(crs: impl Into<Crs>) -> Self {
        Self {
            crs: crs.into(),
            resample: ResampleMethod::default(),
            error_threshold: DEFAULT_ERROR_THRESHOLD,
        }
    }

    pub fn with_resample(mut self, resample: ResampleMethod) -> Self {
        self.resample = resample;
        self
    }

    pub fn with_error_threshold(mut self, error_threshold: f64) -> Self {
        self.error_threshold = error_threshold;
        self
    }
}
