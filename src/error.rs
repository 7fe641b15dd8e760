// src/error.rs

//! Error types for svcdrop

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage in which an error surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Creating runner and packager instances from their definitions
    Instantiation,
    /// Applying definition parameters to instances
    Parameters,
    /// Rendering and copying conversion entries
    Rendering,
    /// Variant-specific cleanup after rendering
    PostProcessing,
    /// Building the install manifest
    ManifestAssembly,
    /// Handing the manifest to the package writer
    PackageWriting,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instantiation => write!(f, "strategy instantiation"),
            Self::Parameters => write!(f, "parameter application"),
            Self::Rendering => write!(f, "template rendering"),
            Self::PostProcessing => write!(f, "artifact post-processing"),
            Self::ManifestAssembly => write!(f, "manifest assembly"),
            Self::PackageWriting => write!(f, "package writing"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// Runner type tag not present in the registry
    #[error("Unknown runner kind '{0}' (expected one of: standalone, service, web-container)")]
    UnknownRunnerKind(String),

    /// Packager type tag not present in the registry
    #[error("Unknown packager kind '{0}' (expected one of: rpm)")]
    UnknownPackagerKind(String),

    /// A variant needs a variable that has no default and was not supplied
    #[error("{variant} is missing required variable: {key}")]
    MissingVariable { variant: String, key: String },

    /// Template lookup or rendering failed
    #[error("Failed to render template '{template}': {message}")]
    Template { template: String, message: String },

    /// Filesystem operation failed
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file declared for installation does not exist on disk
    #[error("Install file not found: {}", .0.display())]
    MissingInstallFile(PathBuf),

    /// No package output directory was configured
    #[error("Package output directory is not set")]
    MissingPackageDirectory,

    /// The package writer backend failed
    #[error("Package write failed: {0}")]
    PackageWrite(String),

    /// Configuration file could not be read or parsed
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Any of the above, tagged with the stage that produced it
    #[error("{stage} failed for {subject}: {source}")]
    Stage {
        stage: PipelineStage,
        subject: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Tag this error with the pipeline stage and subject it came from
    pub fn at_stage(self, stage: PipelineStage, subject: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            subject: subject.into(),
            source: Box::new(self),
        }
    }

    /// Stage this error was tagged with, if any
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Innermost error, skipping stage wrappers
    pub fn root(&self) -> &Error {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}
