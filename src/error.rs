use camino::Utf8PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error("invalid keep policy: {0} (expected \"first\" or \"all\")")]
    InvalidPolicy(String),

    #[error("target directory already exists: {0}")]
    #[diagnostic(help("choose a new target directory; existing ones are never overwritten"))]
    TargetExists(Utf8PathBuf),

    #[error("missing config file {0}")]
    MissingConfig(Utf8PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("copy failed: {0}")]
    Copy(String),

    #[error("could not compute a safe name for {name:?}: {message}")]
    NameSafety { name: String, message: String },

    #[error("strain name normalization did not converge: {0}")]
    NormalizationDidNotConverge(String),

    #[error("failed to read assembly table {path}: {message}")]
    AssemblyTable { path: Utf8PathBuf, message: String },

    #[error("assembly file listed in the table does not exist: {0}")]
    MissingAssemblyFile(Utf8PathBuf),

    #[error("file format not known: {path}, should be one of {expected}")]
    UnknownSequenceFormat { path: Utf8PathBuf, expected: String },

    #[error("failed to count contigs in {path}: {message}")]
    ContigCount { path: Utf8PathBuf, message: String },
}
