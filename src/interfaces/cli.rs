use super::RenderedDocument;
use crate::domain::error::{AppError, Result};
use crate::domain::requirement::RequirementDocument;
use crate::domain::validation::ValidationReport;
use std::fs;
use std::path::{Path, PathBuf};

pub const USAGE: &str = "usage: testsmith <requirements-file>";

/// The single positional argument, program name already skipped.
pub fn requirements_path<I>(args: I) -> Result<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let path = args
        .next()
        .filter(|arg| !arg.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError(USAGE.to_string()))?;
    if args.next().is_some() {
        return Err(AppError::ValidationError(USAGE.to_string()));
    }
    Ok(PathBuf::from(path))
}

pub fn read_document(path: &Path) -> Result<RequirementDocument> {
    let text = fs::read_to_string(path).map_err(|err| {
        AppError::IoError(format!("Failed to read {}: {}", path.display(), err))
    })?;
    Ok(RequirementDocument::new(text))
}

pub fn write_documents(directory: &Path, documents: &[RenderedDocument]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(directory)?;
    let mut written = Vec::with_capacity(documents.len());
    for document in documents {
        let path = directory.join(&document.file_name);
        fs::write(&path, &document.content).map_err(|err| {
            AppError::IoError(format!("Failed to write {}: {}", path.display(), err))
        })?;
        written.push(path);
    }
    Ok(written)
}

pub fn format_rejection(report: &ValidationReport) -> String {
    let mut out = String::from("Requirements document rejected:\n");
    for (index, issue) in report.issues.iter().enumerate() {
        out.push_str(&format!("{}. [{}] {}\n", index + 1, issue.kind, issue.detail));
    }
    out
}
