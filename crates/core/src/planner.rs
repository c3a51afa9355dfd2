//! Canonical destination paths.
//!
//! Layout under the archive root:
//!
//! ```text
//! By-ISBN/{isbn} • {Title} • {year} • {Publisher}/{Title}.{ext}
//! No-ISBN/<relative path of the source>
//! No-Metadata/<relative path of the source>
//! ```
//!
//! Everything here is pure: same inputs, same path.

use std::path::{Component, Path, PathBuf};

use crate::classifier::{Category, ClassificationOutcome};

/// Field delimiter inside a By-ISBN folder name.
pub const FIELD_SEPARATOR: &str = " • ";

/// Computes the category-relative destination for a classified file.
///
/// `extension` comes from format detection. `source_relative` is the
/// file's path relative to the library (see [`source_relative`]) and is
/// only used for the No-ISBN and No-Metadata categories.
pub fn plan(outcome: &ClassificationOutcome, extension: &str, source_relative: &Path) -> PathBuf {
    let category = outcome.category();
    match outcome {
        ClassificationOutcome::Classified(record) => {
            let title = sanitize(&title_case(record.title()));
            let publisher = sanitize(&title_case(record.publisher()));
            let folder = [
                record.isbn().to_string(),
                title.clone(),
                record.year().to_string(),
                publisher,
            ]
            .join(FIELD_SEPARATOR);

            PathBuf::from(category.dir_name())
                .join(folder)
                .join(format!("{}.{}", title, extension.trim_start_matches('.')))
        }
        ClassificationOutcome::NoIsbn | ClassificationOutcome::NoMetadata { .. } => {
            PathBuf::from(category.dir_name()).join(source_relative)
        }
    }
}

/// Path of `path` relative to the archive root when it lives there, else
/// relative to the library root, with one leading category folder removed.
///
/// Stripping the category keeps reruns from nesting `No-ISBN/No-ISBN/...`.
/// Returns `None` when `path` is under neither root.
pub fn source_relative(path: &Path, root: &Path, archive_root: &Path) -> Option<PathBuf> {
    let relative = path
        .strip_prefix(archive_root)
        .or_else(|_| path.strip_prefix(root))
        .ok()?;

    let mut components = relative.components();
    let first = components.next()?;
    let rest = components.as_path();

    let is_category = matches!(first, Component::Normal(name)
        if name.to_str().and_then(Category::from_dir_name).is_some());

    if is_category && !rest.as_os_str().is_empty() {
        Some(rest.to_path_buf())
    } else {
        Some(relative.to_path_buf())
    }
}

/// Capitalizes the first character of each whitespace-separated word and
/// lowercases the rest. Runs of whitespace collapse to one space.
pub fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replaces characters that cannot appear in a single path component.
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '-',
            c => c,
        })
        .collect()
}
