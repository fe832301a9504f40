//! Collision-free naming for siblings and recycle-bin entries.

use std::path::Path;
use std::sync::Arc;

use stowage_core::result::AppResult;
use stowage_core::traits::BlobStore;

/// Extension given to uploads whose name has none.
pub const DEFAULT_EXTENSION: &str = "txt";

/// Split an uploaded file name into base name and lowercase, dotless type.
///
/// Any directory part is dropped. Names without a usable extension get
/// [`DEFAULT_EXTENSION`].
pub fn split_file_name(file_name: &str) -> (String, String) {
    let file_name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();

    match file_name.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < file_name.len() => (
            file_name[..dot].to_string(),
            file_name[dot + 1..].to_lowercase(),
        ),
        Some(dot) if dot > 0 => (file_name[..dot].to_string(), DEFAULT_EXTENSION.to_string()),
        _ => (file_name.to_string(), DEFAULT_EXTENSION.to_string()),
    }
}

/// Drop any extension the caller typed into a new file name.
pub fn strip_extension(new_name: &str) -> &str {
    let trimmed = new_name.trim();
    match trimmed.rfind('.') {
        Some(dot) if dot > 0 => trimmed[..dot].trim(),
        _ => trimmed,
    }
}

/// `.ext` for a stored type, or empty.
pub fn dotted(file_type: &str) -> String {
    if file_type.is_empty() {
        String::new()
    } else {
        format!(".{file_type}")
    }
}

/// The `n`th sibling candidate: `base` for 1, `base (n)` afterwards.
pub fn numbered(base: &str, n: u32) -> String {
    if n <= 1 {
        base.to_string()
    } else {
        format!("{base} ({n})")
    }
}

/// The `n`th recycle-bin candidate for a file: `base.ext`, then `base(1).ext`, `base(2).ext`…
pub fn bin_file_name(base: &str, ext: &str, n: u32) -> String {
    if n == 0 {
        format!("{base}{ext}")
    } else {
        format!("{base}({n}){ext}")
    }
}

/// Whether `entry` is `name` or `name (N)`, ignoring ASCII case.
pub fn is_bin_folder_name(entry: &str, name: &str) -> bool {
    if entry.eq_ignore_ascii_case(name) {
        return true;
    }
    let Some(head) = entry.get(..name.len()) else {
        return false;
    };
    if !head.eq_ignore_ascii_case(name) {
        return false;
    }
    entry[name.len()..]
        .strip_prefix(" (")
        .and_then(|rest| rest.strip_suffix(')'))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Whether `entry` looks like a binned copy of `base` + `ext` (`{base}*{ext}`).
pub fn is_bin_file_name(entry: &str, base: &str, ext: &str) -> bool {
    let lower = entry.to_lowercase();
    lower.len() >= base.len() + ext.len()
        && lower.starts_with(&base.to_lowercase())
        && lower.ends_with(&ext.to_lowercase())
}

fn collides(candidate: &str, siblings: &[String]) -> bool {
    let lower = candidate.to_lowercase();
    siblings.iter().any(|s| s.to_lowercase() == lower)
}

/// Finds free names by consulting catalog siblings and the disk.
#[derive(Debug, Clone)]
pub struct NameUniquifier {
    blobs: Arc<dyn BlobStore>,
}

impl NameUniquifier {
    /// Create a uniquifier over a blob store.
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// First of `base + ext`, `base (2) + ext`, … that neither matches a
    /// sibling (case-insensitively) nor exists inside `dir`.
    ///
    /// Returns the base name without `ext`.
    pub async fn unique_name(
        &self,
        dir: &Path,
        base: &str,
        ext: &str,
        siblings: &[String],
    ) -> AppResult<String> {
        let mut n = 1;
        loop {
            let candidate = numbered(base, n);
            let full = format!("{candidate}{ext}");
            if !collides(&full, siblings) && !self.blobs.exists(&dir.join(&full)).await? {
                return Ok(candidate);
            }
            n = if n == 1 { 2 } else { n + 1 };
        }
    }

    /// First free recycle-bin file name for `base` + `ext` inside `bin`.
    pub async fn bin_file_name(&self, bin: &Path, base: &str, ext: &str) -> AppResult<String> {
        let mut n = 0;
        loop {
            let candidate = bin_file_name(base, ext, n);
            if !self.blobs.exists(&bin.join(&candidate)).await? {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    /// First free recycle-bin folder name for `name` inside `bin`.
    pub async fn bin_folder_name(&self, bin: &Path, name: &str) -> AppResult<String> {
        self.unique_name(bin, name, "", &[]).await
    }
}
