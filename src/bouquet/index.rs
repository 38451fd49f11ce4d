// bouquet/index.rs
//! `bouquets.tv` include directives.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::info;

use crate::constants::{INDEX_FILE, INDEX_HEADER};
use crate::error::{Error, Result};
use crate::types::BouquetCategory;

pub fn include_directive(category: BouquetCategory) -> String {
    format!(
        "#SERVICE 1:7:1:0:0:0:0:0:0:0:FROM BOUQUET \"{}\" ORDER BY bouquet",
        category.file_name()
    )
}

fn is_included(text: &str, category: BouquetCategory) -> bool {
    let quoted = format!("\"{}\"", category.file_name());
    text.lines().any(|line| line.contains(&quoted))
}

/// Appends the category's directive unless already listed. Returns true when the file changed.
pub fn ensure_included(dir: &Path, category: BouquetCategory) -> Result<bool> {
    let path = dir.join(INDEX_FILE);
    let mut text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => format!("{INDEX_HEADER}\n"),
        Err(e) => return Err(Error::io(&path, e)),
    };

    if is_included(&text, category) {
        return Ok(false);
    }

    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(&include_directive(category));
    text.push('\n');

    fs::write(&path, text).map_err(|source| Error::BouquetWrite {
        path: path.clone(),
        source,
    })?;
    info!("Added {} to {:?}", category.file_name(), path);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_index_and_never_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        assert!(ensure_included(temp_dir.path(), BouquetCategory::T2mi).unwrap());
        assert!(!ensure_included(temp_dir.path(), BouquetCategory::T2mi).unwrap());
        assert!(ensure_included(temp_dir.path(), BouquetCategory::Abertis).unwrap());

        let text = fs::read_to_string(temp_dir.path().join(INDEX_FILE)).unwrap();
        assert!(text.starts_with(INDEX_HEADER));
        assert_eq!(text.matches("userbouquet.ciefp_t2mi.tv").count(), 1);
        assert_eq!(text.matches("userbouquet.ciefp_abertis.tv").count(), 1);
    }

    #[test]
    fn test_existing_entry_in_other_form_is_respected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(INDEX_FILE);
        fs::write(
            &path,
            "#NAME Bouquets (TV)\n#SERVICE 1:7:1:0:0:0:0:0:0:0:FROM BOUQUET \"userbouquet.ciefp_t2mi.tv\" ORDER BY bouquet",
        )
        .unwrap();
        assert!(!ensure_included(temp_dir.path(), BouquetCategory::T2mi).unwrap());

        assert!(ensure_included(temp_dir.path(), BouquetCategory::Abertis).unwrap());
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("ORDER BY bouquet\n#SERVICE"));
    }
}
