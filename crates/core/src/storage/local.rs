//! The `local_file` tier: PDFs under the uploads directory.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use opendal::{Operator, services};

use super::error::StorageError;

/// A local file matched by [`LocalFileStore::find`].
#[derive(Debug, Clone)]
pub struct LocalMatch {
    /// Name of the file that matched.
    pub name: String,
    /// File contents.
    pub data: Bytes,
    /// True when found by the fuzzy fallback rather than an exact name.
    pub fuzzy: bool,
}

/// How far [`LocalFileStore::find`] may stray from the candidate names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalSearch {
    /// Candidate names only.
    Exact,
    /// Candidate names, then the closest directory entry.
    Fuzzy,
}

/// Uploads directory accessed through an OpenDAL `Fs` operator.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    operator: Operator,
    root: PathBuf,
}

impl LocalFileStore {
    /// Opens (and creates on first write) the uploads directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not valid UTF-8 or the operator cannot be built.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        let absolute = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .join(root)
        };

        let builder = services::Fs::default().root(
            absolute
                .to_str()
                .ok_or_else(|| StorageError::configuration("invalid path"))?,
        );
        let operator = Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish();

        Ok(Self {
            operator,
            root: absolute,
        })
    }

    /// Directory backing the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `data` as `name`, returning the stored name.
    ///
    /// # Errors
    ///
    /// Returns an error for unsafe names or when the write fails.
    pub async fn write(&self, name: &str, data: Bytes) -> Result<String, StorageError> {
        let name = checked_name(name)?;
        self.operator.write(name, data).await?;
        Ok(name.to_string())
    }

    /// Reads a file by exact name.
    ///
    /// Legacy locators carry a URL path (`/uploads/pdfs/{name}`); only the last
    /// segment is used.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the file is absent.
    pub async fn read(&self, name: &str) -> Result<Bytes, StorageError> {
        let name = checked_name(last_segment(name))?;
        Ok(self.operator.read(name).await?.to_bytes())
    }

    /// Finds a file by trying `candidates` exactly, then by fuzzy match when
    /// `search` allows it.
    ///
    /// # Errors
    ///
    /// Returns an error only when the directory cannot be listed.
    pub async fn find(
        &self,
        candidates: &[String],
        search: LocalSearch,
    ) -> Result<Option<LocalMatch>, StorageError> {
        for candidate in candidates {
            match self.read(candidate).await {
                Ok(data) => {
                    return Ok(Some(LocalMatch {
                        name: last_segment(candidate).to_string(),
                        data,
                        fuzzy: false,
                    }));
                }
                Err(StorageError::NotFound { .. } | StorageError::InvalidKey(_)) => {}
                Err(e) => return Err(e),
            }
        }

        if search == LocalSearch::Exact {
            return Ok(None);
        }

        let entries = match self.list_pdfs().await {
            Ok(entries) => entries,
            Err(StorageError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        for candidate in candidates {
            if let Some(name) = best_fuzzy_match(last_segment(candidate), &entries) {
                let data = self.read(name).await?;
                tracing::info!(
                    requested = %candidate,
                    matched = %name,
                    "Local PDF found by fuzzy match"
                );
                return Ok(Some(LocalMatch {
                    name: name.to_string(),
                    data,
                    fuzzy: true,
                }));
            }
        }

        Ok(None)
    }

    async fn list_pdfs(&self) -> Result<Vec<String>, StorageError> {
        let entries = self.operator.list("/").await?;
        let mut names: Vec<String> = entries
            .into_iter()
            .filter(|e| e.metadata().is_file())
            .map(|e| e.name().to_string())
            .filter(|n| n.to_ascii_lowercase().ends_with(".pdf"))
            .collect();
        names.sort();
        Ok(names)
    }
}

fn last_segment(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn checked_name(name: &str) -> Result<&str, StorageError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(StorageError::InvalidKey(name.to_string()));
    }
    Ok(name)
}

/// Strips the `{timestamp}_` prefix, if any.
fn split_timestamp(name: &str) -> (Option<&str>, &str) {
    match name.split_once('_') {
        Some((ts, rest)) if !ts.is_empty() && ts.bytes().all(|b| b.is_ascii_digit()) => {
            (Some(ts), rest)
        }
        _ => (None, name),
    }
}

/// Comparison key: timestamp and extension removed, alphanumerics lowercased.
fn fuzzy_key(name: &str) -> String {
    let (_, rest) = split_timestamp(name);
    let stem = rest
        .len()
        .checked_sub(4)
        .filter(|&cut| rest.is_char_boundary(cut) && rest[cut..].eq_ignore_ascii_case(".pdf"))
        .map_or(rest, |cut| &rest[..cut]);
    stem.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Picks the closest directory entry to `target`.
///
/// Same key and timestamp beats same key alone, which beats one key containing
/// the other. Keys shorter than four characters never match by containment.
fn best_fuzzy_match<'a>(target: &str, entries: &'a [String]) -> Option<&'a str> {
    let key = fuzzy_key(target);
    if key.is_empty() {
        return None;
    }
    let (target_ts, _) = split_timestamp(target);

    entries
        .iter()
        .filter_map(|entry| {
            let entry_key = fuzzy_key(entry);
            let score = if entry_key == key {
                if target_ts.is_some() && split_timestamp(entry).0 == target_ts {
                    3
                } else {
                    2
                }
            } else if key.len().min(entry_key.len()) >= 4
                && (entry_key.contains(&key) || key.contains(&entry_key))
            {
                1
            } else {
                return None;
            };
            Some((score, entry.as_str()))
        })
        .max_by(|(a, a_name), (b, b_name)| a.cmp(b).then_with(|| b_name.cmp(a_name)))
        .map(|(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, LocalFileStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalFileStore::new(dir.path()).expect("store");
        (dir, store)
    }

    #[test]
    fn test_fuzzy_key() {
        assert_eq!(fuzzy_key("1700000000000_Annual_Report.pdf"), "annualreport");
        assert_eq!(fuzzy_key("annual report.PDF"), "annualreport");
        assert_eq!(fuzzy_key("notes"), "notes");
    }

    #[test]
    fn test_best_fuzzy_match_prefers_timestamp() {
        let entries = vec![
            "1600000000000_annual-report.pdf".to_string(),
            "1700000000000_Annual_Report.pdf".to_string(),
        ];
        assert_eq!(
            best_fuzzy_match("1700000000000_annual_report.pdf", &entries),
            Some("1700000000000_Annual_Report.pdf")
        );
    }

    #[test]
    fn test_best_fuzzy_match_containment() {
        let entries = vec!["1700000000000_Report_Final.pdf".to_string()];
        assert_eq!(
            best_fuzzy_match("rep.pdf", &entries),
            None,
            "short keys never match by containment"
        );
        assert_eq!(
            best_fuzzy_match("report.pdf", &entries),
            Some("1700000000000_Report_Final.pdf")
        );
        assert_eq!(
            best_fuzzy_match("ReportFinal_v2.pdf", &entries),
            Some("1700000000000_Report_Final.pdf")
        );
        assert_eq!(best_fuzzy_match("x.pdf", &entries), None);
    }

    #[test]
    fn test_checked_name_rejects_traversal() {
        assert!(checked_name("../etc/passwd").is_err());
        assert!(checked_name("..").is_err());
        assert!(checked_name("").is_err());
        assert!(checked_name("a.pdf").is_ok());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (_dir, store) = store();
        store
            .write("1_a.pdf", Bytes::from_static(b"%PDF-1.4"))
            .await
            .expect("write");
        let data = store.read("/uploads/pdfs/1_a.pdf").await.expect("read");
        assert_eq!(data.as_ref(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_read_missing() {
        let (_dir, store) = store();
        assert!(matches!(
            store.read("missing.pdf").await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_find_exact_then_fuzzy() {
        let (_dir, store) = store();
        store
            .write("1700000000000_Annual_Report.pdf", Bytes::from_static(b"%PDF-A"))
            .await
            .expect("write");

        let exact = store
            .find(&["1700000000000_Annual_Report.pdf".to_string()], LocalSearch::Fuzzy)
            .await
            .expect("find")
            .expect("match");
        assert!(!exact.fuzzy);

        let fuzzy = store
            .find(&["1700000000000_annual report.pdf".to_string()], LocalSearch::Fuzzy)
            .await
            .expect("find")
            .expect("match");
        assert!(fuzzy.fuzzy);
        assert_eq!(fuzzy.name, "1700000000000_Annual_Report.pdf");

        let none = store
            .find(&["unrelated.pdf".to_string()], LocalSearch::Fuzzy)
            .await
            .expect("find");
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_find_exact_ignores_near_names() {
        let (_dir, store) = store();
        store
            .write(
                "1600000000000_Tafsir_Ibn_Kathir_Vol2.pdf",
                Bytes::from_static(b"%PDF-OTHER-BOOK"),
            )
            .await
            .expect("write");

        let candidates = vec!["1700000000000_Tafsir.pdf".to_string()];
        let exact = store
            .find(&candidates, LocalSearch::Exact)
            .await
            .expect("find");
        assert!(exact.is_none());

        let fuzzy = store
            .find(&candidates, LocalSearch::Fuzzy)
            .await
            .expect("find")
            .expect("match");
        assert_eq!(fuzzy.name, "1600000000000_Tafsir_Ibn_Kathir_Vol2.pdf");
    }
}
