//! Header-to-field column mapping.

use crate::error::{Result, SyncError};
use crate::record::Row;

/// Maps destination parameter positions to source column positions.
///
/// Derived once per transfer from the header row and an externally supplied
/// header-to-field map, then applied to every row.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    dest_to_source: Vec<usize>,
}

impl ColumnMapping {
    /// Identity mapping over `arity` columns.
    pub fn identity(arity: usize) -> Self {
        Self {
            dest_to_source: (0..arity).collect(),
        }
    }

    /// Derive a mapping from the header row.
    ///
    /// `sources[d]` names the header column that feeds destination position
    /// `d`. Column names are matched case-insensitively; an unknown name
    /// aborts the transfer before any data moves.
    pub fn from_header(header: &[String], sources: &[String]) -> Result<Self> {
        let mut dest_to_source = Vec::with_capacity(sources.len());
        for name in sources {
            let index = header
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    SyncError::Mapping(format!(
                        "column '{}' not present in header ({})",
                        name,
                        header.join(", ")
                    ))
                })?;
            dest_to_source.push(index);
        }
        Ok(Self { dest_to_source })
    }

    /// Number of destination positions.
    pub fn arity(&self) -> usize {
        self.dest_to_source.len()
    }

    /// Project a row into destination order.
    ///
    /// A row shorter than expected gets an empty string for any missing
    /// trailing column.
    pub fn bind(&self, row: &Row) -> Row {
        self.dest_to_source
            .iter()
            .map(|&src| row.get(src).cloned().unwrap_or_default())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<String> {
        vec!["Id".into(), "Name".into(), "Qty".into()]
    }

    #[test]
    fn test_identity_mapping() {
        let mapping = ColumnMapping::identity(3);
        let row = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(mapping.bind(&row), row);
    }

    #[test]
    fn test_reordering_mapping() {
        let mapping =
            ColumnMapping::from_header(&header(), &["Qty".into(), "Id".into()]).unwrap();
        assert_eq!(mapping.arity(), 2);
        let row = vec!["1".to_string(), "widget".to_string(), "10".to_string()];
        assert_eq!(mapping.bind(&row), vec!["10", "1"]);
    }

    #[test]
    fn test_case_insensitive_match() {
        let mapping = ColumnMapping::from_header(&header(), &["qty".into()]).unwrap();
        let row = vec!["1".to_string(), "widget".to_string(), "10".to_string()];
        assert_eq!(mapping.bind(&row), vec!["10"]);
    }

    #[test]
    fn test_unknown_column_rejected() {
        let err = ColumnMapping::from_header(&header(), &["Missing".into()]).unwrap_err();
        assert!(matches!(err, SyncError::Mapping(_)));
        assert!(err.to_string().contains("Missing"));
    }

    #[test]
    fn test_short_row_padded_with_empty_string() {
        let mapping = ColumnMapping::identity(3);
        let row = vec!["1".to_string(), "widget".to_string()];
        assert_eq!(mapping.bind(&row), vec!["1", "widget", ""]);
    }
}
