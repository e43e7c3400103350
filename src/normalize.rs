// Region-name canonicalization.
//
// Two call paths share one table: the geographic reference only needs the
// historical rename (orissa -> odisha), while tabular data additionally
// carries multi-word territory spellings that must match the reference's
// ampersand forms. Both paths lowercase and trim first, so canonical keys
// are always lowercase and the whole operation is idempotent.
use crate::error::InsightResult;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct AliasTable {
    shared: HashMap<String, String>,
    tabular: HashMap<String, String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        let mut table = AliasTable {
            shared: HashMap::new(),
            tabular: HashMap::new(),
        };
        table.insert_shared("orissa", "odisha");
        table.insert_tabular("andaman and nicobar", "andaman & nicobar islands");
        table.insert_tabular(
            "dadra and nagar haveli and daman and diu",
            "dadra & nagar haveli & daman & diu",
        );
        table
    }
}

/// On-disk extension format: two optional maps merged over the defaults.
#[derive(Debug, Deserialize)]
struct AliasFile {
    #[serde(default)]
    shared: HashMap<String, String>,
    #[serde(default)]
    tabular: HashMap<String, String>,
}

impl AliasTable {
    /// Alias applied on both the geographic and tabular paths.
    pub fn insert_shared(&mut self, from: &str, to: &str) {
        self.shared.insert(fold(from), fold(to));
    }

    /// Alias applied only when canonicalizing tabular region columns.
    pub fn insert_tabular(&mut self, from: &str, to: &str) {
        self.tabular.insert(fold(from), fold(to));
    }

    /// Merge an operator-supplied JSON alias file over the built-ins.
    pub fn merge_json_file(&mut self, path: &Path) -> InsightResult<()> {
        let text = std::fs::read_to_string(path)?;
        let file: AliasFile = serde_json::from_str(&text)?;
        for (from, to) in &file.shared {
            self.insert_shared(from, to);
        }
        for (from, to) in &file.tabular {
            self.insert_tabular(from, to);
        }
        Ok(())
    }

    /// Canonical key for a geographic-reference name. Missing input maps to
    /// the empty string, which every caller treats as "unmapped".
    pub fn canonical_geo(&self, name: Option<&str>) -> String {
        let Some(name) = name else {
            return String::new();
        };
        let key = fold(name);
        match self.shared.get(&key) {
            Some(mapped) => mapped.clone(),
            None => key,
        }
    }

    /// Canonical key for a tabular region cell. Unknown names pass through
    /// lowercased and trimmed.
    pub fn canonical_tabular(&self, name: Option<&str>) -> String {
        let Some(name) = name else {
            return String::new();
        };
        let key = fold(name);
        if let Some(mapped) = self.tabular.get(&key) {
            return mapped.clone();
        }
        match self.shared.get(&key) {
            Some(mapped) => mapped.clone(),
            None => key,
        }
    }
}

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn historical_rename_applies_on_both_paths() {
        let table = AliasTable::default();
        assert_eq!(table.canonical_geo(Some(" Orissa ")), "odisha");
        assert_eq!(table.canonical_tabular(Some("ORISSA")), "odisha");
    }

    #[test]
    fn territory_aliases_are_tabular_only() {
        let table = AliasTable::default();
        assert_eq!(
            table.canonical_tabular(Some("Andaman and Nicobar")),
            "andaman & nicobar islands"
        );
        assert_eq!(
            table.canonical_tabular(Some("dadra and nagar haveli and daman and diu")),
            "dadra & nagar haveli & daman & diu"
        );
        // The reference itself already spells these with ampersands.
        assert_eq!(
            table.canonical_geo(Some("andaman and nicobar")),
            "andaman and nicobar"
        );
    }

    #[test]
    fn missing_input_maps_to_empty() {
        let table = AliasTable::default();
        assert_eq!(table.canonical_geo(None), "");
        assert_eq!(table.canonical_tabular(None), "");
        assert_eq!(table.canonical_tabular(Some("   ")), "");
    }

    #[test]
    fn unknown_names_pass_through_folded() {
        let table = AliasTable::default();
        assert_eq!(table.canonical_tabular(Some("  Kerala ")), "kerala");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let table = AliasTable::default();
        for raw in ["Orissa", "Andaman and Nicobar", "Tamil Nadu", ""] {
            let once = table.canonical_tabular(Some(raw));
            let twice = table.canonical_tabular(Some(&once));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn programmatic_aliases_extend_the_defaults() {
        let mut table = AliasTable::default();
        table.insert_tabular("Pondicherry", "Puducherry");
        assert_eq!(table.canonical_tabular(Some("pondicherry")), "puducherry");
        // Built-ins are untouched.
        assert_eq!(table.canonical_tabular(Some("orissa")), "odisha");
    }

    #[test]
    fn json_file_merges_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"shared": {{"uttaranchal": "uttarakhand"}}, "tabular": {{"pondicherry": "puducherry"}}}}"#
        )
        .unwrap();
        let mut table = AliasTable::default();
        table.merge_json_file(file.path()).unwrap();
        assert_eq!(table.canonical_geo(Some("Uttaranchal")), "uttarakhand");
        assert_eq!(table.canonical_tabular(Some("Pondicherry")), "puducherry");
        assert_eq!(table.canonical_tabular(Some("orissa")), "odisha");
    }
}
