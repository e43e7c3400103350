// Geographic reference: Indian state boundaries from GeoJSON.
//
// Each feature's NAME_1 property is canonicalized and written back as
// State_Name, which is the key the choropleth specs join on. A reference
// that fails to load degrades to zero features so the rest of the pipeline
// keeps working; maps then simply have nothing to match against.
use crate::error::InsightResult;
use crate::normalize::AliasTable;
use geojson::FeatureCollection;
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

#[derive(Debug)]
pub struct GeoReference {
    collection: FeatureCollection,
    keys: HashSet<String>,
}

impl Default for GeoReference {
    fn default() -> Self {
        GeoReference {
            collection: FeatureCollection {
                bbox: None,
                features: Vec::new(),
                foreign_members: None,
            },
            keys: HashSet::new(),
        }
    }
}

impl GeoReference {
    pub fn empty() -> Self {
        GeoReference::default()
    }

    /// Load and canonicalize the reference. Any read or parse failure logs
    /// a warning and yields the empty reference; callers never fail on a
    /// missing boundary file.
    pub fn load(path: &Path, aliases: &AliasTable) -> Self {
        match Self::try_load(path, aliases) {
            Ok(reference) => reference,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "geojson reference unavailable, maps will be empty");
                GeoReference::empty()
            }
        }
    }

    fn try_load(path: &Path, aliases: &AliasTable) -> InsightResult<Self> {
        let mut collection: FeatureCollection = std::fs::read_to_string(path)?.parse()?;
        let mut keys = HashSet::new();
        for feature in &mut collection.features {
            let name = feature
                .property("NAME_1")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            let canonical = aliases.canonical_geo(name.as_deref());
            if !canonical.is_empty() {
                keys.insert(canonical.clone());
            }
            // set_property creates the properties map when it is absent.
            feature.set_property("State_Name", canonical);
        }
        Ok(GeoReference { collection, keys })
    }

    /// Write the canonicalized collection back out, State_Name attached, so
    /// renderers have the exact boundaries the chart specs join against.
    pub fn export(&self, path: &Path) -> InsightResult<()> {
        std::fs::write(path, serde_json::to_string(&self.collection)?)?;
        Ok(())
    }

    pub fn feature_count(&self) -> usize {
        self.collection.features.len()
    }

    /// Canonical keys usable for joins.
    pub fn keys(&self) -> &HashSet<String> {
        &self.keys
    }

    /// Distinct region keys absent from the reference, sorted. Empty keys
    /// are skipped; they mean the name was missing upstream.
    pub fn unmatched<'a, I>(&self, region_keys: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out: Vec<String> = region_keys
            .into_iter()
            .filter(|k| !k.is_empty() && !self.keys.contains(*k))
            .map(str::to_string)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"NAME_1": " Orissa "},
                "geometry": {"type": "Polygon", "coordinates": [[[77.0, 8.0], [78.0, 8.0], [78.0, 9.0], [77.0, 8.0]]]}
            },
            {
                "type": "Feature",
                "properties": {"NAME_1": 7},
                "geometry": null
            },
            {
                "type": "Feature",
                "properties": null,
                "geometry": null
            }
        ]
    }"#;

    fn write_sample() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file
    }

    #[test]
    fn canonicalizes_names_and_collects_keys() {
        let file = write_sample();
        let reference = GeoReference::load(file.path(), &AliasTable::default());
        assert_eq!(reference.feature_count(), 3);
        assert!(reference.keys().contains("odisha"));
        assert_eq!(reference.keys().len(), 1);
    }

    #[test]
    fn export_carries_canonical_names() {
        let file = write_sample();
        let reference = GeoReference::load(file.path(), &AliasTable::default());
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("states.geojson");
        reference.export(&out).unwrap();

        let collection: FeatureCollection =
            std::fs::read_to_string(&out).unwrap().parse().unwrap();
        let names: Vec<Option<String>> = collection
            .features
            .iter()
            .map(|f| {
                f.property("State_Name")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .collect();
        assert_eq!(names[0].as_deref(), Some("odisha"));
        // Non-string and missing names both canonicalize to "".
        assert_eq!(names[1].as_deref(), Some(""));
        assert_eq!(names[2].as_deref(), Some(""));
    }

    #[test]
    fn missing_file_degrades_to_empty() {
        let reference = GeoReference::load(
            Path::new("/nonexistent/boundaries.geojson"),
            &AliasTable::default(),
        );
        assert_eq!(reference.feature_count(), 0);
        assert!(reference.keys().is_empty());
    }

    #[test]
    fn invalid_json_degrades_to_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not geojson at all").unwrap();
        let reference = GeoReference::load(file.path(), &AliasTable::default());
        assert_eq!(reference.feature_count(), 0);
    }

    #[test]
    fn unmatched_reports_absent_keys_sorted() {
        let file = write_sample();
        let reference = GeoReference::load(file.path(), &AliasTable::default());
        let keys = ["odisha", "kerala", "", "assam", "kerala"];
        assert_eq!(
            reference.unmatched(keys.iter().copied()),
            vec!["assam".to_string(), "kerala".to_string()]
        );
    }
}
