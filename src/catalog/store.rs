use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use flate2::read::GzDecoder;

use crate::core::metadata::{DnaCategory, HlaAllele, SequenceStatus};
use crate::core::phenotype::LociInfo;
use crate::core::types::Locus;
use crate::core::typing::AlleleName;

#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("Failed to read dictionary: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse dictionary: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid dictionary: {0}")]
    Invalid(String),
}

/// Dictionary file format version for compatibility checking
pub const DICTIONARY_VERSION: &str = "1.0.0";

/// Serializable dictionary format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryData {
    pub version: String,
    #[serde(default)]
    pub created_at: String,
    pub releases: Vec<ReleaseData>,
}

/// All lookup data for one HLA nomenclature release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseData {
    pub nomenclature_version: String,

    /// NMDP code -> slash-delimited subtype list, e.g. `"AB": "01/02"`
    #[serde(default)]
    pub nmdp_codes: HashMap<String, String>,

    #[serde(default)]
    pub loci: HashMap<Locus, LocusData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocusData {
    #[serde(default)]
    pub alleles: Vec<AlleleRecord>,

    /// Serological antigen -> equivalent allele names
    #[serde(default)]
    pub serologies: HashMap<String, Vec<String>>,
}

/// One allele entry as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlleleRecord {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_group: Option<String>,

    pub g_group: String,

    #[serde(default)]
    pub dna_category: DnaCategory,

    #[serde(default)]
    pub sequence_status: SequenceStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tce_group: Option<String>,
}

/// Indexed alleles and serologies for one locus of one release
#[derive(Debug, Default)]
pub struct LocusIndex {
    pub alleles: Vec<HlaAllele>,

    /// Index: exact allele name -> index in alleles vec
    by_name: HashMap<String, usize>,

    /// Index: first field -> indices of alleles in that allele family
    by_first_field: HashMap<String, Vec<usize>>,

    serologies: HashMap<String, Vec<String>>,
}

impl LocusIndex {
    fn build(locus: Locus, data: LocusData) -> Result<Self, DictionaryError> {
        let mut index = Self {
            serologies: data.serologies,
            ..Self::default()
        };

        for record in data.alleles {
            let parsed = AlleleName::parse(&record.name).ok_or_else(|| {
                DictionaryError::Invalid(format!("{locus} allele name '{}'", record.name))
            })?;

            let position = index.alleles.len();
            if index.by_name.insert(record.name.clone(), position).is_some() {
                return Err(DictionaryError::Invalid(format!(
                    "duplicate {locus} allele '{}'",
                    record.name
                )));
            }
            index
                .by_first_field
                .entry(parsed.first_field().to_string())
                .or_default()
                .push(position);

            index.alleles.push(HlaAllele {
                name: record.name,
                parsed,
                p_group: record.p_group,
                g_group: record.g_group,
                dna_category: record.dna_category,
                sequence_status: record.sequence_status,
                tce_group: record.tce_group,
            });
        }

        Ok(index)
    }

    /// Alleles named by `name`.
    ///
    /// An exact name gives one allele. A name without an expression suffix also
    /// covers every allele it truncates, so `01:01` finds `01:01:01:01` and
    /// `01:01:02`.
    pub fn find_alleles(&self, name: &str) -> Vec<&HlaAllele> {
        if let Some(&idx) = self.by_name.get(name) {
            return vec![&self.alleles[idx]];
        }

        let Some(query) = AlleleName::parse(name) else {
            return Vec::new();
        };
        if query.has_suffix() {
            return Vec::new();
        }

        let stem = query.stem();
        let prefix = format!("{stem}:");
        self.family(query.first_field())
            .filter(|a| {
                let candidate = a.parsed.stem();
                candidate == stem || candidate.starts_with(&prefix)
            })
            .collect()
    }

    /// All alleles sharing a first field
    pub fn family(&self, first_field: &str) -> impl Iterator<Item = &HlaAllele> {
        self.by_first_field
            .get(first_field)
            .into_iter()
            .flatten()
            .map(|&idx| &self.alleles[idx])
    }

    pub fn serology(&self, name: &str) -> Option<&[String]> {
        self.serologies.get(name).map(Vec::as_slice)
    }

    pub fn serology_count(&self) -> usize {
        self.serologies.len()
    }

    pub fn len(&self) -> usize {
        self.alleles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }
}

/// An indexed nomenclature release
#[derive(Debug)]
pub struct NomenclatureRelease {
    pub nomenclature_version: String,
    nmdp_codes: HashMap<String, String>,
    loci: LociInfo<LocusIndex>,
}

impl NomenclatureRelease {
    fn build(data: ReleaseData) -> Result<Self, DictionaryError> {
        let mut raw_loci = data.loci;
        let loci = LociInfo::<()>::default()
            .try_map(|locus, _| LocusIndex::build(locus, raw_loci.remove(&locus).unwrap_or_default()))?;

        Ok(Self {
            nomenclature_version: data.nomenclature_version,
            nmdp_codes: data.nmdp_codes,
            loci,
        })
    }

    pub fn locus(&self, locus: Locus) -> &LocusIndex {
        self.loci.get(locus)
    }

    pub fn nmdp_code(&self, code: &str) -> Option<&str> {
        self.nmdp_codes.get(code).map(String::as_str)
    }

    pub fn nmdp_code_count(&self) -> usize {
        self.nmdp_codes.len()
    }
}

/// The HLA nomenclature dictionary, one indexed release per nomenclature version
#[derive(Debug, Default)]
pub struct HlaMetadataDictionary {
    releases: HashMap<String, NomenclatureRelease>,
}

impl HlaMetadataDictionary {
    /// Load a dictionary from a JSON file, gzip-compressed when it ends in `.gz`
    ///
    /// # Errors
    ///
    /// Returns `DictionaryError::ReadError` if the file cannot be read, or a
    /// parse/consistency error from [`Self::from_json`].
    pub fn load_from_file(path: &Path) -> Result<Self, DictionaryError> {
        let content = read_maybe_gzipped(path)?;
        Self::from_json(&content)
    }

    /// Parse a dictionary from a JSON string
    ///
    /// # Errors
    ///
    /// Returns `DictionaryError::ParseError` for malformed JSON and
    /// `DictionaryError::Invalid` for inconsistent content.
    pub fn from_json(json: &str) -> Result<Self, DictionaryError> {
        let data: DictionaryData = serde_json::from_str(json)?;
        Self::from_data(data)
    }

    /// Index already-deserialized dictionary data
    ///
    /// # Errors
    ///
    /// Returns `DictionaryError::Invalid` for malformed allele names, duplicate
    /// alleles or duplicate releases.
    pub fn from_data(data: DictionaryData) -> Result<Self, DictionaryError> {
        // Version check (warn but don't fail)
        if data.version != DICTIONARY_VERSION {
            warn!(
                "Dictionary format version mismatch (expected {}, found {})",
                DICTIONARY_VERSION, data.version
            );
        }

        let mut dictionary = Self::default();
        for release in data.releases {
            let version = release.nomenclature_version.clone();
            let indexed = NomenclatureRelease::build(release)?;
            if dictionary.releases.insert(version.clone(), indexed).is_some() {
                return Err(DictionaryError::Invalid(format!(
                    "duplicate nomenclature release {version}"
                )));
            }
        }

        Ok(dictionary)
    }

    pub fn release(&self, nomenclature_version: &str) -> Option<&NomenclatureRelease> {
        self.releases.get(nomenclature_version)
    }

    /// Nomenclature versions, oldest first
    pub fn versions(&self) -> Vec<&str> {
        let mut versions: Vec<&str> = self.releases.keys().map(String::as_str).collect();
        versions.sort_by_key(|v| version_key(v));
        versions
    }

    /// The newest nomenclature version in the dictionary
    pub fn latest_version(&self) -> Option<&str> {
        self.versions().last().copied()
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

/// Numeric sort key for dotted versions such as `3.33.0`
fn version_key(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}

/// Read a text file, transparently decompressing `.gz`
pub(crate) fn read_maybe_gzipped(path: &Path) -> std::io::Result<String> {
    let file = std::fs::File::open(path)?;
    let mut content = String::new();
    let is_gzipped = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"));

    if is_gzipped {
        GzDecoder::new(file).read_to_string(&mut content)?;
    } else {
        std::io::BufReader::new(file).read_to_string(&mut content)?;
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{dictionary, FIXTURE_VERSION};
    use std::io::Write;

    #[test]
    fn test_load_fixture_dictionary() {
        let dictionary = dictionary();
        assert_eq!(dictionary.len(), 2);
        assert_eq!(dictionary.versions(), vec!["3.30.0", FIXTURE_VERSION]);
        assert_eq!(dictionary.latest_version(), Some(FIXTURE_VERSION));

        let release = dictionary.release(FIXTURE_VERSION).unwrap();
        assert!(!release.locus(Locus::A).is_empty());
        assert_eq!(release.nmdp_code("AB"), Some("01/02"));
    }

    #[test]
    fn test_find_alleles_exact_and_truncated() {
        let dictionary = dictionary();
        let a = dictionary.release(FIXTURE_VERSION).unwrap().locus(Locus::A);

        let exact = a.find_alleles("01:01:01:01");
        assert_eq!(exact.len(), 1);

        let truncated: Vec<&str> = a
            .find_alleles("01:01")
            .iter()
            .map(|x| x.name.as_str())
            .collect();
        assert_eq!(truncated, vec!["01:01:01:01", "01:01:01:02"]);

        // Suffix means the name must be exact
        assert!(a.find_alleles("01:01N").is_empty());
        assert!(a.find_alleles("99:99").is_empty());
    }

    #[test]
    fn test_duplicate_allele_rejected() {
        let json = r#"{
            "version": "1.0.0",
            "releases": [{
                "nomenclature_version": "1.0.0",
                "loci": {"A": {"alleles": [
                    {"name": "01:01", "p_group": "01:01P", "g_group": "01:01G"},
                    {"name": "01:01", "p_group": "01:01P", "g_group": "01:01G"}
                ]}}
            }]
        }"#;
        let err = HlaMetadataDictionary::from_json(json).unwrap_err();
        assert!(matches!(err, DictionaryError::Invalid(_)));
    }

    #[test]
    fn test_malformed_allele_name_rejected() {
        let json = r#"{
            "version": "1.0.0",
            "releases": [{
                "nomenclature_version": "1.0.0",
                "loci": {"B": {"alleles": [{"name": "B-seven", "g_group": "x"}]}}
            }]
        }"#;
        assert!(HlaMetadataDictionary::from_json(json).is_err());
    }

    #[test]
    fn test_versions_sorted_numerically() {
        let json = r#"{
            "version": "1.0.0",
            "releases": [
                {"nomenclature_version": "3.9.0"},
                {"nomenclature_version": "3.33.0"},
                {"nomenclature_version": "3.10.0"}
            ]
        }"#;
        let dictionary = HlaMetadataDictionary::from_json(json).unwrap();
        assert_eq!(dictionary.versions(), vec!["3.9.0", "3.10.0", "3.33.0"]);
        assert_eq!(dictionary.latest_version(), Some("3.33.0"));
    }

    #[test]
    fn test_load_gzipped_file() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut file = tempfile::Builder::new().suffix(".json.gz").tempfile().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(crate::catalog::fixtures::DICTIONARY_JSON.as_bytes())
            .unwrap();
        file.write_all(&encoder.finish().unwrap()).unwrap();
        file.flush().unwrap();

        let dictionary = HlaMetadataDictionary::load_from_file(file.path()).unwrap();
        assert_eq!(dictionary.latest_version(), Some(FIXTURE_VERSION));
    }
}
