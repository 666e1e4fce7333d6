//! Stimulus catalog: one word list per category.
//!
//! The default catalog is the fixed Spanish word set (10 words per category).
//! A custom catalog can be loaded from JSON; either way it is validated before
//! any session can use it, so trial generation never sees an empty or
//! ambiguous list.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::{Category, Stimulus};

const WORDS_HUMAN: [&str; 10] = [
    "Persona",
    "Individuo",
    "Humano",
    "Gente",
    "Nosotros",
    "Él",
    "Ella",
    "Ellos",
    "Ciudadano",
    "Vecino",
];

const WORDS_AI: [&str; 10] = [
    "Robot",
    "Algoritmo",
    "Programa",
    "IA",
    "Inteligencia Artificial",
    "Máquina",
    "Computadora",
    "Bot",
    "Sistema Inteligente",
    "Red Neuronal",
];

const WORDS_TRUST: [&str; 10] = [
    "Confiable",
    "Seguro",
    "Honesto",
    "Sincero",
    "Auténtico",
    "Fiable",
    "Veraz",
    "Responsable",
    "Leal",
    "Ético",
];

const WORDS_UNTRUST: [&str; 10] = [
    "No Confiable",
    "Sospechoso",
    "Falso",
    "Engañoso",
    "Deshonesto",
    "Inseguro",
    "Irresponsable",
    "Infiel",
    "Dudoso",
    "Poco Ético",
];

/// On-disk catalog layout.
#[derive(Deserialize)]
struct CatalogFile {
    human: Vec<String>,
    ai: Vec<String>,
    trust: Vec<String>,
    untrust: Vec<String>,
}

/// Validated word lists, indexed by [`Category`].
#[derive(Clone, Debug)]
pub struct Catalog {
    lists: [Vec<Stimulus>; 4],
}

#[inline]
fn slot(category: Category) -> usize {
    match category {
        Category::HumanConcept => 0,
        Category::AiConcept => 1,
        Category::TrustAttribute => 2,
        Category::UntrustAttribute => 3,
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let build = |words: &[&str], category| {
            words
                .iter()
                .map(|w| Stimulus::new(*w, category))
                .collect::<Vec<_>>()
        };
        Self {
            lists: [
                build(&WORDS_HUMAN, Category::HumanConcept),
                build(&WORDS_AI, Category::AiConcept),
                build(&WORDS_TRUST, Category::TrustAttribute),
                build(&WORDS_UNTRUST, Category::UntrustAttribute),
            ],
        }
    }
}

impl Catalog {
    /// Build a catalog from four word lists.
    ///
    /// Rejects empty lists, blank words, and any word that appears twice
    /// (within or across categories). Words are trimmed.
    pub fn new(
        human: Vec<String>,
        ai: Vec<String>,
        trust: Vec<String>,
        untrust: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut lists: [Vec<Stimulus>; 4] = Default::default();

        for (category, words) in Category::ALL.into_iter().zip([human, ai, trust, untrust]) {
            if words.is_empty() {
                return Err(ConfigError::EmptyCategory(category));
            }
            for word in words {
                let word = word.trim().to_string();
                if word.is_empty() {
                    return Err(ConfigError::BlankWord(category));
                }
                if !seen.insert(word.clone()) {
                    return Err(ConfigError::DuplicateWord { word });
                }
                lists[slot(category)].push(Stimulus::new(word, category));
            }
        }

        Ok(Self { lists })
    }

    /// Load and validate a catalog JSON file with `human`, `ai`, `trust` and
    /// `untrust` string arrays.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogIo {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CatalogFile =
            serde_json::from_str(&content).map_err(|source| ConfigError::CatalogParse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::new(file.human, file.ai, file.trust, file.untrust)
    }

    /// Stimuli of one category, in catalog order.
    pub fn stimuli(&self, category: Category) -> &[Stimulus] {
        &self.lists[slot(category)]
    }

    /// Total number of words across all categories.
    pub fn len(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_default_catalog_sizes() {
        let cat = Catalog::default();
        for c in Category::ALL {
            assert_eq!(cat.stimuli(c).len(), 10);
            assert!(cat.stimuli(c).iter().all(|s| s.category == c));
        }
        assert_eq!(cat.len(), 40);
    }

    #[test]
    fn test_default_catalog_passes_validation() {
        let cat = Catalog::default();
        let list = |c: Category| -> Vec<String> {
            cat.stimuli(c).iter().map(|s| s.text.clone()).collect()
        };
        let rebuilt = Catalog::new(
            list(Category::HumanConcept),
            list(Category::AiConcept),
            list(Category::TrustAttribute),
            list(Category::UntrustAttribute),
        );
        assert!(rebuilt.is_ok());
    }

    #[test]
    fn test_empty_category_rejected() {
        let err = Catalog::new(words(&["a"]), vec![], words(&["c"]), words(&["d"])).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyCategory(Category::AiConcept)));
    }

    #[test]
    fn test_blank_word_rejected() {
        let err =
            Catalog::new(words(&["a"]), words(&["b"]), words(&["  "]), words(&["d"])).unwrap_err();
        assert!(matches!(err, ConfigError::BlankWord(Category::TrustAttribute)));
    }

    #[test]
    fn test_duplicate_across_categories_rejected() {
        let err = Catalog::new(words(&["a"]), words(&["b"]), words(&["x"]), words(&["x "]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateWord { ref word } if word == "x"));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{"human":["Persona"],"ai":["Robot"],"trust":["Leal"],"untrust":["Falso"]}"#,
        )
        .unwrap();
        let cat = Catalog::from_json_file(&path).unwrap();
        assert_eq!(cat.len(), 4);
        assert_eq!(cat.stimuli(Category::UntrustAttribute)[0].text, "Falso");
    }

    #[test]
    fn test_from_json_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            Catalog::from_json_file(&missing),
            Err(ConfigError::CatalogIo { .. })
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"human":["Persona"]}"#).unwrap();
        assert!(matches!(
            Catalog::from_json_file(&bad),
            Err(ConfigError::CatalogParse { .. })
        ));
    }
}
