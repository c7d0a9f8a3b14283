use std::path::Path;
use std::sync::Arc;

use crate::models::{PipelineError, Result};

/// Flower classes in the order of the bundled model's output vector
pub const DEFAULT_FLOWER_LABELS: &[&str] = &[
    "Aconitum", "Actaea", "Agapanthus", "Alchemilla", "Anemone", "Arctostaphylos", "Armeria", "Asclepias",
    "Astilbe", "Aubrieta", "Azalea", "Bergenia", "Calibrachoa", "Calluna", "Campanula", "Cannabis",
    "Clematis", "Columbine", "Coreopsis", "Corydalis", "Crocus", "Dahlia", "Delphinium", "Dicentra", "Echinacea",
    "Episcia", "Erica", "Eryngium", "Freesia", "Fuchsia", "Galax", "Gardenia", "Geranium", "Gloxinia", "Helleborus",
    "Hemerocallis", "Hibiscus", "Hosta", "Impatiens", "Ipomoea", "Iris", "Kalanchoe", "Kniphofia", "Lobelia",
    "Lupinus", "Mandevilla", "Monarda", "Nicotiana", "Oenothera", "Osteospermum", "Papaver", "Passiflora", "Pelargonium",
    "Penstemon", "Petunia", "Phlox", "Plumbago", "Potentilla", "Primula", "Rhododendron", "Rudbeckia", "Salvia", "Scabiosa",
    "Sedges", "Senecio", "Silene", "Sinningia", "Soleirolia", "Solanum", "Stachys", "Sundew", "Sutera", "Tropaeolum",
    "Tulip", "Verbena", "Vinca", "Viola", "Vitis", "Zinnia",
];

/// Ordered, immutable mapping from model output index to class name.
///
/// Cloning is cheap; all clones share one allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassLabelTable {
    labels: Arc<[String]>,
}

impl ClassLabelTable {
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(PipelineError::Configuration("label table is empty".to_string()));
        }
        Ok(Self { labels: labels.into() })
    }

    pub fn flowers() -> Self {
        Self {
            labels: DEFAULT_FLOWER_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Parses one label per line; blank lines and `#` comments are skipped
    pub fn parse(text: &str) -> Result<Self> {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!("failed to read label file {}: {}", path.display(), e))
        })?;
        let table = Self::parse(&text)?;
        tracing::info!(path = %path.display(), labels = table.len(), "Loaded label table");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Picks the label with the highest score.
    ///
    /// The score vector must line up with the table exactly; ties go to the
    /// lowest index.
    pub fn select(&self, scores: &[f32]) -> Result<(usize, &str, f32)> {
        if scores.len() != self.labels.len() {
            return Err(PipelineError::Inference(format!(
                "classifier returned {} scores but the label table has {} entries",
                scores.len(),
                self.labels.len()
            )));
        }
        let (index, score) = argmax(scores)?;
        Ok((index, self.labels[index].as_str(), score))
    }
}

/// Index of the first maximum. NaN scores are rejected.
pub fn argmax(scores: &[f32]) -> Result<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            return Err(PipelineError::Inference(format!("score at index {} is NaN", i)));
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.ok_or_else(|| PipelineError::Inference("classifier returned no scores".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flower_table_is_unique() {
        let table = ClassLabelTable::flowers();
        assert_eq!(table.len(), 79);
        let mut names: Vec<&str> = table.iter().collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), table.len());
        assert_eq!(table.get(0), Some("Aconitum"));
        assert_eq!(table.get(78), Some("Zinnia"));
        assert_eq!(table.get(79), None);
    }

    #[test]
    fn selects_first_maximum_on_ties() {
        let table = ClassLabelTable::new(["a", "b", "c", "d"]).unwrap();
        let (idx, label, score) = table.select(&[0.1, 0.4, 0.4, 0.1]).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(label, "b");
        assert_eq!(score, 0.4);
    }

    #[test]
    fn handles_negative_scores() {
        let table = ClassLabelTable::new(["a", "b", "c"]).unwrap();
        let (_, label, _) = table.select(&[-3.0, -1.5, -2.0]).unwrap();
        assert_eq!(label, "b");
    }

    #[test]
    fn rejects_length_mismatch() {
        let table = ClassLabelTable::new(["a", "b", "c"]).unwrap();
        let err = table.select(&[0.1, 0.9]).unwrap_err();
        assert!(matches!(err, PipelineError::Inference(_)));
        let err = table.select(&[0.1, 0.2, 0.3, 0.4]).unwrap_err();
        assert!(matches!(err, PipelineError::Inference(_)));
    }

    #[test]
    fn rejects_nan() {
        let table = ClassLabelTable::new(["a", "b"]).unwrap();
        let err = table.select(&[f32::NAN, 0.5]).unwrap_err();
        assert!(err.to_string().contains("NaN"));
    }

    #[test]
    fn parses_label_file_text() {
        let table = ClassLabelTable::parse("# flowers\nRose\n\n  Tulip  \nDaisy\n").unwrap();
        assert_eq!(table.iter().collect::<Vec<_>>(), vec!["Rose", "Tulip", "Daisy"]);
        assert!(table.contains("Tulip"));
        assert!(!table.contains("# flowers"));
    }

    #[test]
    fn empty_table_is_a_configuration_error() {
        let err = ClassLabelTable::parse("\n# nothing\n").unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
