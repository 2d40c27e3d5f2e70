//! Class label lookup for classifier outputs

use crate::{
    defaults,
    error::{AppError, ErrorContext, Result},
    models::ClassificationResult,
};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Index of the highest score; ties resolve to the first index
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        match best {
            Some((_, best_score)) if score > best_score => best = Some((index, score)),
            None => best = Some((index, score)),
            _ => {}
        }
    }
    best.map(|(index, _)| index)
}

/// Newline-delimited class labels; line `i` names class `i`
#[derive(Debug, Clone)]
pub struct Synset {
    labels: Vec<String>,
    path: PathBuf,
}

impl Synset {
    /// Where the synset of a model lives.
    ///
    /// A directory prefix holds its own `synset.txt`; a file-like prefix
    /// shares the one in its parent directory.
    pub fn path_for_prefix(prefix: &str) -> PathBuf {
        let prefix = Path::new(prefix);
        if prefix.is_dir() {
            return prefix.join(defaults::SYNSET_FILE_NAME);
        }
        match prefix.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(defaults::SYNSET_FILE_NAME),
            _ => PathBuf::from(defaults::SYNSET_FILE_NAME),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read synset {}", path.display()))?;
        let labels = content
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect();
        Ok(Self {
            labels,
            path: path.to_path_buf(),
        })
    }

    pub fn for_prefix(prefix: &str) -> Result<Self> {
        Self::load(Self::path_for_prefix(prefix))
    }

    pub fn from_labels(labels: Vec<String>) -> Self {
        Self {
            labels,
            path: PathBuf::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn lookup(&self, index: usize) -> Result<&str> {
        self.labels.get(index).map(String::as_str).ok_or_else(|| {
            AppError::label(format!(
                "Class index {} is beyond the {} labels in {}",
                index,
                self.labels.len(),
                self.path.display()
            ))
        })
    }

    /// Winning class of one output vector
    pub fn classify(&self, scores: &[f32]) -> Result<ClassificationResult> {
        let index = argmax(scores).ok_or_else(|| AppError::inference("Model produced an empty output vector"))?;
        Ok(ClassificationResult {
            index,
            label: self.lookup(index)?.to_string(),
            probability: scores[index],
        })
    }

    /// The `k` best classes, best first; equal scores keep index order
    pub fn top_k(&self, scores: &[f32], k: usize) -> Result<Vec<ClassificationResult>> {
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

        order
            .into_iter()
            .take(k)
            .map(|index| {
                Ok(ClassificationResult {
                    index,
                    label: self.lookup(index)?.to_string(),
                    probability: scores[index],
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn synset() -> Synset {
        Synset::from_labels(vec!["cat".into(), "dog".into(), "fish".into()])
    }

    #[test]
    fn test_argmax_ties_pick_first() {
        assert_eq!(argmax(&[0.2, 0.2, 0.1]), Some(0));
        assert_eq!(argmax(&[0.1, 0.7, 0.7]), Some(1));
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[-3.0, -1.0, -2.0]), Some(1));
    }

    #[test]
    fn test_classify() {
        let result = synset().classify(&[0.1, 0.6, 0.3]).unwrap();
        assert_eq!(result.index, 1);
        assert_eq!(result.label, "dog");
        assert_eq!(result.report_line(), "Probability : 0.6 Class : dog");
    }

    #[test]
    fn test_index_beyond_labels_is_label_error() {
        let err = synset().classify(&[0.0, 0.0, 0.0, 0.9]).unwrap_err();
        assert_eq!(err.category(), "LABEL");
        assert!(synset().classify(&[]).is_err());
    }

    #[test]
    fn test_top_k() {
        let top = synset().top_k(&[0.3, 0.5, 0.3], 2).unwrap();
        let indices: Vec<usize> = top.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 0]);
        assert_eq!(synset().top_k(&[0.3, 0.5, 0.2], 10).unwrap().len(), 3);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("synset.txt");
        std::fs::write(&path, "n01440764 tench\r\nn01443537 goldfish\n\nn01484850 great white shark\n").unwrap();

        let synset = Synset::load(&path).unwrap();
        assert_eq!(synset.len(), 4);
        assert_eq!(synset.lookup(0).unwrap(), "n01440764 tench");
        assert_eq!(synset.lookup(2).unwrap(), "");
        assert!(Synset::load(dir.path().join("missing.txt")).is_err());
    }

    #[test]
    fn test_path_for_prefix() {
        let dir = TempDir::new().unwrap();
        let model_dir = dir.path().join("resnet");
        std::fs::create_dir(&model_dir).unwrap();

        let as_dir = Synset::path_for_prefix(model_dir.to_str().unwrap());
        assert_eq!(as_dir, model_dir.join("synset.txt"));

        let file_prefix = model_dir.join("resnet18_v1");
        let as_file = Synset::path_for_prefix(file_prefix.to_str().unwrap());
        assert_eq!(as_file, model_dir.join("synset.txt"));

        assert_eq!(Synset::path_for_prefix("resnet18_v1"), PathBuf::from("synset.txt"));
    }
}
