// analysis/classify.rs
use crate::settings::{AnalysisSettings, ClassifyBy};
use crate::types::ServiceKind;

/// TV/Radio decision from a configurable keyword list
#[derive(Debug, Clone)]
pub struct KindClassifier {
    keywords: Vec<String>,
    by: ClassifyBy,
}

impl Default for KindClassifier {
    fn default() -> Self {
        Self::from_settings(&AnalysisSettings::default())
    }
}

impl KindClassifier {
    pub fn new<I, S>(keywords: I, by: ClassifyBy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            by,
        }
    }

    pub fn from_settings(settings: &AnalysisSettings) -> Self {
        Self::new(&settings.radio_keywords, settings.classify_by)
    }

    pub fn classify(&self, name: &str, provider: &str) -> ServiceKind {
        let radio = match self.by {
            ClassifyBy::Name => self.matches(name),
            ClassifyBy::Provider => self.matches(provider),
            ClassifyBy::Either => self.matches(name) || self.matches(provider),
        };
        if radio { ServiceKind::Radio } else { ServiceKind::Tv }
    }

    fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}
