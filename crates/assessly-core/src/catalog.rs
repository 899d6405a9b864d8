//! Assessment catalog: the list of assessments a taker can start.

use crate::error::BackendError;
use crate::model::{route_id, Assessment};
use crate::traits::AssessmentBackend;

/// Cached list of available assessments.
#[derive(Debug, Default)]
pub struct AssessmentCatalog {
    assessments: Vec<Assessment>,
}

impl AssessmentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reload the list from the backend.
    ///
    /// Single attempt. On failure the previous list is kept as it was.
    pub async fn refresh(&mut self, backend: &dyn AssessmentBackend) -> Result<usize, BackendError> {
        match backend.list_assessments().await {
            Ok(assessments) => {
                tracing::info!(
                    backend = backend.name(),
                    count = assessments.len(),
                    "loaded assessments"
                );
                self.assessments = assessments;
                Ok(self.assessments.len())
            }
            Err(e) => {
                tracing::error!(backend = backend.name(), "failed to load assessments: {e}");
                Err(e)
            }
        }
    }

    pub fn assessments(&self) -> &[Assessment] {
        &self.assessments
    }

    pub fn is_empty(&self) -> bool {
        self.assessments.is_empty()
    }

    /// Look up an assessment by ID, with or without the storage prefix.
    pub fn get(&self, id: &str) -> Option<&Assessment> {
        let wanted = route_id(id);
        self.assessments.iter().find(|a| a.route_id() == wanted)
    }

    /// Filter by category (case-insensitive) and a free-text search over
    /// title and description.
    pub fn filter(&self, category: Option<&str>, search: Option<&str>) -> Vec<&Assessment> {
        let search = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
        self.assessments
            .iter()
            .filter(|a| category.is_none_or(|c| a.category.eq_ignore_ascii_case(c.trim())))
            .filter(|a| {
                search.as_deref().is_none_or(|q| {
                    a.title.to_lowercase().contains(q) || a.description.to_lowercase().contains(q)
                })
            })
            .collect()
    }

    /// Distinct categories in catalog order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for a in &self.assessments {
            if !a.category.is_empty() && !seen.contains(&a.category.as_str()) {
                seen.push(a.category.as_str());
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::model::{Answers, SubmitResponse, Submission};
    use crate::traits::FeedbackUpdate;

    struct FlakyBackend {
        fail: AtomicBool,
    }

    fn assessment(id: &str, title: &str, category: &str) -> Assessment {
        Assessment {
            id: format!("assessment:{id}"),
            title: title.into(),
            description: format!("All about {title}"),
            category: category.into(),
            duration: 5,
            questions: vec![],
        }
    }

    #[async_trait]
    impl AssessmentBackend for FlakyBackend {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn list_assessments(&self) -> Result<Vec<Assessment>, BackendError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(BackendError::Network("connection reset".into()));
            }
            Ok(vec![
                assessment("1", "Fractions", "Math"),
                assessment("2", "Cells", "Science"),
                assessment("3", "Decimals", "Math"),
            ])
        }

        async fn fetch_assessment(&self, id: &str) -> Result<Assessment, BackendError> {
            Err(BackendError::NotFound(id.into()))
        }

        async fn submit(&self, _: &str, _: &Answers) -> Result<SubmitResponse, BackendError> {
            unimplemented!()
        }

        async fn list_submissions(&self) -> Result<Vec<Submission>, BackendError> {
            Ok(vec![])
        }

        async fn save_feedback(&self, _: &str, _: &FeedbackUpdate) -> Result<(), BackendError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn failed_first_load_leaves_catalog_empty() {
        let backend = FlakyBackend {
            fail: AtomicBool::new(true),
        };
        let mut catalog = AssessmentCatalog::new();
        assert!(catalog.refresh(&backend).await.is_err());
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_list() {
        let backend = FlakyBackend {
            fail: AtomicBool::new(false),
        };
        let mut catalog = AssessmentCatalog::new();
        assert_eq!(catalog.refresh(&backend).await.unwrap(), 3);

        backend.fail.store(true, Ordering::SeqCst);
        assert!(catalog.refresh(&backend).await.is_err());
        assert_eq!(catalog.assessments().len(), 3);
    }

    #[tokio::test]
    async fn lookup_and_filter() {
        let backend = FlakyBackend {
            fail: AtomicBool::new(false),
        };
        let mut catalog = AssessmentCatalog::new();
        catalog.refresh(&backend).await.unwrap();

        assert_eq!(catalog.get("2").unwrap().title, "Cells");
        assert_eq!(catalog.get("assessment:3").unwrap().title, "Decimals");
        assert!(catalog.get("9").is_none());

        assert_eq!(catalog.filter(Some("math"), None).len(), 2);
        assert_eq!(catalog.filter(None, Some("cell")).len(), 1);
        assert_eq!(catalog.filter(Some("Math"), Some("fraction")).len(), 1);
        assert_eq!(catalog.filter(None, Some("  ")).len(), 3);
        assert_eq!(catalog.categories(), vec!["Math", "Science"]);
    }
}
