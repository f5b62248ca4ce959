// src/quiz/catalog.rs

//! Derived question sets: shuffled and challenge-mode variants
//! materialized as copy-on-write copies of a source set. The source set
//! is never mutated, and an existing variant with the same title is
//! reused instead of duplicated.

use std::sync::Arc;

use crate::{
    error::AppError,
    models::catalog::{NewAnswer, NewQuestion, NewQuestionSet, QuestionDetail, QuestionSetDetail},
    store::QuizStore,
};

#[derive(Clone)]
pub struct CatalogCurator {
    store: Arc<dyn QuizStore>,
}

impl CatalogCurator {
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self { store }
    }

    /// Creates (or reuses) the shuffled variant of a question set.
    pub async fn create_shuffled_variant(
        &self,
        source_set_id: i64,
    ) -> Result<QuestionSetDetail, AppError> {
        let source = self.load_source(source_set_id).await?;
        let title = format!("{} (Shuffled)", source.title);

        if let Some(existing) = self.find_existing(&title).await? {
            return Ok(existing);
        }

        let description = match &source.description {
            Some(d) => format!("{d} - Questions will be shuffled for each attempt."),
            None => "Questions will be shuffled for each attempt.".to_string(),
        };

        let variant = self
            .store
            .insert_question_set(NewQuestionSet {
                title,
                description: Some(description),
                certification_type_id: source.certification_type_id,
                is_challenge_mode: false,
                json_source: None,
                questions: copy_questions(&source.questions),
            })
            .await?;

        tracing::info!(source_set_id, variant_id = variant.id, "created shuffled variant");
        Ok(variant)
    }

    /// Creates (or reuses) the challenge-mode variant of a question set.
    pub async fn create_challenge_variant(
        &self,
        source_set_id: i64,
        shuffle: bool,
    ) -> Result<QuestionSetDetail, AppError> {
        let source = self.load_source(source_set_id).await?;
        let title = if shuffle {
            format!("{} (Challenge Mode - Shuffled)", source.title)
        } else {
            format!("{} (Challenge Mode)", source.title)
        };

        if let Some(existing) = self.find_existing(&title).await? {
            return Ok(existing);
        }

        let suffix = if shuffle {
            " Questions will be shuffled for each attempt."
        } else {
            ""
        };
        let description = match &source.description {
            Some(d) => format!(
                "{d} - Challenge mode: You can only make 5 mistakes before failing.{suffix}"
            ),
            None => format!("Challenge mode: You can only make 5 mistakes before failing.{suffix}"),
        };

        let variant = self
            .store
            .insert_question_set(NewQuestionSet {
                title,
                description: Some(description),
                certification_type_id: source.certification_type_id,
                is_challenge_mode: true,
                json_source: None,
                questions: copy_questions(&source.questions),
            })
            .await?;

        tracing::info!(source_set_id, variant_id = variant.id, "created challenge variant");
        Ok(variant)
    }

    async fn load_source(&self, set_id: i64) -> Result<QuestionSetDetail, AppError> {
        self.store
            .load_question_set(set_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Source question set not found".to_string()))
    }

    async fn find_existing(&self, title: &str) -> Result<Option<QuestionSetDetail>, AppError> {
        let Some(id) = self.store.find_question_set_id_by_title(title).await? else {
            return Ok(None);
        };
        Ok(self.store.load_question_set(id).await?)
    }
}

fn copy_questions(questions: &[QuestionDetail]) -> Vec<NewQuestion> {
    questions
        .iter()
        .map(|q| NewQuestion {
            question_text: q.question_text.clone(),
            explanation: q.explanation.clone(),
            external_id: q.external_id.clone(),
            answers: q
                .answers
                .iter()
                .map(|a| NewAnswer {
                    answer_text: a.answer_text.clone(),
                    is_correct: a.is_correct,
                    external_id: a.external_id.clone(),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, QuizStore};

    async fn seed(store: &MemoryStore) -> QuestionSetDetail {
        let cert = store.ensure_certification_type("SAA", None).await.unwrap();
        store
            .insert_question_set(NewQuestionSet {
                title: "AWS Practice".to_string(),
                description: Some("Practice questions".to_string()),
                certification_type_id: cert.id,
                is_challenge_mode: false,
                json_source: None,
                questions: vec![NewQuestion {
                    question_text: "q".to_string(),
                    explanation: None,
                    external_id: None,
                    answers: vec![NewAnswer {
                        answer_text: "a".to_string(),
                        is_correct: true,
                        external_id: None,
                    }],
                }],
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn shuffled_variant_copies_the_source() {
        let store = Arc::new(MemoryStore::new());
        let source = seed(&store).await;
        let curator = CatalogCurator::new(store.clone() as Arc<dyn QuizStore>);

        let variant = curator.create_shuffled_variant(source.id).await.unwrap();

        assert_eq!(variant.title, "AWS Practice (Shuffled)");
        assert_ne!(variant.id, source.id);
        assert_eq!(variant.questions.len(), source.questions.len());
        assert!(!variant.is_challenge_mode);
        // Copy, not a reference: the copied question has its own id.
        assert_ne!(variant.questions[0].id, source.questions[0].id);
    }

    #[tokio::test]
    async fn existing_variant_is_reused() {
        let store = Arc::new(MemoryStore::new());
        let source = seed(&store).await;
        let curator = CatalogCurator::new(store.clone() as Arc<dyn QuizStore>);

        let first = curator.create_shuffled_variant(source.id).await.unwrap();
        let second = curator.create_shuffled_variant(source.id).await.unwrap();
        assert_eq!(first.id, second.id);

        let sets = store.list_question_sets().await.unwrap();
        assert_eq!(sets.len(), 2, "source plus one variant");
    }

    #[tokio::test]
    async fn challenge_variant_sets_the_flag() {
        let store = Arc::new(MemoryStore::new());
        let source = seed(&store).await;
        let curator = CatalogCurator::new(store.clone() as Arc<dyn QuizStore>);

        let plain = curator
            .create_challenge_variant(source.id, false)
            .await
            .unwrap();
        assert_eq!(plain.title, "AWS Practice (Challenge Mode)");
        assert!(plain.is_challenge_mode);

        let shuffled = curator
            .create_challenge_variant(source.id, true)
            .await
            .unwrap();
        assert_eq!(shuffled.title, "AWS Practice (Challenge Mode - Shuffled)");
        assert!(shuffled.is_challenge_mode);
    }

    #[tokio::test]
    async fn missing_source_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let curator = CatalogCurator::new(store as Arc<dyn QuizStore>);

        let err = curator.create_shuffled_variant(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
