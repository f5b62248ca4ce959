// src/import.rs

//! Question-set JSON import. Runs as an idempotent startup task (seed
//! file keyed by title), never as a runtime dependency of the quiz core.

use chrono::Utc;
use serde::Deserialize;

use crate::{
    error::AppError,
    models::catalog::{NewAnswer, NewQuestion, NewQuestionSet, QuestionSetDetail},
    store::QuizStore,
};

/// JSON shape of an importable question set.
#[derive(Debug, Deserialize)]
pub struct ImportedQuestionSet {
    pub title: String,
    pub description: Option<String>,
    pub certification_type: String,
    pub questions: Vec<ImportedQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct ImportedQuestion {
    pub question_text: String,
    pub explanation: Option<String>,
    pub external_id: Option<String>,
    pub answers: Vec<ImportedAnswer>,
}

#[derive(Debug, Deserialize)]
pub struct ImportedAnswer {
    pub answer_text: String,
    pub is_correct: bool,
    pub external_id: Option<String>,
}

/// Imports a question set, creating its certification type on demand.
///
/// Rejects sets where a question has no correct answer, since every
/// stored question must keep at least one.
pub async fn import_question_set(
    store: &dyn QuizStore,
    data: ImportedQuestionSet,
) -> Result<QuestionSetDetail, AppError> {
    for (index, question) in data.questions.iter().enumerate() {
        if !question.answers.iter().any(|a| a.is_correct) {
            return Err(AppError::BadRequest(format!(
                "question {} has no correct answer",
                index + 1
            )));
        }
    }

    let cert = store
        .ensure_certification_type(&data.certification_type, None)
        .await?;

    let set = store
        .insert_question_set(NewQuestionSet {
            title: data.title,
            description: data.description,
            certification_type_id: cert.id,
            is_challenge_mode: false,
            json_source: Some(format!("Imported on {}", Utc::now().to_rfc3339())),
            questions: data
                .questions
                .into_iter()
                .map(|q| NewQuestion {
                    question_text: q.question_text,
                    explanation: q.explanation,
                    external_id: q.external_id,
                    answers: q
                        .answers
                        .into_iter()
                        .map(|a| NewAnswer {
                            answer_text: a.answer_text,
                            is_correct: a.is_correct,
                            external_id: a.external_id,
                        })
                        .collect(),
                })
                .collect(),
        })
        .await?;

    tracing::info!(
        set_id = set.id,
        questions = set.questions.len(),
        title = %set.title,
        "imported question set"
    );
    Ok(set)
}

/// Seeds question sets from a JSON file at startup. A set whose title
/// already exists is skipped, so re-running the seed is a no-op.
pub async fn seed_from_file(store: &dyn QuizStore, path: &str) -> Result<(), AppError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::Internal(format!("failed to read seed file {path}: {e}")))?;

    let sets: Vec<ImportedQuestionSet> = serde_json::from_str(&raw)?;

    for data in sets {
        if store
            .find_question_set_id_by_title(&data.title)
            .await?
            .is_some()
        {
            tracing::info!(title = %data.title, "seed set already imported, skipping");
            continue;
        }
        import_question_set(store, data).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn sample(title: &str) -> ImportedQuestionSet {
        ImportedQuestionSet {
            title: title.to_string(),
            description: None,
            certification_type: "Solutions Architect".to_string(),
            questions: vec![ImportedQuestion {
                question_text: "What does S3 stand for?".to_string(),
                explanation: Some("Simple Storage Service".to_string()),
                external_id: Some("q-1".to_string()),
                answers: vec![
                    ImportedAnswer {
                        answer_text: "Simple Storage Service".to_string(),
                        is_correct: true,
                        external_id: None,
                    },
                    ImportedAnswer {
                        answer_text: "Super Secure Storage".to_string(),
                        is_correct: false,
                        external_id: None,
                    },
                ],
            }],
        }
    }

    #[tokio::test]
    async fn import_creates_certification_and_set() {
        let store = MemoryStore::new();
        let set = import_question_set(&store, sample("Set A")).await.unwrap();

        assert_eq!(set.questions.len(), 1);
        assert_eq!(set.questions[0].answers.len(), 2);

        let sets = store.list_question_sets().await.unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].certification, "Solutions Architect");
    }

    #[tokio::test]
    async fn question_without_correct_answer_is_rejected() {
        let store = MemoryStore::new();
        let mut data = sample("Set B");
        data.questions[0].answers[0].is_correct = false;

        let err = import_question_set(&store, data).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn seeding_the_same_file_twice_does_not_duplicate_sets() {
        let store = MemoryStore::new();
        let path = std::env::temp_dir().join("certquiz_seed_roundtrip.json");
        let seed = serde_json::json!([{
            "title": "Seeded Set",
            "description": null,
            "certification_type": "Solutions Architect",
            "questions": [{
                "question_text": "What does S3 stand for?",
                "explanation": null,
                "external_id": null,
                "answers": [
                    { "answer_text": "Simple Storage Service", "is_correct": true, "external_id": null },
                    { "answer_text": "Super Secure Storage", "is_correct": false, "external_id": null }
                ]
            }]
        }]);
        tokio::fs::write(&path, seed.to_string()).await.unwrap();

        let path_str = path.to_str().unwrap();
        seed_from_file(&store, path_str).await.unwrap();
        seed_from_file(&store, path_str).await.unwrap();

        let sets = store.list_question_sets().await.unwrap();
        assert_eq!(sets.len(), 1, "second seed run must skip the existing title");

        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn seeding_skips_titles_already_in_the_store() {
        let store = MemoryStore::new();
        import_question_set(&store, sample("Seeded Set")).await.unwrap();

        let path = std::env::temp_dir().join("certquiz_seed_existing.json");
        let seed = serde_json::json!([{
            "title": "Seeded Set",
            "description": "a different description",
            "certification_type": "Solutions Architect",
            "questions": []
        }]);
        tokio::fs::write(&path, seed.to_string()).await.unwrap();

        seed_from_file(&store, path.to_str().unwrap()).await.unwrap();

        let sets = store.list_question_sets().await.unwrap();
        assert_eq!(sets.len(), 1);
        // The existing set wins; the seed entry was not applied.
        assert_eq!(sets[0].question_count, 1);

        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn reimporting_the_same_certification_reuses_it() {
        let store = MemoryStore::new();
        import_question_set(&store, sample("Set A")).await.unwrap();
        import_question_set(&store, sample("Set B")).await.unwrap();

        let a = store.list_question_sets().await.unwrap();
        assert!(a.iter().all(|s| s.certification == "Solutions Architect"));
    }
}
