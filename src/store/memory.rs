// src/store/memory.rs

//! In-memory store used by the engine tests and the HTTP integration
//! tests, so the full attempt lifecycle can be exercised without a
//! running Postgres.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{
    attempt::{NewAttempt, NewSubmission, QuestionAttempt, QuizAttempt, SubmissionTotals},
    catalog::{
        Answer, CertificationType, NewQuestionSet, QuestionDetail, QuestionSetDetail,
        QuestionSetSummary,
    },
    stats::FinishedAttempt,
    user::User,
};

use super::{QuizStore, StoreError};

struct StoredSet {
    detail: QuestionSetDetail,
    created_at: chrono::DateTime<chrono::Utc>,
}

struct Inner {
    users: Vec<User>,
    certifications: Vec<CertificationType>,
    sets: Vec<StoredSet>,
    attempts: Vec<QuizAttempt>,
    submissions: Vec<QuestionAttempt>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn totals_for(&self, attempt_id: i64) -> SubmissionTotals {
        let mut totals = SubmissionTotals::default();
        for sub in self.submissions.iter().filter(|s| s.quiz_attempt_id == attempt_id) {
            totals.total += 1;
            if sub.is_correct {
                totals.correct += 1;
            } else {
                totals.incorrect += 1;
            }
        }
        totals
    }
}

/// Mutex-backed store. Every trait method takes the lock once, so each
/// operation is atomic just like its single-statement SQL counterpart.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                users: Vec::new(),
                certifications: Vec::new(),
                sets: Vec::new(),
                attempts: Vec::new(),
                submissions: Vec::new(),
                next_id: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only happens after a panic in another test
        // thread; propagate it.
        self.inner.lock().unwrap()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn insert_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let mut inner = self.lock();

        if inner.users.iter().any(|u| u.email == email) {
            return Err(StoreError::Conflict(format!(
                "email '{email}' already exists"
            )));
        }
        if inner.users.iter().any(|u| u.username == username) {
            return Err(StoreError::Conflict(format!(
                "username '{username}' already exists"
            )));
        }

        let user = User {
            id: inner.next_id(),
            email: email.to_string(),
            username: username.to_string(),
            password: password_hash.to_string(),
            created_at: Some(Utc::now()),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<User>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .users
            .iter()
            .find(|u| u.email == identifier || u.username == identifier)
            .cloned())
    }

    async fn ensure_certification_type(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<CertificationType, StoreError> {
        let mut inner = self.lock();

        if let Some(existing) = inner.certifications.iter().find(|c| c.name == name) {
            return Ok(existing.clone());
        }

        let cert = CertificationType {
            id: inner.next_id(),
            name: name.to_string(),
            description: description.map(str::to_string),
        };
        inner.certifications.push(cert.clone());
        Ok(cert)
    }

    async fn list_question_sets(&self) -> Result<Vec<QuestionSetSummary>, StoreError> {
        let inner = self.lock();

        let mut sets: Vec<QuestionSetSummary> = inner
            .sets
            .iter()
            .map(|stored| {
                let certification = inner
                    .certifications
                    .iter()
                    .find(|c| c.id == stored.detail.certification_type_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_default();
                QuestionSetSummary {
                    id: stored.detail.id,
                    title: stored.detail.title.clone(),
                    description: stored.detail.description.clone(),
                    certification,
                    is_challenge_mode: stored.detail.is_challenge_mode,
                    question_count: stored.detail.questions.len() as i64,
                    created_at: Some(stored.created_at),
                }
            })
            .collect();

        sets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(sets)
    }

    async fn find_question_set_id_by_title(
        &self,
        title: &str,
    ) -> Result<Option<i64>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .sets
            .iter()
            .find(|s| s.detail.title == title)
            .map(|s| s.detail.id))
    }

    async fn load_question_set(
        &self,
        set_id: i64,
    ) -> Result<Option<QuestionSetDetail>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .sets
            .iter()
            .find(|s| s.detail.id == set_id)
            .map(|s| s.detail.clone()))
    }

    async fn insert_question_set(
        &self,
        new: NewQuestionSet,
    ) -> Result<QuestionSetDetail, StoreError> {
        let mut inner = self.lock();

        let set_id = inner.next_id();
        let mut questions = Vec::with_capacity(new.questions.len());
        for question in new.questions {
            let question_id = inner.next_id();
            let answers = question
                .answers
                .into_iter()
                .map(|a| Answer {
                    id: inner.next_id(),
                    question_id,
                    answer_text: a.answer_text,
                    is_correct: a.is_correct,
                    external_id: a.external_id,
                })
                .collect();
            questions.push(QuestionDetail {
                id: question_id,
                question_set_id: set_id,
                question_text: question.question_text,
                explanation: question.explanation,
                external_id: question.external_id,
                answers,
            });
        }

        let detail = QuestionSetDetail {
            id: set_id,
            title: new.title,
            description: new.description,
            certification_type_id: new.certification_type_id,
            is_challenge_mode: new.is_challenge_mode,
            questions,
        };
        inner.sets.push(StoredSet {
            detail: detail.clone(),
            created_at: Utc::now(),
        });
        Ok(detail)
    }

    async fn load_question(
        &self,
        question_id: i64,
    ) -> Result<Option<QuestionDetail>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .sets
            .iter()
            .flat_map(|s| s.detail.questions.iter())
            .find(|q| q.id == question_id)
            .cloned())
    }

    async fn insert_attempt(&self, new: NewAttempt) -> Result<QuizAttempt, StoreError> {
        let mut inner = self.lock();

        let attempt = QuizAttempt {
            id: inner.next_id(),
            question_set_id: new.question_set_id,
            user_id: new.user_id,
            score: 0.0,
            total_questions: new.total_questions,
            correct_answers: 0,
            is_challenge_mode: new.is_challenge_mode,
            max_mistakes: new.max_mistakes,
            failed: false,
            started_at: Some(Utc::now()),
            completed_at: None,
        };
        inner.attempts.push(attempt.clone());
        Ok(attempt)
    }

    async fn load_attempt(&self, attempt_id: i64) -> Result<Option<QuizAttempt>, StoreError> {
        let inner = self.lock();
        Ok(inner.attempts.iter().find(|a| a.id == attempt_id).cloned())
    }

    async fn append_submission(
        &self,
        rec: NewSubmission,
    ) -> Result<SubmissionTotals, StoreError> {
        let mut inner = self.lock();

        let record = QuestionAttempt {
            id: inner.next_id(),
            quiz_attempt_id: rec.quiz_attempt_id,
            question_id: rec.question_id,
            answer_id: rec.answer_id,
            is_correct: rec.is_correct,
            time_spent: rec.time_spent,
            created_at: Some(Utc::now()),
        };
        inner.submissions.push(record);

        if rec.is_correct {
            if let Some(attempt) = inner
                .attempts
                .iter_mut()
                .find(|a| a.id == rec.quiz_attempt_id && a.completed_at.is_none())
            {
                attempt.correct_answers += 1;
            }
        }

        Ok(inner.totals_for(rec.quiz_attempt_id))
    }

    async fn count_submissions(
        &self,
        attempt_id: i64,
    ) -> Result<SubmissionTotals, StoreError> {
        let inner = self.lock();
        Ok(inner.totals_for(attempt_id))
    }

    async fn fail_attempt(&self, attempt_id: i64) -> Result<Option<QuizAttempt>, StoreError> {
        let mut inner = self.lock();

        let correct = inner.totals_for(attempt_id).correct;
        let Some(attempt) = inner.attempts.iter_mut().find(|a| a.id == attempt_id) else {
            return Ok(None);
        };

        if attempt.completed_at.is_none() {
            attempt.failed = true;
            attempt.score = 0.0;
            attempt.correct_answers = correct as i32;
            attempt.completed_at = Some(Utc::now());
        }
        Ok(Some(attempt.clone()))
    }

    async fn complete_attempt(
        &self,
        attempt_id: i64,
        score: f64,
        correct_answers: i32,
    ) -> Result<Option<QuizAttempt>, StoreError> {
        let mut inner = self.lock();

        let Some(attempt) = inner.attempts.iter_mut().find(|a| a.id == attempt_id) else {
            return Ok(None);
        };

        if attempt.completed_at.is_none() {
            attempt.score = score;
            attempt.correct_answers = correct_answers;
            attempt.completed_at = Some(Utc::now());
        }
        Ok(Some(attempt.clone()))
    }

    async fn list_finished_attempts(
        &self,
        user_id: i64,
    ) -> Result<Vec<FinishedAttempt>, StoreError> {
        let inner = self.lock();

        let mut finished: Vec<FinishedAttempt> = inner
            .attempts
            .iter()
            .filter(|a| a.user_id == Some(user_id) && a.completed_at.is_some())
            .map(|a| {
                let stored = inner.sets.iter().find(|s| s.detail.id == a.question_set_id);
                let set_title = stored
                    .map(|s| s.detail.title.clone())
                    .unwrap_or_default();
                let certification = stored
                    .and_then(|s| {
                        inner
                            .certifications
                            .iter()
                            .find(|c| c.id == s.detail.certification_type_id)
                    })
                    .map(|c| c.name.clone())
                    .unwrap_or_default();
                FinishedAttempt {
                    id: a.id,
                    question_set_id: a.question_set_id,
                    set_title,
                    certification,
                    score: a.score,
                    total_questions: a.total_questions,
                    correct_answers: a.correct_answers,
                    is_challenge_mode: a.is_challenge_mode,
                    failed: a.failed,
                    started_at: a.started_at,
                    completed_at: a.completed_at,
                    answered: inner.totals_for(a.id).total,
                }
            })
            .collect();

        finished.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.cmp(&a.id)));
        Ok(finished)
    }
}
