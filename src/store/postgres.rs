// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::models::{
    attempt::{NewAttempt, NewSubmission, QuizAttempt, SubmissionTotals},
    catalog::{
        Answer, CertificationType, NewQuestionSet, QuestionDetail, QuestionSetDetail,
        QuestionSetSummary,
    },
    stats::FinishedAttempt,
    user::User,
};

use super::{QuizStore, StoreError};

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Helper struct for fetching bare question rows.
#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: i64,
    question_set_id: i64,
    question_text: String,
    explanation: Option<String>,
    external_id: Option<String>,
}

impl QuestionRow {
    fn into_detail(self, answers: Vec<Answer>) -> QuestionDetail {
        QuestionDetail {
            id: self.id,
            question_set_id: self.question_set_id,
            question_text: self.question_text,
            explanation: self.explanation,
            external_id: self.external_id,
            answers,
        }
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn insert_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password)
            VALUES ($1, $2, $3)
            RETURNING id, email, username, password, created_at
            "#,
        )
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password, created_at
            FROM users
            WHERE email = $1 OR username = $1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn ensure_certification_type(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<CertificationType, StoreError> {
        // DO UPDATE instead of DO NOTHING so RETURNING yields the row on
        // conflict as well.
        let cert = sqlx::query_as::<_, CertificationType>(
            r#"
            INSERT INTO certification_types (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, description
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(cert)
    }

    async fn list_question_sets(&self) -> Result<Vec<QuestionSetSummary>, StoreError> {
        let sets = sqlx::query_as::<_, QuestionSetSummary>(
            r#"
            SELECT
                qs.id, qs.title, qs.description,
                ct.name AS certification,
                qs.is_challenge_mode,
                (SELECT COUNT(*) FROM questions q WHERE q.question_set_id = qs.id) AS question_count,
                qs.created_at
            FROM question_sets qs
            JOIN certification_types ct ON qs.certification_type_id = ct.id
            ORDER BY qs.created_at DESC, qs.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sets)
    }

    async fn find_question_set_id_by_title(
        &self,
        title: &str,
    ) -> Result<Option<i64>, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"SELECT id FROM question_sets WHERE title = $1 LIMIT 1"#,
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    async fn load_question_set(
        &self,
        set_id: i64,
    ) -> Result<Option<QuestionSetDetail>, StoreError> {
        let set_row = sqlx::query(
            r#"
            SELECT id, title, description, certification_type_id, is_challenge_mode
            FROM question_sets
            WHERE id = $1
            "#,
        )
        .bind(set_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(set_row) = set_row else {
            return Ok(None);
        };

        let questions = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, question_set_id, question_text, explanation, external_id
            FROM questions
            WHERE question_set_id = $1
            ORDER BY id
            "#,
        )
        .bind(set_id)
        .fetch_all(&self.pool)
        .await?;

        let answers = sqlx::query_as::<_, Answer>(
            r#"
            SELECT a.id, a.question_id, a.answer_text, a.is_correct, a.external_id
            FROM answers a
            JOIN questions q ON a.question_id = q.id
            WHERE q.question_set_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(set_id)
        .fetch_all(&self.pool)
        .await?;

        let questions = questions
            .into_iter()
            .map(|q| {
                let own_answers = answers
                    .iter()
                    .filter(|a| a.question_id == q.id)
                    .cloned()
                    .collect();
                q.into_detail(own_answers)
            })
            .collect();

        Ok(Some(QuestionSetDetail {
            id: set_row.try_get("id").map_err(StoreError::from)?,
            title: set_row.try_get("title").map_err(StoreError::from)?,
            description: set_row.try_get("description").map_err(StoreError::from)?,
            certification_type_id: set_row
                .try_get("certification_type_id")
                .map_err(StoreError::from)?,
            is_challenge_mode: set_row
                .try_get("is_challenge_mode")
                .map_err(StoreError::from)?,
            questions,
        }))
    }

    async fn insert_question_set(
        &self,
        new: NewQuestionSet,
    ) -> Result<QuestionSetDetail, StoreError> {
        let mut tx = self.pool.begin().await?;

        let set_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO question_sets
                (title, description, certification_type_id, is_challenge_mode, json_source)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.certification_type_id)
        .bind(new.is_challenge_mode)
        .bind(&new.json_source)
        .fetch_one(&mut *tx)
        .await?;

        let mut questions = Vec::with_capacity(new.questions.len());
        for question in &new.questions {
            let question_id = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO questions (question_set_id, question_text, explanation, external_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(set_id)
            .bind(&question.question_text)
            .bind(&question.explanation)
            .bind(&question.external_id)
            .fetch_one(&mut *tx)
            .await?;

            let mut stored_answers = Vec::with_capacity(question.answers.len());
            for answer in &question.answers {
                let answer_id = sqlx::query_scalar::<_, i64>(
                    r#"
                    INSERT INTO answers (question_id, answer_text, is_correct, external_id)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(question_id)
                .bind(&answer.answer_text)
                .bind(answer.is_correct)
                .bind(&answer.external_id)
                .fetch_one(&mut *tx)
                .await?;

                stored_answers.push(Answer {
                    id: answer_id,
                    question_id,
                    answer_text: answer.answer_text.clone(),
                    is_correct: answer.is_correct,
                    external_id: answer.external_id.clone(),
                });
            }

            questions.push(QuestionDetail {
                id: question_id,
                question_set_id: set_id,
                question_text: question.question_text.clone(),
                explanation: question.explanation.clone(),
                external_id: question.external_id.clone(),
                answers: stored_answers,
            });
        }

        tx.commit().await?;

        Ok(QuestionSetDetail {
            id: set_id,
            title: new.title,
            description: new.description,
            certification_type_id: new.certification_type_id,
            is_challenge_mode: new.is_challenge_mode,
            questions,
        })
    }

    async fn load_question(
        &self,
        question_id: i64,
    ) -> Result<Option<QuestionDetail>, StoreError> {
        let question = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, question_set_id, question_text, explanation, external_id
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(question) = question else {
            return Ok(None);
        };

        let answers = sqlx::query_as::<_, Answer>(
            r#"
            SELECT id, question_id, answer_text, is_correct, external_id
            FROM answers
            WHERE question_id = $1
            ORDER BY id
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(question.into_detail(answers)))
    }

    async fn insert_attempt(&self, new: NewAttempt) -> Result<QuizAttempt, StoreError> {
        let attempt = sqlx::query_as::<_, QuizAttempt>(
            r#"
            INSERT INTO quiz_attempts
                (question_set_id, user_id, total_questions, is_challenge_mode, max_mistakes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.question_set_id)
        .bind(new.user_id)
        .bind(new.total_questions)
        .bind(new.is_challenge_mode)
        .bind(new.max_mistakes)
        .fetch_one(&self.pool)
        .await?;

        Ok(attempt)
    }

    async fn load_attempt(&self, attempt_id: i64) -> Result<Option<QuizAttempt>, StoreError> {
        let attempt = sqlx::query_as::<_, QuizAttempt>(
            r#"SELECT * FROM quiz_attempts WHERE id = $1"#,
        )
        .bind(attempt_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }

    async fn append_submission(
        &self,
        rec: NewSubmission,
    ) -> Result<SubmissionTotals, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO question_attempts
                (quiz_attempt_id, question_id, answer_id, is_correct, time_spent)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(rec.quiz_attempt_id)
        .bind(rec.question_id)
        .bind(rec.answer_id)
        .bind(rec.is_correct)
        .bind(rec.time_spent)
        .execute(&mut *tx)
        .await?;

        if rec.is_correct {
            // Guarded so a lost race can never bump a terminal attempt.
            sqlx::query(
                r#"
                UPDATE quiz_attempts
                SET correct_answers = correct_answers + 1
                WHERE id = $1 AND completed_at IS NULL
                "#,
            )
            .bind(rec.quiz_attempt_id)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE is_correct) AS correct,
                COUNT(*) FILTER (WHERE NOT is_correct) AS incorrect
            FROM question_attempts
            WHERE quiz_attempt_id = $1
            "#,
        )
        .bind(rec.quiz_attempt_id)
        .fetch_one(&mut *tx)
        .await?;

        let totals = SubmissionTotals {
            total: row.try_get("total").map_err(StoreError::from)?,
            correct: row.try_get("correct").map_err(StoreError::from)?,
            incorrect: row.try_get("incorrect").map_err(StoreError::from)?,
        };

        tx.commit().await?;

        Ok(totals)
    }

    async fn count_submissions(
        &self,
        attempt_id: i64,
    ) -> Result<SubmissionTotals, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE is_correct) AS correct,
                COUNT(*) FILTER (WHERE NOT is_correct) AS incorrect
            FROM question_attempts
            WHERE quiz_attempt_id = $1
            "#,
        )
        .bind(attempt_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(SubmissionTotals {
            total: row.try_get("total").map_err(StoreError::from)?,
            correct: row.try_get("correct").map_err(StoreError::from)?,
            incorrect: row.try_get("incorrect").map_err(StoreError::from)?,
        })
    }

    async fn fail_attempt(&self, attempt_id: i64) -> Result<Option<QuizAttempt>, StoreError> {
        // Single guarded statement: recomputes the correct count from the
        // submission log and refuses to touch a terminal attempt.
        let updated = sqlx::query_as::<_, QuizAttempt>(
            r#"
            UPDATE quiz_attempts
            SET failed = TRUE,
                score = 0,
                correct_answers = (
                    SELECT COUNT(*) FROM question_attempts
                    WHERE quiz_attempt_id = $1 AND is_correct
                ),
                completed_at = NOW()
            WHERE id = $1 AND completed_at IS NULL
            RETURNING *
            "#,
        )
        .bind(attempt_id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(attempt) => Ok(Some(attempt)),
            None => self.load_attempt(attempt_id).await,
        }
    }

    async fn complete_attempt(
        &self,
        attempt_id: i64,
        score: f64,
        correct_answers: i32,
    ) -> Result<Option<QuizAttempt>, StoreError> {
        let updated = sqlx::query_as::<_, QuizAttempt>(
            r#"
            UPDATE quiz_attempts
            SET score = $2, correct_answers = $3, completed_at = NOW()
            WHERE id = $1 AND completed_at IS NULL
            RETURNING *
            "#,
        )
        .bind(attempt_id)
        .bind(score)
        .bind(correct_answers)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(attempt) => Ok(Some(attempt)),
            None => self.load_attempt(attempt_id).await,
        }
    }

    async fn list_finished_attempts(
        &self,
        user_id: i64,
    ) -> Result<Vec<FinishedAttempt>, StoreError> {
        let attempts = sqlx::query_as::<_, FinishedAttempt>(
            r#"
            SELECT
                qa.id, qa.question_set_id,
                qs.title AS set_title,
                ct.name AS certification,
                qa.score, qa.total_questions, qa.correct_answers,
                qa.is_challenge_mode, qa.failed,
                qa.started_at, qa.completed_at,
                (SELECT COUNT(*) FROM question_attempts p
                 WHERE p.quiz_attempt_id = qa.id) AS answered
            FROM quiz_attempts qa
            JOIN question_sets qs ON qa.question_set_id = qs.id
            JOIN certification_types ct ON qs.certification_type_id = ct.id
            WHERE qa.user_id = $1 AND qa.completed_at IS NOT NULL
            ORDER BY qa.started_at DESC, qa.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attempts)
    }
}
