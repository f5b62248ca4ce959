// src/quiz/bank.rs

//! Read-only access to question sets with randomized presentation order.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::{
    error::AppError,
    models::catalog::{AnswerView, QuestionSetDetail, QuestionSetView, QuestionView},
    store::QuizStore,
};

/// Serves question sets in presentation order.
#[derive(Clone)]
pub struct QuestionBank {
    store: Arc<dyn QuizStore>,
}

impl QuestionBank {
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self { store }
    }

    /// Loads a question set and prepares it for presentation.
    ///
    /// Question order is a uniform random permutation when
    /// `shuffle_questions` is set, stored order otherwise. Answer order
    /// inside every question is always freshly randomized so the correct
    /// answer cannot be memorized by position. Returns `None` when the id
    /// does not resolve.
    pub async fn get_presentation_set(
        &self,
        set_id: i64,
        shuffle_questions: bool,
    ) -> Result<Option<QuestionSetView>, AppError> {
        let Some(set) = self.store.load_question_set(set_id).await? else {
            return Ok(None);
        };

        Ok(Some(present(set, shuffle_questions, &mut rand::thread_rng())))
    }
}

/// Builds the presentation view of a loaded set. The permutation source
/// is injected so tests can drive it with a seeded generator.
pub fn present<R: Rng>(
    set: QuestionSetDetail,
    shuffle_questions: bool,
    rng: &mut R,
) -> QuestionSetView {
    let mut questions = set.questions;
    if shuffle_questions {
        questions.shuffle(rng);
    }

    let questions = questions
        .into_iter()
        .map(|question| {
            let mut answers: Vec<AnswerView> = question
                .answers
                .into_iter()
                .map(|a| AnswerView {
                    id: a.id,
                    answer_text: a.answer_text,
                })
                .collect();
            // Unconditional: answers are shuffled even when question
            // order is preserved.
            answers.shuffle(rng);
            QuestionView {
                id: question.id,
                question_text: question.question_text,
                explanation: question.explanation,
                answers,
            }
        })
        .collect();

    QuestionSetView {
        id: set.id,
        title: set.title,
        description: set.description,
        is_challenge_mode: set.is_challenge_mode,
        questions,
    }
}
