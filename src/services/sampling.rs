use rand::{seq::index, Rng};

use crate::{catalog::QuestionStore, models::domain::Question};

/// Removes repeated subjects, keeping the first occurrence of each.
pub fn distinct_subjects(subjects: &[String]) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::with_capacity(subjects.len());
    for subject in subjects {
        let subject = subject.trim();
        if !subject.is_empty() && !distinct.iter().any(|s| s == subject) {
            distinct.push(subject.to_string());
        }
    }
    distinct
}

/// Every question of every listed subject, in subject then catalog order.
pub fn question_pool<'a>(store: &'a QuestionStore, subjects: &[String]) -> Vec<&'a Question> {
    subjects
        .iter()
        .flat_map(|subject| store.questions(subject))
        .collect()
}

/// Uniform random sample of `min(count, pool.len())` questions without replacement.
pub fn sample_questions<R>(pool: &[&Question], count: usize, rng: &mut R) -> Vec<Question>
where
    R: Rng + ?Sized,
{
    let amount = count.min(pool.len());
    index::sample(rng, pool.len(), amount)
        .into_iter()
        .map(|i| pool[i].clone())
        .collect()
}
