//! Arithmetic question generator.
//!
//! Operands are drawn from difficulty-scaled ranges. Subtraction never goes
//! negative and division is always exact. Every question carries four distinct
//! non-negative options, one of which is the correct answer.
//!
//! The random source is injected so tests can use a seeded `StdRng`.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::{Difficulty, Operation, OperationChoice, Question};

pub const OPTION_COUNT: usize = 4;
const MAX_DISTRACTOR_OFFSET: i64 = 5;

/// Magnitude for addition/subtraction.
pub fn additive_range(difficulty: Difficulty) -> i64 {
  match difficulty {
    Difficulty::Easy => 10,
    Difficulty::Medium => 50,
    Difficulty::Hard => 100,
  }
}

/// Magnitude for multiplication/division. Kept small on purpose for young players.
pub fn multiplicative_range(difficulty: Difficulty) -> i64 {
  match difficulty {
    Difficulty::Easy => 5,
    Difficulty::Medium | Difficulty::Hard => 10,
  }
}

/// Generate a question using the thread-local RNG.
pub fn generate_question(choice: OperationChoice, difficulty: Difficulty) -> Question {
  generate(choice, difficulty, &mut rand::thread_rng())
}

/// Generate a question from an explicit random source.
pub fn generate<R: Rng + ?Sized>(choice: OperationChoice, difficulty: Difficulty, rng: &mut R) -> Question {
  let operation = match choice.fixed() {
    Some(op) => op,
    None => Operation::ALL[rng.gen_range(0..Operation::ALL.len())],
  };

  let (operand1, operand2, correct_answer) = match operation {
    Operation::Addition => {
      let range = additive_range(difficulty);
      let a = rng.gen_range(1..=range);
      let b = rng.gen_range(1..=range);
      (a, b, a + b)
    }
    Operation::Subtraction => {
      // Upper-half bias leaves room for a non-trivial subtrahend.
      let range = additive_range(difficulty);
      let a = rng.gen_range(range / 2 + 1..=range / 2 + range);
      let b = rng.gen_range(0..a);
      (a, b, a - b)
    }
    Operation::Multiplication => {
      let m = multiplicative_range(difficulty);
      let a = rng.gen_range(1..=m);
      let b = rng.gen_range(1..=m);
      (a, b, a * b)
    }
    Operation::Division => {
      let m = multiplicative_range(difficulty);
      let divisor = rng.gen_range(1..=m);
      let quotient = rng.gen_range(1..=m);
      (quotient * divisor, divisor, quotient)
    }
  };

  let options = build_options(correct_answer, rng);
  Question {
    id: uuid::Builder::from_random_bytes(rng.gen()).into_uuid(),
    operand1,
    operand2,
    operation,
    correct_answer,
    options,
  }
}

/// Seed with the answer, add `answer ± [1..=5]` until four distinct
/// non-negative values exist, then shuffle.
fn build_options<R: Rng + ?Sized>(answer: i64, rng: &mut R) -> Vec<i64> {
  let mut seen = HashSet::with_capacity(OPTION_COUNT);
  let mut options = Vec::with_capacity(OPTION_COUNT);
  seen.insert(answer);
  options.push(answer);

  while options.len() < OPTION_COUNT {
    let magnitude = rng.gen_range(1..=MAX_DISTRACTOR_OFFSET);
    let offset = if rng.gen_bool(0.5) { magnitude } else { -magnitude };
    let candidate = answer + offset;
    if candidate >= 0 && seen.insert(candidate) {
      options.push(candidate);
    }
  }

  options.shuffle(rng);
  options
}

/// Check a player's pick against a question.
pub fn is_correct(question: &Question, answer: i64) -> bool {
  question.correct_answer == answer
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  const DIFFICULTIES: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

  fn assert_well_formed(q: &Question) {
    assert_eq!(q.options.len(), OPTION_COUNT, "{q:?}");
    assert_eq!(q.options.iter().filter(|&&o| o == q.correct_answer).count(), 1, "{q:?}");
    assert!(q.options.iter().all(|&o| o >= 0), "{q:?}");
    let distinct: HashSet<_> = q.options.iter().collect();
    assert_eq!(distinct.len(), OPTION_COUNT, "{q:?}");
  }

  #[test]
  fn every_operation_and_difficulty_yields_well_formed_options() {
    let mut rng = StdRng::seed_from_u64(7);
    for difficulty in DIFFICULTIES {
      for op in Operation::ALL {
        for _ in 0..200 {
          let q = generate(op.into(), difficulty, &mut rng);
          assert_eq!(q.operation, op);
          assert_well_formed(&q);
        }
      }
    }
  }

  #[test]
  fn subtraction_and_division_stay_non_negative_and_exact() {
    let mut rng = StdRng::seed_from_u64(11);
    for difficulty in DIFFICULTIES {
      for _ in 0..500 {
        let s = generate(OperationChoice::Subtraction, difficulty, &mut rng);
        assert!(s.operand1 >= s.operand2);
        assert!(s.operand2 >= 0);
        assert_eq!(s.correct_answer, s.operand1 - s.operand2);
        assert!(s.correct_answer >= 0);

        let range = additive_range(difficulty);
        assert!(s.operand1 > range / 2 && s.operand1 <= range / 2 + range);

        let d = generate(OperationChoice::Division, difficulty, &mut rng);
        assert_eq!(d.operand1, d.correct_answer * d.operand2);
        assert_eq!(d.operand1 % d.operand2, 0);
        assert!(d.correct_answer >= 1 && d.correct_answer <= multiplicative_range(difficulty));
      }
    }
  }

  #[test]
  fn easy_addition_operands_stay_within_one_to_ten() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..1000 {
      let q = generate(OperationChoice::Addition, Difficulty::Easy, &mut rng);
      assert!((1..=10).contains(&q.operand1), "{q:?}");
      assert!((1..=10).contains(&q.operand2), "{q:?}");
      assert_eq!(q.correct_answer, q.operand1 + q.operand2);
      assert_well_formed(&q);
    }
  }

  #[test]
  fn multiplication_ignores_additive_range() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..300 {
      let easy = generate(OperationChoice::Multiplication, Difficulty::Easy, &mut rng);
      assert!(easy.operand1 <= 5 && easy.operand2 <= 5);
      let hard = generate(OperationChoice::Multiplication, Difficulty::Hard, &mut rng);
      assert!(hard.operand1 <= 10 && hard.operand2 <= 10);
    }
  }

  #[test]
  fn mixed_eventually_covers_all_operations() {
    let mut rng = StdRng::seed_from_u64(99);
    let seen: HashSet<Operation> = (0..400)
      .map(|_| generate(OperationChoice::Mixed, Difficulty::Medium, &mut rng).operation)
      .collect();
    assert_eq!(seen.len(), 4);
  }

  #[test]
  fn same_seed_reproduces_same_question() {
    let a = generate(OperationChoice::Mixed, Difficulty::Hard, &mut StdRng::seed_from_u64(5));
    let b = generate(OperationChoice::Mixed, Difficulty::Hard, &mut StdRng::seed_from_u64(5));
    assert_eq!(a, b);
  }

  #[test]
  fn later_generation_leaves_earlier_questions_untouched() {
    let mut rng = StdRng::seed_from_u64(1);
    let first = generate(OperationChoice::Addition, Difficulty::Easy, &mut rng);
    let snapshot = first.clone();
    for _ in 0..50 {
      let _ = generate(OperationChoice::Addition, Difficulty::Easy, &mut rng);
    }
    assert_eq!(first, snapshot);
  }

  #[test]
  fn small_answers_still_get_four_non_negative_options() {
    let mut rng = StdRng::seed_from_u64(8);
    for answer in 0..3 {
      let opts = build_options(answer, &mut rng);
      assert_eq!(opts.len(), OPTION_COUNT);
      assert!(opts.iter().all(|&o| o >= 0));
      assert!(opts.contains(&answer));
    }
  }

  #[test]
  fn question_ids_are_random_v4() {
    let mut rng = StdRng::seed_from_u64(12);
    let a = generate(OperationChoice::Mixed, Difficulty::Easy, &mut rng);
    let b = generate(OperationChoice::Mixed, Difficulty::Easy, &mut rng);
    assert_eq!(a.id.get_version_num(), 4);
    assert_ne!(a.id, b.id);
  }

  #[test]
  fn checks_answers_against_the_question() {
    let q = generate_question(OperationChoice::Addition, Difficulty::Easy);
    assert!(is_correct(&q, q.correct_answer));
    assert!(!is_correct(&q, q.correct_answer + 1));
  }
}
