//! Seed data: a built-in content bank that keeps the game playable without
//! an API key. Implements `ContentProvider` by picking from small
//! hand-written pools and by dressing generated questions up as word problems.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::{Difficulty, Operation, OperationChoice, Riddle, StoryProblem, StoryQuest};
use crate::error::GameError;
use crate::generator;
use crate::provider::ContentProvider;

struct RiddleSeed {
  text: &'static str,
  options: [&'static str; 4],
  answer: &'static str,
  explanation: &'static str,
}

struct QuestSeed {
  story: &'static str,
  question: &'static str,
  answer: i64,
  reward: &'static str,
}

const EASY_RIDDLES: &[RiddleSeed] = &[
  RiddleSeed {
    text: "Add 5 to me and you get 15. Who am I?",
    options: ["5", "10", "15", "20"],
    answer: "10",
    explanation: "10 + 5 = 15",
  },
  RiddleSeed {
    text: "I come right after 7 and right before 9. Who am I?",
    options: ["6", "8", "10", "7"],
    answer: "8",
    explanation: "The number between 7 and 9 is 8.",
  },
];

const MEDIUM_RIDDLES: &[RiddleSeed] = &[
  RiddleSeed {
    text: "Twice me plus 5 is 15. Who am I?",
    options: ["4", "5", "10", "6"],
    answer: "5",
    explanation: "2 × 5 = 10 and 10 + 5 = 15.",
  },
  RiddleSeed {
    text: "I am an even number between 20 and 25 that you can split into 2 equal 11s. Who am I?",
    options: ["21", "22", "24", "23"],
    answer: "22",
    explanation: "11 + 11 = 22.",
  },
];

const HARD_RIDDLES: &[RiddleSeed] = &[
  RiddleSeed {
    text: "Multiply me by 4, take away 6 and you land on 30. Who am I?",
    options: ["8", "9", "6", "12"],
    answer: "9",
    explanation: "9 × 4 = 36 and 36 - 6 = 30.",
  },
  RiddleSeed {
    text: "Half of me is a quarter of 100. Who am I?",
    options: ["25", "50", "75", "100"],
    answer: "50",
    explanation: "A quarter of 100 is 25, and 25 is half of 50.",
  },
];

const EASY_QUESTS: &[QuestSeed] = &[QuestSeed {
  story: "Captain Nova found 4 shiny moon rocks, then her robot found 3 more.",
  question: "How many moon rocks do they have now?",
  answer: 7,
  reward: "Moon Rock Badge",
}];

const MEDIUM_QUESTS: &[QuestSeed] = &[QuestSeed {
  story: "The rocket carries 36 fuel cells. The trip to Mars uses 19 of them.",
  question: "How many fuel cells are left for the way back?",
  answer: 17,
  reward: "Fuel Master Star",
}];

const HARD_QUESTS: &[QuestSeed] = &[QuestSeed {
  story: "The star gate opens for crews of 6. There are 8 crews waiting, and each astronaut needs 2 oxygen tanks.",
  question: "How many oxygen tanks are needed in total?",
  answer: 96,
  reward: "Star Gate Key",
}];

/// Offline provider backed by the pools above.
#[derive(Clone, Debug, Default)]
pub struct SeedBank;

impl SeedBank {
  fn pick_riddle<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Riddle {
    let pool = match difficulty {
      Difficulty::Easy => EASY_RIDDLES,
      Difficulty::Medium => MEDIUM_RIDDLES,
      Difficulty::Hard => HARD_RIDDLES,
    };
    let seed = pool.choose(rng).unwrap_or(&EASY_RIDDLES[0]);
    Riddle {
      text: seed.text.into(),
      options: seed.options.iter().map(|s| s.to_string()).collect(),
      correct_answer: seed.answer.into(),
      explanation: seed.explanation.into(),
    }
  }

  fn pick_quest<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> StoryQuest {
    let pool = match difficulty {
      Difficulty::Easy => EASY_QUESTS,
      Difficulty::Medium => MEDIUM_QUESTS,
      Difficulty::Hard => HARD_QUESTS,
    };
    let seed = pool.choose(rng).unwrap_or(&EASY_QUESTS[0]);
    StoryQuest {
      story: seed.story.into(),
      question: seed.question.into(),
      answer: seed.answer,
      reward: seed.reward.into(),
    }
  }

  /// Word problem built around a freshly generated question.
  fn word_problem<R: Rng + ?Sized>(difficulty: Difficulty, operation: OperationChoice, rng: &mut R) -> StoryProblem {
    let q = generator::generate(operation, difficulty, rng);
    let (a, b) = (q.operand1, q.operand2);
    let (story, question, hint) = match q.operation {
      Operation::Addition => (
        format!("The space station has {a} solar panels. Engineers bolt on {b} new ones."),
        "How many solar panels does the station have now?".to_string(),
        format!("Put the two groups together: {a} + {b}."),
      ),
      Operation::Subtraction => (
        format!("A comet carries {a} ice crystals. On its way past the Sun, {b} of them melt."),
        "How many ice crystals are left?".to_string(),
        format!("Take the melted ones away: {a} - {b}."),
      ),
      Operation::Multiplication => (
        format!("There are {a} rockets on the launch pad and each rocket has {b} engines."),
        "How many engines are there in total?".to_string(),
        format!("Count {b} engines, {a} times: {a} × {b}."),
      ),
      Operation::Division => (
        format!("The crew shares {a} space cookies equally among {b} astronauts."),
        "How many cookies does each astronaut get?".to_string(),
        format!("Split {a} into {b} equal groups: {a} ÷ {b}."),
      ),
    };
    StoryProblem { story, question, correct_answer: q.correct_answer, hint }
  }
}

#[async_trait]
impl ContentProvider for SeedBank {
  fn name(&self) -> &'static str { "seed_bank" }

  async fn riddle(&self, difficulty: Difficulty) -> Result<Riddle, GameError> {
    Ok(Self::pick_riddle(difficulty, &mut rand::thread_rng()))
  }

  async fn story_quest(&self, difficulty: Difficulty) -> Result<StoryQuest, GameError> {
    Ok(Self::pick_quest(difficulty, &mut rand::thread_rng()))
  }

  async fn story_problem(
    &self,
    difficulty: Difficulty,
    operation: OperationChoice,
  ) -> Result<StoryProblem, GameError> {
    Ok(Self::word_problem(difficulty, operation, &mut rand::thread_rng()))
  }

  async fn celebration(&self, score: u32) -> Result<String, GameError> {
    Ok(format!("Incredible! You finished every space mission with {score} points. The galaxy is safe thanks to you!"))
  }
}
