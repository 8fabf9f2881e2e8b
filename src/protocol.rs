//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! Session views never carry correct answers; practice questions do, since the
//! client checks those itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Difficulty, MissionKind, Operation, OperationChoice, Question, StoryProblem};
use crate::game::Phase;
use crate::state::{ChallengeContent, Session};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    NewSession,
    GetSession {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    SelectMission {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        #[serde(rename = "missionId")]
        mission_id: u32,
    },
    LoadChallenge {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    SubmitAnswer {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        answer: String,
    },
    CloseChallenge {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    SetDifficulty {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        difficulty: String,
    },
    SetOperation {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        operation: String,
    },
    Restart {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    PracticeQuestion {
        #[serde(default)]
        operation: Option<String>,
        #[serde(default)]
        difficulty: Option<String>,
    },
}

impl ClientWsMessage {
    /// Message tag for logs. Payloads (answers in particular) stay out of spans.
    pub fn label(&self) -> &'static str {
        match self {
            ClientWsMessage::Ping => "ping",
            ClientWsMessage::NewSession => "new_session",
            ClientWsMessage::GetSession { .. } => "get_session",
            ClientWsMessage::SelectMission { .. } => "select_mission",
            ClientWsMessage::LoadChallenge { .. } => "load_challenge",
            ClientWsMessage::SubmitAnswer { .. } => "submit_answer",
            ClientWsMessage::CloseChallenge { .. } => "close_challenge",
            ClientWsMessage::SetDifficulty { .. } => "set_difficulty",
            ClientWsMessage::SetOperation { .. } => "set_operation",
            ClientWsMessage::Restart { .. } => "restart",
            ClientWsMessage::PracticeQuestion { .. } => "practice_question",
        }
    }
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session {
        session: SessionOut,
    },
    /// Content arrived after the challenge was closed; nothing changed.
    ChallengeStale,
    AnswerResult {
        correct: bool,
        feedback: String,
        session: SessionOut,
    },
    Question {
        question: Question,
    },
    Error {
        kind: &'static str,
        message: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionOut {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: MissionKind,
    pub title: String,
    pub completed: bool,
    pub locked: bool,
    pub current: bool,
}

/// Public part of the open challenge.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChallengeOut {
    Loading,
    Riddle {
        riddle: String,
        options: Vec<String>,
    },
    Story {
        story: String,
        question: String,
        reward: String,
    },
    Drill {
        #[serde(rename = "questionId")]
        question_id: Uuid,
        operand1: i64,
        operand2: i64,
        operation: Operation,
        symbol: &'static str,
        options: Vec<i64>,
    },
}

/// DTO used by both WS and HTTP for session delivery.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
    pub id: Uuid,
    pub score: u32,
    pub current_level: u32,
    pub missions: Vec<MissionOut>,
    pub phase: Phase,
    pub difficulty: Difficulty,
    pub operation: OperationChoice,
    pub active_mission_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<ChallengeOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub celebration: Option<String>,
}

/// Convert the full `Session` (internal) to the public DTO.
pub fn to_out(s: &Session) -> SessionOut {
    let game = &s.game;
    let missions = game
        .missions
        .iter()
        .map(|m| MissionOut {
            id: m.id,
            kind: m.kind,
            title: m.title.clone(),
            completed: m.completed,
            locked: game.is_locked(m.id),
            current: game.is_current(m.id),
        })
        .collect();

    // Only show content that belongs to the challenge open right now.
    let challenge = game.request_token().map(|token| {
        match s.challenge.as_ref().filter(|c| c.token == token).and_then(|c| c.content.as_ref()) {
            None => ChallengeOut::Loading,
            Some(ChallengeContent::Riddle(r)) => ChallengeOut::Riddle {
                riddle: r.text.clone(),
                options: r.options.clone(),
            },
            Some(ChallengeContent::Story(q)) => ChallengeOut::Story {
                story: q.story.clone(),
                question: q.question.clone(),
                reward: q.reward.clone(),
            },
            Some(ChallengeContent::Drill(q)) => ChallengeOut::Drill {
                question_id: q.id,
                operand1: q.operand1,
                operand2: q.operand2,
                operation: q.operation,
                symbol: q.operation.symbol(),
                options: q.options.clone(),
            },
        }
    });

    SessionOut {
        id: s.id,
        score: game.score,
        current_level: game.current_level,
        missions,
        phase: game.phase,
        difficulty: game.difficulty,
        operation: s.operation,
        active_mission_id: game.active_mission_id,
        challenge,
        celebration: s.celebration.clone(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct SelectIn {
    #[serde(rename = "missionId")]
    pub mission_id: u32,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    pub answer: String,
}
#[derive(Debug, Serialize)]
pub struct AnswerOut {
    pub correct: bool,
    pub feedback: String,
    pub session: SessionOut,
}

#[derive(Debug, Deserialize)]
pub struct DifficultyIn {
    pub difficulty: String,
}

#[derive(Debug, Deserialize)]
pub struct OperationIn {
    pub operation: String,
}

#[derive(Debug, Deserialize)]
pub struct PracticeQuery {
    pub operation: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StoryProblemOut {
    pub problem: StoryProblem,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub provider: &'static str,
}
