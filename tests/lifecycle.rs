//! End-to-end lifecycle tests driving the service layer against the
//! in-memory store.

use std::sync::Arc;

use time::Duration;
use uuid::Uuid;

use puzzle_rally_back::{
    config::AppConfig,
    dao::{
        models::{Difficulty, EventEntity, QuestionEntity, TeamEntity},
        progress_store::{ProgressStore, memory::MemoryProgressStore},
    },
    dto::progress::{
        AnswerRequest, CompleteRequest, CompletionReasonDto, StartRequest, TipRequest,
    },
    error::ServiceError,
    services::{progress_service, scoreboard_service},
    state::{SharedState, AppState, progress::ProgressPhase},
};

struct Fixture {
    state: SharedState,
    store: MemoryProgressStore,
    event: EventEntity,
    team: TeamEntity,
    question: QuestionEntity,
}

impl Fixture {
    async fn new() -> Self {
        Self::with_event_started(true).await
    }

    async fn with_event_started(started: bool) -> Self {
        let store = MemoryProgressStore::new();

        let event = EventEntity {
            id: Uuid::new_v4(),
            name: "summer rally".into(),
            started,
        };
        let team = TeamEntity {
            id: Uuid::new_v4(),
            event_id: event.id,
            name: "rustaceans".into(),
        };
        let question = QuestionEntity {
            id: Uuid::new_v4(),
            event_id: event.id,
            difficulty: Difficulty::Medium,
            solution: "Fourty Two".into(),
            time_limit_seconds: 60,
            tip_1: "think deep".into(),
            tip_2: "it is a number".into(),
            tip_3: "fourty two".into(),
        };

        store.put_event(event.clone());
        store.put_team(team.clone());
        store.put_question(question.clone());

        let state = AppState::new(AppConfig::default());
        state.install_progress_store(Arc::new(store.clone())).await;

        Self {
            state,
            store,
            event,
            team,
            question,
        }
    }

    fn start_request(&self) -> StartRequest {
        StartRequest {
            team_id: self.team.id,
            question_id: self.question.id,
        }
    }

    fn tip_request(&self, tip_number: u8) -> TipRequest {
        TipRequest {
            team_id: self.team.id,
            question_id: self.question.id,
            tip_number,
        }
    }

    fn answer_request(&self, text: &str) -> AnswerRequest {
        AnswerRequest {
            team_id: self.team.id,
            question_id: self.question.id,
            text: text.into(),
        }
    }

    fn complete_request(&self, reason: CompletionReasonDto) -> CompleteRequest {
        CompleteRequest {
            team_id: self.team.id,
            question_id: self.question.id,
            reason,
        }
    }
}

#[tokio::test]
async fn start_is_idempotent() {
    let fixture = Fixture::new().await;

    let first = progress_service::start(&fixture.state, fixture.start_request())
        .await
        .unwrap();
    let second = progress_service::start(&fixture.state, fixture.start_request())
        .await
        .unwrap();

    assert!(!first.existing);
    assert!(second.existing);
    assert_eq!(first.time_started, second.time_started);
}

#[tokio::test]
async fn concurrent_starts_observe_one_row() {
    let fixture = Fixture::new().await;

    let state_a = fixture.state.clone();
    let state_b = fixture.state.clone();
    let request_a = fixture.start_request();
    let request_b = fixture.start_request();

    let task_a = tokio::spawn(async move { progress_service::start(&state_a, request_a).await });
    let task_b = tokio::spawn(async move { progress_service::start(&state_b, request_b).await });

    let first = task_a.await.unwrap().unwrap();
    let second = task_b.await.unwrap().unwrap();

    // Exactly one caller created the row; both see the winner's clock.
    assert_eq!(first.time_started, second.time_started);
    assert_ne!(first.existing, second.existing);

    let row = fixture
        .store
        .find_progress(fixture.team.id, fixture.question.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.revision, 0);
}

#[tokio::test]
async fn tips_are_monotonic_across_calls() {
    let fixture = Fixture::new().await;

    let first = progress_service::tip(&fixture.state, fixture.tip_request(1))
        .await
        .unwrap();
    assert_eq!(first.tip_text, "think deep");

    progress_service::tip(&fixture.state, fixture.tip_request(2))
        .await
        .unwrap();

    // Asking for tip 1 again is a no-op that still returns its text.
    let repeat = progress_service::tip(&fixture.state, fixture.tip_request(1))
        .await
        .unwrap();
    assert_eq!(repeat.tip_text, "think deep");
    assert!(!repeat.completed);

    let row = fixture
        .store
        .find_progress(fixture.team.id, fixture.question.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.used_tip, 2);
}

#[tokio::test]
async fn tip_cannot_skip_to_the_solution() {
    let fixture = Fixture::new().await;

    let err = progress_service::tip(&fixture.state, fixture.tip_request(3))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTipNumber { requested: 3, .. }));
}

#[tokio::test]
async fn solution_tip_completes_and_blocks_answers() {
    let fixture = Fixture::new().await;

    for tip_number in 1..=3 {
        progress_service::tip(&fixture.state, fixture.tip_request(tip_number))
            .await
            .unwrap();
    }

    let row = fixture
        .store
        .find_progress(fixture.team.id, fixture.question.id)
        .await
        .unwrap()
        .unwrap();
    assert!(row.completed);
    assert_eq!(row.points_awarded, 0);

    let err = progress_service::answer(&fixture.state, fixture.answer_request("fourty two"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyCompleted));
}

#[tokio::test]
async fn correct_answer_scores_and_pushes_the_scoreboard() {
    let fixture = Fixture::new().await;
    let mut subscriber = fixture.state.scoreboard().subscribe(fixture.event.id);

    progress_service::start(&fixture.state, fixture.start_request())
        .await
        .unwrap();
    let verdict = progress_service::answer(
        &fixture.state,
        fixture.answer_request("  FOURTY two "),
    )
    .await
    .unwrap();

    assert!(verdict.correct);
    // Full time bonus, no tips: medium pays out 300.
    assert_eq!(verdict.points, Some(300));

    let pushed = subscriber.recv().await.unwrap();
    assert_eq!(pushed.event.as_deref(), Some("scoreboard"));
    let snapshot: serde_json::Value = serde_json::from_str(&pushed.data).unwrap();
    assert_eq!(snapshot["standings"][0]["total_points"], 300);
    assert_eq!(snapshot["standings"][0]["questions_solved"], 1);

    let err = progress_service::answer(&fixture.state, fixture.answer_request("again"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyAnswered));
}

#[tokio::test]
async fn three_wrong_answers_exhaust_the_question() {
    let fixture = Fixture::new().await;

    for (guess, remaining) in [("one", 2), ("two", 1), ("three", 0)] {
        let verdict = progress_service::answer(&fixture.state, fixture.answer_request(guess))
            .await
            .unwrap();
        assert!(!verdict.correct);
        assert_eq!(verdict.attempts_remaining, Some(remaining));
    }

    let row = fixture
        .store
        .find_progress(fixture.team.id, fixture.question.id)
        .await
        .unwrap()
        .unwrap();
    assert!(row.completed);
    assert!(!row.correct);
    assert_eq!(row.points_awarded, 0);

    let err = progress_service::answer(&fixture.state, fixture.answer_request("four"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::MaxAttemptsReached));
}

#[tokio::test]
async fn completion_is_idempotent() {
    let fixture = Fixture::new().await;

    progress_service::start(&fixture.state, fixture.start_request())
        .await
        .unwrap();

    progress_service::complete(
        &fixture.state,
        fixture.complete_request(CompletionReasonDto::Timeout),
    )
    .await
    .unwrap();

    let after_first = fixture
        .store
        .find_progress(fixture.team.id, fixture.question.id)
        .await
        .unwrap()
        .unwrap();

    progress_service::complete(
        &fixture.state,
        fixture.complete_request(CompletionReasonDto::Timeout),
    )
    .await
    .unwrap();

    let after_second = fixture
        .store
        .find_progress(fixture.team.id, fixture.question.id)
        .await
        .unwrap()
        .unwrap();

    // The second call acknowledged without touching the row.
    assert_eq!(after_first, after_second);
    assert_eq!(
        puzzle_rally_back::state::progress::phase(&after_second),
        ProgressPhase::TimedOut
    );
}

#[tokio::test]
async fn completing_an_untouched_pair_is_not_found() {
    let fixture = Fixture::new().await;

    let err = progress_service::complete(
        &fixture.state,
        fixture.complete_request(CompletionReasonDto::Timeout),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn unstarted_event_gates_start_and_answer() {
    let fixture = Fixture::with_event_started(false).await;

    let err = progress_service::start(&fixture.state, fixture.start_request())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::EventNotStarted(_)));

    let err = progress_service::answer(&fixture.state, fixture.answer_request("fourty two"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::EventNotStarted(_)));
}

#[tokio::test]
async fn overdue_rows_time_out_on_the_next_touch() {
    let fixture = Fixture::new().await;

    progress_service::start(&fixture.state, fixture.start_request())
        .await
        .unwrap();

    // Backdate the clock well past the 60s budget.
    let mut row = fixture
        .store
        .find_progress(fixture.team.id, fixture.question.id)
        .await
        .unwrap()
        .unwrap();
    row.time_started -= Duration::hours(2);
    fixture.store.update_progress(row).await.unwrap();

    let err = progress_service::answer(&fixture.state, fixture.answer_request("fourty two"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyCompleted));

    let row = fixture
        .store
        .find_progress(fixture.team.id, fixture.question.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        puzzle_rally_back::state::progress::phase(&row),
        ProgressPhase::TimedOut
    );
}

#[tokio::test]
async fn unknown_question_and_team_are_not_found() {
    let fixture = Fixture::new().await;

    let err = progress_service::start(
        &fixture.state,
        StartRequest {
            team_id: fixture.team.id,
            question_id: Uuid::new_v4(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = progress_service::start(
        &fixture.state,
        StartRequest {
            team_id: Uuid::new_v4(),
            question_id: fixture.question.id,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn scoreboard_covers_idle_teams_and_ranks_solvers_first() {
    let fixture = Fixture::new().await;
    let idle_team = TeamEntity {
        id: Uuid::new_v4(),
        event_id: fixture.event.id,
        name: "spectators".into(),
    };
    fixture.store.put_team(idle_team.clone());

    progress_service::start(&fixture.state, fixture.start_request())
        .await
        .unwrap();
    progress_service::answer(&fixture.state, fixture.answer_request("fourty two"))
        .await
        .unwrap();

    let scoreboard = scoreboard_service::get_scoreboard(&fixture.state, fixture.event.id)
        .await
        .unwrap();

    assert_eq!(scoreboard.standings.len(), 2);
    assert_eq!(scoreboard.standings[0].name, fixture.team.name);
    assert_eq!(scoreboard.standings[0].rank, 1);
    assert_eq!(scoreboard.standings[1].name, idle_team.name);
    assert_eq!(scoreboard.standings[1].total_points, 0);
    assert!(scoreboard.standings[1].last_answer_time.is_none());
}

#[tokio::test]
async fn scoreboard_for_unknown_event_is_not_found() {
    let fixture = Fixture::new().await;

    let err = scoreboard_service::get_scoreboard(&fixture.state, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn degraded_mode_rejects_operations() {
    let fixture = Fixture::new().await;
    fixture.state.clear_progress_store().await;

    let err = progress_service::start(&fixture.state, fixture.start_request())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Degraded));
}
