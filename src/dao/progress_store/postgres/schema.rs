//! Database schema applied on connect.
//!
//! The events/teams/questions tables are owned by the CRUD collaborators and
//! only read here; they are created too so the service runs standalone. The
//! `team_progress` primary key carries the start-race contract: a duplicate
//! insert for a pair fails the constraint and the caller re-reads.

/// SQL to create the events table.
pub const CREATE_EVENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS events (
    id       UUID PRIMARY KEY,
    name     VARCHAR(255) NOT NULL,
    started  BOOLEAN NOT NULL DEFAULT FALSE
);
";

/// SQL to create the teams table.
pub const CREATE_TEAMS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS teams (
    id        UUID PRIMARY KEY,
    event_id  UUID NOT NULL REFERENCES events(id) ON DELETE CASCADE,
    name      VARCHAR(255) NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_teams_event_id ON teams (event_id);
";

/// SQL to create the questions table.
pub const CREATE_QUESTIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS questions (
    id                  UUID PRIMARY KEY,
    event_id            UUID NOT NULL REFERENCES events(id) ON DELETE CASCADE,
    difficulty          VARCHAR(16) NOT NULL,
    solution            TEXT NOT NULL,
    time_limit_seconds  INTEGER NOT NULL,
    tip_1               TEXT NOT NULL DEFAULT '',
    tip_2               TEXT NOT NULL DEFAULT '',
    tip_3               TEXT NOT NULL DEFAULT '',
    CHECK (time_limit_seconds > 0)
);

CREATE INDEX IF NOT EXISTS idx_questions_event_id ON questions (event_id);
";

/// SQL to create the progress table.
pub const CREATE_TEAM_PROGRESS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS team_progress (
    team_id         UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    question_id     UUID NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    attempt_1       TEXT,
    attempt_2       TEXT,
    attempt_3       TEXT,
    used_tip        SMALLINT NOT NULL DEFAULT 0,
    correct         BOOLEAN NOT NULL DEFAULT FALSE,
    completed       BOOLEAN NOT NULL DEFAULT FALSE,
    time_started    TIMESTAMPTZ NOT NULL,
    time_answered   TIMESTAMPTZ,
    points_awarded  INTEGER NOT NULL DEFAULT 0,
    revision        BIGINT NOT NULL DEFAULT 0,
    PRIMARY KEY (team_id, question_id)
);
";

/// All statements in dependency order.
pub const ALL_TABLES: [&str; 4] = [
    CREATE_EVENTS_TABLE,
    CREATE_TEAMS_TABLE,
    CREATE_QUESTIONS_TABLE,
    CREATE_TEAM_PROGRESS_TABLE,
];
