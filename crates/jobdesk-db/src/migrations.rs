use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE sessions (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                expires_at  TEXT NOT NULL
            );

            CREATE TABLE employer_profiles (
                id                   TEXT PRIMARY KEY,
                user_id              TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                company_name         TEXT NOT NULL,
                company_description  TEXT
            );

            CREATE TABLE seeker_profiles (
                id       TEXT PRIMARY KEY,
                user_id  TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                skills   TEXT,
                resume   TEXT
            );

            CREATE TABLE job_postings (
                id           TEXT PRIMARY KEY,
                employer_id  TEXT NOT NULL REFERENCES employer_profiles(id) ON DELETE CASCADE,
                title        TEXT NOT NULL,
                description  TEXT NOT NULL,
                location     TEXT NOT NULL,
                posted_on    TEXT NOT NULL,
                is_active    INTEGER NOT NULL DEFAULT 1
            );

            CREATE INDEX idx_job_postings_employer
                ON job_postings(employer_id, posted_on);

            CREATE TABLE applications (
                id          TEXT PRIMARY KEY,
                job_id      TEXT NOT NULL REFERENCES job_postings(id) ON DELETE CASCADE,
                seeker_id   TEXT NOT NULL REFERENCES seeker_profiles(id) ON DELETE CASCADE,
                applied_on  TEXT NOT NULL,
                status      TEXT NOT NULL DEFAULT 'APPLIED'
                    CHECK (status IN ('APPLIED', 'SHORTLISTED', 'INTERVIEW', 'REJECTED')),
                UNIQUE(job_id, seeker_id)
            );

            CREATE INDEX idx_applications_seeker
                ON applications(seeker_id);

            CREATE TABLE interviews (
                id              TEXT PRIMARY KEY,
                application_id  TEXT NOT NULL UNIQUE REFERENCES applications(id) ON DELETE CASCADE,
                scheduled_time  TEXT NOT NULL,
                location_link   TEXT,
                notes           TEXT
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
