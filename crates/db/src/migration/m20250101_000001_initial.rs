//! Initial schema: posts and overflow documents.
//!
//! The attachment descriptor is kept as JSONB on the post so legacy record
//! shapes survive untouched; `pdf_filename` mirrors its `filename` for lookup.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(SCHEMA_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS pdf_contents CASCADE; DROP TABLE IF EXISTS posts CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const SCHEMA_SQL: &str = r"
CREATE TABLE posts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    title TEXT NOT NULL,
    pdf_filename VARCHAR(512),
    pdf_attachment JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Serve and repair look attachments up by filename
CREATE INDEX idx_posts_pdf_filename ON posts(pdf_filename) WHERE pdf_filename IS NOT NULL;

CREATE TABLE pdf_contents (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    filename VARCHAR(512) NOT NULL,
    content TEXT NOT NULL,
    size BIGINT NOT NULL CHECK (size >= 0),
    post_id UUID REFERENCES posts(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_pdf_contents_post ON pdf_contents(post_id);
CREATE INDEX idx_pdf_contents_filename ON pdf_contents(filename);
";
