//! `SeaORM` entity definitions.

pub mod pdf_contents;
pub mod posts;
