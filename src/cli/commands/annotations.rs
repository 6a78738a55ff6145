//! Annotations command implementation.

use std::path::Path;

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::config::Config;
use crate::database::{Database, MemoryDatabase};
use crate::error::Result;
use crate::model::EntityId;
use crate::storage::{Annotation, SqliteRepository};

#[derive(Serialize)]
struct AnnotationOutput {
    entity: String,
    message: String,
    created_at: i64,
    committed: bool,
}

impl From<&Annotation> for AnnotationOutput {
    fn from(annotation: &Annotation) -> Self {
        Self {
            entity: annotation.entity_id.to_string(),
            message: annotation.message.clone(),
            created_at: annotation.created_at,
            committed: annotation.committed,
        }
    }
}

#[derive(Serialize)]
struct AnnotationsOutput {
    annotations: Vec<AnnotationOutput>,
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    commit_message: Option<String>,
    marked_committed: usize,
}

/// Execute the annotations command.
///
/// With an entity, lists its annotations newest first. Without one, lists
/// pending annotations oldest first together with the commit message built
/// from them, and optionally marks them committed.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or the annotation
/// database cannot be opened or queried.
pub fn execute(
    snapshot: &Path,
    entity: Option<EntityId>,
    limit: Option<u32>,
    mark_committed: bool,
    config: &Config,
    json: bool,
) -> Result<()> {
    let database = MemoryDatabase::load(snapshot)?;
    let mut repository = SqliteRepository::open(&config.annotations_path(&database.database_path()))?;

    let (annotations, commit_message) = match entity {
        Some(entity) => (repository.annotations_for(entity, limit)?, None),
        None => {
            let mut pending = repository.pending_annotations()?;
            if let Some(limit) = limit {
                pending.truncate(limit as usize);
            }
            (pending, repository.commit_message()?)
        }
    };

    let marked_committed = if mark_committed {
        repository.mark_committed()?
    } else {
        0
    };

    if json {
        let output = AnnotationsOutput {
            count: annotations.len(),
            annotations: annotations.iter().map(AnnotationOutput::from).collect(),
            commit_message,
            marked_committed,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if annotations.is_empty() {
        println!("{}", "No annotations.".dimmed());
        return Ok(());
    }

    for annotation in &annotations {
        let when = DateTime::<Utc>::from_timestamp_millis(annotation.created_at)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        let marker = if annotation.committed {
            " ".normal()
        } else {
            "*".yellow()
        };
        println!(
            "{marker} {} {} {}",
            when.dimmed(),
            annotation.entity_id.to_string().cyan(),
            annotation.message
        );
    }

    if marked_committed > 0 {
        println!();
        println!("{} {marked_committed} annotations marked committed", "✓".green());
    }

    Ok(())
}
