//! Generated-document command handlers: render, save, inspect history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use hubmesh_core::{ConfigSnapshot, SaveOutcome};

use crate::cli::{ConfigArgs, ConfigCommand, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::Context;

// ── Views ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct DocumentSet<'a> {
    network: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<u32>,
    content_hash: &'a str,
    documents: &'a BTreeMap<String, String>,
}

#[derive(Serialize)]
struct SnapshotSummary {
    version: u32,
    content_hash: String,
    documents: usize,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved: Option<bool>,
}

impl From<&ConfigSnapshot> for SnapshotSummary {
    fn from(s: &ConfigSnapshot) -> Self {
        Self {
            version: s.version,
            content_hash: s.content_hash.clone(),
            documents: s.documents.len(),
            created_at: s.created_at,
            saved: None,
        }
    }
}

#[derive(Tabled)]
struct SnapshotRow {
    #[tabled(rename = "Version")]
    version: u32,
    #[tabled(rename = "Hash")]
    hash: String,
    #[tabled(rename = "Documents")]
    documents: usize,
    #[tabled(rename = "Saved at")]
    created: String,
}

impl From<&SnapshotSummary> for SnapshotRow {
    fn from(s: &SnapshotSummary) -> Self {
        Self {
            version: s.version,
            hash: short_hash(&s.content_hash).into(),
            documents: s.documents,
            created: s.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

// ── Document printing ───────────────────────────────────────────────

/// Print a whole document set, or the one document `entity` names.
fn print_documents(
    ctx: &Context,
    set: &DocumentSet<'_>,
    entity: Option<&str>,
) -> Result<(), CliError> {
    if let Some(name) = entity {
        let doc = set.documents.get(name).ok_or_else(|| CliError::NotFound {
            resource_type: "document".into(),
            identifier: format!("'{name}' in network '{}'", set.network),
            list_command: format!("config generate {}", set.network),
        })?;
        output::print_output(doc.trim_end(), ctx.quiet);
        return Ok(());
    }

    let out = match ctx.format {
        OutputFormat::Json => serde_json::to_string_pretty(set)?,
        OutputFormat::Plain => set.documents.keys().cloned().collect::<Vec<_>>().join("\n"),
        OutputFormat::Table => set
            .documents
            .iter()
            .map(|(name, doc)| format!("# ── {name} ──\n{doc}"))
            .collect::<Vec<_>>()
            .join("\n"),
    };
    output::print_output(out.trim_end(), ctx.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(ctx: &Context, args: ConfigArgs) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Generate { network, entity } => {
            let generated = ctx.generator.generate(&network)?;
            let set = DocumentSet {
                network: &generated.network.name,
                version: None,
                content_hash: &generated.content_hash,
                documents: &generated.documents,
            };
            print_documents(ctx, &set, entity.as_deref())
        }

        ConfigCommand::Save { network } => {
            let outcome = ctx.generator.save_version(&network)?;
            let saved = outcome.is_created();
            let mut summary = SnapshotSummary::from(outcome.snapshot());
            summary.saved = Some(saved);

            match outcome {
                SaveOutcome::Created(ref s) => output::print_status(
                    &format!("Saved version {} ({})", s.version, short_hash(&s.content_hash)),
                    ctx.quiet,
                ),
                SaveOutcome::Unchanged(ref s) => output::print_status(
                    &format!("No changes since version {}", s.version),
                    ctx.quiet,
                ),
            }
            if ctx.format == OutputFormat::Json {
                output::print_output(&serde_json::to_string_pretty(&summary)?, ctx.quiet);
            }
            Ok(())
        }

        ConfigCommand::History { network } => {
            let summaries: Vec<SnapshotSummary> = ctx
                .generator
                .history(&network)?
                .iter()
                .map(SnapshotSummary::from)
                .collect();
            let out = output::render_list(
                ctx.format,
                &summaries,
                |s| SnapshotRow::from(s),
                |s| s.version.to_string(),
            )?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        ConfigCommand::Show {
            network,
            version,
            entity,
        } => {
            let snapshot = match version {
                Some(v) => ctx.generator.version(&network, v)?,
                None => ctx.generator.latest(&network)?,
            };
            let set = DocumentSet {
                network: &network,
                version: Some(snapshot.version),
                content_hash: &snapshot.content_hash,
                documents: &snapshot.documents,
            };
            print_documents(ctx, &set, entity.as_deref())
        }

        ConfigCommand::Hash { network, version } => {
            let hash = match version {
                Some(v) => ctx.generator.config_hash_by_version(&network, v)?,
                None => ctx.generator.generate(&network)?.content_hash,
            };
            output::print_output(&hash, ctx.quiet);
            Ok(())
        }
    }
}
