//! Member command handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use hubmesh_core::{CreateMemberRequest, Member, MemberKind, UpdateMemberRequest, endpoint};

use crate::cli::{MemberArgs, MemberCommand};
use crate::error::CliError;
use crate::output;

use super::Context;

/// Member as shown to users. The private key never leaves the store.
#[derive(Serialize)]
struct MemberView {
    id: String,
    name: String,
    kind: MemberKind,
    address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
    port: u16,
    public_key: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&Member> for MemberView {
    fn from(m: &Member) -> Self {
        Self {
            id: m.id.to_string(),
            name: m.name.clone(),
            kind: m.kind,
            address: m.address.to_string(),
            endpoint: m
                .has_public_address()
                .then(|| endpoint(&m.public_address, m.port)),
            port: m.port,
            public_key: m.keys.public_key.clone(),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct MemberRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
}

impl From<&MemberView> for MemberRow {
    fn from(v: &MemberView) -> Self {
        Self {
            name: v.name.clone(),
            kind: v.kind.to_string(),
            address: v.address.clone(),
            endpoint: v.endpoint.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

fn detail(v: &MemberView) -> String {
    output::detail(&[
        ("Name", v.name.clone()),
        ("ID", v.id.clone()),
        ("Kind", v.kind.to_string()),
        ("Address", v.address.clone()),
        ("Endpoint", v.endpoint.clone().unwrap_or_else(|| "-".into())),
        ("Listen port", v.port.to_string()),
        ("Public key", v.public_key.clone()),
        ("Updated", v.updated_at.to_rfc3339()),
    ])
}

fn print_member(ctx: &Context, member: &Member) -> Result<(), CliError> {
    let view = MemberView::from(member);
    let out = output::render_single(ctx.format, &view, detail, |v| v.address.clone())?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(ctx: &Context, args: MemberArgs) -> Result<(), CliError> {
    match args.command {
        MemberCommand::Create {
            network,
            name,
            kind,
            public_address,
            port,
        } => {
            let member = ctx.manager.create_member(
                &network,
                CreateMemberRequest {
                    name,
                    public_address,
                    port,
                    kind: Some(kind.into()),
                },
            )?;
            print_member(ctx, &member)
        }

        MemberCommand::List { network } => {
            let views: Vec<MemberView> = ctx
                .manager
                .list_members(&network)?
                .iter()
                .map(MemberView::from)
                .collect();
            let out = output::render_list(
                ctx.format,
                &views,
                |v| MemberRow::from(v),
                |v| v.name.clone(),
            )?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        MemberCommand::Show { network, name } => {
            print_member(ctx, &ctx.manager.member(&network, &name)?)
        }

        MemberCommand::Update {
            network,
            name,
            kind,
            public_address,
            port,
        } => {
            let member = ctx.manager.update_member(
                &network,
                &name,
                UpdateMemberRequest {
                    public_address,
                    port,
                    kind: kind.map(Into::into),
                },
            )?;
            print_member(ctx, &member)
        }

        MemberCommand::Delete { network, name } => {
            let member = ctx.manager.delete_member(&network, &name)?;
            output::print_status(
                &format!("Member '{name}' removed; {} is free again", member.address),
                ctx.quiet,
            );
            Ok(())
        }
    }
}
