//! Hub command handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use hubmesh_core::{CreateHubRequest, Hub, UpdateHubRequest, endpoint};

use crate::cli::{HubArgs, HubCommand};
use crate::error::CliError;
use crate::output;

use super::Context;

/// Hub as shown to users. The private key never leaves the store.
#[derive(Serialize)]
struct HubView {
    id: String,
    name: String,
    endpoint: String,
    address: String,
    public_key: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&Hub> for HubView {
    fn from(h: &Hub) -> Self {
        Self {
            id: h.id.to_string(),
            name: h.name.clone(),
            endpoint: endpoint(&h.public_address, h.port),
            address: h.address.to_string(),
            public_key: h.keys.public_key.clone(),
            created_at: h.created_at,
            updated_at: h.updated_at,
        }
    }
}

fn detail(v: &HubView) -> String {
    output::detail(&[
        ("Name", v.name.clone()),
        ("ID", v.id.clone()),
        ("Endpoint", v.endpoint.clone()),
        ("Address", v.address.clone()),
        ("Public key", v.public_key.clone()),
        ("Updated", v.updated_at.to_rfc3339()),
    ])
}

fn print_hub(ctx: &Context, hub: &Hub) -> Result<(), CliError> {
    let view = HubView::from(hub);
    let out = output::render_single(ctx.format, &view, detail, |v| v.address.clone())?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(ctx: &Context, args: HubArgs) -> Result<(), CliError> {
    match args.command {
        HubCommand::Create {
            network,
            name,
            public_address,
            port,
        } => {
            let hub = ctx.manager.create_hub(
                &network,
                CreateHubRequest {
                    name,
                    public_address,
                    port,
                },
            )?;
            print_hub(ctx, &hub)
        }

        HubCommand::Show { network } => print_hub(ctx, &ctx.manager.hub(&network)?),

        HubCommand::Update {
            network,
            public_address,
            port,
        } => {
            let hub = ctx
                .manager
                .update_hub(&network, UpdateHubRequest { public_address, port })?;
            print_hub(ctx, &hub)
        }

        HubCommand::Delete { network } => {
            let hub = ctx.manager.delete_hub(&network)?;
            output::print_status(
                &format!("Hub '{}' removed from '{network}'", hub.name),
                ctx.quiet,
            );
            Ok(())
        }
    }
}
