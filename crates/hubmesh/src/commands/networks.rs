//! Network command handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use hubmesh_core::Network;

use crate::cli::{NetworkArgs, NetworkCommand};
use crate::error::CliError;
use crate::output;

use super::Context;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NetworkRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "CIDR")]
    cidr: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&Network> for NetworkRow {
    fn from(n: &Network) -> Self {
        Self {
            name: n.name.clone(),
            cidr: n.cidr.to_string(),
            id: n.id.to_string(),
            created: n.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Network plus live address usage.
#[derive(Serialize)]
struct NetworkStatus {
    id: String,
    name: String,
    cidr: String,
    hub_address: String,
    capacity: u32,
    allocated: usize,
    available: u32,
    created_at: DateTime<Utc>,
}

fn detail(s: &NetworkStatus) -> String {
    output::detail(&[
        ("Name", s.name.clone()),
        ("ID", s.id.clone()),
        ("CIDR", s.cidr.clone()),
        ("Hub address", s.hub_address.clone()),
        ("Capacity", s.capacity.to_string()),
        ("Allocated", s.allocated.to_string()),
        ("Available", s.available.to_string()),
        ("Created", s.created_at.to_rfc3339()),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(ctx: &Context, args: NetworkArgs) -> Result<(), CliError> {
    match args.command {
        NetworkCommand::Create { name, cidr } => {
            let network = ctx.manager.create_network(&name, &cidr)?;
            output::print_status(
                &format!("Network '{}' created over {}", network.name, network.cidr),
                ctx.quiet,
            );
            Ok(())
        }

        NetworkCommand::List => {
            let networks = ctx.manager.list_networks()?;
            let out = output::render_list(
                ctx.format,
                &networks,
                |n| NetworkRow::from(n),
                |n| n.name.clone(),
            )?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        NetworkCommand::Show { name } => {
            let network = ctx.manager.network(&name)?;
            let pool = ctx.manager.pool(&name)?;
            let status = NetworkStatus {
                id: network.id.to_string(),
                name: network.name,
                cidr: network.cidr.to_string(),
                hub_address: pool.hub_address().to_string(),
                capacity: pool.capacity(),
                allocated: pool.allocated().count(),
                available: pool.available(),
                created_at: network.created_at,
            };
            let out = output::render_single(ctx.format, &status, detail, |s| s.name.clone())?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        NetworkCommand::Delete { name } => {
            ctx.manager.delete_network(&name)?;
            output::print_status(&format!("Network '{name}' deleted"), ctx.quiet);
            Ok(())
        }
    }
}
