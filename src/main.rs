//! Teleops Desk CLI
//!
//! Entry point for the `teleops` command-line tool.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use teleops_desk::master::LinkSupportItem;
use teleops_desk::summary::TableFilter;
use teleops_desk::{
    AssignmentDraft, AssignmentService, Category, DeskConfig, Status, WorkflowAction,
};
use teleops_store::MemoryStore;

#[derive(Parser)]
#[command(name = "teleops")]
#[command(about = "Job-assignment desk for telecom operations", version)]
struct Cli {
    /// Path to config file (default: teleops.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new assignment
    New {
        /// Category slug (e.g. sub_preventive, plan_interruption, team)
        category: String,

        /// Job type offered by the category
        #[arg(long, short = 't')]
        job_type: String,

        /// Job description
        #[arg(long, short = 'd')]
        description: String,

        /// Scheduled date (RFC 3339; default now)
        #[arg(long)]
        action_date: Option<String>,

        /// Reporting agency
        #[arg(long)]
        agency: Option<String>,

        /// Work location
        #[arg(long)]
        location: Option<String>,

        /// Free-form remark
        #[arg(long)]
        remark: Option<String>,

        /// Route code (subcontractor categories)
        #[arg(long)]
        route_code: Option<String>,

        /// Budgeted expenses
        #[arg(long)]
        expenses: Option<f64>,

        /// Responders on call (repeatable)
        #[arg(long = "responder")]
        responders: Vec<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List assignments
    List {
        /// Restrict to one category
        category: Option<String>,

        /// Filter by status slug
        #[arg(long, short = 's')]
        status: Option<String>,

        /// Substring search over the table columns
        #[arg(long, short = 'q')]
        search: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Apply a workflow action to an assignment
    Action {
        /// Assignment document id
        id: String,

        /// Action: receive, assign, approve, finish, complete, cancel
        action: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Delete an assignment
    Delete {
        /// Assignment document id
        id: String,
    },

    /// Show the round-robin preview for a subcontractor category
    Preview {
        /// Category slug
        category: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the next internal id without consuming it
    NextId {
        /// Category slug
        category: String,
    },

    /// Subcontractor roster management
    Roster {
        #[command(subcommand)]
        action: RosterCommands,
    },

    /// Responder directory management
    Responders {
        #[command(subcommand)]
        action: ResponderCommands,
    },

    /// Support-link directory management
    Links {
        #[command(subcommand)]
        action: LinkCommands,
    },

    /// Dashboard summary of the current snapshot
    Summary {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Validate a corporate account and mint a session token
    Login {
        /// Corporate email address
        email: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum RosterCommands {
    /// Append a team to the rotation roster
    Add { name: String },
    /// Remove a team (rotation indexes are not reset)
    Remove { name: String },
    /// List the roster in rotation order
    List,
}

#[derive(Subcommand)]
enum ResponderCommands {
    /// Add a responder, optionally with a phone number
    Add {
        name: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Remove a responder entry (exact text)
    Remove { entry: String },
    /// List the directory
    List,
}

#[derive(Subcommand)]
enum LinkCommands {
    /// Add a support link (url gets https:// when no scheme is given)
    Add {
        name: String,
        url: String,
        /// Link kind, e.g. "Site Access"
        #[arg(long, default_value = "Link Support")]
        kind: String,
        #[arg(long)]
        detail: Option<String>,
    },
    /// Remove a link by name
    Remove { name: String },
    /// List the directory
    List,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = load_config(cli.config);
    let store = match MemoryStore::open(&config.data_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Error opening store {}: {}", config.data_path.display(), e);
            process::exit(10);
        }
    };
    let service = AssignmentService::new(store.clone());

    match cli.command {
        Commands::New {
            category,
            job_type,
            description,
            action_date,
            agency,
            location,
            remark,
            route_code,
            expenses,
            responders,
            json,
        } => {
            let category = parse_category(&category);
            let mut draft = AssignmentDraft::new(category)
                .job_type(job_type)
                .description(description);
            if let Some(date) = action_date {
                draft = draft.action_date(parse_date(&date));
            }
            if let Some(agency) = agency {
                draft = draft.agency(agency);
            }
            if let Some(location) = location {
                draft = draft.location(location);
            }
            if let Some(remark) = remark {
                draft = draft.remark(remark);
            }
            if let Some(route_code) = route_code {
                draft = draft.route_code(route_code);
            }
            if let Some(expenses) = expenses {
                draft = draft.expenses(expenses);
            }
            for responder in responders {
                draft = draft.responder(responder);
            }

            let assignment = ok_or_exit(service.create(draft));
            if json {
                print_json(&assignment);
            } else {
                println!(
                    "Created {} ({}) in {}",
                    assignment.internal_id,
                    assignment.id,
                    assignment.category.title()
                );
                if let Some(subcontractor) = &assignment.subcontractor {
                    println!("  Assigned to: {}", subcontractor);
                }
            }
        }

        Commands::List {
            category,
            status,
            search,
            json,
        } => {
            let assignments = match category {
                Some(slug) => ok_or_exit(service.assignments_in(parse_category(&slug))),
                None => ok_or_exit(service.assignments()),
            };
            let filter = TableFilter {
                search: search.unwrap_or_default(),
                status: status.map(|s| parse_status(&s)),
            };
            let rows: Vec<_> = assignments.iter().filter(|a| filter.matches(a)).collect();

            if json {
                print_json(&rows);
            } else if rows.is_empty() {
                println!("No assignments.");
            } else {
                for a in rows {
                    println!(
                        "{}  {:<12} {:<10} {:<20} {}",
                        a.internal_id,
                        a.status.label(),
                        a.category.slug(),
                        a.subcontractor.as_deref().unwrap_or("-"),
                        a.description
                    );
                }
            }
        }

        Commands::Action { id, action, json } => {
            let action = parse_action(&action);
            let assignment = ok_or_exit(service.apply_action(&id, action));
            if json {
                print_json(&assignment);
            } else {
                println!(
                    "{} -> {}",
                    assignment.internal_id,
                    assignment.status.label()
                );
            }
        }

        Commands::Delete { id } => {
            ok_or_exit(service.delete(&id));
            println!("Deleted {}", id);
        }

        Commands::Preview { category, json } => {
            let category = parse_category(&category);
            let preview = ok_or_exit(service.rotation_preview(category));
            match preview {
                Some(preview) => {
                    if json {
                        print_json(&preview);
                    } else {
                        println!("Previous: {}", preview.previous);
                        println!("Current:  {}", preview.current);
                    }
                }
                None => {
                    if json {
                        print_json(&json!(null));
                    } else {
                        println!(
                            "No rotation for {} (not a subcontractor category, or empty roster)",
                            category.slug()
                        );
                    }
                }
            }
        }

        Commands::NextId { category } => {
            let category = parse_category(&category);
            println!("{}", ok_or_exit(service.next_internal_id(category)));
        }

        Commands::Roster { action } => match action {
            RosterCommands::Add { name } => {
                ok_or_exit(service.add_subcontractor(&name));
                println!("Added {}", name);
            }
            RosterCommands::Remove { name } => {
                ok_or_exit(service.remove_subcontractor(&name));
                println!("Removed {}", name);
            }
            RosterCommands::List => {
                let master = ok_or_exit(service.master_data());
                for (position, name) in master.subcontractors.iter().enumerate() {
                    println!("{:>3}. {}", position + 1, name);
                }
            }
        },

        Commands::Responders { action } => match action {
            ResponderCommands::Add { name, phone } => {
                ok_or_exit(service.add_responder(&name, phone.as_deref()));
                println!("Added {}", name);
            }
            ResponderCommands::Remove { entry } => {
                ok_or_exit(service.remove_responder(&entry));
                println!("Removed {}", entry);
            }
            ResponderCommands::List => {
                let master = ok_or_exit(service.master_data());
                for entry in &master.ns_respond {
                    println!("{}", entry);
                }
            }
        },

        Commands::Links { action } => match action {
            LinkCommands::Add {
                name,
                url,
                kind,
                detail,
            } => {
                let link = ok_or_exit(service.add_link(LinkSupportItem {
                    name,
                    url,
                    kind,
                    detail,
                }));
                println!("Added {} ({})", link.name, link.url);
            }
            LinkCommands::Remove { name } => {
                ok_or_exit(service.remove_link(&name));
                println!("Removed {}", name);
            }
            LinkCommands::List => {
                let master = ok_or_exit(service.master_data());
                for link in &master.link_support {
                    println!("{:<24} {:<16} {}", link.name, link.kind, link.url);
                }
            }
        },

        Commands::Summary { json } => {
            let summary = ok_or_exit(service.summary());
            if json {
                print_json(&summary);
            } else {
                println!("{}", summary.human_summary);
                for (status, count) in &summary.by_status {
                    println!("  {:<12} {}", status, count);
                }
            }
        }

        Commands::Login { email, json } => {
            let session = ok_or_exit(service.login(
                &email,
                &config.corporate_domain,
                config.session_ttl_seconds,
            ));
            if json {
                print_json(&session);
            } else {
                println!("Session for {} (expires {})", session.email, session.expires_at);
                println!("{}", session.token);
            }
        }
    }

    if let Err(e) = store.persist() {
        eprintln!("Error persisting store: {}", e);
        process::exit(10);
    }
}

fn load_config(config_path: Option<PathBuf>) -> DeskConfig {
    let path = config_path.unwrap_or_else(|| PathBuf::from("teleops.toml"));
    if path.exists() {
        match DeskConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                process::exit(1);
            }
        }
    } else {
        DeskConfig::default()
    }
}

fn ok_or_exit<T>(result: Result<T, teleops_desk::ServiceError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn parse_category(slug: &str) -> Category {
    match slug.parse() {
        Ok(category) => category,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!(
                "Known categories: {}",
                Category::ALL
                    .iter()
                    .map(|c| c.slug())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            process::exit(2);
        }
    }
}

fn parse_status(slug: &str) -> Status {
    match slug.parse() {
        Ok(status) => status,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
}

fn parse_action(slug: &str) -> WorkflowAction {
    match slug.parse() {
        Ok(action) => action,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
}

fn parse_date(value: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(date) => date.with_timezone(&Utc),
        Err(e) => {
            eprintln!("Error parsing date {:?}: {}", value, e);
            process::exit(2);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}
