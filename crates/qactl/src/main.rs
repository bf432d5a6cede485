//! QA Control - CLI for the group FAQ knowledge base
//!
//! `chat` feeds stdin lines through the bot as group messages; the other
//! subcommands call the engine directly.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qa_common::config::QaConfig;
use qa_common::{Answer, QaEngine};
use qactl::render;
use qactl::{Bot, JsonSwitchGate, Message, RolePolicy};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qactl")]
#[command(about = "QA knowledge base for chat groups", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read messages from stdin and print replies
    Chat {
        #[arg(long, default_value = "local")]
        group: String,

        #[arg(long, default_value = "0")]
        user: String,

        #[arg(long, default_value = "member")]
        role: String,

        /// Each line is a JSON message instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Answer one question
    Ask {
        #[arg(long)]
        group: String,
        question: String,
    },

    /// Add or replace a question
    Add {
        #[arg(long)]
        group: String,
        question: String,
        answer: String,
    },

    /// Delete a question
    Delete {
        #[arg(long)]
        group: String,
        question: String,
    },

    /// List stored questions
    List {
        #[arg(long)]
        group: String,

        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Similarity of two texts
    Compare { text_a: String, text_b: String },

    /// Switch a group's knowledge base on or off
    Toggle {
        #[arg(long)]
        group: String,

        #[arg(value_parser = ["on", "off"])]
        state: String,
    },

    /// Import a legacy keyword-grouped JSON file
    Import {
        #[arg(long)]
        group: String,
        path: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<QaConfig> {
    match path {
        Some(path) => QaConfig::load_from(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(QaConfig::load()),
    }
}

fn init_logging(config: &QaConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_logging(&config);

    let switch = JsonSwitchGate::load(config.switch_file(), config.switch.default_enabled)
        .context("loading switch state")?;
    let policy = RolePolicy::from_config(&config.auth);
    let engine = Arc::new(QaEngine::new(config, Arc::new(switch)));

    match cli.command {
        Commands::Chat {
            group,
            user,
            role,
            json,
        } => chat(Bot::new(engine, policy), group, user, role, json).await,
        Commands::Ask { group, question } => {
            match engine.ask(&group, &question).await? {
                Answer::NoMatch => println!("(no match)"),
                Answer::Disabled => println!("(disabled)"),
                answer => {
                    let body = render::render_answer(&answer, true).unwrap_or_default();
                    println!("{}", body);
                }
            }
            Ok(())
        }
        Commands::Add {
            group,
            question,
            answer,
        } => {
            let outcome = engine.upsert(&group, &question, &answer).await?;
            println!("{}", render::render_upsert(outcome, &question, &answer));
            Ok(())
        }
        Commands::Delete { group, question } => {
            let removed = engine.delete(&group, &question).await?;
            println!("{}", render::render_delete(removed, &question));
            Ok(())
        }
        Commands::List { group, page } => {
            let entries = engine.list(&group).await?;
            let page_size = engine.config().display.page_size;
            println!("{}", render::render_list(&entries, page, page_size));
            Ok(())
        }
        Commands::Compare { text_a, text_b } => {
            let score = engine.compare(&text_a, &text_b);
            println!("{}", render::render_compare(&text_a, &text_b, score));
            Ok(())
        }
        Commands::Toggle { group, state } => {
            engine.set_enabled(&group, state == "on")?;
            println!("{}: {}", group, state);
            Ok(())
        }
        Commands::Import { group, path } => {
            let report = engine
                .import_legacy(&group, path.clone())
                .await
                .with_context(|| format!("importing {}", path.display()))?;
            println!("imported {}, skipped {}", report.imported, report.skipped);
            Ok(())
        }
    }
}

async fn chat(
    bot: Bot<RolePolicy>,
    group: String,
    user: String,
    role: String,
    json: bool,
) -> Result<()> {
    info!("Chat session for group {} as {} ({})", group, user, role);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut next_id: u64 = 1;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let msg = if json {
            match serde_json::from_str::<Message>(&line) {
                Ok(mut msg) => {
                    if msg.message_id.is_empty() {
                        msg.message_id = next_id.to_string();
                    }
                    msg
                }
                Err(e) => {
                    error!("Skipping malformed message: {}", e);
                    continue;
                }
            }
        } else {
            Message {
                namespace: group.clone(),
                user_id: user.clone(),
                role: role.clone(),
                message_id: next_id.to_string(),
                text: line,
            }
        };
        next_id += 1;

        if let Some(reply) = bot.handle(&msg).await? {
            println!("{}", reply);
        }
    }

    Ok(())
}
