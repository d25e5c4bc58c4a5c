use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use errorhint::config::Config;
use errorhint::links::{ForumLinkIndex, Post, PostEvent, PostKey};
use errorhint::preferences::Preferences;
use errorhint::run_log::log_code_run;
use errorhint::store::{DocumentStore, JsonFileStore};
use errorhint::strategy::{ExecutionContext, Explainer, OutputSink, StrategyKind};
use errorhint::{extract_relevant_trace, signature};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "errorhint", version, about = "Beginner-friendly Python error messages")]
struct Cli {
    /// Config file to use instead of the per-user one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Format an interpreter error for a student
    Explain {
        /// File holding the interpreter's stderr (stdin when omitted)
        #[arg(long)]
        stderr: Option<PathBuf>,
        /// The student's program
        #[arg(long)]
        code: Option<PathBuf>,
        /// Strategy id; the user's stored preference when omitted
        #[arg(long)]
        strategy: Option<String>,
        /// Look up the strategy preference of this user
        #[arg(long)]
        user: Option<String>,
        /// The program targets the Karel runtime
        #[arg(long)]
        karel: bool,
        #[arg(long, default_value = "")]
        title: String,
    },
    /// Print the normalized signature of an error
    Signature {
        #[arg(long)]
        stderr: Option<PathBuf>,
    },
    /// Maintain the error pattern -> forum post index
    Links {
        #[command(subcommand)]
        command: LinksCommand,
    },
    /// Per-user strategy preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommand,
    },
    /// Record one program run
    Log {
        user: String,
        #[arg(long)]
        code: PathBuf,
        /// JSON file with the run results
        #[arg(long)]
        results: Option<PathBuf>,
        /// JSON file with the unit test results
        #[arg(long)]
        tests: Option<PathBuf>,
        /// JSON file with the project data
        #[arg(long)]
        project: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum LinksCommand {
    /// A post was created or edited
    Update {
        /// course/forum/post
        #[arg(long)]
        key: PostKey,
        /// JSON of the post after the change
        #[arg(long)]
        after: PathBuf,
        /// JSON of the post before the change
        #[arg(long)]
        before: Option<PathBuf>,
    },
    /// A post was deleted
    Delete {
        #[arg(long)]
        key: PostKey,
    },
    /// Print the index
    Show,
}

#[derive(Subcommand)]
enum PrefsCommand {
    Set { user: String, kind: String },
    Get { user: String },
    /// Print the user's strategy, assigning a random one if unset
    Init { user: String },
    /// List strategy ids
    List,
}

struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_and_scroll(&mut self, text: &str) {
        let mut stdout = io::stdout();
        // The console is best-effort; a closed pipe must not abort formatting.
        let _ = write!(stdout, "{}", text).and_then(|_| stdout.flush());
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => {
            fs::read_to_string(path).with_context(|| format!("reading {:?}", path))
        }
        _ => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

fn read_json(path: Option<&Path>) -> Result<serde_json::Value> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
            Ok(serde_json::from_str(&content).with_context(|| format!("parsing {:?}", path))?)
        }
        None => Ok(serde_json::Value::Null),
    }
}

fn read_post(path: &Path) -> Result<Post> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("parsing post {:?}", path))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::ensure_config_exists()?,
    };
    let store: Arc<dyn DocumentStore> = Arc::new(JsonFileStore::new(config.store_path()?));

    match cli.command {
        Command::Explain {
            stderr,
            code,
            strategy,
            user,
            karel,
            title,
        } => {
            let stderr = read_input(stderr.as_deref())?;
            let code = match code {
                Some(path) => fs::read_to_string(&path).with_context(|| format!("reading {:?}", path))?,
                None => String::new(),
            };
            let strategy = match (strategy, user) {
                (Some(strategy), _) => strategy,
                (None, Some(user)) => Preferences::new(store.clone()).get_error_message_type(&user).await?,
                (None, None) => StrategyKind::default().id().to_string(),
            };

            let explainer = Explainer::from_config(&config);
            let links = store.forum_links().await?;
            let context = ExecutionContext { is_karel: karel, title };
            let mut sink = StdoutSink;

            match explainer
                .get_error_message(&code, &stderr, &strategy, &context, &mut sink, Some(&links))
                .await
            {
                Ok(message) => println!("\r\n{}", message),
                Err(e) => {
                    eprintln!("{}: {}", "Could not get an explanation".red().bold(), e);
                    println!("\r\n{}", extract_relevant_trace(&stderr, explainer.styler()));
                }
            }
        }
        Command::Signature { stderr } => {
            let stderr = read_input(stderr.as_deref())?;
            println!("{}", signature(&stderr));
        }
        Command::Links { command } => {
            let index = ForumLinkIndex::new(store.clone(), config.forum.main_forum_id.clone());
            match command {
                LinksCommand::Update { key, after, before } => {
                    let event = PostEvent::Updated {
                        key,
                        before: before.as_deref().map(read_post).transpose()?,
                        after: read_post(&after)?,
                    };
                    index.handle(&event).await;
                }
                LinksCommand::Delete { key } => {
                    index.handle(&PostEvent::Deleted { key, snapshot: None }).await;
                }
                LinksCommand::Show => {
                    for (key, entry) in store.forum_links().await? {
                        println!("{}", key.blue().bold());
                        for post_id in entry.post_ids {
                            println!("  {}", post_id);
                        }
                    }
                }
            }
        }
        Command::Prefs { command } => {
            let prefs = Preferences::new(store.clone());
            match command {
                PrefsCommand::Set { user, kind } => prefs.set_error_message_type(&user, &kind).await?,
                PrefsCommand::Get { user } => println!("{}", prefs.get_error_message_type(&user).await?),
                PrefsCommand::Init { user } => {
                    println!("{}", prefs.init_selected_error_message_type(&user).await?)
                }
                PrefsCommand::List => {
                    for kind in StrategyKind::ASSIGNABLE {
                        println!("{:<14}{}", kind.id().green(), kind.label());
                    }
                    println!(
                        "{:<14}{}",
                        StrategyKind::ShortExplanation.id().green(),
                        StrategyKind::ShortExplanation.label()
                    );
                }
            }
        }
        Command::Log {
            user,
            code,
            results,
            tests,
            project,
        } => {
            let code = fs::read_to_string(&code).with_context(|| format!("reading {:?}", code))?;
            let id = log_code_run(
                store.as_ref(),
                &user,
                read_json(project.as_deref())?,
                &code,
                read_json(tests.as_deref())?,
                read_json(results.as_deref())?,
            )
            .await?;
            println!("{} {}", "Logged run".green(), id);
        }
    }

    Ok(())
}
