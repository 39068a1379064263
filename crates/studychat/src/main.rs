use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use studychat_common::logger::{self, LogOutput};
use studychat_common::{AppConfig, ChatError};
use studychat_llm::{backend_from_config, ChatSession, HuggingFaceClient, ModelCatalog, PromptPipeline};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    if let Some(root) = find_project_root() {
        let env_path = root.join(".env");
        if env_path.exists() {
            dotenv::from_path(&env_path).ok();
        }
    } else {
        dotenv::dotenv().ok();
    }
}

#[derive(Parser)]
#[command(name = "studychat")]
#[command(about = "StudyChat - study assistant chat over hosted or local language models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,
    },

    /// Chat in the terminal
    Chat {
        /// Catalog model id to start with
        #[arg(long)]
        model: Option<String>,
    },

    /// List the selectable models
    Models,

    /// Check a Hugging Face API token
    CheckToken {
        /// Token to check; defaults to HF_API_TOKEN
        #[arg(long)]
        token: Option<String>,
    },
}

/// One line of terminal input
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Message(&'a str),
    SwitchModel(&'a str),
    ListModels,
    Clear,
    Quit,
    Empty,
    Unknown(&'a str),
}

fn parse_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    if !line.starts_with('/') {
        return ChatInput::Message(line);
    }

    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    match command {
        "/model" if !arg.is_empty() => ChatInput::SwitchModel(arg),
        "/models" | "/model" => ChatInput::ListModels,
        "/clear" => ChatInput::Clear,
        "/quit" | "/exit" => ChatInput::Quit,
        _ => ChatInput::Unknown(command),
    }
}

/// Catalog listing with the current model marked
fn model_listing(catalog: &ModelCatalog, current: &str) -> Vec<String> {
    catalog
        .iter()
        .map(|model| {
            let marker = if model.id == current { "*" } else { " " };
            format!(
                "{} {:<36} {}\n    {}",
                marker, model.id, model.name, model.description
            )
        })
        .collect()
}

fn print_models(catalog: &ModelCatalog, current: &str) {
    for line in model_listing(catalog, current) {
        println!("{}", line);
    }
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

async fn run_chat(config: AppConfig, model: Option<String>) -> Result<()> {
    let backend = match backend_from_config(&config) {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("❌ {}", e.user_message());
            return Err(e.into());
        }
    };

    let model_id = model.unwrap_or_else(|| config.default_model.clone());
    let mut session = ChatSession::new(
        PromptPipeline::default(),
        backend,
        &model_id,
        config.history_window,
    )?;

    tracing::info!("Chat session started with {}", session.model().id);

    println!("StudyChat - {} ({})", session.model().name, session.model().id);
    println!("{}", session.model().description);
    println!("Commands: /model <id>, /models, /clear, /quit");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            ChatInput::Empty => {}
            ChatInput::Quit => break,
            ChatInput::Clear => {
                session.clear_history();
                println!("Conversation cleared.");
            }
            ChatInput::ListModels => {
                print_models(session.pipeline().catalog(), &session.model().id);
            }
            ChatInput::SwitchModel(id) => match session.switch_model(id) {
                Ok(profile) => {
                    println!("🔄 Switched to {}", profile.name);
                    println!("{}", profile.description);
                    println!("Starting fresh conversation - previous context cleared.");
                }
                Err(e) => println!("❌ {}", e.user_message()),
            },
            ChatInput::Unknown(command) => {
                println!("Unknown command: {}", command);
            }
            ChatInput::Message(message) => match session.send(message).await {
                Ok(reply) => {
                    let time = reply.timestamp.with_timezone(&Local).format("%H:%M");
                    println!("[{}] Assistant: {}", time, reply.content);
                }
                Err(e) => {
                    tracing::warn!("Chat turn failed: {}", e);
                    println!("❌ {}", e.user_message());
                }
            },
        }

        println!();
        prompt()?;
    }

    tracing::info!("Chat session ended");
    Ok(())
}

async fn check_token(config: AppConfig, token: Option<String>) -> Result<()> {
    let Some(token) = token.or_else(|| config.hf_api_token.clone()) else {
        return Err(ChatError::config("API token is required (--token or HF_API_TOKEN)").into());
    };

    let client = HuggingFaceClient::new(
        &config.hf_api_base_url,
        token,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let status = client.verify_token().await?;

    if status.valid {
        println!("✅ {}", status.message);
    } else {
        println!("❌ {}", status.message);
        if let Some(error) = &status.error {
            println!("   {}", error);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // AppConfig::from_env() also loads .env; CLI overrides below must win over it
    load_dotenv_from_project_root();

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = &host {
                std::env::set_var("SERVER_HOST", host);
            }
            if let Some(port) = port {
                std::env::set_var("SERVER_PORT", port.to_string());
            }

            let config = AppConfig::from_env()?;
            logger::setup_logging(&config, LogOutput::ConsoleAndFile)?;

            tracing::info!("StudyChat starting...");
            tracing::info!("  Backend: {:?}", config.backend);
            tracing::info!("  Default model: {}", config.default_model);

            println!("Server listening on http://{}", config.server_bind_address());
            studychat_server::start_server(config).await?;
        }
        Some(Commands::Chat { model }) => {
            let config = AppConfig::from_env()?;
            logger::setup_logging(&config, LogOutput::FileOnly)?;
            run_chat(config, model).await?;
        }
        Some(Commands::Models) => {
            let config = AppConfig::from_env()?;
            print_models(&ModelCatalog::builtin(), &config.default_model);
        }
        Some(Commands::CheckToken { token }) => {
            let config = AppConfig::from_env()?;
            logger::setup_logging(&config, LogOutput::FileOnly)?;
            check_token(config, token).await?;
        }
        None => {
            let config = AppConfig::from_env()?;
            logger::setup_logging(&config, LogOutput::ConsoleAndFile)?;

            tracing::info!("StudyChat starting with default configuration...");
            println!("Server listening on http://{}", config.server_bind_address());
            studychat_server::start_server(config).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_messages() {
        assert_eq!(parse_input("  What is a cell?  "), ChatInput::Message("What is a cell?"));
        assert_eq!(parse_input("   "), ChatInput::Empty);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_input("/model gpt2"), ChatInput::SwitchModel("gpt2"));
        assert_eq!(parse_input("/model"), ChatInput::ListModels);
        assert_eq!(parse_input("/models"), ChatInput::ListModels);
        assert_eq!(parse_input("/clear"), ChatInput::Clear);
        assert_eq!(parse_input("/quit"), ChatInput::Quit);
        assert_eq!(parse_input("/help me"), ChatInput::Unknown("/help"));
    }

    #[test]
    fn test_model_listing_marks_default() {
        let config = AppConfig::default();
        let listing = model_listing(&ModelCatalog::builtin(), &config.default_model);

        let marked: Vec<&String> = listing.iter().filter(|l| l.starts_with('*')).collect();
        assert_eq!(marked.len(), 1);
        assert!(marked[0].contains("microsoft/DialoGPT-medium"));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from(["studychat", "chat", "--model", "gpt2"]);
        assert!(matches!(cli.command, Some(Commands::Chat { model: Some(m) }) if m == "gpt2"));

        let cli = Cli::parse_from(["studychat", "check-token"]);
        assert!(matches!(cli.command, Some(Commands::CheckToken { token: None })));
    }
}
