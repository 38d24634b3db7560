use anyhow::Result;
use bat::PrettyPrinter;
use clap::Parser;
use cliclack::{confirm, input, spinner};
use console::style;

use ferry::agent::{Agent, AgentReply, DeepAgent};
use ferry::message::AgentMessage;
use ferry::providers::factory;
use ferry::providers::resolver::{resolve, Env};
use ferry::workspace::Workspace;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Provider to use (anthropic, databricks, openai, azure)
    #[arg(short, long, default_value = "anthropic")]
    provider: String,

    /// Model identifier (provider-specific default when omitted)
    #[arg(short, long)]
    model: Option<String>,

    /// API key (falls back to the provider's environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// Custom endpoint URL (Databricks, Azure)
    #[arg(long)]
    endpoint: Option<String>,

    /// Directory for agent file operations
    #[arg(short, long, default_value = "workspace")]
    workspace: String,

    /// Skip the confirmation prompt before each agent call
    #[arg(long)]
    auto_approve: bool,

    /// Verbose error output
    #[arg(short, long)]
    verbose: bool,

    /// Single query to run non-interactively
    query: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env = Env::from_process();
    let config = resolve(
        &cli.provider,
        cli.model.as_deref(),
        cli.api_key.as_deref(),
        cli.endpoint.as_deref(),
        &env,
    )?;
    let provider = factory::get_provider(&config)?;
    let workspace = Workspace::open(&cli.workspace)?;
    let agent = DeepAgent::new(provider, workspace);

    if let Some(query) = &cli.query {
        let reply = agent.invoke(&[AgentMessage::user(query)]).await?;
        print_reply(&reply).await;
        return Ok(());
    }

    println!(
        "{} {}",
        style("Ferry agent").bold(),
        style(format!("({} / {})", config.provider, config.model)).dim()
    );
    println!(
        "{}",
        style("type \"exit\" to end the session, \"clear\" to reset history").dim()
    );
    println!("\n");

    let mut history: Vec<AgentMessage> = Vec::new();

    loop {
        let message_text: String = input("Message:").placeholder("").multiline().interact()?;
        let trimmed = message_text.trim();

        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }
        if trimmed.eq_ignore_ascii_case("clear") {
            history.clear();
            println!("{}", style("history cleared").dim());
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }

        if !cli.auto_approve {
            let approved = confirm("Send to agent?").initial_value(true).interact()?;
            if !approved {
                continue;
            }
        }

        history.push(AgentMessage::user(trimmed));

        let spin = spinner();
        spin.start("awaiting reply");
        let result = agent.invoke(&history).await;
        spin.stop("");

        match result {
            Ok(reply) => match reply.last_content() {
                Some(text) => {
                    history.push(AgentMessage::assistant(text));
                    render(text).await;
                }
                None => println!("No response generated."),
            },
            Err(err) => {
                if cli.verbose {
                    eprintln!("Error: {:?}", err);
                } else {
                    eprintln!("Error: {}", err);
                }
                // Keep history consistent with what the agent actually saw.
                history.pop();
            }
        }

        println!("\n");
    }

    Ok(())
}

async fn print_reply(reply: &AgentReply) {
    match reply.last_content() {
        Some(text) => render(text).await,
        None => println!("No response generated."),
    }
}

async fn render(content: &str) {
    PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("markdown")
        .print()
        .unwrap();
}
