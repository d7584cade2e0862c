//! Command dispatch and execution handlers.

use anyhow::{Context, Result};
use bob_client::{ClientConfig, ConversationClient, Turn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use super::args::{Cli, Commands, PrePromptCommand};

/// Build the client configuration: file (or defaults), then `BOB_*`
/// environment variables, then command-line flags.
pub fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    config.apply_env();
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    Ok(config)
}

/// Dispatch a CLI command to its handler.
pub async fn dispatch_command(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    debug!("Using backend {}", config.base_url);
    let client = ConversationClient::new(config).context("Failed to create client")?;

    match cli.command {
        Commands::List => run_list(&client).await,
        Commands::New { pre_prompt } => run_new(&client, &pre_prompt).await,
        Commands::Show { id } => run_show(&client, &id).await,
        Commands::Send { id, message } => run_send(&client, &id, &message.join(" ")).await,
        Commands::Chat { id } => run_chat(&client, &id).await,
        Commands::Delete { id } => run_delete(&client, &id).await,
        Commands::PrePrompt(PrePromptCommand::Get { id }) => {
            println!("{}", client.get_pre_prompt(&id).await);
            Ok(())
        }
        Commands::PrePrompt(PrePromptCommand::Set { id, text }) => {
            if client.update_pre_prompt(&id, &text).await {
                println!("Pre-prompt updated.");
            } else {
                eprintln!("Pre-prompt update was not acknowledged by the server.");
            }
            Ok(())
        }
    }
}

async fn run_list(client: &ConversationClient) -> Result<()> {
    let conversations = client
        .list_conversations()
        .await
        .with_context(|| format!("Could not reach {}", client.base_url()))?;

    if conversations.is_empty() {
        println!("No conversations.");
    }
    for id in conversations {
        println!("{id}");
    }
    Ok(())
}

async fn run_new(client: &ConversationClient, pre_prompt: &str) -> Result<()> {
    let id = client.create_conversation(pre_prompt).await?;
    println!("{id}");
    Ok(())
}

async fn run_show(client: &ConversationClient, id: &str) -> Result<()> {
    let (pre_prompt, turns) = client.fetch_conversation(id).await?;
    if !pre_prompt.is_empty() {
        println!("[pre-prompt] {pre_prompt}\n");
    }
    print_turns(&turns);
    Ok(())
}

async fn run_send(client: &ConversationClient, id: &str, message: &str) -> Result<()> {
    let reply = client.send_message(id, message).await?;
    println!("{reply}");
    Ok(())
}

async fn run_delete(client: &ConversationClient, id: &str) -> Result<()> {
    client.delete_conversation(id).await?;
    println!("Deleted {id}.");
    Ok(())
}

async fn run_chat(client: &ConversationClient, id: &str) -> Result<()> {
    match client.fetch_conversation(id).await {
        Ok((_, turns)) => print_turns(&turns),
        Err(e) => eprintln!("Could not load history: {e}"),
    }
    println!("Chatting in {id}. Type /quit to exit, /preprompt to show the pre-prompt.\n");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"You: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/preprompt" => {
                println!("{}\n", client.get_pre_prompt(id).await);
                continue;
            }
            _ => {}
        }

        match client.send_message(id, input).await {
            Ok(reply) => println!("Bob: {reply}\n"),
            Err(e) => {
                let placeholder = client
                    .turns(id)
                    .await
                    .last()
                    .map(|t| t.bot.clone())
                    .unwrap_or_default();
                println!("Bob: {placeholder}");
                eprintln!("({e})\n");
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn print_turns(turns: &[Turn]) {
    for turn in turns {
        println!("You: {}", turn.user);
        if !turn.is_pending() {
            println!("Bob: {}", turn.bot);
        }
        println!();
    }
}
