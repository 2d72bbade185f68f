pub mod agent;
pub mod cli;
pub mod config;
pub mod dietary;
pub mod error;
pub mod history;
pub mod llm;
pub mod models;
pub mod recipes;
pub mod server;

use agent::ChefAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("HTTP Port: {:?}", args.http_port);
    info!("Spoonacular Base URL: {}", args.spoonacular_base_url);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("Diet Profile: {}", args.diet_profile);
    info!("Match Ingredients: {}", args.match_ingredients);
    info!("Include History: {}", args.include_history);
    info!("Recipe Limit: {}", args.recipe_limit);
    info!("Detail Concurrency: {}", args.detail_concurrency);
    info!("Random Max Attempts: {}", args.random_max_attempts);
    info!("Request Timeout: {}s", args.request_timeout_secs);
    info!("-------------------------");

    let agent = Arc::new(ChefAgent::new(&args)?);
    info!("Starting server on: {}", args.server_addr);
    let server = Server::new(
        args.server_addr.clone(),
        agent,
        args.server_api_key.clone(),
        args.http_port
    );
    server.run().await?;

    Ok(())
}
