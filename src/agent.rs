use crate::cli::Args;
use crate::config::credentials::load_credentials;
use crate::config::diet::resolve_policy;
use crate::dietary::{ self, DietaryPolicy };
use crate::error::ChefError;
use crate::history::{ format_prompt, ConversationMemory };
use crate::llm::chat::{ ChatClient, new_client as new_chat_client };
use crate::llm::{ LlmConfig, LlmType };
use crate::models::recipe::{ MealCategory, Recipe };
use crate::recipes::{ new_source, RecipeSource, RecipeSourceConfig };

use log::{ error, info, warn };
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub recipe_limit: usize,
    pub detail_concurrency: usize,
    pub random_max_attempts: usize,
    pub include_history: bool,
    pub match_ingredients: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            recipe_limit: 10,
            detail_concurrency: 4,
            random_max_attempts: 10,
            include_history: true,
            match_ingredients: true,
        }
    }
}

impl From<&Args> for AgentSettings {
    fn from(args: &Args) -> Self {
        Self {
            recipe_limit: args.recipe_limit,
            detail_concurrency: args.detail_concurrency,
            random_max_attempts: args.random_max_attempts,
            include_history: args.include_history,
            match_ingredients: args.match_ingredients,
        }
    }
}

/// Outcome of a "get ideas" request. `error` carries an upstream failure
/// alongside the (then empty) recipe list so the caller can show both.
#[derive(Debug, Clone)]
pub struct MealIdeas {
    pub category: MealCategory,
    pub message: String,
    pub recipes: Vec<Recipe>,
    pub error: Option<ChefError>,
}

#[derive(Clone)]
pub struct ChefAgent {
    recipe_source: Arc<dyn RecipeSource>,
    chat_client: Arc<dyn ChatClient>,
    policy: Arc<DietaryPolicy>,
    settings: AgentSettings,
}

impl ChefAgent {
    pub fn from_parts(
        recipe_source: Arc<dyn RecipeSource>,
        chat_client: Arc<dyn ChatClient>,
        policy: DietaryPolicy,
        settings: AgentSettings
    ) -> Self {
        Self {
            recipe_source,
            chat_client,
            policy: Arc::new(policy),
            settings,
        }
    }

    pub fn new(args: &Args) -> Result<Self, ChefError> {
        let chat_llm_type: LlmType = args.chat_llm_type
            .parse()
            .map_err(|e| ChefError::Config(format!("{}", e)))?;
        let credentials = load_credentials(args, chat_llm_type.requires_api_key())?;
        let timeout = Duration::from_secs(args.request_timeout_secs.max(1));

        let policy = resolve_policy(&args.diet_profile, args.diet_profiles_path.as_deref())?;
        info!(
            "Dietary profile '{}': {} forbidden term(s), {} required term(s)",
            policy.name,
            policy.forbidden_terms.len(),
            policy.required_any_of.len()
        );

        let recipe_source = new_source(
            &(RecipeSourceConfig {
                api_key: credentials.spoonacular_api_key.clone(),
                base_url: args.spoonacular_base_url.clone(),
                timeout,
            })
        )?;

        let chat_config = LlmConfig {
            llm_type: chat_llm_type,
            base_url: args.chat_base_url.clone(),
            api_key: credentials.chat_api_key.clone(),
            completion_model: args.chat_model.clone(),
            timeout,
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={:?}",
            args.chat_llm_type,
            chat_client.get_model(),
            chat_client.get_base_url().as_deref().unwrap_or("adapter default")
        );

        Ok(Self::from_parts(recipe_source, chat_client, policy, AgentSettings::from(args)))
    }

    pub fn policy(&self) -> &DietaryPolicy {
        &self.policy
    }


    /// Search, fetch details for every hit, then keep recipes that satisfy the
    /// configured profile and (when enabled) use something from the pantry, in
    /// search order. Only the search itself can fail the whole request.
    pub async fn suggest_meals(
        &self,
        ingredients: &str,
        category: MealCategory
    ) -> Result<Vec<Recipe>, ChefError> {
        let summaries = self.recipe_source.search(
            ingredients,
            category,
            self.settings.recipe_limit
        ).await?;
        info!("Search for {} with '{}' returned {} hit(s)", category, ingredients, summaries.len());
        if summaries.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = summaries
            .iter()
            .map(|s| s.id)
            .collect();
        let detailed = dietary::fetch_all_details(
            self.recipe_source.as_ref(),
            &ids,
            self.settings.detail_concurrency
        ).await;

        let compliant = dietary::filter_compliant(detailed, &self.policy);
        if self.settings.match_ingredients && !ingredients.trim().is_empty() {
            Ok(dietary::filter_compliant(compliant, &DietaryPolicy::pantry(ingredients)))
        } else {
            Ok(compliant)
        }
    }

    pub async fn meal_ideas(
        &self,
        memory: &mut ConversationMemory,
        ingredients: &str,
        category: MealCategory
    ) -> MealIdeas {
        let label = category.to_string().to_lowercase();
        let ideas = match self.suggest_meals(ingredients, category).await {
            Ok(recipes) if recipes.is_empty() =>
                MealIdeas {
                    category,
                    message: format!(
                        "I couldn't find any {} meal ideas based on those ingredients.",
                        label
                    ),
                    recipes,
                    error: None,
                },
            Ok(recipes) => {
                let titles: Vec<&str> = recipes
                    .iter()
                    .map(|r| r.title.as_str())
                    .collect();
                MealIdeas {
                    category,
                    message: format!(
                        "Here are some {} meal ideas based on your ingredients: {}",
                        label,
                        titles.join(", ")
                    ),
                    recipes,
                    error: None,
                }
            }
            Err(e) => {
                error!("Meal idea lookup failed: {}", e);
                MealIdeas {
                    category,
                    message: "Sorry, I couldn't fetch meal ideas right now. Try again later!".to_string(),
                    recipes: Vec::new(),
                    error: Some(e),
                }
            }
        };

        memory.append(format!("Ingredients: {}, Meal Type: {}", ingredients, category), &ideas.message);
        ideas
    }

    pub async fn random_recipe(&self) -> Result<Recipe, ChefError> {
        dietary::pick_random_compliant(
            self.recipe_source.as_ref(),
            &self.policy,
            self.settings.random_max_attempts
        ).await
    }

    pub async fn surprise_me(&self, memory: &mut ConversationMemory) -> Result<Recipe, ChefError> {
        let result = self.random_recipe().await;

        let reply = match &result {
            Ok(recipe) => format!("How about {}? Ingredients: {}", recipe.title, recipe.ingredient_list()),
            Err(ChefError::NotFound(_)) =>
                "I couldn't find a suitable random recipe this time. Try again!".to_string(),
            Err(e) => {
                warn!("Random recipe lookup failed: {}", e);
                "Sorry, I couldn't fetch a random recipe right now. Try again later!".to_string()
            }
        };
        memory.append("Surprise me", reply);
        result
    }

    pub async fn chat(
        &self,
        memory: &mut ConversationMemory,
        message: &str
    ) -> Result<String, ChefError> {
        let prompt = format_prompt(memory, message, self.settings.include_history);
        let response = self.chat_client.complete(&prompt).await.map_err(|e| {
            error!("Chat completion error: {}", e);
            e
        })?;
        let reply = response.response.trim().to_string();
        memory.append(message, &reply);
        Ok(reply)
    }
}
