pub mod spoonacular;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ChefError;
use crate::models::recipe::{ MealCategory, Recipe, RecipeSummary };
use self::spoonacular::SpoonacularClient;

#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn search(
        &self,
        ingredients: &str,
        category: MealCategory,
        limit: usize
    ) -> Result<Vec<RecipeSummary>, ChefError>;

    async fn fetch_details(&self, id: i64) -> Result<Recipe, ChefError>;

    async fn fetch_random(&self) -> Result<Recipe, ChefError>;
}

#[derive(Debug, Clone)]
pub struct RecipeSourceConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

pub fn new_source(config: &RecipeSourceConfig) -> Result<Arc<dyn RecipeSource>, ChefError> {
    let client = SpoonacularClient::from_config(config)?;
    info!(
        "Recipe source configured: Spoonacular at {} (timeout {:?})",
        config.base_url,
        config.timeout
    );
    Ok(Arc::new(client))
}
