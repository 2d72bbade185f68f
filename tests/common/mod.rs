#![allow(dead_code)]

use async_trait::async_trait;
use chefmate::error::ChefError;
use chefmate::llm::chat::{ ChatClient, CompletionResponse };
use chefmate::models::recipe::{ MealCategory, Recipe, RecipeSummary };
use chefmate::recipes::RecipeSource;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{ AtomicUsize, Ordering };

pub fn recipe(id: i64, title: &str, ingredients: &[&str]) -> Recipe {
    Recipe {
        id,
        title: title.to_string(),
        image_url: format!("https://img.example/{}.jpg", id),
        source_url: format!("https://recipes.example/{}", id),
        ingredients: ingredients
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

pub struct FakeSource {
    pub search_result: Result<Vec<i64>, ChefError>,
    pub details: HashMap<i64, Result<Recipe, ChefError>>,
    pub random: Vec<Result<Recipe, ChefError>>,
    pub random_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub last_search: Mutex<Option<(String, MealCategory, usize)>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            search_result: Ok(Vec::new()),
            details: HashMap::new(),
            random: Vec::new(),
            random_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            last_search: Mutex::new(None),
        }
    }

    pub fn with_recipes(recipes: Vec<Recipe>) -> Self {
        let mut source = Self::new();
        source.search_result = Ok(
            recipes
                .iter()
                .map(|r| r.id)
                .collect()
        );
        for r in recipes {
            source.details.insert(r.id, Ok(r));
        }
        source
    }
}

#[async_trait]
impl RecipeSource for FakeSource {
    async fn search(
        &self,
        ingredients: &str,
        category: MealCategory,
        limit: usize
    ) -> Result<Vec<RecipeSummary>, ChefError> {
        *self.last_search.lock().unwrap() = Some((ingredients.to_string(), category, limit));
        let ids = self.search_result.clone()?;
        Ok(
            ids
                .into_iter()
                .take(limit)
                .map(|id| RecipeSummary { id, title: format!("hit {}", id), image_url: None })
                .collect()
        )
    }

    async fn fetch_details(&self, id: i64) -> Result<Recipe, ChefError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.details
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Err(ChefError::NotFound(format!("no recipe {}", id))))
    }

    async fn fetch_random(&self) -> Result<Recipe, ChefError> {
        let n = self.random_calls.fetch_add(1, Ordering::SeqCst);
        if self.random.is_empty() {
            return Err(ChefError::NotFound("empty".into()));
        }
        self.random[n % self.random.len()].clone()
    }
}

pub struct FakeChat {
    pub reply: Result<String, ChefError>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeChat {
    pub fn replying(reply: &str) -> Self {
        Self { reply: Ok(reply.to_string()), prompts: Mutex::new(Vec::new()) }
    }

    pub fn failing(err: ChefError) -> Self {
        Self { reply: Err(err), prompts: Mutex::new(Vec::new()) }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for FakeChat {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, ChefError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map(|response| CompletionResponse { response })
    }

    fn get_model(&self) -> String {
        "fake".to_string()
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}
