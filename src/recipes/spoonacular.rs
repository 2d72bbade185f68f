use async_trait::async_trait;
use log::{ debug, error, warn };
use reqwest::{ Client as HttpClient, Response };
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{ RecipeSource, RecipeSourceConfig };
use crate::error::ChefError;
use crate::models::recipe::{ MealCategory, Recipe, RecipeSummary };

pub const DEFAULT_BASE_URL: &str = "https://api.spoonacular.com";

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    id: Option<i64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

#[derive(Deserialize)]
struct RandomResponse {
    #[serde(default)]
    recipes: Vec<RecipeInformation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecipeInformation {
    id: Option<i64>,
    title: Option<String>,
    image: Option<String>,
    source_url: Option<String>,
    extended_ingredients: Option<Vec<ExtendedIngredient>>,
}

#[derive(Deserialize)]
struct ExtendedIngredient {
    name: Option<String>,
}

impl TryFrom<RecipeInformation> for Recipe {
    type Error = ChefError;

    fn try_from(info: RecipeInformation) -> Result<Self, Self::Error> {
        let id = info.id.ok_or_else(|| ChefError::NotFound("recipe without id".to_string()))?;
        let missing = |field: &str| ChefError::NotFound(format!("recipe {} has no {}", id, field));

        let title = info.title.ok_or_else(|| missing("title"))?;
        let image_url = info.image.ok_or_else(|| missing("image"))?;
        let source_url = info.source_url.ok_or_else(|| missing("sourceUrl"))?;
        let ingredients = info.extended_ingredients
            .unwrap_or_default()
            .into_iter()
            .filter_map(|i| i.name)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        Ok(Recipe {
            id,
            title,
            image_url,
            source_url,
            ingredients,
        })
    }
}

pub struct SpoonacularClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl SpoonacularClient {
    pub fn from_config(config: &RecipeSourceConfig) -> Result<Self, ChefError> {
        if config.api_key.trim().is_empty() {
            return Err(ChefError::Config("Spoonacular API key is required".to_string()));
        }
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChefError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        route: &str,
        params: &[(&str, String)]
    ) -> Result<T, ChefError> {
        let url = format!("{}{}", self.base_url, route);
        debug!("Spoonacular GET {} {:?}", url, params);

        let resp = self.http
            .get(&url)
            .query(params)
            .query(&[("apiKey", self.api_key.as_str())])
            .send().await
            .map_err(|e| {
                error!("Spoonacular request to {} failed: {}", route, e);
                ChefError::from(e)
            })?;

        let body = check_status(route, resp).await?.text().await?;
        serde_json::from_str::<T>(&body).map_err(|e| {
            warn!("Malformed Spoonacular payload from {}: {}", route, e);
            ChefError::NotFound(format!("malformed response from {}", route))
        })
    }
}

async fn check_status(route: &str, resp: Response) -> Result<Response, ChefError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let detail = resp.text().await.unwrap_or_default();
    error!("Spoonacular {} returned {}: {}", route, status, detail);
    Err(ChefError::Upstream(format!("Spoonacular returned HTTP {} for {}", status.as_u16(), route)))
}

#[async_trait]
impl RecipeSource for SpoonacularClient {
    async fn search(
        &self,
        ingredients: &str,
        category: MealCategory,
        limit: usize
    ) -> Result<Vec<RecipeSummary>, ChefError> {
        let params = [
            ("query", category.as_str().to_string()),
            ("includeIngredients", ingredients.trim().to_string()),
            ("number", limit.to_string()),
        ];
        let resp: SearchResponse = self.get_json("/recipes/complexSearch", &params).await?;

        let summaries = resp.results
            .into_iter()
            .filter_map(|hit| {
                match hit.id {
                    Some(id) =>
                        Some(RecipeSummary {
                            id,
                            title: hit.title.unwrap_or_default(),
                            image_url: hit.image,
                        }),
                    None => {
                        warn!("Skipping search hit without id");
                        None
                    }
                }
            })
            .collect();
        Ok(summaries)
    }

    async fn fetch_details(&self, id: i64) -> Result<Recipe, ChefError> {
        let route = format!("/recipes/{}/information", id);
        let info: RecipeInformation = self.get_json(&route, &[]).await?;
        Recipe::try_from(info).map_err(|e| {
            warn!("Discarding recipe {}: {}", id, e);
            e
        })
    }

    async fn fetch_random(&self) -> Result<Recipe, ChefError> {
        let resp: RandomResponse = self.get_json(
            "/recipes/random",
            &[("number", "1".to_string())]
        ).await?;
        let info = resp.recipes
            .into_iter()
            .next()
            .ok_or_else(|| ChefError::NotFound("random endpoint returned no recipe".to_string()))?;
        Recipe::try_from(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn info(json: &str) -> RecipeInformation {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn complete_payload_converts() {
        let recipe = Recipe::try_from(
            info(
                r#"{"id":7,"title":"Shakshuka","image":"img.jpg","sourceUrl":"http://x",
                    "extendedIngredients":[{"name":"Egg"},{"name":" tomato "},{"name":null}]}"#
            )
        ).unwrap();
        assert_eq!(recipe.id, 7);
        assert_eq!(recipe.ingredients, vec!["Egg".to_string(), "tomato".to_string()]);
    }

    #[test]
    fn missing_source_url_is_not_found() {
        let err = Recipe::try_from(info(r#"{"id":7,"title":"Shakshuka","image":"img.jpg"}"#))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn missing_ingredients_yield_empty_list() {
        let recipe = Recipe::try_from(
            info(r#"{"id":7,"title":"Toast","image":"i","sourceUrl":"s"}"#)
        ).unwrap();
        assert!(recipe.ingredients.is_empty());
    }

    #[test]
    fn empty_key_is_config_error() {
        let config = RecipeSourceConfig {
            api_key: "  ".into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(1),
        };
        assert!(matches!(SpoonacularClient::from_config(&config), Err(ChefError::Config(_))));
    }
}
