//! Keyword-based dietary filtering over recipe ingredient names.
//!
//! Matching is plain case-insensitive substring search. It is a heuristic:
//! "ham" also rejects "graham crackers", and an ingredient list the upstream
//! never sent is treated as a rejection, not a pass.

use futures::stream::{ self, StreamExt };
use log::{ debug, info, warn };
use serde::{ Deserialize, Serialize };
use std::collections::BTreeSet;

use crate::error::ChefError;
use crate::models::recipe::Recipe;
use crate::recipes::RecipeSource;

pub const HALAL_FORBIDDEN_TERMS: &[&str] = &[
    "pork",
    "bacon",
    "ham",
    "lard",
    "gelatin",
    "prosciutto",
    "pancetta",
    "chorizo",
    "salami",
    "pepperoni",
    "wine",
    "beer",
    "rum",
    "brandy",
    "liqueur",
    "whiskey",
    "vodka",
];

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DietaryPolicy {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub forbidden_terms: BTreeSet<String>,
    #[serde(default)]
    pub required_any_of: BTreeSet<String>,
}

impl DietaryPolicy {
    pub fn new<I, S>(name: &str, forbidden: I) -> Self where I: IntoIterator<Item = S>, S: AsRef<str> {
        Self {
            name: name.to_string(),
            forbidden_terms: normalize_terms(forbidden),
            required_any_of: BTreeSet::new(),
        }
    }

    pub fn halal() -> Self {
        Self::new("halal", HALAL_FORBIDDEN_TERMS)
    }

    /// No restrictions beyond requiring ingredient data.
    pub fn unrestricted() -> Self {
        Self::new::<_, &str>("none", [])
    }

    pub fn with_required<I, S>(mut self, required: I) -> Self
        where I: IntoIterator<Item = S>, S: AsRef<str>
    {
        self.required_any_of.extend(normalize_terms(required));
        self
    }

    /// Policy built from the user's comma-separated pantry list: a recipe must
    /// use at least one thing the user actually has. Applied as its own pass
    /// after the configured profile, never merged into it.
    pub fn pantry(ingredients: &str) -> Self {
        Self::new::<_, &str>("pantry", []).with_required(ingredients.split(','))
    }

    /// Lower-cases and trims terms. Called after deserializing a policy.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name,
            forbidden_terms: normalize_terms(self.forbidden_terms),
            required_any_of: normalize_terms(self.required_any_of),
        }
    }
}

fn normalize_terms<I, S>(terms: I) -> BTreeSet<String> where I: IntoIterator<Item = S>, S: AsRef<str> {
    terms
        .into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Compliant,
    Forbidden {
        term: String,
        ingredient: String,
    },
    MissingRequired,
    NoIngredientData,
}

impl Verdict {
    pub fn is_compliant(&self) -> bool {
        matches!(self, Verdict::Compliant)
    }
}

pub fn check(recipe: &Recipe, policy: &DietaryPolicy) -> Verdict {
    if recipe.ingredients.is_empty() {
        return Verdict::NoIngredientData;
    }
    let names: Vec<String> = recipe.ingredients
        .iter()
        .map(|n| n.to_lowercase())
        .collect();

    for term in &policy.forbidden_terms {
        let term = term.to_lowercase();
        if let Some(hit) = names.iter().find(|n| n.contains(term.as_str())) {
            return Verdict::Forbidden {
                term,
                ingredient: hit.clone(),
            };
        }
    }

    if !policy.required_any_of.is_empty() {
        let found = policy.required_any_of.iter().any(|req| {
            let req = req.to_lowercase();
            names.iter().any(|n| n.contains(req.as_str()))
        });
        if !found {
            return Verdict::MissingRequired;
        }
    }

    Verdict::Compliant
}

pub fn is_compliant(recipe: &Recipe, policy: &DietaryPolicy) -> bool {
    match check(recipe, policy) {
        Verdict::Compliant => true,
        Verdict::NoIngredientData => {
            warn!(
                "Recipe {} ('{}') has no ingredient data; rejecting under '{}' policy",
                recipe.id,
                recipe.title,
                policy.name
            );
            false
        }
        Verdict::Forbidden { term, ingredient } => {
            debug!(
                "Recipe {} rejected: ingredient '{}' matches forbidden term '{}'",
                recipe.id,
                ingredient,
                term
            );
            false
        }
        Verdict::MissingRequired => {
            debug!("Recipe {} rejected: none of the requested ingredients present", recipe.id);
            false
        }
    }
}

pub fn filter_compliant(recipes: Vec<Recipe>, policy: &DietaryPolicy) -> Vec<Recipe> {
    let total = recipes.len();
    let kept: Vec<Recipe> = recipes
        .into_iter()
        .filter(|r| is_compliant(r, policy))
        .collect();
    info!("Dietary filter '{}' kept {}/{} recipes", policy.name, kept.len(), total);
    kept
}

/// Fetches full details for each id, at most `concurrency` requests in
/// flight. Results keep the order of `ids`; ids whose fetch fails are skipped.
pub async fn fetch_all_details(
    source: &dyn RecipeSource,
    ids: &[i64],
    concurrency: usize
) -> Vec<Recipe> {
    let results: Vec<(i64, Result<Recipe, ChefError>)> = stream
        ::iter(ids.iter().copied())
        .map(|id| async move { (id, source.fetch_details(id).await) })
        .buffered(concurrency.max(1))
        .collect().await;

    results
        .into_iter()
        .filter_map(|(id, res)| {
            match res {
                Ok(recipe) => Some(recipe),
                Err(e) => {
                    warn!("Skipping recipe {}: {}", id, e);
                    None
                }
            }
        })
        .collect()
}

pub async fn pick_random_compliant(
    source: &dyn RecipeSource,
    policy: &DietaryPolicy,
    max_attempts: usize
) -> Result<Recipe, ChefError> {
    for attempt in 1..=max_attempts {
        match source.fetch_random().await {
            Ok(recipe) => {
                if is_compliant(&recipe, policy) {
                    info!("Random pick {} accepted on attempt {}", recipe.id, attempt);
                    return Ok(recipe);
                }
            }
            Err(ChefError::NotFound(reason)) => {
                debug!("Random attempt {} returned nothing usable: {}", attempt, reason);
            }
            Err(e) => {
                return Err(e);
            }
        }
    }
    Err(
        ChefError::NotFound(
            format!("no {} recipe found after {} attempts", policy.name, max_attempts)
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::recipe::{ MealCategory, RecipeSummary };
    use async_trait::async_trait;
    use std::sync::atomic::{ AtomicUsize, Ordering };

    fn recipe(id: i64, ingredients: &[&str]) -> Recipe {
        Recipe {
            id,
            title: format!("recipe {}", id),
            image_url: String::new(),
            source_url: String::new(),
            ingredients: ingredients
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    #[test]
    fn bacon_bits_fail_pork_and_bacon_policy() {
        let policy = DietaryPolicy::new("halal", ["pork", "bacon"]);
        assert!(!is_compliant(&recipe(1, &["chicken breast", "bacon bits"]), &policy));
    }

    #[test]
    fn chicken_and_tomato_pass_pork_policy() {
        let policy = DietaryPolicy::new("halal", ["pork"]);
        assert!(is_compliant(&recipe(1, &["chicken", "tomato"]), &policy));
    }

    #[test]
    fn forbidden_match_ignores_case() {
        let policy = DietaryPolicy::new("halal", ["Pork"]);
        let verdict = check(&recipe(1, &["Ground PORK Shoulder"]), &policy);
        assert_eq!(verdict, Verdict::Forbidden {
            term: "pork".into(),
            ingredient: "ground pork shoulder".into(),
        });
    }

    #[test]
    fn empty_ingredients_never_pass() {
        assert_eq!(check(&recipe(1, &[]), &DietaryPolicy::unrestricted()), Verdict::NoIngredientData);
        assert!(!is_compliant(&recipe(1, &[]), &DietaryPolicy::halal()));
    }

    #[test]
    fn required_terms_need_one_match() {
        let policy = DietaryPolicy::pantry("Chicken, rice ,");
        assert_eq!(policy.required_any_of.len(), 2);
        assert!(policy.forbidden_terms.is_empty());
        assert!(is_compliant(&recipe(1, &["brown rice", "onion"]), &policy));
        assert_eq!(check(&recipe(2, &["beef", "onion"]), &policy), Verdict::MissingRequired);
    }

    #[test]
    fn forbidden_wins_over_required() {
        let policy = DietaryPolicy::new("halal", ["pork"]).with_required(["pork"]);
        assert!(!is_compliant(&recipe(1, &["pork belly"]), &policy));
    }

    #[test]
    fn filter_preserves_order_of_survivors() {
        let policy = DietaryPolicy::new("halal", ["pork"]);
        let input = vec![
            recipe(1, &["lamb"]),
            recipe(2, &["pork chop"]),
            recipe(3, &[]),
            recipe(4, &["rice"]),
            recipe(5, &["pulled pork"]),
            recipe(6, &["lentils"])
        ];
        let ids: Vec<i64> = filter_compliant(input, &policy)
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 4, 6]);
    }

    #[test]
    fn normalized_policy_lowercases_terms() {
        let raw: DietaryPolicy = serde_json
            ::from_str(r#"{"name":"x","forbidden_terms":[" PORK ",""]}"#)
            .unwrap();
        let policy = raw.normalized();
        assert_eq!(policy.forbidden_terms.into_iter().collect::<Vec<_>>(), vec!["pork".to_string()]);
    }

    struct CountingSource {
        calls: AtomicUsize,
        random: Vec<Result<Recipe, ChefError>>,
    }

    impl CountingSource {
        fn new(random: Vec<Result<Recipe, ChefError>>) -> Self {
            Self { calls: AtomicUsize::new(0), random }
        }
    }

    #[async_trait]
    impl RecipeSource for CountingSource {
        async fn search(
            &self,
            _ingredients: &str,
            _category: MealCategory,
            _limit: usize
        ) -> Result<Vec<RecipeSummary>, ChefError> {
            Ok(Vec::new())
        }

        async fn fetch_details(&self, id: i64) -> Result<Recipe, ChefError> {
            if id % 2 == 0 {
                Err(ChefError::Upstream(format!("boom {}", id)))
            } else {
                Ok(recipe(id, &["rice"]))
            }
        }

        async fn fetch_random(&self) -> Result<Recipe, ChefError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.random[n % self.random.len()].clone()
        }
    }

    #[tokio::test]
    async fn random_pick_gives_up_after_max_attempts() {
        let source = CountingSource::new(vec![Ok(recipe(1, &["bacon"]))]);
        let policy = DietaryPolicy::halal();
        let result = pick_random_compliant(&source, &policy, 5).await;
        assert!(matches!(result, Err(ChefError::NotFound(_))));
        assert_eq!(source.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn random_pick_skips_until_compliant() {
        let source = CountingSource::new(
            vec![
                Ok(recipe(1, &["ham"])),
                Err(ChefError::NotFound("empty".into())),
                Ok(recipe(3, &["chickpeas"]))
            ]
        );
        let picked = pick_random_compliant(&source, &DietaryPolicy::halal(), 10).await.unwrap();
        assert_eq!(picked.id, 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn random_pick_propagates_upstream_errors() {
        let source = CountingSource::new(vec![Err(ChefError::Upstream("down".into()))]);
        let result = pick_random_compliant(&source, &DietaryPolicy::halal(), 10).await;
        assert_eq!(result, Err(ChefError::Upstream("down".into())));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_is_not_found_without_calls() {
        let source = CountingSource::new(vec![Ok(recipe(1, &["rice"]))]);
        let result = pick_random_compliant(&source, &DietaryPolicy::halal(), 0).await;
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn detail_fetch_skips_failures_and_keeps_order() {
        let source = CountingSource::new(vec![Ok(recipe(1, &["rice"]))]);
        let ids = [9, 2, 7, 4, 1, 3];
        for concurrency in [1, 3, 16] {
            let fetched: Vec<i64> = fetch_all_details(&source, &ids, concurrency).await
                .iter()
                .map(|r| r.id)
                .collect();
            assert_eq!(fetched, vec![9, 7, 1, 3]);
        }
    }
}
