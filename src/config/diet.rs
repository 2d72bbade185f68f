use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

use crate::dietary::DietaryPolicy;
use crate::error::ChefError;

#[derive(Deserialize, Debug, Default)]
pub struct DietProfiles {
    #[serde(default)]
    pub profiles: HashMap<String, DietaryPolicy>,
}

impl DietProfiles {
    pub fn builtin() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert("halal".to_string(), DietaryPolicy::halal());
        profiles.insert("none".to_string(), DietaryPolicy::unrestricted());
        Self { profiles }
    }

    /// File entries override built-ins of the same name.
    pub fn merge(mut self, other: DietProfiles) -> Self {
        for (name, policy) in other.profiles {
            let policy = DietaryPolicy { name: name.clone(), ..policy }.normalized();
            self.profiles.insert(name.to_lowercase(), policy);
        }
        self
    }

    pub fn get(&self, name: &str) -> Result<DietaryPolicy, ChefError> {
        self.profiles
            .get(&name.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| {
                let mut known: Vec<&str> = self.profiles
                    .keys()
                    .map(String::as_str)
                    .collect();
                known.sort();
                ChefError::Config(
                    format!("Unknown dietary profile '{}' (known: {})", name, known.join(", "))
                )
            })
    }
}

pub fn load_profiles(path: &str) -> Result<DietProfiles, ChefError> {
    let file_content = fs
        ::read_to_string(path)
        .map_err(|e| ChefError::Config(format!("Failed to read diet profiles file '{}': {}", path, e)))?;
    let profiles: DietProfiles = serde_json
        ::from_str(&file_content)
        .map_err(|e| ChefError::Config(format!("Failed to parse diet profiles file '{}': {}", path, e)))?;
    info!("Loaded {} dietary profile(s) from {}", profiles.profiles.len(), path);
    Ok(profiles)
}

pub fn resolve_policy(profile: &str, profiles_path: Option<&str>) -> Result<DietaryPolicy, ChefError> {
    let mut profiles = DietProfiles::builtin();
    if let Some(path) = profiles_path {
        profiles = profiles.merge(load_profiles(path)?);
    }
    profiles.get(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_profiles_resolve() {
        let halal = resolve_policy("Halal", None).unwrap();
        assert!(halal.forbidden_terms.contains("pork"));
        assert!(resolve_policy("none", None).unwrap().forbidden_terms.is_empty());
    }

    #[test]
    fn unknown_profile_is_config_error() {
        let err = resolve_policy("keto", None).unwrap_err();
        assert!(matches!(err, ChefError::Config(ref msg) if msg.contains("halal")));
    }

    #[test]
    fn file_profiles_extend_and_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"profiles": {{
                "Vegetarian": {{"forbidden_terms": ["Beef", "chicken", "fish"]}},
                "halal": {{"forbidden_terms": ["pork"], "required_any_of": ["rice"]}}
            }}}}"#
        ).unwrap();
        let path = file.path().to_str().unwrap();

        let veg = resolve_policy("vegetarian", Some(path)).unwrap();
        assert_eq!(veg.name, "Vegetarian");
        assert!(veg.forbidden_terms.contains("beef"));

        let halal = resolve_policy("halal", Some(path)).unwrap();
        assert_eq!(halal.forbidden_terms.len(), 1);
        assert!(halal.required_any_of.contains("rice"));
    }

    #[test]
    fn missing_profiles_file_is_config_error() {
        let err = resolve_policy("halal", Some("/nonexistent/profiles.json")).unwrap_err();
        assert!(matches!(err, ChefError::Config(_)));
    }
}
