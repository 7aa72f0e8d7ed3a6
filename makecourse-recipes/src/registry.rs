//! Registry construction from the `recipes` section of the config.

use makecourse_core::{Config, ConfigError, RecipeRegistry};

use crate::{Lecture, Sheet};

/// Map each configured tag to its recipe kind.
///
/// Kinds: `lecture` (slides, handout, screencast), `sheet` (student and
/// teacher exercise sheets) and `fragment` (node without documents of its
/// own). Anything else is a configuration error.
pub fn registry_from_config(config: &Config) -> Result<RecipeRegistry, ConfigError> {
    let mut registry = RecipeRegistry::new();
    let mut entries: Vec<(&String, &String)> = config.recipes.iter().collect();
    entries.sort();
    for (tag, kind) in entries {
        match kind.as_str() {
            "lecture" => registry.register(tag.clone(), Box::new(Lecture)),
            "sheet" => registry.register(tag.clone(), Box::new(Sheet)),
            "fragment" => registry.register_fragment(tag.clone()),
            _ => {
                return Err(ConfigError::UnknownRecipe {
                    tag: tag.clone(),
                    kind: kind.clone(),
                })
            }
        }
        tracing::debug!(%tag, %kind, "registered recipe");
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(recipes: &[(&str, &str)]) -> Config {
        let mut config = Config::default();
        config.recipes = recipes
            .iter()
            .map(|(t, k)| (t.to_string(), k.to_string()))
            .collect();
        config
    }

    #[test]
    fn registers_all_configured_kinds() {
        let registry = registry_from_config(&config(&[
            ("CM", "lecture"),
            ("TP", "sheet"),
            ("Exercice", "fragment"),
        ]))
        .unwrap();

        assert!(registry.recipe("CM").is_some());
        assert!(registry.recipe("TP").is_some());
        assert!(registry.is_unit_type("Exercice"));
        assert!(registry.recipe("Exercice").is_none());
        assert!(!registry.is_unit_type("DS"));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = registry_from_config(&config(&[("DS", "exam")])).unwrap_err();
        match err {
            ConfigError::UnknownRecipe { tag, kind } => {
                assert_eq!(tag, "DS");
                assert_eq!(kind, "exam");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
