//! Request-shape checks applied by the HTTP layer before the engine runs.

use reqwest::Url;

use super::model::{FieldChanges, NewSuperhero, Patch, SuperheroPatch};
use crate::error::{Result, ServerError};

/// Longest accepted nickname / real name
pub const MAX_NAME_LEN: usize = 30;

pub fn validate_new(hero: &NewSuperhero) -> Result<()> {
    check_name("nickname", &hero.nickname)?;
    check_name("realName", &hero.real_name)?;
    check_not_blank("originDescription", &hero.origin_description)?;
    check_superpowers(&hero.superpowers)?;
    check_not_blank("catchPhrase", &hero.catch_phrase)?;
    if let Some(images) = &hero.images {
        check_image_urls(images)?;
    }
    Ok(())
}

pub fn validate_patch(patch: &SuperheroPatch) -> Result<()> {
    let FieldChanges {
        nickname,
        real_name,
        origin_description,
        superpowers,
        catch_phrase,
    } = &patch.fields;

    if let Patch::Present(nickname) = nickname {
        check_name("nickname", nickname)?;
    }
    if let Patch::Present(real_name) = real_name {
        check_name("realName", real_name)?;
    }
    if let Patch::Present(origin) = origin_description {
        check_not_blank("originDescription", origin)?;
    }
    if let Patch::Present(powers) = superpowers {
        check_superpowers(powers)?;
    }
    if let Patch::Present(catch_phrase) = catch_phrase {
        check_not_blank("catchPhrase", catch_phrase)?;
    }
    if let Patch::Present(images) = &patch.images {
        check_image_urls(images)?;
    }
    Ok(())
}

fn check_not_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ServerError::Validation(format!("{} should not be empty", field)));
    }
    Ok(())
}

fn check_name(field: &str, value: &str) -> Result<()> {
    check_not_blank(field, value)?;
    if value.chars().count() > MAX_NAME_LEN {
        return Err(ServerError::Validation(format!(
            "{} must be shorter than or equal to {} characters",
            field, MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn check_superpowers(powers: &[String]) -> Result<()> {
    if powers.is_empty() {
        return Err(ServerError::Validation("superpowers should not be empty".to_string()));
    }
    if powers.iter().any(|p| p.trim().is_empty()) {
        return Err(ServerError::Validation(
            "each value in superpowers should not be empty".to_string(),
        ));
    }
    Ok(())
}

fn check_image_urls(urls: &[String]) -> Result<()> {
    match urls.iter().find(|url| !is_absolute_http_url(url)) {
        Some(bad) => Err(ServerError::Validation(format!(
            "each value in images must be a URL address (got {:?})",
            bad
        ))),
        None => Ok(()),
    }
}

fn is_absolute_http_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().map_or(false, |h| !h.is_empty())
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> NewSuperhero {
        NewSuperhero {
            nickname: "Superman".into(),
            real_name: "Clark Kent".into(),
            origin_description: "He came from Krypton.".into(),
            superpowers: vec!["Flight".into(), "Super Strength".into()],
            catch_phrase: "Up, up and away!".into(),
            images: Some(vec!["http://example.com/superman.jpg".into()]),
        }
    }

    fn message(result: Result<()>) -> String {
        match result {
            Err(ServerError::Validation(msg)) => msg,
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_hero_passes() {
        validate_new(&valid()).unwrap();

        let mut no_images = valid();
        no_images.images = None;
        validate_new(&no_images).unwrap();
    }

    #[test]
    fn test_create_requires_superpowers() {
        let mut hero = valid();
        hero.superpowers.clear();
        assert_eq!(message(validate_new(&hero)), "superpowers should not be empty");

        hero.superpowers = vec!["  ".into()];
        assert!(message(validate_new(&hero)).contains("superpowers"));
    }

    #[test]
    fn test_name_rules() {
        let mut hero = valid();
        hero.nickname = "   ".into();
        assert_eq!(message(validate_new(&hero)), "nickname should not be empty");

        let mut hero = valid();
        hero.real_name = "x".repeat(31);
        assert!(message(validate_new(&hero)).contains("30 characters"));

        // Length counts characters, not bytes
        let mut hero = valid();
        hero.nickname = "é".repeat(30);
        validate_new(&hero).unwrap();
    }

    #[test]
    fn test_image_urls_must_be_absolute_http() {
        for bad in ["not a url", "/relative.png", "ftp://example.com/a.png", "mailto:a@b.c"] {
            let mut hero = valid();
            hero.images = Some(vec![bad.into()]);
            assert!(message(validate_new(&hero)).contains("URL"), "{}", bad);
        }
    }

    #[test]
    fn test_patch_checks_only_present_fields() {
        validate_patch(&SuperheroPatch::default()).unwrap();

        let patch = SuperheroPatch {
            fields: FieldChanges {
                superpowers: Patch::Present(vec![]),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(message(validate_patch(&patch)), "superpowers should not be empty");

        let patch = SuperheroPatch {
            images: Patch::Present(vec![]),
            ..Default::default()
        };
        validate_patch(&patch).unwrap();

        let patch = SuperheroPatch {
            images: Patch::Present(vec!["nope".into()]),
            ..Default::default()
        };
        assert!(message(validate_patch(&patch)).contains("URL"));
    }
}
