//! Image delta: what to add and what to remove so a hero's images match the desired url list.

use std::collections::HashSet;

use super::model::{ImageId, StoredImage};

/// Add/remove sets between the persisted images and the desired urls.
///
/// Urls present on both sides produce nothing, so their image identity survives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageDelta {
    /// Urls to attach, in first-occurrence order of the desired list
    pub to_add: Vec<String>,
    /// Identities of images whose url is no longer desired
    pub to_remove: Vec<ImageId>,
}

impl ImageDelta {
    /// Compute the delta. `desired == None` means "leave images alone" and
    /// always yields an empty delta; `Some(&[])` removes everything.
    ///
    /// Urls are compared as exact, case-sensitive strings.
    pub fn compute(current: &[StoredImage], desired: Option<&[String]>) -> Self {
        let Some(desired) = desired else {
            return Self::default();
        };

        let current_urls: HashSet<&str> = current.iter().map(|img| img.url.as_str()).collect();
        let desired_urls: HashSet<&str> = desired.iter().map(String::as_str).collect();

        let mut seen = HashSet::new();
        let to_add = desired
            .iter()
            .filter(|url| !current_urls.contains(url.as_str()))
            .filter(|url| seen.insert(url.as_str()))
            .cloned()
            .collect();

        let to_remove = current
            .iter()
            .filter(|img| !desired_urls.contains(img.url.as_str()))
            .map(|img| img.id)
            .collect();

        Self { to_add, to_remove }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Drop repeated urls, keeping the first occurrence.
pub fn dedup_urls(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter().filter(|url| seen.insert(url.clone())).collect()
}
