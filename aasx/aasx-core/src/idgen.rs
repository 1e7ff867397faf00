//! Template-based identifier generation.
//!
//! Templates are plain strings in which `D` is replaced by a random decimal
//! digit, `X` by a random uppercase hex digit and `{uuid}` by a fresh UUID v4.
//! All other characters are copied through.

use crate::model::IdentifiableKind;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

const UUID_PLACEHOLDER: &str = "{uuid}";
const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Id templates per identifiable kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdTemplates {
    pub shell: String,
    pub submodel: String,
    pub concept_description: String,
    /// Template for global asset ids of newly created shells
    pub asset: String,
    /// Generation attempts before falling back to a UUID suffix
    pub max_attempts: u32,
}

impl Default for IdTemplates {
    fn default() -> Self {
        Self {
            shell: "https://example.com/ids/aas/DDDD_DDDD_DDDD_DDDD".to_string(),
            submodel: "https://example.com/ids/sm/DDDD_DDDD_DDDD_DDDD".to_string(),
            concept_description: "https://example.com/ids/cd/DDDD_DDDD_DDDD_DDDD".to_string(),
            asset: "https://example.com/ids/asset/DDDD_DDDD_DDDD_DDDD".to_string(),
            max_attempts: 16,
        }
    }
}

impl IdTemplates {
    pub fn template_for(&self, kind: IdentifiableKind) -> &str {
        match kind {
            IdentifiableKind::Shell => &self.shell,
            IdentifiableKind::Submodel => &self.submodel,
            IdentifiableKind::ConceptDescription => &self.concept_description,
        }
    }

    /// Fresh id of `kind` for which `exists` is false.
    pub fn generate<F>(&self, kind: IdentifiableKind, exists: F) -> String
    where
        F: FnMut(&str) -> bool,
    {
        generate_unique_id(self.template_for(kind), self.max_attempts, exists)
    }
}

/// Expand a template once.
pub fn generate_id(template: &str) -> String {
    let mut rng = rand::rng();
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;

    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix(UUID_PLACEHOLDER) {
            out.push_str(&Uuid::new_v4().to_string());
            rest = tail;
            continue;
        }
        let mut chars = rest.chars();
        let Some(c) = chars.next() else { break };
        match c {
            'D' => out.push(char::from(b'0' + rng.random_range(0..10u8))),
            'X' => out.push(char::from(HEX_DIGITS[rng.random_range(0..16usize)])),
            other => out.push(other),
        }
        rest = chars.as_str();
    }
    out
}

/// Expand `template` until `exists` rejects no candidate.
///
/// After `max_attempts` collisions a UUID suffix is appended, repeating
/// until the result is free.
pub fn generate_unique_id<F>(template: &str, max_attempts: u32, mut exists: F) -> String
where
    F: FnMut(&str) -> bool,
{
    for attempt in 0..max_attempts {
        let candidate = generate_id(template);
        if !exists(&candidate) {
            debug!("Generated id {} after {} attempts", candidate, attempt + 1);
            return candidate;
        }
    }

    warn!(
        "Template {} collided {} times, appending uuid suffix",
        template, max_attempts
    );
    loop {
        let candidate = format!("{}-{}", generate_id(template), Uuid::new_v4());
        if !exists(&candidate) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_expanded() {
        let id = generate_id("urn:DD-XX:{uuid}");
        let (prefix, uuid) = id.split_at("urn:00-00:".len());
        assert!(prefix.starts_with("urn:"));
        assert!(prefix[4..6].chars().all(|c| c.is_ascii_digit()));
        assert!(
            prefix[7..9]
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        );
        assert!(Uuid::parse_str(uuid).is_ok());
    }

    #[test]
    fn test_literal_template_falls_back_to_suffix() {
        let id = generate_unique_id("fixed", 3, |candidate| candidate == "fixed");
        assert!(id.starts_with("fixed-"));
        assert_ne!(id, "fixed");
    }

    #[test]
    fn test_zero_attempts_still_yields_free_id() {
        let id = generate_unique_id("DDD", 0, |_| false);
        assert!(id.starts_with(|c: char| c.is_ascii_digit()));
        assert!(id.len() > 3);
    }

    #[test]
    fn test_template_for_kind() {
        let templates = IdTemplates::default();
        assert!(templates.template_for(IdentifiableKind::Submodel).contains("/sm/"));
        let id = templates.generate(IdentifiableKind::Shell, |_| false);
        assert!(id.starts_with("https://example.com/ids/aas/"));
    }

    proptest::proptest! {
        #[test]
        fn prop_expansion_keeps_template_shape(template in "[a-z:/_DX-]{0,32}") {
            let id = generate_id(&template);
            proptest::prop_assert_eq!(id.len(), template.len());
            for (t, c) in template.chars().zip(id.chars()) {
                match t {
                    'D' => proptest::prop_assert!(c.is_ascii_digit()),
                    'X' => proptest::prop_assert!(c.is_ascii_hexdigit() && !c.is_ascii_lowercase()),
                    _ => proptest::prop_assert_eq!(c, t),
                }
            }
        }
    }
}
