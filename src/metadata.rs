//! Frontmatter normalization.
//!
//! Brings a document's metadata into the canonical state the site expects and
//! collects the aliases the document claims in the redirect table. Each rule
//! is a small function over the mapping; [`normalize`] composes them in a
//! fixed order and reports whether anything changed, which decides if the
//! source file gets rewritten.
//!
//! ## Rules
//!
//! 1. Remove configured "unimportant" keys.
//! 2. Remove `visibility: published` (the default; other values stay).
//! 3. Read `draft` (never written).
//! 4. Collect existing `aliases`. A scalar is rewritten as a one-item list.
//! 5. Reconcile `slug` with the slug derived from the path. A divergent
//!    stored slug is kept as an alias *before* it is overwritten, so links to
//!    the old URL keep resolving.
//! 6. Clean tags: spaces become dashes, `#` is dropped.
//! 7. Point `cover_img` / `cover.image` at the converted `.jpeg` instead of a
//!    `.heic` original.
//!
//! ## Malformed input
//!
//! Nothing here fails. Non-string scalars (`slug: 2024`) are stringified,
//! structured values where a scalar was expected are treated as absent. A
//! structured `aliases` value is never overwritten.

use crate::naming::converted_image_name;
use crate::stats::Stats;
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

const SLUG: &str = "slug";
const ALIASES: &str = "aliases";
const TAGS: &str = "tags";
const DRAFT: &str = "draft";
const VISIBILITY: &str = "visibility";
const VISIBILITY_DEFAULT: &str = "published";
const COVER_IMG: &str = "cover_img";
const COVER: &str = "cover";
const COVER_IMAGE: &str = "image";

/// Metadata after normalization, plus what the pipeline needs from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub metadata: Mapping,
    /// Aliases to offer to the redirect table, deduplicated, in claim order.
    pub aliases: Vec<String>,
    pub draft: bool,
    /// Whether `metadata` differs from the input.
    pub changed: bool,
}

/// What slug reconciliation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugOutcome {
    /// Root document; no slug is derived.
    Root,
    /// No usable slug was stored; the derived one was written.
    Missing,
    /// A different slug was stored; it was kept as an alias and replaced.
    Divergent { old: String },
    /// The stored slug already matched.
    Matching,
    /// The stored slug matched only as text (`slug: 2024`); it was rewritten
    /// as a string.
    Retyped,
}

/// String form of a YAML scalar. `None` for null, sequences and mappings.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Remove every key listed in `keys`. Returns the number removed.
pub fn strip_unimportant_keys(metadata: &mut Mapping, keys: &[String]) -> u32 {
    let mut removed = 0;
    for key in keys {
        // shift_remove keeps the order of the remaining keys
        if let Some(value) = metadata.shift_remove(key.as_str()) {
            debug!(key = %key, value = ?value, "removing unimportant key");
            removed += 1;
        }
    }
    removed
}

/// Remove `visibility` when it holds the no-op value `published`.
pub fn strip_published_visibility(metadata: &mut Mapping) -> bool {
    let is_default = metadata.get(VISIBILITY).and_then(Value::as_str) == Some(VISIBILITY_DEFAULT);
    if is_default {
        metadata.shift_remove(VISIBILITY);
        debug!("removing visibility: published");
    }
    is_default
}

/// Whether the document is a draft. Absent or unreadable means `false`.
pub fn read_draft(metadata: &Mapping) -> bool {
    match metadata.get(DRAFT) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Collect the stored aliases.
///
/// Returns the aliases as strings and whether the mapping was modified (a
/// scalar `aliases` value is rewritten as a one-item sequence).
pub fn collect_aliases(metadata: &mut Mapping) -> (Vec<String>, bool) {
    let Some(value) = metadata.get_mut(ALIASES) else {
        return (Vec::new(), false);
    };
    match value {
        Value::Sequence(items) => (items.iter().filter_map(scalar_to_string).collect(), false),
        Value::Null => (Vec::new(), false),
        other => match scalar_to_string(other) {
            Some(alias) => {
                debug!(alias = %alias, "coercing scalar aliases to a list");
                *other = Value::Sequence(vec![Value::String(alias.clone())]);
                (vec![alias], true)
            }
            None => (Vec::new(), false),
        },
    }
}

/// Append `alias` to the persisted `aliases` list unless already present.
///
/// Returns `true` if the mapping changed.
fn persist_alias(metadata: &mut Mapping, alias: &str) -> bool {
    match metadata.get_mut(ALIASES) {
        Some(Value::Sequence(items)) => {
            if items
                .iter()
                .any(|item| scalar_to_string(item).as_deref() == Some(alias))
            {
                return false;
            }
            items.push(Value::String(alias.to_string()));
            true
        }
        Some(other) if scalar_to_string(other).is_none() && !other.is_null() => {
            warn!(value = ?other, alias = %alias, "aliases is not a list, leaving it alone");
            false
        }
        Some(other) => {
            let mut items = Vec::new();
            if let Some(existing) = scalar_to_string(other) {
                if existing == alias {
                    return false;
                }
                items.push(Value::String(existing));
            }
            items.push(Value::String(alias.to_string()));
            *other = Value::Sequence(items);
            true
        }
        None => {
            metadata.insert(
                Value::String(ALIASES.to_string()),
                Value::Sequence(vec![Value::String(alias.to_string())]),
            );
            true
        }
    }
}

/// Make `slug` equal to the slug derived from the path.
///
/// A divergent stored slug is pushed onto `aliases` and into the persisted
/// `aliases` list *before* being overwritten.
pub fn reconcile_slug(
    metadata: &mut Mapping,
    main_slug: Option<&str>,
    aliases: &mut Vec<String>,
) -> SlugOutcome {
    let Some(main_slug) = main_slug else {
        return SlugOutcome::Root;
    };

    let stored = metadata.get(SLUG).and_then(scalar_to_string);
    let outcome = match stored {
        None => SlugOutcome::Missing,
        Some(old) if old == main_slug => {
            if matches!(metadata.get(SLUG), Some(Value::String(_))) {
                return SlugOutcome::Matching;
            }
            SlugOutcome::Retyped
        }
        Some(old) => {
            aliases.push(old.clone());
            persist_alias(metadata, &old);
            SlugOutcome::Divergent { old }
        }
    };

    // insert() on an existing key keeps its position
    metadata.insert(
        Value::String(SLUG.to_string()),
        Value::String(main_slug.to_string()),
    );
    outcome
}

/// Clean a single tag: trim, spaces to dashes, drop `#`.
pub fn clean_tag(tag: &str) -> String {
    tag.trim().replace(' ', "-").replace('#', "")
}

/// Clean every string tag in place. Returns the number of tags changed.
pub fn clean_tags(metadata: &mut Mapping) -> u32 {
    let Some(Value::Sequence(tags)) = metadata.get_mut(TAGS) else {
        return 0;
    };
    let mut cleaned = 0;
    for tag in tags.iter_mut() {
        if let Value::String(s) = tag {
            let clean = clean_tag(s);
            if clean != *s {
                debug!(from = %s, to = %clean, "cleaning tag");
                *s = clean;
                cleaned += 1;
            }
        }
    }
    cleaned
}

fn convert_image_value(value: Option<&mut Value>) -> bool {
    if let Some(Value::String(path)) = value
        && let Some(converted) = converted_image_name(path)
    {
        debug!(from = %path, to = %converted, "converting cover image reference");
        *path = converted;
        return true;
    }
    false
}

/// Rewrite `.heic` cover references to `.jpeg`. Returns the number rewritten.
pub fn fix_cover_images(metadata: &mut Mapping) -> u32 {
    let mut converted = 0;
    if convert_image_value(metadata.get_mut(COVER_IMG)) {
        converted += 1;
    }
    if let Some(Value::Mapping(cover)) = metadata.get_mut(COVER)
        && convert_image_value(cover.get_mut(COVER_IMAGE))
    {
        converted += 1;
    }
    converted
}

/// Drop repeated aliases, keeping the first occurrence.
fn dedup_in_order(aliases: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    aliases
        .into_iter()
        .filter(|alias| seen.insert(alias.clone()))
        .collect()
}

/// Run every normalization rule over `metadata`.
///
/// `main_slug` is the slug derived from the document's path (`None` for the
/// root document).
pub fn normalize(
    mut metadata: Mapping,
    main_slug: Option<&str>,
    unimportant_keys: &[String],
    stats: &mut Stats,
) -> Normalized {
    let mut changed = false;

    let removed = strip_unimportant_keys(&mut metadata, unimportant_keys);
    if removed > 0 {
        stats.frontmatter_source_cleanups += removed;
        changed = true;
    }

    if strip_published_visibility(&mut metadata) {
        stats.frontmatter_source_cleanups += 1;
        changed = true;
    }

    let draft = read_draft(&metadata);

    let (mut aliases, coerced) = collect_aliases(&mut metadata);
    stats.aliases_collected += aliases.len() as u32;
    changed |= coerced;

    if let Some(slug) = main_slug {
        aliases.push(slug.to_string());
        stats.slugs_collected += 1;
    }

    match reconcile_slug(&mut metadata, main_slug, &mut aliases) {
        SlugOutcome::Root | SlugOutcome::Matching => {}
        SlugOutcome::Missing => {
            debug!(slug = ?main_slug, "setting missing slug");
            stats.missing_slugs_fixed += 1;
            changed = true;
        }
        SlugOutcome::Retyped => {
            debug!(slug = ?main_slug, "storing slug as a string");
            changed = true;
        }
        SlugOutcome::Divergent { old } => {
            debug!(old = %old, new = ?main_slug, "replacing divergent slug, old slug kept as alias");
            stats.divergent_slugs_fixed += 1;
            changed = true;
        }
    }

    let tags = clean_tags(&mut metadata);
    if tags > 0 {
        stats.tags_cleaned += tags;
        changed = true;
    }

    let covers = fix_cover_images(&mut metadata);
    if covers > 0 {
        stats.cover_images_converted += covers;
        changed = true;
    }

    Normalized {
        metadata,
        aliases: dedup_in_order(aliases),
        draft,
        changed,
    }
}
