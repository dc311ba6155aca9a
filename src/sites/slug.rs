//! Slug validation and derivation.

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest slug [`slugify`] produces.
pub const MAX_SLUG_LEN: usize = 80;

static RE_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

/// Lowercase ASCII words joined by single hyphens, e.g. `acme-blender-3000`.
pub fn is_valid_slug(slug: &str) -> bool {
    RE_SLUG.is_match(slug)
}

/// Derive a valid slug from free text, or an empty string if nothing usable remains.
///
/// Common Latin accents are folded (`é` → `e`); every other non-alphanumeric
/// run becomes one hyphen. The result is cut at a hyphen boundary to stay
/// within [`MAX_SLUG_LEN`].
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;
    for c in input.chars().flat_map(char::to_lowercase) {
        let c = fold_accent(c);
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    if slug.len() > MAX_SLUG_LEN {
        let cut = slug[..MAX_SLUG_LEN].rfind('-').unwrap_or(MAX_SLUG_LEN);
        slug.truncate(cut);
    }
    slug
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}
