//! Slug derivation for posts.

use uuid::Uuid;

/// The number of hex characters taken from a random UUID for the suffix.
const SUFFIX_LENGTH: usize = 8;

/// Used when the title has no characters that can appear in a slug.
const FALLBACK_TITLE_SLUG: &str = "post";

/// Lowercase `text`, keep ASCII letters and digits, and join the remaining
/// words with single hyphens.
///
/// ```text
/// "Hello, World!" -> "hello-world"
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

/// Build a post slug from its title, a disambiguating suffix and the slug the
/// user typed, joined as `{title}-{suffix}-{user slug}`.
///
/// This is not a plain join of the three parts. The user's part is passed
/// through [slugify] like the title, so typed spaces or punctuation become
/// hyphens. When it slugifies to nothing it is left out along with its
/// hyphen, giving `{title}-{suffix}` rather than a slug ending in `-`.
pub fn derive_slug(title: &str, unique_suffix: &str, user_slug: &str) -> String {
    let title_slug = slugify(title);
    let title_slug = if title_slug.is_empty() {
        FALLBACK_TITLE_SLUG
    } else {
        &title_slug
    };
    let user_slug = slugify(user_slug);

    if user_slug.is_empty() {
        format!("{title_slug}-{unique_suffix}")
    } else {
        format!("{title_slug}-{unique_suffix}-{user_slug}")
    }
}

/// Derive a slug with a random suffix so that posts with the same title
/// still get distinct slugs.
pub fn generate_slug(title: &str, user_slug: &str) -> String {
    derive_slug(title, &unique_suffix(), user_slug)
}

fn unique_suffix() -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(SUFFIX_LENGTH);
    suffix
}

#[cfg(test)]
mod slug_tests {
    use super::{derive_slug, generate_slug, slugify};

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Sunset   at the Beach  "), "sunset-at-the-beach");
        assert_eq!(slugify("Café crème"), "caf-cr-me");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn derive_slug_joins_all_parts() {
        assert_eq!(
            derive_slug("My First Post", "a1b2c3d4", "Summer Trip"),
            "my-first-post-a1b2c3d4-summer-trip"
        );
    }

    #[test]
    fn derive_slug_omits_empty_user_slug() {
        assert_eq!(derive_slug("My First Post", "a1b2c3d4", ""), "my-first-post-a1b2c3d4");
        assert_eq!(derive_slug("My First Post", "a1b2c3d4", "!!"), "my-first-post-a1b2c3d4");
    }

    #[test]
    fn derive_slug_slugifies_the_user_part() {
        assert_eq!(
            derive_slug("Trip", "a1b2c3d4", "  Day ONE / Beach "),
            "trip-a1b2c3d4-day-one-beach"
        );
    }

    #[test]
    fn derive_slug_falls_back_when_title_has_no_slug_characters() {
        assert_eq!(derive_slug("🌅", "a1b2c3d4", ""), "post-a1b2c3d4");
    }

    #[test]
    fn same_title_gives_different_slugs() {
        let first = generate_slug("Duplicate", "mine");
        let second = generate_slug("Duplicate", "mine");

        assert_ne!(first, second);
        assert!(first.starts_with("duplicate-"));
        assert!(first.ends_with("-mine"));
        assert_eq!(first.len(), "duplicate-".len() + 8 + "-mine".len());
    }
}
