//! English inflection for table and column names
//!
//! Just enough rules to turn entity type names into table names and table
//! names back into foreign key columns. Irregular names should use the
//! `table` / `foreign_key` overrides instead of growing this list.

use convert_case::{Case, Casing};

/// Suffixes stripped from type names before deriving a table name
const TYPE_SUFFIXES: &[&str] = &["Model", "Entity", "Record"];

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("tooth", "teeth"),
    ("foot", "feet"),
];

const UNCOUNTABLE: &[&str] = &[
    "data",
    "deer",
    "equipment",
    "fish",
    "information",
    "media",
    "money",
    "news",
    "series",
    "sheep",
    "species",
];

/// Nouns ending in `-ie`, whose plural is not a `-y` word
const IE_NOUNS: &[&str] = &[
    "brownie", "calorie", "cookie", "die", "genie", "hoodie", "lie", "movie", "newbie", "pie",
    "prairie", "rookie", "selfie", "tie", "zombie",
];

/// Nouns ending in `-s` that take `-es` in the plural
const S_NOUNS: &[&str] = &[
    "alias", "atlas", "bonus", "bus", "campus", "canvas", "census", "status", "virus",
];

/// Split `user_role` into (`user_`, `role`) so rules apply to the last word.
fn split_last_word(word: &str) -> (&str, &str) {
    match word.rfind('_') {
        Some(pos) => word.split_at(pos + 1),
        None => ("", word),
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

pub fn pluralize(word: &str) -> String {
    let (prefix, last) = split_last_word(word);
    let lower = last.to_lowercase();

    if last.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(s, _)| *s == lower) {
        return format!("{}{}", prefix, plural);
    }

    let mut chars = lower.chars().rev();
    let (end, before) = (chars.next(), chars.next());
    let plural = match end {
        Some('y') if before.is_some_and(|c| !is_vowel(c)) => {
            format!("{}ies", &last[..last.len() - 1])
        }
        Some('s' | 'x' | 'z') => format!("{}es", last),
        Some('h') if matches!(before, Some('c' | 's')) => format!("{}es", last),
        _ => format!("{}s", last),
    };

    format!("{}{}", prefix, plural)
}

pub fn singularize(word: &str) -> String {
    let (prefix, last) = split_last_word(word);
    let lower = last.to_lowercase();

    if last.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((singular, _)) = IRREGULAR.iter().find(|(_, p)| *p == lower) {
        return format!("{}{}", prefix, singular);
    }

    if let Some(noun) = S_NOUNS
        .iter()
        .find(|noun| lower == **noun || lower.strip_suffix("es") == Some(**noun))
    {
        return format!("{}{}", prefix, &last[..noun.len()]);
    }

    let singular = if lower
        .strip_suffix('s')
        .is_some_and(|stem| IE_NOUNS.contains(&stem))
    {
        last[..last.len() - 1].to_string()
    } else if lower.len() > 3 && lower.ends_with("ies") {
        format!("{}y", &last[..last.len() - 3])
    } else if ["sses", "shes", "ches", "xes", "zes"]
        .iter()
        .any(|suffix| lower.ends_with(suffix))
    {
        last[..last.len() - 2].to_string()
    } else if lower.ends_with('s') && !["ss", "us", "is"].iter().any(|s| lower.ends_with(s)) {
        last[..last.len() - 1].to_string()
    } else {
        last.to_string()
    };

    format!("{}{}", prefix, singular)
}

/// `UserRoleModel` -> `user_roles`
pub fn table_name_for_type(type_name: &str) -> String {
    let base = TYPE_SUFFIXES
        .iter()
        .find_map(|suffix| {
            type_name
                .strip_suffix(suffix)
                .filter(|rest| !rest.is_empty())
        })
        .unwrap_or(type_name);

    pluralize(&base.to_case(Case::Snake))
}

/// `cities` -> `id_city`
pub fn foreign_key_for_table(table_name: &str) -> String {
    format!("id_{}", singularize(table_name))
}
