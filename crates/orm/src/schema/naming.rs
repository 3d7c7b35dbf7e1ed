//! Naming conventions - column and table names derived from Rust-side names

use once_cell::sync::Lazy;
use regex::Regex;

/// Suffix rewrite rules, applied in order to the result of the previous rule
static PLURAL_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        ("ch$", "ches"),
        ("ss$", "sses"),
        ("sh$", "shes"),
        ("day$", "days"),
        ("y$", "ies"),
        ("x$", "xes"),
        ("([^s])s?$", "${1}s"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

/// Normalize a type or field name to its database form
///
/// `UserID` → `user_id`, `HTMLBody` → `html_body`, `user_id` → `user_id`.
pub fn to_db_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary && prev != '_' {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// Pluralize a snake_cased table name
pub fn pluralize(name: &str) -> String {
    let mut table_name = name.to_string();
    for (rule, replacement) in PLURAL_RULES.iter() {
        if rule.is_match(&table_name) {
            table_name = rule.replace_all(&table_name, *replacement).into_owned();
        }
    }
    table_name
}

/// Table name for a type name
pub fn table_name_for(type_name: &str, singular: bool) -> String {
    let base = to_db_name(type_name);
    if singular {
        base
    } else {
        pluralize(&base)
    }
}

/// Whether two field names designate the same column
pub fn same_column(a: &str, b: &str) -> bool {
    to_db_name(a) == to_db_name(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_db_name() {
        assert_eq!(to_db_name("Name"), "name");
        assert_eq!(to_db_name("UserId"), "user_id");
        assert_eq!(to_db_name("UserID"), "user_id");
        assert_eq!(to_db_name("ID"), "id");
        assert_eq!(to_db_name("HTMLBody"), "html_body");
        assert_eq!(to_db_name("user_id"), "user_id");
        assert_eq!(to_db_name("CreditCard"), "credit_card");
        assert_eq!(to_db_name("Address1"), "address1");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("birthday"), "birthdays");
        assert_eq!(pluralize("church"), "churches");
        assert_eq!(pluralize("dish"), "dishes");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("users"), "users");
    }

    #[test]
    fn test_table_name_for() {
        assert_eq!(table_name_for("Category", false), "categories");
        assert_eq!(table_name_for("Address", false), "addresses");
        assert_eq!(table_name_for("Day", false), "days");
        assert_eq!(table_name_for("CreditCard", false), "credit_cards");
        assert_eq!(table_name_for("CreditCard", true), "credit_card");
    }

    #[test]
    fn test_same_column() {
        assert!(same_column("UserId", "user_id"));
        assert!(same_column("UserID", "UserId"));
        assert!(!same_column("UserId", "PostId"));
    }
}
