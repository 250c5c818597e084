//! Model merging across schema fragments.
//!
//! When the same model is declared in several fragments, [`merge_models`]
//! folds every declaration into the first one. A fragment can declare a
//! "blank alias" holding only the identity field so that relations resolve,
//! while another fragment supplies the remaining fields.
//!
//! # Example
//!
//! ```
//! use prismix_core::*;
//!
//! let base = Model::new("User").with_field(Field::scalar("id", "Int").id());
//! let extension = Model::new("User")
//!     .with_field(Field::scalar("id", "Int").id())
//!     .with_field(Field::scalar("name", "String").with_column_name("user_name"));
//!
//! let merged = merge_models(vec![base, extension]);
//! assert_eq!(merged.len(), 1);
//! assert_eq!(merged[0].field_names(), vec!["id", "name"]);
//! ```

use std::collections::HashMap;

use crate::{Field, Model};

/// Merges models by name, preserving the order in which names first appear.
///
/// For a repeated name, each incoming field replaces the field of the same
/// name in place (inheriting its column name and default value when the
/// incoming field has none) or is appended when new. A table mapping is only
/// adopted when the first declaration lacks one. Uniqueness groups and index
/// declarations accumulate and are never deduplicated.
///
/// # Examples
///
/// ```
/// use prismix_core::*;
///
/// let a = Model::new("Post").with_unique(UniqueConstraint::new(&["slug"]));
/// let b = Model::new("Post")
///     .with_db_name("posts")
///     .with_unique(UniqueConstraint::new(&["title", "authorId"]));
///
/// let merged = merge_models(vec![a, b]);
/// assert_eq!(merged[0].unique_fields.len(), 2);
/// assert_eq!(merged[0].db_name.as_deref(), Some("posts"));
/// ```
pub fn merge_models(models: impl IntoIterator<Item = Model>) -> Vec<Model> {
    let mut merged: Vec<Model> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for model in models {
        match by_name.get(&model.name) {
            Some(&index) => merge_model(&mut merged[index], model),
            None => {
                by_name.insert(model.name.clone(), merged.len());
                merged.push(model);
            }
        }
    }

    merged
}

/// Folds `incoming` into `base`. Both must describe the same model name.
pub fn merge_model(base: &mut Model, incoming: Model) {
    for field in incoming.fields {
        match base.fields.iter().position(|f| f.name == field.name) {
            Some(index) => {
                let previous = std::mem::replace(&mut base.fields[index], field);
                inherit_field_metadata(&mut base.fields[index], previous);
            }
            None => base.fields.push(field),
        }
    }

    if base.db_name.is_none() {
        base.db_name = incoming.db_name;
    }

    base.unique_fields.extend(incoming.unique_fields);
    base.index_declarations.extend(incoming.index_declarations);
}

fn inherit_field_metadata(field: &mut Field, previous: Field) {
    if field.column_name.is_none() {
        field.column_name = previous.column_name;
    }
    if field.default.is_none() {
        field.default = previous.default;
    }
}

#[cfg(test)]
mod tests {
    use crate::{DefaultValue, UniqueConstraint};

    use super::*;

    fn user_alias() -> Model {
        Model::new("User").with_field(Field::scalar("id", "Int").id())
    }

    #[test]
    fn test_merge_disjoint_models_keeps_union_in_order() {
        let post = Model::new("Post")
            .with_field(Field::scalar("id", "Int").id())
            .with_field(Field::scalar("title", "String"));
        let tag = Model::new("Tag").with_field(Field::scalar("label", "String"));

        let merged = merge_models(vec![user_alias(), post, tag]);
        let names: Vec<&str> = merged.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["User", "Post", "Tag"]);
        assert_eq!(merged[1].field_names(), vec!["id", "title"]);
    }

    #[test]
    fn test_merge_replaces_field_in_place() {
        let first = Model::new("User")
            .with_field(Field::scalar("id", "Int").id())
            .with_field(Field::scalar("email", "String"))
            .with_field(Field::scalar("age", "Int"));
        let second = Model::new("User").with_field(Field::scalar("email", "String").unique());

        let merged = merge_models(vec![first, second]);
        let user = &merged[0];
        assert_eq!(user.field_names(), vec!["id", "email", "age"]);
        assert!(user.fields[1].is_unique);
    }

    #[test]
    fn test_merge_backfills_column_name_and_default() {
        let first = Model::new("User").with_field(
            Field::scalar("createdAt", "DateTime")
                .with_column_name("created_at")
                .with_default(DefaultValue::function("now")),
        );
        let second = Model::new("User").with_field(Field::scalar("createdAt", "DateTime").optional());

        let merged = merge_models(vec![first, second]);
        let field = merged[0].find_field("createdAt").unwrap();
        assert!(!field.is_required);
        assert_eq!(field.column_name.as_deref(), Some("created_at"));
        assert_eq!(field.default, Some(DefaultValue::function("now")));
    }

    #[test]
    fn test_merge_incoming_column_name_wins() {
        let first = Model::new("User").with_field(Field::scalar("name", "String").with_column_name("a"));
        let second = Model::new("User").with_field(Field::scalar("name", "String").with_column_name("b"));

        let merged = merge_models(vec![first, second]);
        assert_eq!(merged[0].fields[0].column_name.as_deref(), Some("b"));
    }

    #[test]
    fn test_merge_appends_new_fields() {
        let extension = Model::new("User")
            .with_field(Field::scalar("id", "Int").id())
            .with_field(Field::scalar("name", "String"));

        let merged = merge_models(vec![user_alias(), extension]);
        assert_eq!(merged[0].field_names(), vec!["id", "name"]);
    }

    #[test]
    fn test_merge_never_overwrites_existing_db_name() {
        let first = user_alias().with_db_name("users");
        let second = user_alias().with_db_name("accounts");
        let merged = merge_models(vec![first, second]);
        assert_eq!(merged[0].db_name.as_deref(), Some("users"));
    }

    #[test]
    fn test_merge_adopts_db_name_from_later_fragment() {
        let merged = merge_models(vec![user_alias(), user_alias().with_db_name("users")]);
        assert_eq!(merged[0].db_name.as_deref(), Some("users"));
    }

    #[test]
    fn test_merge_accumulates_unique_groups_and_indexes_without_dedup() {
        let mut first = user_alias().with_unique(UniqueConstraint::new(&["email"]));
        first.index_declarations.push("@@index([email])".to_string());
        let mut second = user_alias().with_unique(UniqueConstraint::new(&["email"]));
        second.index_declarations.push("@@index([email])".to_string());

        let merged = merge_models(vec![first, second]);
        assert_eq!(merged[0].unique_fields.len(), 2);
        assert_eq!(merged[0].index_declarations.len(), 2);
    }
}
