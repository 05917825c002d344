//! Storage key and content type resolution for uploaded documents.
//!
//! Keys have the form `uploads/documents/<email>/<field><ext>`. Repeated
//! `ttCopy` uploads are told apart by appending the request's index to the
//! field name. Extensions are lowercased both in the key and for lookup.

use super::types::{ExtensionRule, ResolvedTarget, UploadDescriptor};

/// Root under which every user's documents live.
pub const DOCUMENTS_ROOT: &str = "uploads/documents";

/// The only field whose key carries the request index.
pub const INDEXED_FIELD: &str = "ttCopy";

/// Content type used when an unrecognised upload is allowed through.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Accepted extensions, first match wins.
pub static EXTENSION_RULES: &[ExtensionRule] = &[
    ExtensionRule {
        extension: ".pdf",
        content_type: "application/pdf",
    },
    ExtensionRule {
        extension: ".doc",
        content_type: "application/msword",
    },
    ExtensionRule {
        extension: ".docx",
        content_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    },
    ExtensionRule {
        extension: ".txt",
        content_type: "text/plain",
    },
    ExtensionRule {
        extension: ".jpg",
        content_type: "image/jpeg",
    },
    ExtensionRule {
        extension: ".png",
        content_type: "image/png",
    },
    ExtensionRule {
        extension: ".gif",
        content_type: "image/gif",
    },
];

/// Look up the content type for an extension such as `.pdf`.
///
/// Matching ignores ASCII case. Returns `None` for unknown extensions.
#[must_use]
pub fn resolve_content_type(extension: &str) -> Option<&'static str> {
    EXTENSION_RULES
        .iter()
        .find(|rule| rule.extension.eq_ignore_ascii_case(extension))
        .map(|rule| rule.content_type)
}

/// Extension of the last path component, from the last `.` inclusive,
/// lowercased.
///
/// Trailing slashes are ignored. A name without a dot, whose only dot is
/// leading (`.env`), or that is exactly `..` has no extension. A trailing
/// dot yields `"."`.
#[must_use]
pub fn extract_extension(filename: &str) -> String {
    let trimmed = filename.trim_end_matches('/');
    let base = trimmed.rsplit('/').next().unwrap_or(trimmed);
    if base == ".." {
        return String::new();
    }
    match base.rfind('.') {
        Some(0) | None => String::new(),
        Some(idx) => base[idx..].to_lowercase(),
    }
}

/// Field name as it appears in the key.
fn keyed_field_name(descriptor: &UploadDescriptor) -> String {
    match (&descriptor.index, descriptor.field_name.as_str()) {
        (Some(index), INDEXED_FIELD) => format!("{INDEXED_FIELD}{index}"),
        _ => descriptor.field_name.clone(),
    }
}

/// Key prefix holding all documents of one user, with trailing slash.
#[must_use]
pub fn user_prefix(user_email: &str) -> String {
    format!("{DOCUMENTS_ROOT}/{user_email}/")
}

/// Storage key for an upload. Performs no validation of its inputs.
#[must_use]
pub fn resolve_storage_key(descriptor: &UploadDescriptor) -> String {
    format!(
        "{}{}{}",
        user_prefix(&descriptor.user_email),
        keyed_field_name(descriptor),
        extract_extension(&descriptor.original_filename)
    )
}

/// Storage key and content type for an upload.
#[must_use]
pub fn resolve_target(descriptor: &UploadDescriptor) -> ResolvedTarget {
    ResolvedTarget {
        storage_key: resolve_storage_key(descriptor),
        content_type: resolve_content_type(&extract_extension(&descriptor.original_filename)),
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn descriptor_strategy() -> impl Strategy<Value = UploadDescriptor> {
        (
            prop_oneof![Just("ttCopy".to_string()), "[a-zA-Z]{1,12}"],
            "[a-zA-Z0-9_-]{1,12}\\.[a-zA-Z]{2,4}",
            "[a-z0-9]{1,8}@[a-z]{1,8}\\.com",
            proptest::option::of("[0-9]{1,3}"),
        )
            .prop_map(|(field_name, original_filename, user_email, index)| {
                UploadDescriptor {
                    field_name,
                    original_filename,
                    user_email,
                    index,
                }
            })
    }

    // Resolution is a pure function of the descriptor.
    proptest! {
        #[test]
        fn prop_resolve_target_idempotent(descriptor in descriptor_strategy()) {
            prop_assert_eq!(resolve_target(&descriptor), resolve_target(&descriptor.clone()));
        }
    }

    // Key layout: uploads/documents/<email>/<field'><ext>
    proptest! {
        #[test]
        fn prop_storage_key_format(descriptor in descriptor_strategy()) {
            let key = resolve_storage_key(&descriptor);
            let prefix = user_prefix(&descriptor.user_email);
            prop_assert!(key.starts_with(&prefix));

            let name = &key[prefix.len()..];
            let extension = extract_extension(&descriptor.original_filename);
            prop_assert!(name.ends_with(&extension));
            prop_assert!(name.starts_with(&descriptor.field_name));
        }
    }

    // Only ttCopy keys carry the index.
    proptest! {
        #[test]
        fn prop_index_only_in_indexed_field(
            field_name in "[a-zA-Z]{1,12}",
            index in "[0-9]{4}",
        ) {
            prop_assume!(field_name != INDEXED_FIELD);
            let descriptor = UploadDescriptor::new(field_name, "doc.pdf", "u@example.com")
                .with_index(index.clone());

            prop_assert!(!resolve_storage_key(&descriptor).contains(&index));
        }
    }

    // Lookup never depends on ASCII case.
    proptest! {
        #[test]
        fn prop_content_type_case_insensitive(idx in 0usize..EXTENSION_RULES.len(), upper in proptest::bool::ANY) {
            let rule = EXTENSION_RULES[idx];
            let ext = if upper { rule.extension.to_ascii_uppercase() } else { rule.extension.to_string() };
            prop_assert_eq!(resolve_content_type(&ext), Some(rule.content_type));
        }
    }
}
