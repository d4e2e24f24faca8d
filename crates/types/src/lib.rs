//! Validated primitive types shared by the Fiche crates.
//!
//! Every type here is a thin wrapper around a `String` whose constructor enforces a
//! structural guarantee (non-empty, well-formed dot path). Serde support goes through the
//! same constructors, so a value that deserialised successfully is always valid.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// The input is not a well-formed dot-separated field path
    #[error("invalid field path '{0}': segments must be non-empty and separated by '.'")]
    InvalidPath(String),
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(NonEmptyText)` if the trimmed input is non-empty,
    /// or `Err(TypesError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A dot-separated path into a nested patient record (for example `sas_polygraphie.iah`).
///
/// The first segment names a record group, the remaining segments walk nested mappings.
/// Construction rejects empty paths and empty segments (`"a..b"`, `".a"`, `"a."`), so every
/// `FieldPath` has at least one segment and none of them is blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(String);

impl FieldPath {
    /// Separator between path segments.
    pub const SEPARATOR: char = '.';

    /// Parses and validates a field path.
    ///
    /// Surrounding whitespace is trimmed from the whole path and from each segment.
    ///
    /// # Errors
    ///
    /// Returns `TypesError::Empty` for blank input and `TypesError::InvalidPath` when a
    /// segment is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::Empty);
        }

        let mut segments = Vec::new();
        for segment in trimmed.split(Self::SEPARATOR) {
            let segment = segment.trim();
            if segment.is_empty() {
                return Err(TypesError::InvalidPath(trimmed.to_owned()));
            }
            segments.push(segment);
        }

        Ok(Self(segments.join(".")))
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the path segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(Self::SEPARATOR)
    }

    /// The first segment, i.e. the record group key.
    pub fn root(&self) -> &str {
        self.segments().next().unwrap_or(self.0.as_str())
    }

    /// The last segment, i.e. the field name inside its parent mapping.
    pub fn leaf(&self) -> &str {
        self.0
            .rsplit(Self::SEPARATOR)
            .next()
            .unwrap_or(self.0.as_str())
    }

    /// Builds the path of a direct child of this path.
    ///
    /// # Errors
    ///
    /// Returns an error if `segment` is blank or itself contains a separator that
    /// produces an empty segment.
    pub fn child(&self, segment: &str) -> Result<Self, TypesError> {
        Self::new(format!("{}{}{}", self.0, Self::SEPARATOR, segment))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FieldPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for FieldPath {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for FieldPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for FieldPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FieldPath::new(&s).map_err(serde::de::Error::custom)
    }
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from trimmed, non-empty input.
            ///
            /// # Errors
            ///
            /// Returns `TypesError::Empty` if the input is empty or whitespace only.
            pub fn new(input: impl AsRef<str>) -> Result<Self, TypesError> {
                let trimmed = input.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(TypesError::Empty);
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $name::new(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

identifier!(
    /// Identifier of a pathology profile (for example `sas` for sleep-disordered breathing).
    PathologyId
);

identifier!(
    /// Identifier of a section within a pathology profile.
    ///
    /// For sections without explicit fields this is also the record group key holding the
    /// section content.
    SectionId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Symptômes  ").expect("valid text");
        assert_eq!(text.as_str(), "Symptômes");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   "), Err(TypesError::Empty));
        assert_eq!(NonEmptyText::new(""), Err(TypesError::Empty));
    }

    #[test]
    fn field_path_exposes_segments() {
        let path = FieldPath::new("sas_polygraphie.resultats.iah").expect("valid path");
        assert_eq!(
            path.segments().collect::<Vec<_>>(),
            vec!["sas_polygraphie", "resultats", "iah"]
        );
        assert_eq!(path.root(), "sas_polygraphie");
        assert_eq!(path.leaf(), "iah");
    }

    #[test]
    fn field_path_single_segment_is_root_and_leaf() {
        let path = FieldPath::new("commentaire").expect("valid path");
        assert_eq!(path.root(), "commentaire");
        assert_eq!(path.leaf(), "commentaire");
    }

    #[test]
    fn field_path_trims_segments() {
        let path = FieldPath::new(" a . b ").expect("valid path");
        assert_eq!(path.as_str(), "a.b");
    }

    #[test]
    fn field_path_rejects_empty_segments() {
        for input in ["a..b", ".a", "a.", "."] {
            let err = FieldPath::new(input).expect_err("should reject empty segment");
            assert!(matches!(err, TypesError::InvalidPath(_)), "{input}");
        }
        assert_eq!(FieldPath::new("  "), Err(TypesError::Empty));
    }

    #[test]
    fn field_path_child_appends_segment() {
        let path = FieldPath::new("ddb_exacerbations").expect("valid path");
        let child = path.child("nombre").expect("valid child");
        assert_eq!(child.as_str(), "ddb_exacerbations.nombre");
        assert!(path.child("").is_err());
    }

    #[test]
    fn field_path_deserialises_with_validation() {
        let path: FieldPath = serde_json::from_str("\"a.b\"").expect("valid json path");
        assert_eq!(path.as_str(), "a.b");

        let err = serde_json::from_str::<FieldPath>("\"a..b\"").expect_err("invalid path");
        assert!(err.to_string().contains("invalid field path"));
    }

    #[test]
    fn identifiers_can_be_looked_up_by_str() {
        let mut map = HashMap::new();
        map.insert(PathologyId::new("sas").expect("valid id"), 1);
        assert_eq!(map.get("sas"), Some(&1));
        assert!(SectionId::new(" ").is_err());
    }
}
