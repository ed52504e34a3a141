use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string that did not match any member of a closed set
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

// Closed string sets stored as TEXT columns and exchanged verbatim over JSON.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError { kind: $kind, value: other.to_string() }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = ParseEnumError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(Role, "role", {
    Admin => "Admin",
    Accountant => "Accountant",
});

string_enum!(Gender, "gender", {
    Male => "Male",
    Female => "Female",
});

string_enum!(InvoiceStatus, "status", {
    Pending => "Pending",
    Paid => "Paid",
    Overdue => "Overdue",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_names_only() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("Overdue".parse::<InvoiceStatus>(), Ok(InvoiceStatus::Overdue));
        let err = "admin".parse::<Role>().unwrap_err();
        assert_eq!(err.kind, "role");
        assert_eq!(err.value, "admin");
    }

    #[test]
    fn serializes_as_plain_strings() {
        assert_eq!(serde_json::to_value(Gender::Female).unwrap(), serde_json::json!("Female"));
        let role: Role = serde_json::from_value(serde_json::json!("Accountant")).unwrap();
        assert_eq!(role, Role::Accountant);
    }
}
