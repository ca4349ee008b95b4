//! Type name qualification and property naming conventions
//!
//! Qualified names take the form `Namespace.ShortName`. Anything containing a
//! `.` is treated as already qualified.

use serde::{Deserialize, Serialize};

const SEPARATOR: char = '.';

/// Build the qualified name for a short name and namespace
pub fn qualified_name(short_name: &str, namespace: &str) -> String {
    if namespace.is_empty() {
        short_name.to_string()
    } else {
        format!("{}{}{}", namespace, SEPARATOR, short_name)
    }
}

/// Returns true if the type name already carries a namespace
pub fn is_qualified_type_name(type_name: &str) -> bool {
    type_name.contains(SEPARATOR)
}

/// Qualify `type_name` with `namespace` unless it is already qualified
pub fn qualify_type_name(type_name: &str, namespace: &str) -> String {
    if is_qualified_type_name(type_name) {
        type_name.to_string()
    } else {
        qualified_name(type_name, namespace)
    }
}

/// Split a qualified name into `(namespace, short_name)`
///
/// Unqualified names yield an empty namespace.
pub fn split_qualified_name(type_name: &str) -> (&str, &str) {
    match type_name.rfind(SEPARATOR) {
        Some(pos) => (&type_name[..pos], &type_name[pos + 1..]),
        None => ("", type_name),
    }
}

/// Mapping between property names in metadata documents (server side) and
/// property names on the client model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NamingConvention {
    /// Names are used as they appear in documents
    #[default]
    Identity,
    /// `CustomerId` on the server is `customerId` on the client
    CamelCase,
}

impl NamingConvention {
    pub fn server_to_client(self, server_name: &str) -> String {
        match self {
            Self::Identity => server_name.to_string(),
            Self::CamelCase => map_first_char(server_name, char::to_lowercase),
        }
    }

    pub fn client_to_server(self, client_name: &str) -> String {
        match self {
            Self::Identity => client_name.to_string(),
            Self::CamelCase => map_first_char(client_name, char::to_uppercase),
        }
    }

    pub(crate) fn names_to_client(self, server_names: Vec<String>) -> Vec<String> {
        match self {
            Self::Identity => server_names,
            _ => server_names
                .iter()
                .map(|name| self.server_to_client(name))
                .collect(),
        }
    }

    pub(crate) fn names_to_server(self, client_names: &[String]) -> Vec<String> {
        client_names
            .iter()
            .map(|name| self.client_to_server(name))
            .collect()
    }
}

fn map_first_char<I>(name: &str, map: fn(char) -> I) -> String
where
    I: Iterator<Item = char>,
{
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => map(first).chain(chars).collect(),
        None => String::new(),
    }
}
