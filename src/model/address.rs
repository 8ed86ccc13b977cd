//! Email addresses as they appear in a digest record.

/// A decoded email address.
///
/// # Examples
/// - `"Juan García <juan@ejemplo.com>"` → `display_name = "Juan García"`, `address = "juan@ejemplo.com"`
/// - `"user@example.com"` → `display_name = ""`, `address = "user@example.com"`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Default)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare email address (`user@domain`, may be empty for name-only entries).
    pub address: String,
}

impl EmailAddress {
    /// Build an address from its parts.
    pub fn new(display_name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            address: address.into(),
        }
    }

    /// Format for display: `"Display Name <address>"`, `"address"` or `"Display Name"`.
    pub fn display(&self) -> String {
        match (self.display_name.is_empty(), self.address.is_empty()) {
            (true, _) => self.address.clone(),
            (false, true) => self.display_name.clone(),
            (false, false) => format!("{} <{}>", self.display_name, self.address),
        }
    }

    /// `true` when neither a name nor an address is present.
    pub fn is_empty(&self) -> bool {
        self.display_name.is_empty() && self.address.is_empty()
    }
}

impl From<&mail_parser::Addr<'_>> for EmailAddress {
    fn from(addr: &mail_parser::Addr<'_>) -> Self {
        Self {
            display_name: addr
                .name
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            address: addr
                .address
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
        }
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Join a list of addresses into `"a, B <b@x>"` form.
pub fn join_addresses(list: &[EmailAddress]) -> String {
    list.iter()
        .filter(|a| !a.is_empty())
        .map(EmailAddress::display)
        .collect::<Vec<_>>()
        .join(", ")
}
