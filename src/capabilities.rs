//! NNTP capability probing results (RFC 3977 Section 5.2)
//!
//! Retrieval strategy selection reads three things out of the CAPABILITIES
//! response: whether the server can stream bulk overview data (OVER, or the
//! legacy XOVER), whether it can answer per-field queries (HDR/XHDR), and
//! whether it will describe its overview field order (LIST OVERVIEW.FMT).

use std::collections::HashMap;

/// Capabilities advertised by an NNTP server
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    /// Map of capability name to its arguments
    /// Example: "LIST" -> ["ACTIVE", "OVERVIEW.FMT"]
    capabilities: HashMap<String, Vec<String>>,
}

impl Capabilities {
    /// Create an empty Capabilities instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse capabilities from NNTP response lines
    ///
    /// Each line is: `CAPABILITY [arg1 arg2 ...]`
    pub fn parse(lines: &[String]) -> Self {
        let mut capabilities = HashMap::new();

        for line in lines {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }

            let capability = parts[0].to_uppercase();
            let args: Vec<String> = parts[1..].iter().map(|s| s.to_string()).collect();
            capabilities.insert(capability, args);
        }

        Self { capabilities }
    }

    /// Check if a capability is supported
    #[must_use]
    pub fn has(&self, capability: &str) -> bool {
        self.capabilities.contains_key(&capability.to_uppercase())
    }

    /// Check if the server supports a capability with a specific argument
    pub fn has_arg(&self, capability: &str, arg: &str) -> bool {
        self.capabilities
            .get(&capability.to_uppercase())
            .map(|args| args.iter().any(|a| a.eq_ignore_ascii_case(arg)))
            .unwrap_or(false)
    }

    /// Server can return bulk overview data (OVER or legacy XOVER)
    #[must_use]
    pub fn supports_bulk_overview(&self) -> bool {
        self.has("OVER") || self.has("XOVER")
    }

    /// Server can answer per-field header queries over a range (HDR or
    /// legacy XHDR)
    #[must_use]
    pub fn supports_field_query(&self) -> bool {
        self.has("HDR") || self.has("XHDR")
    }

    /// Server will describe its overview field order via LIST OVERVIEW.FMT
    #[must_use]
    pub fn supports_overview_fmt(&self) -> bool {
        self.has_arg("LIST", "OVERVIEW.FMT")
    }
}
