//! Per-record-type default resolution.
//!
//! Effective values come from an explicit precedence chain:
//! record-specific override → per-type default → global default → built-in
//! fallback. The per-type table is a fixed-size array over the closed record
//! type enumeration, not a string-keyed map.

use serde::{Deserialize, Serialize};

use dns_warden_provider::DnsRecordType;

use crate::types::RecordSpec;

/// Built-in fallback TTL when nothing else specifies one.
pub const BUILTIN_TTL: u32 = 300;

/// One tier of defaults; unset fields fall through to the next tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    /// Default content, e.g. a fixed target for CNAME entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

const TYPE_COUNT: usize = DnsRecordType::ALL.len();

fn type_index(record_type: DnsRecordType) -> usize {
    match record_type {
        DnsRecordType::A => 0,
        DnsRecordType::Aaaa => 1,
        DnsRecordType::Cname => 2,
        DnsRecordType::Mx => 3,
        DnsRecordType::Txt => 4,
        DnsRecordType::Srv => 5,
        DnsRecordType::Caa => 6,
        DnsRecordType::Ns => 7,
    }
}

/// Global + per-type defaults table.
#[derive(Debug, Clone, Default)]
pub struct DefaultsTable {
    global: RecordDefaults,
    per_type: [RecordDefaults; TYPE_COUNT],
}

/// Fully resolved values for one desired record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDefaults {
    pub ttl: u32,
    pub proxied: Option<bool>,
    pub content: Option<String>,
}

impl DefaultsTable {
    #[must_use]
    pub fn new(global: RecordDefaults) -> Self {
        Self {
            global,
            per_type: Default::default(),
        }
    }

    /// Install per-type defaults, replacing any previous entry for the type.
    pub fn set_type_defaults(&mut self, record_type: DnsRecordType, defaults: RecordDefaults) {
        self.per_type[type_index(record_type)] = defaults;
    }

    /// Resolve effective values for `spec` through the precedence chain.
    #[must_use]
    pub fn resolve(&self, spec: &RecordSpec) -> ResolvedDefaults {
        let per_type = &self.per_type[type_index(spec.record_type)];

        ResolvedDefaults {
            ttl: spec
                .ttl
                .or(per_type.ttl)
                .or(self.global.ttl)
                .unwrap_or(BUILTIN_TTL),
            proxied: spec.proxied.or(per_type.proxied).or(self.global.proxied),
            content: if spec.content.is_empty() {
                per_type
                    .content
                    .clone()
                    .or_else(|| self.global.content.clone())
            } else {
                Some(spec.content.clone())
            },
        }
    }
}
