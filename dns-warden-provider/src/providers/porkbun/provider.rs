//! Porkbun `DnsProvider` trait implementation.

use async_trait::async_trait;

use crate::cache::RecordCache;
use crate::error::Result;
use crate::providers::common::{full_name_to_relative, parse_record_type};
use crate::traits::{DnsProvider, ErrorContext};
use crate::types::{
    DnsRecord, DnsRecordType, FieldType, ProviderCapabilities, ProviderCredentialField,
    ProviderMetadata, ProviderType, TtlRange,
};

use super::types::{EmptyBody, PorkbunRecordBody};
use super::{PorkbunCreateResponse, PorkbunProvider, PorkbunRecord, PorkbunRetrieveResponse};

impl PorkbunProvider {
    fn to_dns_record(&self, record: PorkbunRecord) -> Result<DnsRecord> {
        let record_type = parse_record_type(&record.record_type, "porkbun")?;

        Ok(DnsRecord {
            id: Some(record.id),
            record_type,
            name: full_name_to_relative(&record.name, &self.zone_name),
            content: record.content,
            ttl: record.ttl,
            proxied: None,
            priority: record.prio,
            weight: None,
            port: None,
            flags: None,
            tag: None,
            comment: record.notes,
        })
    }

    fn to_body(record: &DnsRecord) -> PorkbunRecordBody {
        PorkbunRecordBody {
            name: if record.name == "@" {
                String::new()
            } else {
                record.name.clone()
            },
            record_type: record.record_type.as_str().to_string(),
            content: record.content.clone(),
            ttl: record.ttl.to_string(),
            prio: record.priority.map(|p| p.to_string()),
            notes: record.comment.clone(),
        }
    }
}

#[async_trait]
impl DnsProvider for PorkbunProvider {
    fn name(&self) -> &'static str {
        "porkbun"
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Porkbun
    }

    fn metadata() -> ProviderMetadata {
        ProviderMetadata {
            id: ProviderType::Porkbun,
            name: "Porkbun".to_string(),
            description: "Porkbun DNS API".to_string(),
            required_fields: vec![
                ProviderCredentialField {
                    key: "apiKey".to_string(),
                    label: "API Key".to_string(),
                    field_type: FieldType::Password,
                    help_text: None,
                },
                ProviderCredentialField {
                    key: "secretApiKey".to_string(),
                    label: "Secret API Key".to_string(),
                    field_type: FieldType::Password,
                    help_text: None,
                },
                ProviderCredentialField {
                    key: "zone".to_string(),
                    label: "Zone".to_string(),
                    field_type: FieldType::Text,
                    help_text: Some("Domain name, e.g. example.com (API access must be enabled for the domain)".to_string()),
                },
            ],
            capabilities: porkbun_capabilities(),
        }
    }

    fn capabilities(&self) -> ProviderCapabilities {
        porkbun_capabilities()
    }

    fn zone(&self) -> &str {
        &self.zone_name
    }

    fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// One retrieve call validates the key pair and the domain opt-in at once.
    async fn init(&self) -> Result<()> {
        let _: PorkbunRetrieveResponse = self
            .post_api(
                &format!("/dns/retrieve/{}", self.zone_name),
                &EmptyBody {},
                ErrorContext::default(),
            )
            .await?;
        Ok(())
    }

    async fn fetch_records(&self) -> Result<Vec<DnsRecord>> {
        let response: PorkbunRetrieveResponse = self
            .post_api(
                &format!("/dns/retrieve/{}", self.zone_name),
                &EmptyBody {},
                ErrorContext::default(),
            )
            .await?;

        let mut records = Vec::with_capacity(response.records.len());
        for raw in response.records {
            match self.to_dns_record(raw) {
                Ok(record) => records.push(record),
                Err(e) => log::debug!("[porkbun] skipping record: {e}"),
            }
        }
        Ok(records)
    }

    async fn api_create(&self, record: &DnsRecord) -> Result<DnsRecord> {
        let body = Self::to_body(record);
        let ctx = ErrorContext {
            record_name: Some(record.name.clone()),
            record_id: None,
        };
        let response: PorkbunCreateResponse = self
            .post_api(&format!("/dns/create/{}", self.zone_name), &body, ctx)
            .await?;

        // Create returns only the new id; echo the submitted record back.
        let mut created = record.clone();
        created.id = Some(response.id);
        Ok(created)
    }

    async fn api_update(&self, record_id: &str, record: &DnsRecord) -> Result<DnsRecord> {
        let body = Self::to_body(record);
        let ctx = ErrorContext {
            record_name: Some(record.name.clone()),
            record_id: Some(record_id.to_string()),
        };
        self.post_api_status(
            &format!("/dns/edit/{}/{record_id}", self.zone_name),
            &body,
            ctx,
        )
        .await?;

        let mut updated = record.clone();
        updated.id = Some(record_id.to_string());
        Ok(updated)
    }

    async fn api_delete(&self, record_id: &str) -> Result<()> {
        let ctx = ErrorContext {
            record_name: None,
            record_id: Some(record_id.to_string()),
        };
        self.post_api_status(
            &format!("/dns/delete/{}/{record_id}", self.zone_name),
            &EmptyBody {},
            ctx,
        )
        .await
    }
}

fn porkbun_capabilities() -> ProviderCapabilities {
    ProviderCapabilities {
        supports_proxy: false,
        supports_comment: true,
        // SRV and CAA need provider-specific content packing Porkbun does not
        // expose field-by-field; they are rejected up front by validation.
        supported_types: vec![
            DnsRecordType::A,
            DnsRecordType::Aaaa,
            DnsRecordType::Cname,
            DnsRecordType::Mx,
            DnsRecordType::Txt,
            DnsRecordType::Ns,
        ],
        ttl_range: TtlRange {
            min: 600,
            max: 2_147_483_647,
        },
    }
}
