//! DigitalOcean `DnsProvider` trait implementation.

use async_trait::async_trait;

use crate::cache::RecordCache;
use crate::error::Result;
use crate::providers::common::parse_record_type;
use crate::traits::{DnsProvider, ErrorContext};
use crate::types::{
    DnsRecord, DnsRecordType, FieldType, ProviderCapabilities, ProviderCredentialField,
    ProviderMetadata, ProviderType, TtlRange,
};

use super::types::DigitalOceanRecordBody;
use super::{
    DigitalOceanProvider, DigitalOceanRecord, DomainRecordResponse, DomainRecordsResponse,
    MAX_PAGE_SIZE_RECORDS,
};

/// Record types whose `data` is a hostname; DigitalOcean returns and expects
/// these with a trailing dot.
fn data_is_hostname(record_type: DnsRecordType) -> bool {
    matches!(
        record_type,
        DnsRecordType::Cname | DnsRecordType::Mx | DnsRecordType::Ns | DnsRecordType::Srv
    )
}

impl DigitalOceanProvider {
    fn to_dns_record(&self, record: DigitalOceanRecord) -> Result<DnsRecord> {
        let record_type = parse_record_type(&record.record_type, "digitalocean")?;
        let content = if data_is_hostname(record_type) {
            record.data.trim_end_matches('.').to_string()
        } else {
            record.data
        };

        Ok(DnsRecord {
            id: Some(record.id.to_string()),
            record_type,
            name: record.name,
            content,
            ttl: record.ttl,
            proxied: None,
            priority: record.priority,
            weight: record.weight,
            port: record.port,
            flags: record.flags,
            tag: record.tag,
            comment: None,
        })
    }

    fn to_body(record: &DnsRecord) -> DigitalOceanRecordBody {
        let data = if data_is_hostname(record.record_type) && !record.content.ends_with('.') {
            format!("{}.", record.content)
        } else {
            record.content.clone()
        };

        DigitalOceanRecordBody {
            record_type: record.record_type.as_str().to_string(),
            name: record.name.clone(),
            data,
            ttl: record.ttl,
            priority: record.priority,
            weight: record.weight,
            port: record.port,
            flags: record.flags,
            tag: record.tag.clone(),
        }
    }
}

#[async_trait]
impl DnsProvider for DigitalOceanProvider {
    fn name(&self) -> &'static str {
        "digitalocean"
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Digitalocean
    }

    fn metadata() -> ProviderMetadata {
        ProviderMetadata {
            id: ProviderType::Digitalocean,
            name: "DigitalOcean".to_string(),
            description: "DigitalOcean Domains API".to_string(),
            required_fields: vec![
                ProviderCredentialField {
                    key: "apiToken".to_string(),
                    label: "API Token".to_string(),
                    field_type: FieldType::Password,
                    help_text: Some("Personal access token with write scope".to_string()),
                },
                ProviderCredentialField {
                    key: "zone".to_string(),
                    label: "Zone".to_string(),
                    field_type: FieldType::Text,
                    help_text: Some("Domain name, e.g. example.com".to_string()),
                },
            ],
            capabilities: digitalocean_capabilities(),
        }
    }

    fn capabilities(&self) -> ProviderCapabilities {
        digitalocean_capabilities()
    }

    fn zone(&self) -> &str {
        &self.zone_name
    }

    fn cache(&self) -> &RecordCache {
        &self.cache
    }

    async fn init(&self) -> Result<()> {
        // A missing domain surfaces as not_found and maps to ZoneNotFound.
        let _: super::types::DomainResponse = self
            .get(
                &format!("/domains/{}", self.zone_name),
                ErrorContext::default(),
            )
            .await?;
        Ok(())
    }

    async fn fetch_records(&self) -> Result<Vec<DnsRecord>> {
        let mut records = Vec::new();
        let mut fetched: u32 = 0;
        let mut page = 1;

        loop {
            let path = format!(
                "/domains/{}/records?page={page}&per_page={MAX_PAGE_SIZE_RECORDS}",
                self.zone_name
            );
            let response: DomainRecordsResponse =
                self.get(&path, ErrorContext::default()).await?;
            let total = response.meta.as_ref().map_or(0, |m| m.total);
            let page_len = response.domain_records.len() as u32;
            fetched += page_len;

            for raw in response.domain_records {
                // Listings include SOA and other types outside the managed set.
                match self.to_dns_record(raw) {
                    Ok(record) => records.push(record),
                    Err(e) => log::debug!("[digitalocean] skipping record: {e}"),
                }
            }

            if fetched >= total || page_len == 0 {
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    async fn api_create(&self, record: &DnsRecord) -> Result<DnsRecord> {
        let body = Self::to_body(record);
        let ctx = ErrorContext {
            record_name: Some(record.name.clone()),
            record_id: None,
        };
        let response: DomainRecordResponse = self
            .post(&format!("/domains/{}/records", self.zone_name), &body, ctx)
            .await?;
        self.to_dns_record(response.domain_record)
    }

    async fn api_update(&self, record_id: &str, record: &DnsRecord) -> Result<DnsRecord> {
        let body = Self::to_body(record);
        let ctx = ErrorContext {
            record_name: Some(record.name.clone()),
            record_id: Some(record_id.to_string()),
        };
        let response: DomainRecordResponse = self
            .put(
                &format!("/domains/{}/records/{record_id}", self.zone_name),
                &body,
                ctx,
            )
            .await?;
        self.to_dns_record(response.domain_record)
    }

    async fn api_delete(&self, record_id: &str) -> Result<()> {
        let ctx = ErrorContext {
            record_name: None,
            record_id: Some(record_id.to_string()),
        };
        self.delete(
            &format!("/domains/{}/records/{record_id}", self.zone_name),
            ctx,
        )
        .await
    }
}

fn digitalocean_capabilities() -> ProviderCapabilities {
    ProviderCapabilities {
        supports_proxy: false,
        supports_comment: false,
        supported_types: DnsRecordType::ALL.to_vec(),
        ttl_range: TtlRange {
            min: 30,
            max: 2_147_483_647,
        },
    }
}
