//! Cloudflare `DnsProvider` trait implementation.

use async_trait::async_trait;

use crate::cache::RecordCache;
use crate::error::{ProviderError, Result};
use crate::providers::common::{full_name_to_relative, parse_record_type, relative_to_full_name};
use crate::traits::{DnsProvider, ErrorContext, ProviderErrorMapper};
use crate::types::{
    DnsRecord, DnsRecordType, FieldType, ProviderCapabilities, ProviderCredentialField,
    ProviderMetadata, ProviderType, TtlRange,
};

use super::types::{CloudflareRecordBody, CloudflareRecordData};
use super::{CloudflareDnsRecord, CloudflareProvider, CloudflareZone, MAX_PAGE_SIZE_RECORDS};

impl CloudflareProvider {
    fn zone_id(&self) -> Result<&str> {
        self.zone_id.get().map(String::as_str).ok_or_else(|| {
            ProviderError::Unknown {
                provider: self.provider_name().to_string(),
                raw_code: None,
                raw_message: "provider not initialized: call init() first".to_string(),
            }
        })
    }

    /// Convert a Cloudflare record into the unified shape.
    ///
    /// SRV and CAA carry their type-specific fields in the `data` payload;
    /// everything else maps straight across.
    pub(crate) fn to_dns_record(&self, cf: CloudflareDnsRecord) -> Result<DnsRecord> {
        let record_type = parse_record_type(&cf.record_type, self.provider_name())?;
        let data = cf.data.unwrap_or(CloudflareRecordData {
            priority: None,
            weight: None,
            port: None,
            target: None,
            flags: None,
            tag: None,
            value: None,
        });

        let content = match record_type {
            DnsRecordType::Srv => data.target.unwrap_or(cf.content),
            DnsRecordType::Caa => data.value.unwrap_or(cf.content),
            _ => cf.content,
        };

        Ok(DnsRecord {
            id: Some(cf.id),
            record_type,
            name: full_name_to_relative(&cf.name, &self.zone_name),
            content,
            ttl: cf.ttl,
            proxied: cf.proxied,
            priority: data.priority.or(cf.priority),
            weight: data.weight,
            port: data.port,
            flags: data.flags,
            tag: data.tag,
            comment: cf.comment,
        })
    }

    fn to_body(&self, record: &DnsRecord) -> CloudflareRecordBody {
        let full_name = relative_to_full_name(&record.name, &self.zone_name);
        let (content, data) = match record.record_type {
            DnsRecordType::Srv => (
                None,
                Some(CloudflareRecordData {
                    priority: record.priority,
                    weight: record.weight,
                    port: record.port,
                    target: Some(record.content.clone()),
                    flags: None,
                    tag: None,
                    value: None,
                }),
            ),
            DnsRecordType::Caa => (
                None,
                Some(CloudflareRecordData {
                    priority: None,
                    weight: None,
                    port: None,
                    target: None,
                    flags: record.flags,
                    tag: record.tag.clone(),
                    value: Some(record.content.clone()),
                }),
            ),
            _ => (Some(record.content.clone()), None),
        };

        CloudflareRecordBody {
            record_type: record.record_type.as_str().to_string(),
            name: full_name,
            content,
            ttl: record.ttl,
            priority: record.priority,
            proxied: record.proxied,
            comment: record.comment.clone(),
            data,
        }
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    fn name(&self) -> &'static str {
        "cloudflare"
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Cloudflare
    }

    fn metadata() -> ProviderMetadata {
        ProviderMetadata {
            id: ProviderType::Cloudflare,
            name: "Cloudflare".to_string(),
            description: "Cloudflare DNS with CDN proxy support".to_string(),
            required_fields: vec![
                ProviderCredentialField {
                    key: "apiToken".to_string(),
                    label: "API Token".to_string(),
                    field_type: FieldType::Password,
                    help_text: Some("Token with Zone:Read and DNS:Edit permissions".to_string()),
                },
                ProviderCredentialField {
                    key: "zone".to_string(),
                    label: "Zone".to_string(),
                    field_type: FieldType::Text,
                    help_text: Some("Zone name, e.g. example.com".to_string()),
                },
            ],
            capabilities: cloudflare_capabilities(),
        }
    }

    fn capabilities(&self) -> ProviderCapabilities {
        cloudflare_capabilities()
    }

    fn zone(&self) -> &str {
        &self.zone_name
    }

    fn cache(&self) -> &RecordCache {
        &self.cache
    }

    async fn init(&self) -> Result<()> {
        let path = format!("/zones?name={}", urlencoding::encode(&self.zone_name));
        let zones: Vec<CloudflareZone> = self.get(&path, ErrorContext::default()).await?;

        let zone = zones
            .into_iter()
            .find(|z| z.name.eq_ignore_ascii_case(&self.zone_name))
            .ok_or_else(|| ProviderError::ZoneNotFound {
                provider: self.provider_name().to_string(),
                zone: self.zone_name.clone(),
            })?;

        let _ = self.zone_id.set(zone.id);
        log::debug!("[cloudflare] resolved zone '{}'", self.zone_name);
        Ok(())
    }

    async fn fetch_records(&self) -> Result<Vec<DnsRecord>> {
        let zone_id = self.zone_id()?.to_string();
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let (cf_records, total_count) = self
                .get_records_page(&zone_id, page, MAX_PAGE_SIZE_RECORDS)
                .await?;
            let page_len = cf_records.len();
            for cf in cf_records {
                records.push(self.to_dns_record(cf)?);
            }
            if records.len() as u32 >= total_count || page_len == 0 {
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    async fn api_create(&self, record: &DnsRecord) -> Result<DnsRecord> {
        let zone_id = self.zone_id()?;
        let body = self.to_body(record);
        let ctx = ErrorContext {
            record_name: Some(record.name.clone()),
            record_id: None,
        };
        let cf: CloudflareDnsRecord = self
            .post(&format!("/zones/{zone_id}/dns_records"), &body, ctx)
            .await?;
        self.to_dns_record(cf)
    }

    async fn api_update(&self, record_id: &str, record: &DnsRecord) -> Result<DnsRecord> {
        let zone_id = self.zone_id()?;
        let body = self.to_body(record);
        let ctx = ErrorContext {
            record_name: Some(record.name.clone()),
            record_id: Some(record_id.to_string()),
        };
        let cf: CloudflareDnsRecord = self
            .put(
                &format!("/zones/{zone_id}/dns_records/{record_id}"),
                &body,
                ctx,
            )
            .await?;
        self.to_dns_record(cf)
    }

    async fn api_delete(&self, record_id: &str) -> Result<()> {
        let zone_id = self.zone_id()?;
        let ctx = ErrorContext {
            record_name: None,
            record_id: Some(record_id.to_string()),
        };
        self.delete(&format!("/zones/{zone_id}/dns_records/{record_id}"), ctx)
            .await
    }
}

fn cloudflare_capabilities() -> ProviderCapabilities {
    ProviderCapabilities {
        supports_proxy: true,
        supports_comment: true,
        supported_types: DnsRecordType::ALL.to_vec(),
        // TTL 1 means "automatic"; proxied records always report 1.
        ttl_range: TtlRange { min: 1, max: 86400 },
    }
}
