use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::info;

use crate::core::error::{ModboxError, ModboxResult};

/// `maven-metadata.xml` – only the versioning block is of interest.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MavenMetadata {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub versioning: Versioning,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Versioning {
    #[serde(default)]
    pub latest: Option<String>,
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub versions: VersionList,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct VersionList {
    #[serde(default, rename = "version")]
    pub items: Vec<String>,
}

impl MavenMetadata {
    pub fn parse(xml: &str) -> ModboxResult<Self> {
        Ok(from_str(xml)?)
    }

    pub async fn fetch(client: &reqwest::Client, url: &str) -> ModboxResult<Self> {
        info!("Fetching Maven metadata from {}", url);

        let resp = client
            .get(url)
            .header("Accept", "application/xml")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ModboxError::RegistryStatus {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let xml = resp.text().await?;
        Self::parse(&xml)
    }

    pub fn versions(&self) -> &[String] {
        &self.versioning.versions.items
    }

    pub fn release(&self) -> &str {
        self.versioning.release.as_deref().unwrap_or_default()
    }

    pub fn latest(&self) -> &str {
        self.versioning.latest.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fabric_loader_metadata() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>net.fabricmc</groupId>
  <artifactId>fabric-loader</artifactId>
  <versioning>
    <latest>0.16.10</latest>
    <release>0.16.10</release>
    <versions>
      <version>0.15.11</version>
      <version>0.16.9</version>
      <version>0.16.10</version>
    </versions>
    <lastUpdated>20250101000000</lastUpdated>
  </versioning>
</metadata>"#;

        let meta = MavenMetadata::parse(xml).unwrap();
        assert_eq!(meta.artifact_id.as_deref(), Some("fabric-loader"));
        assert_eq!(meta.versions(), ["0.15.11", "0.16.9", "0.16.10"]);
        assert_eq!(meta.release(), "0.16.10");
        assert_eq!(meta.latest(), "0.16.10");
    }

    #[test]
    fn missing_versioning_parses_empty() {
        let meta = MavenMetadata::parse("<metadata><groupId>x</groupId></metadata>").unwrap();
        assert!(meta.versions().is_empty());
        assert_eq!(meta.release(), "");
    }
}
