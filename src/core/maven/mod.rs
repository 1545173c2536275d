mod metadata;

pub use metadata::{MavenMetadata, VersionList, Versioning};

/// Maven repositories publishing mod loader releases.
pub const FABRIC_MAVEN: &str = "https://maven.fabricmc.net";
pub const QUILT_MAVEN: &str = "https://maven.quiltmc.org/repository/release";
pub const NEOFORGE_MAVEN: &str = "https://maven.neoforged.net/releases";

/// URL of `maven-metadata.xml` for `group:artifact` under `repo_base`.
pub fn metadata_url(repo_base: &str, group_id: &str, artifact_id: &str) -> String {
    format!(
        "{}/{}/{}/maven-metadata.xml",
        repo_base.trim_end_matches('/'),
        group_id.replace('.', "/"),
        artifact_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_url_construction() {
        assert_eq!(
            metadata_url(FABRIC_MAVEN, "net.fabricmc", "fabric-loader"),
            "https://maven.fabricmc.net/net/fabricmc/fabric-loader/maven-metadata.xml"
        );
        assert_eq!(
            metadata_url("https://repo.example/", "org.quiltmc", "quilt-loader"),
            "https://repo.example/org/quiltmc/quilt-loader/maven-metadata.xml"
        );
    }
}
