/// Maven-style library coordinates (`group:artifact:version[:classifier][@extension]`)
use crate::error::ProfileError;
use crate::utils::version::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::str::FromStr;

/// Parsed library coordinate.
///
/// Two specifiers name "the same library" when group, artifact and classifier
/// match; the version is what merges reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionSpecifier {
    group: String,
    artifact: String,
    version: String,
    classifier: Option<String>,
    extension: String,
}

impl VersionSpecifier {
    pub fn parse(text: &str) -> Result<Self, ProfileError> {
        let invalid = |reason: &str| ProfileError::InvalidSpecifier {
            coordinate: text.to_string(),
            reason: reason.to_string(),
        };

        let (coords, extension) = match text.split_once('@') {
            Some((coords, ext)) if !ext.is_empty() => (coords, ext.to_string()),
            Some(_) => return Err(invalid("empty extension")),
            None => (text, "jar".to_string()),
        };

        let parts: Vec<&str> = coords.split(':').collect();
        if parts.len() < 2 {
            return Err(invalid("expected at least group:artifact"));
        }
        if parts.len() > 4 {
            return Err(invalid("too many ':' separated segments"));
        }

        let group = parts[0].trim();
        let artifact = parts[1].trim();
        if group.is_empty() {
            return Err(invalid("empty group"));
        }
        if artifact.is_empty() {
            return Err(invalid("empty artifact"));
        }

        let version = parts.get(2).map(|v| v.trim()).unwrap_or_default();
        let classifier = parts
            .get(3)
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: version.to_string(),
            classifier,
            extension,
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// `group:artifact`
    pub fn artifact_prefix(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }

    /// Version-independent identity: `group:artifact[:classifier]`.
    pub fn key(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!("{}:{}:{}", self.group, self.artifact, classifier),
            None => self.artifact_prefix(),
        }
    }

    pub fn same_library(&self, other: &VersionSpecifier) -> bool {
        self.group == other.group
            && self.artifact == other.artifact
            && self.classifier == other.classifier
    }

    /// Compare versions. Only meaningful between specifiers of the same library.
    pub fn compare_version(&self, other: &VersionSpecifier) -> Ordering {
        Version::new(&self.version).cmp(&Version::new(&other.version))
    }

    pub fn with_classifier(&self, classifier: &str) -> Self {
        let mut spec = self.clone();
        spec.classifier = Some(classifier.to_string());
        spec
    }

    /// Relative storage path: `group/as/dirs/artifact/version/artifact-version[-classifier].ext`.
    /// A `${arch}` placeholder inside the classifier is kept verbatim.
    pub fn to_path(&self) -> String {
        let file_name = match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact, self.version, classifier, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact, self.version, self.extension),
        };

        format!(
            "{}/{}/{}/{}",
            self.group.replace('.', "/"),
            self.artifact,
            self.version,
            file_name
        )
    }
}

impl std::fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)?;
        if !self.version.is_empty() || self.classifier.is_some() {
            write!(f, ":{}", self.version)?;
        }
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        if self.extension != "jar" {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}

impl FromStr for VersionSpecifier {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionSpecifier::parse(s)
    }
}

impl Serialize for VersionSpecifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionSpecifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        VersionSpecifier::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(s: &str) -> VersionSpecifier {
        VersionSpecifier::parse(s).unwrap()
    }

    #[test]
    fn test_parse_full_coordinate() {
        let s = spec("org.lwjgl.lwjgl:lwjgl-platform:2.9.4-nightly-20150209:natives-linux");
        assert_eq!(s.group(), "org.lwjgl.lwjgl");
        assert_eq!(s.artifact(), "lwjgl-platform");
        assert_eq!(s.version(), "2.9.4-nightly-20150209");
        assert_eq!(s.classifier(), Some("natives-linux"));
        assert_eq!(s.extension(), "jar");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(VersionSpecifier::parse("justagroup").is_err());
        assert!(VersionSpecifier::parse(":artifact:1.0").is_err());
        assert!(VersionSpecifier::parse("group::1.0").is_err());
        assert!(VersionSpecifier::parse("a:b:c:d:e").is_err());
        assert!(VersionSpecifier::parse("a:b:1.0@").is_err());
    }

    #[test]
    fn test_version_is_optional() {
        let s = spec("com.mojang:realms");
        assert_eq!(s.version(), "");
        assert_eq!(s.key(), "com.mojang:realms");
    }

    #[test]
    fn test_same_library_ignores_version_only() {
        assert!(spec("a:b:1.0").same_library(&spec("a:b:2.0")));
        assert!(!spec("a:b:1.0:natives-linux").same_library(&spec("a:b:1.0:natives-osx")));
        assert!(!spec("a:b:1.0").same_library(&spec("a:b:1.0:sources")));
    }

    #[test]
    fn test_to_path() {
        assert_eq!(
            spec("com.google.guava:guava:21.0").to_path(),
            "com/google/guava/guava/21.0/guava-21.0.jar"
        );
        assert_eq!(
            spec("org.lwjgl.lwjgl:lwjgl-platform:2.9.1:natives-windows-${arch}").to_path(),
            "org/lwjgl/lwjgl/lwjgl-platform/2.9.1/lwjgl-platform-2.9.1-natives-windows-${arch}.jar"
        );
        assert_eq!(
            spec("net.minecraftforge:forge:1.7.10:universal@zip").to_path(),
            "net/minecraftforge/forge/1.7.10/forge-1.7.10-universal.zip"
        );
    }

    #[test]
    fn test_display_round_trips() {
        for raw in ["a:b:1.0", "a:b:1.0:natives", "a:b:1.0@zip", "a:b"] {
            assert_eq!(spec(raw).to_string(), raw);
        }
    }

    #[test]
    fn test_compare_version() {
        assert_eq!(spec("a:b:1.2").compare_version(&spec("a:b:1.10")), Ordering::Less);
        assert_eq!(spec("a:b:1.2").compare_version(&spec("a:b:1.2")), Ordering::Equal);
    }
}
