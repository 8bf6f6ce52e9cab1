use std::cmp::Ordering;

/// A dotted library version such as `2.9.4-nightly-20150209` or `3.3.1`.
///
/// Segments are compared pairwise: numerically when both sides are plain
/// integers, lexicographically otherwise. When every shared segment is equal
/// the version with fewer segments is the lesser one.
#[derive(Debug, Clone)]
pub struct Version(String);

impl Version {
    pub fn new(v: &str) -> Self {
        Version(v.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

fn compare_segments(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut left = self.segments();
        let mut right = other.segments();

        loop {
            match (left.next(), right.next()) {
                (Some(a), Some(b)) => match compare_segments(a, b) {
                    Ordering::Equal => continue,
                    ord => return ord,
                },
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (None, None) => return Ordering::Equal,
            }
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Equality follows the ordering so that "1.01" and "1.1" agree.
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn compare_versions(a: &str, b: &str) -> Ordering {
    Version::new(a).cmp(&Version::new(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_sorting() {
        assert_eq!(compare_versions("1.0.0", "1.0.1"), Ordering::Less);
        assert_eq!(compare_versions("1.0.1", "1.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0.0", "1.0.0"), Ordering::Equal);

        // numeric, not lexicographic
        assert_eq!(compare_versions("1.2", "1.10"), Ordering::Less);
        assert_eq!(compare_versions("0.14.22", "0.14.21"), Ordering::Greater);
        assert_eq!(compare_versions("47.2.0", "47.1.0"), Ordering::Greater);

        // shorter prefix sorts first
        assert_eq!(compare_versions("1.20", "1.20.0"), Ordering::Less);
        assert_eq!(compare_versions("2.9.4", "2.9"), Ordering::Greater);
    }

    #[test]
    fn test_non_numeric_segments_compare_lexicographically() {
        assert_eq!(
            compare_versions("2.9.4-nightly-20150209", "2.9.4-nightly-20140409"),
            Ordering::Greater
        );
        assert_eq!(compare_versions("1.0.a", "1.0.b"), Ordering::Less);
        assert_eq!(compare_versions("3.2.2", "3.2.2-SNAPSHOT"), Ordering::Less);
    }

    #[test]
    fn test_ordering_properties() {
        let samples = ["1.0", "1.2", "1.10", "1.10.1", "2.0", "2.0.0"];
        for a in samples {
            assert_eq!(compare_versions(a, a), Ordering::Equal);
            for b in samples {
                assert_eq!(compare_versions(a, b), compare_versions(b, a).reverse());
                for c in samples {
                    if compare_versions(a, b) == Ordering::Less
                        && compare_versions(b, c) == Ordering::Less
                    {
                        assert_eq!(compare_versions(a, c), Ordering::Less);
                    }
                }
            }
        }
    }

    #[test]
    fn test_leading_zeroes_are_equal() {
        assert_eq!(Version::new("1.01"), Version::new("1.1"));
    }
}
