use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A candidate storage distribution: channel name -> byte size, annotated
/// with the throughput it was found to support. Sets of these are ordered
/// lexicographically by `(throughput, size-map)`.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageDistribution {
    sizes: BTreeMap<String, u64>,
    throughput: f64,
}

impl StorageDistribution {
    pub fn new(sizes: BTreeMap<String, u64>, throughput: f64) -> Self {
        Self { sizes, throughput }
    }

    pub fn sizes(&self) -> &BTreeMap<String, u64> {
        &self.sizes
    }

    pub fn throughput(&self) -> f64 {
        self.throughput
    }
}

impl Eq for StorageDistribution {}

impl PartialOrd for StorageDistribution {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StorageDistribution {
    fn cmp(&self, other: &Self) -> Ordering {
        self.throughput
            .total_cmp(&other.throughput)
            .then_with(|| self.sizes.cmp(&other.sizes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_throughput_then_sizes() {
        let a = StorageDistribution::new(BTreeMap::new(), 1.0);
        let b = StorageDistribution::new(BTreeMap::new(), 2.0);
        assert!(a < b);

        let mut s1 = BTreeMap::new();
        s1.insert("c".to_string(), 4u64);
        let mut s2 = BTreeMap::new();
        s2.insert("c".to_string(), 8u64);
        let c = StorageDistribution::new(s1, 1.0);
        let d = StorageDistribution::new(s2, 1.0);
        assert!(c < d);
    }
}
