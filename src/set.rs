// set.rs: membership set of ipv4/ipv6 networks
use crate::error::CidrSetError;
use crate::tree::PatriciaTree;
use crate::utils::{ip_to_key, ipnet_to_key, octets_to_key, parse_ip_cidr_list};
use ipnet::IpNet;
use std::net::{IpAddr, Ipv4Addr};

/// Set of cidr blocks answering whether an address is covered by any of them.
///
/// Both families share one trie: ipv4 entries occupy the mapped slice of the
/// 128 bit keyspace, so a v4 block never matches a v6 address or vice versa.
/// Intended use is build-once-read-many: populate the set on one thread, then
/// hand the finished value to any number of readers.
#[derive(Debug, Clone, Default)]
pub struct CidrSet {
    tree: PatriciaTree,
    len: usize,
}

impl CidrSet {
    pub fn new() -> Self {
        CidrSet::default()
    }

    /// Build a set from a list of cidr blocks. The contained region is the
    /// union of the blocks whatever the insertion order.
    pub fn from_cidrs(cidrs: &[IpNet]) -> Self {
        let mut set = CidrSet::new();
        for cidr in cidrs {
            set.insert(*cidr);
        }
        set
    }

    /// Build a set from a comma separated list of ips and/or cidrs. A bare
    /// address counts as a /32 or /128 host entry. Any malformed token fails
    /// the whole construction; no partially built set is returned.
    pub fn from_csv(raw: &str) -> Result<Self, CidrSetError> {
        Ok(CidrSet::from_cidrs(&parse_ip_cidr_list(raw)?))
    }

    /// Insert one block. Host bits below the mask are ignored.
    pub fn insert(&mut self, cidr: IpNet) {
        let (key, prefix) = ipnet_to_key(&cidr);
        self.tree.insert(key, prefix);
        self.len += 1;
    }

    /// Whether `ip` is covered by any inserted block.
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.tree.contains(ip_to_key(&ip))
    }

    /// Raw-byte variant of `contains`. Bytes that do not encode an address
    /// (anything but 4 or 16 octets) are not contained in anything, so this
    /// never fails on untrusted input.
    pub fn contains_octets(&self, octets: &[u8]) -> bool {
        match octets_to_key(octets) {
            Ok(key) => self.tree.contains(key),
            Err(_) => false,
        }
    }

    /// Numeric big-endian ipv4 variant of `contains`.
    pub fn contains_raw_ipv4(&self, raw: u32) -> bool {
        self.contains(IpAddr::V4(Ipv4Addr::from(raw)))
    }

    /// Number of entries inserted so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn set_of(cidrs: &[&str]) -> CidrSet {
        CidrSet::from_cidrs(
            &cidrs
                .iter()
                .map(|s| IpNet::from_str(s).unwrap())
                .collect::<Vec<_>>(),
        )
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_empty_set() {
        let set = CidrSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert!(!set.contains(ip("1.2.3.4")));
        assert!(!set.contains(ip("::1")));
    }

    #[test]
    fn test_from_csv() {
        let set = CidrSet::from_csv(" 10.0.0.0/8 , 192.168.1.1 ,dead::/64, cafe::1").unwrap();
        assert_eq!(set.len(), 4);
        assert!(set.contains(ip("10.20.30.40")));
        assert!(set.contains(ip("192.168.1.1")));
        assert!(!set.contains(ip("192.168.1.2")));
        assert!(set.contains(ip("dead::beef")));
        assert!(set.contains(ip("cafe::1")));
        assert!(!set.contains(ip("cafe::2")));
    }

    #[test]
    fn test_from_csv_empty_input() {
        let set = CidrSet::from_csv("").unwrap();
        assert!(set.is_empty());
        assert!(!set.contains(ip("0.0.0.0")));
    }

    #[test]
    fn test_from_csv_is_all_or_nothing() {
        let err = CidrSet::from_csv("10.0.0.0/8,not-an-ip,1.1.1.1").unwrap_err();
        assert_eq!(
            err,
            CidrSetError::Parse {
                token: "not-an-ip".to_string()
            }
        );
    }

    #[test]
    fn test_insert_with_host_bits() {
        let set = set_of(&["192.168.1.42/24"]);
        assert!(set.contains(ip("192.168.1.1")));
        assert!(set.contains(ip("192.168.1.255")));
        assert!(!set.contains(ip("192.168.2.1")));
    }

    #[test]
    fn test_families_never_cross_match() {
        // same leading bits in-family, distinct keys in the unified space
        let set = set_of(&["1.0.0.0/30", "100::/30"]);
        assert!(set.contains(ip("1.0.0.1")));
        assert!(set.contains(ip("100::1")));
        assert!(!set.contains(ip("2.0.0.1")));
        assert!(!set.contains(ip("101::1")));
        // a v6 probe never lands in the v4 block and vice versa
        assert!(!set.contains(ip("1::1")));
        assert!(!set.contains(ip("64:ff9b::1.0.0.1")));
    }

    #[test]
    fn test_v4_mapped_v6_probe_hits_v4_block() {
        // ::ffff:a.b.c.d is the mapped slice itself, so it does land
        let set = set_of(&["1.0.0.0/30"]);
        assert!(set.contains(ip("::ffff:1.0.0.1")));
    }

    #[test]
    fn test_contains_raw_ipv4() {
        let set = set_of(&["127.0.0.0/24"]);
        assert!(set.contains_raw_ipv4(0x7f00_0001));
        assert!(set.contains_raw_ipv4(0x7f00_00ff));
        assert!(!set.contains_raw_ipv4(0x7f00_0100));
        assert!(!set.contains_raw_ipv4(0x0100_0001));
    }

    #[test]
    fn test_contains_octets() {
        let set = set_of(&["127.0.0.0/24", "dead::/64"]);
        assert!(set.contains_octets(&[127, 0, 0, 1]));
        assert!(!set.contains_octets(&[128, 0, 0, 1]));

        let probe: IpAddr = ip("dead::42");
        if let IpAddr::V6(v6) = probe {
            assert!(set.contains_octets(&v6.octets()));
        }

        // garbage lengths are never contained
        assert!(!set.contains_octets(&[]));
        assert!(!set.contains_octets(&[127, 0, 0]));
        assert!(!set.contains_octets(&[127, 0, 0, 0, 1]));
        assert!(!set.contains_octets(&[0; 17]));
    }

    #[test]
    fn test_len_counts_insertions() {
        let mut set = CidrSet::new();
        set.insert(IpNet::from_str("10.0.0.0/8").unwrap());
        set.insert(IpNet::from_str("10.0.0.0/24").unwrap());
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
    }
}
