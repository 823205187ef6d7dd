// utils.rs: address encoding and cidr list parsing
use crate::error::CidrSetError;
use ipnet::IpNet;
use std::net::IpAddr;

/// Width of the fixed `::ffff:0:0/96` prefix under which ipv4 lives in the
/// unified keyspace. Masks declared against a 32 bit address gain this many
/// bits so every comparison runs at 128 bit width.
pub const V4_MAPPED_BITS: u32 = 96;

/// Encode an address into the 128 bit keyspace. Ipv6 bits are taken verbatim;
/// ipv4 occupies the low 32 bits under the mapped prefix, so the two families
/// never collide.
pub fn ip_to_key(ip: &IpAddr) -> u128 {
    match ip {
        IpAddr::V4(v4) => u128::from(v4.to_ipv6_mapped()),
        IpAddr::V6(v6) => u128::from(*v6),
    }
}

/// Encode raw big-endian address bytes. Anything other than 4 or 16 octets is
/// not an address.
pub fn octets_to_key(octets: &[u8]) -> Result<u128, CidrSetError> {
    if let Ok(v4) = <[u8; 4]>::try_from(octets) {
        Ok(ip_to_key(&IpAddr::from(v4)))
    } else if let Ok(v6) = <[u8; 16]>::try_from(octets) {
        Ok(ip_to_key(&IpAddr::from(v6)))
    } else {
        Err(CidrSetError::InvalidAddress(octets.len()))
    }
}

/// Encode a network into its (key, prefix length) pair in the unified
/// keyspace. Host bits below the mask are zeroed.
pub fn ipnet_to_key(net: &IpNet) -> (u128, u32) {
    let prefix = match net {
        IpNet::V4(n) => u32::from(n.prefix_len()) + V4_MAPPED_BITS,
        IpNet::V6(n) => u32::from(n.prefix_len()),
    };
    (ip_to_key(&net.network()), prefix)
}

/// Parse one ip or cidr token. A bare address defaults to a full-length host
/// mask (/32 or /128).
pub fn parse_ip_cidr(token: &str) -> Result<IpNet, CidrSetError> {
    let token = token.trim();
    let parsed = if token.contains('/') {
        token.parse::<IpNet>().ok()
    } else {
        token.parse::<IpAddr>().ok().map(IpNet::from)
    };
    parsed.ok_or_else(|| CidrSetError::Parse {
        token: token.to_string(),
    })
}

/// Split a comma separated list of ips and/or cidrs, trimming whitespace per
/// token. Any malformed token fails the whole list.
pub fn parse_ip_cidr_list(raw: &str) -> Result<Vec<IpNet>, CidrSetError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',').map(parse_ip_cidr).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn net(s: &str) -> IpNet {
        IpNet::from_str(s).unwrap()
    }

    #[test]
    fn test_ipv4_key_sits_under_mapped_prefix() {
        let key = ip_to_key(&"1.2.3.4".parse().unwrap());
        assert_eq!(key, (0xffffu128 << 32) | 0x0102_0304);
    }

    #[test]
    fn test_ipnet_to_key_known_values() {
        // (cidr, key, normalized prefix)
        let cases: &[(&str, u128, u32)] = &[
            ("127.0.0.0/24", 0xffff_7f00_0000, 120),
            ("255.255.0.0/16", 0xffff_ffff_0000, 112),
            ("ffff::ffff:ffff/120", (0xffffu128 << 112) | 0xffff_ff00, 120),
            ("ffff:ffff:ffff::ffff:ffff/32", 0xffff_ffffu128 << 96, 32),
        ];
        for &(cidr, key, prefix) in cases {
            assert_eq!(ipnet_to_key(&net(cidr)), (key, prefix), "{cidr}");
        }
    }

    #[test]
    fn test_ipnet_to_key_zeroes_host_bits() {
        assert_eq!(
            ipnet_to_key(&net("192.168.1.42/24")),
            ipnet_to_key(&net("192.168.1.0/24"))
        );
        assert_eq!(
            ipnet_to_key(&net("dead:beef::1/64")),
            ipnet_to_key(&net("dead:beef::/64"))
        );
    }

    #[test]
    fn test_ipnet_to_key_mask_normalization() {
        assert_eq!(ipnet_to_key(&net("10.0.0.0/8")).1, 104);
        assert_eq!(ipnet_to_key(&net("0.0.0.0/0")).1, 96);
        assert_eq!(ipnet_to_key(&net("1.2.3.4/32")).1, 128);
        assert_eq!(ipnet_to_key(&net("::/0")).1, 0);
        assert_eq!(ipnet_to_key(&net("::1/128")).1, 128);
    }

    #[test]
    fn test_octets_to_key_accepts_4_and_16_bytes() {
        assert_eq!(
            octets_to_key(&[127, 0, 0, 1]).unwrap(),
            ip_to_key(&"127.0.0.1".parse().unwrap())
        );
        let v6: IpAddr = "dead::beef".parse().unwrap();
        let octets = match v6 {
            IpAddr::V6(a) => a.octets(),
            IpAddr::V4(_) => unreachable!(),
        };
        assert_eq!(octets_to_key(&octets).unwrap(), ip_to_key(&v6));
    }

    #[test]
    fn test_octets_to_key_rejects_other_lengths() {
        for len in [0usize, 3, 5, 15, 17] {
            let bytes = vec![0u8; len];
            assert_eq!(
                octets_to_key(&bytes),
                Err(CidrSetError::InvalidAddress(len)),
                "length {len}"
            );
        }
    }

    #[test]
    fn test_parse_bare_address_gets_host_mask() {
        assert_eq!(parse_ip_cidr("1.2.3.4").unwrap(), net("1.2.3.4/32"));
        assert_eq!(parse_ip_cidr("dead::beef").unwrap(), net("dead::beef/128"));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(parse_ip_cidr(" 10.0.0.0/8 ").unwrap(), net("10.0.0.0/8"));
        assert_eq!(parse_ip_cidr("\t::1\n").unwrap(), net("::1/128"));
    }

    #[test]
    fn test_parse_rejects_bad_tokens() {
        for bad in ["", "banana", "10.0.0.0/33", "1.2.3", "dead::/129", "10.0.0.0/"] {
            let err = parse_ip_cidr(bad).unwrap_err();
            assert_eq!(
                err,
                CidrSetError::Parse {
                    token: bad.trim().to_string()
                }
            );
        }
    }

    #[test]
    fn test_parse_list() {
        let nets = parse_ip_cidr_list("10.0.0.0/8, 192.168.1.1 ,dead::/64").unwrap();
        assert_eq!(
            nets,
            vec![net("10.0.0.0/8"), net("192.168.1.1/32"), net("dead::/64")]
        );
        assert!(parse_ip_cidr_list("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_list_fails_on_first_bad_token() {
        let err = parse_ip_cidr_list("10.0.0.0/8,banana,1.1.1.1").unwrap_err();
        assert_eq!(
            err,
            CidrSetError::Parse {
                token: "banana".to_string()
            }
        );
    }
}
