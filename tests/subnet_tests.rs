use lanwatch::errors::NetworkDiscoveryError;
use lanwatch::net::interface::{enumerate, parse_subnet, resolve_subnet, select_local_network};
use std::net::Ipv4Addr;

fn addrs(list: &[&str]) -> Vec<Ipv4Addr> {
    list.iter().map(|a| a.parse().unwrap()).collect()
}

#[test]
fn test_slash_30_includes_network_and_broadcast() {
    let network = parse_subnet("192.168.1.0/30").unwrap();
    assert_eq!(
        enumerate(&network),
        addrs(&["192.168.1.0", "192.168.1.1", "192.168.1.2", "192.168.1.3"])
    );
}

#[test]
fn test_block_sizes_match_prefix() {
    for (subnet, expected) in [("10.0.0.0/24", 256), ("10.0.0.0/31", 2), ("10.0.0.0/32", 1), ("10.0.0.0/22", 1024)] {
        let network = parse_subnet(subnet).unwrap();
        assert_eq!(enumerate(&network).len(), expected, "{}", subnet);
    }
}

#[test]
fn test_every_address_lies_inside_the_block() {
    let network = parse_subnet("172.16.4.0/23").unwrap();
    let all = enumerate(&network);
    assert_eq!(all.first(), Some(&Ipv4Addr::new(172, 16, 4, 0)));
    assert_eq!(all.last(), Some(&Ipv4Addr::new(172, 16, 5, 255)));
    assert!(all.iter().all(|a| network.contains(a)));
}

#[test]
fn test_host_bits_are_truncated() {
    let network = parse_subnet("192.168.1.77/24").unwrap();
    assert_eq!(network.to_string(), "192.168.1.0/24");
}

#[test]
fn test_bare_address_is_single_host() {
    let network = parse_subnet(" 192.168.1.5 ").unwrap();
    assert_eq!(enumerate(&network), addrs(&["192.168.1.5"]));
}

#[test]
fn test_invalid_subnets_are_rejected() {
    for bad in ["192.168.1.0/33", "192.168.1/24", "not-a-subnet", "fe80::1/64"] {
        assert!(
            matches!(parse_subnet(bad), Err(NetworkDiscoveryError::InvalidSubnet { .. })),
            "{} should be rejected",
            bad
        );
    }
}

#[test]
fn test_explicit_subnet_wins_over_autodetect() {
    let network = resolve_subnet(Some("10.9.8.0/29")).unwrap();
    assert_eq!(enumerate(&network).len(), 8);
}

#[test]
fn test_local_network_skips_loopback_and_link_local() {
    let candidates = vec![
        (Ipv4Addr::new(127, 0, 0, 1), Some(Ipv4Addr::new(255, 0, 0, 0))),
        (Ipv4Addr::new(169, 254, 10, 3), Some(Ipv4Addr::new(255, 255, 0, 0))),
        (Ipv4Addr::new(192, 168, 50, 23), Some(Ipv4Addr::new(255, 255, 255, 0))),
        (Ipv4Addr::new(10, 0, 0, 5), Some(Ipv4Addr::new(255, 0, 0, 0))),
    ];
    let network = select_local_network(candidates).unwrap();
    assert_eq!(network.to_string(), "192.168.50.0/24");
}

#[test]
fn test_local_network_requires_a_netmask() {
    let candidates = vec![
        (Ipv4Addr::new(192, 168, 50, 23), None),
        (Ipv4Addr::new(10, 1, 2, 3), Some(Ipv4Addr::new(255, 255, 240, 0))),
    ];
    assert_eq!(select_local_network(candidates).unwrap().to_string(), "10.1.0.0/20");
}

#[test]
fn test_no_usable_interface() {
    let candidates = vec![
        (Ipv4Addr::new(127, 0, 0, 1), Some(Ipv4Addr::new(255, 0, 0, 0))),
        (Ipv4Addr::new(169, 254, 1, 1), Some(Ipv4Addr::new(255, 255, 0, 0))),
    ];
    assert_eq!(select_local_network(candidates), None);
}

#[test]
fn test_oversized_blocks_are_refused() {
    for huge in ["10.0.0.0/8", "0.0.0.0/0", "172.16.0.0/15"] {
        assert!(
            matches!(resolve_subnet(Some(huge)), Err(NetworkDiscoveryError::InvalidSubnet { .. })),
            "{} should be refused",
            huge
        );
    }
    let largest = resolve_subnet(Some("172.16.0.0/16")).unwrap();
    assert_eq!(largest.prefix_len(), 16);
}
