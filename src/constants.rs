/// Placeholder stored in any host field that could not be resolved
pub const UNKNOWN: &str = "Unknown";

/// Default location of the OUI vendor table
pub const DEFAULT_OUI_FILE: &str = "mac-vendors.txt";

/// Separator between the prefix columns and the vendor name in the OUI table
pub const OUI_SEPARATOR: &str = "        ";

/// Number of characters of a hyphenated MAC that make up the vendor prefix (`AA-BB-CC`)
pub const OUI_PREFIX_LEN: usize = 8;

/// Ports probed when the configuration does not name any
pub const DEFAULT_PORTS: &[u16] = &[
    22,   // SSH
    80,   // HTTP
    443,  // HTTPS
    445,  // SMB
    3389, // RDP
    8080, // HTTP-Proxy
];

/// NetBIOS suffix of the workstation service name record
pub const NETBIOS_WORKSTATION: &str = "<00>";

/// NetBIOS flag of a name owned by a single host
pub const NETBIOS_UNIQUE: &str = "UNIQUE";

/// Latency in milliseconds above which a reachable host counts as slow
pub const HIGH_LATENCY_MS: f64 = 200.0;

/// Shortest prefix accepted as a scan target (65,536 addresses)
pub const MIN_PREFIX_LEN: u8 = 16;
