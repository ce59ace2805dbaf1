use crate::constants::{OUI_PREFIX_LEN, OUI_SEPARATOR, UNKNOWN};
use std::path::Path;
use tracing::{debug, warn};

/// OUI (Organizationally Unique Identifier) table for MAC address vendor lookup
pub mod oui {
    use super::*;

    /// Vendor table loaded from a plain-text file, one vendor record per line
    ///
    /// Lines look like `00-00-0C   (hex)        Cisco Systems, Inc`: the MAC
    /// prefix appears literally somewhere in the line and the vendor name
    /// follows the last fixed-width separator. The table is immutable once
    /// loaded and shared between workers without locking.
    #[derive(Debug, Clone, Default)]
    pub struct MacVendorDatabase {
        lines: Vec<String>,
    }

    impl MacVendorDatabase {
        /// Load the table; a missing or unreadable file yields an empty table
        pub fn load(path: impl AsRef<Path>) -> Self {
            let path = path.as_ref();
            match std::fs::read(path) {
                Ok(bytes) => {
                    let db = Self::parse(&String::from_utf8_lossy(&bytes));
                    debug!("loaded {} OUI records from {}", db.len(), path.display());
                    db
                }
                Err(e) => {
                    warn!(
                        "OUI table {} unavailable ({}); vendors will be Unknown",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            }
        }

        pub fn parse(content: &str) -> Self {
            Self {
                lines: content
                    .lines()
                    .filter(|l| !l.trim().is_empty())
                    .map(str::to_string)
                    .collect(),
            }
        }

        pub fn len(&self) -> usize {
            self.lines.len()
        }

        pub fn is_empty(&self) -> bool {
            self.lines.is_empty()
        }

        /// Vendor of the first line containing the MAC's hyphenated prefix
        pub fn lookup_vendor(&self, mac: &str) -> Option<String> {
            let prefix = vendor_prefix(mac)?;
            let line = self.lines.iter().find(|line| line.contains(&prefix))?;
            let vendor = line
                .rsplit(OUI_SEPARATOR)
                .next()
                .unwrap_or(line.as_str())
                .trim();
            (!vendor.is_empty()).then(|| vendor.to_string())
        }

        /// Like [`Self::lookup_vendor`] but falls back to `"Unknown"`
        pub fn vendor_or_unknown(&self, mac: &str) -> String {
            self.lookup_vendor(mac)
                .unwrap_or_else(|| UNKNOWN.to_string())
        }
    }

    /// `aa:bb:cc:dd:ee:ff` -> `AA-BB-CC`
    pub fn vendor_prefix(mac: &str) -> Option<String> {
        if mac.is_empty() || mac == UNKNOWN {
            return None;
        }
        let hyphenated = mac.to_uppercase().replace(':', "-");
        hyphenated.get(..OUI_PREFIX_LEN).map(str::to_string)
    }

    /// Normalize a MAC address to upper-case colon form (XX:XX:XX:XX:XX:XX)
    ///
    /// Accepts colon, hyphen and dot separated forms as well as twelve bare
    /// hex digits. Single-digit octets (`0:1b:...`, as printed by BSD `arp`)
    /// are zero padded.
    pub fn normalize_mac(mac: &str) -> Option<String> {
        let clean = mac.trim().replace(['-', '.'], ":");
        let parts: Vec<&str> = clean.split(':').collect();

        let octets: Vec<String> = if parts.len() == 6 {
            parts
                .iter()
                .map(|p| {
                    if (1..=2).contains(&p.len()) && p.chars().all(|c| c.is_ascii_hexdigit()) {
                        Some(format!("{:0>2}", p.to_uppercase()))
                    } else {
                        None
                    }
                })
                .collect::<Option<Vec<_>>>()?
        } else {
            let raw: String = parts.concat();
            if raw.len() != 12 || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
                return None;
            }
            raw.as_bytes()
                .chunks(2)
                .map(|chunk| String::from_utf8_lossy(chunk).to_uppercase())
                .collect()
        };

        Some(octets.join(":"))
    }
}
