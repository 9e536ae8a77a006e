use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use pnet::util::MacAddr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid MAC address: {0}")]
pub struct MacParseError(pub String);

/// A link-layer address in canonical form.
///
/// Accepts the notations network gear prints (`aabb.ccdd.eeff`, `aa-bb-cc-dd-ee-ff`,
/// `AA:BB:CC:DD:EE:FF`, `aabbccddeeff`) and always displays as lowercase
/// colon-separated hex, so tables scraped from different commands join on equal keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress(MacAddr);

impl MacAddress {
    pub fn octets(&self) -> [u8; 6] {
        let MacAddr(a, b, c, d, e, f) = self.0;
        [a, b, c, d, e, f]
    }
}

impl From<MacAddr> for MacAddress {
    fn from(mac: MacAddr) -> Self {
        Self(mac)
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(o: [u8; 6]) -> Self {
        Self(MacAddr::new(o[0], o[1], o[2], o[3], o[4], o[5]))
    }
}

impl FromStr for MacAddress {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex: String = trimmed
            .chars()
            .filter(|c| !matches!(c, '.' | ':' | '-'))
            .collect();

        if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(MacParseError(trimmed.to_string()));
        }

        let mut octets = [0u8; 6];
        for (idx, octet) in octets.iter_mut().enumerate() {
            let pair = &hex[idx * 2..idx * 2 + 2];
            *octet = u8::from_str_radix(pair, 16).map_err(|_| MacParseError(trimmed.to_string()))?;
        }

        Ok(Self::from(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Ord for MacAddress {
    fn cmp(&self, other: &Self) -> Ordering {
        self.octets().cmp(&other.octets())
    }
}

impl PartialOrd for MacAddress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cisco_dotted_form_is_canonicalised() {
        let mac: MacAddress = "AABB.CC00.0101".parse().unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:00:01:01");
    }

    #[test]
    fn every_notation_yields_the_same_key() {
        let forms = ["aabb.ccdd.ee01", "aa-bb-cc-dd-ee-01", "AA:BB:CC:DD:EE:01", "aabbccddee01"];
        let parsed: Vec<MacAddress> = forms.iter().map(|f| f.parse().unwrap()).collect();
        assert!(parsed.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn rejects_garbage() {
        assert!("aabb.ccdd".parse::<MacAddress>().is_err());
        assert!("zzbb.ccdd.eeff".parse::<MacAddress>().is_err());
        assert!("".parse::<MacAddress>().is_err());
    }

    #[test]
    fn orders_by_octets() {
        let low: MacAddress = "00:00:00:00:00:0f".parse().unwrap();
        let high: MacAddress = "00:00:00:00:01:00".parse().unwrap();
        assert!(low < high);
    }
}
