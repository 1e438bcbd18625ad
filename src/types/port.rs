//! Port numbers and the inclusive port range a scan walks.
//!
//! Port 0 is not a scannable port, so `Port` wraps a `NonZeroU16` and every
//! value it can hold lies in 1-65535.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU16;

/// A scannable TCP/UDP port, 1-65535.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(NonZeroU16);

impl Port {
    /// `None` for port 0.
    pub const fn new(port: u16) -> Option<Self> {
        match NonZeroU16::new(port) {
            Some(port) => Some(Self(port)),
            None => None,
        }
    }

    pub const fn as_u16(self) -> u16 {
        self.0.get()
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<u32> for Port {
    type Error = PortError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        u16::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(PortError::OutOfRange(value))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.as_u16()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is outside 1-65535")]
    OutOfRange(u32),
    #[error("port range {0}-{1} ends before it starts")]
    InvalidRange(u16, u16),
}

/// `[start, end]`, both ends included, never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPortRange")]
pub struct PortRange {
    start: Port,
    end: Port,
}

/// Unchecked wire form of `PortRange`.
#[derive(Deserialize)]
struct RawPortRange {
    start: Port,
    end: Port,
}

impl TryFrom<RawPortRange> for PortRange {
    type Error = PortError;

    fn try_from(raw: RawPortRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl PortRange {
    pub fn new(start: Port, end: Port) -> Result<Self, PortError> {
        if end < start {
            return Err(PortError::InvalidRange(start.as_u16(), end.as_u16()));
        }
        Ok(Self { start, end })
    }

    pub const fn start(&self) -> Port {
        self.start
    }

    pub const fn end(&self) -> Port {
        self.end
    }

    pub const fn len(&self) -> usize {
        (self.end.as_u16() - self.start.as_u16()) as usize + 1
    }

    pub const fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, port: Port) -> bool {
        (self.start..=self.end).contains(&port)
    }

    /// Ports in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Port> {
        (self.start.as_u16()..=self.end.as_u16()).filter_map(Port::new)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.len() {
            1 => write!(f, "{}", self.start),
            _ => write!(f, "{}-{}", self.start, self.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(n: u16) -> Port {
        Port::new(n).unwrap()
    }

    #[test]
    fn test_zero_is_not_a_port() {
        assert!(Port::new(0).is_none());
        assert_eq!(port(65535).as_u16(), 65535);
        assert_eq!(Port::try_from(0u32), Err(PortError::OutOfRange(0)));
        assert_eq!(Port::try_from(65536u32), Err(PortError::OutOfRange(65536)));
        assert_eq!(u16::from(Port::try_from(443u32).unwrap()), 443);
    }

    #[test]
    fn test_serde_is_a_bare_number() {
        assert_eq!(serde_json::to_string(&port(8080)).unwrap(), "8080");
        assert_eq!(serde_json::from_str::<Port>("22").unwrap(), port(22));
        assert!(serde_json::from_str::<Port>("0").is_err());
    }

    #[test]
    fn test_range_bounds_inclusive() {
        let range = PortRange::new(port(20), port(25)).unwrap();
        assert_eq!(range.len(), 6);
        assert!(range.contains(port(20)));
        assert!(range.contains(port(25)));
        assert!(!range.contains(port(26)));
        assert_eq!(range.to_string(), "20-25");
    }

    #[test]
    fn test_single_port_range() {
        let range = PortRange::new(port(443), port(443)).unwrap();
        assert_eq!(range.len(), 1);
        assert_eq!(range.to_string(), "443");
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![port(443)]);
    }

    #[test]
    fn test_full_range() {
        let range = PortRange::new(port(1), port(65535)).unwrap();
        assert_eq!(range.len(), 65535);
        assert_eq!(range.iter().count(), 65535);
        assert_eq!(range.iter().last(), Some(port(65535)));
    }

    #[test]
    fn test_backwards_range_rejected() {
        assert_eq!(
            PortRange::new(port(90), port(80)),
            Err(PortError::InvalidRange(90, 80))
        );
    }

    #[test]
    fn test_backwards_range_rejected_when_deserializing() {
        let err = serde_json::from_str::<PortRange>(r#"{"start":90,"end":80}"#).unwrap_err();
        assert!(err.to_string().contains("ends before it starts"));

        let range: PortRange = serde_json::from_str(r#"{"start":80,"end":90}"#).unwrap();
        assert_eq!(range.len(), 11);
        assert_eq!(serde_json::to_string(&range).unwrap(), r#"{"start":80,"end":90}"#);
    }
}
