//! Hostname resolution capability.
//!
//! Workers only see the [`Resolve`] trait, so tests can inject a deterministic
//! resolver. [`SystemResolver`] goes through the platform's `getaddrinfo` via
//! [`ToSocketAddrs`].

use crate::config::ResolutionMode;
use std::net::{IpAddr, ToSocketAddrs};

/// Outcome of resolving one hostname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressResult {
    /// At least one address was found.
    Success {
        /// First address returned.
        primary: IpAddr,
        /// Remaining addresses (all-addresses mode only).
        additional: Vec<IpAddr>,
    },
    /// Resolution failed. `partial` carries any addresses discovered before
    /// the failure was reported; they are written out as-is.
    Failure {
        /// Addresses found before the failure.
        partial: Vec<IpAddr>,
    },
}

impl AddressResult {
    /// A failure with no partial addresses.
    #[must_use]
    pub const fn failure() -> Self {
        Self::Failure {
            partial: Vec::new(),
        }
    }

    /// Builds a result from a list of addresses: the first becomes the
    /// primary, an empty list is a failure.
    #[must_use]
    pub fn from_addrs(addrs: Vec<IpAddr>) -> Self {
        let mut addrs = addrs.into_iter();
        addrs.next().map_or_else(Self::failure, |primary| Self::Success {
            primary,
            additional: addrs.collect(),
        })
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Resolves hostnames to addresses.
///
/// Implementations are shared by every resolver worker and must tolerate
/// concurrent calls.
pub trait Resolve: Send + Sync {
    /// Resolves `hostname` according to `mode`.
    fn resolve(&self, hostname: &str, mode: ResolutionMode) -> AddressResult;
}

impl<F> Resolve for F
where
    F: Fn(&str, ResolutionMode) -> AddressResult + Send + Sync,
{
    fn resolve(&self, hostname: &str, mode: ResolutionMode) -> AddressResult {
        self(hostname, mode)
    }
}

/// Resolver backed by the operating system (`getaddrinfo`).
///
/// In [`ResolutionMode::Single`] only the first IPv4 address is reported.
/// In [`ResolutionMode::All`] every distinct address is reported in the order
/// the system returned it, IPv6 included.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SystemResolver {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Resolve for SystemResolver {
    fn resolve(&self, hostname: &str, mode: ResolutionMode) -> AddressResult {
        let addrs = match (hostname, 0u16).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                tracing::debug!(hostname = %hostname, error = %e, "getaddrinfo failed");
                return AddressResult::failure();
            }
        };

        match mode {
            ResolutionMode::Single => addrs
                .map(|sa| sa.ip())
                .find(IpAddr::is_ipv4)
                .map_or_else(AddressResult::failure, |primary| AddressResult::Success {
                    primary,
                    additional: Vec::new(),
                }),
            ResolutionMode::All => {
                let mut unique: Vec<IpAddr> = Vec::new();
                for ip in addrs.map(|sa| sa.ip()) {
                    if !unique.contains(&ip) {
                        unique.push(ip);
                    }
                }
                AddressResult::from_addrs(unique)
            }
        }
    }
}
