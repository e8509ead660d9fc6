//! Endpoint parsing.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A validated service endpoint.
///
/// Accepted shape: `http(s)://host[:port][/]`. Anything after the
/// authority except a lone `/` is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    https: bool,
}

impl Endpoint {
    pub fn parse(input: &str) -> Result<Self> {
        let (https, rest) = if let Some(rest) = input.strip_prefix("https://") {
            (true, rest)
        } else if let Some(rest) = input.strip_prefix("http://") {
            (false, rest)
        } else {
            return Err(Error::validation(format!(
                "endpoint {input:?} must start with http:// or https://"
            )));
        };

        let authority = match rest.strip_suffix('/') {
            Some(authority) => authority,
            None => rest,
        };
        if authority.contains('/') {
            return Err(Error::validation(format!(
                "endpoint {input:?} must not carry a path"
            )));
        }
        if authority.contains('?') || authority.contains('#') {
            return Err(Error::validation(format!(
                "endpoint {input:?} must not carry a query or fragment"
            )));
        }

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    Error::validation(format!("endpoint {input:?} carries an invalid port"))
                })?;
                (host, port)
            }
            None => (authority, if https { 443 } else { 80 }),
        };
        if host.is_empty() {
            return Err(Error::validation(format!(
                "endpoint {input:?} must carry a host"
            )));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            https,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn https(&self) -> bool {
        self.https
    }

    /// `host:port`, the form resolvers take.
    pub(crate) fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.https { "https" } else { "http" };
        write!(f, "{}://{}:{}", scheme, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_http_with_default_port() {
        let ep = Endpoint::parse("http://inst.cn-hangzhou.ots.aliyuncs.com").unwrap();
        assert_eq!(ep.host(), "inst.cn-hangzhou.ots.aliyuncs.com");
        assert_eq!(ep.port(), 80);
        assert!(!ep.https());
    }

    #[test]
    fn https_with_explicit_port_and_slash() {
        let ep = Endpoint::parse("https://inst.ots.aliyuncs.com:8443/").unwrap();
        assert_eq!(ep.port(), 8443);
        assert!(ep.https());
        assert_eq!(ep.authority(), "inst.ots.aliyuncs.com:8443");
    }

    #[test]
    fn rejects_bad_shapes() {
        for bad in [
            "inst.ots.aliyuncs.com",
            "ftp://inst.ots.aliyuncs.com",
            "http://",
            "http://host/path",
            "http://host:port",
            "http://host:65536",
            "http://host?x=1",
        ] {
            assert!(Endpoint::parse(bad).is_err(), "{bad}");
        }
    }
}
