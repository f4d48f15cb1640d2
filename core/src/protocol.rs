//! Recognized URI scheme labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Scheme names accepted wherever a `Uri` takes a protocol.
///
/// Purely a label: a `Uri` stores whatever protocol text it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UriProtocol {
    // http
    Http,
    Https,
    // web socket
    Ws,
    Wss,
    // mail
    Smtp,
    Smtps,
    Imap,
    Pop,
    // file transfer
    Ftp,
    Ftps,
    Sftp,
    Smb,
    // messaging
    Xmpp,
    Tel,
    Sip,
    // remote shell
    Ssh,
    Telnet,
    // instant messaging
    Line,
    Iota,
    IotaRender,
}

/// Returned by `UriProtocol::from_str` for labels outside the set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown protocol '{0}'")]
pub struct ProtocolError(pub String);

impl UriProtocol {
    pub const ALL: [UriProtocol; 20] = [
        UriProtocol::Http,
        UriProtocol::Https,
        UriProtocol::Ws,
        UriProtocol::Wss,
        UriProtocol::Smtp,
        UriProtocol::Smtps,
        UriProtocol::Imap,
        UriProtocol::Pop,
        UriProtocol::Ftp,
        UriProtocol::Ftps,
        UriProtocol::Sftp,
        UriProtocol::Smb,
        UriProtocol::Xmpp,
        UriProtocol::Tel,
        UriProtocol::Sip,
        UriProtocol::Ssh,
        UriProtocol::Telnet,
        UriProtocol::Line,
        UriProtocol::Iota,
        UriProtocol::IotaRender,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            UriProtocol::Http => "http",
            UriProtocol::Https => "https",
            UriProtocol::Ws => "ws",
            UriProtocol::Wss => "wss",
            UriProtocol::Smtp => "smtp",
            UriProtocol::Smtps => "smtps",
            UriProtocol::Imap => "imap",
            UriProtocol::Pop => "pop",
            UriProtocol::Ftp => "ftp",
            UriProtocol::Ftps => "ftps",
            UriProtocol::Sftp => "sftp",
            UriProtocol::Smb => "smb",
            UriProtocol::Xmpp => "xmpp",
            UriProtocol::Tel => "tel",
            UriProtocol::Sip => "sip",
            UriProtocol::Ssh => "ssh",
            UriProtocol::Telnet => "telnet",
            UriProtocol::Line => "line",
            UriProtocol::Iota => "iota",
            UriProtocol::IotaRender => "iota-render",
        }
    }
}

impl fmt::Display for UriProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for UriProtocol {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Case-insensitive; a trailing `:` (as in `https:`) is accepted.
impl FromStr for UriProtocol {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.strip_suffix(':').unwrap_or(s);
        UriProtocol::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(label))
            .ok_or_else(|| ProtocolError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_str() {
        for protocol in UriProtocol::ALL {
            assert_eq!(protocol.as_str().parse::<UriProtocol>(), Ok(protocol));
        }
    }

    #[test]
    fn from_str_accepts_case_and_colon() {
        assert_eq!("HTTPS:".parse::<UriProtocol>(), Ok(UriProtocol::Https));
        assert!("gopher".parse::<UriProtocol>().is_err());
    }

    #[test]
    fn serde_uses_kebab_labels() {
        let json = serde_json::to_string(&UriProtocol::IotaRender).unwrap();
        assert_eq!(json, r#""iota-render""#);
        let back: UriProtocol = serde_json::from_str(r#""wss""#).unwrap();
        assert_eq!(back, UriProtocol::Wss);
    }
}
