//! 连接安全检查
//!
//! 在 accept 时根据远端 IP 决定是否接受连接：
//! - 环回地址（含 IPv4 映射形式）总是允许
//! - 其余地址必须出现在允许列表中（按文本形式比较）
//! - 远端地址无法获取时拒绝

use std::collections::HashSet;
use std::io;
use std::net::{IpAddr, SocketAddr};
use tracing::{debug, error, info, warn};

/// 扩展允许列表的配置项
pub const ALLOW_LIST_KEY: &str = "KNX_LINK_ALLOWED_ADDRESSES";

/// 安全检查结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed { peer: SocketAddr },
    Rejected { address: SocketAddr },
    /// 远端地址无法获取
    Unresolved,
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// 远端地址允许列表
#[derive(Debug, Clone, Default)]
pub struct SecurityAuditor {
    allowed: HashSet<String>,
}

impl SecurityAuditor {
    pub fn new<S: AsRef<str>>(allowed: impl IntoIterator<Item = S>) -> Self {
        let allowed = allowed
            .into_iter()
            .map(|address| address.as_ref().trim().to_string())
            .filter(|address| !address.is_empty())
            .collect::<HashSet<_>>();
        info!(
            target: "knx_link.security",
            allowed = ?allowed,
            "security auditor created"
        );
        Self { allowed }
    }

    pub fn allowed_addresses(&self) -> &HashSet<String> {
        &self.allowed
    }

    pub fn is_allowed(&self, ip: IpAddr) -> bool {
        let canonical = ip.to_canonical();
        canonical.is_loopback()
            || self.allowed.contains(&canonical.to_string())
            || self.allowed.contains(&ip.to_string())
    }

    /// I/O 错误只记录日志，结论为 [`Verdict::Unresolved`]。
    pub fn check_remote(&self, remote: io::Result<SocketAddr>) -> Verdict {
        match remote {
            Ok(peer) if self.is_allowed(peer.ip()) => {
                debug!(target: "knx_link.security", %peer, "remote address accepted");
                Verdict::Allowed { peer }
            }
            Ok(address) => {
                warn!(
                    target: "knx_link.security",
                    peer = %address,
                    "remote address not found in allow-list"
                );
                Verdict::Rejected { address }
            }
            Err(error) => {
                error!(
                    target: "knx_link.security",
                    %error,
                    "could not resolve remote address"
                );
                Verdict::Unresolved
            }
        }
    }
}

/// 拒绝通知文本
pub fn rejection_message(address: IpAddr) -> String {
    format!(
        "Your IP address '{}' is not allowed. To allow it, add it to '{ALLOW_LIST_KEY}' of the gateway configuration.",
        address.to_canonical()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn peer(ip: &str) -> io::Result<SocketAddr> {
        Ok(SocketAddr::new(ip.parse().unwrap(), 40000))
    }

    #[test]
    fn loopback_is_always_allowed() {
        let auditor = SecurityAuditor::new(Vec::<String>::new());
        assert!(auditor.is_allowed(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        assert!(auditor.is_allowed("127.10.0.1".parse().unwrap()));
        assert!(auditor.is_allowed(IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert!(auditor.is_allowed("::ffff:127.0.0.1".parse().unwrap()));
    }

    #[test]
    fn allow_list_entries_are_trimmed() {
        let auditor = SecurityAuditor::new([" 192.168.1.20 ", "", "10.0.0.1"]);
        assert_eq!(auditor.allowed_addresses().len(), 2);
        assert!(auditor.check_remote(peer("192.168.1.20")).is_allowed());
        assert!(auditor.check_remote(peer("::ffff:10.0.0.1")).is_allowed());
    }

    #[test]
    fn unknown_address_is_rejected() {
        let auditor = SecurityAuditor::new(["192.168.1.20"]);
        assert_eq!(
            auditor.check_remote(peer("192.168.1.21")),
            Verdict::Rejected {
                address: peer("192.168.1.21").unwrap()
            }
        );
    }

    #[test]
    fn resolution_failure_is_rejected() {
        let auditor = SecurityAuditor::new(["192.168.1.20"]);
        let remote = Err(io::Error::new(io::ErrorKind::NotConnected, "gone"));
        assert_eq!(auditor.check_remote(remote), Verdict::Unresolved);
    }

    #[test]
    fn message_names_address_and_key() {
        let message = rejection_message("::ffff:10.1.2.3".parse().unwrap());
        assert!(message.contains("'10.1.2.3'"));
        assert!(message.contains(ALLOW_LIST_KEY));
    }
}
