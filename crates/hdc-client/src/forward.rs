/*!
 * Port forwarding endpoints and tasks.
 */
use std::fmt;
use std::str::FromStr;

use crate::error::{HdcError, Result};

/// One end of a forward mapping
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ForwardNode {
    /// TCP port: `tcp:port`
    Tcp(u16),
    /// Unix domain socket on the filesystem: `localfilesystem:name`
    LocalFilesystem(String),
    /// Reserved Unix domain socket: `localreserved:name`
    LocalReserved(String),
    /// Abstract Unix domain socket: `localabstract:name`
    LocalAbstract(String),
    /// Device node: `dev:name`
    Dev(String),
    /// JDWP process, remote side only: `jdwp:pid`
    Jdwp(u32),
    /// Ark debugger, remote side only: `ark:pid@tid@Debugger`
    Ark {
        /// Process id
        pid: u32,
        /// Thread id
        tid: u32,
        /// Debugger name
        debugger: String,
    },
}

impl ForwardNode {
    /// Parse a forward node from its textual form
    ///
    /// ```
    /// use hdc_client::ForwardNode;
    ///
    /// assert_eq!(ForwardNode::parse("tcp:8080").unwrap(), ForwardNode::Tcp(8080));
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| HdcError::invalid_argument(format!("Invalid forward node: {}", s)))?;

        match kind {
            "tcp" => Ok(Self::Tcp(parse_number(value, "TCP port")?)),
            "localfilesystem" => Ok(Self::LocalFilesystem(non_empty(value, s)?)),
            "localreserved" => Ok(Self::LocalReserved(non_empty(value, s)?)),
            "localabstract" => Ok(Self::LocalAbstract(non_empty(value, s)?)),
            "dev" => Ok(Self::Dev(non_empty(value, s)?)),
            "jdwp" => Ok(Self::Jdwp(parse_number(value, "JDWP pid")?)),
            "ark" => {
                let parts: Vec<&str> = value.split('@').collect();
                if parts.len() != 3 || parts[2].is_empty() {
                    return Err(HdcError::invalid_argument(format!(
                        "Invalid ark node: expected pid@tid@debugger, got {}",
                        value
                    )));
                }
                Ok(Self::Ark {
                    pid: parse_number(parts[0], "ark pid")?,
                    tid: parse_number(parts[1], "ark tid")?,
                    debugger: parts[2].to_string(),
                })
            }
            _ => Err(HdcError::invalid_argument(format!(
                "Unknown forward node type: {}",
                s
            ))),
        }
    }

    /// Convert to protocol string representation
    pub fn as_protocol_string(&self) -> String {
        self.to_string()
    }

    /// Whether the node may only appear on the device side
    pub fn is_remote_only(&self) -> bool {
        matches!(self, Self::Jdwp(_) | Self::Ark { .. })
    }
}

fn parse_number<T: FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| HdcError::invalid_argument(format!("Invalid {}: {}", what, value)))
}

fn non_empty(value: &str, node: &str) -> Result<String> {
    if value.is_empty() {
        return Err(HdcError::invalid_argument(format!(
            "Missing name in forward node: {}",
            node
        )));
    }
    Ok(value.to_string())
}

impl fmt::Display for ForwardNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(port) => write!(f, "tcp:{}", port),
            Self::LocalFilesystem(name) => write!(f, "localfilesystem:{}", name),
            Self::LocalReserved(name) => write!(f, "localreserved:{}", name),
            Self::LocalAbstract(name) => write!(f, "localabstract:{}", name),
            Self::Dev(name) => write!(f, "dev:{}", name),
            Self::Jdwp(pid) => write!(f, "jdwp:{}", pid),
            Self::Ark { pid, tid, debugger } => write!(f, "ark:{}@{}@{}", pid, tid, debugger),
        }
    }
}

impl FromStr for ForwardNode {
    type Err = HdcError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Direction of a forward task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForwardDirection {
    /// Host to device (`fport`)
    Forward,
    /// Device to host (`rport`)
    Reverse,
}

/// A forward or reverse mapping between a host node and a device node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForwardTask {
    /// Host-side node
    pub local_node: ForwardNode,
    /// Device-side node
    pub remote_node: ForwardNode,
    /// Mapping direction
    pub direction: ForwardDirection,
}

impl ForwardTask {
    /// Create a forward (fport) task
    pub fn forward(local: ForwardNode, remote: ForwardNode) -> Self {
        Self {
            local_node: local,
            remote_node: remote,
            direction: ForwardDirection::Forward,
        }
    }

    /// Create a reverse (rport) task
    pub fn reverse(remote: ForwardNode, local: ForwardNode) -> Self {
        Self {
            local_node: local,
            remote_node: remote,
            direction: ForwardDirection::Reverse,
        }
    }

    /// Command line that creates this task
    pub fn to_command_string(&self) -> String {
        match self.direction {
            ForwardDirection::Forward => format!("fport {} {}", self.local_node, self.remote_node),
            ForwardDirection::Reverse => format!("rport {} {}", self.remote_node, self.local_node),
        }
    }

    /// Task string accepted by `fport rm`
    pub fn task_string(&self) -> String {
        format!("{} {}", self.local_node, self.remote_node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tcp() {
        let node = ForwardNode::parse("tcp:8080").unwrap();
        assert_eq!(node, ForwardNode::Tcp(8080));
        assert_eq!(node.as_protocol_string(), "tcp:8080");
    }

    #[test]
    fn test_parse_sockets() {
        let node: ForwardNode = "localabstract:scrcpy".parse().unwrap();
        assert_eq!(node, ForwardNode::LocalAbstract("scrcpy".to_string()));

        let node = ForwardNode::parse("localfilesystem:/tmp/sock").unwrap();
        assert_eq!(node.to_string(), "localfilesystem:/tmp/sock");
    }

    #[test]
    fn test_parse_jdwp() {
        let node = ForwardNode::parse("jdwp:1234").unwrap();
        assert_eq!(node, ForwardNode::Jdwp(1234));
        assert!(node.is_remote_only());
    }

    #[test]
    fn test_parse_ark() {
        let node = ForwardNode::parse("ark:100@200@Debugger").unwrap();
        let expected = ForwardNode::Ark {
            pid: 100,
            tid: 200,
            debugger: "Debugger".to_string(),
        };
        assert_eq!(node, expected);
        assert_eq!(node.as_protocol_string(), "ark:100@200@Debugger");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "8080",
            "tcp:",
            "tcp:70000",
            "udp:53",
            "jdwp:abc",
            "ark:1@2",
            "ark:1@x@Debugger",
            "localabstract:",
        ] {
            assert!(
                matches!(ForwardNode::parse(bad), Err(HdcError::InvalidArgument(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_forward_task() {
        let task = ForwardTask::forward(ForwardNode::Tcp(8080), ForwardNode::Tcp(8081));
        assert_eq!(task.to_command_string(), "fport tcp:8080 tcp:8081");
        assert_eq!(task.task_string(), "tcp:8080 tcp:8081");
    }

    #[test]
    fn test_reverse_task() {
        let task = ForwardTask::reverse(ForwardNode::Tcp(9090), ForwardNode::Tcp(9091));
        assert_eq!(task.to_command_string(), "rport tcp:9090 tcp:9091");
        assert_eq!(task.task_string(), "tcp:9091 tcp:9090");
    }
}
