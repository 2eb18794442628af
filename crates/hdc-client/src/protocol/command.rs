/*!
 * HDC command codes.
 */

/// HDC command codes as carried in the 2-byte little-endian response prefix
#[allow(missing_docs)]
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HdcCommand {
    // Core commands
    KernelHelp = 0,
    KernelHandshake = 1,
    KernelChannelClose = 2,
    KernelTargetDiscover = 4,
    KernelTargetList = 5,
    KernelTargetAny = 6,
    KernelTargetConnect = 7,
    KernelTargetDisconnect = 8,
    KernelEcho = 9,
    KernelEchoRaw = 10,
    KernelEnableKeepalive = 11,
    KernelWakeupSlavetask = 12,
    CheckServer = 13,
    CheckDevice = 14,
    WaitFor = 15,
    ServerKill = 16,
    ServiceStart = 17,

    // One-pass commands
    UnityExecute = 1001,
    UnityRemount = 1002,
    UnityReboot = 1003,
    UnityRunmode = 1004,
    UnityHilog = 1005,
    UnityRootrun = 1007,
    JdwpList = 1008,
    JdwpTrack = 1009,

    // Shell
    ShellInit = 2000,
    ShellData = 2001,

    // Forward
    ForwardInit = 2500,
    ForwardCheck = 2501,
    ForwardCheckResult = 2502,
    ForwardActiveSlave = 2503,
    ForwardActiveMaster = 2504,
    ForwardData = 2505,
    ForwardFreeContext = 2506,
    ForwardList = 2507,
    ForwardRemove = 2508,
    ForwardSuccess = 2509,

    // File
    FileInit = 3000,
    FileCheck = 3001,
    FileBegin = 3002,
    FileData = 3003,
    FileFinish = 3004,
    AppSideload = 3005,
    FileMode = 3006,
    DirMode = 3007,

    // App
    AppInit = 3500,
    AppCheck = 3501,
    AppBegin = 3502,
    AppData = 3503,
    AppFinish = 3504,
    AppUninstall = 3506,

    HeartbeatMsg = 5000,
}

impl HdcCommand {
    /// Convert command to u16 value
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Convert u16 to command (if known)
    pub fn from_u16(value: u16) -> Option<Self> {
        use HdcCommand::*;

        let command = match value {
            0 => KernelHelp,
            1 => KernelHandshake,
            2 => KernelChannelClose,
            4 => KernelTargetDiscover,
            5 => KernelTargetList,
            6 => KernelTargetAny,
            7 => KernelTargetConnect,
            8 => KernelTargetDisconnect,
            9 => KernelEcho,
            10 => KernelEchoRaw,
            11 => KernelEnableKeepalive,
            12 => KernelWakeupSlavetask,
            13 => CheckServer,
            14 => CheckDevice,
            15 => WaitFor,
            16 => ServerKill,
            17 => ServiceStart,
            1001 => UnityExecute,
            1002 => UnityRemount,
            1003 => UnityReboot,
            1004 => UnityRunmode,
            1005 => UnityHilog,
            1007 => UnityRootrun,
            1008 => JdwpList,
            1009 => JdwpTrack,
            2000 => ShellInit,
            2001 => ShellData,
            2500 => ForwardInit,
            2501 => ForwardCheck,
            2502 => ForwardCheckResult,
            2503 => ForwardActiveSlave,
            2504 => ForwardActiveMaster,
            2505 => ForwardData,
            2506 => ForwardFreeContext,
            2507 => ForwardList,
            2508 => ForwardRemove,
            2509 => ForwardSuccess,
            3000 => FileInit,
            3001 => FileCheck,
            3002 => FileBegin,
            3003 => FileData,
            3004 => FileFinish,
            3005 => AppSideload,
            3006 => FileMode,
            3007 => DirMode,
            3500 => AppInit,
            3501 => AppCheck,
            3502 => AppBegin,
            3503 => AppData,
            3504 => AppFinish,
            3506 => AppUninstall,
            5000 => HeartbeatMsg,
            _ => return None,
        };
        Some(command)
    }

    /// Commands the server uses as a prefix on response payloads
    pub fn is_response(&self) -> bool {
        matches!(
            self,
            Self::KernelEcho
                | Self::KernelEchoRaw
                | Self::ShellData
                | Self::ForwardData
                | Self::ForwardSuccess
                | Self::FileData
                | Self::FileFinish
                | Self::AppFinish
        )
    }

    /// Split a known response prefix from a payload.
    ///
    /// Returns the command and the remaining bytes, or `None` when the payload
    /// does not start with a response command.
    pub fn split_prefix(data: &[u8]) -> Option<(Self, &[u8])> {
        if data.len() < 2 {
            return None;
        }
        let code = u16::from_le_bytes([data[0], data[1]]);
        Self::from_u16(code)
            .filter(|command| command.is_response())
            .map(|command| (command, &data[2..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_codes() {
        for code in [0u16, 5, 13, 1001, 2001, 2505, 3004, 3506, 5000] {
            let command = HdcCommand::from_u16(code).unwrap();
            assert_eq!(command.as_u16(), code);
        }
        assert_eq!(HdcCommand::from_u16(3), None);
        assert_eq!(HdcCommand::from_u16(1006), None);
    }

    #[test]
    fn test_split_prefix() {
        let mut data = HdcCommand::KernelEcho.as_u16().to_le_bytes().to_vec();
        data.extend_from_slice(b"[Fail]No target");

        let (command, rest) = HdcCommand::split_prefix(&data).unwrap();
        assert_eq!(command, HdcCommand::KernelEcho);
        assert_eq!(rest, b"[Fail]No target");
    }

    #[test]
    fn test_split_prefix_ignores_text() {
        assert!(HdcCommand::split_prefix(b"127.0.0.1:5555").is_none());
        assert!(HdcCommand::split_prefix(b"x").is_none());
    }

    #[test]
    fn test_split_prefix_ignores_request_codes() {
        let data = HdcCommand::KernelHandshake.as_u16().to_le_bytes();
        assert!(HdcCommand::split_prefix(&data).is_none());
    }
}
