//! Device status codes
//!
//! Every structured reply carries a numeric `Ret` field. Codes were
//! recovered from live captures; firmware occasionally emits codes not
//! on this list, so unknown values are carried through rather than
//! rejected.

use std::fmt;

/// Status code reported by the device in a structured reply.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Status(pub u32);

impl Status {
    pub const OK: Status = Status(100);
    pub const ERROR: Status = Status(101);
    pub const VERSION: Status = Status(102);
    pub const REQUEST: Status = Status(103);
    pub const ALREADY_LOGGED_IN: Status = Status(104);
    pub const NOT_LOGGED_IN: Status = Status(105);
    pub const CREDENTIALS: Status = Status(106);
    pub const ACCESS_DENIED: Status = Status(107);
    pub const TIMED_OUT: Status = Status(108);
    pub const FILE_NOT_FOUND: Status = Status(109);
    pub const SEARCH_COMPLETE: Status = Status(110);
    pub const SEARCH_PARTIAL: Status = Status(111);
    pub const SEARCH_EMPTY: Status = Status(119);
    pub const DISABLED: Status = Status(120);
    pub const CHANNEL_NOT_CONNECTED: Status = Status(121);
    pub const REBOOT_REQUIRED: Status = Status(150);
    pub const WRONG_PASSWORD: Status = Status(203);
    pub const WRONG_USERNAME: Status = Status(204);
    pub const LOCKED_OUT: Status = Status(205);
    pub const BANNED: Status = Status(206);
    pub const CONFLICTING_LOGIN: Status = Status(207);
    pub const ILLEGAL_VALUE: Status = Status(208);
    pub const ILLEGAL_COMMAND: Status = Status(502);

    /// Numeric code as sent on the wire.
    pub fn code(self) -> u32 {
        self.0
    }

    /// Whether the device considers the operation successful.
    ///
    /// The partial/complete search statuses and "reboot required" are
    /// successes; everything else outside the success set is a failure,
    /// including codes we have never seen.
    pub fn is_success(self) -> bool {
        matches!(
            self.0,
            100 | 110 | 111 | 119 | 150 | 503 | 504 | 511 | 514 | 522 | 602 | 603
        )
    }

    /// Human-readable description of the code.
    pub fn message(self) -> &'static str {
        match self.0 {
            100 => "OK",
            101 => "unknown error",
            102 => "invalid version",
            103 => "invalid request",
            104 => "already logged in",
            105 => "not logged in",
            106 => "wrong username or password",
            107 => "access denied",
            108 => "timed out",
            109 => "file not found",
            110 => "complete search results",
            111 => "partial search results",
            112 => "user already exists",
            113 => "user does not exist",
            114 => "group already exists",
            115 => "group does not exist",
            117 => "invalid message",
            118 => "PTZ protocol not set",
            119 => "no search results",
            120 => "disabled",
            121 => "channel not connected",
            150 => "reboot required",
            203 => "wrong password",
            204 => "wrong username",
            205 => "locked out",
            206 => "banned",
            207 => "already logged in elsewhere",
            208 => "illegal value",
            211 => "object does not exist",
            212 => "account in use",
            502 => "illegal command",
            511 => "upgrade started",
            512 => "upgrade not started",
            513 => "invalid upgrade data",
            514 => "upgrade successful",
            515 => "upgrade failed",
            _ => "unrecognized status",
        }
    }
}

impl From<u32> for Status {
    fn from(code: u32) -> Self {
        Status(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_set() {
        assert!(Status::OK.is_success());
        assert!(Status::SEARCH_PARTIAL.is_success());
        assert!(Status::SEARCH_COMPLETE.is_success());
        assert!(Status::REBOOT_REQUIRED.is_success());
        assert!(!Status::CREDENTIALS.is_success());
        assert!(!Status::ERROR.is_success());
    }

    #[test]
    fn test_unknown_code_carried() {
        let s = Status(777);
        assert_eq!(s.code(), 777);
        assert!(!s.is_success());
        assert_eq!(s.message(), "unrecognized status");
    }

    #[test]
    fn test_display() {
        assert_eq!(Status::CREDENTIALS.to_string(), "wrong username or password (106)");
    }
}
