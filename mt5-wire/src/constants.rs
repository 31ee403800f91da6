// Location: mt5-wire/src/constants.rs
// Purpose: Protocol constants shared by the relay server and its clients
// Why: Single source of truth for ports, content types and terminal result codes

// =============================================================================
// Transport Constants
// =============================================================================

/// Default port of the request/response (HTTP) adapter
pub const DEFAULT_HTTP_PORT: u16 = 18812;

/// Default port of the object-RPC (ZeroMQ) adapter
pub const DEFAULT_RPC_PORT: u16 = 18813;

/// Default client-side call timeout for the object-RPC adapter, in seconds.
/// Terminal start-up plus one restart cycle can take minutes.
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 240;

/// Content type of time-series responses (NumPy `.npy` payload)
pub const CONTENT_TYPE_NUMPY: &str = "application/x-numpy";

// =============================================================================
// Terminal Result Codes
// =============================================================================
//
// These values are returned by the terminal capability interface through
// `last_error()`. They are an external contract owned by the terminal vendor
// and may change between terminal builds; keep them verbatim.

/// Generic success
pub const RES_S_OK: i32 = 1;

/// Generic failure
pub const RES_E_FAIL: i32 = -1;

/// Authorization failed
pub const RES_E_AUTH_FAILED: i32 = -6;

/// Algorithmic trading is disabled in the terminal
pub const RES_E_AUTO_TRADING_DISABLED: i32 = -8;

/// IPC initialization failed (terminal still starting or a stale instance
/// holds the IPC channel)
pub const RES_E_INTERNAL_FAIL_INIT: i32 = -10003;

/// No IPC connection to the terminal
pub const RES_E_INTERNAL_FAIL_CONNECT: i32 = -10004;

/// IPC call timed out (terminal busy)
pub const RES_E_INTERNAL_FAIL_TIMEOUT: i32 = -10005;

/// Initialize failure codes that warrant one kill-and-relaunch cycle.
/// Version-sensitive: revisit when the terminal binding is upgraded.
pub const RECOVERABLE_INIT_ERRORS: [i32; 2] = [RES_E_INTERNAL_FAIL_TIMEOUT, RES_E_INTERNAL_FAIL_INIT];

/// Whether an `initialize` failure code belongs to the recoverable class
#[inline]
pub fn is_recoverable_init_error(code: i32) -> bool {
    RECOVERABLE_INIT_ERRORS.contains(&code)
}
